//! Tie-breaking among simultaneously enabled transitions.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Picks one of several enabled (system, transition) candidates.
///
/// `select` is only called with `candidates >= 1` and must return an index
/// below `candidates`; larger answers are clamped to the last candidate.
pub trait Selector: Send {
    fn select(&mut self, candidates: usize) -> usize;
}

/// Uniformly random choice, the default strategy.
pub struct RandomSelector {
    rng: StdRng,
}

impl RandomSelector {
    /// Seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible sequence of choices.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl Selector for RandomSelector {
    fn select(&mut self, candidates: usize) -> usize {
        self.rng.gen_range(0..candidates)
    }
}

/// Always the first candidate in registration and declaration order.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstSelector;

impl Selector for FirstSelector {
    fn select(&mut self, _candidates: usize) -> usize {
        0
    }
}

impl<F> Selector for F
where
    F: FnMut(usize) -> usize + Send,
{
    fn select(&mut self, candidates: usize) -> usize {
        self(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_selector_stays_in_range() {
        let mut selector = RandomSelector::new();
        for candidates in 1..20 {
            assert!(selector.select(candidates) < candidates);
        }
    }

    #[test]
    fn seeded_selectors_agree() {
        let mut a = RandomSelector::seeded(7);
        let mut b = RandomSelector::seeded(7);
        let picks_a: Vec<usize> = (0..32).map(|_| a.select(5)).collect();
        let picks_b: Vec<usize> = (0..32).map(|_| b.select(5)).collect();

        assert_eq!(picks_a, picks_b);
    }

    #[test]
    fn first_selector_picks_zero() {
        assert_eq!(FirstSelector.select(3), 0);
    }

    #[test]
    fn closures_are_selectors() {
        let mut last = |candidates: usize| candidates - 1;
        assert_eq!(Selector::select(&mut last, 4), 3);
    }
}
