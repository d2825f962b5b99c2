//! Property-based tests for the refinement engine.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use proptest::prelude::*;
use refinery::builder::{ProactiveBuilder, ReactiveBuilder, TransitionSystemBuilder};
use refinery::core::{Catalog, ModelAction, SystemAction, Value};
use refinery::framework::{Framework, FrameworkConfig, Outlets, SelectionConfig};
use refinery::{EngineError, TransitionSystem};

#[derive(Debug, Clone, PartialEq)]
enum Sut {
    Ack,
}

impl SystemAction for Sut {
    fn tag(&self) -> &str {
        "Ack"
    }
}

prop_compose! {
    fn arbitrary_value()(variant in 0..3u8, b in any::<bool>(), i in any::<i32>(), s in "[a-zA-Z0-9 _.-]{0,12}") -> Value {
        match variant {
            0 => Value::Bool(b),
            1 => Value::Int(i),
            _ => Value::Str(s),
        }
    }
}

prop_compose! {
    fn arbitrary_action()(name in "[A-Z][a-zA-Z0-9]{0,10}", fields in prop::collection::vec(arbitrary_value(), 0..5)) -> ModelAction {
        ModelAction::new(name, fields)
    }
}

#[derive(Debug, Clone)]
enum Op {
    Input(i32),
    Event,
    Check,
}

fn arbitrary_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..4i32).prop_map(Op::Input),
        Just(Op::Event),
        Just(Op::Check),
    ]
}

/// S1 --NewItem--> S2 --Ack--> S1: holds the floor until the SUT acknowledges.
fn acknowledging(name: &str) -> TransitionSystem<Sut> {
    TransitionSystemBuilder::<Sut>::new(name)
        .states(["S1", "S2"])
        .initial("S1")
        .transition(
            ReactiveBuilder::new("request")
                .on_model("NewItem")
                .from("S1")
                .to("S2"),
        )
        .unwrap()
        .transition(ReactiveBuilder::new("ack").on_system("Ack").from("S2").to("S1"))
        .unwrap()
        .build()
        .unwrap()
}

/// S0 -> S1 -> ... -> Sn through proactive transitions, never returning to S0.
fn chain(name: &str, length: usize) -> TransitionSystem<Sut> {
    let states: Vec<String> = (0..=length).map(|i| format!("S{i}")).collect();
    let mut builder = TransitionSystemBuilder::<Sut>::new(name)
        .states(states.clone())
        .initial("S0");
    for step in 0..length {
        builder = builder
            .transition(
                ProactiveBuilder::new(format!("step{step}"))
                    .from(states[step].as_str())
                    .to(states[step + 1].as_str())
                    .generate_model("Step", move |_| {
                        Ok(ModelAction::new("Step", vec![Value::Int(step as i32)]))
                    }),
            )
            .unwrap();
    }
    builder.build().unwrap()
}

fn seeded(seed: u64) -> (Framework<Sut>, Outlets<Sut>) {
    let selection = SelectionConfig::Random { seed: Some(seed) };
    Framework::new(FrameworkConfig::named("props").with_selection(selection))
}

fn apply(framework: &Framework<Sut>, op: &Op) -> Result<(), EngineError> {
    match op {
        Op::Input(id) => {
            framework.handle_model_input(ModelAction::new("NewItem", vec![Value::Int(*id)]))
        }
        Op::Event => framework.handle_system_event(Sut::Ack),
        Op::Check => framework.check_systems(),
    }
}

proptest! {
    #[test]
    fn serialization_round_trips(action in arbitrary_action()) {
        let mut catalog = Catalog::new();
        catalog.register(action.signature());

        let text = action.serialize();
        let parsed = catalog.deserialize(&text).unwrap();

        prop_assert_eq!(parsed.fields(), action.fields());
        prop_assert_eq!(parsed, action);
    }

    #[test]
    fn current_state_is_always_declared(
        seed in any::<u64>(),
        systems in 1..4usize,
        ops in prop::collection::vec(arbitrary_op(), 0..30),
    ) {
        let (framework, _outlets) = seeded(seed);
        for index in 0..systems {
            framework.add_system(acknowledging(&format!("ack{index}"))).unwrap();
        }

        for op in &ops {
            let _ = apply(&framework, op);
            for id in framework.system_ids() {
                let valid = framework
                    .with_system(id, |s| s.states().contains(s.current_state()))
                    .unwrap();
                prop_assert!(valid);
            }
        }
    }

    #[test]
    fn at_most_one_system_in_flight(
        seed in any::<u64>(),
        systems in 2..5usize,
        ops in prop::collection::vec(arbitrary_op(), 0..40),
    ) {
        let (framework, _outlets) = seeded(seed);
        for index in 0..systems {
            framework.add_system(acknowledging(&format!("ack{index}"))).unwrap();
        }

        for op in &ops {
            let before = framework.snapshot();
            if let Err(err) = apply(&framework, op) {
                prop_assert!(matches!(err, EngineError::Deadlock(_)), "unexpected error: {}", err);
            }
            let after = framework.snapshot();

            let busy: Vec<_> = after.systems.iter().filter(|s| !s.is_idle()).collect();
            prop_assert!(busy.len() <= 1);
            match after.current_system {
                Some(id) => prop_assert!(busy.len() == 1 && busy[0].id == id),
                None => prop_assert!(busy.is_empty()),
            }

            // While a system held the floor, nobody else fired until it let go.
            if let Some(holder) = before.current_system {
                let still_held = after.current_system == Some(holder);
                for (old, new) in before.systems.iter().zip(&after.systems) {
                    if still_held && old.id != holder {
                        prop_assert_eq!(old.firings, new.firings);
                    }
                }
            }
        }
    }

    #[test]
    fn draining_reaches_a_fixed_point(
        seed in any::<u64>(),
        lengths in prop::collection::vec(1..6usize, 1..4),
    ) {
        let (framework, mut outlets) = seeded(seed);
        for (index, length) in lengths.iter().enumerate() {
            framework.add_system(chain(&format!("chain{index}"), *length)).unwrap();
        }

        framework.start().unwrap();
        let drained = framework.snapshot();
        let active = drained.current_system.expect("a chain claims the floor");
        let enabled = framework
            .with_system(active, |s| s.possible_proactive_transitions().len())
            .unwrap();
        prop_assert_eq!(enabled, 0);

        let mut produced = 0;
        while outlets.outputs.try_recv().is_ok() {
            produced += 1;
        }
        let owner = drained.systems.iter().find(|s| s.id == active).unwrap();
        prop_assert_eq!(produced, owner.firings);

        framework.check_systems().unwrap();
        framework.check_systems().unwrap();
        let again = framework.snapshot();
        prop_assert_eq!(&again.systems, &drained.systems);
        prop_assert!(outlets.outputs.try_recv().is_err());
    }
}
