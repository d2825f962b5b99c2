//! Item refinement example
//!
//! Refines an abstract `NewItem(id)` model input into a concrete `Spawn`
//! command for a simulated system under test, then turns the system's
//! `Spawned` event back into an `ItemCreated(id)` model output.
//!
//! Logs at `info` by default; set `RUST_LOG=refinery=debug` with `cargo run --example item_refinement`
//! to see the scheduling decisions.

use refinery::builder::{ProactiveBuilder, ReactiveBuilder, TransitionSystemBuilder};
use refinery::core::{Action, ActionType, StoreError, SystemAction};
use refinery::framework::{Framework, FrameworkConfig};
use refinery::{model_actions, EngineError, TransitionSystem};
use std::error::Error;
use tracing_subscriber::EnvFilter;

model_actions! {
    pub struct NewItem {
        id: i32,
    }

    pub struct ItemCreated {
        id: i32,
    }
}

/// Actions understood by the simulated system under test.
#[derive(Debug, Clone, PartialEq)]
enum Sut {
    Spawn { guid: u32 },
    Spawned { guid: u32 },
}

impl SystemAction for Sut {
    fn tag(&self) -> &str {
        match self {
            Sut::Spawn { .. } => "Spawn",
            Sut::Spawned { .. } => "Spawned",
        }
    }
}

/// Idle --NewItem--> Requested --Spawn--> Spawning --Spawned--> Created --ItemCreated--> Idle
fn item_lifecycle() -> Result<TransitionSystem<Sut>, Box<dyn Error>> {
    let system = TransitionSystemBuilder::<Sut>::new("item-lifecycle")
        .states(["Idle", "Requested", "Spawning", "Created"])
        .initial("Idle")
        .transition(
            ReactiveBuilder::new("request")
                .on_model(NewItem::NAME)
                .from("Idle")
                .to("Requested")
                .when_model(|action, _| action.field::<i32>(0).is_some_and(|id| id > 0))
                .update(|action, vars| {
                    match action.as_model().map(NewItem::from_model_action) {
                        Some(Ok(item)) => vars.set("id", item.id),
                        _ => Err(StoreError::InvalidArgument),
                    }
                }),
        )?
        .transition(
            ProactiveBuilder::new("spawn")
                .emits_system("Spawn")
                .from("Requested")
                .to("Spawning")
                .generate(|vars| {
                    let id: i32 = vars.get("id")?;
                    Ok(Action::System(Sut::Spawn { guid: id as u32 }))
                }),
        )?
        .transition(
            ReactiveBuilder::new("spawned")
                .on_system("Spawned")
                .from("Spawning")
                .to("Created")
                .when(|action, vars| match (action, vars.get::<i32>("id")) {
                    (Action::System(Sut::Spawned { guid }), Ok(id)) => *guid == id as u32,
                    _ => false,
                }),
        )?
        .transition(
            ProactiveBuilder::new("report")
                .from("Created")
                .to("Idle")
                .generate_model(ItemCreated::NAME, |vars| {
                    Ok(ItemCreated { id: vars.get("id")? }.into())
                })
                .update(|_, vars| vars.clear("id").map(|_| ())),
        )?
        .build()?;
    Ok(system)
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    println!("=== Item Refinement Example ===\n");

    let config = FrameworkConfig::named("items");
    let (framework, mut outlets) = Framework::<Sut>::new(config);
    let id = framework.add_system(item_lifecycle()?)?;

    println!("Registered systems:");
    println!("{framework}");

    for item in 1..=3 {
        println!("Model input: {}", NewItem { id: item });
        framework.handle_model_input(NewItem { id: item })?;

        // Play the system under test: acknowledge every command it receives.
        while let Ok(command) = outlets.commands.try_recv() {
            println!("  SUT received: {command:?}");
            if let Sut::Spawn { guid } = command {
                framework.handle_system_event(Sut::Spawned { guid })?;
            }
        }

        while let Ok(output) = outlets.outputs.try_recv() {
            println!("  Model output: {output}");
        }
    }

    println!("\nHistory of the item lifecycle:");
    framework.with_system(id, |system| {
        for (step, firing) in system.history().firings().iter().enumerate() {
            println!(
                "  {}. {} ({}) {} -> {} via {}",
                step + 1,
                firing.transition,
                firing.kind,
                firing.from,
                firing.to,
                firing.action
            );
        }
    });

    println!("\n=== Deadlock ===\n");
    println!("Model input: {}", NewItem { id: -1 });
    match framework.handle_model_input(NewItem { id: -1 }) {
        Err(EngineError::Deadlock(snapshot)) => {
            println!("No transition accepts the input:\n{snapshot}");
            println!("Snapshot as JSON:\n{}", snapshot.to_json()?);
        }
        Err(other) => return Err(other.into()),
        Ok(()) => println!("Unexpectedly consumed"),
    }

    Ok(())
}
