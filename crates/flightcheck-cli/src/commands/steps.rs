//! Steps command implementation.

use crate::cli::StepsArgs;
use crate::error::Result;
use crate::ui;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct CatalogEntry {
    position: usize,
    id: flightcheck::StepId,
    description: &'static str,
}

/// List the scenario steps in the order a run executes them.
pub fn execute(args: &StepsArgs) -> Result<()> {
    let steps = flightcheck::steps::catalog();

    if args.json {
        let entries: Vec<_> = steps
            .iter()
            .enumerate()
            .map(|(i, step)| CatalogEntry {
                position: i + 1,
                id: step.id(),
                description: step.description(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        ui::print_step_catalog(&steps);
    }
    Ok(())
}
