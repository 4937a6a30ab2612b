//! Classify command: assign an evidence pattern to each object

use clap::Args;
use serde::Serialize;

use crate::commands::{load_objects, save_objects};
use crate::output::{print_summary, OutputFormat};
use crate::Cli;
use taxograph_core::PathResolver;

#[derive(Args)]
pub struct ClassifyArgs {
    /// Re-probe objects that already carry a pattern
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Default, Serialize)]
struct ClassifySummary {
    classified: usize,
    unmatched: usize,
    skipped: usize,
}

pub async fn run(args: &ClassifyArgs, cli: &Cli) -> anyhow::Result<()> {
    let mut objects = load_objects(&cli.objects)?;
    let config = cli.config();
    let client = cli.client();
    let resolver = PathResolver::new(&client, &config);

    let mut summary = ClassifySummary::default();
    for index in 0..objects.len() {
        if objects[index].pattern.is_some() && !args.force {
            summary.skipped += 1;
            continue;
        }
        let probed = match resolver.classify(&objects[index].identifier).await {
            Ok(probed) => probed,
            Err(e) => {
                // keep the patterns assigned so far
                save_objects(&cli.objects, &objects)?;
                return Err(e.into());
            }
        };
        match probed {
            Some(pattern) => {
                objects[index].pattern = Some(pattern.tag().to_string());
                summary.classified += 1;
            }
            None => {
                tracing::warn!(
                    "object {} ({}) matched no pattern",
                    objects[index].identifier,
                    objects[index].label
                );
                summary.unmatched += 1;
            }
        }
    }

    save_objects(&cli.objects, &objects)?;
    print_summary(
        &summary,
        &format!(
            "Classified {} objects ({} unmatched, {} already classified)",
            summary.classified, summary.unmatched, summary.skipped
        ),
        OutputFormat::from(cli.format.as_str()),
    );
    Ok(())
}
