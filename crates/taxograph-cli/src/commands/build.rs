//! Build command: construct hierarchy edges from classified objects

use anyhow::bail;
use clap::Args;

use crate::commands::load_objects;
use crate::output::{print_summary, OutputFormat};
use crate::Cli;
use taxograph_core::{construct, EdgeStore, EntityId, ObjectRecord, PathResolver};

#[derive(Args)]
pub struct BuildArgs {
    /// Resume from this object index
    #[arg(long, default_value = "0", conflicts_with = "after")]
    pub start: usize,

    /// Resume from the object following this identifier
    #[arg(long)]
    pub after: Option<String>,
}

/// Index of the first object to process, from either resume flag
fn start_index(args: &BuildArgs, objects: &[ObjectRecord]) -> anyhow::Result<usize> {
    match &args.after {
        None => Ok(args.start),
        Some(id) => {
            let id = EntityId::from(id.as_str());
            match objects.iter().position(|o| o.identifier == id) {
                Some(index) => Ok(index + 1),
                None => bail!("object {id} not found in the input"),
            }
        }
    }
}

pub async fn run(args: &BuildArgs, cli: &Cli) -> anyhow::Result<()> {
    let objects = load_objects(&cli.objects)?;
    let start = start_index(args, &objects)?;
    let config = cli.config();
    let client = cli.client();
    let resolver = PathResolver::new(&client, &config);

    let mut store = EdgeStore::load(&cli.graph)?;
    tracing::info!(
        "Resuming with {} existing edges, starting at object {}/{}",
        store.len(),
        start,
        objects.len()
    );

    let report = construct(
        &mut store, &resolver, &client, &config, &objects, start, &cli.graph,
    )
    .await?;

    let mut text = format!(
        "Anchored {} of {} objects ({} already anchored); {} edges total",
        report.anchored,
        report.processed,
        report.skipped,
        store.len()
    );
    for id in &report.unreachable {
        text.push_str(&format!("\n  unreachable: {id}"));
    }
    print_summary(&report, &text, OutputFormat::from(cli.format.as_str()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_index_after_identifier() {
        let objects = vec![
            ObjectRecord::new("Q144", "Dog"),
            ObjectRecord::new("Q146", "Cat"),
            ObjectRecord::new("Q726", "Horse"),
        ];
        let args = BuildArgs {
            start: 0,
            after: Some("Q146".to_string()),
        };
        assert_eq!(start_index(&args, &objects).unwrap(), 2);

        let args = BuildArgs {
            start: 1,
            after: None,
        };
        assert_eq!(start_index(&args, &objects).unwrap(), 1);

        let args = BuildArgs {
            start: 0,
            after: Some("Q999".to_string()),
        };
        assert!(start_index(&args, &objects).is_err());
    }
}
