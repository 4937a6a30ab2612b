//! Reduce command: drop redundant multi-hop edges

use clap::Args;

use crate::output::{print_summary, OutputFormat};
use crate::Cli;
use taxograph_core::{reduce, EdgeStore};

#[derive(Args)]
pub struct ReduceArgs {}

pub async fn run(_args: &ReduceArgs, cli: &Cli) -> anyhow::Result<()> {
    let mut store = EdgeStore::load(&cli.graph)?;
    let before = store.len();
    tracing::info!("Reducing {} edges from {}", before, cli.graph.display());

    let stats = reduce(&mut store)?;
    store.flush(&cli.graph)?;

    print_summary(
        &stats,
        &format!(
            "Removed {} redundant edges across {} multi-parent nodes ({} -> {} edges)",
            stats.edges_removed,
            stats.multi_parent_nodes,
            before,
            store.len()
        ),
        OutputFormat::from(cli.format.as_str()),
    );
    Ok(())
}
