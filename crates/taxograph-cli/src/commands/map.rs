//! Map command: resolve pattern-specific path evidence

use clap::Args;
use serde::Serialize;

use crate::commands::{load_objects, save_objects};
use crate::output::{print_summary, OutputFormat};
use crate::Cli;
use taxograph_core::{ObjectRecord, PathEvidence, PathResolver};

#[derive(Args)]
pub struct MapArgs {
    /// Re-resolve evidence for objects that already carry it
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Default, Serialize)]
struct MapSummary {
    mapped: usize,
    skipped: usize,
}

fn has_evidence(record: &ObjectRecord) -> bool {
    record.evidence().is_ok()
}

fn apply_evidence(record: &mut ObjectRecord, evidence: PathEvidence) {
    match evidence {
        PathEvidence::DirectInstance { superclass } => {
            record.superclass = Some(superclass);
        }
        PathEvidence::DirectSubclass { superclasses } => {
            record.superclasses = Some(superclasses);
        }
        PathEvidence::TaxonChain { links } => {
            record.taxon_superclasses = Some(links);
        }
        PathEvidence::SubclassThenTaxonChain { superclass, links } => {
            record.superclass = Some(superclass);
            record.taxon_superclasses = Some(links);
        }
    }
}

pub async fn run(args: &MapArgs, cli: &Cli) -> anyhow::Result<()> {
    let mut objects = load_objects(&cli.objects)?;
    let config = cli.config();
    let client = cli.client();
    let resolver = PathResolver::new(&client, &config);

    let mut summary = MapSummary::default();
    for index in 0..objects.len() {
        if has_evidence(&objects[index]) && !args.force {
            summary.skipped += 1;
            continue;
        }
        // an absent or unrecognized pattern tag aborts; rerun `classify` first
        let pattern = match objects[index].pattern() {
            Ok(pattern) => pattern,
            Err(e) => {
                save_objects(&cli.objects, &objects)?;
                return Err(e.into());
            }
        };
        match resolver
            .map_evidence(&objects[index].identifier, pattern)
            .await
        {
            Ok(evidence) => {
                apply_evidence(&mut objects[index], evidence);
                summary.mapped += 1;
            }
            Err(e) => {
                // keep the evidence resolved so far
                save_objects(&cli.objects, &objects)?;
                return Err(e.into());
            }
        }
    }

    save_objects(&cli.objects, &objects)?;
    print_summary(
        &summary,
        &format!(
            "Mapped evidence for {} objects ({} already mapped)",
            summary.mapped, summary.skipped
        ),
        OutputFormat::from(cli.format.as_str()),
    );
    Ok(())
}
