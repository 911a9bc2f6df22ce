//! Resolve sections through the cache and fixture loader.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context as _, Result};
use edge_markers::StaticMarkers;
use edge_resolver::{Resolution, ResolverError, SectionResolver, StaticLoader};
use futures::future::join_all;
use serde::Serialize;

use super::ResolveArgs;
use crate::context::Context;
use crate::output::status_badge;

/// One row of the resolve report.
#[derive(Debug, Serialize)]
struct ResolvedSection {
    section: String,
    #[serde(flatten)]
    outcome: Outcome,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Outcome {
    Resolved(Resolution),
    Failed { error: String },
}

/// Run the resolve command.
pub async fn run(args: ResolveArgs, ctx: &Context) -> Result<()> {
    let markers = StaticMarkers::from_pairs(&args.markers).context("Invalid --marker")?;
    tracing::info!(sections = ?args.sections, markers = markers.len(), "resolving sections");
    ctx.output
        .debug(&format!("Resolving with {} marker(s)", markers.len()));

    let loader = Arc::new(StaticLoader::from_values(ctx.config.fixtures.clone()));
    let resolver = build_resolver(ctx, &args, Arc::clone(&loader), markers)?;

    let results = join_all(
        args.sections
            .iter()
            .map(|section| resolver.resolve(section)),
    )
    .await;

    let report: Vec<ResolvedSection> = args
        .sections
        .iter()
        .zip(results)
        .map(|(section, result)| ResolvedSection {
            section: section.clone(),
            outcome: match result {
                Ok(resolution) => Outcome::Resolved(resolution),
                Err(e) => Outcome::Failed {
                    error: e.to_string(),
                },
            },
        })
        .collect();

    ctx.output
        .debug(&format!("{} batch fetch(es) issued", loader.call_count()));

    print_report(&report, ctx);

    let failed = report
        .iter()
        .filter(|row| matches!(row.outcome, Outcome::Failed { .. }))
        .count();
    if failed > 0 {
        bail!("{} of {} section(s) failed to resolve", failed, report.len());
    }

    Ok(())
}

fn build_resolver(
    ctx: &Context,
    args: &ResolveArgs,
    loader: Arc<StaticLoader>,
    markers: StaticMarkers,
) -> Result<SectionResolver> {
    let mut builder = SectionResolver::builder(loader, markers)
        .cache(ctx.open_cache()?)
        .config(&ctx.config.resolver);

    if let Some(ms) = args.debounce_ms {
        builder = builder.debounce(Duration::from_millis(ms));
    }

    let resolver = builder.build();
    for definition in &ctx.config.sections {
        resolver.register(definition.clone());
    }

    // Fail before anything is fetched
    if let Some(unknown) = args.sections.iter().find(|s| !resolver.is_registered(s)) {
        return Err(ResolverError::UnknownSection(unknown.clone()))
            .context("Add the section to the [[sections]] list of the config file");
    }

    Ok(resolver)
}

fn print_report(report: &[ResolvedSection], ctx: &Context) {
    if ctx.output.is_json() {
        ctx.output.json(&report);
        return;
    }

    ctx.output.header("Sections");

    let width = report
        .iter()
        .map(|row| row.section.len())
        .max()
        .unwrap_or(0);

    for row in report {
        match &row.outcome {
            Outcome::Resolved(resolution) => {
                ctx.output.table_row(
                    &[&row.section, &status_badge(resolution.status)],
                    &[width, 0],
                );
                ctx.output.kv("value", &resolution.value.to_string());
            }
            Outcome::Failed { error } => {
                ctx.output.table_row(&[&row.section, "FAILED"], &[width, 0]);
                ctx.output.warn(error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_resolver::ResolveStatus;
    use serde_json::json;

    #[test]
    fn test_report_json_shape() {
        let report = vec![
            ResolvedSection {
                section: "wishlist".to_string(),
                outcome: Outcome::Resolved(Resolution {
                    value: json!({"likedItems": []}),
                    status: ResolveStatus::Placeholder,
                }),
            },
            ResolvedSection {
                section: "shopping-cart".to_string(),
                outcome: Outcome::Failed {
                    error: "batch loader returned no value for section 'shopping-cart'"
                        .to_string(),
                },
            },
        ];

        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!([
                {"section": "wishlist", "value": {"likedItems": []}, "status": "placeholder"},
                {
                    "section": "shopping-cart",
                    "error": "batch loader returned no value for section 'shopping-cart'"
                }
            ])
        );
    }
}
