//! Inspect cached section entries.

use anyhow::{Context as _, Result};
use edge_cache::{CacheMetadata, MarkerCache};
use edge_markers::{MarkerSnapshot, StaticMarkers};
use serde::Serialize;
use serde_json::Value;

use super::InspectArgs;
use crate::context::Context;
use crate::output::format_millis;

#[derive(Debug, Serialize)]
struct Inspection {
    section: String,
    cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<CacheMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expired: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remaining_ms: Option<u64>,
    /// Lookup outcome for the markers given on the command line.
    #[serde(skip_serializing_if = "Option::is_none")]
    lookup: Option<&'static str>,
}

/// Run the inspect command.
pub async fn run(args: InspectArgs, ctx: &Context) -> Result<()> {
    let cache = ctx.open_cache()?;
    let inspection = inspect(&cache, &args, ctx)?;

    if ctx.output.is_json() {
        ctx.output.json(&inspection);
        return Ok(());
    }

    ctx.output.header(&format!("Section {}", inspection.section));

    let Some(ref metadata) = inspection.metadata else {
        ctx.output.info("Nothing cached for this section");
        return Ok(());
    };

    ctx.output.kv("markers", &metadata.markers.fingerprint());
    ctx.output.kv("expire_at", &metadata.expire_at.to_string());
    match inspection.remaining_ms {
        Some(remaining) if inspection.expired != Some(true) => {
            ctx.output.kv("expires in", &format_millis(remaining))
        }
        _ => ctx.output.kv("expires in", "expired"),
    }
    if let Some(lookup) = inspection.lookup {
        ctx.output.kv("lookup", lookup);
    }

    Ok(())
}

fn inspect(cache: &MarkerCache, args: &InspectArgs, ctx: &Context) -> Result<Inspection> {
    let now = cache.now_millis();
    let metadata = cache
        .metadata(&args.section)
        .with_context(|| format!("Failed to read cache metadata for {}", args.section))?;

    let lookup = if args.markers.is_empty() {
        None
    } else {
        let snapshot = snapshot_for(args, ctx)?;
        let outcome = cache.lookup::<Value>(&args.section, &snapshot)?;
        Some(outcome.label())
    };

    Ok(Inspection {
        section: args.section.clone(),
        cached: metadata.is_some(),
        expired: metadata.as_ref().map(|m| m.is_expired(now)),
        remaining_ms: metadata.as_ref().map(|m| m.remaining_millis(now)),
        metadata,
        lookup,
    })
}

/// Capture the markers of a configured section the way the resolver would.
fn snapshot_for(args: &InspectArgs, ctx: &Context) -> Result<MarkerSnapshot> {
    let markers = StaticMarkers::from_pairs(&args.markers).context("Invalid --marker")?;
    let definition = ctx
        .config
        .section(&args.section)
        .with_context(|| format!("Section {} is not in the config file", args.section))?;

    Ok(MarkerSnapshot::capture(
        &markers,
        &definition.required,
        &definition.optional,
        ctx.config.resolver.absent_markers,
    ))
}
