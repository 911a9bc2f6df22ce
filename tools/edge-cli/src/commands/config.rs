//! Configuration management commands.

use std::fs;

use anyhow::{bail, Context as _, Result};

use super::{ConfigArgs, ConfigCommand};
use crate::config::{generate_default_config, CONFIG_FILE_NAMES};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx).await,
        ConfigCommand::Init { force } => init_config(force, ctx).await,
        ConfigCommand::Validate => validate_config(ctx).await,
    }
}

async fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match ctx.config_path {
        Some(ref path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults, no config file found)"),
    }

    // Cache section
    ctx.output.info("[cache]");
    ctx.output.kv("prefix", &format!("{:?}", ctx.config.cache.prefix));
    ctx.output.kv("ttl_secs", &ctx.config.cache.ttl_secs.to_string());

    // Resolver section
    ctx.output.info("[resolver]");
    ctx.output
        .kv("debounce_ms", &ctx.config.resolver.debounce_ms.to_string());
    ctx.output.kv(
        "absent_markers",
        &format!("{:?}", ctx.config.resolver.absent_markers).to_lowercase(),
    );

    // Store section
    ctx.output.info("[store]");
    ctx.output.kv(
        "path",
        ctx.config.store.path.as_deref().unwrap_or("(in-memory)"),
    );

    // Sections
    if !ctx.config.sections.is_empty() {
        ctx.output.info("Sections:");
        for section in &ctx.config.sections {
            let mut line = section.name.clone();
            if !section.required.is_empty() {
                line.push_str(&format!(" requires [{}]", section.required.join(", ")));
            }
            if !section.optional.is_empty() {
                line.push_str(&format!(" optional [{}]", section.optional.join(", ")));
            }
            if ctx.config.fixtures.contains_key(&section.name) {
                line.push_str(" (fixture)");
            }
            ctx.output.list_item(&line);
        }
    }

    Ok(())
}

async fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join(CONFIG_FILE_NAMES[0]);

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, generate_default_config())
        .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

    ctx.output
        .success(&format!("Created: {}", config_path.display()));

    Ok(())
}

async fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let (errors, warnings) = ctx.config.validate();

    if errors.is_empty() && warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for error in &errors {
        ctx.output.error(&format!("Error: {}", error));
    }

    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    if !errors.is_empty() {
        bail!("Configuration has {} error(s)", errors.len());
    }

    ctx.output.success("Configuration is valid (with warnings)");

    Ok(())
}
