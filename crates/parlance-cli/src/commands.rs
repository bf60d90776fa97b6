//! Subcommand implementations.

use crate::cli::{Cli, Command};
use anyhow::{bail, Context, Result};
use parlance_config::{Config, ConfigLoader};
use parlance_i18n::{language_name, I18nService, LanguageTag, TemplateData};
use parlance_response::{build_info, CodeRegistry};
use serde_json::{json, Value};
use std::io::Write;
use tracing::{info, warn};

/// Resolves the configuration named on the command line.
///
/// Explicit files win, merged in order; otherwise an environment preset with
/// `PARLANCE_*` overrides; otherwise the default search path.
pub fn load_config(cli: &Cli) -> Result<Config> {
    let config = match (cli.config.as_slice(), &cli.env) {
        ([path], _) => ConfigLoader::load_from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        ([_, ..], _) => ConfigLoader::load_layered(&cli.config)
            .context("failed to load layered configuration")?,
        ([], Some(environment)) => {
            let mut config = Config::for_environment(environment);
            ConfigLoader::apply_env_overrides(&mut config)?;
            let config = config.normalized();
            config.validate()?;
            config
        }
        ([], None) => ConfigLoader::load()?,
    };
    Ok(config)
}

/// Runs `cli.command` against `config`, writing results to `out`.
pub async fn run(cli: &Cli, config: Config, out: &mut (dyn Write + Send)) -> Result<()> {
    match &cli.command {
        Command::Translate {
            language,
            id,
            data,
            count,
        } => translate(config, language, id, data, *count, out),
        Command::Check { strict } => check(config, *strict, out),
        Command::Codes { json } => codes(*json, out),
        Command::Stats => stats(config, out),
        Command::Watch => watch(config).await,
    }
}

fn translate(
    mut config: Config,
    language: &str,
    id: &str,
    data: &[String],
    count: Option<i64>,
    out: &mut dyn Write,
) -> Result<()> {
    config.watch = false;
    let data = parse_template_data(data)?;
    let service = I18nService::new(config)?;

    let text = match count {
        Some(count) => service.translate_plural(language, id, count, &data),
        None => service.translate(language, id, &data),
    };
    writeln!(out, "{text}")?;
    Ok(())
}

fn check(mut config: Config, strict: bool, out: &mut dyn Write) -> Result<()> {
    if strict {
        config.validate_strict()?;
    }
    config.watch = false;
    let service = I18nService::new(config)?;
    let mut findings = 0usize;

    for path in service.loader().validate_structure()? {
        writeln!(out, "missing file: {}", path.display())?;
        findings += 1;
    }

    let bundle = service.bundle();
    let reference = service.fallback_language().clone();
    let reference_ids = bundle.message_ids(&reference);

    for language in &service.config().locales.languages {
        let tag = LanguageTag::parse(language)?;
        if tag == reference {
            continue;
        }
        let missing: Vec<&str> = reference_ids
            .iter()
            .copied()
            .filter(|id| bundle.lookup(&tag, id).is_none())
            .collect();
        if missing.is_empty() {
            writeln!(out, "{tag}: complete")?;
        } else {
            writeln!(out, "{tag}: {} missing", missing.len())?;
            for id in &missing {
                writeln!(out, "  {id}")?;
            }
            findings += missing.len();
        }
    }

    info!("Locale check finished with {} findings", findings);
    if strict && findings > 0 {
        bail!("{findings} locale problems found");
    }
    Ok(())
}

fn codes(as_json: bool, out: &mut dyn Write) -> Result<()> {
    let registry = CodeRegistry::new(true);
    let definitions = registry.definitions();

    if as_json {
        serde_json::to_writer_pretty(&mut *out, &definitions)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "{:>6}  {:>6}  {:<13}  MESSAGE", "CODE", "HTTP", "CATEGORY")?;
    for definition in definitions {
        writeln!(
            out,
            "{:>6}  {:>6}  {:<13}  {}",
            definition.code,
            definition.http_status,
            definition.code.category(),
            definition.message
        )?;
    }
    Ok(())
}

fn stats(mut config: Config, out: &mut dyn Write) -> Result<()> {
    config.watch = false;
    config.pool.warm_up = true;
    let service = I18nService::new(config)?;

    let report = json!({
        "build": build_info(),
        "service": service.stats(),
        "metrics": service.metrics(),
        "files": service.loader().file_stats().ok(),
        "languages": service
            .bundle()
            .languages()
            .iter()
            .map(|tag| json!({ "code": tag.to_string(), "name": language_name(tag.as_str()) }))
            .collect::<Vec<_>>(),
    });
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    service.close();
    Ok(())
}

async fn watch(mut config: Config) -> Result<()> {
    config.watch = true;
    let service = I18nService::new(config)?;
    info!(
        "Watching {} for locale changes, press Ctrl-C to stop",
        service.config().locales.path.display()
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    info!("Received shutdown signal");
    service.close();
    Ok(())
}

/// Parses `key=value` pairs into template data.
///
/// Values that are valid JSON (numbers, booleans, quoted strings, arrays,
/// objects) keep their JSON type; anything else is taken as a plain string.
pub fn parse_template_data(pairs: &[String]) -> Result<TemplateData> {
    let mut data = TemplateData::new();
    for pair in pairs {
        let Some((key, raw)) = pair.split_once('=') else {
            bail!("template data must be KEY=VALUE, got '{pair}'");
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("template data key is empty in '{pair}'");
        }
        let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::from(raw));
        if data.insert(key.to_string(), value).is_some() {
            warn!("Template key '{}' given more than once, keeping the last value", key);
        }
    }
    Ok(data)
}
