use std::{io::Write as _, path::PathBuf};

use clap::{ArgAction, ArgGroup, Parser};
use miette::{IntoDiagnostic as _, Result, WrapErr as _};
use smd_client::SmdClient;
use smd_config::{CONFIG_PATH_ENV, InventoryConfig, collect_env};
use smd_core::{FilterValue, Inventory};
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt, prelude::*};
use url::Url;

#[derive(Parser)]
#[command(name = "smd-inventory")]
#[command(version)]
#[command(about = "Dynamic inventory built from the smd hardware state manager")]
#[command(group(ArgGroup::new("mode").required(true).args(["list", "host"])))]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv, -vvvv).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Print every group and host.
    #[arg(long)]
    list: bool,

    /// Print the variables of a single host.
    #[arg(long, value_name = "HOST")]
    host: Option<String>,

    /// Config file (.yml, .yaml, .json or .json5).
    #[arg(short = 'c', long, env = CONFIG_PATH_ENV, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Base URL of the smd server.
    #[arg(long, value_name = "URL")]
    smd_server: Option<Url>,

    /// Minimum number of NID digits in host names.
    #[arg(long, value_name = "WIDTH")]
    nid_length: Option<usize>,

    /// Component filter; repeat a key to match any of several values.
    #[arg(long = "filter", value_name = "KEY=VALUE", value_parser = parse_filter)]
    filters: Vec<(String, String)>,

    /// Drop the configured filters before applying `--filter`.
    #[arg(long)]
    no_filter: bool,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_panic_hook();
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let config = load_config(&cli)?;
    let inventory = build_inventory(&config).await?;

    let doc = match &cli.host {
        Some(host) => inventory.to_host_json(host),
        None => inventory.to_list_json(),
    };
    print_json(&doc, cli.pretty)
}

fn init_tracing(verbose: u8) -> Result<()> {
    let filter = if std::env::var_os("RUST_LOG").is_some() {
        EnvFilter::try_from_default_env().into_diagnostic()?
    } else {
        let level = match verbose {
            0 => "error",
            1 => "warn",
            2 => "info",
            3 => "debug",
            _ => "trace",
        };
        EnvFilter::new(format!("error,smd_={level}"))
    };

    // stdout carries the inventory document
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_fmt::layer().with_writer(std::io::stderr))
        .with(ErrorLayer::default())
        .init();

    Ok(())
}

fn load_config(cli: &Cli) -> Result<InventoryConfig> {
    let mut config = match &cli.config {
        Some(path) => InventoryConfig::from_path(path)
            .map_err(smd_core::Error::from)
            .wrap_err("failed to load config")?,
        None => InventoryConfig::default(),
    };

    let env = collect_env(std::env::vars_os()).map_err(smd_core::Error::from)?;
    config.apply_env(&env).map_err(smd_core::Error::from)?;

    if let Some(server) = &cli.smd_server {
        config.smd_server = server.clone();
    }
    if let Some(nid_length) = cli.nid_length {
        config.nid_length = nid_length;
    }
    if cli.no_filter {
        config.filter_by.clear();
    }
    apply_filters(&mut config, &cli.filters);

    config.validate().map_err(smd_core::Error::from)?;
    Ok(config)
}

/// `--filter` values replace the configured value of the same key; repeats accumulate.
fn apply_filters(config: &mut InventoryConfig, filters: &[(String, String)]) {
    let mut overrides: Vec<(&str, FilterValue)> = Vec::new();
    for (key, value) in filters {
        match overrides.iter_mut().find(|(k, _)| *k == key.as_str()) {
            Some((_, existing)) => existing.push(value.clone()),
            None => overrides.push((key.as_str(), FilterValue::from(value.clone()))),
        }
    }
    for (key, value) in overrides {
        config.filter_by.insert(key, value);
    }
}

async fn build_inventory(config: &InventoryConfig) -> Result<Inventory> {
    let token = config.access_token(|name| std::env::var(name).ok());
    let client = SmdClient::new(config.smd_server.clone())?.with_token(token);
    if !client.is_authenticated() {
        info!(
            var = %config.access_token_envvar,
            "no access token found; querying smd unauthenticated"
        );
    }

    let snapshot = client.fetch(&config.filter_by).await?;
    let inventory = smd_core::build(
        &snapshot.components,
        &snapshot.memberships,
        &config.build_options(),
    )?;

    info!(
        hosts = inventory.host_count(),
        groups = inventory.groups().len(),
        server = %client.base_url(),
        "inventory ready"
    );
    Ok(inventory)
}

fn print_json(doc: &serde_json::Value, pretty: bool) -> Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(doc)
    } else {
        serde_json::to_string(doc)
    }
    .into_diagnostic()?;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{rendered}").into_diagnostic()?;
    stdout.flush().into_diagnostic()
}

fn parse_filter(input: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{input}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("filter key is empty in `{input}`"));
    }
    Ok((key.to_string(), value.to_string()))
}
