//! Argument parsing and request execution for the `apikit` binary

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context};
use apikit_http::{
    ApiClient, ApiResponse, ClientConfig, Method, QueryParams, RequestDescriptor,
};
use clap::{ArgAction, Parser, Subcommand};
use serde_json::Value;
use tracing::{debug, Level};

#[derive(Debug, Parser)]
#[command(name = "apikit")]
#[command(about = "Send JSON requests through the apikit HTTP client", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Base URL that relative paths are resolved against
    #[arg(short, long, global = true)]
    pub base_url: Option<String>,

    /// TOML file with client configuration
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Extra header as `name:value` (repeatable)
    #[arg(short = 'H', long = "header", value_parser = parse_header, global = true)]
    pub headers: Vec<(String, String)>,

    /// Bearer token sent as `Authorization`
    #[arg(short, long, global = true)]
    pub token: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Maximum number of retries after the first attempt
    #[arg(short, long, global = true)]
    pub retries: Option<u32>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send a GET request
    Get {
        path: String,

        /// Query parameter as `key=value` (repeatable)
        #[arg(short, long = "query", value_parser = parse_query)]
        query: Vec<(String, String)>,
    },
    /// Send a POST request
    Post {
        path: String,

        /// JSON request body
        #[arg(short, long)]
        data: Option<String>,
    },
    /// Send a PUT request
    Put {
        path: String,

        /// JSON request body
        #[arg(short, long)]
        data: Option<String>,
    },
    /// Send a DELETE request
    Delete { path: String },
}

impl Command {
    fn method(&self) -> Method {
        match self {
            Command::Get { .. } => Method::Get,
            Command::Post { .. } => Method::Post,
            Command::Put { .. } => Method::Put,
            Command::Delete { .. } => Method::Delete,
        }
    }

    fn path(&self) -> &str {
        match self {
            Command::Get { path, .. }
            | Command::Post { path, .. }
            | Command::Put { path, .. }
            | Command::Delete { path } => path,
        }
    }
}

/// Install the fmt subscriber, writing to stderr so stdout stays JSON
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// Build the client configuration from the config file and flags
///
/// Flags override values from the file. A base URL must come from one of
/// the two.
pub fn build_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config_file(path, cli.base_url.as_deref())?,
        None => match &cli.base_url {
            Some(base_url) => ClientConfig::new(base_url.clone()),
            None => bail!("no base URL given; pass --base-url or set base_url in --config"),
        },
    };

    for (name, value) in &cli.headers {
        config.default_headers.insert(name.clone(), value.clone());
    }
    if let Some(token) = &cli.token {
        config.auth_token = Some(token.clone());
    }
    if let Some(ms) = cli.timeout_ms {
        config.timeout = Duration::from_millis(ms);
    }
    if let Some(retries) = cli.retries {
        config.retry.max_retries = retries;
    }

    config.validate()?;
    Ok(config)
}

fn load_config_file(path: &Path, base_url: Option<&str>) -> anyhow::Result<ClientConfig> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let mut table: toml::Table = toml::from_str(&source)
        .with_context(|| format!("invalid TOML in {}", path.display()))?;

    if let Some(base_url) = base_url {
        table.insert("base_url".to_string(), toml::Value::String(base_url.to_string()));
    }
    if !table.contains_key("base_url") {
        bail!(
            "{} does not set base_url; add it or pass --base-url",
            path.display()
        );
    }

    ClientConfig::from_toml_table(table)
        .with_context(|| format!("invalid client configuration in {}", path.display()))
}

/// Build the request described by `cli`
pub fn build_request(cli: &Cli) -> anyhow::Result<RequestDescriptor> {
    let mut request = RequestDescriptor::new(cli.command.method(), cli.command.path());

    match &cli.command {
        Command::Get { query, .. } if !query.is_empty() => {
            let params: QueryParams = query
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            request = request.with_params(params);
        }
        Command::Post { data: Some(data), .. } | Command::Put { data: Some(data), .. } => {
            let body: Value =
                serde_json::from_str(data).context("request body is not valid JSON")?;
            request = request.with_body(body);
        }
        _ => {}
    }

    Ok(request)
}

/// Execute the request described by `cli`
///
/// Configuration problems are returned as `Err`; request failures come back
/// inside the envelope.
pub async fn run(cli: &Cli) -> anyhow::Result<ApiResponse<Value>> {
    let config = build_config(cli)?;
    let request = build_request(cli)?;
    debug!(method = %request.method, url = %request.url, "Sending request");

    let client = ApiClient::new(config)?;
    Ok(client.execute(request).await)
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected name:value, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("header name is empty in '{raw}'"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn parse_query(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("query key is empty in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
