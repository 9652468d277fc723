use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use typepath::client::{Client, ClientError, ResponseBody};
use typepath::config::{load_config, ClientConfig};
use typepath::Method;

#[derive(Parser)]
#[command(name = "typepath-cli")]
#[command(about = "Call a typepath server from the command line", long_about = None)]
struct Cli {
    /// Server base URL; overrides `client.base_url` from the config file.
    #[arg(short, long)]
    url: Option<String>,

    /// TOML configuration file (the `[client]` section is used).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ask for plain JSON instead of enriched JSON.
    #[arg(long)]
    plain: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// GET a path
    Get(CallArgs),
    /// POST to a path
    Post(CallArgs),
    /// PUT to a path
    Put(CallArgs),
    /// PATCH a path
    Patch(CallArgs),
    /// DELETE a path
    Delete(CallArgs),
}

#[derive(Args)]
struct CallArgs {
    /// Path template or concrete path, e.g. `/items/:id` or `/items/42`.
    path: String,

    /// Path parameter as name=value (repeatable).
    #[arg(short, long = "param", value_parser = parse_pair)]
    params: Vec<(String, String)>,

    /// Query pair as key=value (repeatable).
    #[arg(short, long = "query", value_parser = parse_pair)]
    query: Vec<(String, String)>,

    /// Header as name=value (repeatable).
    #[arg(short = 'H', long = "header", value_parser = parse_pair)]
    headers: Vec<(String, String)>,

    /// JSON request body.
    #[arg(short, long)]
    json: Option<String>,

    /// Timeout in seconds for this call.
    #[arg(short, long)]
    timeout: Option<u64>,
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected name=value, got `{}`", s))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?.client,
        None => ClientConfig::default(),
    };
    if let Some(url) = cli.url {
        config.base_url = url;
    }
    if cli.plain {
        config.enriched = false;
    }
    let client = Client::new(config)?;

    let (method, args) = match cli.command {
        Commands::Get(args) => (Method::Get, args),
        Commands::Post(args) => (Method::Post, args),
        Commands::Put(args) => (Method::Put, args),
        Commands::Patch(args) => (Method::Patch, args),
        Commands::Delete(args) => (Method::Delete, args),
    };

    let mut request = client.request(method, args.path);
    for (name, value) in args.params {
        request = request.param(name, value);
    }
    for (key, value) in args.query {
        request = request.query(key, value);
    }
    for (name, value) in args.headers {
        request = request.header(name, value);
    }
    if let Some(body) = args.json {
        let value: serde_json::Value = serde_json::from_str(&body)?;
        request = request.json(&value);
    }
    if let Some(secs) = args.timeout {
        request = request.timeout(Duration::from_secs(secs));
    }

    match request.send().await {
        Ok(body) => print_response(body)?,
        Err(ClientError::Status { status, body }) => {
            eprintln!("Error: server returned status {}", status);
            if !body.is_empty() {
                eprintln!("Response: {}", body);
            }
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

fn print_response(body: ResponseBody) -> Result<(), Box<dyn std::error::Error>> {
    match body {
        ResponseBody::Json(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        ResponseBody::Enriched(value) => println!("{}", serde_json::to_string_pretty(&value.to_plain())?),
        ResponseBody::Binary(bytes) => match std::str::from_utf8(&bytes) {
            Ok(text) => println!("{}", text),
            Err(_) => eprintln!("<{} bytes of binary data>", bytes.len()),
        },
    }
    Ok(())
}
