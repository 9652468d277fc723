//! typepath demo server.
//!
//! Serves a small route table that exercises every routing feature:
//!
//! ```text
//! POST /                 body {name}        → "Hello, <name>!"
//! GET  /items/:id                           → raw id
//! GET  /search           ?q&limit=10        → validated search
//! GET  /time                                → current time (a Date with x-superjson)
//! GET  /me               Bearer token guard → injected user
//! GET  /files/...path                       → captured remainder
//! ```

use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;

use typepath::config::{load_config, validate_server, TypepathConfig};
use typepath::lifecycle::on_ctrl_c;
use typepath::observability::{init_logging, init_metrics};
use typepath::schema::{fields, number, string, SchemaExt};
use typepath::{
    get, inject, listen, post, status, Context, Guard, RichValue, RouteError, RouteTable, Router,
};

#[derive(Parser)]
#[command(name = "typepath")]
#[command(about = "Demo server for the typepath router", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `server.listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override `server.observability.log_level`.
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Clone)]
struct User {
    name: String,
}

fn bearer_guard() -> Guard {
    Guard::new(|ctx: &Context| {
        let token = ctx
            .header("authorization")
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| status(401, "Unauthorized"))?;
        Ok(inject(User {
            name: token.to_string(),
        }))
    })
}

fn routes() -> RouteTable {
    RouteTable::new()
        .route(
            "/",
            post(|ctx: Context| async move {
                let name = ctx.body.as_ref().and_then(|b| b["name"].as_str()).unwrap_or_default();
                Ok::<_, RouteError>(format!("Hello, {}!", name))
            })
            .body(fields().field("name", string().min(1))),
        )
        .route(
            "/items/:id",
            get(|ctx: Context| async move {
                Ok::<_, RouteError>(ctx.param("id").unwrap_or_default().to_string())
            }),
        )
        .route(
            "/search",
            get(|ctx: Context| async move { Ok::<_, RouteError>(ctx.search.unwrap_or_default()) }).search(
                fields()
                    .field("q", string().optional())
                    .field("limit", number().coerce().integer().min(1.0).max(100.0).default(10)),
            ),
        )
        .route(
            "/time",
            get(|_ctx: Context| async move {
                Ok::<_, RouteError>(RichValue::object([("now", RichValue::from(Utc::now()))]))
            }),
        )
        .route(
            "/me",
            get(|ctx: Context| async move {
                let user = ctx.get::<User>().ok_or_else(|| status(401, "Unauthorized"))?;
                Ok::<_, RouteError>(user.name.clone())
            })
            .guard(bearer_guard()),
        )
        .route(
            "/files/...path",
            get(|ctx: Context| async move {
                Ok::<_, RouteError>(ctx.param("path").unwrap_or_default().to_string())
            }),
        )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => TypepathConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.listener.bind_address = bind;
    }
    if let Some(level) = cli.log_level {
        config.server.observability.log_level = level;
    }
    validate_server(&config.server).map_err(|issues| {
        issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    })?;

    init_logging(&config.server.observability.log_level);
    tracing::info!("typepath v{} starting", env!("CARGO_PKG_VERSION"));

    if config.server.observability.metrics_enabled {
        let addr = config.server.observability.metrics_address.parse()?;
        init_metrics(addr)?;
    }

    let router = Router::new(routes())?;
    let handle = listen(router, config.server).await?;
    tracing::info!(address = %handle.local_addr(), "Listening for connections");

    on_ctrl_c(handle.shutdown_signal()).await;
    handle.wait().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
