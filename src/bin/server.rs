// Employee GraphQL - Main Server
// Run with: cargo run --bin server

//! # Employee GraphQL Server Binary
//!
//! Starts the HTTP server in front of the employee schema.
//!
//! ## What This Server Provides
//!
//! - **GraphQL API**: `POST /graphql` for employee queries and mutations
//! - **GraphiQL Interface**: `GET /graphql`
//! - **Storage choice**: in-memory sample data (default) or NATS JetStream
//! - **CORS Support**: fixed local origins by default, credentials allowed
//!
//! ## Configuration
//!
//! Every flag can also come from the environment (or a `.env` file):
//! `SERVER_HOST`, `SERVER_PORT`, `EMPLOYEE_STORAGE`, `NATS_URL`,
//! `CORS_ORIGINS`, `LOG_LEVEL`. `RUST_LOG` overrides the log level.

use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use employee_graphql::server::graphql::DEFAULT_CORS_ORIGINS;
use employee_graphql::GraphQLServerBuilder;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StorageKind {
    /// In-process list seeded with sample rows
    Memory,
    /// NATS JetStream document bucket and id counter
    Nats,
}

#[derive(Parser, Debug)]
#[command(name = "employee-server")]
#[command(about = "GraphQL CRUD server for employee records")]
struct Cli {
    /// Address to bind
    #[arg(long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "SERVER_PORT", default_value_t = 4000)]
    port: u16,

    /// Storage backend
    #[arg(long, env = "EMPLOYEE_STORAGE", value_enum, default_value_t = StorageKind::Memory)]
    storage: StorageKind,

    /// NATS server URL (nats storage only)
    #[arg(long, env = "NATS_URL", default_value = "nats://localhost:4222")]
    nats_url: String,

    /// Browser origins allowed by CORS
    #[arg(long = "cors-origin", env = "CORS_ORIGINS", value_delimiter = ',')]
    cors_origins: Vec<String>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env is optional; real deployments set the environment directly
    if let Err(e) = dotenv() {
        eprintln!("Warning: Could not load .env file: {}", e);
    }

    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🚀 Starting Employee GraphQL Server...");
    info!("Server: {}:{}", cli.host, cli.port);

    let cors_origins = if cli.cors_origins.is_empty() {
        DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect()
    } else {
        cli.cors_origins
    };

    let mut builder = GraphQLServerBuilder::new()
        .with_host(cli.host)
        .with_port(cli.port)
        .with_cors_origins(cors_origins);

    match cli.storage {
        StorageKind::Memory => {
            info!("📋 Using in-memory employee storage");
        }
        StorageKind::Nats => {
            info!("📡 Using NATS employee storage at {}", cli.nats_url);
            builder = builder.with_nats(&cli.nats_url).await?;
        }
    }

    builder.build_and_run().await?;

    Ok(())
}
