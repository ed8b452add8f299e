//! Employee Admin CLI
//!
//! Administrative CLI for the employee data stored in NATS.
//! Provides inspection, seeding and cleanup of the document bucket and the
//! id counters.

use anyhow::Result;
use clap::{Parser, Subcommand};
use employee_graphql::engine::nats_storage::{NATSStorage, NATSStorageConfig};
use employee_graphql::models::EMPLOYEE_SEQUENCE;
use employee_graphql::{EmployeeStorage, SequenceCounter};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "employee-admin")]
#[command(about = "Employee Admin CLI - Manage employee data in NATS")]
#[command(version = "1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// NATS server URL
    #[arg(long, env = "NATS_URL", default_value = "nats://localhost:4222")]
    nats_url: String,

    /// Key-value bucket holding employee documents
    #[arg(long, env = "EMPLOYEE_BUCKET", default_value = "employees")]
    bucket: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show document count and counter position
    Stats,

    /// List all employees in id order
    List,

    /// Insert the sample employees if the bucket is empty
    Seed,

    /// Advance a named counter and print the new value
    NextId {
        /// Counter name
        #[arg(default_value = EMPLOYEE_SEQUENCE)]
        name: String,
    },

    /// Delete every employee document (counters are kept)
    Purge {
        /// Confirm the purge
        #[arg(long)]
        confirm: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    let config = NATSStorageConfig {
        nats_urls: vec![cli.nats_url.clone()],
        bucket: cli.bucket.clone(),
        ..Default::default()
    };
    let nats = NATSStorage::new(config).await?;

    match cli.command {
        Commands::Stats => show_stats(&nats).await?,
        Commands::List => list_employees(&nats).await?,
        Commands::Seed => seed(&nats).await?,
        Commands::NextId { name } => next_id(&nats, &name).await?,
        Commands::Purge { confirm } => {
            if !confirm {
                error!("❌ Purge operation requires --confirm flag for safety");
                return Ok(());
            }
            purge(&nats).await?;
        }
    }

    Ok(())
}

async fn show_stats(nats: &NATSStorage) -> Result<()> {
    let storage = nats.document_storage();

    println!("\n📈 Employee Data Statistics");
    println!("===========================");
    println!("Bucket: {}", nats.config().bucket);
    println!("Employees: {}", storage.count().await?);
    println!("Last issued id: {}", storage.current_id().await?);

    Ok(())
}

async fn list_employees(nats: &NATSStorage) -> Result<()> {
    let employees = nats.document_storage().list_employees().await?;

    println!("\n📋 Employees ({})", employees.len());
    println!("=====================================");

    if employees.is_empty() {
        println!("No employees found.");
        return Ok(());
    }

    for employee in employees {
        println!(
            "{:>4}  {:<12} {:>3}  {:<10} {:<12} {:>5}",
            employee.id.as_str(), employee.name, employee.age, employee.job, employee.language, employee.pay
        );
    }

    Ok(())
}

async fn seed(nats: &NATSStorage) -> Result<()> {
    let inserted = nats.document_storage().seed_if_empty().await?;
    if inserted == 0 {
        info!("Bucket already holds employees, nothing seeded");
    } else {
        info!("✅ Seeded {} sample employees", inserted);
    }
    Ok(())
}

async fn next_id(nats: &NATSStorage, name: &str) -> Result<()> {
    let value = nats.sequence().next_sequence(name).await?;
    println!("{}: {}", name, value);
    Ok(())
}

async fn purge(nats: &NATSStorage) -> Result<()> {
    info!("🧹 Deleting all employee documents...");
    let deleted = nats.collection().delete_all().await?;
    info!("✅ Deleted {} employees (id counters untouched)", deleted);
    Ok(())
}
