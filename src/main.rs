//! webcode-orm - smoke-test entry point.
//!
//! Prints the SQL templates of the application record types, or runs a
//! save/find/remove cycle against a live database.

use clap::Parser;
use webcode_orm::blog::{Blog, Comment, User};
use webcode_orm::config::{Command, Config};
use webcode_orm::db::{ConnectionPool, QueryExecutor};
use webcode_orm::error::{DbError, DbResult};
use webcode_orm::record::{Model, register};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init();
    }
}

fn templates_of<M: Model>() -> DbResult<serde_json::Value> {
    let schema = register::<M>()?;
    Ok(serde_json::json!({
        "model": schema.model(),
        "table": schema.table(),
        "primary_key": schema.primary_key().name(),
        "select": schema.select_sql(),
        "insert": schema.insert_sql(),
        "update": schema.update_sql(),
        "delete": schema.delete_sql(),
    }))
}

fn print_templates() -> Result<(), Box<dyn std::error::Error>> {
    let templates = vec![
        templates_of::<User>()?,
        templates_of::<Blog>()?,
        templates_of::<Comment>()?,
    ];
    println!("{}", serde_json::to_string_pretty(&templates)?);
    Ok(())
}

async fn save_find_remove(db: &QueryExecutor) -> DbResult<()> {
    let mut user = User {
        name: "Payne".to_string(),
        email: "payne@example.com".to_string(),
        passwd: "password".to_string(),
        admin: true,
        image: "about:blank".to_string(),
        ..Default::default()
    };
    user.save(db).await?;
    let id = user
        .id
        .clone()
        .ok_or_else(|| DbError::internal("saved user has no id"))?;
    info!(id = %id, "User saved");

    match User::find(db, id.as_str()).await? {
        Some(found) if found == user => info!(id = %id, "User found"),
        Some(found) => {
            return Err(DbError::internal(format!(
                "stored user differs: {:?}",
                found
            )));
        }
        None => return Err(DbError::internal("saved user not found")),
    }

    user.remove(db).await?;
    if User::find(db, id.as_str()).await?.is_some() {
        return Err(DbError::internal("removed user still present"));
    }
    info!(id = %id, "User removed");
    Ok(())
}

async fn smoke(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let pool = ConnectionPool::connect(config.pool_config()?).await?;
    let db = QueryExecutor::new(pool.clone());

    let result = save_find_remove(&db).await;
    info!(stats = ?pool.stats().await, "Pool statistics");
    pool.destroy().await;

    result?;
    println!("test ok");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from command line and environment
    let config = Config::parse();

    // Initialize logging
    init_tracing(&config);

    info!("Starting webcode-orm v{}", env!("CARGO_PKG_VERSION"));

    let result = match &config.command {
        Command::Templates => print_templates(),
        Command::Smoke => smoke(&config).await,
    };

    if let Err(e) = result {
        error!(error = %e, "Command failed");
        return Err(e);
    }

    Ok(())
}
