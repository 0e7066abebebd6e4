//! Basic example showing how to use traced-sea-orm.
//!
//! Run with: cargo run --example basic

use std::time::Duration;

use sea_orm::{Database, DbBackend, Statement};
use traced_sea_orm::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,traced_sea_orm=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Connect to database
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/test".into());

    tracing::info!("Connecting to database...");

    let db = Database::connect(&database_url).await?;

    // Verbose printing follows TRACED_SEA_ORM_VERBOSE; records go out as
    // `traced_sea_orm::dependency` events.
    let config = TracingConfig::from_env("basic-example")
        .with_slow_query_threshold(Duration::from_millis(100));
    let traced_db = TracedConnection::with_config(db, LogTracer, config);

    // Or, with defaults:
    // let traced_db = db.with_tracer(LogTracer, "basic-example");

    let ctx = QueryContext::with_timeout(Duration::from_secs(5));

    traced_db
        .execute(
            &ctx,
            Statement::from_string(
                DbBackend::Postgres,
                "CREATE TABLE IF NOT EXISTS notes (id SERIAL PRIMARY KEY, body TEXT NOT NULL)",
            ),
        )
        .await?;

    let tx = traced_db.begin().await?;
    tx.named_execute(
        &ctx,
        "INSERT INTO notes (body) VALUES (:body)",
        &[("body", sea_orm::Value::from("hello"))],
    )
    .await?;
    tx.commit().await?;

    tracing::info!("Database calls reported with dependency tracing enabled");

    Ok(())
}
