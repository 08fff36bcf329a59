//! TicketPro backend
//!
//! Resolves the stack for the configured stage, connects the entity store,
//! checks the table and its search index answer, and publishes the stack
//! outputs (table name, user pool id, web client id) as JSON on stdout.

use std::sync::Arc;

use anyhow::Context;
use aws_config::BehaviorVersion;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ticketpro_backend::adapters::{DynamoDbEntityStore, InMemoryEntityStore, InMemoryIdentityDirectory};
use ticketpro_backend::app::EventCatalogService;
use ticketpro_backend::config::{Config, StoreBackend};
use ticketpro_backend::domain::ports::{EntityStore, IdentityDirectory};
use ticketpro_backend::domain::stack::{StackDefinition, StackOutputs};

/// Region used to name in-process directories when none is configured
const DEFAULT_REGION: &str = "us-east-1";

/// Category no event carries; searching it only proves the index answers
const PROBE_CATEGORY: &str = "__probe__";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ticketpro_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting TicketPro backend...");

    // Load configuration
    let config = Config::from_env().context("Invalid configuration")?;
    let stack = config.stack();
    log_stack(&stack);

    // Connect the entity store
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory entity store");
            let store = Arc::new(InMemoryEntityStore::new(stack.table.clone()));
            check_store(store).await?;
        }
        StoreBackend::DynamoDb => {
            tracing::info!(table = %stack.table.name, "Connecting to DynamoDB...");
            let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
            let store = Arc::new(DynamoDbEntityStore::new(&sdk_config, config.dynamodb()));
            check_store(store).await?;
            tracing::info!("DynamoDB connected");
        }
    }

    // Resolve the identity directory; config rejects a half-set id pair
    let directory = match (&config.user_pool_id, &config.user_pool_client_id) {
        (Some(pool_id), Some(client_id)) => InMemoryIdentityDirectory::with_ids(
            stack.directory.clone(),
            pool_id.clone(),
            client_id.clone(),
        ),
        _ => {
            tracing::info!("No user pool configured, using in-process directory");
            InMemoryIdentityDirectory::new(
                stack.directory.clone(),
                config.aws_region.as_deref().unwrap_or(DEFAULT_REGION),
            )
        }
    };

    let outputs = StackOutputs {
        table_name: stack.table.name.clone(),
        user_pool_id: directory.directory_id(),
        user_pool_client_id: directory.client_id(),
    };
    for (name, description, value) in outputs.described() {
        tracing::info!(output = name, value, "{}", description);
    }

    println!("{}", serde_json::to_string_pretty(&outputs)?);
    Ok(())
}

fn log_stack(stack: &StackDefinition) {
    tracing::info!(
        stage = %stack.stage,
        table = %stack.table.name,
        pk = %stack.table.primary_key.partition_key,
        sk = %stack.table.primary_key.sort_key,
        "Entity store table"
    );
    for index in &stack.table.indexes {
        tracing::info!(
            index = %index.name,
            pk = %index.key.partition_key,
            sk = %index.key.sort_key,
            "Global secondary index"
        );
    }
    tracing::info!(
        pool = %stack.directory.pool_name,
        client = %stack.directory.client.name,
        "Identity directory"
    );
}

/// Run a search against the index so a missing table or index fails at startup
async fn check_store<S: EntityStore>(store: Arc<S>) -> anyhow::Result<()> {
    let catalog = EventCatalogService::new(store);
    catalog
        .search(PROBE_CATEGORY, None)
        .await
        .context("Entity store is not reachable")?;
    tracing::debug!("Table and search index answered");
    Ok(())
}
