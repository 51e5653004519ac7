use std::sync::Arc;

use anyhow::Context;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};
use tracing::debug;

use outbox_store::{Event, EventId, FileBackend, OfflineStore, StoreConfig};

use crate::config::{Cli, Command};

/// Open the store described by the global flags
pub async fn open_store(cli: &Cli) -> anyhow::Result<OfflineStore> {
    let config = match &cli.config {
        Some(path) => StoreConfig::from_json_file(path)
            .with_context(|| format!("loading store config {}", path.display()))?,
        None => StoreConfig::default(),
    };

    let backend = FileBackend::open(&cli.dir)
        .await
        .with_context(|| format!("opening store directory {}", cli.dir.display()))?;

    let store = OfflineStore::builder(Arc::new(backend)).initialize(&config, &cli.endpoint)?;
    store.probe().await.context("store backend is not readable")?;
    Ok(store)
}

/// Run one command and return its JSON output
pub async fn run(cli: Cli) -> anyhow::Result<Value> {
    let store = open_store(&cli).await?;
    debug!(key = %store.storage_key(), command = ?cli.command, "Running command");

    let output = execute(&store, cli.command).await;
    store.teardown().await;
    output
}

async fn execute(store: &OfflineStore, command: Command) -> anyhow::Result<Value> {
    let output = match command {
        Command::Add {
            data,
            base64,
            tier,
            id,
        } => {
            let event = match (data, base64) {
                (_, Some(encoded)) => {
                    let bytes = STANDARD
                        .decode(encoded.trim())
                        .context("--base64 is not valid standard base64")?;
                    Event::binary(bytes)
                }
                (Some(text), None) => Event::text(text),
                (None, None) => anyhow::bail!("either --data or --base64 is required"),
            };
            let stored = store
                .add_event(id.map(EventId::from), event.with_priority_tier(tier))
                .await?;
            serde_json::to_value(&stored)?
        }
        Command::List { limit } => serde_json::to_value(store.get_all_events(limit).await)?,
        Command::Next => serde_json::to_value(store.get_next_batch().await)?,
        Command::Remove { ids } => {
            let targets: Vec<Event> = ids
                .into_iter()
                .map(|id| Event::default().with_id(id))
                .collect();
            let removed: Vec<String> = store
                .remove_events(&targets)
                .await
                .into_iter()
                .filter_map(|event| event.id.map(EventId::into_string))
                .collect();
            json!({ "removed": removed })
        }
        Command::Clear => serde_json::to_value(store.clear().await)?,
        Command::Clean => json!({ "ok": store.clean().await }),
        Command::Info => {
            let (key, max_size, retention) = store.debug_targets();
            let settings = store.settings();
            let document = store.document().await;
            json!({
                "storageKey": key,
                "maxStorageSizeInBytes": max_size,
                "inStorageMaxTime": u64::try_from(retention.as_millis()).unwrap_or(u64::MAX),
                "eventsToDropPerTime": settings.drop_batch,
                "maxCriticalEvtsDropCnt": settings.max_tier,
                "events": document.as_ref().map_or(0, |doc| doc.len()),
                "documentBytes": document
                    .as_ref()
                    .and_then(|doc| doc.serialized_len().ok())
                    .unwrap_or(0),
                "lastAccessTime": document.as_ref().map_or(0, |doc| doc.last_access_time),
            })
        }
    };
    Ok(output)
}
