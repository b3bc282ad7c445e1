//! Shared plumbing for the Crewboard command-line tools.

use anyhow::Context;
use crewboard_core::models::{ClientRow, NewClient};
use crewboard_core::{migrate_settings, Config, Settings, StoreBackend, SETTINGS_KEY};
use crewboard_db::{ClientRepository, DEMO_CLIENT_CODES};
use crewboard_services::{DemoGenerator, GenerationPlan, GeneratorOptions, Progress};
use crewboard_store::{create_store, MeteredStore, RemoteStore};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

/// Hand every progress update to `on_update` until the publishing side is dropped.
/// The last update published before the drop is still delivered.
pub async fn follow_progress(
    mut updates: watch::Receiver<Progress>,
    mut on_update: impl FnMut(&Progress),
) {
    while updates.changed().await.is_ok() {
        let update = updates.borrow_and_update().clone();
        on_update(&update);
    }
}

/// Read the settings blob from `path`. A missing file yields default settings.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file {}", path.display()))?;
    let document: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("Settings file {} is not valid JSON", path.display()))?;
    let blob = document
        .get(SETTINGS_KEY)
        .cloned()
        .unwrap_or(serde_json::Value::Null);
    Ok(migrate_settings(blob))
}

pub fn save_settings(path: &Path, settings: &Settings) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let mut document = serde_json::Map::new();
    document.insert(
        SETTINGS_KEY.to_string(),
        serde_json::to_value(settings).context("Serialize settings")?,
    );
    let out = serde_json::to_string_pretty(&document).context("Serialize settings")?;
    std::fs::write(path, out)
        .with_context(|| format!("Failed to write settings file {}", path.display()))?;
    Ok(())
}

/// Delete the settings file. Returns false when there was nothing to delete.
pub fn remove_settings(path: &Path) -> anyhow::Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    std::fs::remove_file(path)
        .with_context(|| format!("Failed to remove settings file {}", path.display()))?;
    Ok(true)
}

/// Tenant selector to use: explicit argument, then the saved selection, then the
/// configured default. Empty means "let the fallback chain decide".
pub fn tenant_selector(explicit: Option<&str>, settings: &Settings, config: &Config) -> String {
    explicit
        .map(str::to_string)
        .or_else(|| settings.selected_client.clone())
        .or_else(|| config.default_client_code.clone())
        .unwrap_or_default()
}

/// Load configuration and connect to the configured store, wrapped for call counting.
///
/// The in-memory backend starts empty, so it is seeded with a demo tenant first.
pub async fn connect() -> anyhow::Result<(Config, Arc<MeteredStore>)> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let store = create_store(&config).context("Failed to create store")?;
    tracing::info!(backend = ?config.store_backend, "Connected to store");

    if config.store_backend == StoreBackend::Memory {
        seed_memory_demo(store.clone(), &config).await?;
    }
    Ok((config, Arc::new(MeteredStore::new(store))))
}

/// Insert the first demo tenant with `generator_target_count` people
pub async fn seed_memory_demo(store: Arc<dyn RemoteStore>, config: &Config) -> anyhow::Result<ClientRow> {
    let code = config
        .default_client_code
        .clone()
        .unwrap_or_else(|| DEMO_CLIENT_CODES[0].to_string());
    let client = ensure_client(store.clone(), &code).await?;
    let plan = GenerationPlan::new(config.generator_target_count, config.generator_batch_size);
    let report = DemoGenerator::new(store, GeneratorOptions::default())
        .run(&client, &plan, |_| {})
        .await
        .context("Failed to seed in-memory demo data")?;
    tracing::info!(
        client_code = %client.client_code,
        people = report.people_inserted,
        "Seeded in-memory demo tenant"
    );
    Ok(client)
}

/// Find a client by code, creating it when missing
pub async fn ensure_client(store: Arc<dyn RemoteStore>, code: &str) -> anyhow::Result<ClientRow> {
    let repo = ClientRepository::new(store);
    if let Some(client) = repo.get_by_code(code).await? {
        return Ok(client);
    }
    let name = code
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ");
    let client = repo
        .create(&NewClient {
            client_code: code.to_string(),
            domain: format!("{}.example.com", code.to_lowercase().replace('_', "-")),
            name,
            status: "active".to_string(),
        })
        .await
        .with_context(|| format!("Failed to create client {}", code))?;
    tracing::info!(client_code = %client.client_code, "Created client");
    Ok(client)
}

/// Print per-table call counts to stderr
pub fn print_query_stats(store: &MeteredStore) {
    eprintln!("Store calls: {}", store.total());
    for ((table, operation), calls) in store.snapshot() {
        eprintln!("  {:<20} {:<7} {}", table.to_string(), operation.to_string(), calls);
    }
}
