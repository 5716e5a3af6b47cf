use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;
use vigil_config::DataConfig;
use vigil_rule::{DataSnapshot, MemoryDataSource};

pub fn load_snapshot(path: &Path) -> Result<DataSnapshot> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse snapshot {}", path.display()))
}

/// Empty source when no snapshot is configured.
pub fn build_source(config: &DataConfig) -> Result<MemoryDataSource> {
    let Some(path) = &config.snapshot else {
        info!("No data snapshot configured, starting with an empty data source");
        return Ok(MemoryDataSource::new());
    };

    let snapshot = load_snapshot(path)?;
    info!(
        path = %path.display(),
        entities = snapshot.entities.len(),
        metrics = snapshot.metrics.len(),
        events = snapshot.events.len(),
        "Data snapshot loaded"
    );

    Ok(MemoryDataSource::from_snapshot(snapshot))
}
