use crate::application::drag_resize::DEFAULT_CELL_SIZE_PX;
use crate::domain::chart::ChartInfo;
use crate::domain::grid::GridLayout;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub grid: GridSettings,
    pub persistence: PersistenceSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind_addr: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Memory,
    File,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    pub kind: StorageKind,
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GridSettings {
    pub columns: u32,
    pub rows: u32,
    pub gap: u32,
    pub cell_size_px: f64,
}

impl GridSettings {
    pub fn default_layout(&self) -> GridLayout {
        GridLayout {
            columns: self.columns,
            rows: self.rows,
            gap: self.gap,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PersistenceSettings {
    pub debounce_ms: u64,
}

impl PersistenceSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ChartsConfig {
    #[serde(default)]
    pub charts: Vec<ChartInfo>,
}

fn app_config_builder() -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
    let layout = GridLayout::default();
    Ok(config::Config::builder()
        .set_default("server.bind_addr", "0.0.0.0:8080")?
        .set_default("storage.kind", "memory")?
        .set_default("storage.path", "data/dashboards")?
        .set_default("grid.columns", i64::from(layout.columns))?
        .set_default("grid.rows", i64::from(layout.rows))?
        .set_default("grid.gap", i64::from(layout.gap))?
        .set_default("grid.cell_size_px", DEFAULT_CELL_SIZE_PX)?
        .set_default("persistence.debounce_ms", 800)?)
}

pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = app_config_builder()?
        .add_source(config::File::with_name("config/app").required(false))
        .add_source(config::Environment::with_prefix("APP").separator("__"))
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;
    validate(&config)?;
    Ok(config)
}

pub fn load_charts_config() -> anyhow::Result<ChartsConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/charts").required(false))
        .build()?;

    Ok(settings.try_deserialize()?)
}

fn validate(config: &AppConfig) -> anyhow::Result<()> {
    if config.grid.columns == 0 || config.grid.rows == 0 {
        anyhow::bail!("grid.columns and grid.rows must be positive");
    }
    if !(config.grid.cell_size_px.is_finite() && config.grid.cell_size_px > 0.0) {
        anyhow::bail!("grid.cell_size_px must be a positive number");
    }
    Ok(())
}
