use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tui_choropleth::{EngineOptions, Metric};

/// Command line of the terminal viewer. Every flag overrides the
/// matching entry of the settings file.
#[derive(Parser, Debug)]
#[command(author, version, about = "Live choropleth of regional statistics in the terminal")]
pub struct Cli {
    /// JSON settings file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Map catalog (country and state maps with their geometry files)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Statistics JSON, re-read on every refresh
    #[arg(long)]
    pub stats: Option<PathBuf>,

    /// Map to open instead of the country map
    #[arg(long)]
    pub map: Option<String>,

    /// Initial metric (confirmed, active, recovered, deceased)
    #[arg(long)]
    pub metric: Option<Metric>,

    /// Statistics refresh interval in seconds
    #[arg(long)]
    pub refresh_secs: Option<u64>,

    /// Directory geometry paths are resolved against
    #[arg(long, conflicts_with = "geometry_url")]
    pub geometry_root: Option<PathBuf>,

    /// Base URL geometry paths are fetched from
    #[arg(long)]
    pub geometry_url: Option<String>,

    /// Log file (the terminal is taken by the map)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Settings file contents
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub catalog: Option<PathBuf>,
    pub stats: Option<PathBuf>,
    pub map: Option<String>,
    pub metric: Option<Metric>,
    pub refresh_secs: Option<u64>,
    pub geometry_root: Option<PathBuf>,
    pub geometry_url: Option<String>,
    pub log_file: Option<PathBuf>,
    pub engine: EngineOptions,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("invalid settings {}", path.display()))
    }
}

/// Where map geometry comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometrySource {
    Dir(PathBuf),
    Url(String),
}

/// Resolved viewer configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub catalog: PathBuf,
    pub stats: PathBuf,
    pub map: Option<String>,
    pub metric: Metric,
    pub refresh: Duration,
    pub geometry: GeometrySource,
    pub log_file: PathBuf,
    pub engine: EngineOptions,
}

impl Config {
    const DEFAULT_REFRESH_SECS: u64 = 30;

    pub fn load(cli: Cli) -> Result<Self> {
        let settings = match &cli.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        Ok(Self::merge(cli, settings))
    }

    fn merge(cli: Cli, settings: Settings) -> Self {
        let geometry = match (cli.geometry_root, cli.geometry_url) {
            (Some(dir), _) => GeometrySource::Dir(dir),
            (None, Some(url)) => GeometrySource::Url(url),
            (None, None) => match (settings.geometry_root, settings.geometry_url) {
                (Some(dir), _) => GeometrySource::Dir(dir),
                (None, Some(url)) => GeometrySource::Url(url),
                (None, None) => GeometrySource::Dir(PathBuf::from("data")),
            },
        };
        let refresh_secs = cli
            .refresh_secs
            .or(settings.refresh_secs)
            .unwrap_or(Self::DEFAULT_REFRESH_SECS)
            .max(1);

        Self {
            catalog: cli
                .catalog
                .or(settings.catalog)
                .unwrap_or_else(|| PathBuf::from("data/catalog.json")),
            stats: cli
                .stats
                .or(settings.stats)
                .unwrap_or_else(|| PathBuf::from("data/stats.json")),
            map: cli.map.or(settings.map),
            metric: cli.metric.or(settings.metric).unwrap_or(Metric::Confirmed),
            refresh: Duration::from_secs(refresh_secs),
            geometry,
            log_file: cli
                .log_file
                .or(settings.log_file)
                .unwrap_or_else(|| PathBuf::from("tui-choropleth.log")),
            engine: settings.engine,
        }
    }
}
