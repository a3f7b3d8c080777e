use std::{fs::File, io::Read, time::Duration};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::preview::display::Thresholds;

#[derive(Deserialize, Debug)]
pub struct Config {
    pub system: System,
    #[serde(default)]
    pub preview: Preview,
}

#[derive(Deserialize, Debug)]
pub struct System {
    pub data_path: camino::Utf8PathBuf,
    pub bind_addr: String,
    pub base_url: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Preview {
    /// Seconds between reaper passes, 0 turns the background reaper off.
    pub gc_interval_secs: u64,
    pub ellipse_threshold_artist: usize,
    pub ellipse_threshold_title: usize,
}

impl Default for Preview {
    fn default() -> Self {
        let thresholds = Thresholds::default();
        Preview {
            gc_interval_secs: 300,
            ellipse_threshold_artist: thresholds.artist,
            ellipse_threshold_title: thresholds.title,
        }
    }
}

impl Preview {
    pub fn gc_interval(&self) -> Option<Duration> {
        (self.gc_interval_secs > 0).then(|| Duration::from_secs(self.gc_interval_secs))
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            artist: self.ellipse_threshold_artist,
            title: self.ellipse_threshold_title,
        }
    }
}

impl System {
    /// Prefix for stream URLs handed out with previews.
    pub fn stream_base(&self) -> String {
        let base = match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}", self.bind_addr),
        };
        format!("{base}/play/index.php?")
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

const DEFAULT_CFG: &str = "prevue.toml";
impl Config {
    pub fn new(path: Option<String>) -> Result<Self, Error> {
        let path = path.unwrap_or_else(|| {
            info!("no config file path provided, using default ({DEFAULT_CFG})");
            DEFAULT_CFG.to_string()
        });

        let mut fh = File::open(path)?;
        let mut data = String::new();
        fh.read_to_string(&mut data)?;

        Self::parse(&data)
    }

    pub fn parse(data: &str) -> Result<Self, Error> {
        Ok(toml::from_str(data)?)
    }
}
