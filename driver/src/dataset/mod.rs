//! Storm and city data: an external JSON file with an embedded fallback.

use anyhow::Context;
use log::{info, warn};
use std::fmt;
use std::path::{Path, PathBuf};
use stormcore::prelude::Dataset;

const EMBEDDED_DATASET: &str = include_str!("../../data/storms.json");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    File(PathBuf),
    Embedded,
}

impl fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetSource::File(path) => write!(f, "{}", path.display()),
            DatasetSource::Embedded => f.write_str("embedded dataset"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub dataset: Dataset,
    pub source: DatasetSource,
}

pub fn parse_dataset(contents: &str) -> anyhow::Result<Dataset> {
    let dataset: Dataset = serde_json::from_str(contents).context("parsing storm dataset")?;
    Ok(without_empty_tracks(dataset))
}

pub fn embedded_dataset() -> anyhow::Result<Dataset> {
    parse_dataset(EMBEDDED_DATASET).context("embedded dataset is malformed")
}

/// Reads `path` when given; any read or parse failure falls back to the embedded dataset.
pub async fn load_dataset(path: Option<&Path>) -> anyhow::Result<LoadedDataset> {
    if let Some(path) = path {
        match read_file(path).await {
            Ok(dataset) => {
                info!(
                    "loaded {} storms and {} cities from {}",
                    dataset.storms.len(),
                    dataset.cities.len(),
                    path.display()
                );
                return Ok(LoadedDataset {
                    dataset,
                    source: DatasetSource::File(path.to_path_buf()),
                });
            }
            Err(err) => warn!("{:#}; using embedded dataset", err),
        }
    }

    Ok(LoadedDataset {
        dataset: embedded_dataset()?,
        source: DatasetSource::Embedded,
    })
}

async fn read_file(path: &Path) -> anyhow::Result<Dataset> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading dataset {}", path.display()))?;
    parse_dataset(&contents).with_context(|| format!("in {}", path.display()))
}

fn without_empty_tracks(mut dataset: Dataset) -> Dataset {
    dataset.storms.retain(|storm| {
        if storm.track.is_empty() {
            warn!("skipping storm {} with an empty track", storm.id);
        }
        !storm.track.is_empty()
    });
    dataset
}
