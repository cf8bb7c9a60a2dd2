//! Offline summary and JSON report of the computed prediction sets.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use stormcore::prediction::ErrorChart;
use stormcore::prelude::{PredictionSet, Storm};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StormReport {
    pub id: String,
    pub name: String,
    pub fixes: usize,
    /// Model tag to great-circle error at the last fix, km.
    pub final_error_km: BTreeMap<String, u32>,
    pub predictions: Option<PredictionSet>,
}

pub fn summarize(storms: &[Storm]) -> Vec<StormReport> {
    storms
        .iter()
        .map(|storm| {
            let chart = ErrorChart::for_storm(storm);
            let final_error_km = chart
                .series
                .iter()
                .map(|series| {
                    (
                        series.model.tag().to_string(),
                        series.errors_km.last().copied().unwrap_or(0),
                    )
                })
                .collect();
            StormReport {
                id: storm.id.clone(),
                name: storm.name.clone(),
                fixes: storm.track.len(),
                final_error_km,
                predictions: storm.predictions.clone(),
            }
        })
        .collect()
}

pub fn render_summary(reports: &[StormReport]) -> String {
    let mut out = String::new();
    for report in reports {
        let errors: Vec<String> = report
            .final_error_km
            .iter()
            .map(|(model, km)| format!("{model}={km}km"))
            .collect();
        out.push_str(&format!(
            "{:<18} fixes={:<3} final error {}\n",
            report.name,
            report.fixes,
            errors.join(" ")
        ));
    }
    out
}

pub fn write_report(path: &Path, reports: &[StormReport]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating report directory {}", parent.display()))?;
    }
    let file =
        File::create(path).with_context(|| format!("creating report {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), reports)
        .with_context(|| format!("writing report {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stormcore::prelude::TrackPoint;
    use tempfile::tempdir;

    fn storm() -> Storm {
        let track = vec![
            TrackPoint::new(-70.0, 20.0, 90.0, 970.0),
            TrackPoint::new(-71.0, 21.0, 95.0, 965.0),
        ];
        let mut gfs = track.clone();
        gfs[1].lon += 1.0;
        Storm {
            id: "ian2022".into(),
            name: "Hurricane Ian".into(),
            category: "Category 5".into(),
            dates: "Sep 23 - Oct 2, 2022".into(),
            basin: "Atlantic".into(),
            predictions: Some(PredictionSet {
                ai: track.clone(),
                ecmwf: track.clone(),
                gfs,
            }),
            track,
        }
    }

    #[test]
    fn summary_uses_last_fix_error() {
        let reports = summarize(&[storm()]);
        let errors = &reports[0].final_error_km;
        assert_eq!(errors["ai"], 0);
        assert_eq!(errors["ecmwf"], 0);
        assert!((100..=105).contains(&errors["gfs"]));
        assert!(render_summary(&reports).starts_with("Hurricane Ian"));
    }

    #[test]
    fn report_round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("report.json");
        let reports = summarize(&[storm()]);
        write_report(&path, &reports).unwrap();
        let read: Vec<StormReport> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(read, reports);
    }
}
