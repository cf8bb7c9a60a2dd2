use crate::math::haversine_km;
use crate::prelude::{ModelKind, Storm};
use serde::{Deserialize, Serialize};

/// Hours between consecutive fixes in the source data.
pub const HOURS_PER_INDEX: usize = 12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorSeries {
    pub model: ModelKind,
    pub label: String,
    pub errors_km: Vec<u32>,
}

/// Track error per forecast hour for every model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorChart {
    pub labels: Vec<String>,
    pub series: Vec<ErrorSeries>,
}

impl ErrorChart {
    /// Great-circle distance between each model point and the observed point,
    /// rounded to whole kilometres. Missing forecasts count as zero error.
    pub fn for_storm(storm: &Storm) -> Self {
        let labels = (0..storm.track.len())
            .map(|i| format!("{}h", i * HOURS_PER_INDEX))
            .collect();

        let series = ModelKind::ALL
            .iter()
            .map(|&model| {
                let forecast = storm.predictions.as_ref().map(|set| set.get(model));
                let errors_km = storm
                    .track
                    .iter()
                    .enumerate()
                    .map(|(i, actual)| {
                        let predicted = forecast.and_then(|points| points.get(i)).unwrap_or(actual);
                        haversine_km(actual.lat, actual.lon, predicted.lat, predicted.lon).round()
                            as u32
                    })
                    .collect();
                ErrorSeries {
                    model,
                    label: model.label().to_string(),
                    errors_km,
                }
            })
            .collect();

        Self { labels, series }
    }

    pub fn series_for(&self, model: ModelKind) -> Option<&ErrorSeries> {
        self.series.iter().find(|series| series.model == model)
    }

    pub fn max_error(&self) -> u32 {
        self.series
            .iter()
            .flat_map(|series| series.errors_km.iter().copied())
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::{PredictionSet, TrackPoint};

    fn storm() -> Storm {
        let track = vec![
            TrackPoint::new(0.0, 0.0, 50.0, 1000.0),
            TrackPoint::new(1.0, 0.0, 50.0, 1000.0),
        ];
        let shifted: Vec<TrackPoint> = track
            .iter()
            .map(|p| TrackPoint::new(p.lon + 1.0, p.lat, p.wind, p.pressure))
            .collect();
        Storm {
            id: "eq".into(),
            name: "Equator".into(),
            category: "TS".into(),
            dates: "".into(),
            basin: "Atlantic".into(),
            track: track.clone(),
            predictions: Some(PredictionSet {
                ai: track.clone(),
                ecmwf: shifted,
                gfs: track[..1].to_vec(),
            }),
        }
    }

    #[test]
    fn labels_step_twelve_hours() {
        let chart = ErrorChart::for_storm(&storm());
        assert_eq!(chart.labels, vec!["0h", "12h"]);
    }

    #[test]
    fn errors_are_rounded_great_circle_km() {
        let chart = ErrorChart::for_storm(&storm());
        assert_eq!(chart.series_for(ModelKind::Ai).unwrap().errors_km, vec![0, 0]);
        assert_eq!(
            chart.series_for(ModelKind::Ecmwf).unwrap().errors_km,
            vec![111, 111]
        );
        assert_eq!(chart.max_error(), 111);
    }

    #[test]
    fn missing_forecast_points_count_as_zero() {
        let chart = ErrorChart::for_storm(&storm());
        assert_eq!(chart.series_for(ModelKind::Gfs).unwrap().errors_km, vec![0, 0]);

        let mut bare = storm();
        bare.predictions = None;
        assert_eq!(ErrorChart::for_storm(&bare).max_error(), 0);
    }
}
