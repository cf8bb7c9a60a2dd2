use proptest::prelude::*;
use stormcore::prediction::{
    BackendKind, LinearBackend, PredictorConfig, RegressionBackend, TrackPredictor, TrainingConfig,
};
use stormcore::prelude::{ModelSelection, Storm, TrackPoint, CONTEXT_WINDOW};
use stormcore::scene::{RenderBackend, RetainedScene, SceneTrackManager};
use stormcore::timeline::{index_for, TimelineController, SCRUB_MAX};

fn point_strategy() -> impl Strategy<Value = TrackPoint> {
    (-100.0..-30.0f64, 5.0..40.0f64, 20.0..180.0f64, 900.0..1010.0f64, 0u32..24).prop_map(
        |(lon, lat, wind, pressure, hour)| {
            TrackPoint::new(lon, lat, wind, pressure).with_time(format!("2024-07-01T{hour:02}:00Z"))
        },
    )
}

fn track_strategy(min: usize, max: usize) -> impl Strategy<Value = Vec<TrackPoint>> {
    prop::collection::vec(point_strategy(), min..max)
}

fn selection_strategy() -> impl Strategy<Value = ModelSelection> {
    prop_oneof![
        Just(ModelSelection::Ai),
        Just(ModelSelection::Ecmwf),
        Just(ModelSelection::Gfs),
        Just(ModelSelection::All),
    ]
}

fn storm_with(track: Vec<TrackPoint>) -> Storm {
    Storm {
        id: "prop".into(),
        name: "Property Storm".into(),
        category: "Category 1".into(),
        dates: "Jul 1-8, 2024".into(),
        basin: "Atlantic".into(),
        track,
        predictions: None,
    }
}

fn trained_predictor(seed: u64) -> TrackPredictor {
    let config = PredictorConfig {
        training: TrainingConfig {
            epochs: 2,
            ..TrainingConfig::default()
        },
        synthetic_sequences: 40,
        seed: Some(seed),
        ..PredictorConfig::default()
    };
    let mut backend = LinearBackend::new(BackendKind::Scalar);
    backend.initialize().unwrap();
    let mut predictor = TrackPredictor::new(config, Box::new(backend));
    predictor.build(|_, _| {}).unwrap();
    predictor.train(&[], |_, _| {}).unwrap();
    predictor
}

proptest! {
    #[test]
    fn index_is_monotonic_and_spans_the_track(a in 0u8..=100, b in 0u8..=100, len in 1usize..200) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(index_for(low, len) <= index_for(high, len));
        prop_assert_eq!(index_for(0, len), 0);
        prop_assert_eq!(index_for(SCRUB_MAX, len), len - 1);
        prop_assert!(index_for(high, len) < len);
    }

    #[test]
    fn ticking_never_passes_the_end(start in 0u8..=100, delta in 1u8..=40, ticks in 0usize..300) {
        let mut timeline = TimelineController::with_tick_delta(delta);
        timeline.set_scrub(start);
        timeline.set_playing(true);
        for _ in 0..ticks {
            timeline.tick();
            prop_assert!(timeline.scrub_percent() <= SCRUB_MAX);
        }
    }

    #[test]
    fn paused_timeline_does_not_move(start in 0u8..=100, ticks in 1usize..50) {
        let mut timeline = TimelineController::new();
        timeline.set_scrub(start);
        for _ in 0..ticks {
            prop_assert!(!timeline.tick());
        }
        prop_assert_eq!(timeline.scrub_percent(), start);
    }

    #[test]
    fn repeated_updates_keep_resources_flat(
        track in track_strategy(1, 30),
        max_index in 0usize..40,
        selection in selection_strategy(),
        repeats in 2usize..6,
    ) {
        let mut predictor = trained_predictor(11);
        let mut storm = storm_with(track);
        storm.predictions = Some(predictor.predict_storm(&storm).unwrap());

        let mut manager = SceneTrackManager::new(RetainedScene::new());
        manager.update(&storm, max_index, selection);
        let live = manager.backend().live_resources();
        for _ in 1..repeats {
            manager.update(&storm, max_index, selection);
            prop_assert_eq!(manager.backend().live_resources(), live);
        }
        prop_assert_eq!(live, manager.rendered_sources().len() * 3);
        prop_assert_eq!(manager.resource_counts().retained(), live);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn forecasts_stay_aligned_with_the_track(track in track_strategy(1, 40), seed in any::<u64>()) {
        let mut predictor = trained_predictor(seed);
        let set = predictor.predict_storm(&storm_with(track.clone())).unwrap();
        prop_assert!(set.is_aligned_with(&track));
        let seeded = track.len().min(CONTEXT_WINDOW);
        prop_assert_eq!(&set.ai[..seeded], &track[..seeded]);
        for (predicted, actual) in set.ai.iter().zip(&track).skip(CONTEXT_WINDOW) {
            prop_assert!((20.0..=180.0).contains(&predicted.wind));
            prop_assert!((880.0..=1020.0).contains(&predicted.pressure));
            prop_assert_eq!(&predicted.time, &actual.time);
        }
    }

    #[test]
    fn forecast_length_respects_steps(track in track_strategy(CONTEXT_WINDOW, 40), steps in 0usize..50) {
        let mut predictor = trained_predictor(3);
        let forecast = predictor.predict(&track, steps).unwrap();
        prop_assert_eq!(forecast.len(), track.len().min(steps + CONTEXT_WINDOW));
    }

    #[test]
    fn comparison_tracks_only_move_positions(track in track_strategy(0, 40), seed in any::<u64>()) {
        let mut predictor = trained_predictor(seed);
        let comparison = predictor.generate_comparison(&track);
        for generated in [&comparison.ecmwf, &comparison.gfs] {
            prop_assert_eq!(generated.len(), track.len());
            for (shifted, actual) in generated.iter().zip(&track) {
                prop_assert_eq!(shifted.wind, actual.wind);
                prop_assert_eq!(shifted.pressure, actual.pressure);
                prop_assert_eq!(&shifted.time, &actual.time);
            }
        }
        if let (Some(first), Some(actual)) = (comparison.ecmwf.first(), track.first()) {
            prop_assert_eq!(first, actual);
        }
        for (generated, base, lat_factor, lon_factor) in [
            (&comparison.ecmwf, 0.4, 0.6, 1.0),
            (&comparison.gfs, 0.7, 0.7, 0.7),
        ] {
            for (i, (shifted, actual)) in generated.iter().zip(&track).enumerate() {
                let error: f64 = base * (i as f64).sqrt();
                prop_assert!((shifted.lat - actual.lat).abs() <= 0.5 * error * lat_factor + 1e-9);
                prop_assert!((shifted.lon - actual.lon).abs() <= 0.5 * error * lon_factor + 1e-9);
            }
        }
    }
}
