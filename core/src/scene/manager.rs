use crate::math::{catmull_rom, lat_lon_to_3d, Vec3, TRACK_RADIUS};
use crate::prelude::{ModelSelection, Storm, TrackSource};
use crate::scene::backend::{RenderBackend, ResourceId, GLOW_MARKER, POSITION_MARKER};
use crate::scene::palette::track_color;
use crate::telemetry::{LogManager, MetricsRecorder, ResourceCounts};
use std::collections::BTreeMap;

/// Curve samples per segment between consecutive fixes.
const SAMPLES_PER_SPAN: usize = 8;

/// Resources drawn for one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderedTrack {
    pub path: ResourceId,
    pub marker: ResourceId,
    pub glow: ResourceId,
    pub points: usize,
}

impl RenderedTrack {
    fn resources(&self) -> [ResourceId; 3] {
        [self.path, self.marker, self.glow]
    }
}

/// Sources drawn for a selection: the chosen models, then the observed track.
pub fn sources_for(selection: ModelSelection) -> Vec<TrackSource> {
    selection
        .models()
        .into_iter()
        .map(TrackSource::Model)
        .chain(std::iter::once(TrackSource::Actual))
        .collect()
}

/// Owns the currently rendered tracks and replaces them wholesale on update.
pub struct SceneTrackManager<B: RenderBackend> {
    backend: B,
    current: BTreeMap<TrackSource, RenderedTrack>,
    metrics: MetricsRecorder,
    logger: LogManager,
}

impl<B: RenderBackend> SceneTrackManager<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            current: BTreeMap::new(),
            metrics: MetricsRecorder::new(),
            logger: LogManager::new("scene"),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Disposes the previous set, then draws `storm` up to `max_index`.
    ///
    /// Sources whose visible slice has fewer than two points are skipped.
    pub fn update(&mut self, storm: &Storm, max_index: usize, selection: ModelSelection) {
        self.clear();
        self.metrics.record_update();

        for source in sources_for(selection) {
            let Some(points) = storm.points_for(source) else {
                self.logger
                    .detail(&format!("{}: no predictions for {}", storm.id, source.tag()));
                continue;
            };
            let visible = &points[..points.len().min(max_index.saturating_add(1))];
            if visible.len() < 2 {
                continue;
            }

            let controls: Vec<Vec3> = visible
                .iter()
                .map(|point| lat_lon_to_3d(point.lat, point.lon, TRACK_RADIUS))
                .collect();
            let head = controls[controls.len() - 1];
            let color = track_color(source);

            let path = self
                .backend
                .create_path(&catmull_rom(&controls, SAMPLES_PER_SPAN), color);
            let marker = self.backend.create_marker(head, POSITION_MARKER, color);
            let glow = self.backend.create_marker(head, GLOW_MARKER, color);
            self.metrics.record_created(3);

            self.current.insert(
                source,
                RenderedTrack {
                    path,
                    marker,
                    glow,
                    points: visible.len(),
                },
            );
        }

        self.logger.detail(&format!(
            "{} rendered {} sources at index {} ({})",
            storm.id,
            self.current.len(),
            max_index,
            selection
        ));
    }

    /// Disposes every rendered resource, leaving an empty set.
    pub fn clear(&mut self) {
        let previous = std::mem::take(&mut self.current);
        let mut disposed = 0;
        for track in previous.values() {
            for id in track.resources() {
                if self.backend.dispose(id) {
                    disposed += 1;
                } else {
                    self.logger.warn(&format!("resource {:?} already released", id));
                }
            }
        }
        self.metrics.record_disposed(disposed);
    }

    /// Sources drawn by the last update, in draw order.
    pub fn rendered_sources(&self) -> Vec<TrackSource> {
        self.current.keys().copied().collect()
    }

    pub fn rendered(&self, source: TrackSource) -> Option<&RenderedTrack> {
        self.current.get(&source)
    }

    pub fn resource_counts(&self) -> ResourceCounts {
        self.metrics.snapshot()
    }

    pub fn updates(&self) -> usize {
        self.metrics.updates()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::{ModelKind, PredictionSet, TrackPoint};
    use crate::scene::backend::MarkerStyle;
    use crate::scene::palette::{Rgba, AI_COLOR};
    use crate::scene::retained::{PrimitiveShape, RetainedScene};
    use std::collections::HashSet;

    /// Backend that only tracks which handles are live.
    #[derive(Default)]
    struct CountingBackend {
        next: u64,
        live: HashSet<ResourceId>,
    }

    impl CountingBackend {
        fn alloc(&mut self) -> ResourceId {
            self.next += 1;
            let id = ResourceId(self.next);
            self.live.insert(id);
            id
        }
    }

    impl RenderBackend for CountingBackend {
        fn create_path(&mut self, _points: &[Vec3], _color: Rgba) -> ResourceId {
            self.alloc()
        }
        fn create_marker(&mut self, _position: Vec3, _style: MarkerStyle, _color: Rgba) -> ResourceId {
            self.alloc()
        }
        fn dispose(&mut self, id: ResourceId) -> bool {
            self.live.remove(&id)
        }
        fn live_resources(&self) -> usize {
            self.live.len()
        }
    }

    fn storm(len: usize) -> Storm {
        let track: Vec<TrackPoint> = (0..len)
            .map(|i| TrackPoint::new(-60.0 - i as f64, 12.0 + 0.5 * i as f64, 80.0, 980.0))
            .collect();
        Storm {
            id: "lee2023".into(),
            name: "Hurricane Lee".into(),
            category: "Category 5".into(),
            dates: "Sep 5-16, 2023".into(),
            basin: "Atlantic".into(),
            predictions: Some(PredictionSet {
                ai: track.clone(),
                ecmwf: track.clone(),
                gfs: track.clone(),
            }),
            track,
        }
    }

    #[test]
    fn all_selection_renders_four_sources() {
        let mut manager = SceneTrackManager::new(CountingBackend::default());
        manager.update(&storm(12), 11, ModelSelection::All);
        assert_eq!(
            manager.rendered_sources(),
            vec![
                TrackSource::Model(ModelKind::Ai),
                TrackSource::Model(ModelKind::Ecmwf),
                TrackSource::Model(ModelKind::Gfs),
                TrackSource::Actual,
            ]
        );
        assert_eq!(manager.backend().live_resources(), 12);
    }

    #[test]
    fn single_model_renders_model_and_actual() {
        let mut manager = SceneTrackManager::new(CountingBackend::default());
        manager.update(&storm(12), 6, ModelSelection::Ai);
        assert_eq!(
            manager.rendered_sources(),
            vec![TrackSource::Model(ModelKind::Ai), TrackSource::Actual]
        );
        assert_eq!(manager.rendered(TrackSource::Actual).unwrap().points, 7);
    }

    #[test]
    fn repeated_updates_do_not_grow_retained_resources() {
        let mut manager = SceneTrackManager::new(CountingBackend::default());
        let storm = storm(12);
        manager.update(&storm, 8, ModelSelection::All);
        let after_first = manager.backend().live_resources();
        manager.update(&storm, 8, ModelSelection::All);
        assert_eq!(manager.backend().live_resources(), after_first);
        assert_eq!(manager.resource_counts().retained(), after_first);
        assert_eq!(manager.updates(), 2);
    }

    #[test]
    fn single_point_slice_draws_nothing() {
        let mut manager = SceneTrackManager::new(CountingBackend::default());
        manager.update(&storm(12), 0, ModelSelection::All);
        assert!(manager.rendered_sources().is_empty());
        assert_eq!(manager.backend().live_resources(), 0);
    }

    #[test]
    fn missing_predictions_still_draw_actual_track() {
        let mut bare = storm(6);
        bare.predictions = None;
        let mut manager = SceneTrackManager::new(CountingBackend::default());
        manager.update(&bare, 5, ModelSelection::All);
        assert_eq!(manager.rendered_sources(), vec![TrackSource::Actual]);
    }

    #[test]
    fn clear_releases_everything() {
        let mut manager = SceneTrackManager::new(CountingBackend::default());
        manager.update(&storm(12), 11, ModelSelection::Gfs);
        manager.clear();
        assert!(manager.rendered_sources().is_empty());
        assert_eq!(manager.backend().live_resources(), 0);
        assert_eq!(manager.resource_counts().retained(), 0);
    }

    #[test]
    fn markers_sit_on_the_last_visible_point() {
        let storm = storm(12);
        let mut manager = SceneTrackManager::new(RetainedScene::new());
        manager.update(&storm, 4, ModelSelection::Ai);

        let rendered = *manager.rendered(TrackSource::Model(ModelKind::Ai)).unwrap();
        let expected = lat_lon_to_3d(storm.track[4].lat, storm.track[4].lon, TRACK_RADIUS);
        let marker = manager.backend().get(rendered.marker).unwrap();
        assert_eq!(marker.color, AI_COLOR);
        match &marker.shape {
            PrimitiveShape::Marker { position, .. } => assert_eq!(*position, expected),
            other => panic!("expected marker, got {other:?}"),
        }
        match &manager.backend().get(rendered.path).unwrap().shape {
            PrimitiveShape::Path { points, .. } => assert_eq!(points.len(), 4 * 8 + 1),
            other => panic!("expected path, got {other:?}"),
        }
    }
}
