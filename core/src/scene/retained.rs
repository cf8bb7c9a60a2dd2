use crate::math::Vec3;
use crate::scene::backend::{MarkerStyle, RenderBackend, ResourceId, PATH_OPACITY, PATH_RADIUS};
use crate::scene::palette::Rgba;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PrimitiveShape {
    Path {
        points: Vec<Vec3>,
        radius: f64,
    },
    Marker {
        position: Vec3,
        radius: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    pub id: ResourceId,
    pub shape: PrimitiveShape,
    pub color: Rgba,
    pub opacity: f64,
}

/// In-memory arena of drawable primitives, snapshotted for display clients.
#[derive(Debug, Default)]
pub struct RetainedScene {
    next_id: u64,
    primitives: BTreeMap<ResourceId, Primitive>,
}

impl RetainedScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ResourceId) -> Option<&Primitive> {
        self.primitives.get(&id)
    }

    /// Primitives in creation order.
    pub fn snapshot(&self) -> Vec<Primitive> {
        self.primitives.values().cloned().collect()
    }

    fn insert(&mut self, shape: PrimitiveShape, color: Rgba, opacity: f64) -> ResourceId {
        let id = ResourceId(self.next_id);
        self.next_id += 1;
        self.primitives.insert(
            id,
            Primitive {
                id,
                shape,
                color,
                opacity,
            },
        );
        id
    }
}

impl RenderBackend for RetainedScene {
    fn create_path(&mut self, points: &[Vec3], color: Rgba) -> ResourceId {
        self.insert(
            PrimitiveShape::Path {
                points: points.to_vec(),
                radius: PATH_RADIUS,
            },
            color,
            PATH_OPACITY,
        )
    }

    fn create_marker(&mut self, position: Vec3, style: MarkerStyle, color: Rgba) -> ResourceId {
        self.insert(
            PrimitiveShape::Marker {
                position,
                radius: style.radius,
            },
            color,
            style.opacity,
        )
    }

    fn dispose(&mut self, id: ResourceId) -> bool {
        self.primitives.remove(&id).is_some()
    }

    fn live_resources(&self) -> usize {
        self.primitives.len()
    }
}
