//! The published scene: what the frame orchestrator actually draws.
//!
//! Each connection thread flattens its drawable set into a z-sorted
//! snapshot after every commit and publishes it here. Texture bytes are
//! `Arc`-shared with the surfaces, so publishing never copies pixels.

use std::sync::{Arc, Mutex};

/// One visible surface, placed in screen space.
#[derive(Debug, Clone)]
pub struct SceneSurface {
    pub surface_id: u32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub data: Arc<Vec<u8>>,
}

/// A complete frame's worth of surfaces, bottom-to-top.
#[derive(Debug, Clone, Default)]
pub struct SceneSnapshot {
    pub surfaces: Vec<SceneSurface>,
    /// Bumped on every publish so the orchestrator can skip unchanged scenes.
    pub revision: u64,
}

/// Shared handle between one connection thread (writer) and the frame
/// orchestrator (reader).
#[derive(Debug, Clone, Default)]
pub struct SharedScene {
    inner: Arc<Mutex<SceneSnapshot>>,
}

impl SharedScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, mut surfaces: Vec<SceneSurface>) {
        surfaces.sort_by_key(|s| s.z);
        if let Ok(mut snapshot) = self.inner.lock() {
            snapshot.revision += 1;
            snapshot.surfaces = surfaces;
        }
    }

    pub fn latest(&self) -> SceneSnapshot {
        self.inner
            .lock()
            .map(|snapshot| snapshot.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(id: u32, z: i32) -> SceneSurface {
        SceneSurface {
            surface_id: id,
            x: 0,
            y: 0,
            z,
            width: 1,
            height: 1,
            stride: 4,
            data: Arc::new(vec![0; 4]),
        }
    }

    #[test]
    fn publish_orders_by_z() {
        let scene = SharedScene::new();
        scene.publish(vec![surface(1, 5), surface(2, 1), surface(3, 3)]);
        let snapshot = scene.latest();
        let order: Vec<u32> = snapshot.surfaces.iter().map(|s| s.surface_id).collect();
        assert_eq!(order, vec![2, 3, 1]);
        assert_eq!(snapshot.revision, 1);
    }

    #[test]
    fn each_publish_bumps_revision() {
        let scene = SharedScene::new();
        scene.publish(vec![]);
        scene.publish(vec![surface(1, 0)]);
        assert_eq!(scene.latest().revision, 2);
    }
}
