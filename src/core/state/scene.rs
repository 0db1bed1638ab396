//! Scene flattening and frame-callback delivery.

use crate::core::objects::ObjectId;
use crate::core::render::SceneSurface;
use crate::core::state::ClientState;
use crate::core::wire::{ArgWriter, OutgoingEvent};

/// wl_callback.done event opcode.
const CALLBACK_DONE: u16 = 0;
/// wl_display.delete_id event opcode.
const DISPLAY_DELETE_ID: u16 = 1;
const DISPLAY_ID: u32 = 1;

impl ClientState {
    /// Rebuild and publish this connection's scene: a depth-first walk of
    /// the surface trees in draw order, assigning z front-to-back as the
    /// walk proceeds. Only drawable surfaces with pixel content appear.
    pub fn refresh_scene(&mut self) {
        let mut roots: Vec<ObjectId> = self
            .surfaces
            .keys()
            .copied()
            .filter(|id| !self.subsurfaces.values().any(|r| r.surface == *id))
            .collect();
        roots.sort();

        let mut order = Vec::new();
        for root in roots {
            self.walk_draw_order(root, &mut Vec::new(), &mut order);
        }

        let mut z = 0;
        let mut flattened = Vec::new();
        for surface_id in order {
            let Some(surface) = self.surfaces.get_mut(&surface_id) else {
                continue;
            };
            surface.position.z = z;
            z += 1;
            if !self.drawable_surfaces.contains(&surface_id) {
                continue;
            }
            let Some(texture) = surface.texture.as_ref() else {
                continue;
            };
            flattened.push(SceneSurface {
                surface_id: surface_id.raw(),
                x: surface.position.x,
                y: surface.position.y,
                z: surface.position.z,
                width: texture.width,
                height: texture.height,
                stride: texture.stride,
                data: texture.data.clone(),
            });
        }
        self.scene.publish(flattened);
    }

    fn walk_draw_order(
        &self,
        surface_id: ObjectId,
        visiting: &mut Vec<ObjectId>,
        out: &mut Vec<ObjectId>,
    ) {
        if visiting.contains(&surface_id) {
            return;
        }
        visiting.push(surface_id);
        let Some(surface) = self.surfaces.get(&surface_id) else {
            visiting.pop();
            return;
        };
        for entry in &surface.children_in_draw_order {
            match entry {
                None => out.push(surface_id),
                Some(child) => self.walk_draw_order(*child, visiting, out),
            }
        }
        visiting.pop();
    }

    /// Queue a wl_callback for the next frame tick.
    pub fn add_frame_callback(&mut self, callback: ObjectId) {
        self.frame_callbacks.push(callback);
    }

    /// Frame tick from the orchestrator: complete every queued frame
    /// callback with the frame time and retire its object id.
    pub fn fire_frame_callbacks(&mut self, time_ms: u32) {
        let callbacks = std::mem::take(&mut self.frame_callbacks);
        for callback in callbacks {
            self.send(OutgoingEvent::new(
                callback,
                CALLBACK_DONE,
                ArgWriter::new().u32(time_ms).build(),
            ));
            self.remove_object(callback);
            self.send(OutgoingEvent::new(
                ObjectId::new(DISPLAY_ID),
                DISPLAY_DELETE_ID,
                ArgWriter::new().id(callback).build(),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::state::test_support::{new_state, new_state_with_events};
    use crate::core::surface::{Surface, Texture};
    use crate::util::geometry::Point;

    fn textured_surface() -> Surface {
        let mut surface = Surface::new();
        surface.texture = Some(Texture {
            stride: 4,
            width: 1,
            height: 1,
            data: Arc::new(vec![0; 4]),
        });
        surface
    }

    #[test]
    fn children_draw_above_parent_by_default() {
        let mut state = new_state();
        let parent = ObjectId::new(10);
        let child = ObjectId::new(11);
        let mut p = textured_surface();
        p.adopt_child(child);
        state.surfaces.insert(parent, p);
        state.surfaces.insert(child, textured_surface());
        state.subsurfaces.insert(
            ObjectId::new(12),
            crate::core::state::SubsurfaceRecord {
                surface: child,
                parent,
                sync: false,
                position: Point::default(),
            },
        );
        state.drawable_surfaces.insert(parent);
        state.drawable_surfaces.insert(child);

        state.refresh_scene();

        let snapshot = state.scene.latest();
        let ids: Vec<u32> = snapshot.surfaces.iter().map(|s| s.surface_id).collect();
        assert_eq!(ids, vec![10, 11]);
        assert!(snapshot.surfaces[0].z < snapshot.surfaces[1].z);
    }

    #[test]
    fn undrawable_surfaces_stay_out_of_the_scene() {
        let mut state = new_state();
        state.surfaces.insert(ObjectId::new(10), textured_surface());
        state.refresh_scene();
        assert!(state.scene.latest().surfaces.is_empty());
    }

    #[test]
    fn frame_callbacks_fire_once() {
        let (mut state, events) = new_state_with_events();
        let cb = ObjectId::new(20);
        state.add_object(cb, crate::core::objects::ProtocolObject::Callback);
        state.add_frame_callback(cb);

        state.fire_frame_callbacks(1234);
        state.fire_frame_callbacks(1235);

        let sent: Vec<_> = events.try_iter().collect();
        // done + delete_id, exactly once
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].object_id, cb);
        assert_eq!(sent[0].opcode, CALLBACK_DONE);
        assert!(state.get_object(cb).is_none());
    }
}
