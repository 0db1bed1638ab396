//! The drawable unit: applied state, pending overlay, and the child stack.

use std::sync::Arc;

use crate::core::objects::ObjectId;
use crate::core::surface::damage::DamageRegion;
use crate::core::surface::role::{RoleKind, SurfaceRole};
use crate::util::geometry::{Point, Rect};

/// Pixel backing store filled from a shared-memory buffer at commit time.
/// Data is shared so scene snapshots can hold it without copying.
#[derive(Debug, Clone)]
pub struct Texture {
    pub stride: u32,
    pub width: u32,
    pub height: u32,
    pub data: Arc<Vec<u8>>,
}

/// Screen-space placement computed at commit time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// A queued sub-surface position update, applied on the parent's commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildPosition {
    pub child: ObjectId,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZOrderDirection {
    Above,
    Below,
}

/// A queued z-order restack, applied on the parent's commit in request
/// order. `relative_to: None` targets the parent's own draw position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZOrderOp {
    pub direction: ZOrderDirection,
    pub child: ObjectId,
    pub relative_to: Option<ObjectId>,
}

/// The diff-like pending overlay. Fields only take effect on commit;
/// between commits scalar fields are last-set-wins and damage accumulates.
#[derive(Debug, Clone, Default)]
pub struct PendingState {
    /// Replacement buffer. `None` on commit unmaps the surface, but only
    /// when `buffer_cleared` marks it as an explicit null attach.
    pub buffer: Option<ObjectId>,
    pub buffer_cleared: bool,
    pub damage: Vec<DamageRegion>,
    pub buffer_damage: Vec<DamageRegion>,
    /// `Some(None)` means explicitly cleared.
    pub opaque_region: Option<Option<ObjectId>>,
    pub input_region: Option<Option<ObjectId>>,
    pub transform: Option<i32>,
    pub scale: Option<i32>,
    pub offset: Option<Point>,
    pub window_geometry: Option<Rect>,
    pub child_positions: Vec<ChildPosition>,
    pub z_order_ops: Vec<ZOrderOp>,
}

impl PendingState {
    /// Record an attach; a later attach overwrites an earlier one.
    pub fn mark_buffer_attached(&mut self, buffer: Option<ObjectId>) {
        self.buffer_cleared = buffer.is_none();
        self.buffer = buffer;
    }
}

#[derive(Debug)]
pub struct Surface {
    pub position: Position,
    pub texture: Option<Texture>,

    /// xdg_surface association. Not a role, but tracked alongside one.
    pub xdg_surface: Option<ObjectId>,

    /// Children bottom-to-top; the `None` sentinel marks this surface's own
    /// draw position among them.
    pub children_in_draw_order: Vec<Option<ObjectId>>,

    pub role: Option<SurfaceRole>,

    pub transform: i32,
    pub scale: i32,

    /// `None` means infinite (input accepted everywhere).
    pub input_region: Option<ObjectId>,
    /// Unlike the input region, `None` means empty.
    pub opaque_region: Option<ObjectId>,

    pub offset: Point,
    pub damage: Vec<DamageRegion>,
    pub window_geometry: Option<Rect>,

    pub pending: PendingState,
}

impl Surface {
    pub fn new() -> Self {
        Self {
            position: Position::default(),
            texture: None,
            xdg_surface: None,
            children_in_draw_order: vec![None],
            role: None,
            transform: 0,
            scale: 1,
            input_region: None,
            opaque_region: None,
            offset: Point::default(),
            damage: Vec::new(),
            window_geometry: None,
            pending: PendingState::default(),
        }
    }

    pub fn role_kind(&self) -> Option<RoleKind> {
        self.role.as_ref().map(SurfaceRole::kind)
    }

    pub fn has_role_data(&self) -> bool {
        self.role.as_ref().map(SurfaceRole::has_data).unwrap_or(false)
    }

    pub fn clear_role_data(&mut self) {
        if let Some(role) = self.role.as_mut() {
            role.clear_data();
        }
    }

    /// Append `child` to the top of the draw order, once.
    pub fn adopt_child(&mut self, child: ObjectId) {
        if !self.children_in_draw_order.contains(&Some(child)) {
            self.children_in_draw_order.push(Some(child));
        }
    }

    pub fn drop_child(&mut self, child: ObjectId) {
        self.children_in_draw_order.retain(|c| *c != Some(child));
    }

    /// Restack `op.child` immediately above/below the anchor. Idempotent;
    /// a missing anchor makes the single instruction a no-op.
    pub fn apply_z_order(&mut self, op: &ZOrderOp) {
        // `relative_to: None` resolves to the self sentinel entry.
        let anchor_entry = op.relative_to;
        if !self.children_in_draw_order.contains(&anchor_entry) {
            return;
        }
        self.children_in_draw_order.retain(|c| *c != Some(op.child));
        let anchor_idx = match self
            .children_in_draw_order
            .iter()
            .position(|c| *c == anchor_entry)
        {
            Some(idx) => idx,
            None => return,
        };
        let insert_at = match op.direction {
            ZOrderDirection::Above => anchor_idx + 1,
            ZOrderDirection::Below => anchor_idx,
        };
        self.children_in_draw_order.insert(insert_at, Some(op.child));
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}
