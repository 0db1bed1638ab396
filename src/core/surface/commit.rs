//! Folding the pending overlay into a surface's applied state.
//!
//! The fold itself is pure double-buffered bookkeeping; buffer realization
//! (copying shm bytes into a texture) and child placement happen in the
//! per-connection state, which consumes the outcome returned here.

use crate::core::objects::ObjectId;
use crate::core::surface::surface::{ChildPosition, PendingState, Surface};

/// What a commit asks the caller to do next.
#[derive(Debug, Default)]
pub struct CommitOutcome {
    /// `Some(Some(id))` attach this buffer, `Some(None)` unmap the surface,
    /// `None` leave the current texture alone.
    pub buffer: Option<Option<ObjectId>>,
    /// Position updates queued by sub-surfaces, to apply in order.
    pub child_positions: Vec<ChildPosition>,
    /// Whether any z-order restack took place this commit.
    pub restacked: bool,
}

/// Apply every double-buffered field of `pending` to `surface` and reset
/// the overlay. Damage accumulates; scalar fields are last-set-wins and the
/// value recorded here already reflects that.
pub fn fold_pending(surface: &mut Surface) -> CommitOutcome {
    let pending = std::mem::take(&mut surface.pending);
    let mut outcome = CommitOutcome::default();

    // An untouched overlay attaches nothing; a touched one with buffer None
    // is an explicit unmap.
    if pending_touches_buffer(&pending) {
        outcome.buffer = Some(pending.buffer);
    }

    surface.damage.extend(pending.damage);
    surface.damage.extend(pending.buffer_damage);

    if let Some(region) = pending.opaque_region {
        surface.opaque_region = region;
    }
    if let Some(region) = pending.input_region {
        surface.input_region = region;
    }
    if let Some(transform) = pending.transform {
        surface.transform = transform;
    }
    if let Some(scale) = pending.scale {
        surface.scale = scale;
    }
    if let Some(offset) = pending.offset {
        surface.offset = offset;
    }
    if let Some(geometry) = pending.window_geometry {
        surface.window_geometry = Some(geometry);
    }

    for op in &pending.z_order_ops {
        surface.apply_z_order(op);
        outcome.restacked = true;
    }
    outcome.child_positions = pending.child_positions;

    outcome
}

/// The buffer slot has no "untouched" marker of its own, so commit treats
/// the overlay as attaching whenever any attach was recorded. Attaching a
/// null buffer sets `buffer_cleared` through `mark_buffer_attached`.
fn pending_touches_buffer(pending: &PendingState) -> bool {
    pending.buffer.is_some() || pending.buffer_cleared
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::surface::damage::DamageRegion;
    use crate::core::surface::surface::{ZOrderDirection, ZOrderOp};
    use crate::util::geometry::Point;

    fn id(raw: u32) -> ObjectId {
        ObjectId::new(raw)
    }

    #[test]
    fn damage_accumulates_across_commits() {
        let mut surface = Surface::new();
        surface.pending.damage.push(DamageRegion::new(0, 0, 4, 4));
        fold_pending(&mut surface);
        surface.pending.damage.push(DamageRegion::new(8, 8, 2, 2));
        surface
            .pending
            .buffer_damage
            .push(DamageRegion::new(1, 1, 1, 1));
        fold_pending(&mut surface);
        assert_eq!(surface.damage.len(), 3);
    }

    #[test]
    fn scalars_are_last_set_wins() {
        let mut surface = Surface::new();
        surface.pending.scale = Some(2);
        surface.pending.scale = Some(3);
        surface.pending.offset = Some(Point::new(1, 1));
        surface.pending.offset = Some(Point::new(5, 7));
        fold_pending(&mut surface);
        assert_eq!(surface.scale, 3);
        assert_eq!(surface.offset, Point::new(5, 7));
        // untouched scalars keep their applied values
        assert_eq!(surface.transform, 0);
    }

    #[test]
    fn untouched_overlay_leaves_buffer_alone() {
        let mut surface = Surface::new();
        let outcome = fold_pending(&mut surface);
        assert!(outcome.buffer.is_none());
    }

    #[test]
    fn explicit_null_attach_requests_unmap() {
        let mut surface = Surface::new();
        surface.pending.mark_buffer_attached(None);
        let outcome = fold_pending(&mut surface);
        assert_eq!(outcome.buffer, Some(None));
    }

    #[test]
    fn z_order_above_is_idempotent() {
        let mut surface = Surface::new();
        surface.adopt_child(id(10));
        surface.adopt_child(id(11));
        let op = ZOrderOp {
            direction: ZOrderDirection::Above,
            child: id(10),
            relative_to: Some(id(11)),
        };
        surface.pending.z_order_ops.push(op);
        fold_pending(&mut surface);
        let first = surface.children_in_draw_order.clone();
        surface.pending.z_order_ops.push(op);
        fold_pending(&mut surface);
        assert_eq!(surface.children_in_draw_order, first);
        assert_eq!(first, vec![None, Some(id(11)), Some(id(10))]);
    }

    #[test]
    fn z_order_below_self_sentinel() {
        let mut surface = Surface::new();
        surface.adopt_child(id(10));
        surface.pending.z_order_ops.push(ZOrderOp {
            direction: ZOrderDirection::Below,
            child: id(10),
            relative_to: None,
        });
        fold_pending(&mut surface);
        assert_eq!(surface.children_in_draw_order, vec![Some(id(10)), None]);
    }

    #[test]
    fn z_order_missing_sibling_is_ignored() {
        let mut surface = Surface::new();
        surface.adopt_child(id(10));
        surface.pending.z_order_ops.push(ZOrderOp {
            direction: ZOrderDirection::Above,
            child: id(10),
            relative_to: Some(id(99)),
        });
        fold_pending(&mut surface);
        assert_eq!(surface.children_in_draw_order, vec![None, Some(id(10))]);
    }

    #[test]
    fn child_positions_flow_through_outcome() {
        let mut surface = Surface::new();
        surface.pending.child_positions.push(ChildPosition {
            child: id(10),
            x: 3,
            y: 4,
        });
        let outcome = fold_pending(&mut surface);
        assert_eq!(outcome.child_positions.len(), 1);
        assert_eq!(outcome.child_positions[0].x, 3);
    }
}
