//! wl_subcompositor and wl_subsurface.
//!
//! Position and z-order requests do not act on the child directly; they
//! queue on the parent's pending state and take effect on the parent's
//! commit, in request order.

use crate::core::objects::{ObjectId, ProtocolObject};
use crate::core::state::{ClientState, SubsurfaceRecord};
use crate::core::surface::{RoleKind, SurfaceRole, ZOrderDirection, ZOrderOp};
use crate::core::wire::{ArgReader, Message};
use crate::util::geometry::Point;
use crate::util::logging::SURFACE;
use crate::wlog;

const REQ_DESTROY: u16 = 0;
const REQ_GET_SUBSURFACE: u16 = 1;

const SUB_DESTROY: u16 = 0;
const SUB_SET_POSITION: u16 = 1;
const SUB_PLACE_ABOVE: u16 = 2;
const SUB_PLACE_BELOW: u16 = 3;
const SUB_SET_SYNC: u16 = 4;
const SUB_SET_DESYNC: u16 = 5;

/// wl_subcompositor.error.bad_surface
const ERR_BAD_SURFACE: u32 = 0;

pub fn handle(state: &mut ClientState, msg: &Message) {
    let mut args = ArgReader::new(&msg.data);
    match msg.opcode {
        REQ_DESTROY => state.destroy_object(msg.object_id),
        REQ_GET_SUBSURFACE => {
            let id = args.new_id();
            let surface = args.new_id();
            let parent = args.new_id();
            get_subsurface(state, msg.object_id, id, surface, parent);
        }
        _ => super::unhandled(state, msg, &ProtocolObject::Subcompositor),
    }
}

fn get_subsurface(
    state: &mut ClientState,
    factory: ObjectId,
    id: ObjectId,
    surface: ObjectId,
    parent: ObjectId,
) {
    if !state.surfaces.contains_key(&surface) || !state.surfaces.contains_key(&parent) {
        state.send_error(factory, ERR_BAD_SURFACE, "unknown surface or parent");
        return;
    }
    if surface == parent {
        state.send_error(factory, ERR_BAD_SURFACE, "surface cannot be its own parent");
        return;
    }
    // A parent chain reaching back to the candidate child would make
    // synchronized commits recurse without end.
    let mut ancestor = Some(parent);
    let mut hops = 0;
    while let Some(node) = ancestor {
        if node == surface {
            state.send_error(factory, ERR_BAD_SURFACE, "surface is an ancestor of parent");
            return;
        }
        ancestor = state
            .subsurfaces
            .values()
            .find(|r| r.surface == node)
            .map(|r| r.parent);
        hops += 1;
        if hops > state.subsurfaces.len() {
            break;
        }
    }
    if !state.role_assignable(surface, RoleKind::Subsurface) {
        state.send_error(factory, ERR_BAD_SURFACE, "surface already holds a role");
        return;
    }

    state.add_object(id, ProtocolObject::Subsurface);
    state.subsurfaces.insert(
        id,
        SubsurfaceRecord {
            surface,
            parent,
            // Children start in synchronized mode.
            sync: true,
            position: Point::default(),
        },
    );
    state.register_role(id, surface);
    if let Some(s) = state.surfaces.get_mut(&surface) {
        s.role = Some(SurfaceRole::Subsurface { data: Some(id) });
    }
    if let Some(p) = state.surfaces.get_mut(&parent) {
        p.adopt_child(surface);
    }
    wlog!(SURFACE, "subsurface {}: {} under {}", id, surface, parent);
}

pub fn handle_subsurface(state: &mut ClientState, msg: &Message) {
    let sub_id = msg.object_id;
    let Some(record) = state.subsurfaces.get(&sub_id).copied() else {
        wlog!(SURFACE, "request on unknown subsurface {}", sub_id);
        return;
    };
    let mut args = ArgReader::new(&msg.data);
    match msg.opcode {
        SUB_DESTROY => {
            state.subsurfaces.remove(&sub_id);
            state.unregister_role(sub_id);
            if let Some(s) = state.surfaces.get_mut(&record.surface) {
                s.clear_role_data();
            }
            // Unlike position changes, removal takes effect immediately.
            if let Some(p) = state.surfaces.get_mut(&record.parent) {
                p.drop_child(record.surface);
            }
            state.destroy_object(sub_id);
            state.refresh_scene();
        }
        SUB_SET_POSITION => {
            let x = args.i32();
            let y = args.i32();
            if let Some(p) = state.surfaces.get_mut(&record.parent) {
                p.pending
                    .child_positions
                    .push(crate::core::surface::ChildPosition {
                        child: record.surface,
                        x,
                        y,
                    });
            }
        }
        SUB_PLACE_ABOVE | SUB_PLACE_BELOW => {
            let sibling = args.new_id();
            let direction = if msg.opcode == SUB_PLACE_ABOVE {
                ZOrderDirection::Above
            } else {
                ZOrderDirection::Below
            };
            // Naming the parent targets the parent's own draw position.
            let relative_to = if sibling == record.parent {
                None
            } else {
                Some(sibling)
            };
            if let Some(p) = state.surfaces.get_mut(&record.parent) {
                p.pending.z_order_ops.push(ZOrderOp {
                    direction,
                    child: record.surface,
                    relative_to,
                });
            }
        }
        SUB_SET_SYNC => {
            if let Some(r) = state.subsurfaces.get_mut(&sub_id) {
                r.sync = true;
            }
        }
        SUB_SET_DESYNC => {
            if let Some(r) = state.subsurfaces.get_mut(&sub_id) {
                r.sync = false;
            }
        }
        _ => super::unhandled(state, msg, &ProtocolObject::Subsurface),
    }
}
