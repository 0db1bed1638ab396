//! xdg_positioner: placement inputs for popups.
//!
//! Everything is recorded; constraint adjustment is accepted but never
//! acted on, matching the placement model's bounding behavior.

use crate::core::objects::ProtocolObject;
use crate::core::state::ClientState;
use crate::core::wire::{ArgReader, Message};
use crate::util::geometry::Rect;

const REQ_DESTROY: u16 = 0;
const REQ_SET_SIZE: u16 = 1;
const REQ_SET_ANCHOR_RECT: u16 = 2;
const REQ_SET_ANCHOR: u16 = 3;
const REQ_SET_GRAVITY: u16 = 4;
const REQ_SET_CONSTRAINT_ADJUSTMENT: u16 = 5;
const REQ_SET_OFFSET: u16 = 6;
const REQ_SET_REACTIVE: u16 = 7;
const REQ_SET_PARENT_SIZE: u16 = 8;
const REQ_SET_PARENT_CONFIGURE: u16 = 9;

pub fn handle(state: &mut ClientState, msg: &Message) {
    let id = msg.object_id;
    let mut args = ArgReader::new(&msg.data);
    match msg.opcode {
        REQ_DESTROY => {
            state.positioners.remove(&id);
            state.destroy_object(id);
        }
        REQ_SET_SIZE => {
            let size = (args.i32(), args.i32());
            if let Some(p) = state.positioners.get_mut(&id) {
                p.size = Some(size);
            }
        }
        REQ_SET_ANCHOR_RECT => {
            let rect = Rect::new(args.i32(), args.i32(), args.i32(), args.i32());
            if let Some(p) = state.positioners.get_mut(&id) {
                p.anchor_rect = Some(rect);
            }
        }
        REQ_SET_ANCHOR => {
            let anchor = args.u32();
            if let Some(p) = state.positioners.get_mut(&id) {
                p.anchor = anchor;
            }
        }
        REQ_SET_GRAVITY => {
            let gravity = args.u32();
            if let Some(p) = state.positioners.get_mut(&id) {
                p.gravity = gravity;
            }
        }
        REQ_SET_CONSTRAINT_ADJUSTMENT => {
            let adjustment = args.u32();
            if let Some(p) = state.positioners.get_mut(&id) {
                p.constraint_adjustment = adjustment;
            }
        }
        REQ_SET_OFFSET => {
            let offset = (args.i32(), args.i32());
            if let Some(p) = state.positioners.get_mut(&id) {
                p.offset = offset;
            }
        }
        REQ_SET_REACTIVE => {
            if let Some(p) = state.positioners.get_mut(&id) {
                p.reactive = true;
            }
        }
        REQ_SET_PARENT_SIZE => {
            let size = (args.i32(), args.i32());
            if let Some(p) = state.positioners.get_mut(&id) {
                p.parent_size = Some(size);
            }
        }
        REQ_SET_PARENT_CONFIGURE => {
            let serial = args.u32();
            if let Some(p) = state.positioners.get_mut(&id) {
                p.parent_configure_serial = Some(serial);
            }
        }
        _ => super::super::unhandled(state, msg, &ProtocolObject::Positioner),
    }
}
