//! xdg_wm_base: the shell's entry point.

use crate::core::globals::GLOBAL_WM_BASE;
use crate::core::objects::ProtocolObject;
use crate::core::state::{ClientState, PositionerRecord, XdgSurfaceRecord};
use crate::core::wire::{ArgReader, Message};
use crate::util::logging::XDG;
use crate::wlog;

const REQ_DESTROY: u16 = 0;
const REQ_CREATE_POSITIONER: u16 = 1;
const REQ_GET_XDG_SURFACE: u16 = 2;
const REQ_PONG: u16 = 3;

/// xdg_wm_base.error.role
const ERR_ROLE: u32 = 0;

pub fn handle(state: &mut ClientState, msg: &Message) {
    let mut args = ArgReader::new(&msg.data);
    match msg.opcode {
        REQ_DESTROY => state.destroy_object(msg.object_id),
        REQ_CREATE_POSITIONER => {
            let id = args.new_id();
            state.add_object(id, ProtocolObject::Positioner);
            state.positioners.insert(id, PositionerRecord::default());
        }
        REQ_GET_XDG_SURFACE => {
            let id = args.new_id();
            let surface = args.new_id();
            if !state.surfaces.contains_key(&surface) {
                state.send_error(msg.object_id, ERR_ROLE, "unknown surface");
                return;
            }
            let surface_has_role = state
                .surfaces
                .get(&surface)
                .map(|s| s.role.is_some())
                .unwrap_or(false);
            if surface_has_role {
                state.send_error(msg.object_id, ERR_ROLE, "surface already holds a role");
                return;
            }
            let version = state
                .binds
                .bound(GLOBAL_WM_BASE)
                .find(|(bound, _)| *bound == msg.object_id)
                .map(|(_, v)| v)
                .unwrap_or(1);
            state.add_object(id, ProtocolObject::XdgSurface);
            state
                .xdg_surfaces
                .insert(id, XdgSurfaceRecord::new(surface, version));
            if let Some(s) = state.surfaces.get_mut(&surface) {
                s.xdg_surface = Some(id);
            }
            wlog!(XDG, "xdg_surface {} for surface {}", id, surface);
        }
        REQ_PONG => {
            let serial = args.u32();
            wlog!(XDG, "pong serial {}", serial);
        }
        _ => super::super::unhandled(state, msg, &ProtocolObject::WmBase),
    }
}
