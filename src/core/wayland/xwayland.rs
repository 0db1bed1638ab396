//! xwayland_shell_v1 and the xwayland keyboard grab: enough surface for
//! an embedded X window manager to associate its windows.

use crate::core::objects::ProtocolObject;
use crate::core::state::ClientState;
use crate::core::surface::{RoleKind, SurfaceRole};
use crate::core::wire::{ArgReader, Message};
use crate::util::logging::XDG;
use crate::wlog;

const SHELL_DESTROY: u16 = 0;
const SHELL_GET_XWAYLAND_SURFACE: u16 = 1;

const SURFACE_SET_SERIAL: u16 = 0;
const SURFACE_DESTROY: u16 = 1;

const GRAB_MGR_DESTROY: u16 = 0;
const GRAB_MGR_GRAB_KEYBOARD: u16 = 1;
const GRAB_DESTROY: u16 = 0;

/// xwayland_shell_v1.error.role
const ERR_ROLE: u32 = 0;

pub fn handle_shell(state: &mut ClientState, msg: &Message) {
    let mut args = ArgReader::new(&msg.data);
    match msg.opcode {
        SHELL_DESTROY => state.destroy_object(msg.object_id),
        SHELL_GET_XWAYLAND_SURFACE => {
            let id = args.new_id();
            let surface = args.new_id();
            if !state.role_assignable(surface, RoleKind::Xwayland) {
                state.send_error(msg.object_id, ERR_ROLE, "surface already holds a role");
                return;
            }
            state.add_object(id, ProtocolObject::XwaylandSurface);
            state.register_role(id, surface);
            if let Some(s) = state.surfaces.get_mut(&surface) {
                s.role = Some(SurfaceRole::Xwayland { data: Some(id) });
            }
        }
        _ => super::unhandled(state, msg, &ProtocolObject::XwaylandShell),
    }
}

pub fn handle_surface(state: &mut ClientState, msg: &Message) {
    let mut args = ArgReader::new(&msg.data);
    match msg.opcode {
        SURFACE_SET_SERIAL => {
            // Awaiting host-side identification; recorded only in the log.
            let lo = args.u32();
            let hi = args.u32();
            wlog!(XDG, "xwayland surface {} serial {:#x}{:08x}", msg.object_id, hi, lo);
        }
        SURFACE_DESTROY => {
            if let Some(surface) = state.unregister_role(msg.object_id) {
                if let Some(s) = state.surfaces.get_mut(&surface) {
                    s.clear_role_data();
                }
            }
            state.destroy_object(msg.object_id);
        }
        _ => super::unhandled(state, msg, &ProtocolObject::XwaylandSurface),
    }
}

pub fn handle_grab_manager(state: &mut ClientState, msg: &Message) {
    let mut args = ArgReader::new(&msg.data);
    match msg.opcode {
        GRAB_MGR_DESTROY => state.destroy_object(msg.object_id),
        GRAB_MGR_GRAB_KEYBOARD => {
            let id = args.new_id();
            let surface = args.new_id();
            let _seat = args.new_id();
            wlog!(XDG, "keyboard grab {} for surface {}", id, surface);
            state.add_object(id, ProtocolObject::KeyboardGrab);
        }
        _ => super::unhandled(state, msg, &ProtocolObject::KeyboardGrabManager),
    }
}

pub fn handle_grab(state: &mut ClientState, msg: &Message) {
    match msg.opcode {
        GRAB_DESTROY => state.destroy_object(msg.object_id),
        _ => super::unhandled(state, msg, &ProtocolObject::KeyboardGrab),
    }
}
