//! wl_seat and its devices: pointer, keyboard, touch.

use std::fs::File;
use std::io::Write;
use std::os::fd::OwnedFd;

use rustix::fs::{memfd_create, MemfdFlags};

use crate::core::globals::{GLOBAL_KEYBOARD, GLOBAL_POINTER, GLOBAL_SEAT, GLOBAL_TOUCH};
use crate::core::objects::{ObjectId, ProtocolObject};
use crate::core::state::ClientState;
use crate::core::surface::{CursorData, RoleKind, SurfaceRole};
use crate::core::wire::{ArgReader, ArgWriter, Message, OutgoingEvent};
use crate::util::geometry::Point;
use crate::util::logging::SEAT;
use crate::wlog;

const SEAT_GET_POINTER: u16 = 0;
const SEAT_GET_KEYBOARD: u16 = 1;
const SEAT_GET_TOUCH: u16 = 2;
const SEAT_RELEASE: u16 = 3;

const POINTER_SET_CURSOR: u16 = 0;
const POINTER_RELEASE: u16 = 1;
const KEYBOARD_RELEASE: u16 = 0;
const TOUCH_RELEASE: u16 = 0;

/// wl_keyboard events.
const EV_KEYMAP: u16 = 0;
const EV_REPEAT_INFO: u16 = 5;

/// wl_keyboard.keymap_format.xkb_v1
const KEYMAP_XKB_V1: u32 = 1;
/// wl_pointer.error.role
const ERR_POINTER_ROLE: u32 = 0;

pub fn handle_seat(state: &mut ClientState, msg: &Message) {
    let seat = msg.object_id;
    let version = state
        .binds
        .bound(GLOBAL_SEAT)
        .find(|(id, _)| *id == seat)
        .map(|(_, v)| v)
        .unwrap_or(1);
    let mut args = ArgReader::new(&msg.data);
    match msg.opcode {
        SEAT_GET_POINTER => {
            let id = args.new_id();
            state.add_object(id, ProtocolObject::Pointer);
            state.binds.bind(GLOBAL_POINTER, id, version);
        }
        SEAT_GET_KEYBOARD => {
            let id = args.new_id();
            state.add_object(id, ProtocolObject::Keyboard);
            state.binds.bind(GLOBAL_KEYBOARD, id, version);
            send_keymap(state, id, version);
        }
        SEAT_GET_TOUCH => {
            let id = args.new_id();
            state.add_object(id, ProtocolObject::Touch);
            state.binds.bind(GLOBAL_TOUCH, id, version);
        }
        SEAT_RELEASE => {
            state.binds.unbind(GLOBAL_SEAT, seat);
            state.destroy_object(seat);
        }
        _ => super::unhandled(state, msg, &ProtocolObject::Seat),
    }
}

pub fn handle_pointer(state: &mut ClientState, msg: &Message) {
    let pointer = msg.object_id;
    let mut args = ArgReader::new(&msg.data);
    match msg.opcode {
        POINTER_SET_CURSOR => {
            let _serial = args.u32();
            let surface = args.object();
            let hotspot = Point::new(args.i32(), args.i32());
            set_cursor(state, pointer, surface, hotspot);
        }
        POINTER_RELEASE => {
            state.binds.unbind(GLOBAL_POINTER, pointer);
            state.destroy_object(pointer);
        }
        _ => super::unhandled(state, msg, &ProtocolObject::Pointer),
    }
}

pub fn handle_keyboard(state: &mut ClientState, msg: &Message) {
    match msg.opcode {
        KEYBOARD_RELEASE => {
            state.binds.unbind(GLOBAL_KEYBOARD, msg.object_id);
            state.destroy_object(msg.object_id);
        }
        _ => super::unhandled(state, msg, &ProtocolObject::Keyboard),
    }
}

pub fn handle_touch(state: &mut ClientState, msg: &Message) {
    match msg.opcode {
        TOUCH_RELEASE => {
            state.binds.unbind(GLOBAL_TOUCH, msg.object_id);
            state.destroy_object(msg.object_id);
        }
        _ => super::unhandled(state, msg, &ProtocolObject::Touch),
    }
}

/// Assign (or clear) the cursor role. A previous cursor surface loses its
/// texture and role data first; stale cursors otherwise linger on screen.
fn set_cursor(
    state: &mut ClientState,
    pointer: ObjectId,
    surface: Option<ObjectId>,
    hotspot: Point,
) {
    if let Some(old) = state.cursor_surface {
        if Some(old) != surface {
            if let Some(s) = state.surfaces.get_mut(&old) {
                s.texture = None;
                s.clear_role_data();
            }
            state.drawable_surfaces.remove(&old);
        }
    }

    let Some(sid) = surface else {
        state.cursor_surface = None;
        state.refresh_scene();
        return;
    };

    if !state.role_assignable(sid, RoleKind::Cursor)
        && state.surfaces.get(&sid).map(|s| s.role_kind()) != Some(Some(RoleKind::Cursor))
    {
        state.send_error(pointer, ERR_POINTER_ROLE, "surface already holds a role");
        return;
    }
    if let Some(s) = state.surfaces.get_mut(&sid) {
        s.role = Some(SurfaceRole::Cursor {
            data: Some(CursorData { hotspot }),
        });
    }
    state.cursor_surface = Some(sid);
    state.refresh_scene();
}

/// Hand the shared keymap blob to a fresh keyboard through a memfd.
fn send_keymap(state: &mut ClientState, keyboard: ObjectId, version: u32) {
    let blob = state.keymap.clone();
    match keymap_fd(&blob) {
        Ok(fd) => {
            state.send(OutgoingEvent::with_fd(
                keyboard,
                EV_KEYMAP,
                ArgWriter::new()
                    .u32(KEYMAP_XKB_V1)
                    .u32(blob.len() as u32)
                    .build(),
                fd,
            ));
        }
        Err(e) => {
            wlog!(SEAT, "keymap fd for keyboard {} failed: {}", keyboard, e);
        }
    }
    if version >= 4 {
        state.send(OutgoingEvent::new(
            keyboard,
            EV_REPEAT_INFO,
            ArgWriter::new().i32(25).i32(400).build(),
        ));
    }
}

fn keymap_fd(blob: &[u8]) -> std::io::Result<OwnedFd> {
    let fd = memfd_create("termwl-keymap", MemfdFlags::CLOEXEC)?;
    let mut file = File::from(fd);
    file.write_all(blob)?;
    Ok(file.into())
}
