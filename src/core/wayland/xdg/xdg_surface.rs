//! xdg_surface: window-manager association and the configure/ack cycle.
//!
//! Round trips are parked continuations: issuing a configure records a
//! [`ConfigureAction`] under its serial, and ack releases every wait with
//! a serial less than or equal to the acked one, running their actions in
//! serial order. Connection teardown simply drops the state, waits
//! included; nothing blocks on a client that never acks.

use std::time::Duration;

use crate::core::globals::GLOBAL_OUTPUT;
use crate::core::objects::{ObjectId, ProtocolObject};
use crate::core::state::{ClientState, ConfigureAction, PopupRecord, ToplevelRecord};
use crate::core::surface::{RoleKind, SurfaceRole};
use crate::core::wire::{ArgReader, ArgWriter, Message, OutgoingEvent};
use crate::util::geometry::Rect;
use crate::util::logging::XDG;
use crate::wlog;

use super::{states_bytes, TOPLEVEL_CONFIGURE, XDG_SURFACE_CONFIGURE};

const REQ_DESTROY: u16 = 0;
const REQ_GET_TOPLEVEL: u16 = 1;
const REQ_GET_POPUP: u16 = 2;
const REQ_SET_WINDOW_GEOMETRY: u16 = 3;
const REQ_ACK_CONFIGURE: u16 = 4;

/// xdg_popup.configure event opcode.
const POPUP_CONFIGURE: u16 = 0;
/// wl_surface.enter event opcode.
const SURFACE_ENTER: u16 = 0;

const ERR_ROLE: u32 = 0;
const ERR_NOT_CONSTRUCTED: u32 = 1;
/// Reported when the decorator is destroyed under a live role object.
const ERR_DEFUNCT_ROLE_OBJECT: u32 = 1;

/// Startup pointer enters are re-issued after this delay; some clients
/// drop the first one while still initializing.
const REENTER_DELAY: Duration = Duration::from_millis(100);

pub fn handle(state: &mut ClientState, msg: &Message) {
    let xdg_id = msg.object_id;
    let mut args = ArgReader::new(&msg.data);
    match msg.opcode {
        REQ_DESTROY => destroy(state, xdg_id),
        REQ_GET_TOPLEVEL => {
            let id = args.new_id();
            get_toplevel(state, xdg_id, id);
        }
        REQ_GET_POPUP => {
            let id = args.new_id();
            let parent = args.object();
            let positioner = args.new_id();
            get_popup(state, xdg_id, id, parent, positioner);
        }
        REQ_SET_WINDOW_GEOMETRY => {
            let rect = Rect::new(args.i32(), args.i32(), args.i32(), args.i32());
            let surface = state.xdg_surfaces.get(&xdg_id).map(|r| r.surface);
            if let Some(record) = state.xdg_surfaces.get_mut(&xdg_id) {
                record.window_geometry = Some(rect);
            }
            if let Some(sid) = surface {
                super::super::surface::stage_window_geometry(state, sid, rect);
            }
        }
        REQ_ACK_CONFIGURE => {
            let serial = args.u32();
            ack_configure(state, xdg_id, serial);
        }
        _ => super::super::unhandled(state, msg, &ProtocolObject::XdgSurface),
    }
}

/// Issue a configure with a fresh serial (the first ever issued is 0) and
/// park `action` under it.
pub(crate) fn issue_configure(
    state: &mut ClientState,
    xdg_id: ObjectId,
    action: ConfigureAction,
) -> u32 {
    let Some(record) = state.xdg_surfaces.get_mut(&xdg_id) else {
        wlog!(XDG, "configure for unknown xdg_surface {}", xdg_id);
        return 0;
    };
    let serial = record.next_serial();
    record.waits.insert(serial, action);
    state.send(OutgoingEvent::new(
        xdg_id,
        XDG_SURFACE_CONFIGURE,
        ArgWriter::new().u32(serial).build(),
    ));
    serial
}

/// Cumulative release: every wait at or below `serial` resumes, in serial
/// order. Stale outstanding configures are assumed satisfied.
pub(crate) fn ack_configure(state: &mut ClientState, xdg_id: ObjectId, serial: u32) {
    let released = {
        let Some(record) = state.xdg_surfaces.get_mut(&xdg_id) else {
            return;
        };
        let mut released: Vec<(u32, ConfigureAction)> = record
            .waits
            .iter()
            .filter(|(s, _)| **s <= serial)
            .map(|(s, a)| (*s, *a))
            .collect();
        released.sort_by_key(|(s, _)| *s);
        for (s, _) in &released {
            record.waits.remove(s);
        }
        released
    };
    for (_, action) in released {
        run_action(state, action);
    }
}

fn run_action(state: &mut ClientState, action: ConfigureAction) {
    match action {
        ConfigureAction::None => {}
        ConfigureAction::ApplyToplevelState {
            toplevel,
            maximized,
            fullscreen,
        } => {
            if let Some(record) = state.toplevels.get_mut(&toplevel) {
                record.maximized = maximized;
                record.fullscreen = fullscreen;
            }
        }
        ConfigureAction::ApplyReposition { popup } => {
            if let Some(record) = state.popups.get_mut(&popup) {
                if let Some(placement) = record.pending_reposition.take() {
                    record.placement = placement;
                }
            }
        }
    }
}

fn destroy(state: &mut ClientState, xdg_id: ObjectId) {
    let Some(surface) = state.xdg_surfaces.get(&xdg_id).map(|r| r.surface) else {
        state.destroy_object(xdg_id);
        return;
    };
    let role_active = state
        .surfaces
        .get(&surface)
        .map(|s| s.has_role_data())
        .unwrap_or(false);
    if role_active {
        state.send_error(
            xdg_id,
            ERR_DEFUNCT_ROLE_OBJECT,
            "xdg_surface destroyed before its role object",
        );
        return;
    }
    state.xdg_surfaces.remove(&xdg_id);
    if let Some(s) = state.surfaces.get_mut(&surface) {
        s.xdg_surface = None;
    }
    state.destroy_object(xdg_id);
}

fn get_toplevel(state: &mut ClientState, xdg_id: ObjectId, toplevel_id: ObjectId) {
    let Some(surface) = state.xdg_surfaces.get(&xdg_id).map(|r| r.surface) else {
        state.send_error(xdg_id, ERR_NOT_CONSTRUCTED, "unknown xdg_surface");
        return;
    };
    if !state.role_assignable(surface, RoleKind::Toplevel) {
        state.send_error(xdg_id, ERR_ROLE, "surface already holds a role");
        return;
    }

    state.add_object(toplevel_id, ProtocolObject::Toplevel);
    state.toplevels.insert(
        toplevel_id,
        ToplevelRecord {
            xdg_surface: xdg_id,
            ..Default::default()
        },
    );
    state.register_role(toplevel_id, surface);
    if let Some(s) = state.surfaces.get_mut(&surface) {
        s.role = Some(SurfaceRole::Toplevel {
            data: Some(toplevel_id),
        });
    }
    state.toplevel_windows.insert(toplevel_id);
    wlog!(XDG, "toplevel {} on surface {}", toplevel_id, surface);

    // Propose the full virtual monitor, maximized and fullscreen; the
    // flags land in the record once the client acks.
    let monitor = state.config.monitor;
    state.send(OutgoingEvent::new(
        toplevel_id,
        TOPLEVEL_CONFIGURE,
        ArgWriter::new()
            .i32(monitor.width as i32)
            .i32(monitor.height as i32)
            .array(&states_bytes(true, true))
            .build(),
    ));
    issue_configure(
        state,
        xdg_id,
        ConfigureAction::ApplyToplevelState {
            toplevel: toplevel_id,
            maximized: true,
            fullscreen: true,
        },
    );

    announce_window(state, surface);
}

/// Enter broadcasts for a window that just came up, plus the delayed
/// pointer re-enter.
fn announce_window(state: &mut ClientState, surface: ObjectId) {
    let outputs: Vec<ObjectId> = state.binds.bound(GLOBAL_OUTPUT).map(|(id, _)| id).collect();
    for output in outputs {
        state.send(OutgoingEvent::new(
            surface,
            SURFACE_ENTER,
            ArgWriter::new().id(output).build(),
        ));
    }
    state.send_keyboard_enter(surface);
    state.send_pointer_enter(surface);
    schedule_pointer_reenter(state, surface);
}

/// Best effort: a second pointer enter after a short delay, built now and
/// delivered from a throwaway thread through the outgoing queue.
fn schedule_pointer_reenter(state: &mut ClientState, surface: ObjectId) {
    let serial = state.next_serial();
    let (x, y) = state
        .pointer
        .read()
        .map(|p| (p.x, p.y))
        .unwrap_or_default();
    let pointers: Vec<(ObjectId, u32)> = state
        .binds
        .bound(crate::core::globals::GLOBAL_POINTER)
        .collect();
    if pointers.is_empty() {
        return;
    }
    let sender = state.outgoing.clone();
    std::thread::spawn(move || {
        std::thread::sleep(REENTER_DELAY);
        for (pointer, version) in pointers {
            let enter = OutgoingEvent::new(
                pointer,
                0, // wl_pointer.enter
                ArgWriter::new()
                    .u32(serial)
                    .id(surface)
                    .fixed(x)
                    .fixed(y)
                    .build(),
            );
            if sender.send(enter).is_err() {
                return;
            }
            if version >= 5 {
                let _ = sender.send(OutgoingEvent::new(pointer, 5, Vec::new()));
            }
        }
    });
}

fn get_popup(
    state: &mut ClientState,
    xdg_id: ObjectId,
    popup_id: ObjectId,
    parent: Option<ObjectId>,
    positioner: ObjectId,
) {
    let Some(surface) = state.xdg_surfaces.get(&xdg_id).map(|r| r.surface) else {
        state.send_error(xdg_id, ERR_NOT_CONSTRUCTED, "unknown xdg_surface");
        return;
    };
    let Some(placement) = state.positioners.get(&positioner).copied() else {
        state.send_error(xdg_id, ERR_NOT_CONSTRUCTED, "positioner does not exist");
        return;
    };
    if !state.role_assignable(surface, RoleKind::Popup) {
        state.send_error(xdg_id, ERR_ROLE, "surface already holds a role");
        return;
    }

    state.add_object(popup_id, ProtocolObject::Popup);
    state.popups.insert(
        popup_id,
        PopupRecord {
            xdg_surface: xdg_id,
            parent_xdg_surface: parent,
            placement,
            pending_reposition: None,
        },
    );
    state.register_role(popup_id, surface);
    if let Some(s) = state.surfaces.get_mut(&surface) {
        s.role = Some(SurfaceRole::Popup {
            data: Some(popup_id),
        });
    }

    send_popup_configure(state, popup_id, &placement);
    issue_configure(state, xdg_id, ConfigureAction::None);
}

/// xdg_popup.configure from positioner state, with the virtual monitor as
/// the size fallback for clients that never set one.
pub(crate) fn send_popup_configure(
    state: &ClientState,
    popup_id: ObjectId,
    placement: &crate::core::state::PositionerRecord,
) {
    let monitor = state.config.monitor;
    let anchor = placement.anchor_rect.unwrap_or_default();
    let (w, h) = placement
        .size
        .unwrap_or((monitor.width as i32, monitor.height as i32));
    state.send(OutgoingEvent::new(
        popup_id,
        POPUP_CONFIGURE,
        ArgWriter::new()
            .i32(anchor.x + placement.offset.0)
            .i32(anchor.y + placement.offset.1)
            .i32(w)
            .i32(h)
            .build(),
    ));
}
