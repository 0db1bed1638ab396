//! xdg_toplevel: window metadata and the maximize/fullscreen round trip.

use crate::core::objects::{ObjectId, ProtocolObject};
use crate::core::state::{ClientState, ConfigureAction};
use crate::core::wire::{ArgReader, ArgWriter, Message, OutgoingEvent};
use crate::util::logging::XDG;
use crate::wlog;

use super::xdg_surface::issue_configure;
use super::{states_bytes, TOPLEVEL_CONFIGURE};

const REQ_DESTROY: u16 = 0;
const REQ_SET_PARENT: u16 = 1;
const REQ_SET_TITLE: u16 = 2;
const REQ_SET_APP_ID: u16 = 3;
const REQ_SHOW_WINDOW_MENU: u16 = 4;
const REQ_MOVE: u16 = 5;
const REQ_RESIZE: u16 = 6;
const REQ_SET_MAX_SIZE: u16 = 7;
const REQ_SET_MIN_SIZE: u16 = 8;
const REQ_SET_MAXIMIZED: u16 = 9;
const REQ_UNSET_MAXIMIZED: u16 = 10;
const REQ_SET_FULLSCREEN: u16 = 11;
const REQ_UNSET_FULLSCREEN: u16 = 12;
const REQ_SET_MINIMIZED: u16 = 13;

pub fn handle(state: &mut ClientState, msg: &Message) {
    let id = msg.object_id;
    let mut args = ArgReader::new(&msg.data);
    match msg.opcode {
        REQ_DESTROY => destroy(state, id),
        REQ_SET_PARENT => {
            let parent = args.object();
            if let Some(record) = state.toplevels.get_mut(&id) {
                record.parent = parent;
            }
        }
        REQ_SET_TITLE => {
            let title = args.string();
            if let Some(record) = state.toplevels.get_mut(&id) {
                record.title = title;
            }
        }
        REQ_SET_APP_ID => {
            let app_id = args.string();
            if let Some(record) = state.toplevels.get_mut(&id) {
                record.app_id = app_id;
            }
        }
        REQ_SHOW_WINDOW_MENU | REQ_MOVE | REQ_RESIZE | REQ_SET_MINIMIZED => {
            // Interactive window management has no meaning on a terminal
            // canvas that always shows one full-screen client.
            wlog!(XDG, "toplevel {}: opcode {} ignored", id, msg.opcode);
        }
        REQ_SET_MAX_SIZE => {
            let size = (args.i32(), args.i32());
            if let Some(record) = state.toplevels.get_mut(&id) {
                record.pending_max_size = Some(size);
            }
        }
        REQ_SET_MIN_SIZE => {
            let size = (args.i32(), args.i32());
            if let Some(record) = state.toplevels.get_mut(&id) {
                record.pending_min_size = Some(size);
            }
        }
        REQ_SET_MAXIMIZED => propose_flags(state, id, Some(true), None),
        REQ_UNSET_MAXIMIZED => propose_flags(state, id, Some(false), None),
        REQ_SET_FULLSCREEN => {
            args.object(); // optional output, ignored
            propose_flags(state, id, None, Some(true));
        }
        REQ_UNSET_FULLSCREEN => propose_flags(state, id, None, Some(false)),
        _ => super::super::unhandled(state, msg, &ProtocolObject::Toplevel),
    }
}

fn destroy(state: &mut ClientState, id: ObjectId) {
    if let Some(surface) = state.unregister_role(id) {
        if let Some(s) = state.surfaces.get_mut(&surface) {
            s.clear_role_data();
        }
    }
    state.toplevel_windows.remove(&id);
    state.toplevels.remove(&id);
    state.destroy_object(id);
}

/// Compute the next {maximized, fullscreen} combination, propose it with a
/// configure pair, and commit it to the record only on the client's ack.
fn propose_flags(
    state: &mut ClientState,
    id: ObjectId,
    maximized: Option<bool>,
    fullscreen: Option<bool>,
) {
    let Some(record) = state.toplevels.get(&id) else {
        wlog!(XDG, "state change on unknown toplevel {}", id);
        return;
    };
    let next_maximized = maximized.unwrap_or(record.maximized);
    let next_fullscreen = fullscreen.unwrap_or(record.fullscreen);
    let xdg_surface = record.xdg_surface;

    let monitor = state.config.monitor;
    state.send(OutgoingEvent::new(
        id,
        TOPLEVEL_CONFIGURE,
        ArgWriter::new()
            .i32(monitor.width as i32)
            .i32(monitor.height as i32)
            .array(&states_bytes(next_maximized, next_fullscreen))
            .build(),
    ));
    issue_configure(
        state,
        xdg_surface,
        ConfigureAction::ApplyToplevelState {
            toplevel: id,
            maximized: next_maximized,
            fullscreen: next_fullscreen,
        },
    );
}
