//! wl_output: the virtual monitor.

use crate::core::objects::{ObjectId, ProtocolObject};
use crate::core::state::ClientState;
use crate::core::wire::{ArgWriter, Message, OutgoingEvent};

const REQ_RELEASE: u16 = 0;

const EV_GEOMETRY: u16 = 0;
const EV_MODE: u16 = 1;
const EV_DONE: u16 = 2;
const EV_SCALE: u16 = 3;
const EV_NAME: u16 = 4;
const EV_DESCRIPTION: u16 = 5;

const MODE_CURRENT: u32 = 1;
const SUBPIXEL_UNKNOWN: i32 = 0;
const TRANSFORM_NORMAL: i32 = 0;

pub fn handle(state: &mut ClientState, msg: &Message) {
    match msg.opcode {
        REQ_RELEASE => state.destroy_object(msg.object_id),
        _ => super::unhandled(state, msg, &ProtocolObject::Output),
    }
}

/// Push the full output description on bind, version-gated, ending with
/// `done` so the client treats it as one atomic snapshot.
pub fn push_initial_state(state: &ClientState, id: ObjectId, version: u32) {
    let monitor = state.config.monitor;

    if version >= 2 {
        state.send(OutgoingEvent::new(
            id,
            EV_SCALE,
            ArgWriter::new().i32(1).build(),
        ));
    }
    if version >= 4 {
        state.send(OutgoingEvent::new(
            id,
            EV_NAME,
            ArgWriter::new().string("TERM-1").build(),
        ));
        state.send(OutgoingEvent::new(
            id,
            EV_DESCRIPTION,
            ArgWriter::new().string("terminal virtual output").build(),
        ));
    }
    state.send(OutgoingEvent::new(
        id,
        EV_GEOMETRY,
        ArgWriter::new()
            .i32(0)
            .i32(0)
            .i32(monitor.width as i32)
            .i32(monitor.height as i32)
            .i32(SUBPIXEL_UNKNOWN)
            .string("termwl")
            .string("virtual")
            .i32(TRANSFORM_NORMAL)
            .build(),
    ));
    state.send(OutgoingEvent::new(
        id,
        EV_MODE,
        ArgWriter::new()
            .u32(MODE_CURRENT)
            .i32(monitor.width as i32)
            .i32(monitor.height as i32)
            .i32(60_000)
            .build(),
    ));
    if version >= 2 {
        state.send(OutgoingEvent::new(id, EV_DONE, Vec::new()));
    }
}
