//! wl_registry: binding advertised globals.

use crate::core::globals::{
    object_for_global, GlobalId, GLOBAL_COMPOSITOR, GLOBAL_OUTPUT, GLOBAL_SEAT, GLOBAL_SHM,
};
use crate::core::objects::{ObjectId, ProtocolObject};
use crate::core::shm::{FORMAT_ARGB8888, FORMAT_XRGB8888};
use crate::core::state::ClientState;
use crate::core::wire::{ArgReader, ArgWriter, Message, OutgoingEvent};
use crate::util::logging::REGISTRY;
use crate::wlog;

const REQ_BIND: u16 = 0;

/// wl_shm.format
const SHM_FORMAT: u16 = 0;
/// wl_seat.capabilities / wl_seat.name
const SEAT_CAPABILITIES: u16 = 0;
const SEAT_NAME: u16 = 1;

const CAP_POINTER: u32 = 1;
const CAP_KEYBOARD: u32 = 2;
const CAP_TOUCH: u32 = 4;

pub fn handle(state: &mut ClientState, msg: &Message) {
    let mut args = ArgReader::new(&msg.data);
    match msg.opcode {
        REQ_BIND => {
            let name = args.u32();
            let interface = args.string();
            let version = args.u32();
            let id = args.new_id();
            bind(state, GlobalId(name), &interface, version, id);
        }
        _ => super::unhandled(state, msg, &ProtocolObject::Registry),
    }
}

/// Registry insertion, bind bookkeeping, then the global's initial-state
/// push. Binding an id the server does not recognize is a silent no-op;
/// clients probe for extensions this way.
fn bind(state: &mut ClientState, global: GlobalId, interface: &str, version: u32, id: ObjectId) {
    let Some(object) = object_for_global(global) else {
        wlog!(
            REGISTRY,
            "ignoring bind of unknown global {} ({})",
            global.0,
            interface
        );
        return;
    };
    wlog!(
        REGISTRY,
        "bind {} v{} as object {}",
        object.name(),
        version,
        id
    );
    state.add_object(id, object);
    state.binds.bind(global, id, version);
    on_bind(state, global, id, version);
}

fn on_bind(state: &mut ClientState, global: GlobalId, id: ObjectId, version: u32) {
    match global {
        GLOBAL_COMPOSITOR => {
            // Captured for the attach-offset version gate.
            state.compositor_version = version;
        }
        GLOBAL_SHM => {
            for format in [FORMAT_ARGB8888, FORMAT_XRGB8888] {
                state.send(OutgoingEvent::new(
                    id,
                    SHM_FORMAT,
                    ArgWriter::new().u32(format).build(),
                ));
            }
        }
        GLOBAL_OUTPUT => {
            super::output::push_initial_state(state, id, version);
        }
        GLOBAL_SEAT => {
            state.send(OutgoingEvent::new(
                id,
                SEAT_CAPABILITIES,
                ArgWriter::new()
                    .u32(CAP_POINTER | CAP_KEYBOARD | CAP_TOUCH)
                    .build(),
            ));
            if version >= 2 {
                state.send(OutgoingEvent::new(
                    id,
                    SEAT_NAME,
                    ArgWriter::new().string("seat0").build(),
                ));
            }
        }
        _ => {}
    }
}
