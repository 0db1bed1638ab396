//! wl_display: the connection's entry point.

use crate::core::globals::ADVERTISED_GLOBALS;
use crate::core::objects::{ObjectId, ProtocolObject};
use crate::core::state::ClientState;
use crate::core::wire::{ArgReader, ArgWriter, Message, OutgoingEvent};

const REQ_SYNC: u16 = 0;
const REQ_GET_REGISTRY: u16 = 1;

/// wl_callback.done
const CALLBACK_DONE: u16 = 0;
/// wl_registry.global
const REGISTRY_GLOBAL: u16 = 0;

pub fn handle(state: &mut ClientState, msg: &Message) {
    let mut args = ArgReader::new(&msg.data);
    match msg.opcode {
        REQ_SYNC => {
            // Answer immediately; everything before this request has
            // already been processed in order.
            let callback = args.new_id();
            let serial = state.next_serial();
            state.send(OutgoingEvent::new(
                callback,
                CALLBACK_DONE,
                ArgWriter::new().u32(serial).build(),
            ));
            state.destroy_object(callback);
        }
        REQ_GET_REGISTRY => {
            let registry = args.new_id();
            state.add_object(registry, ProtocolObject::Registry);
            announce_globals(state, registry);
        }
        _ => super::unhandled(state, msg, &ProtocolObject::Display),
    }
}

/// Emit the advertised global set, once, in stable order.
fn announce_globals(state: &ClientState, registry: ObjectId) {
    for global in ADVERTISED_GLOBALS {
        state.send(OutgoingEvent::new(
            registry,
            REGISTRY_GLOBAL,
            ArgWriter::new()
                .u32(global.id.0)
                .string(global.name)
                .u32(global.version)
                .build(),
        ));
    }
}
