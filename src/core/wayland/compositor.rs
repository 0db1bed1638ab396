//! wl_compositor: surface and region factories.

use crate::core::objects::ProtocolObject;
use crate::core::state::{ClientState, RegionRecord};
use crate::core::surface::Surface;
use crate::core::wire::{ArgReader, Message};
use crate::util::logging::SURFACE;
use crate::wlog;

const REQ_CREATE_SURFACE: u16 = 0;
const REQ_CREATE_REGION: u16 = 1;

pub fn handle(state: &mut ClientState, msg: &Message) {
    let mut args = ArgReader::new(&msg.data);
    match msg.opcode {
        REQ_CREATE_SURFACE => {
            let id = args.new_id();
            wlog!(SURFACE, "create surface {}", id);
            state.add_object(id, ProtocolObject::Surface);
            state.surfaces.insert(id, Surface::new());
        }
        REQ_CREATE_REGION => {
            let id = args.new_id();
            state.add_object(id, ProtocolObject::Region);
            state.regions.insert(id, RegionRecord::default());
        }
        _ => super::unhandled(state, msg, &ProtocolObject::Compositor),
    }
}
