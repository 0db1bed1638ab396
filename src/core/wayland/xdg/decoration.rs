//! zxdg_decoration_manager_v1: decorations are always server-side here;
//! the terminal draws the frame.

use crate::core::objects::{ObjectId, ProtocolObject};
use crate::core::state::{ClientState, ConfigureAction};
use crate::core::wire::{ArgReader, ArgWriter, Message, OutgoingEvent};

use super::xdg_surface::issue_configure;

const MGR_DESTROY: u16 = 0;
const MGR_GET_TOPLEVEL_DECORATION: u16 = 1;

const DECO_DESTROY: u16 = 0;
const DECO_SET_MODE: u16 = 1;
const DECO_UNSET_MODE: u16 = 2;

/// zxdg_toplevel_decoration_v1.configure event opcode.
const EV_CONFIGURE: u16 = 0;
/// zxdg_toplevel_decoration_v1.mode.server_side
const MODE_SERVER_SIDE: u32 = 2;

pub fn handle_manager(state: &mut ClientState, msg: &Message) {
    let mut args = ArgReader::new(&msg.data);
    match msg.opcode {
        MGR_DESTROY => state.destroy_object(msg.object_id),
        MGR_GET_TOPLEVEL_DECORATION => {
            let id = args.new_id();
            let toplevel = args.new_id();
            state.add_object(id, ProtocolObject::ToplevelDecoration { toplevel });
            configure_server_side(state, id, toplevel);
        }
        _ => super::super::unhandled(state, msg, &ProtocolObject::DecorationManager),
    }
}

pub fn handle_decoration(state: &mut ClientState, msg: &Message, toplevel: ObjectId) {
    match msg.opcode {
        DECO_DESTROY => state.destroy_object(msg.object_id),
        // Whatever mode the client wants, the answer is server-side.
        DECO_SET_MODE | DECO_UNSET_MODE => {
            configure_server_side(state, msg.object_id, toplevel);
        }
        _ => super::super::unhandled(
            state,
            msg,
            &ProtocolObject::ToplevelDecoration { toplevel },
        ),
    }
}

fn configure_server_side(state: &mut ClientState, decoration: ObjectId, toplevel: ObjectId) {
    state.send(OutgoingEvent::new(
        decoration,
        EV_CONFIGURE,
        ArgWriter::new().u32(MODE_SERVER_SIDE).build(),
    ));
    if let Some(xdg_surface) = state.toplevels.get(&toplevel).map(|t| t.xdg_surface) {
        issue_configure(state, xdg_surface, ConfigureAction::None);
    }
}
