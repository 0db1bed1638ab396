//! xdg_popup: placement and the reposition round trip.

use crate::core::objects::{ObjectId, ProtocolObject};
use crate::core::state::{ClientState, ConfigureAction};
use crate::core::wire::{ArgReader, ArgWriter, Message, OutgoingEvent};
use crate::util::logging::XDG;
use crate::wlog;

use super::xdg_surface::{issue_configure, send_popup_configure};

const REQ_DESTROY: u16 = 0;
const REQ_GRAB: u16 = 1;
const REQ_REPOSITION: u16 = 2;

/// xdg_popup.repositioned event opcode.
const EV_REPOSITIONED: u16 = 2;

pub fn handle(state: &mut ClientState, msg: &Message) {
    let id = msg.object_id;
    let mut args = ArgReader::new(&msg.data);
    match msg.opcode {
        REQ_DESTROY => {
            if let Some(surface) = state.unregister_role(id) {
                if let Some(s) = state.surfaces.get_mut(&surface) {
                    s.clear_role_data();
                }
            }
            state.popups.remove(&id);
            state.destroy_object(id);
        }
        REQ_GRAB => {
            let _seat = args.new_id();
            let serial = args.u32();
            wlog!(XDG, "popup {} grab (serial {}) ignored", id, serial);
        }
        REQ_REPOSITION => {
            let positioner = args.new_id();
            let token = args.u32();
            reposition(state, id, positioner, token);
        }
        _ => super::super::unhandled(state, msg, &ProtocolObject::Popup),
    }
}

/// Recompute placement from the positioner's current state. Only the
/// latest reposition matters: a second request before the first is acked
/// replaces the pending placement outright.
fn reposition(state: &mut ClientState, popup_id: ObjectId, positioner: ObjectId, token: u32) {
    let Some(placement) = state.positioners.get(&positioner).copied() else {
        wlog!(XDG, "popup {} reposition with unknown positioner", popup_id);
        return;
    };
    let Some(record) = state.popups.get_mut(&popup_id) else {
        wlog!(XDG, "reposition on unknown popup {}", popup_id);
        return;
    };
    record.pending_reposition = Some(placement);
    let xdg_surface = record.xdg_surface;

    state.send(OutgoingEvent::new(
        popup_id,
        EV_REPOSITIONED,
        ArgWriter::new().u32(token).build(),
    ));
    send_popup_configure(state, popup_id, &placement);
    issue_configure(
        state,
        xdg_surface,
        ConfigureAction::ApplyReposition { popup: popup_id },
    );
}
