//! Request handlers, one module per protocol interface family.
//!
//! Every handler is a free function over `ClientState`; the registry entry
//! for an object is only the routing discriminant. Protocol misuse is
//! reported back to the client and never tears the connection down here —
//! only framing and transport faults do that, in the connection loop.

pub mod compositor;
pub mod data_device;
pub mod display;
pub mod output;
pub mod region;
pub mod registry;
pub mod seat;
pub mod shm;
pub mod subcompositor;
pub mod surface;
pub mod xdg;
pub mod xwayland;

use crate::core::objects::ProtocolObject;
use crate::core::state::ClientState;
use crate::core::wire::Message;
use crate::util::logging::CLIENT;
use crate::wlog;

/// Route one decoded request to its object's handler.
///
/// A frame addressed at an id the registry does not know is dropped:
/// clients may legitimately race requests against objects the server
/// already destroyed.
pub fn dispatch(state: &mut ClientState, msg: &Message) {
    let Some(object) = state.get_object(msg.object_id) else {
        wlog!(
            CLIENT,
            "dropping request for unknown object {} (opcode {})",
            msg.object_id,
            msg.opcode
        );
        return;
    };

    match object {
        ProtocolObject::Display => display::handle(state, msg),
        ProtocolObject::Registry => registry::handle(state, msg),
        ProtocolObject::Callback => unhandled(state, msg, &object),
        ProtocolObject::Compositor => compositor::handle(state, msg),
        ProtocolObject::Subcompositor => subcompositor::handle(state, msg),
        ProtocolObject::Shm => shm::handle_shm(state, msg),
        ProtocolObject::ShmPool => shm::handle_pool(state, msg),
        ProtocolObject::Buffer { pool } => shm::handle_buffer(state, msg, pool),
        ProtocolObject::Surface => surface::handle(state, msg),
        ProtocolObject::Subsurface => subcompositor::handle_subsurface(state, msg),
        ProtocolObject::Region => region::handle(state, msg),
        ProtocolObject::Seat => seat::handle_seat(state, msg),
        ProtocolObject::Pointer => seat::handle_pointer(state, msg),
        ProtocolObject::Keyboard => seat::handle_keyboard(state, msg),
        ProtocolObject::Touch => seat::handle_touch(state, msg),
        ProtocolObject::DataDeviceManager => data_device::handle_manager(state, msg),
        ProtocolObject::DataDevice { .. } => data_device::handle_device(state, msg),
        ProtocolObject::DataSource => data_device::handle_source(state, msg),
        ProtocolObject::Output => output::handle(state, msg),
        ProtocolObject::WmBase => xdg::wm_base::handle(state, msg),
        ProtocolObject::XdgSurface => xdg::xdg_surface::handle(state, msg),
        ProtocolObject::Toplevel => xdg::toplevel::handle(state, msg),
        ProtocolObject::Positioner => xdg::positioner::handle(state, msg),
        ProtocolObject::Popup => xdg::popup::handle(state, msg),
        ProtocolObject::DecorationManager => xdg::decoration::handle_manager(state, msg),
        ProtocolObject::ToplevelDecoration { toplevel } => {
            xdg::decoration::handle_decoration(state, msg, toplevel)
        }
        ProtocolObject::XwaylandShell => xwayland::handle_shell(state, msg),
        ProtocolObject::XwaylandSurface => xwayland::handle_surface(state, msg),
        ProtocolObject::KeyboardGrabManager => xwayland::handle_grab_manager(state, msg),
        ProtocolObject::KeyboardGrab => xwayland::handle_grab(state, msg),
    }
}

/// A known object with no request for this opcode: log and move on.
pub(crate) fn unhandled(_state: &ClientState, msg: &Message, object: &ProtocolObject) {
    wlog!(
        CLIENT,
        "ignoring opcode {} on {} object {}",
        msg.opcode,
        object.name(),
        msg.object_id
    );
}
