//! Protocol object identity and the closed set of object kinds.

use std::fmt;

/// A protocol object identifier. Unique within one connection's lifetime;
/// zero conventionally denotes "no object" in request arguments.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u32);

impl ObjectId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of protocol object kinds a registry entry can hold.
///
/// Heavy per-object state lives in the typed maps on `ClientState`; a
/// variant only carries what dispatch needs to route a request (e.g. which
/// pool a buffer was carved from).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolObject {
    Display,
    Registry,
    Callback,
    Compositor,
    Subcompositor,
    Shm,
    ShmPool,
    Buffer { pool: ObjectId },
    Surface,
    Subsurface,
    Region,
    Seat,
    Pointer,
    Keyboard,
    Touch,
    DataDeviceManager,
    DataDevice { seat: ObjectId },
    DataSource,
    Output,
    WmBase,
    XdgSurface,
    Toplevel,
    Positioner,
    Popup,
    DecorationManager,
    ToplevelDecoration { toplevel: ObjectId },
    XwaylandShell,
    XwaylandSurface,
    KeyboardGrabManager,
    KeyboardGrab,
}

impl ProtocolObject {
    pub fn name(&self) -> &'static str {
        match self {
            ProtocolObject::Display => "wl_display",
            ProtocolObject::Registry => "wl_registry",
            ProtocolObject::Callback => "wl_callback",
            ProtocolObject::Compositor => "wl_compositor",
            ProtocolObject::Subcompositor => "wl_subcompositor",
            ProtocolObject::Shm => "wl_shm",
            ProtocolObject::ShmPool => "wl_shm_pool",
            ProtocolObject::Buffer { .. } => "wl_buffer",
            ProtocolObject::Surface => "wl_surface",
            ProtocolObject::Subsurface => "wl_subsurface",
            ProtocolObject::Region => "wl_region",
            ProtocolObject::Seat => "wl_seat",
            ProtocolObject::Pointer => "wl_pointer",
            ProtocolObject::Keyboard => "wl_keyboard",
            ProtocolObject::Touch => "wl_touch",
            ProtocolObject::DataDeviceManager => "wl_data_device_manager",
            ProtocolObject::DataDevice { .. } => "wl_data_device",
            ProtocolObject::DataSource => "wl_data_source",
            ProtocolObject::Output => "wl_output",
            ProtocolObject::WmBase => "xdg_wm_base",
            ProtocolObject::XdgSurface => "xdg_surface",
            ProtocolObject::Toplevel => "xdg_toplevel",
            ProtocolObject::Positioner => "xdg_positioner",
            ProtocolObject::Popup => "xdg_popup",
            ProtocolObject::DecorationManager => "zxdg_decoration_manager_v1",
            ProtocolObject::ToplevelDecoration { .. } => "zxdg_toplevel_decoration_v1",
            ProtocolObject::XwaylandShell => "xwayland_shell_v1",
            ProtocolObject::XwaylandSurface => "xwayland_surface_v1",
            ProtocolObject::KeyboardGrabManager => "zwp_xwayland_keyboard_grab_manager_v1",
            ProtocolObject::KeyboardGrab => "zwp_xwayland_keyboard_grab_v1",
        }
    }
}
