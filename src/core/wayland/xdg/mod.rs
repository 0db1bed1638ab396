//! The xdg shell: window-manager association, configure/ack, toplevels,
//! popups, positioners, and server-side decorations.

pub mod decoration;
pub mod popup;
pub mod positioner;
pub mod toplevel;
pub mod wm_base;
pub mod xdg_surface;

/// xdg_surface.configure event opcode.
pub(crate) const XDG_SURFACE_CONFIGURE: u16 = 0;
/// xdg_toplevel.configure event opcode.
pub(crate) const TOPLEVEL_CONFIGURE: u16 = 0;

/// xdg_toplevel state values carried in configure's states array.
pub(crate) const STATE_MAXIMIZED: u32 = 1;
pub(crate) const STATE_FULLSCREEN: u32 = 2;
pub(crate) const STATE_ACTIVATED: u32 = 4;

/// Build the states array payload bytes for a flag combination.
pub(crate) fn states_bytes(maximized: bool, fullscreen: bool) -> Vec<u8> {
    let mut bytes = Vec::new();
    if maximized {
        bytes.extend_from_slice(&STATE_MAXIMIZED.to_le_bytes());
    }
    if fullscreen {
        bytes.extend_from_slice(&STATE_FULLSCREEN.to_le_bytes());
    }
    bytes.extend_from_slice(&STATE_ACTIVATED.to_le_bytes());
    bytes
}
