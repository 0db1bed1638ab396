//! Process-wide server configuration.
//!
//! Built once at startup and shared read-only across connection threads;
//! nothing here mutates after the listener is up.

use crate::util::geometry::Size;

pub const DEFAULT_SOCKET_NAME: &str = "wayland-7";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Virtual monitor size advertised through wl_output and used for
    /// toplevel/popup configure events.
    pub monitor: Size,
    /// Socket name under `$XDG_RUNTIME_DIR`.
    pub socket_name: String,
}

impl ServerConfig {
    pub fn new(monitor: Size) -> Self {
        Self {
            monitor,
            socket_name: DEFAULT_SOCKET_NAME.to_string(),
        }
    }

    /// Honors `WAYLAND_DISPLAY_NAME` for the socket name when set.
    pub fn from_env() -> Self {
        let socket_name = std::env::var("WAYLAND_DISPLAY_NAME")
            .unwrap_or_else(|_| DEFAULT_SOCKET_NAME.to_string());
        Self {
            socket_name,
            ..Self::default()
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(Size::new(1920, 1080))
    }
}
