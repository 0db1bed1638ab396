//! Standardized logging utility for termwl
//!
//! This module provides the `wlog!` macro which ensures all protocol-path
//! logs follow the `YYYY-MM-DD HH:MM:SS [MODULE] Message` format.

#[macro_export]
macro_rules! wlog {
    ($module:expr, $($arg:tt)*) => {{
        let now = chrono::Local::now();
        eprintln!("{} [{}] {}",
            now.format("%Y-%m-%d %H:%M:%S"),
            $module,
            format!($($arg)*)
        );
    }};
}

/// Standardized module identifiers
pub const MAIN: &str = "MAIN";
pub const SERVER: &str = "SERVER";
pub const CLIENT: &str = "CLIENT";
pub const WIRE: &str = "WIRE";
pub const REGISTRY: &str = "REGISTRY";
pub const SHM: &str = "SHM";
pub const SURFACE: &str = "SURFACE";
pub const SCENE: &str = "SCENE";
pub const SEAT: &str = "SEAT";
pub const XDG: &str = "XDG";
pub const INPUT: &str = "INPUT";
