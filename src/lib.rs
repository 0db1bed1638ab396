// termwl
// Copyright (c) 2026
//
// Terminal-hosted Wayland protocol engine. Clients connect over a Unix
// socket in XDG_RUNTIME_DIR; committed surface content is folded into a
// scene snapshot the hosting frame loop renders into the terminal.

pub mod core;
pub mod prelude;
pub mod util;

pub use crate::core::{ClientState, Server, ServerConfig};

#[cfg(test)]
mod tests;
