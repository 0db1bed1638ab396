// termwl
// Copyright (c) 2026
//
// Protocol engine core: wire codec, per-connection object state,
// surface commit machine, and the scene handed to the frame loop.

pub mod config;
pub mod connection;
pub mod errors;
pub mod globals;
pub mod input;
pub mod keymap;
pub mod objects;
pub mod registry;
pub mod render;
pub mod server;
pub mod shm;
pub mod socket;
pub mod state;
pub mod surface;
pub mod wayland;
pub mod wire;

// Re-export key types
pub use config::ServerConfig;
pub use server::Server;
pub use state::ClientState;
