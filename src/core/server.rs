//! Listener setup and the accept loop.

use std::os::unix::net::{UnixListener, UnixStream};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::core::config::ServerConfig;
use crate::core::connection::{self, ConnectionHandle, ControlMessage};
use crate::core::input::{InputEvent, PointerPosition};
use crate::core::render::SceneSnapshot;
use crate::prelude::*;
use crate::util::logging::SERVER;
use crate::wlog;

pub struct Server {
    listener: UnixListener,
    socket_path: PathBuf,
    config: Arc<ServerConfig>,
    pointer: Arc<RwLock<PointerPosition>>,
    keymap: Arc<Vec<u8>>,
    connections: Vec<ConnectionHandle>,
}

impl Server {
    /// Bind `$XDG_RUNTIME_DIR/<socket_name>`, replacing a stale socket
    /// file from a previous run.
    pub fn bind(config: ServerConfig, keymap: Vec<u8>) -> Result<Self> {
        let runtime_dir =
            std::env::var("XDG_RUNTIME_DIR").context("XDG_RUNTIME_DIR is not set")?;
        let socket_path = PathBuf::from(runtime_dir).join(&config.socket_name);
        let _ = std::fs::remove_file(&socket_path);

        let listener = UnixListener::bind(&socket_path)
            .with_context(|| format!("failed to bind {}", socket_path.display()))?;
        listener
            .set_nonblocking(true)
            .context("failed to make the listener non-blocking")?;

        wlog!(SERVER, "listening on {}", socket_path.display());
        Ok(Self {
            listener,
            socket_path,
            config: Arc::new(config),
            pointer: Arc::new(RwLock::new(PointerPosition::default())),
            keymap: Arc::new(keymap),
            connections: Vec::new(),
        })
    }

    pub fn socket_path(&self) -> &std::path::Path {
        &self.socket_path
    }

    /// Accept any pending clients without blocking, then prune threads
    /// that have exited.
    pub fn poll_accept(&mut self) -> Result<()> {
        loop {
            match self.listener.accept() {
                Ok((stream, _)) => {
                    self.adopt(stream)?;
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e).context("accept failed"),
            }
        }
        self.connections.retain(|c| !c.thread.is_finished());
        Ok(())
    }

    fn adopt(&mut self, stream: UnixStream) -> Result<()> {
        wlog!(SERVER, "client connected");
        let handle = connection::spawn(
            stream,
            self.config.clone(),
            self.pointer.clone(),
            self.keymap.clone(),
        )
        .context("failed to start connection thread")?;
        self.connections.push(handle);
        Ok(())
    }

    /// Fan an input event out to every connection. Delivery is best
    /// effort; a connection mid-teardown just misses it.
    pub fn broadcast_input(&self, event: InputEvent) {
        for connection in &self.connections {
            let _ = connection
                .commands
                .try_send(ControlMessage::Input(event));
        }
    }

    /// Tell every connection a frame was drawn.
    pub fn frame_tick(&self, time_ms: u32) {
        for connection in &self.connections {
            let _ = connection
                .commands
                .try_send(ControlMessage::FrameTick { time_ms });
        }
    }

    /// Collect the latest published scene of every connection.
    pub fn scenes(&self) -> Vec<SceneSnapshot> {
        self.connections.iter().map(|c| c.scene.latest()).collect()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Ask every connection thread to stop and wait briefly for them.
    pub fn shutdown(&mut self) {
        for connection in &self.connections {
            let _ = connection.commands.try_send(ControlMessage::Shutdown);
        }
        for connection in self.connections.drain(..) {
            let _ = connection.thread.join();
        }
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// Cadence of the fallback frame loop in `main`.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);
