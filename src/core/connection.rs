//! One thread per client: the receive/dispatch/send loop.

use std::os::unix::net::UnixStream;
use std::sync::mpsc::{channel, sync_channel, Receiver, SyncSender, TryRecvError};
use std::time::Duration;

use crate::core::config::ServerConfig;
use crate::core::input::{InputEvent, PointerPosition};
use crate::core::render::SharedScene;
use crate::core::socket::{recv_with_fds, RecvOutcome};
use crate::core::state::ClientState;
use crate::core::wire::{encode_event, MessageDecoder};
use crate::core::{socket, wayland};
use crate::prelude::*;
use crate::util::logging::CLIENT;
use crate::wlog;

/// Command queue depth. A stalled connection thread blocks the
/// orchestrator here instead of growing memory without bound.
const COMMAND_QUEUE_DEPTH: usize = 256;
/// Read timeout; a timeout with zero bytes is the loop's idle tick.
const READ_TIMEOUT: Duration = Duration::from_millis(1);

/// Instructions from the orchestrator to a connection thread.
#[derive(Debug)]
pub enum ControlMessage {
    Input(InputEvent),
    /// The frame was drawn; complete frame callbacks with this timestamp.
    FrameTick { time_ms: u32 },
    Shutdown,
}

/// The orchestrator's handle to one live connection.
pub struct ConnectionHandle {
    pub commands: SyncSender<ControlMessage>,
    pub scene: SharedScene,
    pub thread: std::thread::JoinHandle<()>,
}

/// Spawn the thread owning `stream` and everything derived from it.
pub fn spawn(
    stream: UnixStream,
    config: Arc<ServerConfig>,
    pointer: Arc<RwLock<PointerPosition>>,
    keymap: Arc<Vec<u8>>,
) -> std::io::Result<ConnectionHandle> {
    stream.set_read_timeout(Some(READ_TIMEOUT))?;

    // The outgoing queue is unbounded on purpose: handlers producing
    // events run on the same thread that drains them, so a bounded queue
    // would have the producer wait on itself. Backpressure lives at the
    // socket write instead.
    let (outgoing_tx, outgoing_rx) = channel();
    let (command_tx, command_rx) = sync_channel(COMMAND_QUEUE_DEPTH);
    let scene = SharedScene::new();
    let state = ClientState::new(outgoing_tx, scene.clone(), config, pointer, keymap);

    let thread = std::thread::spawn(move || {
        run(stream, state, outgoing_rx, command_rx);
    });

    Ok(ConnectionHandle {
        commands: command_tx,
        scene,
        thread,
    })
}

/// The connection loop. Returning tears this connection down and nothing
/// else; waits parked in the state are dropped with it.
fn run(
    stream: UnixStream,
    mut state: ClientState,
    outgoing: Receiver<crate::core::wire::OutgoingEvent>,
    commands: Receiver<ControlMessage>,
) {
    let mut decoder = MessageDecoder::new();
    let mut buf = [0u8; 4096];

    loop {
        if let Err(e) = drain_outgoing(&stream, &outgoing) {
            wlog!(CLIENT, "send failed, closing connection: {}", e);
            return;
        }
        match drain_commands(&mut state, &commands) {
            Flow::Continue => {}
            Flow::Stop => return,
        }

        match recv_with_fds(&stream, &mut buf, &mut state.unclaimed_fds) {
            Ok(RecvOutcome::Idle) => continue,
            Ok(RecvOutcome::Closed) => {
                wlog!(CLIENT, "client disconnected");
                return;
            }
            Ok(RecvOutcome::Data(n)) => {
                let messages = match decoder.consume(&buf[..n]) {
                    Ok(messages) => messages,
                    Err(e) => {
                        wlog!(CLIENT, "framing fault, closing connection: {}", e);
                        return;
                    }
                };
                for msg in &messages {
                    wayland::dispatch(&mut state, msg);
                    // Flush what each request produced before the next one
                    // so a bursty batch never accumulates a whole frame's
                    // worth of events.
                    if let Err(e) = drain_outgoing(&stream, &outgoing) {
                        wlog!(CLIENT, "send failed, closing connection: {}", e);
                        return;
                    }
                }
            }
            Err(e) => {
                wlog!(CLIENT, "receive failed, closing connection: {}", e);
                return;
            }
        }
    }
}

enum Flow {
    Continue,
    Stop,
}

fn drain_outgoing(
    stream: &UnixStream,
    outgoing: &Receiver<crate::core::wire::OutgoingEvent>,
) -> crate::prelude::Result<()> {
    loop {
        match outgoing.try_recv() {
            Ok(event) => {
                let bytes = encode_event(&event);
                socket::send_with_fd(stream, &bytes, event.fd.as_ref())?;
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return Ok(()),
        }
    }
}

fn drain_commands(state: &mut ClientState, commands: &Receiver<ControlMessage>) -> Flow {
    loop {
        match commands.try_recv() {
            Ok(ControlMessage::Input(event)) => state.handle_input(event),
            Ok(ControlMessage::FrameTick { time_ms }) => state.fire_frame_callbacks(time_ms),
            Ok(ControlMessage::Shutdown) => return Flow::Stop,
            Err(TryRecvError::Empty) => return Flow::Continue,
            // The orchestrator went away; keep serving the client.
            Err(TryRecvError::Disconnected) => return Flow::Continue,
        }
    }
}
