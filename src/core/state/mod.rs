//! Per-connection protocol state.
//!
//! `ClientState` holds everything one connection owns: its object registry,
//! global binds, surfaces and their protocol-side records, shm pools, the
//! outgoing event queue, and the configure/ack bookkeeping. It is owned
//! exclusively by the connection's thread; the only values shared across
//! connections are the read-mostly config, the keymap blob, and the live
//! pointer position.
//!
//! Heavy per-object state lives in the typed maps here, keyed by protocol
//! id; the registry entry is only the routing discriminant.

use std::os::fd::OwnedFd;
use std::sync::mpsc::Sender;

use crate::core::config::ServerConfig;
use crate::core::globals::GlobalBinds;
use crate::core::input::PointerPosition;
use crate::core::objects::{ObjectId, ProtocolObject};
use crate::core::registry::ObjectRegistry;
use crate::core::render::SharedScene;
use crate::core::shm::ShmPool;
use crate::core::surface::{RoleKind, Surface};
use crate::core::wire::{ArgWriter, OutgoingEvent};
use crate::prelude::*;
use crate::util::geometry::Rect;
use crate::util::logging::CLIENT;
use crate::wlog;

mod input;
mod scene;
mod surfaces;

pub use surfaces::SubsurfaceRecord;

/// wl_display.error event opcode.
const DISPLAY_ERROR: u16 = 0;
/// wl_display.delete_id event opcode.
const DISPLAY_DELETE_ID: u16 = 1;
/// The display singleton's fixed object id.
const DISPLAY_ID: u32 = 1;

/// A parked continuation keyed by configure serial, resumed on ack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigureAction {
    /// Nothing to resume; the wait only tracks that the serial is out.
    None,
    /// Commit the flag combination proposed by a maximize/fullscreen round
    /// trip into the toplevel's own state.
    ApplyToplevelState {
        toplevel: ObjectId,
        maximized: bool,
        fullscreen: bool,
    },
    /// Apply a popup's pending reposition placement.
    ApplyReposition { popup: ObjectId },
}

/// Configure-serial bookkeeping for one xdg_surface.
#[derive(Debug, Default)]
pub struct XdgSurfaceRecord {
    pub surface: ObjectId,
    pub version: u32,
    /// Serial of the last configure issued; the first issued is 0.
    pub last_serial: Option<u32>,
    pub waits: HashMap<u32, ConfigureAction>,
    pub window_geometry: Option<Rect>,
}

impl XdgSurfaceRecord {
    pub fn new(surface: ObjectId, version: u32) -> Self {
        Self {
            surface,
            version,
            ..Default::default()
        }
    }

    pub fn next_serial(&mut self) -> u32 {
        let serial = match self.last_serial {
            None => 0,
            Some(s) => s.wrapping_add(1),
        };
        self.last_serial = Some(serial);
        serial
    }
}

#[derive(Debug, Default)]
pub struct ToplevelRecord {
    pub xdg_surface: ObjectId,
    pub title: String,
    pub app_id: String,
    pub parent: Option<ObjectId>,
    pub maximized: bool,
    pub fullscreen: bool,
    pub pending_min_size: Option<(i32, i32)>,
    pub pending_max_size: Option<(i32, i32)>,
}

/// Placement inputs recorded by xdg_positioner requests. Queried when a
/// popup is created or repositioned; constraint adjustment is recorded but
/// never acted on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionerRecord {
    pub size: Option<(i32, i32)>,
    pub anchor_rect: Option<Rect>,
    pub anchor: u32,
    pub gravity: u32,
    pub constraint_adjustment: u32,
    pub offset: (i32, i32),
    pub reactive: bool,
    pub parent_size: Option<(i32, i32)>,
    pub parent_configure_serial: Option<u32>,
}

#[derive(Debug, Default)]
pub struct PopupRecord {
    pub xdg_surface: ObjectId,
    pub parent_xdg_surface: Option<ObjectId>,
    pub placement: PositionerRecord,
    /// Latest-wins reposition, applied when the parent's configure is acked.
    pub pending_reposition: Option<PositionerRecord>,
}

#[derive(Debug, Default)]
pub struct DataSourceRecord {
    pub mime_types: Vec<String>,
    pub actions: u32,
}

/// Bounding-rectangle region model: add grows the bound, subtract is
/// accepted and recorded only as "not the full rect anymore".
#[derive(Debug, Default, Clone, Copy)]
pub struct RegionRecord {
    pub bounds: Option<Rect>,
    pub subtracted: bool,
}

pub struct ClientState {
    pub objects: ObjectRegistry,
    pub binds: GlobalBinds,

    pub surfaces: HashMap<ObjectId, Surface>,
    pub pools: HashMap<ObjectId, ShmPool>,
    pub regions: HashMap<ObjectId, RegionRecord>,
    pub subsurfaces: HashMap<ObjectId, SubsurfaceRecord>,
    pub xdg_surfaces: HashMap<ObjectId, XdgSurfaceRecord>,
    pub toplevels: HashMap<ObjectId, ToplevelRecord>,
    pub popups: HashMap<ObjectId, PopupRecord>,
    pub positioners: HashMap<ObjectId, PositionerRecord>,
    pub data_sources: HashMap<ObjectId, DataSourceRecord>,

    /// Role object (toplevel, popup, subsurface, xwayland surface) to the
    /// wl_surface holding that role.
    pub roles_to_surfaces: HashMap<ObjectId, ObjectId>,
    /// Surfaces with valid pixel content, walked into the scene.
    pub drawable_surfaces: HashSet<ObjectId>,
    /// Tracked top-level windows (xdg_toplevel object ids).
    pub toplevel_windows: HashSet<ObjectId>,
    /// Frame callbacks awaiting the next frame tick, per owning surface.
    pub frame_callbacks: Vec<ObjectId>,

    /// Received fds, oldest first, claimed by handlers that expect one.
    pub unclaimed_fds: VecDeque<OwnedFd>,

    /// Version negotiated at wl_compositor bind; gates attach offsets.
    pub compositor_version: u32,
    /// The surface currently serving as this connection's cursor image.
    pub cursor_surface: Option<ObjectId>,
    /// The button currently considered logically held, for the release
    /// matching described in [`input`].
    pub held_button: Option<u32>,
    /// Monotonic event serial (enter/button/key serials).
    serial: u32,
    /// Basis for millisecond event timestamps.
    started: std::time::Instant,

    pub outgoing: Sender<OutgoingEvent>,
    pub scene: SharedScene,
    pub config: Arc<ServerConfig>,
    pub pointer: Arc<RwLock<PointerPosition>>,
    pub keymap: Arc<Vec<u8>>,
}

impl ClientState {
    pub fn new(
        outgoing: Sender<OutgoingEvent>,
        scene: SharedScene,
        config: Arc<ServerConfig>,
        pointer: Arc<RwLock<PointerPosition>>,
        keymap: Arc<Vec<u8>>,
    ) -> Self {
        Self {
            objects: ObjectRegistry::new(),
            binds: GlobalBinds::new(),
            surfaces: HashMap::new(),
            pools: HashMap::new(),
            regions: HashMap::new(),
            subsurfaces: HashMap::new(),
            xdg_surfaces: HashMap::new(),
            toplevels: HashMap::new(),
            popups: HashMap::new(),
            positioners: HashMap::new(),
            data_sources: HashMap::new(),
            roles_to_surfaces: HashMap::new(),
            drawable_surfaces: HashSet::new(),
            toplevel_windows: HashSet::new(),
            frame_callbacks: Vec::new(),
            unclaimed_fds: VecDeque::new(),
            compositor_version: 0,
            cursor_surface: None,
            held_button: None,
            serial: 0,
            started: std::time::Instant::now(),
            outgoing,
            scene,
            config,
            pointer,
            keymap,
        }
    }

    /// Queue one event. The queue is drained by the connection thread
    /// after every dispatched request; a dropped receiver means the
    /// connection is going away and the event is moot.
    pub fn send(&self, event: OutgoingEvent) {
        if self.outgoing.send(event).is_err() {
            wlog!(CLIENT, "dropping event for closed connection");
        }
    }

    /// Report a protocol violation via wl_display.error. Does not alter
    /// server state beyond the report itself.
    pub fn send_error(&self, object: ObjectId, code: u32, message: &str) {
        wlog!(
            CLIENT,
            "protocol error on object {}: code {} ({})",
            object,
            code,
            message
        );
        let data = ArgWriter::new()
            .id(object)
            .u32(code)
            .string(message)
            .build();
        self.send(OutgoingEvent::new(
            ObjectId::new(DISPLAY_ID),
            DISPLAY_ERROR,
            data,
        ));
    }

    /// Claim the oldest unclaimed fd. Absence is the client's protocol
    /// violation, never a wait.
    pub fn claim_fd(&mut self) -> Option<OwnedFd> {
        self.unclaimed_fds.pop_front()
    }

    pub fn next_serial(&mut self) -> u32 {
        self.serial = self.serial.wrapping_add(1);
        self.serial
    }

    /// Milliseconds since this connection came up, for event timestamps.
    pub fn time_ms(&self) -> u32 {
        self.started.elapsed().as_millis() as u32
    }

    pub fn add_object(&mut self, id: ObjectId, object: ProtocolObject) -> bool {
        self.objects.add(id, object)
    }

    pub fn remove_object(&mut self, id: ObjectId) -> Option<ProtocolObject> {
        self.objects.remove(id)
    }

    /// Remove a client-destroyed object and tell the client the id is free
    /// for reuse via wl_display.delete_id.
    pub fn destroy_object(&mut self, id: ObjectId) {
        self.objects.remove(id);
        let data = ArgWriter::new().id(id).build();
        self.send(OutgoingEvent::new(
            ObjectId::new(DISPLAY_ID),
            DISPLAY_DELETE_ID,
            data,
        ));
    }

    pub fn get_object(&self, id: ObjectId) -> Option<ProtocolObject> {
        self.objects.get(id)
    }

    /// Bind a role object to the surface that carries its role.
    pub fn register_role(&mut self, role_object: ObjectId, surface: ObjectId) {
        self.roles_to_surfaces.insert(role_object, surface);
    }

    pub fn unregister_role(&mut self, role_object: ObjectId) -> Option<ObjectId> {
        self.roles_to_surfaces.remove(&role_object)
    }

    pub fn surface_for_role(&self, role_object: ObjectId) -> Option<ObjectId> {
        self.roles_to_surfaces.get(&role_object).copied()
    }

    /// Whether `surface` may take (or re-take) `kind`. Holding a different
    /// role, or already holding active data for this one, is a violation.
    pub fn role_assignable(&self, surface: ObjectId, kind: RoleKind) -> bool {
        match self.surfaces.get(&surface).and_then(|s| s.role.as_ref()) {
            None => true,
            Some(role) => role.kind() == kind && !role.has_data(),
        }
    }
}

#[cfg(test)]
pub mod test_support {
    use std::sync::mpsc::{channel, Receiver};

    use super::*;
    use crate::core::wire::OutgoingEvent;

    /// A state whose queue receiver is kept alive by leaking it, so tests
    /// that never drain events still observe sends.
    pub fn new_state() -> ClientState {
        let (state, rx) = new_state_with_events();
        std::mem::forget(rx);
        state
    }

    pub fn new_state_with_events() -> (ClientState, Receiver<OutgoingEvent>) {
        let (tx, rx) = channel();
        let state = ClientState::new(
            tx,
            SharedScene::new(),
            Arc::new(ServerConfig::default()),
            Arc::new(RwLock::new(PointerPosition::default())),
            Arc::new(Vec::new()),
        );
        (state, rx)
    }
}
