//! Whole-connection tests: decoded request frames pushed through
//! `dispatch`, assertions on the events queued back and on the state the
//! handlers leave behind.

use std::sync::mpsc::Receiver;

use crate::core::globals::{
    GLOBAL_COMPOSITOR, GLOBAL_SHM, GLOBAL_SUBCOMPOSITOR, GLOBAL_WM_BASE,
};
use crate::core::objects::{ObjectId, ProtocolObject};
use crate::core::state::test_support::new_state_with_events;
use crate::core::state::{ClientState, ConfigureAction};
use crate::core::wayland::dispatch;
use crate::core::wire::{
    encode_event, ArgReader, ArgWriter, Message, MessageDecoder, OutgoingEvent,
};
use crate::util::testfd::memfd_with_bytes;

const DISPLAY: ObjectId = ObjectId::new(1);
const REGISTRY: ObjectId = ObjectId::new(2);
const COMPOSITOR: ObjectId = ObjectId::new(3);
const WM_BASE: ObjectId = ObjectId::new(4);
const SUBCOMPOSITOR: ObjectId = ObjectId::new(5);
const SHM: ObjectId = ObjectId::new(6);

const SURFACE: ObjectId = ObjectId::new(0x10);
const XDG_SURFACE: ObjectId = ObjectId::new(0x11);
const TOPLEVEL: ObjectId = ObjectId::new(0x12);
const PARENT_SURFACE: ObjectId = ObjectId::new(0x13);
const POOL: ObjectId = ObjectId::new(0x20);
const BUFFER: ObjectId = ObjectId::new(0x21);
const SUBSURFACE: ObjectId = ObjectId::new(0x30);
const CALLBACK: ObjectId = ObjectId::new(0x40);

fn req(state: &mut ClientState, object_id: ObjectId, opcode: u16, data: Vec<u8>) {
    dispatch(state, &Message { object_id, opcode, data });
}

fn drain(rx: &Receiver<OutgoingEvent>) -> Vec<OutgoingEvent> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

fn bind(state: &mut ClientState, name: u32, interface: &str, version: u32, id: ObjectId) {
    let data = ArgWriter::new()
        .u32(name)
        .string(interface)
        .u32(version)
        .id(id)
        .build();
    req(state, REGISTRY, 0, data);
}

/// get_registry plus the binds most tests need.
fn connect(state: &mut ClientState) {
    req(state, DISPLAY, 1, ArgWriter::new().id(REGISTRY).build());
    bind(state, GLOBAL_COMPOSITOR.0, "wl_compositor", 6, COMPOSITOR);
    bind(state, GLOBAL_WM_BASE.0, "xdg_wm_base", 5, WM_BASE);
}

fn create_surface(state: &mut ClientState, id: ObjectId) {
    req(state, COMPOSITOR, 0, ArgWriter::new().id(id).build());
}

fn create_toplevel(state: &mut ClientState) {
    create_surface(state, SURFACE);
    let data = ArgWriter::new().id(XDG_SURFACE).id(SURFACE).build();
    req(state, WM_BASE, 2, data);
    req(state, XDG_SURFACE, 1, ArgWriter::new().id(TOPLEVEL).build());
}

#[test]
fn test_registry_announces_and_binds() {
    let (mut state, rx) = new_state_with_events();
    req(&mut state, DISPLAY, 1, ArgWriter::new().id(REGISTRY).build());

    let announced = drain(&rx);
    assert!(announced.len() >= 10);
    assert!(announced
        .iter()
        .all(|ev| ev.object_id == REGISTRY && ev.opcode == 0));

    bind(&mut state, GLOBAL_COMPOSITOR.0, "wl_compositor", 6, COMPOSITOR);
    assert_eq!(state.get_object(COMPOSITOR), Some(ProtocolObject::Compositor));
    assert_eq!(state.compositor_version, 6);

    // Unknown names are probes for extensions we do not carry.
    bind(&mut state, 0xdead, "zwp_imaginary_v1", 1, ObjectId::new(0x99));
    assert_eq!(state.get_object(ObjectId::new(0x99)), None);
}

#[test]
fn test_toplevel_creation_proposes_maximized_fullscreen() {
    let (mut state, rx) = new_state_with_events();
    connect(&mut state);
    create_surface(&mut state, SURFACE);
    req(
        &mut state,
        WM_BASE,
        2,
        ArgWriter::new().id(XDG_SURFACE).id(SURFACE).build(),
    );
    drain(&rx);

    req(&mut state, XDG_SURFACE, 1, ArgWriter::new().id(TOPLEVEL).build());
    let events = drain(&rx);

    // xdg_toplevel.configure first, sized to the monitor.
    let toplevel_cfg = &events[0];
    assert_eq!(toplevel_cfg.object_id, TOPLEVEL);
    assert_eq!(toplevel_cfg.opcode, 0);
    let mut args = ArgReader::new(&toplevel_cfg.data);
    assert_eq!(args.i32(), 1920);
    assert_eq!(args.i32(), 1080);
    let states = args.array();
    let states: Vec<u32> = states
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    assert!(states.contains(&1), "maximized proposed");
    assert!(states.contains(&2), "fullscreen proposed");
    assert!(states.contains(&4), "activated always present");

    // Then xdg_surface.configure carrying the first serial, 0.
    let surface_cfg = &events[1];
    assert_eq!(surface_cfg.object_id, XDG_SURFACE);
    assert_eq!(surface_cfg.opcode, 0);
    assert_eq!(ArgReader::new(&surface_cfg.data).u32(), 0);

    assert!(state.toplevel_windows.contains(&TOPLEVEL));
    let record = &state.xdg_surfaces[&XDG_SURFACE];
    assert_eq!(
        record.waits.get(&0),
        Some(&ConfigureAction::ApplyToplevelState {
            toplevel: TOPLEVEL,
            maximized: true,
            fullscreen: true,
        })
    );
}

#[test]
fn test_ack_releases_serials_cumulatively() {
    let (mut state, rx) = new_state_with_events();
    connect(&mut state);
    create_toplevel(&mut state);

    // Serial 0 is parked by creation; the record itself is untouched
    // until an ack arrives.
    assert!(!state.toplevels[&TOPLEVEL].maximized);

    // unset_fullscreen parks serial 1, set_maximized serial 2. Each one
    // proposes relative to the record's acked flags, still both false.
    req(&mut state, TOPLEVEL, 12, Vec::new());
    req(&mut state, TOPLEVEL, 9, Vec::new());
    assert_eq!(state.xdg_surfaces[&XDG_SURFACE].waits.len(), 3);

    // Acking serial 1 runs serials 0 and 1 in order; 2 stays parked.
    req(&mut state, XDG_SURFACE, 4, ArgWriter::new().u32(1).build());
    let record = &state.xdg_surfaces[&XDG_SURFACE];
    assert_eq!(record.waits.len(), 1);
    assert!(record.waits.contains_key(&2));
    assert!(!state.toplevels[&TOPLEVEL].maximized);
    assert!(!state.toplevels[&TOPLEVEL].fullscreen);

    // The late ack releases the remaining proposal.
    req(&mut state, XDG_SURFACE, 4, ArgWriter::new().u32(2).build());
    assert!(state.xdg_surfaces[&XDG_SURFACE].waits.is_empty());
    assert!(state.toplevels[&TOPLEVEL].maximized);
    assert!(!state.toplevels[&TOPLEVEL].fullscreen);
    drain(&rx);
}

#[test]
fn test_attach_offset_rejected_on_new_compositors() {
    let (mut state, rx) = new_state_with_events();
    req(&mut state, DISPLAY, 1, ArgWriter::new().id(REGISTRY).build());
    bind(&mut state, GLOBAL_COMPOSITOR.0, "wl_compositor", 5, COMPOSITOR);
    create_surface(&mut state, SURFACE);
    drain(&rx);

    let data = ArgWriter::new().object(None).i32(2).i32(0).build();
    req(&mut state, SURFACE, 1, data);

    let events = drain(&rx);
    let error = events
        .iter()
        .find(|ev| ev.object_id == DISPLAY && ev.opcode == 0)
        .expect("wl_display.error for versioned attach offset");
    let mut args = ArgReader::new(&error.data);
    assert_eq!(args.u32(), SURFACE.raw());
    assert_eq!(args.u32(), 3); // invalid_offset
}

#[test]
fn test_roles_are_exclusive_across_shells() {
    let (mut state, rx) = new_state_with_events();
    connect(&mut state);
    bind(
        &mut state,
        GLOBAL_SUBCOMPOSITOR.0,
        "wl_subcompositor",
        1,
        SUBCOMPOSITOR,
    );
    create_toplevel(&mut state);
    create_surface(&mut state, PARENT_SURFACE);
    drain(&rx);

    // SURFACE already carries the toplevel role.
    let data = ArgWriter::new()
        .id(SUBSURFACE)
        .id(SURFACE)
        .id(PARENT_SURFACE)
        .build();
    req(&mut state, SUBCOMPOSITOR, 1, data);

    let events = drain(&rx);
    let error = events
        .iter()
        .find(|ev| ev.object_id == DISPLAY && ev.opcode == 0)
        .expect("wl_display.error for the role clash");
    let mut args = ArgReader::new(&error.data);
    assert_eq!(args.u32(), SUBCOMPOSITOR.raw());
    assert_eq!(args.u32(), 0); // bad_surface
    assert_eq!(state.get_object(SUBSURFACE), None);
}

#[test]
fn test_subsurface_ancestor_cycle_is_rejected() {
    let (mut state, rx) = new_state_with_events();
    connect(&mut state);
    bind(
        &mut state,
        GLOBAL_SUBCOMPOSITOR.0,
        "wl_subcompositor",
        1,
        SUBCOMPOSITOR,
    );
    create_surface(&mut state, SURFACE);
    create_surface(&mut state, PARENT_SURFACE);
    let data = ArgWriter::new()
        .id(SUBSURFACE)
        .id(SURFACE)
        .id(PARENT_SURFACE)
        .build();
    req(&mut state, SUBCOMPOSITOR, 1, data);
    drain(&rx);

    // Closing the loop the other way would let a commit chase its own
    // tail through the synchronized children.
    let data = ArgWriter::new()
        .id(ObjectId::new(0x31))
        .id(PARENT_SURFACE)
        .id(SURFACE)
        .build();
    req(&mut state, SUBCOMPOSITOR, 1, data);

    let events = drain(&rx);
    let error = events
        .iter()
        .find(|ev| ev.object_id == DISPLAY && ev.opcode == 0)
        .expect("wl_display.error for the ancestor cycle");
    let mut args = ArgReader::new(&error.data);
    assert_eq!(args.u32(), SUBCOMPOSITOR.raw());
    assert_eq!(args.u32(), 0); // bad_surface
    assert_eq!(state.get_object(ObjectId::new(0x31)), None);

    // Committing either end still terminates.
    req(&mut state, PARENT_SURFACE, 6, Vec::new());
    req(&mut state, SURFACE, 6, Vec::new());
    assert!(state.surfaces.contains_key(&SURFACE));
    assert!(state.surfaces.contains_key(&PARENT_SURFACE));
}

#[test]
fn test_shm_pool_to_scene_pipeline() {
    let (mut state, rx) = new_state_with_events();
    connect(&mut state);
    bind(&mut state, GLOBAL_SHM.0, "wl_shm", 1, SHM);

    let pixels: Vec<u8> = (0u8..16).collect();
    state.unclaimed_fds.push_back(memfd_with_bytes(&pixels));
    req(
        &mut state,
        SHM,
        0,
        ArgWriter::new().id(POOL).i32(pixels.len() as i32).build(),
    );
    assert!(state.pools.contains_key(&POOL));

    // 2x2 ARGB8888, stride 8.
    let data = ArgWriter::new()
        .id(BUFFER)
        .i32(0)
        .i32(2)
        .i32(2)
        .i32(8)
        .u32(0)
        .build();
    req(&mut state, POOL, 0, data);

    create_surface(&mut state, SURFACE);
    drain(&rx);
    let attach = ArgWriter::new()
        .object(Some(BUFFER))
        .i32(0)
        .i32(0)
        .build();
    req(&mut state, SURFACE, 1, attach);
    req(&mut state, SURFACE, 6, Vec::new());

    assert!(state.drawable_surfaces.contains(&SURFACE));
    let texture = state.surfaces[&SURFACE]
        .texture
        .as_ref()
        .expect("commit copied the buffer");
    assert_eq!(texture.width, 2);
    assert_eq!(texture.height, 2);
    assert_eq!(*texture.data, pixels);

    let snapshot = state.scene.latest();
    assert_eq!(snapshot.surfaces.len(), 1);
    assert_eq!(snapshot.surfaces[0].surface_id, SURFACE.raw());
    assert_eq!(*snapshot.surfaces[0].data, pixels);

    // The copy releases the buffer back to the client right away.
    assert!(drain(&rx)
        .iter()
        .any(|ev| ev.object_id == BUFFER && ev.opcode == 0));

    // Teardown in buffer-then-pool order frees the mapping.
    req(&mut state, BUFFER, 0, Vec::new());
    req(&mut state, POOL, 1, Vec::new());
    assert!(state.pools.is_empty());
    assert_eq!(state.get_object(BUFFER), None);
    assert_eq!(state.get_object(POOL), None);
}

#[test]
fn test_frame_callback_completes_on_tick() {
    let (mut state, rx) = new_state_with_events();
    connect(&mut state);
    create_surface(&mut state, SURFACE);
    req(&mut state, SURFACE, 3, ArgWriter::new().id(CALLBACK).build());
    req(&mut state, SURFACE, 6, Vec::new());
    drain(&rx);

    state.fire_frame_callbacks(99);

    let events = drain(&rx);
    let done = events
        .iter()
        .find(|ev| ev.object_id == CALLBACK && ev.opcode == 0)
        .expect("wl_callback.done");
    assert_eq!(ArgReader::new(&done.data).u32(), 99);
    assert!(events
        .iter()
        .any(|ev| ev.object_id == DISPLAY && ev.opcode == 1));
    assert_eq!(state.get_object(CALLBACK), None);
    assert!(state.frame_callbacks.is_empty());
}

#[test]
fn test_sync_burst_flushes_through_connection_loop() {
    use std::io::{Read, Write};
    use std::os::unix::net::UnixStream;
    use std::time::Duration;

    use crate::core::config::ServerConfig;
    use crate::core::connection::{spawn, ControlMessage};
    use crate::core::input::PointerPosition;
    use crate::prelude::*;

    let (client, server) = UnixStream::pair().unwrap();
    let handle = spawn(
        server,
        Arc::new(ServerConfig::default()),
        Arc::new(RwLock::new(PointerPosition::default())),
        Arc::new(Vec::new()),
    )
    .unwrap();

    // One batch of syncs large enough to outrun any fixed queue depth;
    // each answers with a done plus a delete_id.
    const SYNCS: u32 = 300;
    let mut batch = Vec::new();
    for i in 0..SYNCS {
        let request = OutgoingEvent::new(
            DISPLAY,
            0,
            ArgWriter::new().id(ObjectId::new(0x100 + i)).build(),
        );
        batch.extend_from_slice(&encode_event(&request));
    }
    (&client).write_all(&batch).unwrap();

    client.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let mut decoder = MessageDecoder::new();
    let mut buf = [0u8; 4096];
    let mut seen = 0usize;
    while seen < (SYNCS as usize) * 2 {
        let n = (&client).read(&mut buf).unwrap();
        assert!(n > 0, "connection closed before the burst drained");
        seen += decoder.consume(&buf[..n]).unwrap().len();
    }

    let _ = handle.commands.send(ControlMessage::Shutdown);
    handle.thread.join().unwrap();
}
