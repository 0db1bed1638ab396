//! wl_surface: the double-buffered request surface.

use crate::core::objects::ProtocolObject;
use crate::core::state::ClientState;
use crate::core::surface::DamageRegion;
use crate::core::wire::{ArgReader, Message};
use crate::util::geometry::{Point, Rect};

const REQ_DESTROY: u16 = 0;
const REQ_ATTACH: u16 = 1;
const REQ_DAMAGE: u16 = 2;
const REQ_FRAME: u16 = 3;
const REQ_SET_OPAQUE_REGION: u16 = 4;
const REQ_SET_INPUT_REGION: u16 = 5;
const REQ_COMMIT: u16 = 6;
const REQ_SET_BUFFER_TRANSFORM: u16 = 7;
const REQ_SET_BUFFER_SCALE: u16 = 8;
const REQ_DAMAGE_BUFFER: u16 = 9;
const REQ_OFFSET: u16 = 10;

/// wl_surface error codes.
const ERR_INVALID_OFFSET: u32 = 3;
const ERR_DEFUNCT_ROLE_OBJECT: u32 = 4;

/// Attach offsets are illegal from this wl_compositor version on; clients
/// must use the offset request instead.
const ATTACH_OFFSET_FORBIDDEN_SINCE: u32 = 5;

pub fn handle(state: &mut ClientState, msg: &Message) {
    let sid = msg.object_id;
    let mut args = ArgReader::new(&msg.data);
    match msg.opcode {
        REQ_DESTROY => {
            let role_active = state
                .surfaces
                .get(&sid)
                .map(|s| s.has_role_data())
                .unwrap_or(false);
            if role_active {
                state.send_error(
                    sid,
                    ERR_DEFUNCT_ROLE_OBJECT,
                    "surface destroyed with active role",
                );
                return;
            }
            state.surfaces.remove(&sid);
            state.drawable_surfaces.remove(&sid);
            state.destroy_object(sid);
            state.refresh_scene();
        }
        REQ_ATTACH => {
            let buffer = args.object();
            let x = args.i32();
            let y = args.i32();
            if (x != 0 || y != 0)
                && state.compositor_version >= ATTACH_OFFSET_FORBIDDEN_SINCE
            {
                state.send_error(
                    sid,
                    ERR_INVALID_OFFSET,
                    "attach offset forbidden at this version",
                );
                return;
            }
            if let Some(surface) = state.surfaces.get_mut(&sid) {
                surface.pending.mark_buffer_attached(buffer);
                if x != 0 || y != 0 {
                    surface.pending.offset = Some(Point::new(x, y));
                }
            }
        }
        REQ_DAMAGE => {
            let region = DamageRegion::new(args.i32(), args.i32(), args.i32(), args.i32());
            if let Some(surface) = state.surfaces.get_mut(&sid) {
                surface.pending.damage.push(region);
            }
        }
        REQ_FRAME => {
            let callback = args.new_id();
            state.add_object(callback, ProtocolObject::Callback);
            state.add_frame_callback(callback);
        }
        REQ_SET_OPAQUE_REGION => {
            let region = args.object();
            if let Some(surface) = state.surfaces.get_mut(&sid) {
                surface.pending.opaque_region = Some(region);
            }
        }
        REQ_SET_INPUT_REGION => {
            let region = args.object();
            if let Some(surface) = state.surfaces.get_mut(&sid) {
                surface.pending.input_region = Some(region);
            }
        }
        REQ_COMMIT => {
            state.commit_surface(sid);
        }
        REQ_SET_BUFFER_TRANSFORM => {
            let transform = args.i32();
            if let Some(surface) = state.surfaces.get_mut(&sid) {
                surface.pending.transform = Some(transform);
            }
        }
        REQ_SET_BUFFER_SCALE => {
            let scale = args.i32();
            if let Some(surface) = state.surfaces.get_mut(&sid) {
                surface.pending.scale = Some(scale);
            }
        }
        REQ_DAMAGE_BUFFER => {
            let region = DamageRegion::new(args.i32(), args.i32(), args.i32(), args.i32());
            if let Some(surface) = state.surfaces.get_mut(&sid) {
                surface.pending.buffer_damage.push(region);
            }
        }
        REQ_OFFSET => {
            let offset = Point::new(args.i32(), args.i32());
            if let Some(surface) = state.surfaces.get_mut(&sid) {
                surface.pending.offset = Some(offset);
            }
        }
        _ => super::unhandled(state, msg, &ProtocolObject::Surface),
    }
}

/// Shared by xdg_surface.set_window_geometry, which stages through the
/// same pending overlay.
pub fn stage_window_geometry(state: &mut ClientState, sid: crate::core::objects::ObjectId, rect: Rect) {
    if let Some(surface) = state.surfaces.get_mut(&sid) {
        surface.pending.window_geometry = Some(rect);
    }
}
