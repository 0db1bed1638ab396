//! wl_region: bounding-rectangle regions.

use crate::core::objects::ProtocolObject;
use crate::core::state::ClientState;
use crate::core::wire::{ArgReader, Message};
use crate::util::geometry::Rect;

const REQ_DESTROY: u16 = 0;
const REQ_ADD: u16 = 1;
const REQ_SUBTRACT: u16 = 2;

pub fn handle(state: &mut ClientState, msg: &Message) {
    let mut args = ArgReader::new(&msg.data);
    match msg.opcode {
        REQ_DESTROY => {
            state.regions.remove(&msg.object_id);
            state.destroy_object(msg.object_id);
        }
        REQ_ADD => {
            let rect = Rect::new(args.i32(), args.i32(), args.i32(), args.i32());
            if let Some(region) = state.regions.get_mut(&msg.object_id) {
                region.bounds = Some(match region.bounds {
                    None => rect,
                    Some(existing) => union(existing, rect),
                });
            }
        }
        REQ_SUBTRACT => {
            // Only the fact of subtraction is tracked; the bound stays.
            args.i32();
            args.i32();
            args.i32();
            args.i32();
            if let Some(region) = state.regions.get_mut(&msg.object_id) {
                region.subtracted = true;
            }
        }
        _ => super::unhandled(state, msg, &ProtocolObject::Region),
    }
}

fn union(a: Rect, b: Rect) -> Rect {
    let x1 = a.x.min(b.x);
    let y1 = a.y.min(b.y);
    let x2 = (a.x + a.width).max(b.x + b.width);
    let y2 = (a.y + a.height).max(b.y + b.height);
    Rect::new(x1, y1, x2 - x1, y2 - y1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_grows_the_bound() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 10, 10);
        assert_eq!(union(a, b), Rect::new(0, 0, 15, 15));
    }
}
