//! Translating typed input events into protocol events for the bound
//! pointers and keyboards of this connection.

use crate::core::globals::{GLOBAL_KEYBOARD, GLOBAL_POINTER};
use crate::core::input::{ButtonState, InputEvent};
use crate::core::objects::ObjectId;
use crate::core::state::ClientState;
use crate::core::wire::{ArgWriter, OutgoingEvent};
use crate::util::logging::INPUT;
use crate::wlog;

// wl_pointer events
const POINTER_ENTER: u16 = 0;
const POINTER_MOTION: u16 = 2;
const POINTER_BUTTON: u16 = 3;
const POINTER_AXIS: u16 = 4;
const POINTER_FRAME: u16 = 5;
// wl_keyboard events
const KEYBOARD_ENTER: u16 = 1;
const KEYBOARD_KEY: u16 = 3;

const AXIS_VERTICAL: u32 = 0;
const STATE_RELEASED: u32 = 0;
const STATE_PRESSED: u32 = 1;

/// `frame` exists from wl_pointer version 5.
const POINTER_FRAME_SINCE: u32 = 5;

impl ClientState {
    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerMove { x, y } => self.pointer_moved(x, y),
            InputEvent::PointerButton { button, state } => self.pointer_button(button, state),
            InputEvent::PointerAxis { value } => self.pointer_axis(value),
            InputEvent::Key { key, state } => self.key(key, state),
        }
    }

    fn pointer_moved(&mut self, x: f64, y: f64) {
        if let Ok(mut position) = self.pointer.write() {
            position.x = x;
            position.y = y;
        }
        let time = self.time_ms();
        for (pointer, version) in self.bound_pointers() {
            self.send(OutgoingEvent::new(
                pointer,
                POINTER_MOTION,
                ArgWriter::new().u32(time).fixed(x).fixed(y).build(),
            ));
            self.pointer_frame(pointer, version);
        }
    }

    /// Button press/release delivery.
    ///
    /// Matching rule carried over from long-observed behavior: a press of a
    /// new button while another is logically held releases the held button
    /// first, but only when the two differ.
    fn pointer_button(&mut self, button: u32, state: ButtonState) {
        if state == ButtonState::Pressed {
            if let Some(held) = self.held_button {
                if held != button {
                    self.emit_button(held, STATE_RELEASED);
                }
            }
            self.held_button = Some(button);
            self.emit_button(button, STATE_PRESSED);
        } else {
            if self.held_button == Some(button) {
                self.held_button = None;
            }
            self.emit_button(button, STATE_RELEASED);
        }
    }

    fn emit_button(&mut self, button: u32, state: u32) {
        let serial = self.next_serial();
        let time = self.time_ms();
        for (pointer, version) in self.bound_pointers() {
            self.send(OutgoingEvent::new(
                pointer,
                POINTER_BUTTON,
                ArgWriter::new()
                    .u32(serial)
                    .u32(time)
                    .u32(button)
                    .u32(state)
                    .build(),
            ));
            self.pointer_frame(pointer, version);
        }
    }

    fn pointer_axis(&mut self, value: f64) {
        let time = self.time_ms();
        for (pointer, version) in self.bound_pointers() {
            self.send(OutgoingEvent::new(
                pointer,
                POINTER_AXIS,
                ArgWriter::new()
                    .u32(time)
                    .u32(AXIS_VERTICAL)
                    .fixed(value)
                    .build(),
            ));
            self.pointer_frame(pointer, version);
        }
    }

    fn key(&mut self, key: u32, state: ButtonState) {
        let serial = self.next_serial();
        let time = self.time_ms();
        let wire_state = match state {
            ButtonState::Pressed => STATE_PRESSED,
            ButtonState::Released => STATE_RELEASED,
        };
        let keyboards: Vec<ObjectId> = self.binds.bound(GLOBAL_KEYBOARD).map(|(id, _)| id).collect();
        if keyboards.is_empty() {
            wlog!(INPUT, "key {} with no bound keyboard", key);
        }
        for keyboard in keyboards {
            self.send(OutgoingEvent::new(
                keyboard,
                KEYBOARD_KEY,
                ArgWriter::new()
                    .u32(serial)
                    .u32(time)
                    .u32(key)
                    .u32(wire_state)
                    .build(),
            ));
        }
    }

    /// Pointer enter + frame for every bound pointer, at the live pointer
    /// position. Used when a window comes up and for the delayed re-enter.
    pub fn send_pointer_enter(&mut self, surface: ObjectId) {
        let (x, y) = self
            .pointer
            .read()
            .map(|p| (p.x, p.y))
            .unwrap_or_default();
        let serial = self.next_serial();
        for (pointer, version) in self.bound_pointers() {
            self.send(OutgoingEvent::new(
                pointer,
                POINTER_ENTER,
                ArgWriter::new()
                    .u32(serial)
                    .id(surface)
                    .fixed(x)
                    .fixed(y)
                    .build(),
            ));
            self.pointer_frame(pointer, version);
        }
    }

    /// Keyboard enter with an empty pressed-keys array.
    pub fn send_keyboard_enter(&mut self, surface: ObjectId) {
        let serial = self.next_serial();
        let keyboards: Vec<ObjectId> = self.binds.bound(GLOBAL_KEYBOARD).map(|(id, _)| id).collect();
        for keyboard in keyboards {
            self.send(OutgoingEvent::new(
                keyboard,
                KEYBOARD_ENTER,
                ArgWriter::new()
                    .u32(serial)
                    .id(surface)
                    .array(&[])
                    .build(),
            ));
        }
    }

    fn bound_pointers(&self) -> Vec<(ObjectId, u32)> {
        self.binds.bound(GLOBAL_POINTER).collect()
    }

    fn pointer_frame(&self, pointer: ObjectId, version: u32) {
        if version >= POINTER_FRAME_SINCE {
            self.send(OutgoingEvent::new(pointer, POINTER_FRAME, Vec::new()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::BTN_LEFT;
    use crate::core::state::test_support::new_state_with_events;

    #[test]
    fn new_button_releases_a_different_held_one() {
        let (mut state, events) = new_state_with_events();
        state.binds.bind(GLOBAL_POINTER, ObjectId::new(8), 7);

        state.pointer_button(BTN_LEFT, ButtonState::Pressed);
        state.pointer_button(BTN_LEFT + 1, ButtonState::Pressed);

        let buttons: Vec<(u32, u32)> = events
            .try_iter()
            .filter(|e| e.opcode == POINTER_BUTTON)
            .map(|e| {
                let mut r = crate::core::wire::ArgReader::new(&e.data);
                r.u32(); // serial
                r.u32(); // time
                (r.u32(), r.u32())
            })
            .collect();
        assert_eq!(
            buttons,
            vec![
                (BTN_LEFT, STATE_PRESSED),
                (BTN_LEFT, STATE_RELEASED),
                (BTN_LEFT + 1, STATE_PRESSED),
            ]
        );
    }

    #[test]
    fn repeated_press_of_same_button_does_not_self_release() {
        let (mut state, events) = new_state_with_events();
        state.binds.bind(GLOBAL_POINTER, ObjectId::new(8), 7);

        state.pointer_button(BTN_LEFT, ButtonState::Pressed);
        state.pointer_button(BTN_LEFT, ButtonState::Pressed);

        let states: Vec<u32> = events
            .try_iter()
            .filter(|e| e.opcode == POINTER_BUTTON)
            .map(|e| {
                let mut r = crate::core::wire::ArgReader::new(&e.data);
                r.u32();
                r.u32();
                r.u32();
                r.u32()
            })
            .collect();
        assert_eq!(states, vec![STATE_PRESSED, STATE_PRESSED]);
    }

    #[test]
    fn motion_updates_shared_position_and_emits_frames_for_v5() {
        let (mut state, events) = new_state_with_events();
        state.binds.bind(GLOBAL_POINTER, ObjectId::new(8), 5);

        state.handle_input(InputEvent::PointerMove { x: 10.0, y: 20.0 });

        let position = *state.pointer.read().unwrap();
        assert_eq!((position.x, position.y), (10.0, 20.0));
        let opcodes: Vec<u16> = events.try_iter().map(|e| e.opcode).collect();
        assert_eq!(opcodes, vec![POINTER_MOTION, POINTER_FRAME]);
    }

    #[test]
    fn old_pointers_get_no_frame_events() {
        let (mut state, events) = new_state_with_events();
        state.binds.bind(GLOBAL_POINTER, ObjectId::new(8), 4);

        state.handle_input(InputEvent::PointerAxis { value: 1.5 });

        let opcodes: Vec<u16> = events.try_iter().map(|e| e.opcode).collect();
        assert_eq!(opcodes, vec![POINTER_AXIS]);
    }
}
