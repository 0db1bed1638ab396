//! Typed input events at the boundary to the terminal input backend.
//!
//! The outer loop decodes raw terminal byte sequences into these and hands
//! them to connection threads, which translate them into protocol events
//! for the bound pointers and keyboards.

/// Live pointer position in virtual-monitor pixels, shared read-mostly
/// across connections. Written only by the input side.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Released,
    Pressed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerMove { x: f64, y: f64 },
    /// Linux evdev button code (BTN_LEFT = 0x110 and friends).
    PointerButton { button: u32, state: ButtonState },
    /// Vertical wheel step in wl_pointer axis units.
    PointerAxis { value: f64 },
    /// Linux evdev key code, already keymap-relative.
    Key { key: u32, state: ButtonState },
}

pub const BTN_LEFT: u32 = 0x110;
pub const BTN_RIGHT: u32 = 0x111;
pub const BTN_MIDDLE: u32 = 0x112;
