// ── Thing commands ──
//
// Typed forms of the writes a host can issue against one thing. Each
// variant lowers to a single `field = value` pair for the optimistic
// command path.

use serde_json::Value;

/// Highest brightness the server accepts.
pub const MAX_BRIGHTNESS: u8 = 254;

/// A write against one light or switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThingCommand {
    /// Switch on or off.
    SetState(bool),
    /// `0..=254`; larger values are clamped.
    Brightness(u8),
    /// Color temperature in mireds.
    ColorTemp(u64),
    /// `#rrggbb`.
    ColorRgb(String),
    Effect(String),
}

impl ThingCommand {
    /// The wire field and value this command writes.
    pub fn into_field(self) -> (&'static str, Value) {
        match self {
            Self::SetState(on) => ("state", Value::Bool(on)),
            Self::Brightness(level) => ("brightness", Value::from(level.min(MAX_BRIGHTNESS))),
            Self::ColorTemp(mireds) => ("color_temp", Value::from(mireds)),
            Self::ColorRgb(rgb) => ("color_rgb", Value::String(rgb)),
            Self::Effect(effect) => ("effect", Value::String(effect)),
        }
    }
}
