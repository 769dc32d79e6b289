//! Drawing tool settings: stroke width, color, and alpha.
//!
//! These are process-local UI values. The builder copies them into a new
//! provisional stroke when drawing starts; later changes never reach a stroke
//! that is already in progress.

#[cfg(test)]
#[path = "tools_test.rs"]
mod tools_test;

pub const DEFAULT_STROKE_WIDTH: u32 = 20;
pub const MIN_STROKE_WIDTH: u32 = 1;
pub const MAX_STROKE_WIDTH: u32 = 50;
pub const DEFAULT_CHANNEL: u8 = 128;
pub const DEFAULT_ALPHA: f64 = 0.7;

/// An RGB triple decoded from a hex color string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    /// Format as lowercase `#rrggbb`, zero-padded per channel.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

/// Parse `#RGB` or `#RRGGBB` into channels. Case-insensitive.
#[must_use]
pub fn parse_hex_color(raw: &str) -> Option<Rgb> {
    let hex = raw.trim().strip_prefix('#')?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => Some(Rgb {
            red: hex_channel(&hex[0..1].repeat(2))?,
            green: hex_channel(&hex[1..2].repeat(2))?,
            blue: hex_channel(&hex[2..3].repeat(2))?,
        }),
        6 => Some(Rgb {
            red: hex_channel(&hex[0..2])?,
            green: hex_channel(&hex[2..4])?,
            blue: hex_channel(&hex[4..6])?,
        }),
        _ => None,
    }
}

fn hex_channel(digits: &str) -> Option<u8> {
    match u8::from_str_radix(digits, 16) {
        Ok(value) => Some(value),
        Err(_) => None,
    }
}

/// Current tool state for the local participant.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolSettings {
    pub stroke_width: u32,
    pub color: Rgb,
    pub alpha: f64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            stroke_width: DEFAULT_STROKE_WIDTH,
            color: Rgb { red: DEFAULT_CHANNEL, green: DEFAULT_CHANNEL, blue: DEFAULT_CHANNEL },
            alpha: DEFAULT_ALPHA,
        }
    }
}

impl ToolSettings {
    /// Set the stroke width, clamped to the slider range.
    pub fn set_stroke_width(&mut self, width: u32) {
        self.stroke_width = width.clamp(MIN_STROKE_WIDTH, MAX_STROKE_WIDTH);
    }

    /// Apply a color-picker update: a hex color plus alpha as a percentage.
    ///
    /// Returns `false` and leaves the settings untouched when the color does
    /// not parse.
    pub fn apply_color_change(&mut self, color: &str, alpha_percent: f64) -> bool {
        let Some(rgb) = parse_hex_color(color) else {
            tracing::debug!(color, "ignoring unparseable color");
            return false;
        };
        self.color = rgb;
        self.alpha = if alpha_percent.is_finite() {
            (alpha_percent / 100.0).clamp(0.0, 1.0)
        } else {
            DEFAULT_ALPHA
        };
        true
    }

    /// Color as `#rrggbb` for handing back to the picker.
    #[must_use]
    pub fn color_hex(&self) -> String {
        self.color.to_hex()
    }
}
