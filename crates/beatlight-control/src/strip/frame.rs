//! Colour frame wire format

use beatlight_core::Rgb;

/// `#rrggbbww` plus a terminating NUL
pub const FRAME_LEN: usize = 10;

/// One encoded strip colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorFrame([u8; FRAME_LEN]);

const HEX: &[u8; 16] = b"0123456789abcdef";

impl ColorFrame {
    /// Lowercase hex, two digits per component.
    pub fn encode(r: u8, g: u8, b: u8, w: u8) -> Self {
        let mut bytes = [0u8; FRAME_LEN];
        bytes[0] = b'#';
        for (i, component) in [r, g, b, w].into_iter().enumerate() {
            bytes[1 + 2 * i] = HEX[usize::from(component >> 4)];
            bytes[2 + 2 * i] = HEX[usize::from(component & 0x0f)];
        }
        Self(bytes)
    }

    /// White channel unused.
    pub fn rgb(color: Rgb) -> Self {
        Self::encode(color.r, color.g, color.b, 0)
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }
}
