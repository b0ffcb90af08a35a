//! LED strip over a byte stream
//!
//! The strip controller takes ASCII colour frames (`#rrggbbww` plus NUL).
//! Onsets fire the red, green and blue channels in turn; a render loop
//! fades them and falls back to an idle sweep when playback stops.

pub mod backend;
pub mod frame;
pub mod link;
pub mod models;
pub mod render;

pub use backend::{StripBackend, StripHandler};
pub use frame::{ColorFrame, FRAME_LEN};
pub use link::StripLink;
pub use models::{StripConfig, StripTransport};
pub use render::StripRenderer;
