//! Philips Hue lamps over the bridge REST API
//!
//! Every onset flashes the lamp that has rested longest; the lamp fades out
//! again a few frames later. Requests run on a small tokio runtime so the
//! audio flow never waits on the network.

pub mod backend;
pub mod client;
pub mod controller;
pub mod error;
pub mod models;

pub use backend::{HueBackend, HueHandler};
pub use client::HueClient;
pub use controller::{HueController, HueLamps};
pub use error::HueError;
pub use models::{HueConfig, LightEffect, LightState};
