//! # Keepsake Viewer Library (keepsake-viewer)
//!
//! Server-driven playback engine for passcode-gated proposal journeys.
//!
//! **Purpose:** Load a journey record, preload its assets, sequence the
//! narrative phases on server-side timers, and drive a thin browser client
//! over HTTP/SSE through the gate, gallery, story, reasons, and proposal.

pub mod api;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod state;
pub mod timing;

pub use error::{Error, Result};
pub use state::SessionState;
