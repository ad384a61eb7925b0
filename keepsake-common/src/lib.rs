//! # Keepsake Common Library
//!
//! Shared code for the Keepsake viewer service:
//! - Journey record types and the normalized view model
//! - Phase enum and transition table
//! - Event types (ViewerEvent enum)
//! - API request/response types
//! - Progress easing curves

pub mod api;
pub mod curves;
pub mod events;
pub mod journey;
pub mod phase;

pub use phase::Phase;
