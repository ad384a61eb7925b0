//! Database access for the viewer service

pub mod init;
pub mod journeys;
pub mod settings;
