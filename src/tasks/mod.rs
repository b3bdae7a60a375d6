//! Background tasks module
//!
//! This module contains the tasks that run alongside the HTTP server.

pub mod countdown;

pub use countdown::spawn_countdown;
