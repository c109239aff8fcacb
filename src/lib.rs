//! Factcheck: message deduplication and topic resolution core.
//!
//! Incoming messages are grouped by a fingerprint of their text so identical
//! claims collapse into one [`types::MessageGroup`]. Admins attach groups to
//! [`types::Topic`]s and resolve topics by publishing an [`types::Answer`].
//! Each operation on [`service::Service`] is a single database transaction.
//!
//! See `DESIGN.md` for the architecture notes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod fingerprint;
pub mod logging;
pub mod repo;
pub mod service;
pub mod types;

pub use error::{Error, ErrorKind, Result};
