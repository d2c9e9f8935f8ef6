#![warn(clippy::pedantic)]

pub mod error;
pub mod config;
pub mod snapshot;

pub use config::ConfigEncoder;
pub use error::EncodeError;
pub use snapshot::{RawSnapshot, RawSpecies, SnapshotEncoder};
