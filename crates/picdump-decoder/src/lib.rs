#![warn(clippy::pedantic)]

pub mod error;
pub mod config;
pub mod options;
pub mod snapshot;

pub use config::ConfigDecoder;
pub use error::DecodeError;
pub use options::DecoderOptions;
pub use snapshot::{SnapshotDecoder, SnapshotEvent};
