#![warn(clippy::pedantic)]

pub mod chunk;
pub mod error;
pub mod payload;

pub use chunk::{Chunk, ChunkStream, TrailerCheck, write_chunk};
pub use error::WireError;
pub use payload::{PayloadBuilder, PayloadCursor};
