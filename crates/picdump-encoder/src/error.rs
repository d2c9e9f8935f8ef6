use picdump_types::TypeError;
use picdump_wire::WireError;

/// Errors that can occur while writing a config or snapshot stream.
///
/// ```text
///   EncodeError
///   ├── Type(TypeError)      ← record does not fit the grammar
///   ├── Wire(WireError)      ← from chunk framing
///   ├── Io(std::io::Error)   ← from the underlying writer
///   └── ShapeMismatch        ← snapshot array sized against another config
/// ```
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{what}: expected {expected} values, got {actual}")]
    ShapeMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },
}
