use picdump_wire::WireError;

use crate::schema::Kind;

/// Errors raised while interpreting decoded values as typed records.
///
/// Every variant here means the bytes on disk do not fit the schema this
/// build expects. The decoder reports all of them as a schema desync: the
/// stream was most likely written by a producer with a different layout,
/// and reading on would only misalign every later record.
///
/// ```text
/// ┌─────────────────────────────────────────────────────────┐
/// │ TypeError                                               │
/// │   ├── MissingField / FieldKind    record lookups        │
/// │   ├── InvalidDimension            counts and mesh sizes │
/// │   ├── SpeciesCount                ion/electron split    │
/// │   ├── LengthMismatch              arrays vs config      │
/// │   ├── UnknownLoadType             species discriminant  │
/// │   ├── UnknownDensityProfile       "x" / "y" profile tag │
/// │   ├── IndivisiblePartition        y-axis decomposition  │
/// │   └── Wire(WireError)             short payloads        │
/// └─────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, thiserror::Error)]
pub enum TypeError {
    #[error("missing field: {field}")]
    MissingField { field: &'static str },

    #[error("field {field} is not {expected:?}")]
    FieldKind { field: &'static str, expected: Kind },

    /// A size, count or mesh dimension that must be positive was not.
    #[error("invalid {field}: {value}")]
    InvalidDimension { field: &'static str, value: i64 },

    #[error(
        "species counts disagree: total {total}, ions {ions}, electrons {electrons}"
    )]
    SpeciesCount { total: i32, ions: i32, electrons: i32 },

    #[error("{field}: expected {expected} values, found {actual}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("species {species}: unknown load type {value}")]
    UnknownLoadType { species: usize, value: i32 },

    #[error("species {species}: unknown density profile {code:?}")]
    UnknownDensityProfile { species: usize, code: String },

    #[error("{ny} y-cells cannot be split across {parallel_number} ranks")]
    IndivisiblePartition { ny: usize, parallel_number: usize },

    #[error(transparent)]
    Wire(#[from] WireError),
}
