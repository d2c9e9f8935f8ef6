use std::path::PathBuf;

/// Errors raised while writing exported datasets.
///
/// An export failure is local to one output file. The pipeline logs it
/// and keeps decoding; none of these variants abort a run.
///
/// ```text
/// ┌────────────────┬───────────────────────────────────────────────┐
/// │ Variant        │ Cause                                         │
/// ├────────────────┼───────────────────────────────────────────────┤
/// │ Io             │ Creating or writing an output file failed     │
/// │ UnsupportedMode│ Projection name not recognised                │
/// │ Selection      │ Plot selection file is not valid JSON         │
/// │ Join           │ Export task panicked or was cancelled         │
/// └────────────────┴───────────────────────────────────────────────┘
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported projection mode {mode:?}")]
    UnsupportedMode { mode: String },

    #[error("invalid plot selection {}: {source}", path.display())]
    Selection {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("export task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ExportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
