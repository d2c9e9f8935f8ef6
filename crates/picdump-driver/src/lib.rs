#![warn(clippy::pedantic)]

pub mod error;
pub mod exporter;
pub mod pipeline;
pub mod projection;
pub mod render_text;
pub mod render_vtk;
pub mod selection;
pub mod tables;

pub use error::ExportError;
pub use exporter::{ExportJob, ExportPayload, Exporter, FileExporter, Histogram};
pub use pipeline::{Pipeline, RunSummary};
pub use projection::ProjectionMode;
pub use selection::{PlotEntry, PlotSelection};
pub use tables::EnergyScale;
