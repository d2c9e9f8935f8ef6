#![warn(clippy::pedantic)]

pub mod error;
pub mod schema;
pub mod grammar;
pub mod species;
pub mod laser;
pub mod config;
pub mod grid;
pub mod reconstruct;
pub mod normalization;
pub mod dataset;

pub use config::{IonizeFlags, SimulationConfig, SpeciesCounts};
pub use dataset::{
  EnergyDistribution, FieldComponent, FieldGrid, MeshQuantity, MomentumHistogram, MomentumPlane,
  ParticleMesh, PhaseSpace, PositionHistogram, PositionMomentum, Snapshot,
};
pub use error::TypeError;
pub use grid::{Grid2D, Grid3D};
pub use laser::LaserConfig;
pub use normalization::NormalizationConstants;
pub use schema::{ChunkSpec, Count, FieldSpec, Kind, Presence, Record, Value};
pub use species::{
  ClusterLoading, DensityProfile, Ionization, ParticleSpeciesConfig, SpeciesCommon, SpeciesKind,
};
