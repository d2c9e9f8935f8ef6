use std::io::Write;

use picdump_types::grammar::{
    ENERGY_RESERVED_CHUNKS, PHASE_RESERVED_CHUNKS, TRAILING_RESERVED_CHUNKS,
};
use picdump_types::{FieldComponent, MeshQuantity, MomentumPlane, PositionMomentum, SimulationConfig};
use picdump_wire::{PayloadBuilder, write_chunk};

use crate::config::RESERVED_FILL;
use crate::error::EncodeError;

/// Per-species histograms of one timestep, as the producer writes them.
#[derive(Clone, Debug, PartialEq)]
pub struct RawSpecies {
    pub delta_momentum: f32,
    /// `pxpy`, `pypz`, `pzpx`, each `bins²` values, x fastest.
    pub momentum_planes: Vec<Vec<f32>>,
    /// `xpx` .. `ypz`. The y-based histograms are in rank order.
    pub position: Vec<Vec<f32>>,
    pub average_charge_rate: f32,
    pub average_energy: f32,
    pub delta_energy: f32,
    pub population: Vec<f32>,
    pub eimaxt: f32,
    pub loglog_population: Vec<f32>,
}

/// One timestep of flat arrays in producer order.
#[derive(Clone, Debug, PartialEq)]
pub struct RawSnapshot {
    pub time: f32,
    /// `Ex` .. `Jz`, unscaled.
    pub fields: Vec<Vec<f32>>,
    /// Four grids per species, species-major.
    pub meshes: Vec<Vec<f32>>,
    pub species: Vec<RawSpecies>,
}

impl RawSnapshot {
    /// Deterministic data shaped for `config`. Different seeds give
    /// different values.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn synthetic(config: &SimulationConfig, seed: u32) -> Self {
        let grid = config.total_output_mesh_number();
        let bins = config.momentum_bins();
        let dims = config.output_dims();
        let mut salt = 0u32;
        let mut next = |len: usize| {
            salt += 1;
            pattern(len, seed, salt)
        };

        let fields = (0..FieldComponent::ALL.len()).map(|_| next(grid)).collect();
        let meshes = (0..config.counts.total * MeshQuantity::ALL.len())
            .map(|_| next(grid))
            .collect();
        let species = (0..config.counts.total)
            .map(|s| RawSpecies {
                delta_momentum: 0.5 + s as f32,
                momentum_planes: MomentumPlane::ALL.iter().map(|_| next(bins * bins)).collect(),
                position: PositionMomentum::ALL
                    .iter()
                    .map(|k| next(dims[k.axis()] * bins))
                    .collect(),
                average_charge_rate: 1.0,
                average_energy: 2.0 + s as f32,
                delta_energy: 0.25,
                population: next(bins),
                eimaxt: 100.0,
                loglog_population: next(bins),
            })
            .collect();

        Self {
            time: seed as f32 * 0.5,
            fields,
            meshes,
            species,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn pattern(len: usize, seed: u32, salt: u32) -> Vec<f32> {
    let offset = (seed as usize) * 13 + (salt as usize) * 31;
    (0..len).map(|i| ((i * 7 + offset) % 101) as f32 * 0.25).collect()
}

/// Writes timesteps in the producer's snapshot layout.
///
/// ```text
///   time
///   Ex Ey Ez Bx By Bz Jx Jy Jz
///   [Density Energy EnergyFlux_x EnergyFlux_y] × species
///   [dp pxpy pypz pzpx xpx xpy xpz ypx ypy ypz reserved×10] × species
///   [rate energy dE population reserved×2 Eimaxt loglog reserved×2] × species
///   reserved × 12 × species
/// ```
pub struct SnapshotEncoder<W> {
    writer: W,
    grid_len: usize,
    bins: usize,
    dims: [usize; 3],
    species: usize,
    payload: PayloadBuilder,
}

impl<W: Write> SnapshotEncoder<W> {
    pub fn new(writer: W, config: &SimulationConfig) -> Self {
        Self {
            writer,
            grid_len: config.total_output_mesh_number(),
            bins: config.momentum_bins(),
            dims: config.output_dims(),
            species: config.counts.total,
            payload: PayloadBuilder::new(),
        }
    }

    /// Append one timestep.
    ///
    /// # Errors
    ///
    /// [`EncodeError::ShapeMismatch`] when an array does not match the
    /// config this encoder was built for; nothing is written in that case.
    pub fn write(&mut self, snap: &RawSnapshot) -> Result<(), EncodeError> {
        self.check(snap)?;

        self.scalar(snap.time)?;
        for grid in snap.fields.iter().chain(&snap.meshes) {
            self.floats(grid)?;
        }
        for s in &snap.species {
            self.scalar(s.delta_momentum)?;
            for h in s.momentum_planes.iter().chain(&s.position) {
                self.floats(h)?;
            }
            self.reserved(PHASE_RESERVED_CHUNKS)?;
        }
        for s in &snap.species {
            self.scalar(s.average_charge_rate)?;
            self.scalar(s.average_energy)?;
            self.scalar(s.delta_energy)?;
            self.floats(&s.population)?;
            self.reserved(ENERGY_RESERVED_CHUNKS)?;
            self.scalar(s.eimaxt)?;
            self.floats(&s.loglog_population)?;
            self.reserved(ENERGY_RESERVED_CHUNKS)?;
        }
        self.reserved(TRAILING_RESERVED_CHUNKS * self.species)?;
        Ok(())
    }

    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn check(&self, snap: &RawSnapshot) -> Result<(), EncodeError> {
        let shape = |what: &str, expected: usize, actual: usize| {
            if expected == actual {
                Ok(())
            } else {
                Err(EncodeError::ShapeMismatch {
                    what: what.to_string(),
                    expected,
                    actual,
                })
            }
        };

        shape("fields", FieldComponent::ALL.len(), snap.fields.len())?;
        shape("meshes", self.species * MeshQuantity::ALL.len(), snap.meshes.len())?;
        shape("species", self.species, snap.species.len())?;
        for g in snap.fields.iter().chain(&snap.meshes) {
            shape("grid", self.grid_len, g.len())?;
        }
        for s in &snap.species {
            shape("momentum planes", MomentumPlane::ALL.len(), s.momentum_planes.len())?;
            shape("position histograms", PositionMomentum::ALL.len(), s.position.len())?;
            for h in &s.momentum_planes {
                shape("momentum histogram", self.bins * self.bins, h.len())?;
            }
            for (kind, h) in PositionMomentum::ALL.iter().zip(&s.position) {
                shape(kind.title(), self.dims[kind.axis()] * self.bins, h.len())?;
            }
            shape("population", self.bins, s.population.len())?;
            shape("log-log population", self.bins, s.loglog_population.len())?;
        }
        Ok(())
    }

    fn scalar(&mut self, v: f32) -> Result<(), EncodeError> {
        let payload = self.payload.f32(v).finish();
        write_chunk(&mut self.writer, &payload)?;
        Ok(())
    }

    fn floats(&mut self, values: &[f32]) -> Result<(), EncodeError> {
        let payload = self.payload.f32_slice(values).finish();
        write_chunk(&mut self.writer, &payload)?;
        Ok(())
    }

    fn reserved(&mut self, count: usize) -> Result<(), EncodeError> {
        for _ in 0..count {
            write_chunk(&mut self.writer, &RESERVED_FILL)?;
        }
        Ok(())
    }
}
