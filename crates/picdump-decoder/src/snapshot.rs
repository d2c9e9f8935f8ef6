use std::io::Read;
use std::sync::Arc;

use picdump_types::grammar::{
  ENERGY_RESERVED_CHUNKS, PHASE_RESERVED_CHUNKS, TRAILING_RESERVED_CHUNKS,
};
use picdump_types::reconstruct::{departition_y, to_2d, to_3d};
use picdump_types::{
  EnergyDistribution, FieldComponent, FieldGrid, MeshQuantity, MomentumHistogram, MomentumPlane,
  NormalizationConstants, ParticleMesh, PhaseSpace, PositionHistogram, PositionMomentum,
  SimulationConfig, Snapshot, TypeError,
};
use picdump_wire::{Chunk, ChunkStream, WireError};

use crate::error::DecodeError;
use crate::options::DecoderOptions;

/// Events emitted by the snapshot decoder, in stream order.
///
/// ```text
///   Begin { index, time }
///   Field × 9
///   ParticleMesh × 4 per species
///   PhaseSpace × species
///   EnergyDistribution × species
///   End { index }
///   Begin { index + 1, .. }
///   ...
/// ```
#[derive(Clone, Debug)]
pub enum SnapshotEvent {
  Begin { index: usize, time: f32 },
  Field(FieldGrid),
  ParticleMesh(ParticleMesh),
  PhaseSpace(Arc<PhaseSpace>),
  EnergyDistribution(Arc<EnergyDistribution>),
  End { index: usize },
}

/// Position of the decoder within a timestep.
///
/// ```text
///   AwaitTime → Fields → ParticleMeshes → PhaseSpace
///       ↑                                    ↓
///       └──── TrailingReserved ← EnergyDistribution
/// ```
///
/// End of stream is only accepted in `AwaitTime`. Any error moves the
/// decoder to `Done`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
  AwaitTime,
  Fields(usize),
  ParticleMeshes { species: usize, quantity: usize },
  PhaseSpace(usize),
  EnergyDistribution(usize),
  TrailingReserved,
  Done,
}

/// Decodes timesteps from a snapshot stream.
///
/// Each call to [`next`](Iterator::next) reads exactly the chunks of one
/// dataset, so memory use is bounded by the largest dataset rather than
/// the timestep.
///
/// # Example
///
/// ```rust,no_run
/// use std::fs::File;
/// use std::sync::Arc;
///
/// use picdump_decoder::{ConfigDecoder, SnapshotDecoder, SnapshotEvent};
///
/// let config = Arc::new(ConfigDecoder::new().decode(File::open("gfin.dat")?)?);
/// let snap = File::open("snap0001.dat")?;
/// for event in SnapshotDecoder::new(snap, config) {
///     if let SnapshotEvent::Begin { index, time } = event? {
///         println!("timestep {index} at t = {time}");
///     }
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct SnapshotDecoder<R> {
  stream: ChunkStream<R>,
  config: Arc<SimulationConfig>,
  constants: NormalizationConstants,
  state: State,
  index: usize,
  completed: usize,
  last_record: String,
}

impl<R: Read> SnapshotDecoder<R> {
  /// Decoder with default options and constants derived from `config`.
  pub fn new(reader: R, config: Arc<SimulationConfig>) -> Self {
    Self::with_options(reader, config, DecoderOptions::default())
  }

  pub fn with_options(reader: R, config: Arc<SimulationConfig>, options: DecoderOptions) -> Self {
    let constants = NormalizationConstants::from_config(&config);
    Self {
      stream: options.stream(reader),
      config,
      constants,
      state: State::AwaitTime,
      index: 0,
      completed: 0,
      last_record: String::new(),
    }
  }

  /// Number the first timestep `index`, for a run split across files.
  #[must_use]
  pub fn with_first_index(mut self, index: usize) -> Self {
    self.index = index;
    self
  }

  /// Override the normalization constants.
  #[must_use]
  pub fn with_constants(mut self, constants: NormalizationConstants) -> Self {
    self.constants = constants;
    self
  }

  #[must_use]
  pub fn config(&self) -> &Arc<SimulationConfig> {
    &self.config
  }

  #[must_use]
  pub fn constants(&self) -> NormalizationConstants {
    self.constants
  }

  /// Timesteps fully decoded so far.
  #[must_use]
  pub fn timesteps_completed(&self) -> usize {
    self.completed
  }

  /// Index the next (or current) timestep is numbered with.
  #[must_use]
  pub fn next_index(&self) -> usize {
    self.index
  }

  /// Name of the record read last, for error reports.
  #[must_use]
  pub fn last_record(&self) -> &str {
    &self.last_record
  }

  /// Byte offset into the snapshot source.
  #[must_use]
  pub fn offset(&self) -> u64 {
    self.stream.offset()
  }

  /// Decode one whole timestep.
  ///
  /// Returns `None` on a clean end of stream.
  pub fn read_snapshot(&mut self) -> Option<Result<Snapshot, DecodeError>> {
    let mut snapshot = Snapshot::default();
    loop {
      let event = match self.next()? {
        Ok(event) => event,
        Err(e) => return Some(Err(e)),
      };
      match event {
        SnapshotEvent::Begin { index, time } => {
          snapshot.index = index;
          snapshot.time = time;
        }
        SnapshotEvent::Field(f) => snapshot.fields.push(f),
        SnapshotEvent::ParticleMesh(m) => snapshot.particle_meshes.push(m),
        SnapshotEvent::PhaseSpace(p) => snapshot.phase_spaces.push(p),
        SnapshotEvent::EnergyDistribution(e) => snapshot.energy.push(e),
        SnapshotEvent::End { .. } => return Some(Ok(snapshot)),
      }
    }
  }

  fn step(&mut self) -> Result<Option<SnapshotEvent>, DecodeError> {
    let species = self.config.counts.total;
    let event = match self.state {
      State::Done => return Ok(None),
      State::AwaitTime => {
        self.last_record = "time".to_string();
        let Some(chunk) = self.stream.next_chunk()? else {
          tracing::debug!(completed = self.completed, "snapshot stream ended");
          self.state = State::Done;
          return Ok(None);
        };
        let time = scalar(&chunk, "time")?;
        tracing::info!(index = self.index, time, "timestep");
        self.state = State::Fields(0);
        SnapshotEvent::Begin {
          index: self.index,
          time,
        }
      }
      State::Fields(i) => {
        let field = self.read_field(FieldComponent::ALL[i])?;
        self.state = if i + 1 < FieldComponent::ALL.len() {
          State::Fields(i + 1)
        } else if species > 0 {
          State::ParticleMeshes {
            species: 0,
            quantity: 0,
          }
        } else {
          State::TrailingReserved
        };
        SnapshotEvent::Field(field)
      }
      State::ParticleMeshes { species: s, quantity: q } => {
        let mesh = self.read_particle_mesh(s, MeshQuantity::ALL[q])?;
        self.state = if q + 1 < MeshQuantity::ALL.len() {
          State::ParticleMeshes {
            species: s,
            quantity: q + 1,
          }
        } else if s + 1 < species {
          State::ParticleMeshes {
            species: s + 1,
            quantity: 0,
          }
        } else {
          State::PhaseSpace(0)
        };
        SnapshotEvent::ParticleMesh(mesh)
      }
      State::PhaseSpace(s) => {
        let phase = self.read_phase_space(s)?;
        self.state = if s + 1 < species {
          State::PhaseSpace(s + 1)
        } else {
          State::EnergyDistribution(0)
        };
        SnapshotEvent::PhaseSpace(Arc::new(phase))
      }
      State::EnergyDistribution(s) => {
        let energy = self.read_energy(s)?;
        self.state = if s + 1 < species {
          State::EnergyDistribution(s + 1)
        } else {
          State::TrailingReserved
        };
        SnapshotEvent::EnergyDistribution(Arc::new(energy))
      }
      State::TrailingReserved => {
        self.skip("reserved", TRAILING_RESERVED_CHUNKS * species)?;
        let index = self.index;
        self.index += 1;
        self.completed += 1;
        self.state = State::AwaitTime;
        SnapshotEvent::End { index }
      }
    };
    Ok(Some(event))
  }

  // ── Chunk helpers ─────────────────────────────────────────────────────

  fn expect_chunk(&mut self, record: String) -> Result<Chunk, DecodeError> {
    self.last_record = record;
    match self.stream.next_chunk()? {
      Some(chunk) => Ok(chunk),
      None => Err(DecodeError::UnexpectedEnd {
        record: self.last_record.clone(),
      }),
    }
  }

  fn read_scalar(&mut self, record: String) -> Result<f32, DecodeError> {
    let chunk = self.expect_chunk(record)?;
    scalar(&chunk, &self.last_record)
  }

  /// A chunk of exactly `count` f32 values.
  fn read_floats(&mut self, record: String, count: usize) -> Result<Vec<f32>, DecodeError> {
    let chunk = self.expect_chunk(record)?;
    let expected = count.saturating_mul(4);
    if chunk.len() != expected {
      return Err(DecodeError::desync(
        self.last_record.clone(),
        TypeError::LengthMismatch {
          field: "payload bytes",
          expected,
          actual: chunk.len(),
        },
      ));
    }
    chunk
      .cursor()
      .f32_vec(count)
      .map_err(|e| DecodeError::desync(self.last_record.clone(), e.into()))
  }

  fn skip(&mut self, record: &str, count: usize) -> Result<(), DecodeError> {
    for i in 0..count {
      if !self.stream.skip_chunk()? {
        return Err(DecodeError::UnexpectedEnd {
          record: format!("{record} chunk {} of {count}", i + 1),
        });
      }
    }
    if count > 0 {
      self.last_record = record.to_string();
    }
    Ok(())
  }

  fn desync(&self, source: TypeError) -> DecodeError {
    DecodeError::desync(self.last_record.clone(), source)
  }

  // ── Datasets ──────────────────────────────────────────────────────────

  fn read_grid(&mut self, record: String, scale: f32) -> Result<Arc<picdump_types::Grid3D>, DecodeError> {
    let [nx, ny, nz] = self.config.output_dims();
    let flat = self.read_floats(record, self.config.total_output_mesh_number())?;
    let grid = to_3d(&flat, nx, ny, nz, scale).map_err(|e| self.desync(e))?;
    Ok(Arc::new(grid))
  }

  fn read_field(&mut self, component: FieldComponent) -> Result<FieldGrid, DecodeError> {
    let grid = self.read_grid(component.name().to_string(), component.scale(&self.constants))?;
    tracing::debug!(field = component.name(), "field grid");
    Ok(FieldGrid { component, grid })
  }

  fn read_particle_mesh(&mut self, species: usize, quantity: MeshQuantity) -> Result<ParticleMesh, DecodeError> {
    let kind = self.config.counts.kind_of(species);
    let record = format!("{}_{} species {}", kind.prefix(), quantity.suffix(), species + 1);
    let grid = self.read_grid(record, 1.0)?;
    Ok(ParticleMesh {
      species,
      kind,
      quantity,
      grid,
    })
  }

  fn read_phase_space(&mut self, species: usize) -> Result<PhaseSpace, DecodeError> {
    let config = Arc::clone(&self.config);
    let bins = config.momentum_bins();
    let dims = config.output_dims();
    let n = species + 1;

    let delta_momentum = self.read_scalar(format!("delta_momentum species {n}"))?;
    let mass = config.species[species].common().particle_mass;
    let momentum = PhaseSpace::momentum_axis(bins, delta_momentum, mass, config.velocity_light);

    let mut momentum_planes = Vec::with_capacity(MomentumPlane::ALL.len());
    for plane in MomentumPlane::ALL {
      let flat = self.read_floats(format!("{} species {n}", plane.title()), bins.saturating_mul(bins))?;
      let grid = to_2d(&flat, bins, bins).map_err(|e| self.desync(e))?;
      momentum_planes.push(MomentumHistogram { plane, grid });
    }

    let mut position = Vec::with_capacity(PositionMomentum::ALL.len());
    for kind in PositionMomentum::ALL {
      let cells = dims[kind.axis()];
      let flat = self.read_floats(format!("{} species {n}", kind.title()), cells.saturating_mul(bins))?;
      let grid = if kind.axis() == 1 {
        departition_y(&flat, cells, config.ranks(), bins)
      } else {
        to_2d(&flat, cells, bins)
      }
      .map_err(|e| self.desync(e))?;
      position.push(PositionHistogram { kind, grid });
    }

    self.skip(&format!("velocity histograms species {n}"), PHASE_RESERVED_CHUNKS)?;
    tracing::debug!(species = n, delta_momentum, "phase space");

    Ok(PhaseSpace {
      species,
      kind: config.counts.kind_of(species),
      delta_momentum,
      momentum,
      momentum_planes,
      position,
    })
  }

  fn read_energy(&mut self, species: usize) -> Result<EnergyDistribution, DecodeError> {
    let bins = self.config.momentum_bins();
    let n = species + 1;

    let average_charge_rate = self.read_scalar(format!("average_charge_rate species {n}"))?;
    let average_energy = self.read_scalar(format!("average_energy species {n}"))?;
    let delta_energy = self.read_scalar(format!("delta_energy species {n}"))?;
    let population = self.read_floats(format!("energy population species {n}"), bins)?;
    self.skip(&format!("energy reserved species {n}"), ENERGY_RESERVED_CHUNKS)?;

    let eimaxt = self.read_scalar(format!("eimaxt species {n}"))?;
    let loglog_population = self.read_floats(format!("log-log population species {n}"), bins)?;
    self.skip(&format!("log-log reserved species {n}"), ENERGY_RESERVED_CHUNKS)?;
    tracing::debug!(species = n, average_energy, "energy distribution");

    Ok(EnergyDistribution {
      species,
      kind: self.config.counts.kind_of(species),
      average_charge_rate,
      average_energy,
      delta_energy,
      population,
      eimaxt,
      loglog_population,
    })
  }
}

impl<R: Read> Iterator for SnapshotDecoder<R> {
  type Item = Result<SnapshotEvent, DecodeError>;

  /// Next dataset, `None` once the stream ended at a timestep boundary or
  /// after an error was returned.
  fn next(&mut self) -> Option<Self::Item> {
    match self.step() {
      Ok(event) => event.map(Ok),
      Err(e) => {
        tracing::debug!(record = %self.last_record, error = %e, "snapshot decode failed");
        self.state = State::Done;
        Some(Err(e))
      }
    }
  }
}

fn scalar(chunk: &Chunk, record: &str) -> Result<f32, DecodeError> {
  chunk
    .cursor()
    .f32()
    .map_err(|e: WireError| DecodeError::desync(record, e.into()))
}

#[cfg(test)]
mod tests {
  use picdump_encoder::{RawSnapshot, SnapshotEncoder};
  use picdump_types::SpeciesKind;

  use super::*;

  fn config() -> Arc<SimulationConfig> {
    Arc::new(SimulationConfig::sample())
  }

  fn encode(config: &SimulationConfig, snapshots: &[RawSnapshot]) -> Vec<u8> {
    let mut enc = SnapshotEncoder::new(Vec::new(), config);
    for snap in snapshots {
      enc.write(snap).unwrap();
    }
    enc.into_inner()
  }

  #[test]
  fn empty_stream_has_no_timesteps() {
    let mut dec = SnapshotDecoder::new(&[][..], config());
    assert!(dec.next().is_none());
    assert_eq!(dec.timesteps_completed(), 0);
  }

  #[test]
  fn events_follow_stream_order() {
    let config = config();
    let raw = RawSnapshot::synthetic(&config, 1);
    let bytes = encode(&config, &[raw]);

    let events: Vec<_> = SnapshotDecoder::new(bytes.as_slice(), Arc::clone(&config))
      .collect::<Result<_, _>>()
      .unwrap();

    // Begin, 9 fields, 2 × 4 meshes, 2 phase, 2 energy, End
    assert_eq!(events.len(), 1 + 9 + 8 + 2 + 2 + 1);
    assert!(matches!(events[0], SnapshotEvent::Begin { index: 0, .. }));
    assert!(matches!(&events[9], SnapshotEvent::Field(f) if f.component == FieldComponent::Jz));
    assert!(matches!(
      &events[14],
      SnapshotEvent::ParticleMesh(m) if m.kind == SpeciesKind::Electron && m.quantity == MeshQuantity::Density
    ));
    assert!(matches!(events.last(), Some(SnapshotEvent::End { index: 0 })));
  }

  #[test]
  fn two_timesteps_then_clean_end() {
    let config = config();
    let bytes = encode(
      &config,
      &[RawSnapshot::synthetic(&config, 1), RawSnapshot::synthetic(&config, 2)],
    );
    let mut dec = SnapshotDecoder::new(bytes.as_slice(), config).with_first_index(5);

    let first = dec.read_snapshot().unwrap().unwrap();
    let second = dec.read_snapshot().unwrap().unwrap();
    assert_eq!((first.index, second.index), (5, 6));
    assert!(dec.read_snapshot().is_none());
    assert_eq!(dec.timesteps_completed(), 2);
  }

  #[test]
  fn fields_are_scaled_and_reordered() {
    let config = config();
    let raw = RawSnapshot::synthetic(&config, 3);
    let bytes = encode(&config, std::slice::from_ref(&raw));
    let k = NormalizationConstants::from_config(&config);

    let mut dec = SnapshotDecoder::new(bytes.as_slice(), Arc::clone(&config));
    let snap = dec.read_snapshot().unwrap().unwrap();
    let [nx, ny, nz] = config.output_dims();

    let ex = snap.field(FieldComponent::Ex).unwrap();
    let bz = snap.field(FieldComponent::Bz).unwrap();
    let jy = snap.field(FieldComponent::Jy).unwrap();
    // flat index (y * nz + z) * nx + x
    let (x, y, z) = (3, 2, 1);
    let i = (y * nz + z) * nx + x;
    assert_eq!(ex.grid.get(x, y, z), raw.fields[0][i] * k.electric);
    assert_eq!(bz.grid.get(x, y, z), raw.fields[5][i] * k.magnetic);
    assert_eq!(jy.grid.get(x, y, z), raw.fields[7][i]);
    assert_eq!(ex.grid.dims(), [nx, ny, nz]);
  }

  #[test]
  fn y_histograms_are_departitioned() {
    let config = config();
    let raw = RawSnapshot::synthetic(&config, 4);
    let bytes = encode(&config, std::slice::from_ref(&raw));
    let snap = SnapshotDecoder::new(bytes.as_slice(), Arc::clone(&config))
      .read_snapshot()
      .unwrap()
      .unwrap();

    let bins = config.momentum_bins();
    let ny = config.output_dims()[1];
    let phase = &snap.phase_spaces[0];
    let ypx = &phase.position[3];
    assert_eq!(ypx.kind, PositionMomentum::Ypx);
    let expected = departition_y(&raw.species[0].position[3], ny, config.ranks(), bins).unwrap();
    assert_eq!(ypx.grid, expected);
    assert_eq!(phase.momentum.len(), bins);
  }

  #[test]
  fn eof_inside_timestep_is_unexpected_end() {
    let config = config();
    let bytes = encode(&config, &[RawSnapshot::synthetic(&config, 1)]);
    // Cut right after the time chunk and the first field.
    let field_chunk = 8 + config.total_output_mesh_number() * 4;
    let cut = &bytes[..8 + 4 + field_chunk];

    let mut dec = SnapshotDecoder::new(cut, config);
    let results: Vec<_> = dec.by_ref().collect();
    assert_eq!(results.len(), 3);
    assert!(matches!(
      results.last(),
      Some(Err(DecodeError::UnexpectedEnd { record })) if record == "Ey"
    ));
    assert!(dec.next().is_none());
    assert_eq!(dec.timesteps_completed(), 0);
  }

  #[test]
  fn eof_in_payload_is_truncation() {
    let config = config();
    let bytes = encode(&config, &[RawSnapshot::synthetic(&config, 1)]);
    let cut = &bytes[..8 + 4 + 4 + 1];
    let err = SnapshotDecoder::new(cut, config)
      .find_map(Result::err)
      .unwrap();
    assert!(err.is_truncation());
  }

  #[test]
  fn wrong_grid_size_is_desync() {
    let config = config();
    let bytes = encode(&config, &[RawSnapshot::synthetic(&config, 1)]);

    let mut bigger = SimulationConfig::sample();
    bigger.output_mesh_number = [4, 4, 4];
    let err = SnapshotDecoder::new(bytes.as_slice(), Arc::new(bigger))
      .find_map(Result::err)
      .unwrap();
    assert!(matches!(
      err,
      DecodeError::SchemaDesync { ref record, source: TypeError::LengthMismatch { expected: 256, actual: 128, .. } }
        if record == "Ex"
    ));
  }
}
