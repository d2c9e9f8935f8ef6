use std::io::Read;

use picdump_types::grammar::{ELECTRON_SPECIES, HEADER, ION_SPECIES, LASER, RESERVED_BEFORE_LASER};
use picdump_types::{ChunkSpec, Record, SimulationConfig, SpeciesCounts, SpeciesKind, TypeError};
use picdump_types::schema::Scope;
use picdump_wire::ChunkStream;

use crate::error::DecodeError;
use crate::options::DecoderOptions;

/// Decodes the one-time configuration file.
///
/// The file has no self-description: chunk boundaries and optional
/// records follow from values decoded earlier, so the decoder walks the
/// grammar tables in [`picdump_types::grammar`] in the producer's write
/// order:
///
/// ```text
///   HEADER → ION_SPECIES × ions → ELECTRON_SPECIES × electrons
///          → reserved → LASER
/// ```
///
/// All schema invariants are checked once the records are complete, in
/// [`SimulationConfig::from_records`]. The species counts are checked
/// early, since they size the species list.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConfigDecoder {
  options: DecoderOptions,
}

impl ConfigDecoder {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  #[must_use]
  pub fn with_options(options: DecoderOptions) -> Self {
    Self { options }
  }

  /// Decode a configuration from `reader`.
  ///
  /// # Errors
  ///
  /// [`DecodeError::Wire`] for I/O and framing failures,
  /// [`DecodeError::UnexpectedEnd`] when the file stops before the laser
  /// record, [`DecodeError::SchemaDesync`] when values violate the schema.
  pub fn decode<R: Read>(&self, reader: R) -> Result<SimulationConfig, DecodeError> {
    let mut stream = self.options.stream(reader);
    Self::decode_stream(&mut stream)
  }

  /// Decode from an existing chunk stream, leaving it positioned after the
  /// laser record.
  ///
  /// # Errors
  ///
  /// See [`decode`](Self::decode).
  pub fn decode_stream<R: Read>(stream: &mut ChunkStream<R>) -> Result<SimulationConfig, DecodeError> {
    let mut header = Record::new();
    read_table(stream, HEADER, &mut header, None, "header", check_header_chunk)?;
    let counts =
      SpeciesCounts::from_record(&header).map_err(|e| DecodeError::desync("header", e))?;

    let mut species = Vec::new();
    for index in 0..counts.total {
      let (table, label) = match counts.kind_of(index) {
        SpeciesKind::Ion => (ION_SPECIES, format!("ion species {}", index + 1)),
        SpeciesKind::Electron => (ELECTRON_SPECIES, format!("electron species {}", index + 1)),
      };
      let mut record = Record::new();
      read_table(stream, table, &mut record, Some(&header), &label, |_, _| Ok(()))?;
      species.push(record);
    }

    for _ in 0..RESERVED_BEFORE_LASER {
      if !stream.skip_chunk()? {
        return Err(DecodeError::UnexpectedEnd {
          record: "reserved".to_string(),
        });
      }
    }

    let mut laser = Record::new();
    read_table(stream, LASER, &mut laser, None, "laser", |_, _| Ok(()))?;

    let config = SimulationConfig::from_records(&header, &species, &laser)
      .map_err(|e| DecodeError::desync("config", e))?;

    tracing::info!(
      version = %config.version,
      species = config.counts.total,
      ions = config.counts.ions,
      output_mesh = ?config.output_mesh_number,
      momentum_mesh = config.momentum_mesh_number,
      chunks = stream.chunks_read(),
      "decoded simulation config"
    );
    Ok(config)
  }
}

/// Species counts size the `load_type` array in the next chunk, so they
/// are checked as soon as they are read.
fn check_header_chunk(header: &Record, label: &str) -> Result<(), TypeError> {
  if label == "total_species" {
    SpeciesCounts::from_record(header)?;
  }
  Ok(())
}

/// Walk one grammar table, reading each present chunk into `record` and
/// passing it to `check` once read.
fn read_table<R: Read>(
  stream: &mut ChunkStream<R>,
  table: &[ChunkSpec],
  record: &mut Record,
  outer: Option<&Record>,
  context: &str,
  check: impl Fn(&Record, &str) -> Result<(), TypeError>,
) -> Result<(), DecodeError> {
  for spec in table {
    if !spec.is_present(Scope::new(record, outer)) {
      continue;
    }
    let label = spec.label();
    let Some(chunk) = stream.next_chunk()? else {
      return Err(DecodeError::UnexpectedEnd {
        record: format!("{context} / {label}"),
      });
    };

    let mut cursor = chunk.cursor();
    spec
      .read(&mut cursor, record, outer)
      .and_then(|()| check(record, label))
      .map_err(|e| DecodeError::desync(format!("{context} / {label}"), e))?;

    if cursor.remaining() > 0 {
      tracing::debug!(
        offset = chunk.offset,
        record = label,
        extra = cursor.remaining(),
        "config chunk has trailing bytes"
      );
    } else {
      tracing::debug!(offset = chunk.offset, record = label, "config chunk");
    }
  }
  Ok(())
}
