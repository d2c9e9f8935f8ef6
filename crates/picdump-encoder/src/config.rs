use std::io::Write;

use picdump_types::grammar::{ELECTRON_SPECIES, HEADER, ION_SPECIES, LASER, RESERVED_BEFORE_LASER};
use picdump_types::schema::Scope;
use picdump_types::{ChunkSpec, Record, SimulationConfig};
use picdump_wire::{PayloadBuilder, write_chunk};

use crate::error::EncodeError;

/// Payload written for chunks the reader skips.
pub(crate) const RESERVED_FILL: [u8; 4] = [0; 4];

/// Writes a configuration file in the producer's chunk layout.
///
/// Driven by the same grammar tables the decoder reads, so a config
/// encoded here decodes back to an equal value.
///
/// ```rust
/// use picdump_encoder::ConfigEncoder;
/// use picdump_types::SimulationConfig;
///
/// let bytes = ConfigEncoder::encode(&SimulationConfig::sample()).unwrap();
/// assert!(!bytes.is_empty());
/// ```
pub struct ConfigEncoder;

impl ConfigEncoder {
    /// # Errors
    ///
    /// [`EncodeError::Type`] if the config cannot be expressed in the
    /// grammar (for example ionization enabled on an ion without an atom).
    pub fn encode(config: &SimulationConfig) -> Result<Vec<u8>, EncodeError> {
        let (header, species, laser) = config.to_records();
        Self::encode_records(&header, &species, &laser)
    }

    /// Encode raw records without validating them as a config.
    ///
    /// Species records are written with the ion or electron table
    /// depending on the header's `ion_number`. Useful for producing
    /// deliberately inconsistent files.
    ///
    /// # Errors
    ///
    /// [`EncodeError::Type`] when a present chunk's field is missing.
    pub fn encode_records(
        header: &Record,
        species: &[Record],
        laser: &Record,
    ) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::new();
        Self::write_records(&mut out, header, species, laser)?;
        Ok(out)
    }

    /// # Errors
    ///
    /// See [`encode_records`](Self::encode_records); also I/O errors from `w`.
    pub fn write_records<W: Write>(
        w: &mut W,
        header: &Record,
        species: &[Record],
        laser: &Record,
    ) -> Result<(), EncodeError> {
        write_table(w, HEADER, header, None)?;

        let ions = header
            .opt_i32("ion_number")?
            .map_or(0, |n| usize::try_from(n).unwrap_or(0));
        for (i, record) in species.iter().enumerate() {
            let table = if i < ions { ION_SPECIES } else { ELECTRON_SPECIES };
            write_table(w, table, record, Some(header))?;
        }

        for _ in 0..RESERVED_BEFORE_LASER {
            write_chunk(w, &RESERVED_FILL)?;
        }
        write_table(w, LASER, laser, None)?;
        Ok(())
    }
}

fn write_table<W: Write>(
    w: &mut W,
    table: &[ChunkSpec],
    record: &Record,
    outer: Option<&Record>,
) -> Result<(), EncodeError> {
    let mut payload = PayloadBuilder::new();
    for spec in table {
        if !spec.is_present(Scope::new(record, outer)) {
            continue;
        }
        spec.write(record, outer, &mut payload)?;
        write_chunk(w, &payload.finish())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use picdump_decoder::ConfigDecoder;
    use picdump_types::TypeError;
    use picdump_wire::ChunkStream;

    use super::*;

    fn chunk_count(bytes: &[u8]) -> usize {
        let mut stream = ChunkStream::new(bytes);
        let mut n = 0;
        while stream.skip_chunk().unwrap() {
            n += 1;
        }
        n
    }

    #[test]
    fn sample_layout_has_expected_chunk_count() {
        let bytes = ConfigEncoder::encode(&SimulationConfig::sample()).unwrap();
        // 20 unconditional header chunks, ion 13 + 2 density-profile
        // chunks, electron 12, reserved 1, laser 6.
        assert_eq!(chunk_count(&bytes), 20 + 15 + 12 + 1 + 6);
    }

    #[test]
    fn optional_header_chunks_are_written_when_set() {
        let mut config = SimulationConfig::sample();
        let base = chunk_count(&ConfigEncoder::encode(&config).unwrap());
        config.cluster_number = Some(2);
        config.ncol = Some(1);
        let bytes = ConfigEncoder::encode(&config).unwrap();
        assert_eq!(chunk_count(&bytes), base + 2);
    }

    #[test]
    fn ionization_without_atom_fails() {
        let mut config = SimulationConfig::sample();
        config.ionize.ion_step = Some(1);
        let err = ConfigEncoder::encode(&config).unwrap_err();
        assert!(matches!(
            err,
            EncodeError::Type(TypeError::MissingField { field: "atom" })
        ));
    }

    #[test]
    fn decoder_reads_encoder_output() {
        let config = SimulationConfig::sample();
        let bytes = ConfigEncoder::encode(&config).unwrap();
        assert_eq!(ConfigDecoder::new().decode(bytes.as_slice()).unwrap(), config);
    }
}
