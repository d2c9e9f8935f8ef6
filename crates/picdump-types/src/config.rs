use crate::error::TypeError;
use crate::laser::LaserConfig;
use crate::schema::Record;
use crate::species::{DensityProfile, ParticleSpeciesConfig, SpeciesCommon, SpeciesKind};

/// Species split declared by the header.
///
/// Decoded ahead of the rest of the configuration: the counts decide how
/// many species records follow the header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpeciesCounts {
    pub total: usize,
    pub ions: usize,
}

impl SpeciesCounts {
    /// # Errors
    ///
    /// [`TypeError::SpeciesCount`] when the three counts disagree or any is
    /// negative.
    pub fn from_record(header: &Record) -> Result<Self, TypeError> {
        let total = header.i32("total_species")?;
        let ions = header.i32("ion_number")?;
        let electrons = header.i32("electron_number")?;
        let err = || TypeError::SpeciesCount { total, ions, electrons };

        if total < 0 || ions < 0 || electrons < 0 || ions.checked_add(electrons) != Some(total) {
            return Err(err());
        }
        Ok(Self {
            total: usize::try_from(total).map_err(|_| err())?,
            ions: usize::try_from(ions).map_err(|_| err())?,
        })
    }

    #[must_use]
    pub fn electrons(&self) -> usize {
        self.total - self.ions
    }

    /// Kind of the species at `index` in the species list.
    #[must_use]
    pub fn kind_of(&self, index: usize) -> SpeciesKind {
        if index < self.ions { SpeciesKind::Ion } else { SpeciesKind::Electron }
    }
}

/// Ionization switches of the header.
///
/// `ion_step` is present exactly when ionization is enabled.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IonizeFlags {
    pub ion_step: Option<i32>,
    pub used_field_ionize: bool,
    pub used_collisional_ionize: bool,
}

impl IonizeFlags {
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.ion_step.is_some()
    }
}

/// The decoded configuration file.
///
/// Immutable once built; the decoder shares it behind an `Arc` with the
/// snapshot decoder and the exporters.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    pub version: String,
    pub parallel_number: i32,
    pub dimension: i32,
    pub velocity_light: f64,
    pub delt_time: f64,
    pub delt_x: [f64; 3],
    pub system_l: [f64; 3],
    pub average_density: f64,
    pub mesh_number: [i32; 3],
    pub field_boundary_condition: i32,
    pub total_particle_number: i32,
    pub counts: SpeciesCounts,
    pub load_type: Vec<i32>,
    pub cluster_number: Option<i32>,
    pub ncol: Option<i32>,
    pub ionize: IonizeFlags,
    pub ll_dumping_option: bool,
    pub used_local_solver: bool,
    pub real_lx: f64,
    pub int_snap: i32,
    pub output_mesh_number: [i32; 3],
    pub momentum_mesh_number: i32,
    pub space_mesh_number_for_momentum: [i32; 2],
    pub species: Vec<ParticleSpeciesConfig>,
    pub laser: LaserConfig,
}

impl SimulationConfig {
    /// Assemble and validate a configuration from decoded records.
    ///
    /// This is where every schema invariant is checked: a failure here
    /// means the stream does not follow the layout this build reads.
    ///
    /// # Errors
    ///
    /// Any [`TypeError`]; see the variant docs.
    pub fn from_records(
        header: &Record,
        species: &[Record],
        laser: &Record,
    ) -> Result<Self, TypeError> {
        let counts = SpeciesCounts::from_record(header)?;
        let parallel_number = positive(header, "parallel_number")?;
        let dimension = positive(header, "dimension")?;
        let momentum_mesh_number = positive(header, "momentum_mesh_number")?;

        let output_mesh_number: [i32; 3] = header.i32_array("output_mesh_number")?;
        for v in output_mesh_number {
            if v <= 0 {
                return Err(TypeError::InvalidDimension {
                    field: "output_mesh_number",
                    value: i64::from(v),
                });
            }
        }
        if output_mesh_number[1] % parallel_number != 0 {
            return Err(TypeError::IndivisiblePartition {
                ny: dim(output_mesh_number[1]),
                parallel_number: dim(parallel_number),
            });
        }
        check_array_sizes(output_mesh_number, momentum_mesh_number)?;

        let load_type = header.i32_vec("load_type")?;
        if load_type.len() != counts.total {
            return Err(TypeError::LengthMismatch {
                field: "load_type",
                expected: counts.total,
                actual: load_type.len(),
            });
        }
        if species.len() != counts.total {
            return Err(TypeError::LengthMismatch {
                field: "species",
                expected: counts.total,
                actual: species.len(),
            });
        }

        let species = species
            .iter()
            .enumerate()
            .map(|(i, record)| match counts.kind_of(i) {
                SpeciesKind::Ion => {
                    let s = ParticleSpeciesConfig::from_ion_record(i, record)?;
                    if s.load_type() != Some(load_type[i]) {
                        tracing::warn!(
                            species = i,
                            header = load_type[i],
                            record = ?s.load_type(),
                            "species load type disagrees with header"
                        );
                    }
                    Ok(s)
                }
                SpeciesKind::Electron => ParticleSpeciesConfig::from_electron_record(record),
            })
            .collect::<Result<Vec<_>, TypeError>>()?;

        let used_ionize = header.logical("used_ionize")?;
        Ok(Self {
            version: header.text("version")?.to_string(),
            parallel_number,
            dimension,
            velocity_light: header.f64("velocity_light")?,
            delt_time: header.f64("delt_time")?,
            delt_x: header.f64_array("delt_x")?,
            system_l: header.f64_array("system_l")?,
            average_density: header.f64("average_density")?,
            mesh_number: header.i32_array("mesh_number")?,
            field_boundary_condition: header.i32("field_boundary_condition")?,
            total_particle_number: header.i32("total_particle_number")?,
            counts,
            load_type,
            cluster_number: gated(header, "cluster_option", "cluster_number")?,
            ncol: gated(header, "collision_option", "ncol")?,
            ionize: IonizeFlags {
                ion_step: if used_ionize { Some(header.i32("ion_step")?) } else { None },
                used_field_ionize: header.logical("used_field_ionize")?,
                used_collisional_ionize: header.logical("used_collisional_ionize")?,
            },
            ll_dumping_option: header.logical("ll_dumping_option")?,
            used_local_solver: header.logical("used_local_solver")?,
            real_lx: header.f64("real_lx")?,
            int_snap: header.i32("int_snap")?,
            output_mesh_number,
            momentum_mesh_number,
            space_mesh_number_for_momentum: header.i32_array("space_mesh_number_for_momentum")?,
            species,
            laser: LaserConfig::from_record(laser)?,
        })
    }

    /// Split back into the header, species and laser records.
    #[must_use]
    pub fn to_records(&self) -> (Record, Vec<Record>, Record) {
        let mut h = Record::new();
        h.put_text("version", &self.version);
        h.put_i32("parallel_number", self.parallel_number);
        h.put_i32("dimension", self.dimension);
        h.put_f64("velocity_light", self.velocity_light);
        h.put_f64("delt_time", self.delt_time);
        h.put_f64s("delt_x", &self.delt_x);
        h.put_f64s("system_l", &self.system_l);
        h.put_f64("average_density", self.average_density);
        h.put_i32s("mesh_number", &self.mesh_number);
        h.put_i32("field_boundary_condition", self.field_boundary_condition);
        h.put_i32("total_particle_number", self.total_particle_number);
        h.put_i32("total_species", count(self.counts.total));
        h.put_i32("ion_number", count(self.counts.ions));
        h.put_i32("electron_number", count(self.counts.electrons()));
        h.put_i32s("load_type", &self.load_type);
        h.put_logical("cluster_option", self.cluster_number.is_some());
        if let Some(n) = self.cluster_number {
            h.put_i32("cluster_number", n);
        }
        h.put_logical("collision_option", self.ncol.is_some());
        if let Some(n) = self.ncol {
            h.put_i32("ncol", n);
        }
        h.put_logical("used_ionize", self.ionize.is_enabled());
        h.put_logical("used_field_ionize", self.ionize.used_field_ionize);
        h.put_logical("used_collisional_ionize", self.ionize.used_collisional_ionize);
        if let Some(step) = self.ionize.ion_step {
            h.put_i32("ion_step", step);
        }
        h.put_logical("ll_dumping_option", self.ll_dumping_option);
        h.put_logical("used_local_solver", self.used_local_solver);
        h.put_f64("real_lx", self.real_lx);
        h.put_i32("int_snap", self.int_snap);
        h.put_i32s("output_mesh_number", &self.output_mesh_number);
        h.put_i32("momentum_mesh_number", self.momentum_mesh_number);
        h.put_i32s("space_mesh_number_for_momentum", &self.space_mesh_number_for_momentum);

        let species = self.species.iter().map(ParticleSpeciesConfig::to_record).collect();
        (h, species, self.laser.to_record())
    }

    /// Output grid dimensions `[nx, ny, nz]`.
    #[must_use]
    pub fn output_dims(&self) -> [usize; 3] {
        self.output_mesh_number.map(dim)
    }

    /// Number of f32 values in every field and particle-mesh grid.
    #[must_use]
    pub fn total_output_mesh_number(&self) -> usize {
        self.output_dims().iter().fold(1, |acc: usize, &n| acc.saturating_mul(n))
    }

    #[must_use]
    pub fn momentum_bins(&self) -> usize {
        dim(self.momentum_mesh_number)
    }

    #[must_use]
    pub fn ranks(&self) -> usize {
        dim(self.parallel_number)
    }

    /// A small but complete configuration: one density-function ion, one
    /// electron species, a `4 × 4 × 2` output grid split over two ranks.
    #[must_use]
    pub fn sample() -> Self {
        let ion = ParticleSpeciesConfig::IonDensityFunction {
            common: SpeciesCommon::sample(1836.0, 1.0),
            profile: DensityProfile::X {
                nx_func: 1,
                nix: [0.0, 0.25, 0.75, 1.0],
            },
            ionization: None,
        };
        let electron = ParticleSpeciesConfig::Electron {
            common: SpeciesCommon::sample(1.0, -1.0),
        };
        Self {
            version: "v2.0".to_string(),
            parallel_number: 2,
            dimension: 2,
            velocity_light: 10.0,
            delt_time: 0.05,
            delt_x: [0.1, 0.1, 0.1],
            system_l: [0.4, 0.4, 0.2],
            average_density: 1.0,
            mesh_number: [4, 4, 2],
            field_boundary_condition: 0,
            total_particle_number: 8192,
            counts: SpeciesCounts { total: 2, ions: 1 },
            load_type: vec![0, 0],
            cluster_number: None,
            ncol: None,
            ionize: IonizeFlags::default(),
            ll_dumping_option: false,
            used_local_solver: false,
            real_lx: 1.0e-4,
            int_snap: 100,
            output_mesh_number: [4, 4, 2],
            momentum_mesh_number: 4,
            space_mesh_number_for_momentum: [4, 4],
            species: vec![ion, electron],
            laser: LaserConfig::default(),
        }
    }
}

fn positive(record: &Record, field: &'static str) -> Result<i32, TypeError> {
    let v = record.i32(field)?;
    if v <= 0 {
        return Err(TypeError::InvalidDimension {
            field,
            value: i64::from(v),
        });
    }
    Ok(v)
}

fn gated(record: &Record, flag: &'static str, field: &'static str) -> Result<Option<i32>, TypeError> {
    if record.logical(flag)? { record.i32(field).map(Some) } else { Ok(None) }
}

/// Every grid and histogram array must fit one chunk: at most `i32::MAX`
/// values and a byte length that fits the `u32` length header.
fn check_array_sizes(output_mesh_number: [i32; 3], momentum_mesh_number: i32) -> Result<(), TypeError> {
    let [nx, ny, nz] = output_mesh_number.map(i64::from);
    let bins = i64::from(momentum_mesh_number);
    let arrays = [
        ("output_mesh_number", nx.checked_mul(ny).and_then(|v| v.checked_mul(nz))),
        ("momentum_mesh_number", bins.checked_mul(bins)),
        ("output_mesh_number", nx.checked_mul(bins)),
        ("output_mesh_number", ny.checked_mul(bins)),
    ];
    for (field, len) in arrays {
        let fits = len.is_some_and(|n| {
            i32::try_from(n).is_ok() && n.checked_mul(4).is_some_and(|bytes| u32::try_from(bytes).is_ok())
        });
        if !fits {
            return Err(TypeError::InvalidDimension {
                field,
                value: len.unwrap_or(i64::MAX),
            });
        }
    }
    Ok(())
}

fn dim(v: i32) -> usize {
    usize::try_from(v).unwrap_or(0)
}

fn count(v: usize) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> (Record, Vec<Record>, Record) {
        SimulationConfig::sample().to_records()
    }

    fn rebuild(header: &Record, species: &[Record], laser: &Record) -> Result<SimulationConfig, TypeError> {
        SimulationConfig::from_records(header, species, laser)
    }

    #[test]
    fn sample_roundtrips_through_records() {
        let (h, s, l) = records();
        assert_eq!(rebuild(&h, &s, &l).unwrap(), SimulationConfig::sample());
    }

    #[test]
    fn derived_sizes() {
        let config = SimulationConfig::sample();
        assert_eq!(config.total_output_mesh_number(), 32);
        assert_eq!(config.output_dims(), [4, 4, 2]);
        assert_eq!(config.counts.kind_of(1), SpeciesKind::Electron);
    }

    #[test]
    fn inconsistent_species_counts() {
        let (mut h, s, l) = records();
        h.put_i32("electron_number", 2);
        assert!(matches!(
            rebuild(&h, &s, &l),
            Err(TypeError::SpeciesCount { total: 2, ions: 1, electrons: 2 })
        ));

        h.put_i32("electron_number", -1);
        h.put_i32("ion_number", 3);
        assert!(matches!(rebuild(&h, &s, &l), Err(TypeError::SpeciesCount { .. })));
    }

    #[test]
    fn non_positive_dimensions() {
        let (mut h, s, l) = records();
        h.put_i32s("output_mesh_number", &[4, 0, 2]);
        assert!(matches!(
            rebuild(&h, &s, &l),
            Err(TypeError::InvalidDimension { field: "output_mesh_number", value: 0 })
        ));

        let (mut h, s, l) = records();
        h.put_i32("parallel_number", -2);
        assert!(matches!(
            rebuild(&h, &s, &l),
            Err(TypeError::InvalidDimension { field: "parallel_number", .. })
        ));
    }

    #[test]
    fn y_axis_must_split_evenly() {
        let (mut h, s, l) = records();
        h.put_i32("parallel_number", 3);
        assert!(matches!(
            rebuild(&h, &s, &l),
            Err(TypeError::IndivisiblePartition { ny: 4, parallel_number: 3 })
        ));
    }

    #[test]
    fn array_sizes_must_fit_a_chunk() {
        let (mut h, s, l) = records();
        h.put_i32s("output_mesh_number", &[i32::MAX, i32::MAX, 4]);
        h.put_i32("parallel_number", 1);
        assert!(matches!(
            rebuild(&h, &s, &l),
            Err(TypeError::InvalidDimension { field: "output_mesh_number", .. })
        ));

        // 2^15 × 2^15 values: fits i32, but not as bytes in a u32 header.
        let (mut h, s, l) = records();
        h.put_i32s("output_mesh_number", &[1 << 15, 1 << 15, 1]);
        h.put_i32("parallel_number", 1);
        assert!(matches!(
            rebuild(&h, &s, &l),
            Err(TypeError::InvalidDimension { field: "output_mesh_number", value: 1_073_741_824 })
        ));

        let (mut h, s, l) = records();
        h.put_i32("momentum_mesh_number", 1 << 16);
        assert!(matches!(
            rebuild(&h, &s, &l),
            Err(TypeError::InvalidDimension { field: "momentum_mesh_number", .. })
        ));

        // Position histograms: ny × bins.
        let (mut h, s, l) = records();
        h.put_i32s("output_mesh_number", &[4, 1 << 20, 2]);
        h.put_i32("momentum_mesh_number", 1 << 10);
        assert!(matches!(
            rebuild(&h, &s, &l),
            Err(TypeError::InvalidDimension { field: "output_mesh_number", value: 1_073_741_824 })
        ));
    }

    #[test]
    fn load_type_array_length() {
        let (mut h, s, l) = records();
        h.put_i32s("load_type", &[0]);
        assert!(matches!(
            rebuild(&h, &s, &l),
            Err(TypeError::LengthMismatch { field: "load_type", expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn optional_header_fields() {
        let mut config = SimulationConfig::sample();
        config.cluster_number = Some(5);
        config.ncol = Some(2);
        config.ionize.ion_step = Some(10);
        let (h, s, l) = config.to_records();
        assert!(h.logical("cluster_option").unwrap());
        assert!(h.logical("used_ionize").unwrap());
        assert_eq!(rebuild(&h, &s, &l).unwrap(), config);
    }
}
