use std::fmt;

use crate::error::TypeError;
use crate::schema::Record;

/// Which half of the species list a species belongs to.
///
/// Ions come first (`index < ion_number`), electrons after. The kind sets
/// the dataset name prefix (`Ion_Density`, `Electron_Density`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpeciesKind {
    Ion,
    Electron,
}

impl SpeciesKind {
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Ion => "Ion",
            Self::Electron => "Electron",
        }
    }
}

impl fmt::Display for SpeciesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Fields every species record carries.
#[derive(Clone, Debug, PartialEq)]
pub struct SpeciesCommon {
    pub n_p: i32,
    pub np: i32,
    pub nps: i32,
    pub particle_mass: f64,
    pub particle_charge: f64,
    pub temperature_function: i32,
    pub temperature: f64,
    pub rns_b: f64,
    pub ll_dumping: bool,
    /// Out-going flags for the x, y and z boundaries.
    pub particle_out_going: [bool; 3],
}

/// Initial density profile of a density-function ion species.
#[derive(Clone, Debug, PartialEq)]
pub enum DensityProfile {
    X { nx_func: i32, nix: [f32; 4] },
    Y { ny_func: i32, niy: [f32; 4] },
}

impl DensityProfile {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::X { .. } => "x",
            Self::Y { .. } => "y",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClusterLoading {
    pub rds: f64,
    pub cluster_loading_option: i32,
    pub cluster_shape: i32,
    pub number_cluster: i32,
    pub xclr: [f64; 2],
    pub yclr: [f64; 2],
    pub cluster_distance: f64,
}

/// Present on ion species when the run enables ionization.
#[derive(Clone, Debug, PartialEq)]
pub struct Ionization {
    pub atom: String,
    pub initial_charge: f64,
}

/// One entry of the species list.
///
/// Ion species are loaded either from a density function (`LoadType` 0)
/// or as clusters (`LoadType` 1); electrons have no load variant.
#[derive(Clone, Debug, PartialEq)]
pub enum ParticleSpeciesConfig {
    IonDensityFunction {
        common: SpeciesCommon,
        profile: DensityProfile,
        ionization: Option<Ionization>,
    },
    IonClusterLoaded {
        common: SpeciesCommon,
        cluster: ClusterLoading,
        ionization: Option<Ionization>,
    },
    Electron {
        common: SpeciesCommon,
    },
}

impl ParticleSpeciesConfig {
    #[must_use]
    pub fn common(&self) -> &SpeciesCommon {
        match self {
            Self::IonDensityFunction { common, .. }
            | Self::IonClusterLoaded { common, .. }
            | Self::Electron { common } => common,
        }
    }

    #[must_use]
    pub fn kind(&self) -> SpeciesKind {
        match self {
            Self::Electron { .. } => SpeciesKind::Electron,
            _ => SpeciesKind::Ion,
        }
    }

    /// The `LoadType` discriminant, `None` for electrons.
    #[must_use]
    pub fn load_type(&self) -> Option<i32> {
        match self {
            Self::IonDensityFunction { .. } => Some(0),
            Self::IonClusterLoaded { .. } => Some(1),
            Self::Electron { .. } => None,
        }
    }

    #[must_use]
    pub fn ionization(&self) -> Option<&Ionization> {
        match self {
            Self::IonDensityFunction { ionization, .. }
            | Self::IonClusterLoaded { ionization, .. } => ionization.as_ref(),
            Self::Electron { .. } => None,
        }
    }

    /// Build an ion species from a record decoded with
    /// [`ION_SPECIES`](crate::grammar::ION_SPECIES).
    ///
    /// # Errors
    ///
    /// [`TypeError::UnknownLoadType`] / [`TypeError::UnknownDensityProfile`]
    /// for discriminants outside the known set, or any record lookup error.
    pub fn from_ion_record(index: usize, record: &Record) -> Result<Self, TypeError> {
        let common = SpeciesCommon::from_record(record)?;
        let ionization = if record.contains("atom") {
            Some(Ionization {
                atom: record.text("atom")?.to_string(),
                initial_charge: record.f64("initial_charge")?,
            })
        } else {
            None
        };

        match record.i32("load_type")? {
            0 => {
                let profile = match record.text("density_function_type")? {
                    "x" => DensityProfile::X {
                        nx_func: record.i32("nx_func")?,
                        nix: record.f32_array("nix")?,
                    },
                    "y" => DensityProfile::Y {
                        ny_func: record.i32("ny_func")?,
                        niy: record.f32_array("niy")?,
                    },
                    other => {
                        return Err(TypeError::UnknownDensityProfile {
                            species: index,
                            code: other.to_string(),
                        });
                    }
                };
                Ok(Self::IonDensityFunction {
                    common,
                    profile,
                    ionization,
                })
            }
            1 => Ok(Self::IonClusterLoaded {
                common,
                cluster: ClusterLoading {
                    rds: record.f64("rds")?,
                    cluster_loading_option: record.i32("cluster_loading_option")?,
                    cluster_shape: record.i32("cluster_shape")?,
                    number_cluster: record.i32("number_cluster")?,
                    xclr: record.f64_array("xclr")?,
                    yclr: record.f64_array("yclr")?,
                    cluster_distance: record.f64("cluster_distance")?,
                },
                ionization,
            }),
            value => Err(TypeError::UnknownLoadType { species: index, value }),
        }
    }

    /// # Errors
    ///
    /// Any record lookup error.
    pub fn from_electron_record(record: &Record) -> Result<Self, TypeError> {
        Ok(Self::Electron {
            common: SpeciesCommon::from_record(record)?,
        })
    }

    /// Inverse of the two `from_*_record` constructors.
    #[must_use]
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        if let Some(load_type) = self.load_type() {
            record.put_i32("load_type", load_type);
        }
        self.common().write_into(&mut record);

        match self {
            Self::IonDensityFunction { profile, .. } => {
                record.put_text("density_function_type", profile.code());
                match profile {
                    DensityProfile::X { nx_func, nix } => {
                        record.put_i32("nx_func", *nx_func);
                        record.put_f32s("nix", nix);
                    }
                    DensityProfile::Y { ny_func, niy } => {
                        record.put_i32("ny_func", *ny_func);
                        record.put_f32s("niy", niy);
                    }
                }
            }
            Self::IonClusterLoaded { cluster, .. } => {
                record.put_f64("rds", cluster.rds);
                record.put_i32("cluster_loading_option", cluster.cluster_loading_option);
                record.put_i32("cluster_shape", cluster.cluster_shape);
                record.put_i32("number_cluster", cluster.number_cluster);
                record.put_f64s("xclr", &cluster.xclr);
                record.put_f64s("yclr", &cluster.yclr);
                record.put_f64("cluster_distance", cluster.cluster_distance);
            }
            Self::Electron { .. } => {}
        }

        if let Some(ion) = self.ionization() {
            record.put_text("atom", &ion.atom);
            record.put_f64("initial_charge", ion.initial_charge);
        }
        record
    }
}

impl SpeciesCommon {
    fn from_record(record: &Record) -> Result<Self, TypeError> {
        Ok(Self {
            n_p: record.i32("n_p")?,
            np: record.i32("np")?,
            nps: record.i32("nps")?,
            particle_mass: record.f64("particle_mass")?,
            particle_charge: record.f64("particle_charge")?,
            temperature_function: record.i32("temperature_function")?,
            temperature: record.f64("temperature")?,
            rns_b: record.f64("rns_b")?,
            ll_dumping: record.logical("ll_dumping")?,
            particle_out_going: [
                record.logical("particle_out_going_x")?,
                record.logical("particle_out_going_y")?,
                record.logical("particle_out_going_z")?,
            ],
        })
    }

    fn write_into(&self, record: &mut Record) {
        record.put_i32("n_p", self.n_p);
        record.put_i32("np", self.np);
        record.put_i32("nps", self.nps);
        record.put_f64("particle_mass", self.particle_mass);
        record.put_f64("particle_charge", self.particle_charge);
        record.put_i32("temperature_function", self.temperature_function);
        record.put_f64("temperature", self.temperature);
        record.put_f64("rns_b", self.rns_b);
        record.put_logical("ll_dumping", self.ll_dumping);
        let [x, y, z] = self.particle_out_going;
        record.put_logical("particle_out_going_x", x);
        record.put_logical("particle_out_going_y", y);
        record.put_logical("particle_out_going_z", z);
    }

    /// A plausible species for tests and synthetic streams.
    #[must_use]
    pub fn sample(particle_mass: f64, particle_charge: f64) -> Self {
        Self {
            n_p: 8,
            np: 4096,
            nps: 16,
            particle_mass,
            particle_charge,
            temperature_function: 0,
            temperature: 10.0,
            rns_b: 1.0,
            ll_dumping: false,
            particle_out_going: [true, false, false],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ion(load_type: i32) -> Record {
        let mut record = ParticleSpeciesConfig::Electron {
            common: SpeciesCommon::sample(1836.0, 1.0),
        }
        .to_record();
        record.put_i32("load_type", load_type);
        record
    }

    #[test]
    fn density_function_ion_roundtrips() {
        let species = ParticleSpeciesConfig::IonDensityFunction {
            common: SpeciesCommon::sample(1836.0, 1.0),
            profile: DensityProfile::Y {
                ny_func: 2,
                niy: [0.0, 0.5, 1.0, 1.5],
            },
            ionization: Some(Ionization {
                atom: "Cu".into(),
                initial_charge: 1.0,
            }),
        };
        let back = ParticleSpeciesConfig::from_ion_record(0, &species.to_record()).unwrap();
        assert_eq!(back, species);
        assert_eq!(back.kind(), SpeciesKind::Ion);
    }

    #[test]
    fn cluster_ion_roundtrips() {
        let species = ParticleSpeciesConfig::IonClusterLoaded {
            common: SpeciesCommon::sample(3672.0, 2.0),
            cluster: ClusterLoading {
                rds: 0.5,
                cluster_loading_option: 1,
                cluster_shape: 2,
                number_cluster: 3,
                xclr: [0.0, 1.0],
                yclr: [2.0, 3.0],
                cluster_distance: 4.0,
            },
            ionization: None,
        };
        let back = ParticleSpeciesConfig::from_ion_record(1, &species.to_record()).unwrap();
        assert_eq!(back, species);
        assert_eq!(back.load_type(), Some(1));
    }

    #[test]
    fn unknown_load_type_is_rejected() {
        let err = ParticleSpeciesConfig::from_ion_record(3, &ion(7)).unwrap_err();
        assert!(matches!(err, TypeError::UnknownLoadType { species: 3, value: 7 }));
    }

    #[test]
    fn unknown_density_profile_is_rejected() {
        let mut record = ion(0);
        record.put_text("density_function_type", "z");
        let err = ParticleSpeciesConfig::from_ion_record(0, &record).unwrap_err();
        assert!(matches!(err, TypeError::UnknownDensityProfile { ref code, .. } if code == "z"));
    }

    #[test]
    fn electron_prefix() {
        let e = ParticleSpeciesConfig::from_electron_record(&ion(0)).unwrap();
        assert_eq!(e.kind().prefix(), "Electron");
        assert!(e.ionization().is_none());
    }
}
