use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ExportError;
use crate::projection::ProjectionMode;

/// One dataset's export settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlotEntry {
    /// Dataset name, e.g. `Ex`, `Ion_Density`, `xpx`.
    pub name: String,
    pub plot: bool,
    /// Space-separated projection modes. Ignored for phase-space and
    /// energy datasets, which have a single table format.
    pub center: String,
}

impl PlotEntry {
    #[must_use]
    pub fn new(name: &str, plot: bool, center: &str) -> Self {
        Self {
            name: name.to_string(),
            plot,
            center: center.to_string(),
        }
    }
}

/// Which datasets to export and where, read from `plot.json`.
///
/// The JSON keys match the files written by earlier tooling, so existing
/// selection files load unchanged:
///
/// ```json
/// {
///   "OutputASCIIDirectory": "biny_dataASCII",
///   "OutputVTKDirectory": "biny_dataVTK",
///   "Field": [{ "Name": "Ex", "Plot": true, "Center": "xy x y" }],
///   "Particle": [],
///   "Phase": null,
///   "EnergyDistribution": null
/// }
/// ```
///
/// Missing keys fall back to [`PlotSelection::default`]; `null` lists
/// are empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotSelection {
    #[serde(rename = "OutputASCIIDirectory")]
    pub ascii_dir: PathBuf,
    #[serde(rename = "OutputVTKDirectory")]
    pub vtk_dir: PathBuf,
    #[serde(rename = "Field", deserialize_with = "null_as_empty")]
    pub field: Vec<PlotEntry>,
    #[serde(rename = "Particle", deserialize_with = "null_as_empty")]
    pub particle: Vec<PlotEntry>,
    #[serde(rename = "Phase", deserialize_with = "null_as_empty")]
    pub phase: Vec<PlotEntry>,
    #[serde(rename = "EnergyDistribution", deserialize_with = "null_as_empty")]
    pub energy_distribution: Vec<PlotEntry>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<PlotEntry>, D::Error> {
    Option::<Vec<PlotEntry>>::deserialize(d).map(Option::unwrap_or_default)
}

const MESH_CENTER: &str = "xy x y";

impl Default for PlotSelection {
    /// Electric field, magnetic `Bz`, in-plane currents, densities and
    /// energy spectra for both species kinds, and every phase-space
    /// histogram.
    fn default() -> Self {
        let field = [
            ("Ex", true),
            ("Ey", true),
            ("Ez", false),
            ("Bx", false),
            ("By", false),
            ("Bz", true),
            ("Jx", true),
            ("Jy", true),
            ("Jz", false),
        ]
        .into_iter()
        .map(|(name, plot)| PlotEntry::new(name, plot, MESH_CENTER))
        .collect();

        let mut particle = Vec::new();
        for prefix in ["Ion", "Electron"] {
            for (suffix, plot, center) in [
                ("Density", true, MESH_CENTER),
                ("Energy", false, MESH_CENTER),
                ("Energy_Distribution", true, ""),
                ("Energy_DistributionLogLog", true, ""),
                ("EnergyFlux_x", false, MESH_CENTER),
                ("EnergyFlux_y", false, MESH_CENTER),
            ] {
                particle.push(PlotEntry::new(&format!("{prefix}_{suffix}"), plot, center));
            }
        }

        let phase = ["pxpy", "pypz", "pzpx", "xpx", "xpy", "xpz", "ypx", "ypy", "ypz"]
            .into_iter()
            .map(|name| PlotEntry::new(name, true, ""))
            .collect();

        Self {
            ascii_dir: PathBuf::from("biny_dataASCII"),
            vtk_dir: PathBuf::from("biny_dataVTK"),
            field,
            particle,
            phase,
            energy_distribution: Vec::new(),
        }
    }
}

impl PlotSelection {
    /// First entry named `name`, searching field, particle, phase and
    /// energy lists in that order.
    #[must_use]
    pub fn entry(&self, name: &str) -> Option<&PlotEntry> {
        self.field
            .iter()
            .chain(&self.particle)
            .chain(&self.phase)
            .chain(&self.energy_distribution)
            .find(|e| e.name == name)
    }

    #[must_use]
    pub fn is_plotted(&self, name: &str) -> bool {
        self.entry(name).is_some_and(|e| e.plot)
    }

    /// Projection modes requested for `name`, empty when it is not plotted.
    /// Unknown mode names are logged and skipped.
    #[must_use]
    pub fn modes(&self, name: &str) -> Vec<ProjectionMode> {
        let Some(entry) = self.entry(name).filter(|e| e.plot) else {
            return Vec::new();
        };
        let (modes, errors) = ProjectionMode::parse_list(&entry.center);
        for e in errors {
            tracing::warn!(dataset = name, "{e}");
        }
        modes
    }

    /// # Errors
    ///
    /// [`ExportError::Io`] if the file cannot be read,
    /// [`ExportError::Selection`] if it is not a valid selection.
    pub fn load(path: &Path) -> Result<Self, ExportError> {
        let text = fs::read_to_string(path).map_err(|e| ExportError::io(path, e))?;
        serde_json::from_str(&text).map_err(|source| ExportError::Selection {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path`, first writing the default selection there if it does
    /// not exist. Returns the selection and whether the file was created.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load) and [`save`](Self::save).
    pub fn load_or_create(path: &Path) -> Result<(Self, bool), ExportError> {
        if path.exists() {
            return Ok((Self::load(path)?, false));
        }
        let selection = Self::default();
        selection.save(path)?;
        tracing::warn!(
            path = %path.display(),
            "plot selection not found, wrote defaults; edit Name / Plot / Center to change outputs"
        );
        Ok((selection, true))
    }

    /// Write the selection as indented JSON.
    ///
    /// # Errors
    ///
    /// [`ExportError::Io`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ExportError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| ExportError::Selection {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|e| ExportError::io(path, e))
    }

    /// Create both output directories if they are missing.
    ///
    /// # Errors
    ///
    /// [`ExportError::Io`] naming the directory that failed.
    pub fn create_dirs(&self) -> Result<(), ExportError> {
        for dir in [&self.ascii_dir, &self.vtk_dir] {
            fs::create_dir_all(dir).map_err(|e| ExportError::io(dir, e))?;
        }
        Ok(())
    }
}

impl fmt::Display for PlotSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "text output : {}", self.ascii_dir.display())?;
        writeln!(f, "VTK output  : {}", self.vtk_dir.display())?;
        for entry in self.field.iter().chain(&self.particle).filter(|e| e.plot) {
            let modes: Vec<&str> = entry.center.split_whitespace().collect();
            writeln!(f, "  {} : {}", entry.name, modes.join(", "))?;
        }
        let phase: Vec<&str> = self
            .phase
            .iter()
            .filter(|e| e.plot)
            .map(|e| e.name.as_str())
            .collect();
        if !phase.is_empty() {
            writeln!(f, "  phase space : {}", phase.join(", "))?;
        }
        Ok(())
    }
}
