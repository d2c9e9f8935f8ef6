use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use picdump_decoder::SnapshotEvent;
use picdump_types::{EnergyDistribution, Grid2D, Grid3D, NormalizationConstants, PhaseSpace};

use crate::error::ExportError;
use crate::projection::ProjectionMode;
use crate::render_text::write_projection;
use crate::render_vtk::write_image_data;
use crate::selection::PlotSelection;
use crate::tables::{EnergyScale, write_energy_table, write_phase_table};

/// Plans output files for decoded datasets.
///
/// The pipeline calls [`plan`](Exporter::plan) for every decoded event
/// and runs the returned jobs concurrently. Planning is cheap and happens
/// on the decode thread; jobs only hold `Arc`s to the decoded buffers.
///
/// ```text
/// SnapshotEvent ──▶ Exporter::plan() ──▶ Vec<ExportJob> ──▶ JoinSet
///                         │
///                   PlotSelection
/// ```
pub trait Exporter: Send + Sync {
    /// Jobs for one event of timestep `index`. Events that produce no
    /// files return an empty list.
    fn plan(&self, index: usize, event: &SnapshotEvent) -> Vec<ExportJob>;
}

/// Which histogram of a phase space to tabulate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Histogram {
    Momentum(usize),
    Position(usize),
}

/// What an export job writes.
#[derive(Clone, Debug)]
pub enum ExportPayload {
    Projection {
        grid: Arc<Grid3D>,
        mode: ProjectionMode,
    },
    Vtk {
        grid: Arc<Grid3D>,
        name: String,
    },
    PhaseTable {
        phase: Arc<PhaseSpace>,
        histogram: Histogram,
    },
    Energy {
        distribution: Arc<EnergyDistribution>,
        scale: EnergyScale,
        energy_unit: f32,
    },
}

/// One output file.
#[derive(Clone, Debug)]
pub struct ExportJob {
    pub path: PathBuf,
    pub payload: ExportPayload,
}

impl ExportJob {
    /// Create the file and write the payload. Blocking.
    ///
    /// # Errors
    ///
    /// [`ExportError::Io`] naming `self.path`.
    pub fn run(&self) -> Result<(), ExportError> {
        let file = File::create(&self.path).map_err(|e| ExportError::io(&self.path, e))?;
        let mut out = BufWriter::new(file);
        self.write(&mut out)
            .and_then(|()| out.flush())
            .map_err(|e| ExportError::io(&self.path, e))
    }

    fn write<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        match &self.payload {
            ExportPayload::Projection { grid, mode } => write_projection(out, grid, *mode),
            ExportPayload::Vtk { grid, name } => write_image_data(out, grid, name),
            ExportPayload::PhaseTable { phase, histogram } => {
                let (rows, grid) = histogram_rows(phase, *histogram);
                write_phase_table(out, &rows, &phase.momentum, grid)
            }
            ExportPayload::Energy {
                distribution,
                scale,
                energy_unit,
            } => write_energy_table(out, distribution, *scale, *energy_unit),
        }
    }
}

fn histogram_rows(phase: &PhaseSpace, histogram: Histogram) -> (Vec<f32>, &Grid2D) {
    match histogram {
        Histogram::Momentum(i) => (phase.momentum.clone(), &phase.momentum_planes[i].grid),
        Histogram::Position(i) => {
            let grid = &phase.position[i].grid;
            (PhaseSpace::position_axis(grid.rows()), grid)
        }
    }
}

/// Writes selected datasets as files under the selection's output
/// directories.
///
/// File names carry the zero-padded timestep and, for per-species data,
/// the 1-based species number across the whole species list:
///
/// ```text
/// ┌──────────────────┬──────────────────────────────────────────────┐
/// │ Dataset          │ Path                                         │
/// ├──────────────────┼──────────────────────────────────────────────┤
/// │ field, text      │ {ascii}/Ex_xy_0003.txt                       │
/// │ field, vtk       │ {vtk}/Ex0003.vti                             │
/// │ mesh, text       │ {ascii}/Ion_Density_x_0003_is=01.txt         │
/// │ mesh, vtk        │ {vtk}/Ion_Density0003_is=01.vti              │
/// │ phase space      │ {ascii}/xpx0003_is=02.txt                    │
/// │ energy, linear   │ {ascii}/Ion_Energy_Distribution0003_is=01.txt│
/// │ energy, log-log  │ {ascii}/Ion_Energy_DistributionLog0003_is=01 │
/// └──────────────────┴──────────────────────────────────────────────┘
/// ```
#[derive(Clone, Debug)]
pub struct FileExporter {
    selection: PlotSelection,
    energy_unit: f32,
}

impl FileExporter {
    #[must_use]
    pub fn new(selection: PlotSelection, constants: NormalizationConstants) -> Self {
        Self {
            selection,
            energy_unit: constants.energy,
        }
    }

    #[must_use]
    pub fn selection(&self) -> &PlotSelection {
        &self.selection
    }

    fn ascii(&self, file: String) -> PathBuf {
        self.selection.ascii_dir.join(file)
    }

    fn grid_jobs(
        &self,
        name: &str,
        grid: &Arc<Grid3D>,
        index: usize,
        species: Option<usize>,
    ) -> Vec<ExportJob> {
        let tag = species.map(species_tag).unwrap_or_default();
        self.selection
            .modes(name)
            .into_iter()
            .map(|mode| {
                if mode.is_text() {
                    ExportJob {
                        path: self.ascii(format!("{name}_{mode}_{index:04}{tag}.txt")),
                        payload: ExportPayload::Projection {
                            grid: Arc::clone(grid),
                            mode,
                        },
                    }
                } else {
                    ExportJob {
                        path: self.selection.vtk_dir.join(format!("{name}{index:04}{tag}.vti")),
                        payload: ExportPayload::Vtk {
                            grid: Arc::clone(grid),
                            name: name.to_string(),
                        },
                    }
                }
            })
            .collect()
    }

    fn phase_jobs(&self, phase: &Arc<PhaseSpace>, index: usize) -> Vec<ExportJob> {
        let tag = species_tag(phase.species);
        let momentum = phase
            .momentum_planes
            .iter()
            .enumerate()
            .map(|(i, h)| (h.plane.title(), Histogram::Momentum(i)));
        let position = phase
            .position
            .iter()
            .enumerate()
            .map(|(i, h)| (h.kind.title(), Histogram::Position(i)));

        momentum
            .chain(position)
            .filter(|(title, _)| self.selection.is_plotted(title))
            .map(|(title, histogram)| ExportJob {
                path: self.ascii(format!("{title}{index:04}{tag}.txt")),
                payload: ExportPayload::PhaseTable {
                    phase: Arc::clone(phase),
                    histogram,
                },
            })
            .collect()
    }

    fn energy_jobs(&self, dist: &Arc<EnergyDistribution>, index: usize) -> Vec<ExportJob> {
        let prefix = dist.kind.prefix();
        let tag = species_tag(dist.species);
        [
            (EnergyScale::Linear, "Energy_Distribution", "Energy_Distribution"),
            (EnergyScale::LogLog, "Energy_DistributionLogLog", "Energy_DistributionLog"),
        ]
        .into_iter()
        .filter(|(_, entry, _)| self.selection.is_plotted(&format!("{prefix}_{entry}")))
        .map(|(scale, _, file)| ExportJob {
            path: self.ascii(format!("{prefix}_{file}{index:04}{tag}.txt")),
            payload: ExportPayload::Energy {
                distribution: Arc::clone(dist),
                scale,
                energy_unit: self.energy_unit,
            },
        })
        .collect()
    }
}

impl Exporter for FileExporter {
    fn plan(&self, index: usize, event: &SnapshotEvent) -> Vec<ExportJob> {
        match event {
            SnapshotEvent::Field(f) => self.grid_jobs(f.component.name(), &f.grid, index, None),
            SnapshotEvent::ParticleMesh(m) => {
                self.grid_jobs(&m.name(), &m.grid, index, Some(m.species))
            }
            SnapshotEvent::PhaseSpace(p) => self.phase_jobs(p, index),
            SnapshotEvent::EnergyDistribution(d) => self.energy_jobs(d, index),
            SnapshotEvent::Begin { .. } | SnapshotEvent::End { .. } => Vec::new(),
        }
    }
}

fn species_tag(species: usize) -> String {
    format!("_is={:02}", species + 1)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use picdump_types::{
        FieldComponent, FieldGrid, MeshQuantity, MomentumHistogram, MomentumPlane, ParticleMesh,
        PositionHistogram, PositionMomentum, SpeciesKind,
    };

    use std::path::Path;

    use super::*;

    fn exporter(root: &Path) -> FileExporter {
        let selection = PlotSelection {
            ascii_dir: root.join("ascii"),
            vtk_dir: root.join("vtk"),
            ..PlotSelection::default()
        };
        FileExporter::new(selection, NormalizationConstants::unit())
    }

    fn names(jobs: &[ExportJob]) -> Vec<String> {
        jobs.iter()
            .map(|j| j.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    fn field(component: FieldComponent) -> SnapshotEvent {
        SnapshotEvent::Field(FieldGrid {
            component,
            grid: Arc::new(Grid3D::zeros(2, 2, 2)),
        })
    }

    fn phase(species: usize) -> Arc<PhaseSpace> {
        Arc::new(PhaseSpace {
            species,
            kind: SpeciesKind::Electron,
            delta_momentum: 1.0,
            momentum: vec![-0.5, 0.5],
            momentum_planes: MomentumPlane::ALL
                .iter()
                .map(|&plane| MomentumHistogram {
                    plane,
                    grid: Grid2D::zeros(2, 2),
                })
                .collect(),
            position: PositionMomentum::ALL
                .iter()
                .map(|&kind| PositionHistogram {
                    kind,
                    grid: Grid2D::zeros(3, 2),
                })
                .collect(),
        })
    }

    #[test]
    fn field_paths_follow_selection() {
        let dir = tempfile::tempdir().unwrap();
        let exp = exporter(dir.path());
        assert_eq!(
            names(&exp.plan(3, &field(FieldComponent::Ex))),
            ["Ex_xy_0003.txt", "Ex_x_0003.txt", "Ex_y_0003.txt"]
        );
        assert!(exp.plan(3, &field(FieldComponent::Bx)).is_empty());
    }

    #[test]
    fn vtk_goes_to_vtk_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut exp = exporter(dir.path());
        exp.selection.field[0].center = "vtk".to_string();
        let jobs = exp.plan(12, &field(FieldComponent::Ex));
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].path, dir.path().join("vtk").join("Ex0012.vti"));
    }

    #[test]
    fn mesh_paths_use_one_based_species() {
        let dir = tempfile::tempdir().unwrap();
        let event = SnapshotEvent::ParticleMesh(ParticleMesh {
            species: 1,
            kind: SpeciesKind::Electron,
            quantity: MeshQuantity::Density,
            grid: Arc::new(Grid3D::zeros(2, 2, 2)),
        });
        assert_eq!(
            names(&exporter(dir.path()).plan(0, &event)),
            [
                "Electron_Density_xy_0000_is=02.txt",
                "Electron_Density_x_0000_is=02.txt",
                "Electron_Density_y_0000_is=02.txt"
            ]
        );
    }

    #[test]
    fn phase_space_yields_nine_tables() {
        let dir = tempfile::tempdir().unwrap();
        let jobs = exporter(dir.path()).plan(1, &SnapshotEvent::PhaseSpace(phase(0)));
        let names = names(&jobs);
        assert_eq!(names.len(), 9);
        assert_eq!(names[0], "pxpy0001_is=01.txt");
        assert_eq!(names[8], "ypz0001_is=01.txt");
    }

    #[test]
    fn energy_tables_respect_plot_flag() {
        let dir = tempfile::tempdir().unwrap();
        let mut exp = exporter(dir.path());
        let dist = Arc::new(EnergyDistribution {
            species: 0,
            kind: SpeciesKind::Ion,
            average_charge_rate: 1.0,
            average_energy: 1.0,
            delta_energy: 1.0,
            population: vec![1.0],
            eimaxt: 1.0,
            loglog_population: vec![1.0],
        });
        let event = SnapshotEvent::EnergyDistribution(dist);
        assert_eq!(
            names(&exp.plan(2, &event)),
            ["Ion_Energy_Distribution0002_is=01.txt", "Ion_Energy_DistributionLog0002_is=01.txt"]
        );

        for e in &mut exp.selection.particle {
            if e.name == "Ion_Energy_DistributionLogLog" {
                e.plot = false;
            }
        }
        assert_eq!(names(&exp.plan(2, &event)), ["Ion_Energy_Distribution0002_is=01.txt"]);
    }

    #[test]
    fn boundary_events_plan_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let exp = exporter(dir.path());
        assert!(exp.plan(0, &SnapshotEvent::Begin { index: 0, time: 0.0 }).is_empty());
        assert!(exp.plan(0, &SnapshotEvent::End { index: 0 }).is_empty());
    }

    #[test]
    fn run_writes_position_table() {
        let dir = tempfile::tempdir().unwrap();
        let exp = exporter(dir.path());
        exp.selection().create_dirs().unwrap();
        let jobs = exp.plan(0, &SnapshotEvent::PhaseSpace(phase(0)));
        let xpx = jobs.iter().find(|j| j.path.ends_with("xpx0000_is=01.txt")).unwrap();
        xpx.run().unwrap();

        let text = fs::read_to_string(&xpx.path).unwrap();
        // Rows are cell indices 0..3, columns the momentum axis.
        assert_eq!(text.lines().next(), Some("0 -0.5 0"));
        assert_eq!(text.lines().filter(|l| l.is_empty()).count(), 3);
    }

    #[test]
    fn run_without_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let jobs = exporter(dir.path()).plan(0, &field(FieldComponent::Ex));
        let err = jobs[0].run().unwrap_err();
        assert!(matches!(err, ExportError::Io { ref path, .. } if *path == jobs[0].path));
    }
}
