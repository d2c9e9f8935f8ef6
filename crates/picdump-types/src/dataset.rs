//! Typed datasets decoded from one snapshot timestep.
//!
//! Grids are held behind `Arc` so the exporter can hand the same buffer to
//! several concurrent writers without copying.

use std::fmt;
use std::sync::Arc;

use crate::grid::{Grid2D, Grid3D};
use crate::normalization::NormalizationConstants;
use crate::species::SpeciesKind;

/// The nine electromagnetic grids, in stream order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldComponent {
    Ex,
    Ey,
    Ez,
    Bx,
    By,
    Bz,
    Jx,
    Jy,
    Jz,
}

impl FieldComponent {
    pub const ALL: [Self; 9] = [
        Self::Ex,
        Self::Ey,
        Self::Ez,
        Self::Bx,
        Self::By,
        Self::Bz,
        Self::Jx,
        Self::Jy,
        Self::Jz,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Ex => "Ex",
            Self::Ey => "Ey",
            Self::Ez => "Ez",
            Self::Bx => "Bx",
            Self::By => "By",
            Self::Bz => "Bz",
            Self::Jx => "Jx",
            Self::Jy => "Jy",
            Self::Jz => "Jz",
        }
    }

    /// Factor applied while reconstructing: electric for E, magnetic for B,
    /// none for the current density.
    #[must_use]
    pub fn scale(self, k: &NormalizationConstants) -> f32 {
        match self {
            Self::Ex | Self::Ey | Self::Ez => k.electric,
            Self::Bx | Self::By | Self::Bz => k.magnetic,
            Self::Jx | Self::Jy | Self::Jz => 1.0,
        }
    }
}

impl fmt::Display for FieldComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The four per-species moment grids, in stream order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeshQuantity {
    Density,
    Energy,
    EnergyFluxX,
    EnergyFluxY,
}

impl MeshQuantity {
    pub const ALL: [Self; 4] = [Self::Density, Self::Energy, Self::EnergyFluxX, Self::EnergyFluxY];

    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Density => "Density",
            Self::Energy => "Energy",
            Self::EnergyFluxX => "EnergyFlux_x",
            Self::EnergyFluxY => "EnergyFlux_y",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldGrid {
    pub component: FieldComponent,
    pub grid: Arc<Grid3D>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParticleMesh {
    /// Position in the species list.
    pub species: usize,
    pub kind: SpeciesKind,
    pub quantity: MeshQuantity,
    pub grid: Arc<Grid3D>,
}

impl ParticleMesh {
    /// Dataset name, e.g. `Electron_EnergyFlux_x`.
    #[must_use]
    pub fn name(&self) -> String {
        format!("{}_{}", self.kind.prefix(), self.quantity.suffix())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MomentumPlane {
    PxPy,
    PyPz,
    PzPx,
}

impl MomentumPlane {
    pub const ALL: [Self; 3] = [Self::PxPy, Self::PyPz, Self::PzPx];

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::PxPy => "pxpy",
            Self::PyPz => "pypz",
            Self::PzPx => "pzpx",
        }
    }
}

/// Position–momentum histogram kinds, in stream order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PositionMomentum {
    Xpx,
    Xpy,
    Xpz,
    Ypx,
    Ypy,
    Ypz,
}

impl PositionMomentum {
    pub const ALL: [Self; 6] = [Self::Xpx, Self::Xpy, Self::Xpz, Self::Ypx, Self::Ypy, Self::Ypz];

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Xpx => "xpx",
            Self::Xpy => "xpy",
            Self::Xpz => "xpz",
            Self::Ypx => "ypx",
            Self::Ypy => "ypy",
            Self::Ypz => "ypz",
        }
    }

    /// Spatial axis of the histogram rows: 0 for x, 1 for y.
    #[must_use]
    pub fn axis(self) -> usize {
        match self {
            Self::Xpx | Self::Xpy | Self::Xpz => 0,
            Self::Ypx | Self::Ypy | Self::Ypz => 1,
        }
    }
}

/// `grid[p1][p2]` over two momentum axes.
#[derive(Clone, Debug, PartialEq)]
pub struct MomentumHistogram {
    pub plane: MomentumPlane,
    pub grid: Grid2D,
}

/// `grid[cell][p]`, rows indexed by the global cell along `kind.axis()`.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionHistogram {
    pub kind: PositionMomentum,
    pub grid: Grid2D,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PhaseSpace {
    pub species: usize,
    pub kind: SpeciesKind,
    pub delta_momentum: f32,
    /// Momentum bin centres.
    pub momentum: Vec<f32>,
    pub momentum_planes: Vec<MomentumHistogram>,
    pub position: Vec<PositionHistogram>,
}

impl PhaseSpace {
    /// Momentum bin centres:
    /// `delta * ((i - bins/2) - 0.5) / (mass * velocity_light)`, with
    /// integer `bins/2`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_possible_wrap)]
    pub fn momentum_axis(bins: usize, delta: f32, mass: f64, velocity_light: f64) -> Vec<f32> {
        let half = (bins / 2) as i64;
        let denom = (mass * velocity_light) as f32;
        (0..bins)
            .map(|i| delta * (((i as i64) - half) as f32 - 0.5) / denom)
            .collect()
    }

    /// Cell coordinates `0, 1, .., n-1` along a spatial axis.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn position_axis(n: usize) -> Vec<f32> {
        (0..n).map(|i| i as f32).collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnergyDistribution {
    pub species: usize,
    pub kind: SpeciesKind,
    pub average_charge_rate: f32,
    pub average_energy: f32,
    /// Width of one linear energy bin, in simulation units.
    pub delta_energy: f32,
    pub population: Vec<f32>,
    /// Upper bound of the log-log energy range.
    pub eimaxt: f32,
    pub loglog_population: Vec<f32>,
}

/// Everything decoded for one timestep.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub index: usize,
    pub time: f32,
    pub fields: Vec<FieldGrid>,
    pub particle_meshes: Vec<ParticleMesh>,
    pub phase_spaces: Vec<Arc<PhaseSpace>>,
    pub energy: Vec<Arc<EnergyDistribution>>,
}

impl Snapshot {
    #[must_use]
    pub fn field(&self, component: FieldComponent) -> Option<&FieldGrid> {
        self.fields.iter().find(|f| f.component == component)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn momentum_axis_is_centred_below_zero() {
        // bins = 4: i - 2 - 0.5 = -2.5, -1.5, -0.5, 0.5
        let axis = PhaseSpace::momentum_axis(4, 2.0, 1.0, 10.0);
        assert_eq!(axis, vec![-0.5, -0.3, -0.1, 0.1]);
    }

    #[test]
    fn odd_bin_count_uses_integer_half() {
        // bins = 3: half = 1
        let axis = PhaseSpace::momentum_axis(3, 1.0, 1.0, 1.0);
        assert_eq!(axis, vec![-1.5, -0.5, 0.5]);
    }

    #[test]
    fn dataset_names() {
        let mesh = ParticleMesh {
            species: 1,
            kind: SpeciesKind::Electron,
            quantity: MeshQuantity::EnergyFluxY,
            grid: Arc::new(Grid3D::zeros(1, 1, 1)),
        };
        assert_eq!(mesh.name(), "Electron_EnergyFlux_y");
        assert_eq!(FieldComponent::ALL[4].to_string(), "By");
        assert_eq!(PositionMomentum::Ypz.axis(), 1);
    }

    #[test]
    fn field_scale_classes() {
        let k = NormalizationConstants {
            electric: 2.0,
            magnetic: 3.0,
            energy: 4.0,
        };
        let scales: Vec<f32> = FieldComponent::ALL.iter().map(|c| c.scale(&k)).collect();
        assert_eq!(scales, [2.0, 2.0, 2.0, 3.0, 3.0, 3.0, 1.0, 1.0, 1.0]);
    }
}
