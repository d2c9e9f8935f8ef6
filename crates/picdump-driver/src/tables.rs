//! Phase-space and energy-distribution tables.

use std::io::{self, Write};

use picdump_types::{EnergyDistribution, Grid2D};

/// Energy axis of an exported distribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnergyScale {
    /// Bin `i` sits at `(i + 0.5)·ΔE`.
    Linear,
    /// Bin `i` sits at `(i + 0.5)·ΔE·10^(10·i/n − 10)`, spanning ten
    /// decades below `ΔE`.
    LogLog,
}

/// Write `grid` as `row col value` triples, a blank line after each row.
///
/// `rows` and `cols` label the grid axes and must match its shape.
///
/// # Errors
///
/// I/O errors from `out`.
pub fn write_phase_table<W: Write>(
    out: &mut W,
    rows: &[f32],
    cols: &[f32],
    grid: &Grid2D,
) -> io::Result<()> {
    debug_assert_eq!((rows.len(), cols.len()), (grid.rows(), grid.cols()));
    for (a, values) in rows.iter().zip(grid.iter_rows()) {
        for (b, v) in cols.iter().zip(values) {
            writeln!(out, "{a} {b} {v}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Write an energy distribution with energies in eV.
///
/// `energy_unit` converts simulation energy to eV, see
/// [`NormalizationConstants::energy`](picdump_types::NormalizationConstants).
///
/// # Errors
///
/// I/O errors from `out`.
pub fn write_energy_table<W: Write>(
    out: &mut W,
    dist: &EnergyDistribution,
    scale: EnergyScale,
    energy_unit: f32,
) -> io::Result<()> {
    writeln!(out, "# energy(eV) population")?;
    match scale {
        EnergyScale::Linear => {
            let axis = linear_axis(dist.population.len(), dist.delta_energy, energy_unit);
            for (e, p) in axis.iter().zip(&dist.population) {
                writeln!(out, "{e} {p}")?;
            }
        }
        EnergyScale::LogLog => {
            let axis = loglog_axis(dist.loglog_population.len(), dist.delta_energy, energy_unit);
            for (e, p) in axis.iter().zip(&dist.loglog_population) {
                writeln!(out, "{e} {p}")?;
            }
        }
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn linear_axis(n: usize, delta: f32, unit: f32) -> Vec<f32> {
    (0..n).map(|i| (i as f32 + 0.5) * delta * unit).collect()
}

#[allow(clippy::cast_precision_loss)]
fn loglog_axis(n: usize, delta: f32, unit: f32) -> Vec<f64> {
    let decade_step = f64::from(10.0f32 / n as f32);
    let base = f64::from(delta * unit);
    (0..n)
        .map(|i| {
            let exponent = i as f64 * decade_step - 10.0;
            (i as f64 + 0.5) * base * 10f64.powf(exponent)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use picdump_types::SpeciesKind;

    use super::*;

    fn distribution() -> EnergyDistribution {
        EnergyDistribution {
            species: 0,
            kind: SpeciesKind::Ion,
            average_charge_rate: 1.0,
            average_energy: 2.0,
            delta_energy: 2.0,
            population: vec![3.0, 4.0],
            eimaxt: 10.0,
            loglog_population: vec![5.0, 6.0],
        }
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn phase_table_rows_then_blank() {
        let mut g = Grid2D::zeros(2, 2);
        g.set(0, 1, 7.0);
        g.set(1, 0, 8.0);
        let out = render(|w| write_phase_table(w, &[-0.5, 0.5], &[1.0, 2.0], &g));
        insta::assert_snapshot!(out, @r"
        -0.5 1 0
        -0.5 2 7

        0.5 1 8
        0.5 2 0
        ");
        assert!(out.ends_with("0.5 2 0\n\n"));
    }

    #[test]
    fn linear_energy_table() {
        let out = render(|w| write_energy_table(w, &distribution(), EnergyScale::Linear, 0.5));
        assert_eq!(out, "# energy(eV) population\n0.5 3\n1.5 4\n");
    }

    #[test]
    fn loglog_energy_table_spans_decades() {
        let out = render(|w| write_energy_table(w, &distribution(), EnergyScale::LogLog, 0.5));
        let rows: Vec<(f64, f64)> = out
            .lines()
            .skip(1)
            .map(|l| {
                let (e, p) = l.split_once(' ').unwrap();
                (e.parse().unwrap(), p.parse().unwrap())
            })
            .collect();
        assert_eq!(rows.len(), 2);
        // n = 2: exponents -10 and -5.
        assert!((rows[0].0 / 5e-11 - 1.0).abs() < 1e-9);
        assert!((rows[1].0 / 1.5e-5 - 1.0).abs() < 1e-9);
        assert_eq!((rows[0].1, rows[1].1), (5.0, 6.0));
    }
}
