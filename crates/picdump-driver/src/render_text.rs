//! Text projections of a 3-D grid.
//!
//! Each output line is a space-separated tuple of coordinates followed by
//! the value. Two-dimensional outputs put a blank line after every row so
//! gnuplot's `splot` reads them as a surface.

use std::io::{self, Write};

use picdump_types::Grid3D;

use crate::projection::ProjectionMode;

/// Write `grid` reduced by `mode` to `out`.
///
/// # Errors
///
/// I/O errors from `out`, or [`io::ErrorKind::InvalidInput`] for
/// [`ProjectionMode::Vtk`], which is not a text format.
#[allow(clippy::many_single_char_names)]
pub fn write_projection<W: Write>(out: &mut W, grid: &Grid3D, mode: ProjectionMode) -> io::Result<()> {
    let [nx, ny, nz] = grid.dims();
    let (cx, cy, cz) = (nx / 2, ny / 2, nz / 2);

    match mode {
        ProjectionMode::Xyz => {
            for x in 0..nx {
                for y in 0..ny {
                    for z in 0..nz {
                        writeln!(out, "{x} {y} {z} {}", grid.get(x, y, z))?;
                    }
                    writeln!(out)?;
                }
                writeln!(out)?;
            }
        }
        ProjectionMode::Xy => {
            plane(out, nx, ny, |x, y| grid.get(x, y, cz))?;
        }
        ProjectionMode::Yz => {
            plane(out, ny, nz, |y, z| grid.get(cx, y, z))?;
        }
        ProjectionMode::Zx => {
            plane(out, nz, nx, |z, x| grid.get(x, cy, z))?;
        }
        ProjectionMode::X => line(out, nx, |x| grid.get(x, cy, cz))?,
        ProjectionMode::Y => line(out, ny, |y| grid.get(cx, y, cz))?,
        ProjectionMode::Z => line(out, nz, |z| grid.get(cx, cy, z))?,
        ProjectionMode::ZxAverage => {
            plane(out, nz, nx, |z, x| y_mean(grid, x, z))?;
        }
        ProjectionMode::XAverage => {
            for x in 0..nx {
                write!(out, "{x}")?;
                for band in y_bands(grid, x, cz) {
                    write!(out, " {band}")?;
                }
                writeln!(out)?;
            }
        }
        ProjectionMode::WholeAverage => {
            #[allow(clippy::cast_possible_truncation)]
            let mean = grid.mean() as f32;
            writeln!(out, "{mean}")?;
        }
        ProjectionMode::Vtk => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "vtk is not a text projection",
            ));
        }
    }
    Ok(())
}

/// Convenience wrapper returning the projection as a string.
#[must_use]
pub fn render_projection(grid: &Grid3D, mode: ProjectionMode) -> String {
    let mut buf = Vec::new();
    if write_projection(&mut buf, grid, mode).is_err() {
        return String::new();
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn plane<W: Write>(
    out: &mut W,
    rows: usize,
    cols: usize,
    value: impl Fn(usize, usize) -> f32,
) -> io::Result<()> {
    for a in 0..rows {
        for b in 0..cols {
            writeln!(out, "{a} {b} {}", value(a, b))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn line<W: Write>(out: &mut W, n: usize, value: impl Fn(usize) -> f32) -> io::Result<()> {
    for i in 0..n {
        writeln!(out, "{i} {}", value(i))?;
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn y_mean(grid: &Grid3D, x: usize, z: usize) -> f32 {
    let ny = grid.dims()[1];
    let sum: f32 = (0..ny).map(|y| grid.get(x, y, z)).sum();
    sum / ny as f32
}

/// Means over seven y-bands in the plane `z`.
///
/// Band `b` (1-based) covers `(b-1)·ny/8 < y ≤ b·ny/8`; cells at `y = 0` and
/// above `7·ny/8` fall outside every band.
#[allow(clippy::cast_precision_loss)]
fn y_bands(grid: &Grid3D, x: usize, z: usize) -> [f32; 7] {
    let ny = grid.dims()[1];
    let mut prefix = vec![0.0f32; ny.max(1)];
    for y in 1..ny {
        prefix[y] = prefix[y - 1] + grid.get(x, y, z);
    }
    let width = ny as f32 / 8.0;
    std::array::from_fn(|i| {
        let b = i + 1;
        (prefix[b * ny / 8] - prefix[(b - 1) * ny / 8]) / width
    })
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    /// `v = 100x + 10y + z` on a 2×2×2 grid.
    #[allow(clippy::cast_precision_loss)]
    fn cube() -> Grid3D {
        let mut g = Grid3D::zeros(2, 2, 2);
        for x in 0..2 {
            for y in 0..2 {
                for z in 0..2 {
                    g.set(x, y, z, (100 * x + 10 * y + z) as f32);
                }
            }
        }
        g
    }

    #[test]
    fn xy_slice_at_z_midplane() {
        assert_eq!(
            render_projection(&cube(), ProjectionMode::Xy),
            "0 0 1\n0 1 11\n\n1 0 101\n1 1 111\n\n"
        );
    }

    #[test]
    fn zx_slice_is_z_major() {
        assert_snapshot!(render_projection(&cube(), ProjectionMode::Zx), @r"
        0 0 10
        0 1 110

        1 0 11
        1 1 111
        ");
    }

    #[test]
    fn lines_through_centre() {
        assert_eq!(render_projection(&cube(), ProjectionMode::X), "0 11\n1 111\n");
        assert_eq!(render_projection(&cube(), ProjectionMode::Y), "0 101\n1 111\n");
        assert_eq!(render_projection(&cube(), ProjectionMode::Z), "0 110\n1 111\n");
    }

    #[test]
    fn zx_average_over_y() {
        assert_snapshot!(render_projection(&cube(), ProjectionMode::ZxAverage), @r"
        0 0 5
        0 1 105

        1 0 6
        1 1 106
        ");
    }

    #[test]
    fn zx_average_covers_every_x_on_flat_grids() {
        // nx > nz: every x column must appear.
        let g = Grid3D::zeros(4, 2, 1);
        let out = render_projection(&g, ProjectionMode::ZxAverage);
        assert_eq!(out.lines().filter(|l| !l.is_empty()).count(), 4);
    }

    #[test]
    fn whole_average() {
        assert_eq!(render_projection(&cube(), ProjectionMode::WholeAverage), "55.5\n");
    }

    #[test]
    #[allow(clippy::cast_precision_loss)]
    fn x_average_bands() {
        let mut g = Grid3D::zeros(1, 8, 1);
        for y in 0..8 {
            g.set(0, y, 0, y as f32);
        }
        assert_eq!(render_projection(&g, ProjectionMode::XAverage), "0 1 2 3 4 5 6 7\n");
    }

    #[test]
    fn xyz_has_blank_lines_between_rows() {
        let out = render_projection(&Grid3D::zeros(1, 2, 1), ProjectionMode::Xyz);
        assert_eq!(out, "0 0 0 0\n\n0 1 0 0\n\n\n");
    }

    #[test]
    fn vtk_is_not_text() {
        let err = write_projection(&mut Vec::new(), &cube(), ProjectionMode::Vtk).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
