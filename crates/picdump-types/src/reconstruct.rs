//! Flat producer-order arrays to indexed grids.
//!
//! The producer writes 3-D grids with `y` in the outer loop, `z` in the
//! middle and `x` innermost:
//!
//! ```text
//! i = (y * nz + z) * nx + x
//! ```
//!
//! 2-D histograms are written `x` fastest. Histograms over the `y` axis are
//! written one rank at a time, each rank covering `ny / parallel_number`
//! consecutive rows, and must be reassembled with [`departition_y`].

use crate::error::TypeError;
use crate::grid::{Grid2D, Grid3D};

fn check_len(field: &'static str, flat: &[f32], expected: usize) -> Result<(), TypeError> {
    if flat.len() != expected {
        return Err(TypeError::LengthMismatch {
            field,
            expected,
            actual: flat.len(),
        });
    }
    Ok(())
}

/// `out[x][y][z] = flat[i] * scale` in producer loop order.
///
/// # Errors
///
/// [`TypeError::LengthMismatch`] if `flat.len() != nx * ny * nz`.
pub fn to_3d(flat: &[f32], nx: usize, ny: usize, nz: usize, scale: f32) -> Result<Grid3D, TypeError> {
    check_len("grid", flat, nx * ny * nz)?;
    let mut out = Grid3D::zeros(nx, ny, nz);
    let mut values = flat.iter();
    for y in 0..ny {
        for z in 0..nz {
            for x in 0..nx {
                if let Some(&v) = values.next() {
                    out.set(x, y, z, v * scale);
                }
            }
        }
    }
    Ok(out)
}

impl Grid3D {
    /// Flatten back into producer loop order. Inverse of [`to_3d`] with a
    /// scale of 1.
    #[must_use]
    pub fn to_flat(&self) -> Vec<f32> {
        let [nx, ny, nz] = self.dims();
        let mut out = Vec::with_capacity(self.len());
        for y in 0..ny {
            for z in 0..nz {
                for x in 0..nx {
                    out.push(self.get(x, y, z));
                }
            }
        }
        out
    }
}

/// `out[x][y] = flat[y * nx + x]`.
///
/// # Errors
///
/// [`TypeError::LengthMismatch`] if `flat.len() != nx * ny`.
pub fn to_2d(flat: &[f32], nx: usize, ny: usize) -> Result<Grid2D, TypeError> {
    check_len("histogram", flat, nx * ny)?;
    let mut out = Grid2D::zeros(nx, ny);
    for (i, &v) in flat.iter().enumerate() {
        out.set(i % nx, i / nx, v);
    }
    Ok(out)
}

/// Reassemble a rank-ordered `y` histogram into `out[global_y][bin]`.
///
/// Each rank owns `ny_per_rank = ny_total / parallel_number` rows and
/// writes them bin-major:
///
/// ```text
/// rank      = i / (ny_per_rank * bins)
/// local     = i - rank * ny_per_rank * bins
/// bin       = local / ny_per_rank
/// global_y  = rank * ny_per_rank + local % ny_per_rank
/// ```
///
/// # Errors
///
/// [`TypeError::IndivisiblePartition`] when the ranks do not split `y`
/// evenly, [`TypeError::LengthMismatch`] for a wrong input length.
pub fn departition_y(
    flat: &[f32],
    ny_total: usize,
    parallel_number: usize,
    momentum_bins: usize,
) -> Result<Grid2D, TypeError> {
    if parallel_number == 0 || ny_total % parallel_number != 0 {
        return Err(TypeError::IndivisiblePartition {
            ny: ny_total,
            parallel_number,
        });
    }
    check_len("histogram", flat, ny_total * momentum_bins)?;

    let mut out = Grid2D::zeros(ny_total, momentum_bins);
    let ny_per_rank = ny_total / parallel_number;
    let block = ny_per_rank * momentum_bins;
    if block == 0 {
        return Ok(out);
    }
    for (i, &v) in flat.iter().enumerate() {
        let rank = i / block;
        let local = i - rank * block;
        let bin = local / ny_per_rank;
        let global_y = rank * ny_per_rank + local % ny_per_rank;
        out.set(global_y, bin, v);
    }
    Ok(out)
}
