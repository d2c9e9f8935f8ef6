/// Dense 3-D array indexed `[x][y][z]`.
///
/// Storage is row-major over `(x, y, z)`; this is independent of the order
/// the producer wrote values in, see [`crate::reconstruct::to_3d`].
#[derive(Clone, Debug, PartialEq)]
pub struct Grid3D {
    dims: [usize; 3],
    data: Vec<f32>,
}

impl Grid3D {
    #[must_use]
    pub fn zeros(nx: usize, ny: usize, nz: usize) -> Self {
        Self {
            dims: [nx, ny, nz],
            data: vec![0.0; nx * ny * nz],
        }
    }

    #[must_use]
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        let [_, ny, nz] = self.dims;
        (x * ny + y) * nz + z
    }

    /// # Panics
    ///
    /// If the coordinate lies outside the grid.
    #[must_use]
    pub fn get(&self, x: usize, y: usize, z: usize) -> f32 {
        self.data[self.index(x, y, z)]
    }

    pub fn set(&mut self, x: usize, y: usize, z: usize, v: f32) {
        let i = self.index(x, y, z);
        self.data[i] = v;
    }

    /// Values in row-major `(x, y, z)` order.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Mean of every value, `0.0` for an empty grid.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().map(|&v| f64::from(v)).sum::<f64>() / self.data.len() as f64
    }
}

/// Dense 2-D array indexed `[row][col]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid2D {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Grid2D {
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// # Panics
    ///
    /// If the coordinate lies outside the grid.
    #[must_use]
    pub fn get(&self, r: usize, c: usize) -> f32 {
        self.data[r * self.cols + c]
    }

    pub fn set(&mut self, r: usize, c: usize, v: f32) {
        self.data[r * self.cols + c] = v;
    }

    pub fn row(&self, r: usize) -> &[f32] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks(self.cols.max(1)).take(self.rows)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}
