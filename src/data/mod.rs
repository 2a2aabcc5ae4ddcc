//! data — the two-part data container shared by models, parameters, and info.
//!
//! Purpose
//! -------
//! Hold observations, parameter sets, and diagnostic pages in one shape: an
//! optional vector, an optional matrix, optional weights, a title, and row
//! names. Models read observations from it, keep their parameters in it, and
//! report named diagnostics through it.
//!
//! Key behaviors
//! -------------
//! - Size and allocate parts (`alloc`, `filled`, `from_vector`, `from_matrix`).
//! - Resolve the data width used by data-width model sizes ([`Data::width`]).
//! - Flatten to and from a single parameter vector (`pack` / `unpack`) in a
//!   fixed order: vector entries first, then the matrix in row-major order.
//! - Row selection for bootstrap resampling and NaN bookkeeping for
//!   imputation.
//!
//! Invariants & assumptions
//! ------------------------
//! - A part of size zero is stored as `None`; an allocated vector or matrix is
//!   never empty.
//! - When both parts are present and used as observations, `vector[i]` and
//!   `matrix.row(i)` describe the same observation.
//! - `error` is `None` on every container produced by this module; callers
//!   that build containers by hand may set it to flag a failed construction.
//!
//! Conventions
//! -----------
//! - Cells are addressed through [`Cell`], which distinguishes vector and
//!   matrix positions.
//! - Named entries (`set_named` / `get_named`) live in the vector with the
//!   name in `row_names`; this is how `info` pages store diagnostics.
use std::io::{self, Write};

use ndarray::{Array1, Array2, ArrayView1, Axis};

use crate::model::errors::{ModelError, ModelResult};

/// Address of a single cell in a [`Data`] container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Vector(usize),
    Matrix(usize, usize),
}

/// Vector + matrix container with optional weights and labels.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Data {
    pub vector: Option<Array1<f64>>,
    pub matrix: Option<Array2<f64>>,
    pub weights: Option<Array1<f64>>,
    pub title: String,
    pub row_names: Vec<String>,
    pub error: Option<char>,
}

impl Data {
    /// Zero-filled container with a vector of `vsize` and a `rows × cols`
    /// matrix. Parts of size zero are left absent.
    pub fn alloc(vsize: usize, rows: usize, cols: usize) -> Self {
        let vector = (vsize > 0).then(|| Array1::zeros(vsize));
        let matrix = (rows > 0 && cols > 0).then(|| Array2::zeros((rows, cols)));
        Self { vector, matrix, ..Self::default() }
    }

    /// A `rows × cols` matrix with every cell set to `value`.
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        let matrix = (rows > 0 && cols > 0).then(|| Array2::from_elem((rows, cols), value));
        Self { matrix, ..Self::default() }
    }

    pub fn from_vector(vector: Array1<f64>) -> Self {
        let vector = (!vector.is_empty()).then_some(vector);
        Self { vector, ..Self::default() }
    }

    pub fn from_matrix(matrix: Array2<f64>) -> Self {
        let matrix = (!matrix.is_empty()).then_some(matrix);
        Self { matrix, ..Self::default() }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_weights(mut self, weights: Array1<f64>) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn vector_len(&self) -> usize {
        self.vector.as_ref().map_or(0, Array1::len)
    }

    pub fn rows(&self) -> usize {
        self.matrix.as_ref().map_or(0, Array2::nrows)
    }

    pub fn cols(&self) -> usize {
        self.matrix.as_ref().map_or(0, Array2::ncols)
    }

    /// Width used when a model size is declared as data-width.
    ///
    /// Matrix column count if the matrix is non-empty; otherwise 1 when a
    /// vector is present (one scalar dimension); otherwise 0.
    pub fn width(&self) -> usize {
        match self.cols() {
            0 if self.vector_len() > 0 => 1,
            cols => cols,
        }
    }

    /// Number of observations: matrix rows, or vector length without a matrix.
    pub fn observation_count(&self) -> usize {
        match self.rows() {
            0 => self.vector_len(),
            rows => rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vector.is_none() && self.matrix.is_none()
    }

    /// Number of entries produced by [`Data::pack`].
    pub fn packed_len(&self) -> usize {
        self.vector_len() + self.rows() * self.cols()
    }

    /// Flatten vector then matrix (row-major) into a single vector.
    pub fn pack(&self) -> Array1<f64> {
        self.values().collect()
    }

    /// Inverse of [`Data::pack`]: overwrite the cells from `packed`.
    ///
    /// # Errors
    /// `PackLengthMismatch` if `packed` does not have exactly
    /// [`Data::packed_len`] entries; the container is left untouched.
    pub fn unpack(&mut self, packed: ArrayView1<'_, f64>) -> ModelResult<()> {
        let expected = self.packed_len();
        if packed.len() != expected {
            return Err(ModelError::PackLengthMismatch { expected, found: packed.len() });
        }
        let mut source = packed.iter();
        let cells = self
            .vector
            .iter_mut()
            .flat_map(|v| v.iter_mut())
            .chain(self.matrix.iter_mut().flat_map(|m| m.iter_mut()));
        for (cell, &value) in cells.zip(&mut source) {
            *cell = value;
        }
        Ok(())
    }

    /// Every value, vector first then matrix in row-major order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.vector
            .iter()
            .flat_map(|v| v.iter().copied())
            .chain(self.matrix.iter().flat_map(|m| m.iter().copied()))
    }

    /// The first observation: matrix row 0, else the leading vector entry.
    pub fn first_row(&self) -> Option<Array1<f64>> {
        if let Some(m) = self.matrix.as_ref() {
            return Some(m.row(0).to_owned());
        }
        self.vector.as_ref().map(|v| Array1::from_elem(1, v[0]))
    }

    /// Observation `i` as a row: the matrix row, or the vector entry when no
    /// matrix is present.
    pub fn observation(&self, i: usize) -> Option<Array1<f64>> {
        match (&self.matrix, &self.vector) {
            (Some(m), _) if i < m.nrows() => Some(m.row(i).to_owned()),
            (None, Some(v)) if i < v.len() => Some(Array1::from_elem(1, v[i])),
            _ => None,
        }
    }

    /// New container holding the observations at `indices`, in order.
    ///
    /// Vector, matrix, and weights are resampled together; labels are
    /// dropped because repeated rows make them ambiguous.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let vector = self.vector.as_ref().map(|v| v.select(Axis(0), indices));
        let matrix = self.matrix.as_ref().map(|m| m.select(Axis(0), indices));
        let weights = self.weights.as_ref().map(|w| w.select(Axis(0), indices));
        Self { vector, matrix, weights, title: self.title.clone(), ..Self::default() }
    }

    pub fn get(&self, cell: Cell) -> Option<f64> {
        match cell {
            Cell::Vector(i) => self.vector.as_ref().and_then(|v| v.get(i).copied()),
            Cell::Matrix(r, c) => self.matrix.as_ref().and_then(|m| m.get((r, c)).copied()),
        }
    }

    /// Overwrite one cell; returns `false` if the cell does not exist.
    pub fn set(&mut self, cell: Cell, value: f64) -> bool {
        let slot = match cell {
            Cell::Vector(i) => self.vector.as_mut().and_then(|v| v.get_mut(i)),
            Cell::Matrix(r, c) => self.matrix.as_mut().and_then(|m| m.get_mut((r, c))),
        };
        match slot {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Cells holding NaN, vector first then matrix in row-major order.
    pub fn nan_cells(&self) -> Vec<Cell> {
        let vector_cells = self.vector.iter().flat_map(|v| {
            v.iter().enumerate().filter(|(_, x)| x.is_nan()).map(|(i, _)| Cell::Vector(i))
        });
        let matrix_cells = self.matrix.iter().flat_map(|m| {
            m.indexed_iter().filter(|(_, x)| x.is_nan()).map(|((r, c), _)| Cell::Matrix(r, c))
        });
        vector_cells.chain(matrix_cells).collect()
    }

    pub fn nan_count(&self) -> usize {
        self.values().filter(|x| x.is_nan()).count()
    }

    /// Mean of the non-NaN values in matrix column `col`, if any exist.
    pub fn column_mean(&self, col: usize) -> Option<f64> {
        let m = self.matrix.as_ref()?;
        if col >= m.ncols() {
            return None;
        }
        let (sum, n) = m
            .column(col)
            .iter()
            .filter(|x| !x.is_nan())
            .fold((0.0, 0usize), |(s, n), &x| (s + x, n + 1));
        (n > 0).then(|| sum / n as f64)
    }

    /// Insert or update a named entry in the vector part.
    pub fn set_named(&mut self, name: &str, value: f64) {
        if let Some(i) = self.row_names.iter().position(|n| n == name) {
            if let Some(slot) = self.vector.as_mut().and_then(|v| v.get_mut(i)) {
                *slot = value;
                return;
            }
        }
        let mut values = self.vector.take().map(Array1::into_raw_vec).unwrap_or_default();
        self.row_names.resize(values.len(), String::new());
        values.push(value);
        self.row_names.push(name.to_string());
        self.vector = Some(Array1::from(values));
    }

    pub fn get_named(&self, name: &str) -> Option<f64> {
        let i = self.row_names.iter().position(|n| n == name)?;
        self.vector.as_ref().and_then(|v| v.get(i).copied())
    }

    /// Plain-text rendering: title, then one line per row.
    pub fn print(&self, out: &mut dyn Write) -> io::Result<()> {
        if !self.title.is_empty() {
            writeln!(out, "{}", self.title)?;
        }
        let rows = self.vector_len().max(self.rows());
        for i in 0..rows {
            let mut line = String::new();
            if let Some(name) = self.row_names.get(i).filter(|n| !n.is_empty()) {
                line.push_str(name);
                line.push('\t');
            }
            if let Some(x) = self.vector.as_ref().and_then(|v| v.get(i)) {
                line.push_str(&format!("{x}"));
            }
            if let Some(m) = self.matrix.as_ref().filter(|m| i < m.nrows()) {
                for x in m.row(i) {
                    if !line.is_empty() {
                        line.push('\t');
                    }
                    line.push_str(&format!("{x}"));
                }
            }
            writeln!(out, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Width resolution and allocation of absent parts.
    // - Pack order and length checking on unpack.
    // - Named entries and NaN bookkeeping.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Width follows the matrix columns, then the vector, then zero.
    //
    // Given
    // -----
    // - A 4×3 matrix, a vector-only container, and an empty container.
    //
    // Expect
    // ------
    // - Widths 3, 1 and 0.
    fn width_prefers_matrix_then_vector() {
        // Arrange
        let matrix = Data::alloc(0, 4, 3);
        let vector = Data::from_vector(array![1.0, 2.0]);
        let empty = Data::default();

        // Act / Assert
        assert_eq!(matrix.width(), 3);
        assert_eq!(vector.width(), 1);
        assert_eq!(empty.width(), 0);
    }

    #[test]
    // Purpose
    // -------
    // `alloc` leaves zero-sized parts absent.
    //
    // Given
    // -----
    // - `alloc(2, 0, 5)`.
    //
    // Expect
    // ------
    // - A vector of two zeros and no matrix.
    fn alloc_skips_empty_parts() {
        // Act
        let d = Data::alloc(2, 0, 5);

        // Assert
        assert_eq!(d.vector, Some(array![0.0, 0.0]));
        assert!(d.matrix.is_none());
        assert_eq!(d.packed_len(), 2);
    }

    #[test]
    // Purpose
    // -------
    // Packing lists the vector first, then the matrix row by row.
    //
    // Given
    // -----
    // - vector [1, 2], matrix [[3, 4], [5, 6]].
    //
    // Expect
    // ------
    // - [1, 2, 3, 4, 5, 6], and unpacking writes back in the same order.
    fn pack_orders_vector_then_matrix_rows() {
        // Arrange
        let mut d = Data {
            vector: Some(array![1.0, 2.0]),
            matrix: Some(array![[3.0, 4.0], [5.0, 6.0]]),
            ..Data::default()
        };

        // Act
        let packed = d.pack();
        d.unpack(array![10.0, 20.0, 30.0, 40.0, 50.0, 60.0].view()).unwrap();

        // Assert
        assert_eq!(packed, array![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(d.matrix, Some(array![[30.0, 40.0], [50.0, 60.0]]));
    }

    #[test]
    // Purpose
    // -------
    // Unpacking the wrong number of values fails without touching the data.
    //
    // Given
    // -----
    // - A 2-entry vector and a 3-entry packed input.
    //
    // Expect
    // ------
    // - `PackLengthMismatch { expected: 2, found: 3 }`; vector unchanged.
    fn unpack_rejects_wrong_length() {
        // Arrange
        let mut d = Data::from_vector(array![1.0, 2.0]);

        // Act
        let err = d.unpack(array![0.0, 0.0, 0.0].view()).unwrap_err();

        // Assert
        assert_eq!(err, ModelError::PackLengthMismatch { expected: 2, found: 3 });
        assert_eq!(d.vector, Some(array![1.0, 2.0]));
    }

    #[test]
    // Purpose
    // -------
    // Named entries are appended once and updated in place afterwards.
    //
    // Given
    // -----
    // - Two writes to "log-likelihood" and one to "iterations".
    //
    // Expect
    // ------
    // - Two entries; the first holds the latest value.
    fn set_named_updates_in_place() {
        // Arrange
        let mut info = Data::default();

        // Act
        info.set_named("log-likelihood", -3.0);
        info.set_named("iterations", 12.0);
        info.set_named("log-likelihood", -2.5);

        // Assert
        assert_eq!(info.vector_len(), 2);
        assert_eq!(info.get_named("log-likelihood"), Some(-2.5));
        assert_eq!(info.get_named("iterations"), Some(12.0));
        assert_eq!(info.get_named("missing"), None);
    }

    #[test]
    // Purpose
    // -------
    // NaN cells are found in both parts and counted consistently.
    //
    // Given
    // -----
    // - vector [NaN, 1], matrix [[1, NaN], [NaN, 2]].
    //
    // Expect
    // ------
    // - Three cells in pack order.
    fn nan_cells_cover_both_parts() {
        // Arrange
        let d = Data {
            vector: Some(array![f64::NAN, 1.0]),
            matrix: Some(array![[1.0, f64::NAN], [f64::NAN, 2.0]]),
            ..Data::default()
        };

        // Act
        let cells = d.nan_cells();

        // Assert
        assert_eq!(cells, vec![Cell::Vector(0), Cell::Matrix(0, 1), Cell::Matrix(1, 0)]);
        assert_eq!(d.nan_count(), 3);
        assert_eq!(d.column_mean(1), Some(2.0));
    }

    #[test]
    // Purpose
    // -------
    // Resampling keeps vector and matrix rows aligned.
    //
    // Given
    // -----
    // - vector [1, 2, 3], matrix rows [10], [20], [30], indices [2, 2, 0].
    //
    // Expect
    // ------
    // - vector [3, 3, 1] and matrix rows [30], [30], [10].
    fn select_rows_keeps_parts_aligned() {
        // Arrange
        let d = Data {
            vector: Some(array![1.0, 2.0, 3.0]),
            matrix: Some(array![[10.0], [20.0], [30.0]]),
            ..Data::default()
        };

        // Act
        let s = d.select_rows(&[2, 2, 0]);

        // Assert
        assert_eq!(s.vector, Some(array![3.0, 3.0, 1.0]));
        assert_eq!(s.matrix, Some(array![[30.0], [30.0], [10.0]]));
    }
}
