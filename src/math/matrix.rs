use serde::{Serialize, Deserialize};

use crate::error::ModelError;

/// Row-major dense matrix used for layer weights and biases.
///
/// The on-disk form is `{"rows", "cols", "data"}` with `data` as nested rows,
/// which is what saved models carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows],
        }
    }

    /// Builds a matrix from nested rows. Ragged input is rejected.
    pub fn from_data(data: Vec<Vec<f64>>) -> Result<Matrix, ModelError> {
        let rows = data.len();
        let cols = data.first().map_or(0, |r| r.len());
        if let Some(bad) = data.iter().position(|r| r.len() != cols) {
            return Err(ModelError::Shape(format!(
                "row {} has {} columns, expected {}",
                bad, data[bad].len(), cols
            )));
        }
        Ok(Matrix { rows, cols, data })
    }

    /// Checks that the declared `rows`/`cols` agree with `data`.
    ///
    /// Deserialized matrices are only trusted after this passes.
    pub fn check_consistent(&self) -> Result<(), ModelError> {
        if self.data.len() != self.rows || self.data.iter().any(|r| r.len() != self.cols) {
            return Err(ModelError::Shape(format!(
                "matrix declares {}x{} but its data does not match",
                self.rows, self.cols
            )));
        }
        Ok(())
    }

    /// Computes the row vector `input · self`.
    ///
    /// `input` must have exactly `rows` elements; the result has `cols`.
    pub fn left_mul(&self, input: &[f64]) -> Result<Vec<f64>, ModelError> {
        if input.len() != self.rows {
            return Err(ModelError::Shape(format!(
                "cannot multiply a {}-vector by a {}x{} matrix",
                input.len(), self.rows, self.cols
            )));
        }
        let mut out = vec![0.0; self.cols];
        for (x, row) in input.iter().zip(&self.data) {
            if *x == 0.0 {
                continue;
            }
            for (acc, w) in out.iter_mut().zip(row) {
                *acc += x * w;
            }
        }
        Ok(out)
    }

    /// Returns the single row of a `1 x n` matrix.
    pub fn as_row(&self) -> Option<&[f64]> {
        match self.data.as_slice() {
            [row] => Some(row.as_slice()),
            _ => None,
        }
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}
