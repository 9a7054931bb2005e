//! Core type definitions: dense samples and symmetric matrices

use crate::core::{check_dimension, Result, SVMError};
use serde::Serialize;

/// Ordered collection of fixed-dimension real points
///
/// Rows are stored contiguously; every row has the same dimension, which is
/// checked whenever a row is added.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Sample {
    dim: usize,
    data: Vec<f64>,
}

impl Sample {
    /// Create an empty sample of the given dimension
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            data: Vec::new(),
        }
    }

    /// Build a sample from rows, checking that all rows share one dimension
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let first = rows.first().ok_or(SVMError::EmptyDataset)?;
        let mut sample = Self::new(first.as_ref().len());
        for row in rows {
            sample.push(row.as_ref())?;
        }
        Ok(sample)
    }

    /// Build a sample from column vectors of equal length
    pub fn from_columns<C: AsRef<[f64]>>(columns: &[C]) -> Result<Self> {
        let size = columns.first().map_or(0, |c| c.as_ref().len());
        for column in columns {
            check_dimension(size, column.as_ref().len())?;
        }
        let mut sample = Self::new(columns.len());
        sample.data.reserve(size * columns.len());
        for i in 0..size {
            for column in columns {
                sample.data.push(column.as_ref()[i]);
            }
        }
        Ok(sample)
    }

    /// Append one point
    pub fn push(&mut self, row: &[f64]) -> Result<()> {
        check_dimension(self.dim, row.len())?;
        self.data.extend_from_slice(row);
        Ok(())
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.data.len() / self.dim
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row `i`
    ///
    /// # Panics
    /// Panics if `i >= len()`
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.data.chunks_exact(self.dim.max(1))
    }

    /// Copy of column `j`
    pub fn column(&self, j: usize) -> Vec<f64> {
        self.rows().map(|row| row[j]).collect()
    }

    /// Sample restricted to the given row indices, in that order
    pub fn select(&self, indices: &[usize]) -> Self {
        let mut sample = Self::new(self.dim);
        for &i in indices {
            sample.data.extend_from_slice(self.row(i));
        }
        sample
    }

    /// Per-dimension arithmetic mean
    pub fn mean(&self) -> Vec<f64> {
        let mut mean = vec![0.0; self.dim];
        for row in self.rows() {
            for (m, &x) in mean.iter_mut().zip(row) {
                *m += x;
            }
        }
        let n = self.len().max(1) as f64;
        mean.iter_mut().for_each(|m| *m /= n);
        mean
    }

    /// Per-dimension unbiased variance (divides by `n - 1`)
    pub fn variance(&self) -> Vec<f64> {
        let mean = self.mean();
        let mut variance = vec![0.0; self.dim];
        for row in self.rows() {
            for ((v, &x), &m) in variance.iter_mut().zip(row).zip(&mean) {
                *v += (x - m) * (x - m);
            }
        }
        let denominator = self.len().saturating_sub(1).max(1) as f64;
        variance.iter_mut().for_each(|v| *v /= denominator);
        variance
    }

    /// Per-dimension unbiased standard deviation
    pub fn standard_deviation(&self) -> Vec<f64> {
        self.variance().into_iter().map(f64::sqrt).collect()
    }

    /// Per-dimension minimum and maximum
    pub fn bounds(&self) -> (Vec<f64>, Vec<f64>) {
        let mut lower = vec![f64::INFINITY; self.dim];
        let mut upper = vec![f64::NEG_INFINITY; self.dim];
        for row in self.rows() {
            for (j, &x) in row.iter().enumerate() {
                lower[j] = lower[j].min(x);
                upper[j] = upper[j].max(x);
            }
        }
        (lower, upper)
    }
}

/// Dense symmetric matrix
///
/// `set` writes both `(i, j)` and `(j, i)` so the storage stays symmetric.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SymmetricMatrix {
    dim: usize,
    data: Vec<f64>,
}

impl SymmetricMatrix {
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            data: vec![0.0; dim * dim],
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.dim + j]
    }

    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.dim + j] = value;
        self.data[j * self.dim + i] = value;
    }

    /// `self += factor * other`
    pub fn add_scaled(&mut self, other: &SymmetricMatrix, factor: f64) {
        for (a, &b) in self.data.iter_mut().zip(&other.data) {
            *a += factor * b;
        }
    }

    /// Row `i` as a slice
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }
}
