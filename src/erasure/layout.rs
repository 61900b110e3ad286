//! Row/column layout math for the extended erasure matrix.
//!
//! All stripes of an encoded blob form a rectangular matrix with
//! `rows = stripes` and `cols = n = k + p`; each cell `(row, col)` is one
//! namespaced leaf. This module is pure index math: conversions between
//! `(row, col)` and row-major linear indices, transpose maps, data/parity
//! column classification, and reshaping of flat leaf sequences. No hashing.

use crate::erasure::encoder::EncodeInfo;
use crate::error::{DaError, DaResult};

/// Canonical layout of an extended erasure matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatrixLayout {
    /// Number of stripes.
    pub rows: usize,
    /// Total shards per stripe (n).
    pub cols: usize,
    /// Data columns (k).
    pub data_cols: usize,
    /// Parity columns (p).
    pub parity_cols: usize,
    /// Shard payload size, carried for diagnostics only.
    pub share_bytes: usize,
}

impl MatrixLayout {
    pub fn new(rows: usize, data_cols: usize, parity_cols: usize, share_bytes: usize) -> DaResult<Self> {
        if data_cols == 0 || parity_cols == 0 {
            return Err(DaError::Validation(
                "layout requires data and parity columns".into(),
            ));
        }
        Ok(Self {
            rows,
            cols: data_cols + parity_cols,
            data_cols,
            parity_cols,
            share_bytes,
        })
    }

    /// Build the layout for an encoded blob.
    pub fn from_encode_info(info: &EncodeInfo) -> DaResult<Self> {
        Self::new(
            info.stripes,
            info.params.data_shards,
            info.params.parity_shards(),
            info.params.share_bytes,
        )
    }

    #[inline]
    pub const fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub const fn total_leaves(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_data_col(&self, col: usize) -> DaResult<bool> {
        self.check_col(col)?;
        Ok(col < self.data_cols)
    }

    pub fn is_parity_col(&self, col: usize) -> DaResult<bool> {
        Ok(!self.is_data_col(col)?)
    }

    /* --------------------------- Index conversions -------------------------- */

    /// `(row, col)` → row-major linear index.
    pub fn index(&self, row: usize, col: usize) -> DaResult<usize> {
        self.check_row(row)?;
        self.check_col(col)?;
        Ok(row * self.cols + col)
    }

    /// Row-major linear index → `(row, col)`.
    pub fn coords(&self, index: usize) -> DaResult<(usize, usize)> {
        if index >= self.total_leaves() {
            return Err(DaError::Validation(format!(
                "index out of range (0..{}): {index}",
                self.total_leaves()
            )));
        }
        Ok((index / self.cols, index % self.cols))
    }

    /// Row-major index in `(rows, cols)` → row-major index in the transposed
    /// shape `(cols, rows)`.
    pub fn transpose_index(&self, index: usize) -> DaResult<usize> {
        let (r, c) = self.coords(index)?;
        Ok(c * self.rows + r)
    }

    /* ---------------------------- Row/column sets --------------------------- */

    /// Linear indices covering one row, left→right.
    pub fn row_indices(&self, row: usize) -> DaResult<Vec<usize>> {
        self.check_row(row)?;
        let base = row * self.cols;
        Ok((base..base + self.cols).collect())
    }

    /// Linear indices covering one column, top→bottom.
    pub fn col_indices(&self, col: usize) -> DaResult<Vec<usize>> {
        self.check_col(col)?;
        Ok((0..self.rows).map(|r| r * self.cols + col).collect())
    }

    /* ----------------------------- Reshaping -------------------------------- */

    /// Reshape a flat row-major slice into rows.
    pub fn rows_of<'a, T>(&self, flat: &'a [T]) -> DaResult<Vec<&'a [T]>> {
        self.check_flat_len(flat.len())?;
        Ok(flat.chunks(self.cols).collect())
    }

    /// Group a flat row-major slice by column (top→bottom order).
    pub fn cols_of<'a, T>(&self, flat: &'a [T]) -> DaResult<Vec<Vec<&'a T>>> {
        self.check_flat_len(flat.len())?;
        let mut out: Vec<Vec<&T>> = (0..self.cols).map(|_| Vec::with_capacity(self.rows)).collect();
        for (i, item) in flat.iter().enumerate() {
            out[i % self.cols].push(item);
        }
        Ok(out)
    }

    /* ------------------------------- Guards ---------------------------------- */

    fn check_row(&self, row: usize) -> DaResult<()> {
        if row >= self.rows {
            return Err(DaError::Validation(format!(
                "row out of range (0..{}): {row}",
                self.rows
            )));
        }
        Ok(())
    }

    fn check_col(&self, col: usize) -> DaResult<()> {
        if col >= self.cols {
            return Err(DaError::Validation(format!(
                "col out of range (0..{}): {col}",
                self.cols
            )));
        }
        Ok(())
    }

    fn check_flat_len(&self, len: usize) -> DaResult<()> {
        if len != self.total_leaves() {
            return Err(DaError::Validation(format!(
                "expected {} leaves (got {len}) for shape {:?}",
                self.total_leaves(),
                self.shape()
            )));
        }
        Ok(())
    }
}

/* --------------------------------- Tests ----------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> MatrixLayout {
        // 3 stripes of RS(2, 4): shape (3, 4).
        MatrixLayout::new(3, 2, 2, 16).unwrap()
    }

    #[test]
    fn index_roundtrip() {
        let l = layout();
        for idx in 0..l.total_leaves() {
            let (r, c) = l.coords(idx).unwrap();
            assert_eq!(l.index(r, c).unwrap(), idx);
        }
        assert!(l.coords(12).is_err());
        assert!(l.index(3, 0).is_err());
        assert!(l.index(0, 4).is_err());
    }

    #[test]
    fn data_parity_classification() {
        let l = layout();
        assert!(l.is_data_col(0).unwrap());
        assert!(l.is_data_col(1).unwrap());
        assert!(l.is_parity_col(2).unwrap());
        assert!(l.is_parity_col(3).unwrap());
        assert!(l.is_data_col(4).is_err());
    }

    #[test]
    fn row_and_col_indices() {
        let l = layout();
        assert_eq!(l.row_indices(1).unwrap(), vec![4, 5, 6, 7]);
        assert_eq!(l.col_indices(2).unwrap(), vec![2, 6, 10]);
    }

    #[test]
    fn transpose_mapping() {
        let l = layout();
        // (1, 2) in (3, 4) → (2, 1) in (4, 3) → linear 2*3 + 1 = 7.
        let idx = l.index(1, 2).unwrap();
        assert_eq!(l.transpose_index(idx).unwrap(), 7);
    }

    #[test]
    fn reshape_helpers() {
        let l = layout();
        let flat: Vec<u32> = (0..12).collect();
        let rows = l.rows_of(&flat).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2], &[8, 9, 10, 11]);

        let cols = l.cols_of(&flat).unwrap();
        assert_eq!(cols.len(), 4);
        assert_eq!(cols[1], vec![&1, &5, &9]);

        assert!(l.rows_of(&flat[..10]).is_err());
    }
}
