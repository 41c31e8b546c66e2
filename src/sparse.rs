//! A minimal row-major sparse matrix, used to store the constraint matrix of a [Problem](crate::Problem).
//!
//! Rows are kept in a growable vector, so appending a row is amortized O(1)
//! and removing the last `k` rows only touches those rows.
use fnv::FnvHashMap as HashMap;

use crate::error::ProblemError;

/// A sparse row: `(column, value)` pairs sorted by column, without zeros or duplicates
pub type SparseRow = Vec<(usize, f64)>;

/// A two-dimensional sparse matrix of `f64`
#[derive(Clone, Debug, PartialEq, Default)]
pub struct SparseMatrix {
    num_cols: usize,
    rows: Vec<SparseRow>,
}

impl SparseMatrix {
    /// Creates an all-zero matrix of the given shape
    pub fn new(num_rows: usize, num_cols: usize) -> Self {
        SparseMatrix {
            num_cols,
            rows: vec![vec![]; num_rows],
        }
    }

    /// Builds a matrix from dense rows. Every row must have `num_cols` entries.
    ///
    /// ```
    /// # use polylp::SparseMatrix;
    /// let m = SparseMatrix::from_dense(3, &[vec![1., 1., 0.], vec![1., 0., 1.]]).unwrap();
    /// assert_eq!(m.shape(), (2, 3));
    /// assert_eq!(m.nnz(), 4);
    /// ```
    pub fn from_dense<R: AsRef<[f64]>>(num_cols: usize, rows: &[R]) -> Result<Self, ProblemError> {
        let mut matrix = SparseMatrix::new(0, num_cols);
        for row in rows {
            matrix.push_dense_row(row.as_ref())?;
        }
        Ok(matrix)
    }

    /// Builds a matrix from `(row, column, value)` triples.
    /// When the same position appears twice, the last value wins.
    pub fn from_triples<I>(num_rows: usize, num_cols: usize, triples: I) -> Result<Self, ProblemError>
    where
        I: IntoIterator<Item = (usize, usize, f64)>,
    {
        let mut matrix = SparseMatrix::new(num_rows, num_cols);
        for (row, col, value) in triples {
            matrix.set(row, col, value)?;
        }
        Ok(matrix)
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.num_cols)
    }

    /// Number of rows
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    /// Number of stored non-zero entries
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// The value at the given position, zero if nothing is stored there
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.rows
            .get(row)
            .and_then(|r| r.binary_search_by_key(&col, |&(c, _)| c).ok().map(|i| r[i].1))
            .unwrap_or(0.)
    }

    /// Stores a value. Storing zero removes the entry.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<(), ProblemError> {
        self.check_entry(row, col)?;
        set_in_row(&mut self.rows[row], col, value);
        Ok(())
    }

    /// The stored entries of a row
    pub fn row(&self, row: usize) -> &[(usize, f64)] {
        &self.rows[row]
    }

    /// Iterates over the rows
    pub fn rows(&self) -> impl Iterator<Item = &[(usize, f64)]> + '_ {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Appends a dense row of exactly `num_cols` values
    pub fn push_dense_row(&mut self, row: &[f64]) -> Result<(), ProblemError> {
        if row.len() != self.num_cols {
            return Err(ProblemError::ShapeMismatch {
                what: "matrix row",
                expected: self.num_cols,
                found: row.len(),
            });
        }
        self.rows.push(
            row.iter()
                .enumerate()
                .filter(|(_, &v)| v != 0.)
                .map(|(c, &v)| (c, v))
                .collect(),
        );
        Ok(())
    }

    /// Appends a row given as `(column, value)` pairs in any order.
    /// Coefficients given twice for the same column are summed.
    pub fn push_sparse_row<I>(&mut self, entries: I) -> Result<(), ProblemError>
    where
        I: IntoIterator<Item = (usize, f64)>,
    {
        let entries: Vec<(usize, f64)> = entries.into_iter().collect();
        if let Some(&(index, _)) = entries.iter().find(|&&(c, _)| c >= self.num_cols) {
            return Err(ProblemError::IndexOutOfRange {
                index,
                num_cols: self.num_cols,
            });
        }
        self.rows.push(merge_terms(entries));
        Ok(())
    }

    /// Drops the last `n` rows
    pub fn remove_last_rows(&mut self, n: usize) -> Result<(), ProblemError> {
        if n > self.rows.len() {
            return Err(ProblemError::RowUnderflow {
                requested: n,
                available: self.rows.len(),
            });
        }
        self.rows.truncate(self.rows.len() - n);
        Ok(())
    }

    /// Iterates over the non-zero entries as `(row, column, value)`, row by row
    pub fn iter_coordinates(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(i, row)| row.iter().map(move |&(j, v)| (i, j, v)))
    }

    /// All the non-zero entries as `(row, column, value)` triples
    pub fn to_coordinates(&self) -> Vec<(usize, usize, f64)> {
        self.iter_coordinates().collect()
    }

    /// Dense copy of the matrix, mostly useful for debugging small problems
    pub fn to_dense(&self) -> Vec<Vec<f64>> {
        self.rows
            .iter()
            .map(|row| {
                let mut dense = vec![0.; self.num_cols];
                for &(c, v) in row {
                    dense[c] = v;
                }
                dense
            })
            .collect()
    }

    fn check_entry(&self, row: usize, col: usize) -> Result<(), ProblemError> {
        if row >= self.rows.len() || col >= self.num_cols {
            return Err(ProblemError::EntryOutOfRange {
                row,
                col,
                rows: self.rows.len(),
                cols: self.num_cols,
            });
        }
        Ok(())
    }
}

/// Sums the coefficients given for the same column, drops zeros and sorts by column
pub(crate) fn merge_terms<I>(entries: I) -> SparseRow
where
    I: IntoIterator<Item = (usize, f64)>,
{
    let mut merged: HashMap<usize, f64> = HashMap::default();
    for (col, value) in entries {
        *merged.entry(col).or_default() += value;
    }
    let mut row: SparseRow = merged.into_iter().filter(|&(_, v)| v != 0.).collect();
    row.sort_unstable_by_key(|&(c, _)| c);
    row
}

/// Overwrites one coefficient of a sorted row. Writing zero removes the entry.
pub(crate) fn set_in_row(row: &mut SparseRow, col: usize, value: f64) {
    match row.binary_search_by_key(&col, |&(c, _)| c) {
        Ok(i) if value == 0. => {
            row.remove(i);
        }
        Ok(i) => row[i].1 = value,
        Err(_) if value == 0. => {}
        Err(i) => row.insert(i, (col, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::SparseMatrix;
    use crate::error::ProblemError;

    #[test]
    fn dense_and_triples_agree() {
        let dense = SparseMatrix::from_dense(3, &[[1., 1., 0.], [1., 0., 1.]]).unwrap();
        let coord =
            SparseMatrix::from_triples(2, 3, vec![(0, 0, 1.), (0, 1, 1.), (1, 0, 1.), (1, 2, 1.)])
                .unwrap();
        assert_eq!(dense, coord);
        assert_eq!(
            dense.to_coordinates(),
            vec![(0, 0, 1.), (0, 1, 1.), (1, 0, 1.), (1, 2, 1.)]
        );
    }

    #[test]
    fn sparse_rows_are_merged_and_sorted() {
        let mut m = SparseMatrix::new(0, 4);
        m.push_sparse_row(vec![(3, 2.), (1, -1.), (3, 1.), (2, 0.)]).unwrap();
        assert_eq!(m.row(0), &[(1, -1.), (3, 3.)]);
    }

    #[test]
    fn rejects_out_of_range_entries() {
        let mut m = SparseMatrix::new(1, 2);
        assert_eq!(
            m.push_sparse_row(vec![(2, 1.)]),
            Err(ProblemError::IndexOutOfRange {
                index: 2,
                num_cols: 2
            })
        );
        assert!(m.set(1, 0, 1.).is_err());
        assert!(m.push_dense_row(&[1.]).is_err());
        assert_eq!(m.num_rows(), 1);
    }

    #[test]
    fn setting_zero_removes_entry() {
        let mut m = SparseMatrix::new(1, 2);
        m.set(0, 1, 5.).unwrap();
        assert_eq!(m.get(0, 1), 5.);
        m.set(0, 1, 0.).unwrap();
        assert_eq!(m.nnz(), 0);
    }

    #[test]
    fn remove_last_rows() {
        let mut m = SparseMatrix::from_dense(2, &[[1., 0.], [0., 1.], [1., 1.]]).unwrap();
        m.remove_last_rows(2).unwrap();
        assert_eq!(m.to_dense(), vec![vec![1., 0.]]);
        assert!(matches!(
            m.remove_last_rows(2),
            Err(ProblemError::RowUnderflow {
                requested: 2,
                available: 1
            })
        ));
    }
}
