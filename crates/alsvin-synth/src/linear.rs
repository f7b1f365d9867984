//! Linear reversible (CNOT-only) synthesis over GF(2).
//!
//! A linear reversible operator is an invertible boolean matrix: row `i`
//! expresses qubit `i`'s content as a XOR of initial qubit values, and a
//! CNOT with control `c` and target `t` adds row `c` into row `t`.
//!
//! All synthesis routines return *reduction sequences*: applying the returned
//! `(control, target)` pairs in order as row operations to the input matrix
//! yields the identity. The sequence applied in reverse as a circuit realises
//! the operator.

use alsvin_device::{Device, DeviceResult};

/// An n×n GF(2) matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearOp {
    rows: Vec<Vec<bool>>,
}

impl LinearOp {
    /// The identity operator on `n` wires.
    pub fn identity(n: usize) -> Self {
        let rows = (0..n)
            .map(|i| (0..n).map(|j| i == j).collect())
            .collect();
        LinearOp { rows }
    }

    /// Build from explicit rows; all rows must have equal length.
    pub fn from_rows(rows: Vec<Vec<bool>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == rows.len()));
        LinearOp { rows }
    }

    /// Matrix dimension.
    pub fn dim(&self) -> usize {
        self.rows.len()
    }

    /// Entry access.
    pub fn get(&self, i: usize, j: usize) -> bool {
        self.rows[i][j]
    }

    /// Row access.
    pub fn row(&self, i: usize) -> &[bool] {
        &self.rows[i]
    }

    /// Add row `src` into row `dst` (the row action of `CNOT(src, dst)`).
    pub fn add_row(&mut self, src: usize, dst: usize) {
        debug_assert_ne!(src, dst);
        let (src_row, dst_row) = if src < dst {
            let (a, b) = self.rows.split_at_mut(dst);
            (&a[src], &mut b[0])
        } else {
            let (a, b) = self.rows.split_at_mut(src);
            (&b[0], &mut a[dst])
        };
        for (d, s) in dst_row.iter_mut().zip(src_row) {
            *d ^= s;
        }
    }

    /// Add column `src` into column `dst`.
    pub fn add_col(&mut self, src: usize, dst: usize) {
        for row in &mut self.rows {
            let bit = row[src];
            row[dst] ^= bit;
        }
    }

    /// Grow the matrix by one wire, extending with the unit row/column.
    pub fn extend_identity(&mut self) {
        let n = self.dim();
        for row in &mut self.rows {
            row.push(false);
        }
        let mut row = vec![false; n + 1];
        row[n] = true;
        self.rows.push(row);
    }

    /// Check for the identity matrix.
    pub fn is_identity(&self) -> bool {
        self.rows
            .iter()
            .enumerate()
            .all(|(i, row)| row.iter().enumerate().all(|(j, &b)| b == (i == j)))
    }

    /// Transposed copy.
    pub fn transposed(&self) -> Self {
        let n = self.dim();
        let rows = (0..n)
            .map(|j| (0..n).map(|i| self.rows[i][j]).collect())
            .collect();
        LinearOp { rows }
    }

    /// Apply a CNOT sequence as row operations, for verification.
    pub fn apply_cnots(&mut self, ops: &[(usize, usize)]) {
        for &(c, t) in ops {
            self.add_row(c, t);
        }
    }
}

/// Gauss-Jordan reduction.
///
/// Column at a time: establish the pivot, then clear every other row in the
/// column. Returns the reduction sequence.
pub fn gauss_jordan(mut mat: LinearOp) -> Vec<(usize, usize)> {
    let n = mat.dim();
    let mut ops = vec![];

    for j in 0..n {
        if !mat.get(j, j) {
            // Pull a pivot up from any other row.
            if let Some(i) = (0..n).find(|&i| i != j && mat.get(i, j)) {
                ops.push((i, j));
                mat.add_row(i, j);
            }
        }
        for i in 0..n {
            if i != j && mat.get(i, j) {
                ops.push((j, i));
                mat.add_row(j, i);
            }
        }
    }

    ops
}

/// Gaussian elimination: forward reduction to upper triangular followed by
/// back substitution. Returns the reduction sequence.
pub fn gaussian_elim(mut mat: LinearOp) -> Vec<(usize, usize)> {
    let n = mat.dim();
    let mut ops = vec![];

    // Forward pass: clear below the diagonal.
    for j in 0..n {
        if !mat.get(j, j) {
            if let Some(i) = (j + 1..n).find(|&i| mat.get(i, j)) {
                ops.push((i, j));
                mat.add_row(i, j);
            }
        }
        for i in j + 1..n {
            if mat.get(i, j) {
                ops.push((j, i));
                mat.add_row(j, i);
            }
        }
    }

    // Back substitution: clear above the diagonal.
    for j in (0..n).rev() {
        for i in 0..j {
            if mat.get(i, j) {
                ops.push((j, i));
                mat.add_row(j, i);
            }
        }
    }

    ops
}

/// Steiner-tree constrained reduction.
///
/// Every returned pair is a device coupling (in one of its two directions).
/// The elimination works column by column over the subgraph of
/// not-yet-processed vertices; the upper triangle is cleared by running the
/// same procedure on the transpose and appending the transposed sequence in
/// reverse. Requires the device subgraph on vertices `j..n` to stay
/// connected for every `j` (true of lines, rings and row-major grids).
pub fn steiner_gauss(mat: &LinearOp, device: &Device) -> DeviceResult<Vec<(usize, usize)>> {
    let mut a = mat.clone();
    let mut ops = steiner_lower(&mut a, device)?;

    let mut at = a.transposed();
    let upper = steiner_lower(&mut at, device)?;
    ops.extend(upper.iter().rev().map(|&(c, t)| (t, c)));

    Ok(ops)
}

/// Reduce the strict lower triangle (and fix pivots) with tree-confined row
/// operations, leaving the matrix upper triangular with a unit diagonal.
fn steiner_lower(mat: &mut LinearOp, device: &Device) -> DeviceResult<Vec<(usize, usize)>> {
    let n = mat.dim();
    let mut ops = vec![];

    for j in 0..n {
        let terminals: Vec<usize> = (j + 1..n).filter(|&i| mat.get(i, j)).collect();
        if terminals.is_empty() && mat.get(j, j) {
            continue;
        }

        let tree = device.steiner_in(&terminals, j, j)?;

        // Fill: walking leaves-first, pull 1s up through zero Steiner
        // vertices so every tree vertex carries a 1 in column j.
        for &(parent, child) in tree.iter().rev() {
            if mat.get(child, j) && !mat.get(parent, j) {
                ops.push((child, parent));
                mat.add_row(child, parent);
            }
        }

        // Flush: leaves-first again, clear each child against its parent.
        // Only the root (the pivot row) keeps its 1.
        for &(parent, child) in tree.iter().rev() {
            ops.push((parent, child));
            mat.add_row(parent, child);
        }
    }

    Ok(ops)
}
