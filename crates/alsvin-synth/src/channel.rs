//! Pauli channel representation of circuit fragments.
//!
//! Rotation folding views a circuit as a word in a quotient of the Pauli
//! channel group: Pauli rotations `exp(−iθ/2·P)`, Clifford frames, and
//! uninterpreted blocks over a qubit set. The key operations are commuting
//! a rotation through a Clifford (conjugation of its Pauli) and testing
//! commutation between rotations (symplectic inner product).
//!
//! Paulis are stored in binary symplectic form `i^k · ∏ X^x Z^z`, factors in
//! qubit-ascending order with X before Z. A Hermitian Pauli has `k` equal to
//! its Y-count mod 4, or that plus two when negated.

use alsvin_ir::Angle;

/// A Pauli operator on `n` qubits with an `i^phase` prefactor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pauli {
    xs: Vec<bool>,
    zs: Vec<bool>,
    phase: u8,
}

impl Pauli {
    /// The identity on `n` qubits.
    pub fn identity(n: usize) -> Self {
        Pauli {
            xs: vec![false; n],
            zs: vec![false; n],
            phase: 0,
        }
    }

    /// `Z` on qubit `q`.
    pub fn z(n: usize, q: usize) -> Self {
        let mut p = Self::identity(n);
        p.zs[q] = true;
        p
    }

    /// `X` on qubit `q`.
    pub fn x(n: usize, q: usize) -> Self {
        let mut p = Self::identity(n);
        p.xs[q] = true;
        p
    }

    /// `Y` on qubit `q` (`Y = i·X·Z`).
    pub fn y(n: usize, q: usize) -> Self {
        let mut p = Self::identity(n);
        p.xs[q] = true;
        p.zs[q] = true;
        p.phase = 1;
        p
    }

    /// `Z` on the parity of several qubits (`Z_{q0} ⊗ Z_{q1} ⊗ …`).
    pub fn z_parity(n: usize, qubits: &[usize]) -> Self {
        let mut p = Self::identity(n);
        for &q in qubits {
            p.zs[q] = true;
        }
        p
    }

    /// Negate the operator.
    #[must_use]
    pub fn negated(mut self) -> Self {
        self.phase = (self.phase + 2) % 4;
        self
    }

    /// Number of qubits.
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// True when the operator acts on no qubits.
    pub fn is_empty(&self) -> bool {
        !self.xs.iter().any(|&b| b) && !self.zs.iter().any(|&b| b)
    }

    /// The qubits this operator acts on.
    pub fn support(&self) -> Vec<usize> {
        (0..self.len())
            .filter(|&i| self.xs[i] || self.zs[i])
            .collect()
    }

    /// Symplectic commutation test.
    pub fn commutes_with(&self, other: &Pauli) -> bool {
        let mut product = 0usize;
        for i in 0..self.len() {
            product += usize::from(self.xs[i] & other.zs[i]);
            product += usize::from(self.zs[i] & other.xs[i]);
        }
        product % 2 == 0
    }

    /// Operator product, tracking the `i^k` prefactor.
    #[must_use]
    pub fn mul(&self, other: &Pauli) -> Pauli {
        debug_assert_eq!(self.len(), other.len());
        let mut phase = (self.phase + other.phase) % 4;
        let mut xs = vec![false; self.len()];
        let mut zs = vec![false; self.len()];

        for i in 0..self.len() {
            // Reordering Z^z1 X^x2 to X^x2 Z^z1 costs a sign.
            if self.zs[i] & other.xs[i] {
                phase = (phase + 2) % 4;
            }
            xs[i] = self.xs[i] ^ other.xs[i];
            zs[i] = self.zs[i] ^ other.zs[i];
        }

        Pauli { xs, zs, phase }
    }

    /// The phase a Hermitian operator with this support carries when
    /// positive: one factor of `i` per `Y`.
    fn hermitian_phase(&self) -> u8 {
        let ys = (0..self.len()).filter(|&i| self.xs[i] && self.zs[i]).count();
        (ys % 4) as u8
    }

    /// Reduce a ±Hermitian operator to its positive form.
    ///
    /// Returns `true` when the operator was negated. The `i^k` prefactor of
    /// a conjugated Hermitian Pauli always lands on ±1 relative to its
    /// canonical Y-phase.
    pub fn normalize_sign(&mut self) -> bool {
        let canonical = self.hermitian_phase();
        let negated = (4 + self.phase - canonical) % 4 == 2;
        debug_assert!((4 + self.phase - canonical) % 2 == 0);
        self.phase = canonical;
        negated
    }
}

/// A Clifford operator as a conjugation tableau: the images of the `X_i`
/// and `Z_i` generators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clifford {
    xs: Vec<Pauli>,
    zs: Vec<Pauli>,
}

impl Clifford {
    /// The identity on `n` qubits.
    pub fn identity(n: usize) -> Self {
        Clifford {
            xs: (0..n).map(|q| Pauli::x(n, q)).collect(),
            zs: (0..n).map(|q| Pauli::z(n, q)).collect(),
        }
    }

    /// Number of qubits.
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// True for the zero-qubit tableau.
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Hadamard on `q`.
    pub fn h(n: usize, q: usize) -> Self {
        let mut c = Self::identity(n);
        c.xs[q] = Pauli::z(n, q);
        c.zs[q] = Pauli::x(n, q);
        c
    }

    /// Pauli X on `q`.
    pub fn x(n: usize, q: usize) -> Self {
        let mut c = Self::identity(n);
        c.zs[q] = Pauli::z(n, q).negated();
        c
    }

    /// Pauli Y on `q`.
    pub fn y(n: usize, q: usize) -> Self {
        let mut c = Self::identity(n);
        c.xs[q] = Pauli::x(n, q).negated();
        c.zs[q] = Pauli::z(n, q).negated();
        c
    }

    /// Pauli Z on `q`.
    pub fn z(n: usize, q: usize) -> Self {
        let mut c = Self::identity(n);
        c.xs[q] = Pauli::x(n, q).negated();
        c
    }

    /// Phase gate S on `q` (`S X S† = Y`).
    pub fn s(n: usize, q: usize) -> Self {
        let mut c = Self::identity(n);
        c.xs[q] = Pauli::y(n, q);
        c
    }

    /// S-dagger on `q`.
    pub fn sdg(n: usize, q: usize) -> Self {
        let mut c = Self::identity(n);
        c.xs[q] = Pauli::y(n, q).negated();
        c
    }

    /// CNOT with control `ctrl` and target `tgt`.
    pub fn cx(n: usize, ctrl: usize, tgt: usize) -> Self {
        let mut c = Self::identity(n);
        c.xs[ctrl] = Pauli::x(n, ctrl).mul(&Pauli::x(n, tgt));
        c.zs[tgt] = Pauli::z(n, ctrl).mul(&Pauli::z(n, tgt));
        c
    }

    /// CZ on `a`, `b`.
    pub fn cz(n: usize, a: usize, b: usize) -> Self {
        let mut c = Self::identity(n);
        c.xs[a] = Pauli::x(n, a).mul(&Pauli::z(n, b));
        c.xs[b] = Pauli::z(n, a).mul(&Pauli::x(n, b));
        c
    }

    /// Conjugate a Pauli: `P ↦ C·P·C†`.
    pub fn conjugate(&self, p: &Pauli) -> Pauli {
        let mut acc = Pauli::identity(self.len());
        acc.phase = p.phase;
        for i in 0..self.len() {
            if p.xs[i] {
                acc = acc.mul(&self.xs[i]);
            }
            if p.zs[i] {
                acc = acc.mul(&self.zs[i]);
            }
        }
        acc
    }

    /// Composition `self · rhs` (apply `rhs` first).
    #[must_use]
    pub fn compose(&self, rhs: &Clifford) -> Clifford {
        Clifford {
            xs: rhs.xs.iter().map(|p| self.conjugate(p)).collect(),
            zs: rhs.zs.iter().map(|p| self.conjugate(p)).collect(),
        }
    }
}

/// A Pauli rotation `exp(−iθ/2 · P)` with `P` in positive canonical form.
#[derive(Debug, Clone, PartialEq)]
pub struct Rotation {
    pub pauli: Pauli,
    pub theta: Angle,
}

impl Rotation {
    /// A Z-axis rotation on one qubit.
    pub fn rz(theta: Angle, n: usize, q: usize) -> Self {
        Rotation {
            pauli: Pauli::z(n, q),
            theta,
        }
    }

    /// An X-axis rotation on one qubit.
    pub fn rx(theta: Angle, n: usize, q: usize) -> Self {
        Rotation {
            pauli: Pauli::x(n, q),
            theta,
        }
    }

    /// A Y-axis rotation on one qubit.
    pub fn ry(theta: Angle, n: usize, q: usize) -> Self {
        Rotation {
            pauli: Pauli::y(n, q),
            theta,
        }
    }

    /// The T gate as a rotation.
    pub fn t(n: usize, q: usize) -> Self {
        Self::rz(Angle::PI_QUARTER, n, q)
    }

    /// The T-dagger gate as a rotation.
    pub fn tdg(n: usize, q: usize) -> Self {
        Self::rz(-Angle::PI_QUARTER, n, q)
    }

    /// Commute this rotation left through a Clifford: `C·R·C† = R'`.
    ///
    /// Returns the conjugated rotation and whether the conjugated Pauli came
    /// out negated (the angle is flipped to keep the Pauli positive; a
    /// negated T-style gate also contributes a global phase, which the
    /// caller tracks).
    #[must_use]
    pub fn commute_left(&self, c: &Clifford) -> (Rotation, bool) {
        let mut pauli = c.conjugate(&self.pauli);
        let negated = pauli.normalize_sign();
        let theta = if negated {
            -self.theta.clone()
        } else {
            self.theta.clone()
        };
        (Rotation { pauli, theta }, negated)
    }

    /// Merge with a rotation of equal Pauli, summing angles.
    pub fn try_merge(&self, other: &Rotation) -> Option<Rotation> {
        (self.pauli == other.pauli).then(|| Rotation {
            pauli: self.pauli.clone(),
            theta: self.theta.clone() + other.theta.clone(),
        })
    }

    /// Pauli commutation test between rotations.
    pub fn commutes_with(&self, other: &Rotation) -> bool {
        self.pauli.commutes_with(&other.pauli)
    }

    /// Whether the rotation commutes past an uninterpreted block over the
    /// given qubits (disjoint support).
    pub fn commutes_with_qubits(&self, qubits: &[usize]) -> bool {
        let support = self.pauli.support();
        !qubits.iter().any(|q| support.contains(q))
    }
}

/// One event of the channel-representation word.
#[derive(Debug, Clone)]
pub enum ChannelOp {
    /// A Pauli rotation.
    Rot(Rotation),
    /// A Clifford frame.
    Cliff(Clifford),
    /// An opaque block touching a set of qubits.
    Uninterp(Vec<usize>),
}
