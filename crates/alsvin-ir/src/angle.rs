//! Exact angle arithmetic modulo 2π.
//!
//! Rotation angles are kept exact throughout the compilation pipeline: a
//! dyadic multiple of π (the Clifford+T hierarchy lives here) is stored as a
//! reduced rational, and anything else is carried as a symbolic expression
//! tree. Arithmetic never falls back to floating point unless a symbolic
//! operand forces it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::expr::{BinaryOp, Expr};

/// Numeric tolerance for recognizing dyadic angles in evaluated expressions.
const EPSILON: f64 = 1e-9;

/// Largest denominator exponent tried when recognizing dyadic angles.
const MAX_POW: u32 = 16;

/// A reduced dyadic fraction of π: `num·π / 2^pow`, with `0 ≤ num < 2^(pow+1)`
/// and `num` odd unless the angle is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dyadic {
    /// Numerator.
    pub num: i64,
    /// Denominator exponent.
    pub pow: u32,
}

impl Dyadic {
    /// Create a dyadic angle in canonical form.
    pub fn new(num: i64, pow: u32) -> Self {
        Dyadic { num, pow }.normalize()
    }

    fn normalize(mut self) -> Self {
        let modulus = 2i64 << self.pow;
        self.num = self.num.rem_euclid(modulus);
        while self.num != 0 && self.num % 2 == 0 && self.pow > 0 {
            self.num /= 2;
            self.pow -= 1;
        }
        if self.num == 0 {
            self.pow = 0;
        }
        self
    }

    /// Numeric value in [0, 2π).
    pub fn value(&self) -> f64 {
        self.num as f64 * std::f64::consts::PI / f64::from(1u32 << self.pow)
    }
}

/// An exact angle modulo 2π.
///
/// Two inhabitants: a canonical dyadic multiple of π, or a symbolic
/// expression. Dyadic angles form a group under addition; mixing in a
/// symbolic operand degrades the result to symbolic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Angle {
    /// Exact dyadic multiple of π.
    Dyadic(Dyadic),
    /// Symbolic expression, evaluated lazily if at all.
    Symbolic(Expr),
}

impl Angle {
    /// The zero angle.
    pub const ZERO: Angle = Angle::Dyadic(Dyadic { num: 0, pow: 0 });
    /// π.
    pub const PI: Angle = Angle::Dyadic(Dyadic { num: 1, pow: 0 });
    /// π/2, the S-gate angle.
    pub const PI_HALF: Angle = Angle::Dyadic(Dyadic { num: 1, pow: 1 });
    /// π/4, the T-gate angle.
    pub const PI_QUARTER: Angle = Angle::Dyadic(Dyadic { num: 1, pow: 2 });

    /// Create a dyadic angle `num·π / 2^pow`.
    pub fn dyadic(num: i64, pow: u32) -> Self {
        Angle::Dyadic(Dyadic::new(num, pow))
    }

    /// Check for the zero angle.
    pub fn is_zero(&self) -> bool {
        match self {
            Angle::Dyadic(d) => d.num == 0,
            Angle::Symbolic(e) => e.is_zero(),
        }
    }

    /// Check whether the angle is an integer multiple of `π / 2^pow`.
    pub fn is_multiple_of(&self, pow: u32) -> bool {
        match self {
            Angle::Dyadic(d) => d.pow <= pow,
            Angle::Symbolic(_) => false,
        }
    }

    /// Numeric value, when the angle is closed.
    pub fn numeric(&self) -> Option<f64> {
        match self {
            Angle::Dyadic(d) => Some(d.value()),
            Angle::Symbolic(e) => e.eval(),
        }
    }

    /// Multiply by an integer scalar.
    #[must_use]
    pub fn scalar_mul(&self, k: i64) -> Angle {
        match self {
            Angle::Dyadic(d) => Angle::dyadic(d.num * k, d.pow),
            Angle::Symbolic(e) => {
                Angle::Symbolic(Expr::binary(Expr::Int(k), BinaryOp::Mul, e.clone()))
            }
        }
    }

    /// Convert an expression to an angle.
    ///
    /// Closed expressions whose value is a dyadic multiple of π (within
    /// tolerance, denominators up to 2^16) become [`Angle::Dyadic`];
    /// everything else is carried symbolically.
    pub fn from_expr(expr: &Expr) -> Angle {
        if let Some(v) = expr.eval() {
            for pow in 0..=MAX_POW {
                let multiple = v * f64::from(1u32 << pow) / std::f64::consts::PI;
                if (multiple - multiple.round()).abs() < EPSILON
                    && multiple.abs() < 1e15
                {
                    return Angle::dyadic(multiple.round() as i64, pow);
                }
            }
        }
        Angle::Symbolic(expr.clone())
    }

    /// Convert back to an expression tree.
    pub fn to_expr(&self) -> Expr {
        match self {
            Angle::Dyadic(d) => {
                if d.num == 0 {
                    return Expr::Int(0);
                }
                let numerator = if d.num == 1 {
                    Expr::Pi
                } else {
                    Expr::binary(Expr::Int(d.num), BinaryOp::Mul, Expr::Pi)
                };
                if d.pow == 0 {
                    numerator
                } else {
                    Expr::binary(
                        numerator,
                        BinaryOp::Div,
                        Expr::Int(i64::from(1u32 << d.pow)),
                    )
                }
            }
            Angle::Symbolic(e) => e.clone(),
        }
    }
}

impl PartialEq for Angle {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Angle::Dyadic(a), Angle::Dyadic(b)) => a == b,
            (Angle::Symbolic(a), Angle::Symbolic(b)) => match (a.eval(), b.eval()) {
                (Some(x), Some(y)) => {
                    let tau = 2.0 * std::f64::consts::PI;
                    ((x - y).rem_euclid(tau)).min((y - x).rem_euclid(tau)) < EPSILON
                }
                _ => a == b,
            },
            (a, b) => match (a.numeric(), b.numeric()) {
                (Some(x), Some(y)) => {
                    let tau = 2.0 * std::f64::consts::PI;
                    ((x - y).rem_euclid(tau)).min((y - x).rem_euclid(tau)) < EPSILON
                }
                _ => false,
            },
        }
    }
}

impl std::ops::Add for Angle {
    type Output = Angle;

    fn add(self, rhs: Angle) -> Angle {
        match (self, rhs) {
            (Angle::Dyadic(a), Angle::Dyadic(b)) => {
                let pow = a.pow.max(b.pow);
                let na = a.num << (pow - a.pow);
                let nb = b.num << (pow - b.pow);
                Angle::dyadic(na + nb, pow)
            }
            (a, b) => {
                if a.is_zero() {
                    return b;
                }
                if b.is_zero() {
                    return a;
                }
                Angle::Symbolic(Expr::binary(a.to_expr(), BinaryOp::Add, b.to_expr()))
            }
        }
    }
}

impl std::ops::AddAssign for Angle {
    fn add_assign(&mut self, rhs: Angle) {
        *self = self.clone() + rhs;
    }
}

impl std::ops::Neg for Angle {
    type Output = Angle;

    fn neg(self) -> Angle {
        match self {
            Angle::Dyadic(d) => Angle::dyadic(-d.num, d.pow),
            Angle::Symbolic(e) => Angle::Symbolic(-e),
        }
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Angle::Dyadic(d) => {
                if d.num == 0 {
                    write!(f, "0")
                } else if d.pow == 0 {
                    if d.num == 1 {
                        write!(f, "pi")
                    } else {
                        write!(f, "{}*pi", d.num)
                    }
                } else if d.num == 1 {
                    write!(f, "pi/{}", 1u32 << d.pow)
                } else {
                    write!(f, "{}*pi/{}", d.num, 1u32 << d.pow)
                }
            }
            Angle::Symbolic(e) => write!(f, "{e}"),
        }
    }
}
