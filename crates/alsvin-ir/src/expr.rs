//! Expression trees for gate parameters and classical arguments.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Sin,
    Cos,
    Tan,
    Exp,
    Ln,
    Sqrt,
    Neg,
    Pos,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Eq,
}

/// A classical expression.
///
/// Expressions appear as gate parameters (angles) and as actual classical
/// arguments to declared gates. They are kept symbolic; [`Expr::eval`]
/// performs constant folding where possible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Integer literal.
    Int(i64),
    /// Real literal.
    Real(f64),
    /// The constant π.
    Pi,
    /// Reference to a classical parameter.
    Var(String),
    /// Unary operation.
    Unary(UnaryOp, Box<Expr>),
    /// Binary operation.
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
}

impl Expr {
    /// Build a binary expression.
    pub fn binary(lhs: Expr, op: BinaryOp, rhs: Expr) -> Self {
        Expr::Binary(Box::new(lhs), op, Box::new(rhs))
    }

    /// Build a unary expression.
    pub fn unary(op: UnaryOp, sub: Expr) -> Self {
        Expr::Unary(op, Box::new(sub))
    }

    /// Try to evaluate to a concrete value.
    ///
    /// Returns `None` when the expression contains a free variable or a
    /// division by zero.
    pub fn eval(&self) -> Option<f64> {
        match self {
            Expr::Int(v) => Some(*v as f64),
            Expr::Real(v) => Some(*v),
            Expr::Pi => Some(std::f64::consts::PI),
            Expr::Var(_) => None,
            Expr::Unary(op, sub) => {
                let v = sub.eval()?;
                Some(match op {
                    UnaryOp::Sin => v.sin(),
                    UnaryOp::Cos => v.cos(),
                    UnaryOp::Tan => v.tan(),
                    UnaryOp::Exp => v.exp(),
                    UnaryOp::Ln => v.ln(),
                    UnaryOp::Sqrt => v.sqrt(),
                    UnaryOp::Neg => -v,
                    UnaryOp::Pos => v,
                })
            }
            Expr::Binary(lhs, op, rhs) => {
                let l = lhs.eval()?;
                let r = rhs.eval()?;
                match op {
                    BinaryOp::Add => Some(l + r),
                    BinaryOp::Sub => Some(l - r),
                    BinaryOp::Mul => Some(l * r),
                    BinaryOp::Div => {
                        if r == 0.0 {
                            None
                        } else {
                            Some(l / r)
                        }
                    }
                    BinaryOp::Pow => Some(l.powf(r)),
                    BinaryOp::Eq => Some(f64::from(l == r)),
                }
            }
        }
    }

    /// Check whether the expression evaluates to zero.
    pub fn is_zero(&self) -> bool {
        self.eval() == Some(0.0)
    }

    /// Collect the free variables of the expression into `out`.
    pub fn collect_vars(&self, out: &mut Vec<String>) {
        match self {
            Expr::Int(_) | Expr::Real(_) | Expr::Pi => {}
            Expr::Var(name) => {
                if !out.contains(name) {
                    out.push(name.clone());
                }
            }
            Expr::Unary(_, sub) => sub.collect_vars(out),
            Expr::Binary(lhs, _, rhs) => {
                lhs.collect_vars(out);
                rhs.collect_vars(out);
            }
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Binary(_, BinaryOp::Eq, _) => 0,
            Expr::Binary(_, BinaryOp::Add | BinaryOp::Sub, _) => 1,
            Expr::Binary(_, BinaryOp::Mul | BinaryOp::Div, _) => 2,
            Expr::Unary(UnaryOp::Neg | UnaryOp::Pos, _) => 3,
            Expr::Binary(_, BinaryOp::Pow, _) => 4,
            _ => 5,
        }
    }

    fn fmt_child(&self, child: &Expr, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if child.precedence() < self.precedence() {
            write!(f, "({child})")
        } else {
            write!(f, "{child}")
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Int(v) => write!(f, "{v}"),
            // Keep a decimal point so the literal re-lexes as a real.
            Expr::Real(v) if v.fract() == 0.0 && v.is_finite() => write!(f, "{v:.1}"),
            Expr::Real(v) => write!(f, "{v}"),
            Expr::Pi => write!(f, "pi"),
            Expr::Var(name) => write!(f, "{name}"),
            Expr::Unary(op, sub) => match op {
                UnaryOp::Neg => {
                    write!(f, "-")?;
                    self.fmt_child(sub, f)
                }
                UnaryOp::Pos => self.fmt_child(sub, f),
                UnaryOp::Sin => write!(f, "sin({sub})"),
                UnaryOp::Cos => write!(f, "cos({sub})"),
                UnaryOp::Tan => write!(f, "tan({sub})"),
                UnaryOp::Exp => write!(f, "exp({sub})"),
                UnaryOp::Ln => write!(f, "ln({sub})"),
                UnaryOp::Sqrt => write!(f, "sqrt({sub})"),
            },
            Expr::Binary(lhs, op, rhs) => {
                self.fmt_child(lhs, f)?;
                let sym = match op {
                    BinaryOp::Add => "+",
                    BinaryOp::Sub => "-",
                    BinaryOp::Mul => "*",
                    BinaryOp::Div => "/",
                    BinaryOp::Pow => "^",
                    BinaryOp::Eq => "==",
                };
                write!(f, "{sym}")?;
                // Right child needs parens at equal precedence for the
                // non-associative operators.
                if rhs.precedence() < self.precedence()
                    || (rhs.precedence() == self.precedence()
                        && matches!(op, BinaryOp::Sub | BinaryOp::Div))
                {
                    write!(f, "({rhs})")
                } else {
                    write!(f, "{rhs}")
                }
            }
        }
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Expr::Int(value)
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Real(value)
    }
}

impl std::ops::Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        Expr::binary(self, BinaryOp::Add, rhs)
    }
}

impl std::ops::Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        Expr::binary(self, BinaryOp::Sub, rhs)
    }
}

impl std::ops::Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::unary(UnaryOp::Neg, self)
    }
}
