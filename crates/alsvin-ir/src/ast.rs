//! Statement tree for OpenQASM 2.0 programs.
//!
//! The tree is fully owned: a parent statement owns its children, replacement
//! splices vectors in place, and copies are explicit via `Clone`. Parents are
//! not linked back; traversals carry context on the call stack instead (see
//! [`crate::visit`]).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::expr::Expr;

/// An access path: either a whole register or one element of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VarAccess {
    /// Register (or gate-parameter) name.
    pub reg: String,
    /// Element offset; `None` denotes the whole register.
    pub offset: Option<u32>,
}

impl VarAccess {
    /// Reference a whole register.
    pub fn var(reg: impl Into<String>) -> Self {
        VarAccess {
            reg: reg.into(),
            offset: None,
        }
    }

    /// Reference one element of a register.
    pub fn offset(reg: impl Into<String>, offset: u32) -> Self {
        VarAccess {
            reg: reg.into(),
            offset: Some(offset),
        }
    }
}

impl fmt::Display for VarAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(i) => write!(f, "{}[{i}]", self.reg),
            None => write!(f, "{}", self.reg),
        }
    }
}

/// A gate-level operation.
///
/// These are the operations that may appear both at program scope and inside
/// gate declaration bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Gate {
    /// The built-in single-qubit unitary `U(θ, φ, λ)`.
    U {
        theta: Expr,
        phi: Expr,
        lambda: Expr,
        arg: VarAccess,
    },
    /// The built-in two-qubit `CX`.
    CNot { ctrl: VarAccess, tgt: VarAccess },
    /// Barrier over a set of arguments.
    Barrier { args: Vec<VarAccess> },
    /// Call to a declared gate.
    Call {
        name: String,
        cargs: Vec<Expr>,
        qargs: Vec<VarAccess>,
    },
}

impl Gate {
    /// The quantum arguments of the gate, in call order.
    pub fn qargs(&self) -> Vec<&VarAccess> {
        match self {
            Gate::U { arg, .. } => vec![arg],
            Gate::CNot { ctrl, tgt } => vec![ctrl, tgt],
            Gate::Barrier { args } => args.iter().collect(),
            Gate::Call { qargs, .. } => qargs.iter().collect(),
        }
    }

    /// Mutable quantum arguments, in call order.
    pub fn qargs_mut(&mut self) -> Vec<&mut VarAccess> {
        match self {
            Gate::U { arg, .. } => vec![arg],
            Gate::CNot { ctrl, tgt } => vec![ctrl, tgt],
            Gate::Barrier { args } => args.iter_mut().collect(),
            Gate::Call { qargs, .. } => qargs.iter_mut().collect(),
        }
    }

    /// The surface-syntax name of the gate.
    pub fn name(&self) -> &str {
        match self {
            Gate::U { .. } => "U",
            Gate::CNot { .. } => "CX",
            Gate::Barrier { .. } => "barrier",
            Gate::Call { name, .. } => name,
        }
    }
}

/// The kind of a statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    /// `include "file";` — resolved against the built-in header table.
    Include(String),
    /// `qreg name[size];` or `creg name[size];`
    RegisterDecl {
        name: String,
        quantum: bool,
        size: u32,
    },
    /// Local ancilla declaration, only valid inside a gate body.
    AncillaDecl { name: String, size: u32, dirty: bool },
    /// Gate declaration. `body` is `None` for opaque declarations.
    GateDecl {
        name: String,
        c_params: Vec<String>,
        q_params: Vec<String>,
        body: Option<Vec<Stmt>>,
    },
    /// A gate-level operation.
    Gate(Gate),
    /// `measure qarg -> carg;`
    Measure { qarg: VarAccess, carg: VarAccess },
    /// `reset arg;`
    Reset { arg: VarAccess },
    /// `if (reg == value) stmt`
    If {
        reg: String,
        value: u64,
        then: Box<Stmt>,
    },
}

/// A statement with its source line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    /// 1-based source line, 0 for synthesized statements.
    pub line: u32,
    pub kind: StmtKind,
}

impl Stmt {
    /// Create a statement.
    pub fn new(line: u32, kind: StmtKind) -> Self {
        Stmt { line, kind }
    }

    /// Create a gate statement.
    pub fn gate(line: u32, gate: Gate) -> Self {
        Stmt::new(line, StmtKind::Gate(gate))
    }

    /// Render a short location string for diagnostics.
    pub fn location(&self) -> String {
        if self.line == 0 {
            "<generated>".into()
        } else {
            format!("line {}", self.line)
        }
    }

    /// The quantum arguments touched by this statement, `None` for
    /// declarations and nested scopes.
    pub fn qargs(&self) -> Option<Vec<&VarAccess>> {
        match &self.kind {
            StmtKind::Gate(gate) => Some(gate.qargs()),
            StmtKind::Measure { qarg, .. } => Some(vec![qarg]),
            StmtKind::Reset { arg } => Some(vec![arg]),
            _ => None,
        }
    }
}

/// A complete program: the root of the IR.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Top-level statements in source order.
    pub stmts: Vec<Stmt>,
}

impl Program {
    /// Create an empty program.
    pub fn new() -> Self {
        Program::default()
    }

    /// Iterate over the quantum registers declared at program scope.
    pub fn qregs(&self) -> impl Iterator<Item = (&str, u32)> {
        self.stmts.iter().filter_map(|s| match &s.kind {
            StmtKind::RegisterDecl {
                name,
                quantum: true,
                size,
            } => Some((name.as_str(), *size)),
            _ => None,
        })
    }

    /// Iterate over the classical registers declared at program scope.
    pub fn cregs(&self) -> impl Iterator<Item = (&str, u32)> {
        self.stmts.iter().filter_map(|s| match &s.kind {
            StmtKind::RegisterDecl {
                name,
                quantum: false,
                size,
            } => Some((name.as_str(), *size)),
            _ => None,
        })
    }

    /// Total number of program-scope qubits.
    pub fn num_qubits(&self) -> usize {
        self.qregs().map(|(_, size)| size as usize).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_access_display() {
        assert_eq!(VarAccess::offset("q", 3).to_string(), "q[3]");
        assert_eq!(VarAccess::var("q").to_string(), "q");
    }

    #[test]
    fn test_gate_qargs() {
        let g = Gate::CNot {
            ctrl: VarAccess::offset("q", 0),
            tgt: VarAccess::offset("q", 1),
        };
        let qargs = g.qargs();
        assert_eq!(qargs.len(), 2);
        assert_eq!(*qargs[0], VarAccess::offset("q", 0));
    }

    #[test]
    fn test_program_registers() {
        let mut prog = Program::new();
        prog.stmts.push(Stmt::new(
            1,
            StmtKind::RegisterDecl {
                name: "q".into(),
                quantum: true,
                size: 3,
            },
        ));
        prog.stmts.push(Stmt::new(
            2,
            StmtKind::RegisterDecl {
                name: "c".into(),
                quantum: false,
                size: 2,
            },
        ));

        assert_eq!(prog.num_qubits(), 3);
        assert_eq!(prog.cregs().count(), 1);
    }

    #[test]
    fn test_serde_round_trip() {
        let stmt = Stmt::gate(
            4,
            Gate::U {
                theta: Expr::Pi,
                phi: Expr::Int(0),
                lambda: Expr::Int(0),
                arg: VarAccess::offset("q", 0),
            },
        );
        let json = serde_json::to_string(&stmt).unwrap();
        let back: Stmt = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stmt);
    }
}
