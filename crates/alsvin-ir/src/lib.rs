//! Alsvin Circuit Intermediate Representation
//!
//! This crate provides the core data structures for representing OpenQASM 2.0
//! programs in Alsvin. It forms the foundation of the entire compilation stack.
//!
//! # Overview
//!
//! A program is an owned tree of typed statements over quantum and classical
//! registers, with scoped gate declarations. Every compilation pass consumes a
//! [`Program`] and rewrites it in place; there are no parent pointers, and
//! structural replacement happens by splicing statement vectors during a
//! post-order walk (see [`Rewriter`]).
//!
//! # Core components
//!
//! - **Statements and expressions**: [`Stmt`], [`Gate`], [`Expr`],
//!   [`VarAccess`] for addressing bits and registers
//! - **Angles**: [`Angle`] — exact angles modulo 2π, dyadic multiples of π
//!   plus a symbolic fallback
//! - **Traversal**: [`Visitor`] (read-only, pre-order) and [`Rewriter`]
//!   (post-order splice replacement)
//! - **Symbols**: [`SymbolTable`] — scoped value bindings plus a global gate
//!   namespace
//!
//! # Example: building a small program
//!
//! ```rust
//! use alsvin_ir::{Gate, Program, Stmt, StmtKind, VarAccess};
//!
//! let mut prog = Program::new();
//! prog.stmts.push(Stmt::new(1, StmtKind::RegisterDecl {
//!     name: "q".into(),
//!     quantum: true,
//!     size: 2,
//! }));
//! prog.stmts.push(Stmt::gate(2, Gate::CNot {
//!     ctrl: VarAccess::offset("q", 0),
//!     tgt: VarAccess::offset("q", 1),
//! }));
//!
//! assert_eq!(prog.stmts.len(), 2);
//! ```

pub mod angle;
pub mod ast;
pub mod error;
pub mod expr;
pub mod symbol;
pub mod visit;

pub use angle::{Angle, Dyadic};
pub use ast::{Gate, Program, Stmt, StmtKind, VarAccess};
pub use error::{IrError, IrResult};
pub use expr::{BinaryOp, Expr, UnaryOp};
pub use symbol::{BitKind, GateType, SymbolTable, Type};
pub use visit::{Rewriter, Visitor, substitute_exprs, substitute_vars};
