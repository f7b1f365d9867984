//! OpenQASM 2.0 frontend for Alsvin.
//!
//! This crate turns OpenQASM 2.0 source text into an [`alsvin_ir::Program`]
//! and back. The lexer is generated with `logos`; the parser is a hand
//! written recursive descent over the spanned token stream; the emitter is a
//! plain source printer.
//!
//! Parsing and emission are inverse up to whitespace: for any valid source
//! `s`, `emit(&parse(s)?)` parses to an equal tree (covered by the round-trip
//! test suite).
//!
//! # Example
//!
//! ```rust
//! let source = r#"
//! OPENQASM 2.0;
//! include "qelib1.inc";
//! qreg q[2];
//! creg c[2];
//! h q[0];
//! cx q[0],q[1];
//! measure q[0] -> c[0];
//! "#;
//!
//! let program = alsvin_qasm::parse(source).unwrap();
//! assert_eq!(program.num_qubits(), 2);
//!
//! let printed = alsvin_qasm::emit(&program);
//! assert!(printed.contains("cx q[0],q[1];"));
//! ```

pub mod emitter;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod stdlib;

pub use emitter::emit;
pub use error::{ParseError, ParseResult};
pub use parser::parse;
pub use stdlib::{STD_GATES, is_std_gate, std_gate_arity};
