//! Alsvin compilation framework.
//!
//! This crate provides the pass-based architecture that turns a parsed
//! program into an optimized, hardware-mapped one.
//!
//! # Overview
//!
//! Compilation is a sequence of passes over one mutable
//! [`Program`](alsvin_ir::Program):
//!
//! 1. **Semantic check**: typing, arity, bounds, uniform-length rules
//! 2. **Desugar**: expand register broadcasts into per-qubit gates
//! 3. **Inline**: replace declared-gate calls by their bodies
//! 4. **Simplify**: cancel adjacent inverse gate pairs
//! 5. **Rotation folding**: merge phase rotations through Clifford context
//! 6. **CNOT resynthesis**: Gray-Synth over cnot-dihedral chunks
//! 7. **Layout + mapping**: place onto a device and route (SWAP insertion
//!    or Steiner-tree resynthesis)
//!
//! # Example
//!
//! ```rust
//! use alsvin_compile::{Diagnostics, passes::FoldRotations, Pass};
//!
//! let source = "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[1];\nt q[0];\nt q[0];\n";
//! let mut program = alsvin_qasm::parse(source).unwrap();
//!
//! let mut diags = Diagnostics::new();
//! FoldRotations.run(&mut program, &mut diags).unwrap();
//!
//! // The two T gates merged into a single S.
//! assert!(alsvin_qasm::emit(&program).contains("s q[0];"));
//! ```

pub mod diagnostics;
pub mod error;
pub mod manager;
pub mod pass;
pub mod semantic;

pub mod passes;

pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{CompileError, CompileResult};
pub use manager::{LayoutAlgorithm, MappingStrategy, PassManager, standard_pipeline};
pub use pass::Pass;
pub use semantic::SemanticCheck;
