//! Broadcast desugaring.
//!
//! A uniform gate passes one or more whole registers where single bits are
//! expected; its semantics is component-wise broadcast. This pass expands
//! every such statement into one copy per register element, leaving
//! dereferenced arguments fixed:
//!
//! ```text
//! qreg q[2]; qreg p[2];
//! CX q,p;          →  CX q[0],p[0]; CX q[1],p[1];
//! ```

use rustc_hash::FxHashMap;

use alsvin_ir::visit::{Rewriter, rewrite_stmt};
use alsvin_ir::{Gate, Program, Stmt, StmtKind, VarAccess};

use crate::diagnostics::Diagnostics;
use crate::error::CompileResult;
use crate::pass::Pass;

/// The desugaring pass.
pub struct Desugar;

impl Pass for Desugar {
    fn name(&self) -> &'static str {
        "Desugar"
    }

    fn run(&self, program: &mut Program, _diagnostics: &mut Diagnostics) -> CompileResult<()> {
        let mut rewriter = DesugarRewriter {
            scopes: vec![FxHashMap::default()],
        };
        rewriter.rewrite_program(program);
        Ok(())
    }
}

struct DesugarRewriter {
    /// Register sizes per scope; gate formals are absent (never broadcast).
    scopes: Vec<FxHashMap<String, u32>>,
}

impl DesugarRewriter {
    fn size_of(&self, reg: &str) -> Option<u32> {
        self.scopes.iter().rev().find_map(|s| s.get(reg).copied())
    }

    fn record(&mut self, reg: &str, size: u32) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(reg.to_string(), size);
        }
    }

    /// The broadcast count of an argument list: the common length of its
    /// whole-register arguments, `None` when every argument is a single bit.
    fn repeats<'a>(&self, args: impl Iterator<Item = &'a VarAccess>) -> Option<u32> {
        let mut count = None;
        for arg in args {
            if arg.offset.is_none() {
                if let Some(size) = self.size_of(&arg.reg) {
                    count = Some(size);
                }
            }
        }
        count
    }

    fn expand(&self, arg: &VarAccess, index: u32) -> VarAccess {
        if arg.offset.is_none() && self.size_of(&arg.reg).is_some() {
            VarAccess::offset(&arg.reg, index)
        } else {
            arg.clone()
        }
    }

    fn expand_gate(&self, gate: &Gate, index: u32) -> Gate {
        match gate {
            Gate::U {
                theta,
                phi,
                lambda,
                arg,
            } => Gate::U {
                theta: theta.clone(),
                phi: phi.clone(),
                lambda: lambda.clone(),
                arg: self.expand(arg, index),
            },
            Gate::CNot { ctrl, tgt } => Gate::CNot {
                ctrl: self.expand(ctrl, index),
                tgt: self.expand(tgt, index),
            },
            Gate::Barrier { args } => Gate::Barrier {
                args: args.iter().map(|a| self.expand(a, index)).collect(),
            },
            Gate::Call { name, cargs, qargs } => Gate::Call {
                name: name.clone(),
                cargs: cargs.clone(),
                qargs: qargs.iter().map(|a| self.expand(a, index)).collect(),
            },
        }
    }
}

impl Rewriter for DesugarRewriter {
    fn replace_register_decl(&mut self, stmt: Stmt) -> Vec<Stmt> {
        if let StmtKind::RegisterDecl { name, size, .. } = &stmt.kind {
            self.record(name, *size);
        }
        vec![stmt]
    }

    fn replace_ancilla_decl(&mut self, stmt: Stmt) -> Vec<Stmt> {
        if let StmtKind::AncillaDecl { name, size, .. } = &stmt.kind {
            self.record(name, *size);
        }
        vec![stmt]
    }

    fn enter_gate_decl(&mut self, _name: &str, _c_params: &[String], _q_params: &[String]) {
        self.scopes.push(FxHashMap::default());
    }

    fn exit_gate_decl(&mut self, _name: &str) -> Vec<Stmt> {
        self.scopes.pop();
        vec![]
    }

    fn replace_gate(&mut self, line: u32, gate: Gate) -> Vec<Stmt> {
        match self.repeats(gate.qargs().into_iter()) {
            Some(count) => (0..count)
                .map(|i| Stmt::gate(line, self.expand_gate(&gate, i)))
                .collect(),
            None => vec![Stmt::gate(line, gate)],
        }
    }

    fn replace_measure(&mut self, stmt: Stmt) -> Vec<Stmt> {
        let StmtKind::Measure { qarg, carg } = &stmt.kind else {
            return vec![stmt];
        };
        match self.repeats([qarg, carg].into_iter()) {
            Some(count) => (0..count)
                .map(|i| {
                    Stmt::new(
                        stmt.line,
                        StmtKind::Measure {
                            qarg: self.expand(qarg, i),
                            carg: self.expand(carg, i),
                        },
                    )
                })
                .collect(),
            None => vec![stmt],
        }
    }

    fn replace_reset(&mut self, stmt: Stmt) -> Vec<Stmt> {
        let StmtKind::Reset { arg } = &stmt.kind else {
            return vec![stmt];
        };
        match self.repeats([arg].into_iter()) {
            Some(count) => (0..count)
                .map(|i| {
                    Stmt::new(
                        stmt.line,
                        StmtKind::Reset {
                            arg: self.expand(arg, i),
                        },
                    )
                })
                .collect(),
            None => vec![stmt],
        }
    }

    fn replace_if(&mut self, stmt: Stmt) -> Vec<Stmt> {
        let Stmt { line, kind } = stmt;
        let StmtKind::If { reg, value, then } = kind else {
            return vec![Stmt::new(line, kind)];
        };
        // Broadcast under a condition expands to one conditional per copy.
        rewrite_stmt(self, *then)
            .into_iter()
            .map(|inner| {
                Stmt::new(
                    line,
                    StmtKind::If {
                        reg: reg.clone(),
                        value,
                        then: Box::new(inner),
                    },
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alsvin_qasm::{emit, parse};

    fn desugar(source: &str) -> String {
        let mut prog = parse(source).unwrap();
        let mut diags = Diagnostics::new();
        Desugar.run(&mut prog, &mut diags).unwrap();
        emit(&prog)
    }

    #[test]
    fn test_broadcast_cnot() {
        let printed = desugar(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\nqreg p[2];\nCX q,p;\n",
        );
        assert!(printed.contains("CX q[0],p[0];"));
        assert!(printed.contains("CX q[1],p[1];"));
        assert!(!printed.contains("CX q,p;"));
    }

    #[test]
    fn test_broadcast_single_qubit_call() {
        let printed = desugar("OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[3];\nh q;\n");
        assert!(printed.contains("h q[0];"));
        assert!(printed.contains("h q[1];"));
        assert!(printed.contains("h q[2];"));
    }

    #[test]
    fn test_mixed_offset_and_register() {
        let printed = desugar(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\nqreg p[2];\ncx q[0],p;\n",
        );
        assert!(printed.contains("cx q[0],p[0];"));
        assert!(printed.contains("cx q[0],p[1];"));
    }

    #[test]
    fn test_broadcast_measure() {
        let printed = desugar(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\ncreg c[2];\nmeasure q -> c;\n",
        );
        assert!(printed.contains("measure q[0] -> c[0];"));
        assert!(printed.contains("measure q[1] -> c[1];"));
    }

    #[test]
    fn test_broadcast_under_condition() {
        let printed = desugar(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\ncreg c[1];\nif (c==1) x q;\n",
        );
        assert!(printed.contains("if (c==1) x q[0];"));
        assert!(printed.contains("if (c==1) x q[1];"));
    }

    #[test]
    fn test_single_bit_gates_untouched() {
        let printed = desugar(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\ncx q[0],q[1];\n",
        );
        assert!(printed.contains("cx q[0],q[1];"));
    }

    #[test]
    fn test_gate_body_formals_not_broadcast() {
        // Formals are single qubits; a body gate on a formal must survive.
        let printed = desugar(
            "OPENQASM 2.0;\ngate foo a,b { CX a,b; }\nqreg q[2];\nfoo q[0],q[1];\n",
        );
        assert!(printed.contains("CX a,b;"));
    }

    #[test]
    fn test_ancilla_broadcast_in_body() {
        let printed = desugar(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\ngate foo a {\n  ancilla w[2];\n  h w;\n}\n",
        );
        assert!(printed.contains("h w[0];"));
        assert!(printed.contains("h w[1];"));
    }

    #[test]
    fn test_idempotent() {
        let source =
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\nqreg p[2];\nCX q,p;\nh q;\n";
        let mut prog = parse(source).unwrap();
        let mut diags = Diagnostics::new();
        Desugar.run(&mut prog, &mut diags).unwrap();
        let once = emit(&prog);
        Desugar.run(&mut prog, &mut diags).unwrap();
        assert_eq!(emit(&prog), once);
    }
}
