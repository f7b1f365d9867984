//! Property-based tests for QASM 2.0 roundtrip conversion.
//!
//! Tests that program → source → program preserves the tree, and that a
//! freshly-emitted program re-emits to the same text.

use alsvin_ir::{Gate, Program, Stmt, StmtKind, VarAccess};
use alsvin_qasm::{emit, parse};
use proptest::prelude::*;

/// Gate operations generated for random programs.
#[derive(Debug, Clone)]
enum GateOp {
    H(u32),
    X(u32),
    T(u32),
    Tdg(u32),
    S(u32),
    RzPi4(u32, i64),
    CX(u32, u32),
    Measure(u32),
    Reset(u32),
    Barrier(u32),
}

impl GateOp {
    fn to_stmt(&self) -> Stmt {
        fn call(name: &str, cargs: Vec<alsvin_ir::Expr>, qubits: &[u32]) -> Stmt {
            Stmt::gate(
                0,
                Gate::Call {
                    name: name.into(),
                    cargs,
                    qargs: qubits.iter().map(|&q| VarAccess::offset("q", q)).collect(),
                },
            )
        }

        match self {
            GateOp::H(q) => call("h", vec![], &[*q]),
            GateOp::X(q) => call("x", vec![], &[*q]),
            GateOp::T(q) => call("t", vec![], &[*q]),
            GateOp::Tdg(q) => call("tdg", vec![], &[*q]),
            GateOp::S(q) => call("s", vec![], &[*q]),
            GateOp::RzPi4(q, k) => call(
                "rz",
                vec![alsvin_ir::Angle::dyadic(*k, 2).to_expr()],
                &[*q],
            ),
            GateOp::CX(c, t) => Stmt::gate(
                0,
                Gate::CNot {
                    ctrl: VarAccess::offset("q", *c),
                    tgt: VarAccess::offset("q", *t),
                },
            ),
            GateOp::Measure(q) => Stmt::new(
                0,
                StmtKind::Measure {
                    qarg: VarAccess::offset("q", *q),
                    carg: VarAccess::offset("c", *q),
                },
            ),
            GateOp::Reset(q) => Stmt::new(
                0,
                StmtKind::Reset {
                    arg: VarAccess::offset("q", *q),
                },
            ),
            GateOp::Barrier(q) => Stmt::gate(
                0,
                Gate::Barrier {
                    args: vec![VarAccess::offset("q", *q)],
                },
            ),
        }
    }
}

fn arb_gate_op(num_qubits: u32) -> impl Strategy<Value = GateOp> {
    prop_oneof![
        (0..num_qubits).prop_map(GateOp::H),
        (0..num_qubits).prop_map(GateOp::X),
        (0..num_qubits).prop_map(GateOp::T),
        (0..num_qubits).prop_map(GateOp::Tdg),
        (0..num_qubits).prop_map(GateOp::S),
        (0..num_qubits, 1_i64..8).prop_map(|(q, k)| GateOp::RzPi4(q, k)),
        (0..num_qubits, 0..num_qubits)
            .prop_filter("Control and target must differ", |(c, t)| c != t)
            .prop_map(|(c, t)| GateOp::CX(c, t)),
        (0..num_qubits).prop_map(GateOp::Measure),
        (0..num_qubits).prop_map(GateOp::Reset),
        (0..num_qubits).prop_map(GateOp::Barrier),
    ]
}

fn arb_program() -> impl Strategy<Value = Program> {
    (2_u32..=5).prop_flat_map(|num_qubits| {
        prop::collection::vec(arb_gate_op(num_qubits), 1..=20).prop_map(move |ops| {
            let mut prog = Program::new();
            prog.stmts
                .push(Stmt::new(0, StmtKind::Include("qelib1.inc".into())));
            prog.stmts.push(Stmt::new(
                0,
                StmtKind::RegisterDecl {
                    name: "q".into(),
                    quantum: true,
                    size: num_qubits,
                },
            ));
            prog.stmts.push(Stmt::new(
                0,
                StmtKind::RegisterDecl {
                    name: "c".into(),
                    quantum: false,
                    size: num_qubits,
                },
            ));
            for op in ops {
                prog.stmts.push(op.to_stmt());
            }
            prog
        })
    })
}

/// Statement equality modulo source lines.
fn strip_lines(prog: &Program) -> Vec<StmtKind> {
    prog.stmts.iter().map(|s| s.kind.clone()).collect()
}

proptest! {
    /// Emitting and re-parsing a program yields an equal tree.
    #[test]
    fn test_emit_parse_preserves_tree(prog in arb_program()) {
        let source = emit(&prog);
        let parsed = parse(&source).expect("emitted source should parse");
        prop_assert_eq!(strip_lines(&parsed), strip_lines(&prog));
    }

    /// A freshly-emitted program re-emits to the same text.
    #[test]
    fn test_emission_is_a_fixpoint(prog in arb_program()) {
        let once = emit(&prog);
        let twice = emit(&parse(&once).expect("emitted source should parse"));
        prop_assert_eq!(once, twice);
    }

    /// Emission is deterministic.
    #[test]
    fn test_emission_is_deterministic(prog in arb_program()) {
        prop_assert_eq!(emit(&prog), emit(&prog));
    }
}
