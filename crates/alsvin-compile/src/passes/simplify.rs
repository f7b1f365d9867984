//! Peephole simplification.
//!
//! Cancels adjacent inverse gate pairs using a per-qubit last-touched
//! analysis: a gate cancels against the previous statement on its qubits
//! when that statement covers exactly the same qubits and the two form an
//! inverse pair (self-inverse gates, S/Sdg, T/Tdg, opposite-angle
//! rotations). Barriers, measurements, resets and conditionals block
//! cancellation across them.
//!
//! Cancelling a pair can expose a new pair, so the scan repeats until a
//! fixed point (bounded).

use rustc_hash::FxHashMap;

use alsvin_ir::{Angle, Gate, Program, Stmt, StmtKind, VarAccess};

use crate::diagnostics::Diagnostics;
use crate::error::CompileResult;
use crate::pass::Pass;

const MAX_ITERATIONS: usize = 100;

/// The peephole simplification pass.
pub struct Simplify;

impl Pass for Simplify {
    fn name(&self) -> &'static str {
        "Simplify"
    }

    fn run(&self, program: &mut Program, _diagnostics: &mut Diagnostics) -> CompileResult<()> {
        simplify_scope(&mut program.stmts);
        for stmt in &mut program.stmts {
            if let StmtKind::GateDecl {
                body: Some(body), ..
            } = &mut stmt.kind
            {
                simplify_scope(body);
            }
        }
        Ok(())
    }
}

fn simplify_scope(stmts: &mut Vec<Stmt>) {
    for _ in 0..MAX_ITERATIONS {
        if !simplify_once(stmts) {
            break;
        }
    }
}

/// One cancellation sweep; returns whether anything was removed.
fn simplify_once(stmts: &mut Vec<Stmt>) -> bool {
    let mut last: FxHashMap<VarAccess, usize> = FxHashMap::default();
    let mut dead = vec![false; stmts.len()];
    let mut removed = false;

    for i in 0..stmts.len() {
        match &stmts[i].kind {
            StmtKind::Gate(gate) => {
                let args: Vec<VarAccess> = gate.qargs().into_iter().cloned().collect();

                if let Some(prev) = cancellation_partner(&last, stmts, &dead, gate, &args) {
                    dead[prev] = true;
                    dead[i] = true;
                    removed = true;
                    for arg in &args {
                        last.remove(arg);
                    }
                } else {
                    touch(&mut last, &args, i);
                }
            }
            StmtKind::Measure { qarg, .. } => touch(&mut last, &[qarg.clone()], i),
            StmtKind::Reset { arg } => touch(&mut last, &[arg.clone()], i),
            StmtKind::If { then, .. } => {
                if let Some(args) = then.qargs() {
                    let args: Vec<VarAccess> = args.into_iter().cloned().collect();
                    touch(&mut last, &args, i);
                }
            }
            _ => {}
        }
    }

    if removed {
        let mut index = 0;
        stmts.retain(|_| {
            let keep = !dead[index];
            index += 1;
            keep
        });
    }
    removed
}

/// Record `index` as the last statement touching each access, invalidating
/// overlapping whole-register or element entries of the same register.
fn touch(last: &mut FxHashMap<VarAccess, usize>, args: &[VarAccess], index: usize) {
    for arg in args {
        match arg.offset {
            None => last.retain(|k, _| k.reg != arg.reg),
            Some(_) => {
                last.remove(&VarAccess::var(&arg.reg));
            }
        }
        last.insert(arg.clone(), index);
    }
}

/// The index of the previous statement if it cancels with `gate`.
fn cancellation_partner(
    last: &FxHashMap<VarAccess, usize>,
    stmts: &[Stmt],
    dead: &[bool],
    gate: &Gate,
    args: &[VarAccess],
) -> Option<usize> {
    let (name, angle, symmetric) = cancel_key(gate)?;

    // Every qubit's previous statement must be one and the same.
    let mut prev = None;
    for arg in args {
        let &p = last.get(arg)?;
        if prev.is_some_and(|q| q != p) {
            return None;
        }
        prev = Some(p);
    }
    let prev = prev?;
    if dead[prev] {
        return None;
    }

    let StmtKind::Gate(prev_gate) = &stmts[prev].kind else {
        return None;
    };
    let (prev_name, prev_angle, _) = cancel_key(prev_gate)?;
    if inverse_of(name) != Some(prev_name) {
        return None;
    }

    // Same qubits: multiset for symmetric diagonal gates, exact order
    // otherwise.
    let prev_args: Vec<&VarAccess> = prev_gate.qargs();
    if prev_args.len() != args.len() {
        return None;
    }
    let same_args = if symmetric {
        let mut a: Vec<&VarAccess> = args.iter().collect();
        let mut b = prev_args.clone();
        a.sort_by_key(|v| (v.reg.clone(), v.offset));
        b.sort_by_key(|v| (v.reg.clone(), v.offset));
        a == b
    } else {
        args.iter().zip(&prev_args).all(|(a, &b)| a == b)
    };
    if !same_args {
        return None;
    }

    // Parameterised pairs must cancel to zero.
    match (angle, prev_angle) {
        (None, None) => Some(prev),
        (Some(a), Some(b)) => (a + b).is_zero().then_some(prev),
        _ => None,
    }
}

/// The cancellation key of a gate: canonical name, optional angle, and
/// whether qubit order is irrelevant.
fn cancel_key(gate: &Gate) -> Option<(&str, Option<Angle>, bool)> {
    match gate {
        Gate::CNot { .. } => Some(("cx", None, false)),
        Gate::Call { name, cargs, qargs } => match (name.as_str(), cargs.as_slice()) {
            ("h" | "x" | "y" | "z" | "s" | "sdg" | "t" | "tdg", []) => {
                Some((name.as_str(), None, false))
            }
            ("cx", []) if qargs.len() == 2 => Some(("cx", None, false)),
            ("cz" | "swap", []) if qargs.len() == 2 => Some((name.as_str(), None, true)),
            ("rx" | "ry" | "rz" | "u1", [theta]) => {
                Some((name.as_str(), Some(Angle::from_expr(theta)), false))
            }
            _ => None,
        },
        _ => None,
    }
}

/// The gate name that inverts the given one.
fn inverse_of(name: &str) -> Option<&'static str> {
    match name {
        "h" => Some("h"),
        "x" => Some("x"),
        "y" => Some("y"),
        "z" => Some("z"),
        "cx" => Some("cx"),
        "cz" => Some("cz"),
        "swap" => Some("swap"),
        "s" => Some("sdg"),
        "sdg" => Some("s"),
        "t" => Some("tdg"),
        "tdg" => Some("t"),
        "rx" => Some("rx"),
        "ry" => Some("ry"),
        "rz" => Some("rz"),
        "u1" => Some("u1"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alsvin_qasm::{emit, parse};

    fn simplify(source: &str) -> String {
        let mut prog = parse(source).unwrap();
        let mut diags = Diagnostics::new();
        Simplify.run(&mut prog, &mut diags).unwrap();
        emit(&prog)
    }

    fn gate_count(printed: &str) -> usize {
        printed
            .lines()
            .filter(|l| {
                let l = l.trim();
                !l.is_empty()
                    && !l.starts_with("OPENQASM")
                    && !l.starts_with("include")
                    && !l.starts_with("qreg")
                    && !l.starts_with("creg")
            })
            .count()
    }

    #[test]
    fn test_hh_cancels() {
        let printed =
            simplify("OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[1];\nh q[0];\nh q[0];\n");
        assert_eq!(gate_count(&printed), 0);
    }

    #[test]
    fn test_s_sdg_cancels() {
        let printed = simplify(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[1];\ns q[0];\nsdg q[0];\n",
        );
        assert_eq!(gate_count(&printed), 0);
    }

    #[test]
    fn test_cx_cx_cancels() {
        let printed = simplify(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\ncx q[0],q[1];\ncx q[0],q[1];\n",
        );
        assert_eq!(gate_count(&printed), 0);
    }

    #[test]
    fn test_cx_reversed_does_not_cancel() {
        let printed = simplify(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\ncx q[0],q[1];\ncx q[1],q[0];\n",
        );
        assert_eq!(gate_count(&printed), 2);
    }

    #[test]
    fn test_cz_symmetric_cancels() {
        let printed = simplify(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\ncz q[0],q[1];\ncz q[1],q[0];\n",
        );
        assert_eq!(gate_count(&printed), 0);
    }

    #[test]
    fn test_rz_opposite_angles_cancel() {
        let printed = simplify(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[1];\n\
             rz(pi/4) q[0];\nrz(-pi/4) q[0];\n",
        );
        assert_eq!(gate_count(&printed), 0);
    }

    #[test]
    fn test_rz_unequal_angles_survive() {
        let printed = simplify(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[1];\n\
             rz(pi/4) q[0];\nrz(pi/4) q[0];\n",
        );
        assert_eq!(gate_count(&printed), 2);
    }

    #[test]
    fn test_intervening_gate_blocks() {
        let printed = simplify(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[1];\nh q[0];\nt q[0];\nh q[0];\n",
        );
        assert_eq!(gate_count(&printed), 3);
    }

    #[test]
    fn test_measurement_blocks() {
        let printed = simplify(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[1];\ncreg c[1];\n\
             h q[0];\nmeasure q[0] -> c[0];\nh q[0];\n",
        );
        assert_eq!(gate_count(&printed), 3);
    }

    #[test]
    fn test_barrier_blocks() {
        let printed = simplify(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[1];\n\
             h q[0];\nbarrier q[0];\nh q[0];\n",
        );
        assert_eq!(gate_count(&printed), 3);
    }

    #[test]
    fn test_cascading_cancellation() {
        // Removing the inner pair exposes the outer pair.
        let printed = simplify(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[1];\n\
             h q[0];\nx q[0];\nx q[0];\nh q[0];\n",
        );
        assert_eq!(gate_count(&printed), 0);
    }

    #[test]
    fn test_disjoint_qubits_do_not_interfere() {
        let printed = simplify(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\n\
             h q[0];\nh q[1];\nh q[0];\nh q[1];\n",
        );
        assert_eq!(gate_count(&printed), 0);
    }

    #[test]
    fn test_partial_overlap_blocks() {
        // The CX touches q[1] between the two H's on q[1].
        let printed = simplify(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\n\
             h q[1];\ncx q[0],q[1];\nh q[1];\n",
        );
        assert_eq!(gate_count(&printed), 3);
    }

    #[test]
    fn test_gate_body_simplified() {
        let printed = simplify(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\ngate foo a { h a; h a; CX a,a; }\n",
        );
        // The H pair inside the body cancels.
        assert!(!printed.contains("h a;"));
    }

    #[test]
    fn test_idempotent() {
        let source = "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\n\
                      h q[0];\ncx q[0],q[1];\nt q[1];\n";
        let mut prog = parse(source).unwrap();
        let mut diags = Diagnostics::new();
        Simplify.run(&mut prog, &mut diags).unwrap();
        let once = emit(&prog);
        Simplify.run(&mut prog, &mut diags).unwrap();
        assert_eq!(emit(&prog), once);
    }
}
