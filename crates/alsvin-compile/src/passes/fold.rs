//! Rotation folding.
//!
//! Merges phase rotations through Clifford context (arXiv:1903.12456).
//! Each sub-program (gate bodies, then the program body) is walked forward
//! accumulating a word in the Pauli channel representation:
//!
//! - Clifford gates compose into a running frame. The frame stores the
//!   *dagger* of the accumulated Clifford so a rotation commuted left
//!   through it lands at the start of the current segment, letting the
//!   traversal stay forward.
//! - Rotations are committed as Pauli-rotation events, already conjugated
//!   into segment-start form.
//! - Anything opaque (barriers, measurements, resets, conditionals, unknown
//!   calls) closes the segment: the frame is committed as a Clifford event
//!   followed by an uninterpreted block over the touched qubits.
//!
//! A reverse sweep then merges each rotation with the nearest earlier
//! rotation of equal Pauli, commuting it backwards past commuting rotations
//! and through committed Clifford frames, and stopping at intersecting
//! uninterpreted blocks. Merges only delete statements or update angles in
//! place, so gate count and T-count never increase.
//!
//! A merged pair whose Paulis aligned only up to sign leaves a global phase
//! behind; the accumulated total is surfaced as a note.

use rustc_hash::{FxHashMap, FxHashSet};

use alsvin_ir::{Angle, Expr, Gate, Program, Stmt, StmtKind, VarAccess};
use alsvin_synth::{Clifford, Rotation, phase_gate};

use crate::diagnostics::Diagnostics;
use crate::error::CompileResult;
use crate::pass::Pass;

/// The rotation-folding pass.
pub struct FoldRotations;

impl Pass for FoldRotations {
    fn name(&self) -> &'static str {
        "FoldRotations"
    }

    fn run(&self, program: &mut Program, diagnostics: &mut Diagnostics) -> CompileResult<()> {
        // Gate bodies are folded independently, before the scopes that
        // inline them.
        for stmt in &mut program.stmts {
            if let StmtKind::GateDecl {
                name,
                q_params,
                body: Some(body),
                ..
            } = &mut stmt.kind
            {
                let location = format!("gate {name}");
                let singles: FxHashSet<String> = q_params.iter().cloned().collect();
                fold_scope(body, &location, &singles, diagnostics);
            }
        }
        fold_scope(
            &mut program.stmts,
            "<program>",
            &FxHashSet::default(),
            diagnostics,
        );
        Ok(())
    }
}

/// One event of the accumulated channel word.
enum Event {
    Rot {
        rotation: Rotation,
        /// Index of the originating statement in the scope.
        node: usize,
        /// Whether the stored angle is the negation of the gate's angle.
        flipped: bool,
    },
    Cliff(Clifford),
    Uninterp(Vec<usize>),
}

/// What to do with a statement after folding.
enum Replacement {
    Delete,
    /// New angle in the gate's own frame.
    Angle(Angle),
}

fn fold_scope(
    stmts: &mut Vec<Stmt>,
    location: &str,
    singles: &FxHashSet<String>,
    diags: &mut Diagnostics,
) {
    let interner = Interner::build(stmts, singles);
    let n = interner.len();

    // Forward pass: build the channel word.
    let mut events: Vec<Event> = vec![];
    let mut current = Clifford::identity(n);
    let mut dropped_phase = Angle::ZERO;

    for (index, stmt) in stmts.iter().enumerate() {
        match classify(stmt, &interner) {
            Kind::Skip => {}
            Kind::Cliff(gate) => current = current.compose(&gate),
            Kind::Rot(base) => {
                let original = base.theta.clone();
                let (rotation, flipped) = base.commute_left(&current);
                if flipped {
                    dropped_phase += original;
                }
                events.push(Event::Rot {
                    rotation,
                    node: index,
                    flipped,
                });
            }
            Kind::Uninterp(qubits) => {
                events.push(Event::Cliff(std::mem::replace(
                    &mut current,
                    Clifford::identity(n),
                )));
                events.push(Event::Uninterp(qubits));
            }
        }
    }
    events.push(Event::Cliff(current));

    // Reverse folding sweep.
    let mut alive = vec![true; events.len()];
    let mut replacements: FxHashMap<usize, Replacement> = FxHashMap::default();

    for pos in (0..events.len()).rev() {
        if !alive[pos] {
            continue;
        }
        let Event::Rot {
            rotation,
            node,
            flipped,
        } = &events[pos]
        else {
            continue;
        };
        let (node, flipped) = (*node, *flipped);
        let mut op = rotation.clone();
        // Sign between op's travelling frame and its stored frame.
        let mut travel_flipped = false;
        let mut merged = None;

        for j in (0..pos).rev() {
            if !alive[j] {
                continue;
            }
            match &events[j] {
                Event::Cliff(frame) => {
                    let before = op.theta.clone();
                    let (moved, negated) = op.commute_left(frame);
                    if negated {
                        travel_flipped = !travel_flipped;
                        dropped_phase += before;
                    }
                    op = moved;
                }
                Event::Uninterp(qubits) => {
                    if !op.commutes_with_qubits(qubits) {
                        break;
                    }
                }
                Event::Rot {
                    rotation: earlier,
                    node: earlier_node,
                    ..
                } => {
                    if op.pauli == earlier.pauli {
                        let sum = op.theta.clone() + earlier.theta.clone();
                        alive[j] = false;
                        replacements.insert(*earlier_node, Replacement::Delete);
                        merged = Some(sum);
                        break;
                    } else if !op.commutes_with(earlier) {
                        break;
                    }
                }
            }
        }

        if let Some(sum) = merged {
            if sum.is_zero() {
                replacements.insert(node, Replacement::Delete);
            } else {
                // Back from the merge frame into the gate's own frame.
                let mut theta = sum;
                if travel_flipped {
                    theta = -theta;
                }
                if flipped {
                    theta = -theta;
                }
                replacements.insert(node, Replacement::Angle(theta));
            }
        }
    }

    // Apply replacements.
    if !replacements.is_empty() {
        let mut index = 0;
        let mut out = Vec::with_capacity(stmts.len());
        for stmt in stmts.drain(..) {
            match replacements.get(&index) {
                None => out.push(stmt),
                Some(Replacement::Delete) => {}
                Some(Replacement::Angle(theta)) => {
                    if let Some(updated) = with_angle(&stmt, theta) {
                        out.push(updated);
                    }
                }
            }
            index += 1;
        }
        *stmts = out;
    }

    if !dropped_phase.is_zero() {
        diags.note(
            location,
            format!("rotation folding dropped a global phase of {dropped_phase}"),
        );
    }
}

/// Rewrite a rotation statement with a new angle, preserving its axis.
fn with_angle(stmt: &Stmt, theta: &Angle) -> Option<Stmt> {
    let StmtKind::Gate(Gate::Call { name, qargs, .. }) = &stmt.kind else {
        return None;
    };
    let arg = qargs.first()?.clone();
    let gate = match name.as_str() {
        "rx" => Gate::Call {
            name: "rx".into(),
            cargs: vec![theta.to_expr()],
            qargs: vec![arg],
        },
        "ry" => Gate::Call {
            name: "ry".into(),
            cargs: vec![theta.to_expr()],
            qargs: vec![arg],
        },
        _ => phase_gate(theta, arg),
    };
    Some(Stmt::gate(stmt.line, gate))
}

/// Qubit interner for one scope.
///
/// Dereferenced accesses get dense ids; so do bare names listed in
/// `singles` (gate formals, which denote single qubits). Any other bare
/// access is a whole register and only contributes to uninterpreted
/// footprints.
struct Interner {
    ids: FxHashMap<VarAccess, usize>,
    by_register: FxHashMap<String, Vec<usize>>,
    singles: FxHashSet<String>,
}

impl Interner {
    fn build(stmts: &[Stmt], singles: &FxHashSet<String>) -> Self {
        let mut interner = Interner {
            ids: FxHashMap::default(),
            by_register: FxHashMap::default(),
            singles: singles.clone(),
        };
        for stmt in stmts {
            interner.scan(stmt);
        }
        interner
    }

    fn scan(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Gate(gate) => {
                for arg in gate.qargs() {
                    self.intern(arg);
                }
            }
            StmtKind::Measure { qarg, .. } => self.intern(qarg),
            StmtKind::Reset { arg } => self.intern(arg),
            StmtKind::If { then, .. } => self.scan(then),
            _ => {}
        }
    }

    fn intern(&mut self, access: &VarAccess) {
        if access.offset.is_none() && !self.singles.contains(&access.reg) {
            // Whole-register accesses only ever appear in uninterpreted
            // blocks; they expand to the register's known elements.
            return;
        }
        if !self.ids.contains_key(access) {
            let id = self.ids.len();
            self.ids.insert(access.clone(), id);
            self.by_register
                .entry(access.reg.clone())
                .or_default()
                .push(id);
        }
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    fn get(&self, access: &VarAccess) -> Option<usize> {
        self.ids.get(access).copied()
    }

    /// The qubit-id footprint of an argument list. Whole-register accesses
    /// cover every known element of the register.
    fn footprint<'a>(&self, args: impl Iterator<Item = &'a VarAccess>) -> Vec<usize> {
        let mut out = vec![];
        for arg in args {
            if let Some(id) = self.get(arg) {
                out.push(id);
            } else if arg.offset.is_none() {
                if let Some(ids) = self.by_register.get(&arg.reg) {
                    out.extend(ids.iter().copied());
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }
}

enum Kind {
    Skip,
    Cliff(Clifford),
    Rot(Rotation),
    Uninterp(Vec<usize>),
}

/// Classify a statement as Clifford, rotation, or opaque.
fn classify(stmt: &Stmt, interner: &Interner) -> Kind {
    let n = interner.len();
    match &stmt.kind {
        StmtKind::Include(_)
        | StmtKind::RegisterDecl { .. }
        | StmtKind::AncillaDecl { .. }
        | StmtKind::GateDecl { .. } => Kind::Skip,

        StmtKind::Measure { qarg, .. } => {
            Kind::Uninterp(interner.footprint(std::iter::once(qarg)))
        }
        StmtKind::Reset { arg } => Kind::Uninterp(interner.footprint(std::iter::once(arg))),
        StmtKind::If { then, .. } => match then.qargs() {
            Some(args) => Kind::Uninterp(interner.footprint(args.into_iter())),
            None => Kind::Skip,
        },

        StmtKind::Gate(gate) => match gate {
            Gate::U { arg, .. } => Kind::Uninterp(interner.footprint(std::iter::once(arg))),
            Gate::CNot { ctrl, tgt } => match (interner.get(ctrl), interner.get(tgt)) {
                (Some(c), Some(t)) => Kind::Cliff(Clifford::cx(n, c, t)),
                _ => Kind::Uninterp(interner.footprint([ctrl, tgt].into_iter())),
            },
            Gate::Barrier { args } => Kind::Uninterp(interner.footprint(args.iter())),
            Gate::Call { name, cargs, qargs } => {
                classify_call(name, cargs, qargs, interner)
            }
        },
    }
}

fn classify_call(name: &str, cargs: &[Expr], qargs: &[VarAccess], interner: &Interner) -> Kind {
    let n = interner.len();
    let opaque = || Kind::Uninterp(interner.footprint(qargs.iter()));

    let single = || qargs.first().and_then(|a| interner.get(a));
    let pair = || match qargs {
        [a, b] => interner.get(a).zip(interner.get(b)),
        _ => None,
    };

    match (name, cargs.len(), qargs.len()) {
        ("id", 0, 1) => Kind::Skip,

        // The frame stores the dagger, so each Clifford composes as its
        // inverse.
        ("h", 0, 1) => single().map_or_else(opaque, |q| Kind::Cliff(Clifford::h(n, q))),
        ("x", 0, 1) => single().map_or_else(opaque, |q| Kind::Cliff(Clifford::x(n, q))),
        ("y", 0, 1) => single().map_or_else(opaque, |q| Kind::Cliff(Clifford::y(n, q))),
        ("z", 0, 1) => single().map_or_else(opaque, |q| Kind::Cliff(Clifford::z(n, q))),
        ("s", 0, 1) => single().map_or_else(opaque, |q| Kind::Cliff(Clifford::sdg(n, q))),
        ("sdg", 0, 1) => single().map_or_else(opaque, |q| Kind::Cliff(Clifford::s(n, q))),
        ("cx", 0, 2) => pair().map_or_else(opaque, |(c, t)| Kind::Cliff(Clifford::cx(n, c, t))),
        ("cz", 0, 2) => pair().map_or_else(opaque, |(a, b)| Kind::Cliff(Clifford::cz(n, a, b))),

        ("t", 0, 1) => single().map_or_else(opaque, |q| Kind::Rot(Rotation::t(n, q))),
        ("tdg", 0, 1) => single().map_or_else(opaque, |q| Kind::Rot(Rotation::tdg(n, q))),
        ("rz" | "u1", 1, 1) => single().map_or_else(opaque, |q| {
            Kind::Rot(Rotation::rz(Angle::from_expr(&cargs[0]), n, q))
        }),
        ("rx", 1, 1) => single().map_or_else(opaque, |q| {
            Kind::Rot(Rotation::rx(Angle::from_expr(&cargs[0]), n, q))
        }),
        ("ry", 1, 1) => single().map_or_else(opaque, |q| {
            Kind::Rot(Rotation::ry(Angle::from_expr(&cargs[0]), n, q))
        }),

        _ => opaque(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alsvin_qasm::{emit, parse};

    fn fold(source: &str) -> String {
        let mut prog = parse(source).unwrap();
        let mut diags = Diagnostics::new();
        FoldRotations.run(&mut prog, &mut diags).unwrap();
        emit(&prog)
    }

    fn gate_lines(printed: &str) -> Vec<&str> {
        printed
            .lines()
            .map(str::trim)
            .filter(|l| {
                !l.is_empty()
                    && !l.starts_with("OPENQASM")
                    && !l.starts_with("include")
                    && !l.starts_with("qreg")
                    && !l.starts_with("creg")
            })
            .collect()
    }

    #[test]
    fn test_t_merge_gives_s() {
        let printed =
            fold("OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[1];\nt q[0];\nt q[0];\n");
        assert_eq!(gate_lines(&printed), vec!["s q[0];"]);
    }

    #[test]
    fn test_t_cancel() {
        let printed =
            fold("OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[1];\nt q[0];\ntdg q[0];\n");
        assert!(gate_lines(&printed).is_empty());
    }

    #[test]
    fn test_conjugated_merge_across_x() {
        // Before the cleanup simplification: the two H·T·H sandwiches
        // merge across the X into a single S.
        let printed = fold(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[1];\n\
             h q[0];\nt q[0];\nh q[0];\nx q[0];\nh q[0];\nt q[0];\nh q[0];\n",
        );
        let lines = gate_lines(&printed);
        assert_eq!(
            lines,
            vec!["h q[0];", "h q[0];", "x q[0];", "h q[0];", "s q[0];", "h q[0];"]
        );
    }

    #[test]
    fn test_merge_through_cnot_control() {
        // T on the control commutes with CX; the two merge.
        let printed = fold(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\n\
             t q[0];\ncx q[0],q[1];\nt q[0];\n",
        );
        let lines = gate_lines(&printed);
        assert_eq!(lines, vec!["cx q[0],q[1];", "s q[0];"]);
    }

    #[test]
    fn test_x_conjugation_cancels_pair() {
        // t; x; t; x — the second T is conjugated to Tdg and cancels the
        // first, leaving the Paulis (and a dropped global phase).
        let mut prog = parse(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[1];\n\
             t q[0];\nx q[0];\nt q[0];\nx q[0];\n",
        )
        .unwrap();
        let mut diags = Diagnostics::new();
        FoldRotations.run(&mut prog, &mut diags).unwrap();
        let lines: Vec<String> = gate_lines(&emit(&prog))
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(lines, vec!["x q[0];", "x q[0];"]);
        // The dropped global phase is surfaced as a note.
        assert!(!diags.is_empty());
    }

    #[test]
    fn test_measurement_blocks_merge() {
        let printed = fold(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[1];\ncreg c[1];\n\
             t q[0];\nmeasure q[0] -> c[0];\nt q[0];\n",
        );
        let lines = gate_lines(&printed);
        assert_eq!(lines.len(), 3);
        assert!(lines.contains(&"measure q[0] -> c[0];"));
    }

    #[test]
    fn test_rotation_on_other_qubit_commutes_past() {
        // The T on q[1] sits between the two T's on q[0] but commutes.
        let printed = fold(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\n\
             t q[0];\nt q[1];\nt q[0];\n",
        );
        let lines = gate_lines(&printed);
        assert_eq!(lines, vec!["t q[1];", "s q[0];"]);
    }

    #[test]
    fn test_rz_angles_sum() {
        let printed = fold(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[1];\n\
             rz(pi/8) q[0];\nrz(pi/8) q[0];\n",
        );
        assert_eq!(gate_lines(&printed), vec!["rz(pi/4) q[0];"]);
    }

    #[test]
    fn test_t_count_reduction() {
        // T-count drops from 2 to 1: t · s · t = rz(pi) · ... with the two
        // T's merging through the Clifford S.
        let printed = fold(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[1];\n\
             t q[0];\ns q[0];\nt q[0];\n",
        );
        let lines = gate_lines(&printed);
        assert_eq!(lines, vec!["s q[0];", "s q[0];"]);
    }

    #[test]
    fn test_rx_merge_through_hadamard() {
        // H Rz H = Rx; an rx merges with a conjugated rz.
        let printed = fold(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[1];\n\
             rx(pi/4) q[0];\nh q[0];\nrz(pi/4) q[0];\nh q[0];\n",
        );
        let lines = gate_lines(&printed);
        assert_eq!(lines, vec!["h q[0];", "s q[0];", "h q[0];"]);
    }

    #[test]
    fn test_gate_bodies_folded_independently() {
        let printed = fold(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\n\
             gate foo a { t a; t a; }\nqreg q[1];\nfoo q[0];\nt q[0];\n",
        );
        assert!(printed.contains("gate foo a {\n  s a;\n}"));
        assert!(printed.contains("t q[0];"));
    }

    #[test]
    fn test_gate_count_never_grows() {
        let source = "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\n\
                      h q[0];\nt q[0];\ncx q[0],q[1];\ntdg q[1];\nh q[1];\nt q[0];\n";
        let before = gate_lines(source).len();
        let printed = fold(source);
        assert!(gate_lines(&printed).len() <= before);
    }
}
