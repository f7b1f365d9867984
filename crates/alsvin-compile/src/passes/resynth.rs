//! CNOT resynthesis.
//!
//! Extracts maximal cnot-dihedral sub-circuits — runs of {CNOT, Rz, Z, S,
//! Sdg, T, Tdg, U1} — as a phase polynomial plus linear permutation, and
//! replaces each with its Gray-Synth network (arXiv:1712.01859). Anything
//! outside the fragment flushes the accumulated operator into the program
//! right before it.

use rustc_hash::FxHashMap;

use alsvin_ir::visit::Rewriter;
use alsvin_ir::{Angle, Gate, Program, Stmt, StmtKind, VarAccess};
use alsvin_synth::{CxDihedral, LinearOp, PhaseTerm, gray_synth, phase_gate};

use crate::diagnostics::Diagnostics;
use crate::error::CompileResult;
use crate::pass::Pass;

/// The CNOT-resynthesis pass.
pub struct ResynthesizeCnots;

impl Pass for ResynthesizeCnots {
    fn name(&self) -> &'static str {
        "ResynthesizeCnots"
    }

    fn run(&self, program: &mut Program, _diagnostics: &mut Diagnostics) -> CompileResult<()> {
        let mut rewriter = ResynthRewriter::new();
        rewriter.rewrite_program(program);
        Ok(())
    }
}

/// Per-scope extraction state.
struct State {
    qubit_of: FxHashMap<VarAccess, usize>,
    access_of: Vec<VarAccess>,
    phases: Vec<PhaseTerm>,
    permutation: LinearOp,
}

impl State {
    fn new() -> Self {
        State {
            qubit_of: FxHashMap::default(),
            access_of: vec![],
            phases: vec![],
            permutation: LinearOp::identity(0),
        }
    }

    /// Dense index of an access, growing the permutation and every pending
    /// parity on first sight.
    fn index(&mut self, access: &VarAccess) -> usize {
        if let Some(&idx) = self.qubit_of.get(access) {
            return idx;
        }
        let idx = self.access_of.len();
        self.qubit_of.insert(access.clone(), idx);
        self.access_of.push(access.clone());
        self.permutation.extend_identity();
        for (parity, _) in &mut self.phases {
            parity.push(false);
        }
        idx
    }

    fn add_phase(&mut self, parity: Vec<bool>, angle: Angle) {
        if let Some((_, existing)) = self.phases.iter_mut().find(|(p, _)| *p == parity) {
            *existing += angle;
        } else {
            self.phases.push((parity, angle));
        }
    }

    /// Synthesize and reset the accumulated cnot-dihedral operator.
    fn flush(&mut self, line: u32) -> Vec<Stmt> {
        if self.phases.is_empty() && self.permutation.is_identity() {
            return vec![];
        }

        let events = gray_synth(&self.phases, self.permutation.clone());
        let mut out = Vec::with_capacity(events.len());
        for event in events {
            match event {
                CxDihedral::Cnot(c, t) => out.push(Stmt::gate(
                    line,
                    Gate::Call {
                        name: "cx".into(),
                        cargs: vec![],
                        qargs: vec![self.access_of[c].clone(), self.access_of[t].clone()],
                    },
                )),
                CxDihedral::Phase(angle, q) => {
                    out.push(Stmt::gate(line, phase_gate(&angle, self.access_of[q].clone())));
                }
            }
        }

        self.phases.clear();
        self.permutation = LinearOp::identity(self.access_of.len());
        out
    }
}

struct ResynthRewriter {
    state: State,
    saved: Vec<State>,
}

impl ResynthRewriter {
    fn new() -> Self {
        ResynthRewriter {
            state: State::new(),
            saved: vec![],
        }
    }

    /// Recognize a diagonal Z-axis rotation and its angle.
    fn as_z_rotation(gate: &Gate) -> Option<(Angle, VarAccess)> {
        match gate {
            Gate::U {
                theta,
                phi,
                lambda,
                arg,
            } if theta.is_zero() && phi.is_zero() => {
                Some((Angle::from_expr(lambda), arg.clone()))
            }
            Gate::Call { name, cargs, qargs } if qargs.len() == 1 => {
                let arg = qargs[0].clone();
                match (name.as_str(), cargs.as_slice()) {
                    ("rz" | "u1", [theta]) => Some((Angle::from_expr(theta), arg)),
                    ("z", []) => Some((Angle::PI, arg)),
                    ("s", []) => Some((Angle::PI_HALF, arg)),
                    ("sdg", []) => Some((-Angle::PI_HALF, arg)),
                    ("t", []) => Some((Angle::PI_QUARTER, arg)),
                    ("tdg", []) => Some((-Angle::PI_QUARTER, arg)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn as_cnot(gate: &Gate) -> Option<(&VarAccess, &VarAccess)> {
        match gate {
            Gate::CNot { ctrl, tgt } => Some((ctrl, tgt)),
            Gate::Call { name, qargs, .. } if name == "cx" && qargs.len() == 2 => {
                Some((&qargs[0], &qargs[1]))
            }
            _ => None,
        }
    }

    /// Broadcast (whole-register) arguments cannot be tracked per qubit.
    fn has_broadcast(gate: &Gate) -> bool {
        gate.qargs().iter().any(|a| a.offset.is_none())
    }
}

impl Rewriter for ResynthRewriter {
    fn replace_register_decl(&mut self, stmt: Stmt) -> Vec<Stmt> {
        if let StmtKind::RegisterDecl {
            name,
            quantum: true,
            size,
        } = &stmt.kind
        {
            for i in 0..*size {
                self.state.index(&VarAccess::offset(name, i));
            }
        }
        vec![stmt]
    }

    fn replace_ancilla_decl(&mut self, stmt: Stmt) -> Vec<Stmt> {
        if let StmtKind::AncillaDecl { name, size, .. } = &stmt.kind {
            for i in 0..*size {
                self.state.index(&VarAccess::offset(name, i));
            }
        }
        vec![stmt]
    }

    fn enter_gate_decl(&mut self, _name: &str, _c_params: &[String], q_params: &[String]) {
        let mut fresh = State::new();
        std::mem::swap(&mut self.state, &mut fresh);
        self.saved.push(fresh);
        // Formals are single qubits, registered in declaration order.
        for param in q_params {
            self.state.index(&VarAccess::var(param));
        }
    }

    fn exit_gate_decl(&mut self, _name: &str) -> Vec<Stmt> {
        let tail = self.state.flush(0);
        if let Some(saved) = self.saved.pop() {
            self.state = saved;
        }
        tail
    }

    fn replace_gate(&mut self, line: u32, gate: Gate) -> Vec<Stmt> {
        // A formal parameter is a single qubit even without an offset, but
        // only inside a gate body; at program scope a bare name is a
        // register and the gate must flush. The state's interner tracks
        // formals because gate bodies register them on first use.
        if Self::has_broadcast(&gate) && self.saved.is_empty() {
            let mut out = self.state.flush(line);
            out.push(Stmt::gate(line, gate));
            return out;
        }

        if let Some((ctrl, tgt)) = Self::as_cnot(&gate) {
            let (ctrl, tgt) = (ctrl.clone(), tgt.clone());
            let c = self.state.index(&ctrl);
            let t = self.state.index(&tgt);
            self.state.permutation.add_row(c, t);
            return vec![];
        }

        if let Some((angle, arg)) = Self::as_z_rotation(&gate) {
            let idx = self.state.index(&arg);
            let parity = self.state.permutation.row(idx).to_vec();
            self.state.add_phase(parity, angle);
            return vec![];
        }

        let mut out = self.state.flush(line);
        out.push(Stmt::gate(line, gate));
        out
    }

    fn replace_measure(&mut self, stmt: Stmt) -> Vec<Stmt> {
        let mut out = self.state.flush(stmt.line);
        out.push(stmt);
        out
    }

    fn replace_reset(&mut self, stmt: Stmt) -> Vec<Stmt> {
        let mut out = self.state.flush(stmt.line);
        out.push(stmt);
        out
    }

    fn replace_if(&mut self, stmt: Stmt) -> Vec<Stmt> {
        let mut out = self.state.flush(stmt.line);
        out.push(stmt);
        out
    }

    fn finish(&mut self) -> Vec<Stmt> {
        self.state.flush(0)
    }
}
