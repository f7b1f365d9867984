//! Steiner-tree resynthesizing mapper.
//!
//! Breaks the laid-out program into cnot-dihedral chunks — maximal runs of
//! {CNOT, Rz, Z, S, Sdg, T, Tdg, U1} — and replaces each chunk by a
//! Gray-Synth-Steiner synthesis confined to the device coupling graph.
//! Non-dihedral statements flush the accumulated chunk and pass through
//! verbatim.
//!
//! No phase merging happens here; that is rotation folding's job upstream.

use alsvin_device::Device;
use alsvin_ir::{Angle, Gate, Program, Stmt, StmtKind, VarAccess};
use alsvin_synth::{CxDihedral, LinearOp, PhaseTerm, gray_steiner, phase_gate};

use crate::PHYSICAL_REGISTER;
use crate::error::{MapError, MapResult};
use crate::layout::as_cnot;

/// Resynthesize a laid-out program onto the device.
///
/// Assumes the program addresses the single physical register (see
/// [`crate::layout::apply_layout`]).
pub fn steiner_mapping(prog: &mut Program, device: &Device) -> MapResult<()> {
    let mut mapper = SteinerMapper::new(device);
    let stmts = std::mem::take(&mut prog.stmts);
    let mut out = Vec::with_capacity(stmts.len());

    for stmt in stmts {
        mapper.map_stmt(stmt, &mut out)?;
    }
    mapper.flush(&mut out)?;

    prog.stmts = out;
    Ok(())
}

struct SteinerMapper<'d> {
    device: &'d Device,
    phases: Vec<PhaseTerm>,
    permutation: LinearOp,
}

impl<'d> SteinerMapper<'d> {
    fn new(device: &'d Device) -> Self {
        SteinerMapper {
            device,
            phases: vec![],
            permutation: LinearOp::identity(device.num_qubits()),
        }
    }

    fn map_stmt(&mut self, stmt: Stmt, out: &mut Vec<Stmt>) -> MapResult<()> {
        match &stmt.kind {
            // Declarations pass through without flushing.
            StmtKind::Include(_)
            | StmtKind::RegisterDecl { .. }
            | StmtKind::AncillaDecl { .. }
            | StmtKind::GateDecl { .. } => out.push(stmt),

            StmtKind::Gate(gate) => {
                if let Some((ctrl, tgt)) = as_cnot(gate) {
                    let ctl = self.index_of(ctrl)?;
                    let tgt = self.index_of(tgt)?;
                    self.permutation.add_row(ctl, tgt);
                } else if let Some((angle, arg)) = as_z_rotation(gate) {
                    let idx = self.index_of(&arg)?;
                    self.add_phase(self.permutation.row(idx).to_vec(), angle);
                } else {
                    self.flush(out)?;
                    out.push(stmt);
                }
            }

            // Everything stateful flushes and passes through.
            StmtKind::Measure { .. } | StmtKind::Reset { .. } | StmtKind::If { .. } => {
                self.flush(out)?;
                out.push(stmt);
            }
        }
        Ok(())
    }

    fn index_of(&self, access: &VarAccess) -> MapResult<usize> {
        if access.reg != PHYSICAL_REGISTER {
            return Err(MapError::UnplacedAccess(access.to_string()));
        }
        let idx = access
            .offset
            .ok_or_else(|| MapError::UnplacedAccess(access.to_string()))?
            as usize;
        if idx >= self.device.num_qubits() {
            return Err(MapError::OutOfRange {
                qubit: idx,
                size: self.device.num_qubits(),
            });
        }
        Ok(idx)
    }

    fn add_phase(&mut self, parity: Vec<bool>, angle: Angle) {
        self.phases.push((parity, angle));
    }

    /// Synthesize the accumulated cnot-dihedral chunk onto the device.
    fn flush(&mut self, out: &mut Vec<Stmt>) -> MapResult<()> {
        if self.phases.is_empty() && self.permutation.is_identity() {
            return Ok(());
        }

        let events = gray_steiner(
            &self.phases,
            self.permutation.clone(),
            self.device,
        )?;

        for event in events {
            match event {
                CxDihedral::Cnot(c, t) => self.emit_cnot(c, t, out)?,
                CxDihedral::Phase(angle, q) => {
                    out.push(Stmt::gate(0, phase_gate(&angle, physical(q))));
                }
            }
        }

        self.phases.clear();
        self.permutation = LinearOp::identity(self.device.num_qubits());
        Ok(())
    }

    /// Emit a synthesized CNOT, Hadamard-wrapped on reversed couplings.
    fn emit_cnot(&self, c: usize, t: usize, out: &mut Vec<Stmt>) -> MapResult<()> {
        if self.device.coupled(c, t) {
            out.push(cnot(c, t));
        } else if self.device.coupled(t, c) {
            out.push(hadamard(c));
            out.push(hadamard(t));
            out.push(cnot(c, t));
            out.push(hadamard(c));
            out.push(hadamard(t));
        } else {
            return Err(MapError::Unroutable { q1: c, q2: t });
        }
        Ok(())
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
        } if theta.is_zero() && phi.is_zero() => Some((Angle::from_expr(lambda), arg.clone())),
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

fn physical(q: usize) -> VarAccess {
    VarAccess::offset(PHYSICAL_REGISTER, u32::try_from(q).unwrap_or(u32::MAX))
}

fn cnot(ctrl: usize, tgt: usize) -> Stmt {
    Stmt::gate(
        0,
        Gate::Call {
            name: "cx".into(),
            cargs: vec![],
            qargs: vec![physical(ctrl), physical(tgt)],
        },
    )
}

fn hadamard(q: usize) -> Stmt {
    Stmt::gate(
        0,
        Gate::Call {
            name: "h".into(),
            cargs: vec![],
            qargs: vec![physical(q)],
        },
    )
}
