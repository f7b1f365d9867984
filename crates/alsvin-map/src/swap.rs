//! Shortest-path SWAP-insertion mapper.
//!
//! Walks the laid-out program front to back keeping a permutation from
//! initial to current physical positions. Every access is remapped through
//! the permutation; a CNOT whose endpoints are not coupled is routed along
//! the device shortest path by swapping the control toward the target, each
//! SWAP decomposed into three CNOTs with Hadamard wrapping where the device
//! lacks the needed direction.

use alsvin_device::Device;
use alsvin_ir::{Gate, Program, Stmt, StmtKind, VarAccess};

use crate::PHYSICAL_REGISTER;
use crate::error::{MapError, MapResult};
use crate::layout::as_cnot;

/// A classical condition carried down from an `if` statement.
type Condition = Option<(String, u64)>;

/// Map a laid-out program onto the device by SWAP insertion.
///
/// Assumes the program addresses the single physical register (see
/// [`crate::layout::apply_layout`]). Gate declarations pass through
/// untouched; call inlining precedes mapping in the pipeline.
pub fn map_onto_device(prog: &mut Program, device: &Device) -> MapResult<()> {
    let mut mapper = SwapMapper::new(device);
    let stmts = std::mem::take(&mut prog.stmts);
    let mut out = Vec::with_capacity(stmts.len());
    for stmt in stmts {
        mapper.map_stmt(stmt, None, &mut out)?;
    }
    prog.stmts = out;
    Ok(())
}

struct SwapMapper<'d> {
    device: &'d Device,
    /// `permutation[p]` is the current position of the qubit that started
    /// at physical position `p`.
    permutation: Vec<usize>,
}

impl<'d> SwapMapper<'d> {
    fn new(device: &'d Device) -> Self {
        SwapMapper {
            device,
            permutation: (0..device.num_qubits()).collect(),
        }
    }

    fn map_stmt(&mut self, stmt: Stmt, cond: Condition, out: &mut Vec<Stmt>) -> MapResult<()> {
        let line = stmt.line;
        match stmt.kind {
            // Declarations pass through.
            StmtKind::Include(_)
            | StmtKind::RegisterDecl { .. }
            | StmtKind::AncillaDecl { .. }
            | StmtKind::GateDecl { .. } => out.push(Stmt::new(line, stmt.kind)),

            StmtKind::If { reg, value, then } => {
                // SWAPs only relabel positions, so routing may happen
                // unconditionally; the data operation alone stays under the
                // condition.
                self.map_stmt(*then, Some((reg, value)), out)?;
            }

            StmtKind::Gate(gate) => {
                let cnot_args = as_cnot(&gate).map(|(c, t)| (c.clone(), t.clone()));
                match cnot_args {
                    Some((ctrl, tgt)) => {
                        let ctl = self.remap_index(&ctrl)?;
                        let tgt = self.remap_index(&tgt)?;
                        self.route_cnot(line, ctl, tgt, cond, out)?;
                    }
                    None => {
                        let mut stmt = Stmt::gate(line, gate);
                        self.remap_stmt_args(&mut stmt)?;
                        out.push(conditionalize(stmt, cond));
                    }
                }
            }

            kind => {
                let mut stmt = Stmt::new(line, kind);
                self.remap_stmt_args(&mut stmt)?;
                out.push(conditionalize(stmt, cond));
            }
        }
        Ok(())
    }

    /// Remap every physical access of a statement through the permutation.
    fn remap_stmt_args(&self, stmt: &mut Stmt) -> MapResult<()> {
        let mut result = Ok(());
        alsvin_ir::visit::for_each_access_mut(std::slice::from_mut(stmt), &mut |access| {
            if access.reg == PHYSICAL_REGISTER && result.is_ok() {
                match self.remap_index(access) {
                    Ok(p) => access.offset = Some(u32::try_from(p).unwrap_or(u32::MAX)),
                    Err(err) => result = Err(err),
                }
            }
        });
        result
    }

    /// Resolve an access to its current physical index.
    fn remap_index(&self, access: &VarAccess) -> MapResult<usize> {
        if access.reg != PHYSICAL_REGISTER {
            return Err(MapError::UnplacedAccess(access.to_string()));
        }
        let initial = access
            .offset
            .ok_or_else(|| MapError::UnplacedAccess(access.to_string()))?
            as usize;
        if initial >= self.device.num_qubits() {
            return Err(MapError::OutOfRange {
                qubit: initial,
                size: self.device.num_qubits(),
            });
        }
        Ok(self.permutation[initial])
    }

    /// Route a CNOT along the device shortest path.
    fn route_cnot(
        &mut self,
        line: u32,
        ctl: usize,
        tgt: usize,
        cond: Condition,
        out: &mut Vec<Stmt>,
    ) -> MapResult<()> {
        let path = self
            .device
            .shortest_path(ctl, tgt)
            .ok_or(MapError::Unroutable { q1: ctl, q2: tgt })?;

        let mut current = ctl;
        for &step in &path[1..] {
            if step == tgt {
                self.emit_cnot(line, current, step, cond.clone(), out);
            } else {
                self.emit_swap(line, current, step, out);
                // The walking qubit now lives at `step`.
                for entry in &mut self.permutation {
                    if *entry == current {
                        *entry = step;
                    } else if *entry == step {
                        *entry = current;
                    }
                }
                current = step;
            }
        }
        Ok(())
    }

    /// Emit a CNOT, Hadamard-wrapped when only the reverse coupling exists.
    ///
    /// Only the data CNOT picks up the condition: the wrapping Hadamards
    /// cancel pairwise when the condition is false.
    fn emit_cnot(&self, line: u32, ctrl: usize, tgt: usize, cond: Condition, out: &mut Vec<Stmt>) {
        if self.device.coupled(ctrl, tgt) {
            out.push(conditionalize(cnot(line, ctrl, tgt), cond));
        } else {
            out.push(hadamard(line, ctrl));
            out.push(hadamard(line, tgt));
            out.push(conditionalize(cnot(line, ctrl, tgt), cond));
            out.push(hadamard(line, ctrl));
            out.push(hadamard(line, tgt));
        }
    }

    /// Emit a SWAP as three CNOTs, oriented along the available couplings.
    fn emit_swap(&self, line: u32, a: usize, b: usize, out: &mut Vec<Stmt>) {
        let (i, j) = if self.device.coupled(a, b) { (a, b) } else { (b, a) };
        out.push(cnot(line, i, j));
        if self.device.coupled(j, i) {
            out.push(cnot(line, j, i));
        } else {
            out.push(hadamard(line, i));
            out.push(hadamard(line, j));
            out.push(cnot(line, i, j));
            out.push(hadamard(line, i));
            out.push(hadamard(line, j));
        }
        out.push(cnot(line, i, j));
    }
}

fn conditionalize(stmt: Stmt, cond: Condition) -> Stmt {
    match cond {
        None => stmt,
        Some((reg, value)) => Stmt::new(
            stmt.line,
            StmtKind::If {
                reg,
                value,
                then: Box::new(stmt),
            },
        ),
    }
}

fn cnot(line: u32, ctrl: usize, tgt: usize) -> Stmt {
    Stmt::gate(
        line,
        Gate::Call {
            name: "cx".into(),
            cargs: vec![],
            qargs: vec![physical(ctrl), physical(tgt)],
        },
    )
}

fn hadamard(line: u32, q: usize) -> Stmt {
    Stmt::gate(
        line,
        Gate::Call {
            name: "h".into(),
            cargs: vec![],
            qargs: vec![physical(q)],
        },
    )
}

fn physical(q: usize) -> VarAccess {
    VarAccess::offset(PHYSICAL_REGISTER, u32::try_from(q).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alsvin_qasm::{emit, parse};

    fn count_gates(prog: &Program, name: &str) -> usize {
        prog.stmts
            .iter()
            .filter(|s| matches!(&s.kind, StmtKind::Gate(Gate::Call { name: n, .. }) if n == name))
            .count()
    }

    #[test]
    fn test_adjacent_cnot_untouched() {
        let mut prog = parse(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[3];\ncx q[0],q[1];\n",
        )
        .unwrap();
        map_onto_device(&mut prog, &Device::line(3)).unwrap();
        assert_eq!(count_gates(&prog, "cx"), 1);
        assert_eq!(count_gates(&prog, "h"), 0);
    }

    #[test]
    fn test_distance_two_routing_gives_four_cnots() {
        // cx q[0],q[2] on a 3-qubit line: one SWAP (three CNOTs) on the
        // first edge, then the CNOT on the second.
        let mut prog = parse(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[3];\ncx q[0],q[2];\n",
        )
        .unwrap();
        map_onto_device(&mut prog, &Device::line(3)).unwrap();

        assert_eq!(count_gates(&prog, "cx"), 4);
        let printed = emit(&prog);
        assert!(printed.contains("cx q[0],q[1];"));
        assert!(printed.contains("cx q[1],q[0];"));
        assert!(printed.contains("cx q[1],q[2];"));
    }

    #[test]
    fn test_every_cnot_lands_on_coupling() {
        let device = Device::ring(5);
        let mut prog = parse(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[5];\n\
             cx q[0],q[2];\ncx q[4],q[1];\ncx q[3],q[0];\n",
        )
        .unwrap();
        map_onto_device(&mut prog, &device).unwrap();

        for stmt in &prog.stmts {
            if let StmtKind::Gate(gate) = &stmt.kind {
                if let Some((c, t)) = as_cnot(gate) {
                    let c = c.offset.unwrap() as usize;
                    let t = t.offset.unwrap() as usize;
                    assert!(device.coupled(c, t), "cx q[{c}],q[{t}] is not a coupling");
                }
            }
        }
    }

    #[test]
    fn test_permutation_remaps_later_gates() {
        // After routing cx q[0],q[2], the qubit that started at position 0
        // sits at position 1; a later h q[0] must follow it there.
        let mut prog = parse(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[3];\ncx q[0],q[2];\nh q[0];\n",
        )
        .unwrap();
        map_onto_device(&mut prog, &Device::line(3)).unwrap();

        let printed = emit(&prog);
        assert!(printed.ends_with("h q[1];\n"), "got:\n{printed}");
    }

    #[test]
    fn test_reversed_coupling_gets_hadamard_wrap() {
        // Directed device: only 1 → 0 exists.
        let device = Device::new("directed", 2, &[(1, 0)]);
        let mut prog = parse(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\ncx q[0],q[1];\n",
        )
        .unwrap();
        map_onto_device(&mut prog, &device).unwrap();

        assert_eq!(count_gates(&prog, "cx"), 1);
        assert_eq!(count_gates(&prog, "h"), 4);
    }

    #[test]
    fn test_unroutable_reports_error() {
        let device = Device::new("split", 4, &[(0, 1), (1, 0), (2, 3), (3, 2)]);
        let mut prog = parse(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[4];\ncx q[0],q[3];\n",
        )
        .unwrap();
        assert!(matches!(
            map_onto_device(&mut prog, &device),
            Err(MapError::Unroutable { .. })
        ));
    }

    #[test]
    fn test_conditional_cnot_routes_swaps_outside_if() {
        let mut prog = parse(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[3];\ncreg c[1];\n\
             if (c==1) cx q[0],q[2];\n",
        )
        .unwrap();
        map_onto_device(&mut prog, &Device::line(3)).unwrap();

        // Exactly one conditional statement, carrying the final CNOT.
        let ifs: Vec<_> = prog
            .stmts
            .iter()
            .filter(|s| matches!(s.kind, StmtKind::If { .. }))
            .collect();
        assert_eq!(ifs.len(), 1);
        match &ifs[0].kind {
            StmtKind::If { then, .. } => {
                assert!(
                    matches!(&then.kind, StmtKind::Gate(Gate::Call { name, .. }) if name == "cx")
                );
            }
            _ => unreachable!(),
        }
        // The SWAP's CNOTs are unconditional.
        assert_eq!(count_gates(&prog, "cx"), 3);
    }

    #[test]
    fn test_measure_follows_permutation() {
        let mut prog = parse(
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[3];\ncreg c[1];\n\
             cx q[0],q[2];\nmeasure q[0] -> c[0];\n",
        )
        .unwrap();
        map_onto_device(&mut prog, &Device::line(3)).unwrap();
        assert!(emit(&prog).contains("measure q[1] -> c[0];"));
    }
}
