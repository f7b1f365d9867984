//! Resource estimation.
//!
//! A pure analysis over a program: per-gate-name counts (with broadcast
//! multiplicity), register totals, and a critical-path depth over qubit
//! wires.

use rustc_hash::FxHashMap;

use alsvin_ir::{Gate, Program, Stmt, StmtKind, VarAccess};

/// Resource usage of a program.
#[derive(Debug, Clone, Default)]
pub struct Resources {
    /// Operation counts keyed by surface-syntax name.
    pub counts: FxHashMap<String, usize>,
    /// Total program-scope qubits.
    pub qubits: usize,
    /// Total program-scope classical bits.
    pub bits: usize,
    /// Critical-path depth over qubit wires.
    pub depth: usize,
}

impl Resources {
    /// Count for one operation name.
    pub fn count(&self, name: &str) -> usize {
        self.counts.get(name).copied().unwrap_or(0)
    }

    /// Total operation count.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

/// Estimate the resources of a program.
///
/// Gate declarations are not expanded; calls count under the callee's name.
pub fn estimate(program: &Program) -> Resources {
    let mut resources = Resources::default();
    let sizes: FxHashMap<&str, u32> = program.qregs().chain(program.cregs()).collect();
    resources.qubits = program.num_qubits();
    resources.bits = program.cregs().map(|(_, s)| s as usize).sum();

    let mut wire_depth: FxHashMap<VarAccess, usize> = FxHashMap::default();
    for stmt in &program.stmts {
        count_stmt(stmt, &sizes, &mut resources, &mut wire_depth);
    }
    resources.depth = wire_depth.values().copied().max().unwrap_or(0);
    resources
}

fn count_stmt(
    stmt: &Stmt,
    sizes: &FxHashMap<&str, u32>,
    resources: &mut Resources,
    wire_depth: &mut FxHashMap<VarAccess, usize>,
) {
    match &stmt.kind {
        StmtKind::Gate(Gate::Barrier { args }) => {
            // Barriers synchronise wires without contributing depth.
            sync_wires(args, sizes, wire_depth, 0);
        }
        StmtKind::Gate(gate) => {
            let multiplicity = broadcast_multiplicity(&gate.qargs(), sizes);
            *resources.counts.entry(gate.name().to_string()).or_insert(0) += multiplicity;
            let args: Vec<VarAccess> = gate.qargs().into_iter().cloned().collect();
            sync_wires(&args, sizes, wire_depth, 1);
        }
        StmtKind::Measure { qarg, .. } => {
            let multiplicity = broadcast_multiplicity(&[qarg], sizes);
            *resources.counts.entry("measure".into()).or_insert(0) += multiplicity;
            sync_wires(std::slice::from_ref(qarg), sizes, wire_depth, 1);
        }
        StmtKind::Reset { arg } => {
            let multiplicity = broadcast_multiplicity(&[arg], sizes);
            *resources.counts.entry("reset".into()).or_insert(0) += multiplicity;
            sync_wires(std::slice::from_ref(arg), sizes, wire_depth, 1);
        }
        StmtKind::If { then, .. } => count_stmt(then, sizes, resources, wire_depth),
        _ => {}
    }
}

/// The number of copies a broadcast statement expands to.
fn broadcast_multiplicity(args: &[&VarAccess], sizes: &FxHashMap<&str, u32>) -> usize {
    args.iter()
        .filter(|a| a.offset.is_none())
        .filter_map(|a| sizes.get(a.reg.as_str()).copied())
        .max()
        .unwrap_or(1) as usize
}

/// Advance the depth of every wire an argument list touches to a common
/// front, plus `cost`.
fn sync_wires(
    args: &[VarAccess],
    sizes: &FxHashMap<&str, u32>,
    wire_depth: &mut FxHashMap<VarAccess, usize>,
    cost: usize,
) {
    let mut wires: Vec<VarAccess> = vec![];
    for arg in args {
        match arg.offset {
            Some(_) => wires.push(arg.clone()),
            None => {
                let size = sizes.get(arg.reg.as_str()).copied().unwrap_or(1);
                for i in 0..size {
                    wires.push(VarAccess::offset(&arg.reg, i));
                }
            }
        }
    }

    let front = wires
        .iter()
        .filter_map(|w| wire_depth.get(w).copied())
        .max()
        .unwrap_or(0);
    for wire in wires {
        wire_depth.insert(wire, front + cost);
    }
}
