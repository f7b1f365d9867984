//! Initial layout assignment.
//!
//! A layout is an injection from virtual access paths (program-declared
//! qubits) into the physical qubits of a device. Three generators are
//! provided; [`apply_layout`] then rewrites the program onto the single
//! physical register.

use rustc_hash::FxHashMap;

use alsvin_device::Device;
use alsvin_ir::visit::substitute_accesses;
use alsvin_ir::{Gate, Program, Stmt, StmtKind, VarAccess};

use crate::PHYSICAL_REGISTER;
use crate::error::{MapError, MapResult};

/// An injective map between virtual access paths and physical qubits.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    to_physical: FxHashMap<VarAccess, usize>,
    to_access: FxHashMap<usize, VarAccess>,
}

impl Layout {
    /// Create an empty layout.
    pub fn new() -> Self {
        Layout::default()
    }

    /// Map a virtual access to a physical qubit, displacing stale pairings.
    pub fn insert(&mut self, access: VarAccess, physical: usize) {
        if let Some(old) = self.to_physical.insert(access.clone(), physical) {
            self.to_access.remove(&old);
        }
        if let Some(old) = self.to_access.insert(physical, access) {
            self.to_physical.remove(&old);
        }
    }

    /// The physical qubit a virtual access maps to.
    pub fn physical(&self, access: &VarAccess) -> Option<usize> {
        self.to_physical.get(access).copied()
    }

    /// The virtual access mapped to a physical qubit.
    pub fn access(&self, physical: usize) -> Option<&VarAccess> {
        self.to_access.get(&physical)
    }

    /// Whether a physical qubit has been claimed.
    pub fn occupied(&self, physical: usize) -> bool {
        self.to_access.contains_key(&physical)
    }

    /// Number of mapped qubits.
    pub fn len(&self) -> usize {
        self.to_physical.len()
    }

    /// Whether the layout is empty.
    pub fn is_empty(&self) -> bool {
        self.to_physical.is_empty()
    }

    /// Iterate over `(access, physical)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&VarAccess, usize)> {
        self.to_physical.iter().map(|(a, &p)| (a, p))
    }
}

/// Program-scope quantum accesses in declaration order.
fn virtual_qubits(prog: &Program) -> Vec<VarAccess> {
    let mut out = vec![];
    for (name, size) in prog.qregs() {
        for i in 0..size {
            out.push(VarAccess::offset(name, i));
        }
    }
    out
}

/// Interpret a gate as a CNOT, canonical or by standard-library name.
pub(crate) fn as_cnot(gate: &Gate) -> Option<(&VarAccess, &VarAccess)> {
    match gate {
        Gate::CNot { ctrl, tgt } => Some((ctrl, tgt)),
        Gate::Call { name, qargs, .. } if name == "cx" && qargs.len() == 2 => {
            Some((&qargs[0], &qargs[1]))
        }
        _ => None,
    }
}

/// Two-qubit interactions at program scope, in execution order.
///
/// Whole-register (broadcast) arguments are skipped; layout generation runs
/// on desugared programs.
fn cnot_pairs(prog: &Program) -> Vec<(VarAccess, VarAccess)> {
    let mut pairs = vec![];
    for stmt in &prog.stmts {
        collect_pairs(stmt, &mut pairs);
    }
    pairs
}

fn collect_pairs(stmt: &Stmt, pairs: &mut Vec<(VarAccess, VarAccess)>) {
    match &stmt.kind {
        StmtKind::Gate(gate) => {
            if let Some((ctrl, tgt)) = as_cnot(gate) {
                if ctrl.offset.is_some() && tgt.offset.is_some() {
                    pairs.push((ctrl.clone(), tgt.clone()));
                }
            }
        }
        StmtKind::If { then, .. } => collect_pairs(then, pairs),
        _ => {}
    }
}

/// Linear layout: registers in declaration order onto successive qubits.
pub fn linear_layout(prog: &Program, device: &Device) -> MapResult<Layout> {
    let qubits = virtual_qubits(prog);
    if qubits.len() > device.num_qubits() {
        return Err(MapError::TooLarge {
            required: qubits.len(),
            available: device.num_qubits(),
        });
    }

    let mut layout = Layout::new();
    for (i, access) in qubits.into_iter().enumerate() {
        layout.insert(access, i);
    }
    Ok(layout)
}

/// Place every still-unmapped access on the lowest free physical qubit.
fn place_rest(layout: &mut Layout, qubits: &[VarAccess], device: &Device) -> MapResult<()> {
    for access in qubits {
        if layout.physical(access).is_some() {
            continue;
        }
        let free = (0..device.num_qubits()).find(|&p| !layout.occupied(p));
        match free {
            Some(p) => layout.insert(access.clone(), p),
            None => {
                return Err(MapError::TooLarge {
                    required: qubits.len(),
                    available: device.num_qubits(),
                });
            }
        }
    }
    Ok(())
}

/// Eager layout: allocate device couplings greedily at each two-qubit gate's
/// first use, preferring high-fidelity couplings.
pub fn eager_layout(prog: &Program, device: &Device) -> MapResult<Layout> {
    let qubits = virtual_qubits(prog);
    if qubits.len() > device.num_qubits() {
        return Err(MapError::TooLarge {
            required: qubits.len(),
            available: device.num_qubits(),
        });
    }

    let couplings = device.couplings();
    let mut layout = Layout::new();

    for (ctrl, tgt) in cnot_pairs(prog) {
        match (layout.physical(&ctrl), layout.physical(&tgt)) {
            (Some(_), Some(_)) => {}
            (None, None) => {
                // Claim the best fully-free coupling.
                if let Some(&(i, j, _)) = couplings
                    .iter()
                    .find(|&&(i, j, _)| !layout.occupied(i) && !layout.occupied(j))
                {
                    layout.insert(ctrl, i);
                    layout.insert(tgt, j);
                }
            }
            (Some(p), None) => {
                // Best free qubit adjacent to the placed one.
                if let Some(&(_, j, _)) = couplings
                    .iter()
                    .find(|&&(i, j, _)| i == p && !layout.occupied(j))
                {
                    layout.insert(tgt, j);
                }
            }
            (None, Some(p)) => {
                if let Some(&(i, _, _)) = couplings
                    .iter()
                    .find(|&&(i, j, _)| j == p && !layout.occupied(i))
                {
                    layout.insert(ctrl, i);
                }
            }
        }
    }

    place_rest(&mut layout, &qubits, device)?;
    Ok(layout)
}

/// Best-fit layout: assign the most-interacting virtual pairs to the
/// highest-fidelity couplings.
pub fn bestfit_layout(prog: &Program, device: &Device) -> MapResult<Layout> {
    let qubits = virtual_qubits(prog);
    if qubits.len() > device.num_qubits() {
        return Err(MapError::TooLarge {
            required: qubits.len(),
            available: device.num_qubits(),
        });
    }

    // Interaction histogram over ordered virtual pairs.
    let mut histogram: FxHashMap<(VarAccess, VarAccess), usize> = FxHashMap::default();
    for pair in cnot_pairs(prog) {
        *histogram.entry(pair).or_insert(0) += 1;
    }
    let mut pairs: Vec<((VarAccess, VarAccess), usize)> = histogram.into_iter().collect();
    pairs.sort_by(|a, b| {
        b.1.cmp(&a.1).then_with(|| {
            (&a.0.0.reg, a.0.0.offset, &a.0.1.reg, a.0.1.offset).cmp(&(
                &b.0.0.reg,
                b.0.0.offset,
                &b.0.1.reg,
                b.0.1.offset,
            ))
        })
    });

    let mut couplings = device.couplings();
    let mut layout = Layout::new();

    for ((ctrl, tgt), _) in pairs {
        let mut used = None;
        for (idx, &(i, j, _)) in couplings.iter().enumerate() {
            let ctrl_ok = match layout.physical(&ctrl) {
                Some(p) => p == i,
                None => !layout.occupied(i),
            };
            let tgt_ok = match layout.physical(&tgt) {
                Some(p) => p == j,
                None => !layout.occupied(j),
            };
            if ctrl_ok && tgt_ok && i != j {
                layout.insert(ctrl.clone(), i);
                layout.insert(tgt.clone(), j);
                used = Some(idx);
                break;
            }
        }
        if let Some(idx) = used {
            couplings.remove(idx);
        }
    }

    place_rest(&mut layout, &qubits, device)?;
    Ok(layout)
}

/// Rewrite a program onto the single physical register.
///
/// Program-scope quantum register declarations are replaced by one
/// `qreg q[n]` sized to the device, and every laid-out virtual access is
/// substituted by its physical access.
pub fn apply_layout(prog: &mut Program, layout: &Layout, device: &Device) -> MapResult<()> {
    let mut subst: FxHashMap<VarAccess, VarAccess> = FxHashMap::default();
    for (access, physical) in layout.iter() {
        subst.insert(
            access.clone(),
            VarAccess::offset(PHYSICAL_REGISTER, u32::try_from(physical).unwrap_or(u32::MAX)),
        );
    }

    // Drop virtual quantum register declarations, remembering where the
    // first one stood.
    let mut insert_at = None;
    let mut kept = Vec::with_capacity(prog.stmts.len() + 1);
    for stmt in prog.stmts.drain(..) {
        match &stmt.kind {
            StmtKind::RegisterDecl { quantum: true, .. } => {
                if insert_at.is_none() {
                    insert_at = Some(kept.len());
                }
            }
            _ => kept.push(stmt),
        }
    }

    let size = u32::try_from(device.num_qubits()).unwrap_or(u32::MAX);
    kept.insert(
        insert_at.unwrap_or(0),
        Stmt::new(
            0,
            StmtKind::RegisterDecl {
                name: PHYSICAL_REGISTER.into(),
                quantum: true,
                size,
            },
        ),
    );

    prog.stmts = kept;
    substitute_accesses(&subst, &mut prog.stmts);
    Ok(())
}
