//! Gray-Synth: CNOT+Rz networks from phase polynomials.
//!
//! Given a phase polynomial (a list of parity/angle terms) and a target
//! linear permutation, Gray-Synth emits a CNOT+Rz event sequence realising
//! the cnot-dihedral operator. The recursion partitions terms by a pivot
//! coordinate chosen to maximise sharing of CNOT prefixes, as in
//! arXiv:1712.01859; the Steiner variant confines every CNOT to device
//! couplings (arXiv:1904.01972).

use alsvin_device::{Device, DeviceResult};
use alsvin_ir::{Angle, Gate, VarAccess};

use crate::linear::{LinearOp, gauss_jordan, steiner_gauss};

/// One phase-polynomial term: a parity vector and its rotation angle.
pub type PhaseTerm = (Vec<bool>, Angle);

/// An event of a synthesized cnot-dihedral circuit.
#[derive(Debug, Clone, PartialEq)]
pub enum CxDihedral {
    /// CNOT with `(control, target)`.
    Cnot(usize, usize),
    /// Z-rotation by an angle on a qubit.
    Phase(Angle, usize),
}

#[derive(Debug)]
struct Partition {
    target: Option<usize>,
    remaining: Vec<usize>,
    terms: Vec<PhaseTerm>,
}

/// Synthesize a phase polynomial and linear permutation, connectivity-free.
///
/// The residual linear operator is realised by reversed Gauss-Jordan.
pub fn gray_synth(terms: &[PhaseTerm], a: LinearOp) -> Vec<CxDihedral> {
    synth(terms, a, None).expect("device-free synthesis cannot fail")
}

/// Synthesize with every CNOT confined to a coupling of `device`.
pub fn gray_steiner(
    terms: &[PhaseTerm],
    a: LinearOp,
    device: &Device,
) -> DeviceResult<Vec<CxDihedral>> {
    synth(terms, a, Some(device))
}

fn synth(
    terms: &[PhaseTerm],
    mut a: LinearOp,
    device: Option<&Device>,
) -> DeviceResult<Vec<CxDihedral>> {
    let n = a.dim();
    let mut out = vec![];
    let mut stack = vec![Partition {
        target: None,
        remaining: (0..n).collect(),
        terms: normalize(terms),
    }];

    while let Some(mut part) = stack.pop() {
        if part.terms.is_empty() {
            continue;
        }

        if let (1, Some(tgt)) = (part.terms.len(), part.target) {
            let (vec, angle) = part.terms.swap_remove(0);
            match device {
                None => emit_term(&mut out, &mut stack, &mut a, vec, tgt),
                Some(device) => emit_term_steiner(&mut out, &mut stack, &mut a, vec, tgt, device)?,
            }
            out.push(CxDihedral::Phase(angle, tgt));
        } else if !part.remaining.is_empty() {
            let pivot = find_best_split(&part.terms, &part.remaining);
            let (zeros, ones): (Vec<PhaseTerm>, Vec<PhaseTerm>) =
                part.terms.into_iter().partition(|(v, _)| !v[pivot]);
            part.remaining.retain(|&i| i != pivot);

            stack.push(Partition {
                target: part.target.or(Some(pivot)),
                remaining: part.remaining.clone(),
                terms: ones,
            });
            stack.push(Partition {
                target: part.target,
                remaining: part.remaining,
                terms: zeros,
            });
        } else {
            // Distinct non-zero parities always leave a pivot to split on.
            unreachable!("no indices left to pivot on, but multiple terms remain");
        }
    }

    // Synthesize the residual linear operator: the reduction sequence in
    // reverse realises `a`.
    let reduction = match device {
        None => gauss_jordan(a),
        Some(device) => steiner_gauss(&a, device)?,
    };
    out.extend(reduction.iter().rev().map(|&(c, t)| CxDihedral::Cnot(c, t)));

    Ok(out)
}

/// Merge duplicate parities, drop zero angles and zero parities.
fn normalize(terms: &[PhaseTerm]) -> Vec<PhaseTerm> {
    let mut merged: Vec<PhaseTerm> = vec![];
    for (vec, angle) in terms {
        if let Some((_, existing)) = merged.iter_mut().find(|(v, _)| v == vec) {
            *existing += angle.clone();
        } else {
            merged.push((vec.clone(), angle.clone()));
        }
    }
    merged.retain(|(vec, angle)| vec.iter().any(|&b| b) && !angle.is_zero());
    merged
}

/// Emit one CNOT, updating the pending partitions and the residual operator.
fn emit_cnot(
    out: &mut Vec<CxDihedral>,
    stack: &mut [Partition],
    a: &mut LinearOp,
    ctrl: usize,
    tgt: usize,
) {
    out.push(CxDihedral::Cnot(ctrl, tgt));
    for part in stack.iter_mut() {
        for (vec, _) in &mut part.terms {
            let bit = vec[tgt];
            vec[ctrl] ^= bit;
        }
    }
    a.add_col(tgt, ctrl);
}

/// Reduce a term's parity onto its target with direct CNOTs.
fn emit_term(
    out: &mut Vec<CxDihedral>,
    stack: &mut [Partition],
    a: &mut LinearOp,
    mut vec: Vec<bool>,
    tgt: usize,
) {
    for ctrl in 0..vec.len() {
        if ctrl == tgt || !vec[ctrl] {
            continue;
        }
        // Sibling-partition emissions can have cleared the target bit;
        // restore it before folding the control in.
        if !vec[tgt] {
            emit_cnot(out, stack, a, tgt, ctrl);
            let bit = vec[ctrl];
            vec[tgt] ^= bit;
        }
        emit_cnot(out, stack, a, ctrl, tgt);
        let bit = vec[tgt];
        vec[ctrl] ^= bit;
    }
    debug_assert!(vec.iter().enumerate().all(|(i, &b)| b == (i == tgt)));
}

/// Reduce a term's parity onto its target along a Steiner tree.
///
/// The tree spans the set bits rooted at the target; walking leaves-first,
/// each set bit is folded into its parent, setting the parent first when it
/// is a zero Steiner vertex. Every CNOT is a tree edge.
fn emit_term_steiner(
    out: &mut Vec<CxDihedral>,
    stack: &mut [Partition],
    a: &mut LinearOp,
    mut vec: Vec<bool>,
    tgt: usize,
    device: &Device,
) -> DeviceResult<()> {
    let terminals: Vec<usize> = (0..vec.len()).filter(|&i| i != tgt && vec[i]).collect();
    if terminals.is_empty() {
        return Ok(());
    }

    let tree = device.steiner(&terminals, tgt)?;
    for &(parent, child) in tree.iter().rev() {
        if !vec[child] {
            continue;
        }
        if !vec[parent] {
            emit_cnot(out, stack, a, parent, child);
            let bit = vec[child];
            vec[parent] ^= bit;
        }
        emit_cnot(out, stack, a, child, parent);
        let bit = vec[parent];
        vec[child] ^= bit;
    }

    debug_assert!(vec.iter().enumerate().all(|(i, &b)| b == (i == tgt)));
    Ok(())
}

/// Materialise a Z-rotation as the narrowest standard gate.
///
/// Dyadic angles map onto their named Clifford+T gates; everything else is
/// emitted as an `rz` call. Assumes the standard header is in scope.
pub fn phase_gate(angle: &Angle, arg: VarAccess) -> Gate {
    let named = match angle {
        Angle::Dyadic(d) => match (d.num, d.pow) {
            (1, 0) => Some("z"),
            (1, 1) => Some("s"),
            (3, 1) => Some("sdg"),
            (1, 2) => Some("t"),
            (7, 2) => Some("tdg"),
            _ => None,
        },
        Angle::Symbolic(_) => None,
    };

    match named {
        Some(name) => Gate::Call {
            name: name.into(),
            cargs: vec![],
            qargs: vec![arg],
        },
        None => Gate::Call {
            name: "rz".into(),
            cargs: vec![angle.to_expr()],
            qargs: vec![arg],
        },
    }
}

/// The pivot index maximising the larger of the ones-count and zeros-count,
/// smallest index on ties.
fn find_best_split(terms: &[PhaseTerm], indices: &[usize]) -> usize {
    let mut best = indices[0];
    let mut best_count = 0usize;

    for &i in indices {
        let ones = terms.iter().filter(|(v, _)| v[i]).count();
        let zeros = terms.len() - ones;
        let count = ones.max(zeros);
        if count > best_count {
            best_count = count;
            best = i;
        }
    }

    best
}
