//! The standard gate header.
//!
//! `qelib1.inc` is resolved against this table rather than read from disk.
//! The table is an immutable module constant; passes consult it but never
//! extend it.

/// `(name, classical params, quantum params)` for every `qelib1.inc` gate.
pub const STD_GATES: &[(&str, usize, usize)] = &[
    ("u3", 3, 1),
    ("u2", 2, 1),
    ("u1", 1, 1),
    ("cx", 0, 2),
    ("id", 0, 1),
    ("u0", 1, 1),
    ("x", 0, 1),
    ("y", 0, 1),
    ("z", 0, 1),
    ("h", 0, 1),
    ("s", 0, 1),
    ("sdg", 0, 1),
    ("t", 0, 1),
    ("tdg", 0, 1),
    ("rx", 1, 1),
    ("ry", 1, 1),
    ("rz", 1, 1),
    ("cz", 0, 2),
    ("cy", 0, 2),
    ("ch", 0, 2),
    ("swap", 0, 2),
    ("ccx", 0, 3),
    ("crz", 1, 2),
    ("cu1", 1, 2),
    ("cu3", 3, 2),
];

/// The include file names resolved against [`STD_GATES`].
pub const STD_INCLUDES: &[&str] = &["qelib1.inc"];

/// Check whether `name` is a standard-header gate.
pub fn is_std_gate(name: &str) -> bool {
    STD_GATES.iter().any(|&(gate, _, _)| gate == name)
}

/// Arity of a standard-header gate, `(classical, quantum)`.
pub fn std_gate_arity(name: &str) -> Option<(usize, usize)> {
    STD_GATES
        .iter()
        .find(|&&(gate, _, _)| gate == name)
        .map(|&(_, c, q)| (c, q))
}
