//! Layout assignment and hardware mapping for Alsvin.
//!
//! Mapping a program onto a physical device happens in two steps:
//!
//! 1. **Layout** ([`layout`]): compute an injection from the program's
//!    virtual qubits into the device's physical qubits (linear, eager or
//!    best-fit), then rewrite the program onto a single physical register.
//! 2. **Mapping**: make every CNOT device-executable, either by
//!    [`swap::map_onto_device`] (shortest-path SWAP insertion) or by
//!    [`steiner::steiner_mapping`] (cnot-dihedral resynthesis with
//!    Steiner-tree constrained Gray-Synth).
//!
//! Both mappers assume the layout rewrite has already produced a single
//! quantum register named `q` whose offsets are physical qubit indices.

pub mod error;
pub mod layout;
pub mod steiner;
pub mod swap;

pub use error::{MapError, MapResult};
pub use layout::{Layout, apply_layout, bestfit_layout, eager_layout, linear_layout};
pub use steiner::steiner_mapping;
pub use swap::map_onto_device;

/// The physical register every mapped program is laid out onto.
pub const PHYSICAL_REGISTER: &str = "q";
