//! Synthesis algorithms for Alsvin.
//!
//! Three families live here:
//!
//! - **Linear reversible synthesis** ([`linear`]): Gauss-Jordan and Gaussian
//!   elimination over GF(2) emitting CNOT sequences, plus the Steiner-tree
//!   variant that confines row operations to device couplings.
//! - **Phase-polynomial synthesis** ([`gray`]): the Gray-Synth recursive
//!   partitioning algorithm for CNOT+Rz networks, connectivity-free and
//!   Steiner-tree constrained.
//! - **Channel representation** ([`channel`]): Pauli rotations, Clifford
//!   tableaus and uninterpreted blocks, the algebra behind rotation folding.

pub mod channel;
pub mod gray;
pub mod linear;

pub use channel::{ChannelOp, Clifford, Pauli, Rotation};
pub use gray::{CxDihedral, PhaseTerm, gray_steiner, gray_synth, phase_gate};
pub use linear::{LinearOp, gauss_jordan, gaussian_elim, steiner_gauss};
