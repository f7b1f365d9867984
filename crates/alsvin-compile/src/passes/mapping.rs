//! Hardware-mapping passes.
//!
//! Thin pass wrappers around the layout and mapping machinery in
//! `alsvin-map`: layout assignment + program rewrite, SWAP-insertion
//! routing, and Steiner-tree resynthesis.

use std::sync::Arc;

use alsvin_device::Device;
use alsvin_ir::Program;
use alsvin_map::{
    apply_layout, bestfit_layout, eager_layout, linear_layout, map_onto_device, steiner_mapping,
};

use crate::diagnostics::Diagnostics;
use crate::error::CompileResult;
use crate::pass::Pass;

/// Initial-layout algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutAlgorithm {
    /// Registers in declaration order.
    #[default]
    Linear,
    /// Greedy allocation at first two-qubit use.
    Eager,
    /// High-traffic pairs onto high-fidelity couplings.
    BestFit,
}

/// Compute an initial layout and rewrite the program onto the physical
/// register.
pub struct ApplyLayout {
    device: Arc<Device>,
    algorithm: LayoutAlgorithm,
}

impl ApplyLayout {
    pub fn new(device: Arc<Device>, algorithm: LayoutAlgorithm) -> Self {
        ApplyLayout { device, algorithm }
    }
}

impl Pass for ApplyLayout {
    fn name(&self) -> &'static str {
        "ApplyLayout"
    }

    fn run(&self, program: &mut Program, diagnostics: &mut Diagnostics) -> CompileResult<()> {
        let layout = match self.algorithm {
            LayoutAlgorithm::Linear => linear_layout(program, &self.device)?,
            LayoutAlgorithm::Eager => eager_layout(program, &self.device)?,
            LayoutAlgorithm::BestFit => bestfit_layout(program, &self.device)?,
        };
        diagnostics.note(
            "<layout>",
            format!(
                "placed {} virtual qubits onto device '{}'",
                layout.len(),
                self.device.name()
            ),
        );
        apply_layout(program, &layout, &self.device)?;
        Ok(())
    }
}

/// Shortest-path SWAP-insertion mapping.
pub struct SwapMap {
    device: Arc<Device>,
}

impl SwapMap {
    pub fn new(device: Arc<Device>) -> Self {
        SwapMap { device }
    }
}

impl Pass for SwapMap {
    fn name(&self) -> &'static str {
        "SwapMap"
    }

    fn run(&self, program: &mut Program, _diagnostics: &mut Diagnostics) -> CompileResult<()> {
        map_onto_device(program, &self.device)?;
        Ok(())
    }
}

/// Steiner-tree cnot-dihedral resynthesis mapping.
pub struct SteinerMap {
    device: Arc<Device>,
}

impl SteinerMap {
    pub fn new(device: Arc<Device>) -> Self {
        SteinerMap { device }
    }
}

impl Pass for SteinerMap {
    fn name(&self) -> &'static str {
        "SteinerMap"
    }

    fn run(&self, program: &mut Program, _diagnostics: &mut Diagnostics) -> CompileResult<()> {
        steiner_mapping(program, &self.device)?;
        Ok(())
    }
}
