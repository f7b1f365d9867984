//! Pass manager for orchestrating compilation.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use alsvin_device::Device;
use alsvin_ir::Program;

use crate::diagnostics::Diagnostics;
use crate::error::{CompileError, CompileResult};
use crate::pass::Pass;
use crate::passes::{
    ApplyLayout, Desugar, FoldRotations, Inline, ResynthesizeCnots, Simplify, SteinerMap, SwapMap,
};
use crate::semantic::SemanticCheck;

pub use crate::passes::mapping::LayoutAlgorithm;

/// Hardware-mapping strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MappingStrategy {
    /// Shortest-path SWAP insertion.
    #[default]
    Swap,
    /// Steiner-tree cnot-dihedral resynthesis.
    Steiner,
}

/// Manages and executes a sequence of compilation passes.
pub struct PassManager {
    passes: Vec<Box<dyn Pass>>,
}

impl PassManager {
    /// Create a new empty pass manager.
    pub fn new() -> Self {
        PassManager { passes: vec![] }
    }

    /// Add a pass to the manager.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) {
        self.passes.push(Box::new(pass));
    }

    /// Run all passes in order.
    ///
    /// A pass failure, or any error-severity diagnostic, aborts the
    /// pipeline after the current pass.
    #[instrument(skip_all)]
    pub fn run(&self, program: &mut Program, diagnostics: &mut Diagnostics) -> CompileResult<()> {
        info!(
            "Running pass manager with {} passes on {} statements",
            self.passes.len(),
            program.stmts.len()
        );

        for pass in &self.passes {
            debug!("Running pass: {}", pass.name());
            pass.run(program, diagnostics)?;
            if diagnostics.has_errors() {
                return Err(CompileError::Semantic {
                    count: diagnostics.error_count(),
                });
            }
            debug!(
                "Pass {} completed, statements: {}",
                pass.name(),
                program.stmts.len()
            );
        }

        info!("Pass manager completed");
        Ok(())
    }

    /// Number of passes.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Whether the manager has no passes.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}

/// The canonical pipeline.
///
/// Semantic check, desugar, inline, simplify, rotation folding, CNOT
/// resynthesis; with a device also layout assignment, the chosen mapping
/// strategy, and a final semantic check of the mapped program.
pub fn standard_pipeline(
    device: Option<Arc<Device>>,
    layout: LayoutAlgorithm,
    mapping: MappingStrategy,
) -> PassManager {
    let mut manager = PassManager::new();
    manager.add_pass(SemanticCheck);
    manager.add_pass(Desugar);
    manager.add_pass(Inline::clean());
    manager.add_pass(Simplify);
    manager.add_pass(FoldRotations);
    manager.add_pass(ResynthesizeCnots);

    if let Some(device) = device {
        manager.add_pass(ApplyLayout::new(Arc::clone(&device), layout));
        match mapping {
            MappingStrategy::Swap => manager.add_pass(SwapMap::new(Arc::clone(&device))),
            MappingStrategy::Steiner => manager.add_pass(SteinerMap::new(Arc::clone(&device))),
        }
        manager.add_pass(SemanticCheck);
    }

    manager
}
