//! Scoped symbol tables.
//!
//! Two namespaces as in the surface language: a stack of value scopes
//! (registers, gate parameters, locals) and a single global gate namespace.

use rustc_hash::FxHashMap;

use crate::error::{IrError, IrResult};

/// Whether a bit is quantum or classical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitKind {
    Quantum,
    Classical,
}

/// The type of a value binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    /// A single bit (gate quantum parameters are `Bit(Quantum)`).
    Bit(BitKind),
    /// A sized register.
    Register { kind: BitKind, size: u32 },
    /// A real-valued classical parameter.
    Real,
}

/// Arity of a declared gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateType {
    pub num_c_params: usize,
    pub num_q_params: usize,
}

/// Scope-stack symbol table.
#[derive(Debug, Default)]
pub struct SymbolTable {
    scopes: Vec<FxHashMap<String, Type>>,
    gates: FxHashMap<String, GateType>,
}

impl SymbolTable {
    /// Create a table with one (global) scope.
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![FxHashMap::default()],
            gates: FxHashMap::default(),
        }
    }

    /// Enter a new scope.
    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    /// Leave the current scope.
    pub fn pop_scope(&mut self) -> IrResult<()> {
        if self.scopes.len() <= 1 {
            return Err(IrError::EmptyScopeStack);
        }
        self.scopes.pop();
        Ok(())
    }

    /// Bind a name in the current scope, shadowing outer scopes.
    pub fn define(&mut self, name: impl Into<String>, ty: Type) -> IrResult<()> {
        let scope = self.scopes.last_mut().ok_or(IrError::EmptyScopeStack)?;
        scope.insert(name.into(), ty);
        Ok(())
    }

    /// Check whether a name is bound in the *current* scope.
    pub fn defined_here(&self, name: &str) -> bool {
        self.scopes
            .last()
            .is_some_and(|scope| scope.contains_key(name))
    }

    /// Look a name up through the scope stack, innermost first.
    pub fn lookup(&self, name: &str) -> Option<Type> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    /// Bind a gate name in the global gate namespace.
    pub fn define_gate(&mut self, name: impl Into<String>, ty: GateType) {
        self.gates.insert(name.into(), ty);
    }

    /// Look up a declared gate.
    pub fn lookup_gate(&self, name: &str) -> Option<GateType> {
        self.gates.get(name).copied()
    }
}
