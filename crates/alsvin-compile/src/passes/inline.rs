//! Gate-call inlining.
//!
//! Replaces calls to defined gates by their bodies, substituting actuals for
//! formals. Local ancillas are rebased onto one shared program-level
//! ancilla register sized to the largest single-call requirement, with
//! resets appended after each inlined body so the register can be reused.
//!
//! Standard-library gates stay as calls (the downstream passes match on
//! their names); the override set is configurable.

use rustc_hash::FxHashMap;

use alsvin_ir::visit::{Rewriter, for_each_access_mut, substitute_exprs, substitute_vars};
use alsvin_ir::{Expr, Gate, Program, Stmt, StmtKind, VarAccess};

use crate::diagnostics::Diagnostics;
use crate::error::{CompileError, CompileResult};
use crate::pass::Pass;

/// Gates that are never inlined by default.
pub const DEFAULT_OVERRIDES: &[&str] = &[
    "x", "y", "z", "h", "s", "sdg", "t", "tdg", "rx", "ry", "rz", "cz", "cy", "swap", "cx",
];

/// Configuration for the inliner.
#[derive(Debug, Clone)]
pub struct InlineConfig {
    /// Keep gate declarations after inlining their call sites.
    pub keep_declarations: bool,
    /// Gate names that stay as calls.
    pub overrides: Vec<String>,
    /// Name of the shared ancilla register.
    pub ancilla_register: String,
}

impl Default for InlineConfig {
    fn default() -> Self {
        InlineConfig {
            keep_declarations: true,
            overrides: DEFAULT_OVERRIDES.iter().map(|s| (*s).to_string()).collect(),
            ancilla_register: "auto_anc".into(),
        }
    }
}

/// The inlining pass.
#[derive(Default)]
pub struct Inline {
    config: InlineConfig,
}

impl Inline {
    /// Inline with the default configuration.
    pub fn new() -> Self {
        Inline::default()
    }

    /// Inline with an explicit configuration.
    pub fn with_config(config: InlineConfig) -> Self {
        Inline { config }
    }

    /// Inline everything and drop the declarations afterwards.
    pub fn clean() -> Self {
        Inline {
            config: InlineConfig {
                keep_declarations: false,
                ..InlineConfig::default()
            },
        }
    }
}

impl Pass for Inline {
    fn name(&self) -> &'static str {
        "Inline"
    }

    fn run(&self, program: &mut Program, _diagnostics: &mut Diagnostics) -> CompileResult<()> {
        let mut rewriter = InlineRewriter {
            config: &self.config,
            gates: FxHashMap::default(),
            max_ancilla: 0,
            dirty_ancilla: None,
        };
        rewriter.rewrite_program(program);

        if let Some(location) = rewriter.dirty_ancilla {
            return Err(CompileError::Unsupported(format!(
                "dirty ancilla at {location} cannot be inlined"
            )));
        }

        // The shared ancilla register, declared up front.
        if rewriter.max_ancilla > 0 {
            let at = program
                .stmts
                .iter()
                .take_while(|s| matches!(s.kind, StmtKind::Include(_)))
                .count();
            program.stmts.insert(
                at,
                Stmt::new(
                    0,
                    StmtKind::RegisterDecl {
                        name: self.config.ancilla_register.clone(),
                        quantum: true,
                        size: rewriter.max_ancilla,
                    },
                ),
            );
        }

        Ok(())
    }
}

struct GateInfo {
    c_params: Vec<String>,
    q_params: Vec<String>,
    /// Body with ancilla declarations stripped.
    body: Vec<Stmt>,
    /// Local ancilla registers in declaration order.
    ancillas: Vec<(String, u32)>,
}

struct InlineRewriter<'c> {
    config: &'c InlineConfig,
    gates: FxHashMap<String, GateInfo>,
    max_ancilla: u32,
    dirty_ancilla: Option<String>,
}

impl Rewriter for InlineRewriter<'_> {
    fn replace_gate_decl(&mut self, stmt: Stmt) -> Vec<Stmt> {
        let StmtKind::GateDecl {
            name,
            c_params,
            q_params,
            body: Some(body),
        } = &stmt.kind
        else {
            // Opaque declarations cannot be inlined.
            return vec![stmt];
        };

        let mut ancillas = vec![];
        let mut clean_body = vec![];
        let mut total = 0;
        for inner in body {
            match &inner.kind {
                StmtKind::AncillaDecl { name, size, dirty } => {
                    if *dirty {
                        self.dirty_ancilla.get_or_insert_with(|| inner.location());
                    } else {
                        ancillas.push((name.clone(), *size));
                        total += size;
                    }
                }
                _ => clean_body.push(inner.clone()),
            }
        }
        self.max_ancilla = self.max_ancilla.max(total);

        self.gates.insert(
            name.clone(),
            GateInfo {
                c_params: c_params.clone(),
                q_params: q_params.clone(),
                body: clean_body,
                ancillas,
            },
        );

        if self.config.keep_declarations {
            vec![stmt]
        } else {
            vec![]
        }
    }

    fn replace_gate(&mut self, line: u32, gate: Gate) -> Vec<Stmt> {
        let Gate::Call { name, cargs, qargs } = &gate else {
            return vec![Stmt::gate(line, gate)];
        };
        if self.config.overrides.iter().any(|o| o == name) {
            return vec![Stmt::gate(line, gate)];
        }
        let Some(info) = self.gates.get(name) else {
            return vec![Stmt::gate(line, gate)];
        };

        let mut body = info.body.clone();

        // Formals to actuals.
        let qsubst: FxHashMap<String, VarAccess> = info
            .q_params
            .iter()
            .cloned()
            .zip(qargs.iter().cloned())
            .collect();
        let csubst: FxHashMap<String, Expr> = info
            .c_params
            .iter()
            .cloned()
            .zip(cargs.iter().cloned())
            .collect();
        substitute_vars(&qsubst, &mut body);
        substitute_exprs(&csubst, &mut body);

        // Local ancillas onto the shared register.
        let mut base = 0u32;
        let register = self.config.ancilla_register.clone();
        for (anc, size) in &info.ancillas {
            for_each_access_mut(&mut body, &mut |access| {
                if access.reg == *anc {
                    access.reg = register.clone();
                    access.offset = Some(base + access.offset.unwrap_or(0));
                }
            });
            base += size;
        }

        // Return the ancillas to |0⟩ for the next call.
        for k in 0..base {
            body.push(Stmt::new(
                line,
                StmtKind::Reset {
                    arg: VarAccess::offset(&register, k),
                },
            ));
        }

        body
    }
}
