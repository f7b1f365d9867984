//! Semantic analysis.
//!
//! Runs once after parsing and again after mapping: enforces
//! declaration-before-use, no redeclaration, arity and type agreement,
//! in-bounds register access, no dereference of single bits, and equal
//! lengths across the uniform (broadcast) register arguments of one call.
//!
//! All findings are accumulated as diagnostics; the pass fails at the end
//! when any had error severity.

use alsvin_ir::{
    BitKind, Expr, Gate, GateType, Program, Stmt, StmtKind, SymbolTable, Type, VarAccess,
};
use alsvin_qasm::STD_GATES;

use crate::diagnostics::Diagnostics;
use crate::error::{CompileError, CompileResult};
use crate::pass::Pass;

/// The semantic analyzer pass.
pub struct SemanticCheck;

impl Pass for SemanticCheck {
    fn name(&self) -> &'static str {
        "SemanticCheck"
    }

    fn run(&self, program: &mut Program, diagnostics: &mut Diagnostics) -> CompileResult<()> {
        check(program, diagnostics)
    }
}

/// Type-check a program, accumulating findings into `diagnostics`.
pub fn check(program: &Program, diagnostics: &mut Diagnostics) -> CompileResult<()> {
    let before = diagnostics.error_count();
    let mut checker = Checker {
        table: SymbolTable::new(),
        diags: diagnostics,
    };
    checker.check_program(program);

    let count = diagnostics.error_count() - before;
    if count > 0 {
        Err(CompileError::Semantic { count })
    } else {
        Ok(())
    }
}

struct Checker<'a> {
    table: SymbolTable,
    diags: &'a mut Diagnostics,
}

impl Checker<'_> {
    fn check_program(&mut self, program: &Program) {
        for stmt in &program.stmts {
            self.check_stmt(stmt, false);
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt, in_gate_body: bool) {
        let loc = stmt.location();
        match &stmt.kind {
            StmtKind::Include(_) => {
                for &(name, c, q) in STD_GATES {
                    self.table.define_gate(
                        name,
                        GateType {
                            num_c_params: c,
                            num_q_params: q,
                        },
                    );
                }
            }

            StmtKind::RegisterDecl {
                name,
                quantum,
                size,
            } => {
                if in_gate_body {
                    self.diags
                        .error(&loc, format!("Register '{name}' declared inside a gate body"));
                    return;
                }
                if self.table.lookup(name).is_some() {
                    self.diags
                        .error(&loc, format!("Identifier '{name}' previously declared"));
                    return;
                }
                let kind = if *quantum {
                    BitKind::Quantum
                } else {
                    BitKind::Classical
                };
                let _ = self.table.define(name.clone(), Type::Register { kind, size: *size });
            }

            StmtKind::AncillaDecl { name, size, .. } => {
                if !in_gate_body {
                    self.diags
                        .error(&loc, format!("Ancilla '{name}' declared outside a gate body"));
                    return;
                }
                if self.table.lookup(name).is_some() {
                    self.diags
                        .error(&loc, format!("Identifier '{name}' previously declared"));
                    return;
                }
                let _ = self.table.define(
                    name.clone(),
                    Type::Register {
                        kind: BitKind::Quantum,
                        size: *size,
                    },
                );
            }

            StmtKind::GateDecl {
                name,
                c_params,
                q_params,
                body,
            } => {
                if in_gate_body {
                    self.diags
                        .error(&loc, format!("Gate '{name}' declared inside a gate body"));
                    return;
                }
                if self.table.lookup_gate(name).is_some() {
                    self.diags
                        .error(&loc, format!("Gate '{name}' previously declared"));
                    return;
                }

                if let Some(body) = body {
                    self.table.push_scope();
                    for param in c_params {
                        let _ = self.table.define(param.clone(), Type::Real);
                    }
                    for param in q_params {
                        let _ = self.table.define(param.clone(), Type::Bit(BitKind::Quantum));
                    }
                    for stmt in body {
                        self.check_stmt(stmt, true);
                    }
                    let _ = self.table.pop_scope();
                }

                self.table.define_gate(
                    name.clone(),
                    GateType {
                        num_c_params: c_params.len(),
                        num_q_params: q_params.len(),
                    },
                );
            }

            StmtKind::Gate(gate) => self.check_gate(&loc, gate),

            StmtKind::Measure { qarg, carg } => {
                if in_gate_body {
                    self.diags.error(&loc, "Measurement inside a gate body");
                    return;
                }
                self.check_uniform(
                    &loc,
                    &[qarg, carg],
                    &[Some(BitKind::Quantum), Some(BitKind::Classical)],
                );
            }

            StmtKind::Reset { arg } => {
                if in_gate_body {
                    self.diags.error(&loc, "Reset inside a gate body");
                    return;
                }
                self.check_uniform(&loc, &[arg], &[Some(BitKind::Quantum)]);
            }

            StmtKind::If { reg, value: _, then } => {
                if in_gate_body {
                    self.diags.error(&loc, "Conditional inside a gate body");
                    return;
                }
                match self.table.lookup(reg) {
                    None => self
                        .diags
                        .error(&loc, format!("Identifier '{reg}' undeclared")),
                    Some(Type::Register {
                        kind: BitKind::Classical,
                        ..
                    }) => self.check_stmt(then, in_gate_body),
                    Some(_) => self.diags.error(
                        &loc,
                        format!("Identifier '{reg}' is not a classical register"),
                    ),
                }
            }
        }
    }

    fn check_gate(&mut self, loc: &str, gate: &Gate) {
        match gate {
            Gate::U {
                theta,
                phi,
                lambda,
                arg,
            } => {
                self.check_real_expr(loc, theta);
                self.check_real_expr(loc, phi);
                self.check_real_expr(loc, lambda);
                self.check_uniform(loc, &[arg], &[Some(BitKind::Quantum)]);
            }

            Gate::CNot { ctrl, tgt } => {
                self.check_uniform(
                    loc,
                    &[ctrl, tgt],
                    &[Some(BitKind::Quantum), Some(BitKind::Quantum)],
                );
            }

            Gate::Barrier { args } => {
                let refs: Vec<&VarAccess> = args.iter().collect();
                let types = vec![None; refs.len()];
                self.check_uniform(loc, &refs, &types);
            }

            Gate::Call { name, cargs, qargs } => {
                let Some(ty) = self.table.lookup_gate(name) else {
                    self.diags.error(loc, format!("Gate '{name}' undeclared"));
                    return;
                };
                if ty.num_c_params != cargs.len() {
                    self.diags.error(
                        loc,
                        format!(
                            "Gate '{name}' expects {} classical arguments, got {}",
                            ty.num_c_params,
                            cargs.len()
                        ),
                    );
                    return;
                }
                if ty.num_q_params != qargs.len() {
                    self.diags.error(
                        loc,
                        format!(
                            "Gate '{name}' expects {} quantum arguments, got {}",
                            ty.num_q_params,
                            qargs.len()
                        ),
                    );
                    return;
                }
                for carg in cargs {
                    self.check_real_expr(loc, carg);
                }
                let refs: Vec<&VarAccess> = qargs.iter().collect();
                let types = vec![Some(BitKind::Quantum); refs.len()];
                self.check_uniform(loc, &refs, &types);
            }
        }
    }

    /// Every variable in a real-context expression must name a `Real`
    /// parameter.
    fn check_real_expr(&mut self, loc: &str, expr: &Expr) {
        let mut vars = vec![];
        expr.collect_vars(&mut vars);
        for var in vars {
            match self.table.lookup(&var) {
                None => self
                    .diags
                    .error(loc, format!("Identifier '{var}' undeclared")),
                Some(Type::Real) => {}
                Some(_) => self
                    .diags
                    .error(loc, format!("Identifier '{var}' does not have numeric type")),
            }
        }
    }

    /// Check a list of bit/register arguments against expected bit kinds.
    ///
    /// Whole-register (broadcast) arguments must all have equal length; a
    /// mix of dereferenced and whole-register arguments is legal as long as
    /// the register lengths agree.
    fn check_uniform(&mut self, loc: &str, args: &[&VarAccess], types: &[Option<BitKind>]) {
        let mut uniform_size: Option<u32> = None;

        for (arg, expected) in args.iter().zip(types) {
            match self.table.lookup(&arg.reg) {
                None => {
                    self.diags
                        .error(loc, format!("Identifier '{}' undeclared", arg.reg));
                }

                Some(Type::Bit(kind)) => {
                    if arg.offset.is_some() {
                        self.diags
                            .error(loc, format!("Attempting to dereference bit '{}'", arg.reg));
                    } else if expected.is_some_and(|e| e != kind) {
                        self.diags
                            .error(loc, format!("Bit '{}' is of wrong type", arg.reg));
                    }
                }

                Some(Type::Register { kind, size }) => match arg.offset {
                    Some(offset) => {
                        if offset >= size {
                            self.diags.error(
                                loc,
                                format!(
                                    "Access '{arg}' out of bounds for register of size {size}"
                                ),
                            );
                        } else if expected.is_some_and(|e| e != kind) {
                            self.diags
                                .error(loc, format!("Bit '{arg}' is of wrong type"));
                        }
                    }
                    None => {
                        match uniform_size {
                            None => uniform_size = Some(size),
                            Some(expected_size) if expected_size != size => {
                                self.diags.error(
                                    loc,
                                    format!(
                                        "Register '{}' has incompatible length ({size} vs {expected_size})",
                                        arg.reg
                                    ),
                                );
                            }
                            Some(_) => {}
                        }
                        if expected.is_some_and(|e| e != kind) {
                            self.diags
                                .error(loc, format!("Register '{}' is of wrong type", arg.reg));
                        }
                    }
                },

                Some(Type::Real) => {
                    self.diags.error(
                        loc,
                        format!("Identifier '{}' is not a bit or register", arg.reg),
                    );
                }
            }
        }
    }
}
