//! Traversal and rewriting over the statement tree.
//!
//! Two traversal styles cover every pass in the stack:
//!
//! - [`Visitor`] walks the tree read-only in pre-order, with overridable
//!   per-node methods.
//! - [`Rewriter`] drives a post-order replacement walk: children are
//!   rewritten first, then the (rebuilt) node is offered to a `replace_*`
//!   hook which may keep it, delete it, or splice an arbitrary statement
//!   sequence in its place.
//!
//! `if` bodies are deliberately opaque to the generic [`Rewriter`] driver:
//! a classically-controlled operation must not leak into accumulating
//! passes. Passes that want to rewrite inside `if` override
//! [`Rewriter::replace_if`].

use rustc_hash::FxHashMap;

use crate::ast::{Gate, Program, Stmt, StmtKind, VarAccess};
use crate::expr::Expr;

/// Read-only pre-order traversal.
pub trait Visitor {
    fn visit_program(&mut self, prog: &Program)
    where
        Self: Sized,
    {
        for stmt in &prog.stmts {
            self.visit_stmt(stmt);
        }
    }

    fn visit_stmt(&mut self, stmt: &Stmt)
    where
        Self: Sized,
    {
        walk_stmt(self, stmt);
    }

    fn visit_gate(&mut self, gate: &Gate)
    where
        Self: Sized,
    {
        walk_gate(self, gate);
    }

    fn visit_expr(&mut self, expr: &Expr)
    where
        Self: Sized,
    {
        walk_expr(self, expr);
    }

    fn visit_var_access(&mut self, _access: &VarAccess) {}
}

/// Default traversal of a statement's children.
pub fn walk_stmt<V: Visitor>(v: &mut V, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::Include(_) | StmtKind::RegisterDecl { .. } | StmtKind::AncillaDecl { .. } => {}
        StmtKind::GateDecl { body, .. } => {
            if let Some(body) = body {
                for stmt in body {
                    v.visit_stmt(stmt);
                }
            }
        }
        StmtKind::Gate(gate) => v.visit_gate(gate),
        StmtKind::Measure { qarg, carg } => {
            v.visit_var_access(qarg);
            v.visit_var_access(carg);
        }
        StmtKind::Reset { arg } => v.visit_var_access(arg),
        StmtKind::If { then, .. } => v.visit_stmt(then),
    }
}

/// Default traversal of a gate's children.
pub fn walk_gate<V: Visitor>(v: &mut V, gate: &Gate) {
    match gate {
        Gate::U {
            theta,
            phi,
            lambda,
            arg,
        } => {
            v.visit_expr(theta);
            v.visit_expr(phi);
            v.visit_expr(lambda);
            v.visit_var_access(arg);
        }
        Gate::CNot { ctrl, tgt } => {
            v.visit_var_access(ctrl);
            v.visit_var_access(tgt);
        }
        Gate::Barrier { args } => {
            for arg in args {
                v.visit_var_access(arg);
            }
        }
        Gate::Call { cargs, qargs, .. } => {
            for carg in cargs {
                v.visit_expr(carg);
            }
            for qarg in qargs {
                v.visit_var_access(qarg);
            }
        }
    }
}

/// Default traversal of an expression's children.
pub fn walk_expr<V: Visitor>(v: &mut V, expr: &Expr) {
    match expr {
        Expr::Int(_) | Expr::Real(_) | Expr::Pi | Expr::Var(_) => {}
        Expr::Unary(_, sub) => v.visit_expr(sub),
        Expr::Binary(lhs, _, rhs) => {
            v.visit_expr(lhs);
            v.visit_expr(rhs);
        }
    }
}

/// Post-order splice-replacement walk.
///
/// Every hook receives the node with its children already rewritten and
/// returns the statement sequence to splice in its place; the default keeps
/// the node unchanged. Gate-declaration bodies get scope bracketing through
/// [`enter_gate_decl`](Rewriter::enter_gate_decl) /
/// [`exit_gate_decl`](Rewriter::exit_gate_decl); statements returned by the
/// latter are appended to the body.
pub trait Rewriter {
    /// Rewrite a whole program in place.
    fn rewrite_program(&mut self, prog: &mut Program)
    where
        Self: Sized,
    {
        let stmts = std::mem::take(&mut prog.stmts);
        prog.stmts = rewrite_stmts(self, stmts);
        prog.stmts.extend(self.finish());
    }

    fn replace_register_decl(&mut self, stmt: Stmt) -> Vec<Stmt> {
        vec![stmt]
    }

    fn replace_ancilla_decl(&mut self, stmt: Stmt) -> Vec<Stmt> {
        vec![stmt]
    }

    fn replace_gate_decl(&mut self, stmt: Stmt) -> Vec<Stmt> {
        vec![stmt]
    }

    fn replace_gate(&mut self, line: u32, gate: Gate) -> Vec<Stmt> {
        vec![Stmt::gate(line, gate)]
    }

    fn replace_measure(&mut self, stmt: Stmt) -> Vec<Stmt> {
        vec![stmt]
    }

    fn replace_reset(&mut self, stmt: Stmt) -> Vec<Stmt> {
        vec![stmt]
    }

    /// `if` statements arrive with their body untouched.
    fn replace_if(&mut self, stmt: Stmt) -> Vec<Stmt> {
        vec![stmt]
    }

    /// Called before rewriting a defined gate body.
    fn enter_gate_decl(&mut self, _name: &str, _c_params: &[String], _q_params: &[String]) {}

    /// Called after rewriting a defined gate body; the result is appended.
    fn exit_gate_decl(&mut self, _name: &str) -> Vec<Stmt> {
        vec![]
    }

    /// Called after the program body; the result is appended.
    fn finish(&mut self) -> Vec<Stmt> {
        vec![]
    }
}

/// Rewrite a statement sequence, splicing replacements.
pub fn rewrite_stmts<R: Rewriter>(r: &mut R, stmts: Vec<Stmt>) -> Vec<Stmt> {
    let mut out = Vec::with_capacity(stmts.len());
    for stmt in stmts {
        out.extend(rewrite_stmt(r, stmt));
    }
    out
}

/// Rewrite a single statement.
pub fn rewrite_stmt<R: Rewriter>(r: &mut R, stmt: Stmt) -> Vec<Stmt> {
    let Stmt { line, kind } = stmt;
    match kind {
        StmtKind::Include(_) => vec![Stmt::new(line, kind)],
        StmtKind::RegisterDecl { .. } => r.replace_register_decl(Stmt::new(line, kind)),
        StmtKind::AncillaDecl { .. } => r.replace_ancilla_decl(Stmt::new(line, kind)),
        StmtKind::GateDecl {
            name,
            c_params,
            q_params,
            body,
        } => {
            let body = match body {
                Some(body) => {
                    r.enter_gate_decl(&name, &c_params, &q_params);
                    let mut body = rewrite_stmts(r, body);
                    body.extend(r.exit_gate_decl(&name));
                    Some(body)
                }
                None => None,
            };
            r.replace_gate_decl(Stmt::new(
                line,
                StmtKind::GateDecl {
                    name,
                    c_params,
                    q_params,
                    body,
                },
            ))
        }
        StmtKind::Gate(gate) => r.replace_gate(line, gate),
        StmtKind::Measure { .. } => r.replace_measure(Stmt::new(line, kind)),
        StmtKind::Reset { .. } => r.replace_reset(Stmt::new(line, kind)),
        StmtKind::If { .. } => r.replace_if(Stmt::new(line, kind)),
    }
}

/// Apply `f` to every access path in a statement sequence, including inside
/// gate bodies and `if` bodies.
pub fn for_each_access_mut(stmts: &mut [Stmt], f: &mut impl FnMut(&mut VarAccess)) {
    for stmt in stmts {
        match &mut stmt.kind {
            StmtKind::Include(_)
            | StmtKind::RegisterDecl { .. }
            | StmtKind::AncillaDecl { .. } => {}
            StmtKind::GateDecl { body, .. } => {
                if let Some(body) = body {
                    for_each_access_mut(body, f);
                }
            }
            StmtKind::Gate(gate) => {
                for arg in gate.qargs_mut() {
                    f(arg);
                }
            }
            StmtKind::Measure { qarg, carg } => {
                f(qarg);
                f(carg);
            }
            StmtKind::Reset { arg } => f(arg),
            StmtKind::If { then, .. } => {
                for_each_access_mut(std::slice::from_mut(&mut **then), f);
            }
        }
    }
}

/// Apply `f` to every expression in a statement sequence.
pub fn for_each_expr_mut(stmts: &mut [Stmt], f: &mut impl FnMut(&mut Expr)) {
    for stmt in stmts {
        match &mut stmt.kind {
            StmtKind::GateDecl { body, .. } => {
                if let Some(body) = body {
                    for_each_expr_mut(body, f);
                }
            }
            StmtKind::Gate(Gate::U {
                theta, phi, lambda, ..
            }) => {
                f(theta);
                f(phi);
                f(lambda);
            }
            StmtKind::Gate(Gate::Call { cargs, .. }) => {
                for carg in cargs {
                    f(carg);
                }
            }
            StmtKind::If { then, .. } => {
                for_each_expr_mut(std::slice::from_mut(&mut **then), f);
            }
            _ => {}
        }
    }
}

/// Substitute accesses by register name.
///
/// An access `x` (whole) becomes `map[x]`; an access `x[i]` becomes
/// `map[x].reg[i]` when the image is a whole register. Used by the inliner
/// to replace gate formals with actuals.
pub fn substitute_vars(map: &FxHashMap<String, VarAccess>, stmts: &mut [Stmt]) {
    for_each_access_mut(stmts, &mut |access| {
        if let Some(image) = map.get(&access.reg) {
            let offset = match (access.offset, image.offset) {
                (None, img) => img,
                (Some(i), None) => Some(i),
                // A dereferenced single bit cannot be re-dereferenced; the
                // semantic phase rejects such programs before we get here.
                (Some(_), Some(img)) => Some(img),
            };
            *access = VarAccess {
                reg: image.reg.clone(),
                offset,
            };
        }
    });
}

/// Substitute classical parameter references by name.
pub fn substitute_exprs(map: &FxHashMap<String, Expr>, stmts: &mut [Stmt]) {
    for_each_expr_mut(stmts, &mut |expr| {
        subst_expr(map, expr);
    });
}

fn subst_expr(map: &FxHashMap<String, Expr>, expr: &mut Expr) {
    match expr {
        Expr::Var(name) => {
            if let Some(image) = map.get(name) {
                *expr = image.clone();
            }
        }
        Expr::Unary(_, sub) => subst_expr(map, sub),
        Expr::Binary(lhs, _, rhs) => {
            subst_expr(map, lhs);
            subst_expr(map, rhs);
        }
        Expr::Int(_) | Expr::Real(_) | Expr::Pi => {}
    }
}

/// Substitute accesses by full access path (structural equality).
///
/// Used when applying a layout: each virtual access maps to a physical one.
pub fn substitute_accesses(map: &FxHashMap<VarAccess, VarAccess>, stmts: &mut [Stmt]) {
    for_each_access_mut(stmts, &mut |access| {
        if let Some(image) = map.get(access) {
            *access = image.clone();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    struct GateCounter {
        count: usize,
    }

    impl Visitor for GateCounter {
        fn visit_gate(&mut self, gate: &Gate) {
            self.count += 1;
            walk_gate(self, gate);
        }
    }

    fn cx(line: u32, c: u32, t: u32) -> Stmt {
        Stmt::gate(
            line,
            Gate::CNot {
                ctrl: VarAccess::offset("q", c),
                tgt: VarAccess::offset("q", t),
            },
        )
    }

    #[test]
    fn test_visitor_counts_nested_gates() {
        let mut prog = Program::new();
        prog.stmts.push(cx(1, 0, 1));
        prog.stmts.push(Stmt::new(
            2,
            StmtKind::If {
                reg: "c".into(),
                value: 1,
                then: Box::new(cx(2, 1, 0)),
            },
        ));

        let mut counter = GateCounter { count: 0 };
        counter.visit_program(&prog);
        assert_eq!(counter.count, 2);
    }

    struct DropCnots;

    impl Rewriter for DropCnots {
        fn replace_gate(&mut self, line: u32, gate: Gate) -> Vec<Stmt> {
            match gate {
                Gate::CNot { .. } => vec![],
                other => vec![Stmt::gate(line, other)],
            }
        }
    }

    #[test]
    fn test_rewriter_deletes() {
        let mut prog = Program::new();
        prog.stmts.push(cx(1, 0, 1));
        prog.stmts.push(Stmt::gate(
            2,
            Gate::Call {
                name: "h".into(),
                cargs: vec![],
                qargs: vec![VarAccess::offset("q", 0)],
            },
        ));

        DropCnots.rewrite_program(&mut prog);
        assert_eq!(prog.stmts.len(), 1);
    }

    #[test]
    fn test_rewriter_leaves_if_bodies() {
        let mut prog = Program::new();
        prog.stmts.push(Stmt::new(
            1,
            StmtKind::If {
                reg: "c".into(),
                value: 1,
                then: Box::new(cx(1, 0, 1)),
            },
        ));

        DropCnots.rewrite_program(&mut prog);
        assert_eq!(prog.stmts.len(), 1);
        assert!(matches!(prog.stmts[0].kind, StmtKind::If { .. }));
    }

    #[test]
    fn test_substitute_vars() {
        let mut stmts = vec![Stmt::gate(
            1,
            Gate::CNot {
                ctrl: VarAccess::var("a"),
                tgt: VarAccess::var("b"),
            },
        )];
        let mut map = FxHashMap::default();
        map.insert("a".to_string(), VarAccess::offset("q", 2));
        map.insert("b".to_string(), VarAccess::offset("q", 0));

        substitute_vars(&map, &mut stmts);
        match &stmts[0].kind {
            StmtKind::Gate(Gate::CNot { ctrl, tgt }) => {
                assert_eq!(*ctrl, VarAccess::offset("q", 2));
                assert_eq!(*tgt, VarAccess::offset("q", 0));
            }
            other => panic!("unexpected statement: {other:?}"),
        }
    }

    #[test]
    fn test_substitute_accesses() {
        let mut stmts = vec![cx(1, 0, 1)];
        let mut map = FxHashMap::default();
        map.insert(VarAccess::offset("q", 0), VarAccess::offset("p", 4));

        substitute_accesses(&map, &mut stmts);
        match &stmts[0].kind {
            StmtKind::Gate(Gate::CNot { ctrl, tgt }) => {
                assert_eq!(*ctrl, VarAccess::offset("p", 4));
                assert_eq!(*tgt, VarAccess::offset("q", 1));
            }
            other => panic!("unexpected statement: {other:?}"),
        }
    }
}
