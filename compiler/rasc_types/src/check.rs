//! Type checking.
//!
//! Assigns a [`ValueType`] to every expression, picks the registry
//! signature for every call and operator, and settles the kind of each
//! implicitly declared variable from its first assignment.

use rasc_diagnostic::{Diagnostic, ErrorCode};
use rasc_ir::{
    ensure_sufficient_stack, BinaryOp, ExprId, ExprKind, ExprRange, IncDec, Script, Span, Stmt,
    StmtKind, StringInterner, UnaryOp, ValueType,
};
use rasc_registry::{FunctionInfo, LookupError, Registry};
use smallvec::SmallVec;

use crate::resolve::{NameRef, Resolution};
use crate::scope::{SymbolId, SymbolKind};

/// A resolved and type-checked script.
#[derive(Clone, Debug)]
pub struct TypedScript {
    pub resolution: Resolution,
    /// Type of every expression, indexed by `ExprId`.
    pub expr_types: Vec<ValueType>,
    /// Registry signature chosen for calls and operators, by `ExprId`.
    pub calls: Vec<Option<FunctionInfo>>,
    /// Signature used by compound assignments and `++`/`--`, by `StmtId`.
    pub stmt_calls: Vec<Option<FunctionInfo>>,
}

impl TypedScript {
    #[inline]
    pub fn expr_type(&self, id: ExprId) -> ValueType {
        self.expr_types[id.index()]
    }

    #[inline]
    pub fn call(&self, id: ExprId) -> Option<&FunctionInfo> {
        self.calls[id.index()].as_ref()
    }
}

pub struct CheckOutput {
    pub typed: TypedScript,
    pub diagnostics: Vec<Diagnostic>,
}

#[tracing::instrument(level = "debug", skip_all)]
pub fn check(
    script: &Script,
    interner: &StringInterner,
    registry: &Registry,
    resolution: Resolution,
) -> CheckOutput {
    let mut checker = Checker {
        script,
        interner,
        registry,
        expr_types: vec![ValueType::Scalar; script.arena.len()],
        calls: vec![None; script.arena.len()],
        stmt_calls: vec![None; script.stmt_count as usize],
        resolution,
        diagnostics: Vec::new(),
    };
    checker.check_init();
    for stmt in &script.body {
        checker.check_stmt(stmt);
    }
    checker.resolution.symbols.finalize_remaining(SymbolKind::Scalar);

    let output = CheckOutput {
        typed: TypedScript {
            resolution: checker.resolution,
            expr_types: checker.expr_types,
            calls: checker.calls,
            stmt_calls: checker.stmt_calls,
        },
        diagnostics: checker.diagnostics,
    };
    tracing::debug!(
        errors = output.diagnostics.len(),
        "type checking complete"
    );
    output
}

struct Checker<'a> {
    script: &'a Script,
    interner: &'a StringInterner,
    registry: &'a Registry,
    resolution: Resolution,
    expr_types: Vec<ValueType>,
    calls: Vec<Option<FunctionInfo>>,
    stmt_calls: Vec<Option<FunctionInfo>>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Checker<'a> {
    fn check_init(&mut self) {
        let script = self.script;
        for (decl, symbol) in script.init.iter().zip(self.resolution.init_symbols.clone()) {
            let ty = decl.default.map_or(ValueType::Scalar, |d| self.check_expr(d));
            if ty.is_list() {
                let span = decl.default.map_or(decl.span, |d| script.arena.span(d));
                self.require_scalar_failed(span, "an image-scope variable");
            }
            if let Some(symbol) = symbol {
                // Image-scope variables hold one number each.
                let _ = self.resolution.symbols.finalize(symbol, SymbolKind::Scalar);
            }
        }
    }

    // Statements

    fn check_stmt(&mut self, stmt: &'a Stmt) {
        match &stmt.kind {
            StmtKind::Assign {
                target_span,
                op,
                value,
                ..
            } => {
                let value_ty = self.check_expr(*value);
                let Some(symbol) = self.resolution.stmt_targets[stmt.id.index()] else {
                    return;
                };
                let assigned = match op.binary_op() {
                    None => value_ty,
                    Some(bin) => {
                        let current = self.resolution.symbols.symbol(symbol).kind.value_type();
                        match self.lookup_operator(bin.function_name(), &[current, value_ty], *target_span) {
                            Some(info) => {
                                self.stmt_calls[stmt.id.index()] = Some(info);
                                info.ret
                            }
                            None => current.combine(value_ty),
                        }
                    }
                };
                self.assign(symbol, assigned, *target_span);
            }
            StmtKind::IncDec {
                target_span, op, ..
            } => {
                let Some(symbol) = self.resolution.stmt_targets[stmt.id.index()] else {
                    return;
                };
                let current = self.resolution.symbols.symbol(symbol).kind.value_type();
                let func = match op {
                    IncDec::Inc => BinaryOp::Add,
                    IncDec::Dec => BinaryOp::Sub,
                }
                .function_name();
                if let Some(info) =
                    self.lookup_operator(func, &[current, ValueType::Scalar], *target_span)
                {
                    self.stmt_calls[stmt.id.index()] = Some(info);
                }
            }
            StmtKind::Expr(expr) => {
                self.check_expr(*expr);
            }
            StmtKind::Block(stmts) => {
                for stmt in stmts {
                    self.check_stmt(stmt);
                }
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.check_condition(*cond);
                self.check_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.check_stmt(else_branch);
                }
            }
            StmtKind::While { cond, body } | StmtKind::Until { cond, body } => {
                self.check_condition(*cond);
                self.check_stmt(body);
            }
            StmtKind::Foreach { source, body, .. } => {
                if self.check_expr(*source) == ValueType::Scalar {
                    let span = self.script.arena.span(*source);
                    self.diagnostics.push(
                        Diagnostic::error(ErrorCode::E3001)
                            .with_message("`foreach` iterates over a list, found a scalar")
                            .with_label(span, "expected a list or range"),
                    );
                }
                self.check_stmt(body);
            }
            StmtKind::BreakIf(cond) => self.check_condition(*cond),
            StmtKind::Break | StmtKind::Empty => {}
        }
    }

    /// Record the type assigned to `symbol`, settling it if still unknown.
    fn assign(&mut self, symbol: SymbolId, ty: ValueType, span: Span) {
        let kind = self.resolution.symbols.symbol(symbol).kind;
        let compatible = match kind {
            SymbolKind::Unknown => {
                let _ = self.resolution.symbols.finalize(symbol, SymbolKind::from(ty));
                return;
            }
            SymbolKind::Scalar | SymbolKind::DestImage => ty == ValueType::Scalar,
            SymbolKind::List => ty == ValueType::List,
            // Already rejected during resolution.
            SymbolKind::SourceImage | SymbolKind::LoopVariable => return,
        };
        if !compatible {
            let name = self.interner.lookup(self.resolution.symbols.symbol(symbol).name);
            let first = self.resolution.symbols.symbol(symbol).span;
            let mut diag = Diagnostic::error(ErrorCode::E3001)
                .with_message(format!("cannot assign a {ty} to {kind} `{name}`"))
                .with_label(span, format!("expected a {}", kind.value_type()));
            if first != span && first != Span::DUMMY {
                diag = diag.with_secondary_label(first, "kind fixed by this first assignment");
            }
            self.diagnostics.push(diag);
        }
    }

    fn check_condition(&mut self, cond: ExprId) {
        if self.check_expr(cond).is_list() {
            self.require_scalar_failed(self.script.arena.span(cond), "a condition");
        }
    }

    fn require_scalar_failed(&mut self, span: Span, what: &str) {
        self.diagnostics.push(
            Diagnostic::error(ErrorCode::E3002)
                .with_message(format!("{what} must be a scalar, found a list"))
                .with_label(span, "list not allowed here"),
        );
    }

    // Expressions

    fn check_expr(&mut self, id: ExprId) -> ValueType {
        let ty = ensure_sufficient_stack(|| self.check_expr_inner(id));
        self.expr_types[id.index()] = ty;
        ty
    }

    fn check_expr_inner(&mut self, id: ExprId) -> ValueType {
        let script = self.script;
        let arena = &script.arena;
        let span = arena.span(id);
        match arena.kind(id) {
            ExprKind::Number(_) | ExprKind::Bool(_) | ExprKind::Null => ValueType::Scalar,
            ExprKind::Ident(_) => match self.resolution.expr_refs[id.index()] {
                Some(NameRef::Symbol(symbol)) => {
                    self.resolution.symbols.symbol(symbol).kind.value_type()
                }
                Some(NameRef::Constant(_)) | None => ValueType::Scalar,
            },
            ExprKind::Indexed { pos, band, .. } => {
                if let Some(pos) = pos {
                    for axis in [pos.x, pos.y] {
                        if self.check_expr(axis.expr).is_list() {
                            self.require_scalar_failed(arena.span(axis.expr), "a pixel position");
                        }
                    }
                }
                if let Some(band) = band {
                    if self.check_expr(*band).is_list() {
                        self.require_scalar_failed(arena.span(*band), "a band index");
                    }
                }
                ValueType::Scalar
            }
            ExprKind::List(items) => {
                for &item in arena.list(*items) {
                    if self.check_expr(item).is_list() {
                        self.require_scalar_failed(arena.span(item), "a list element");
                    }
                }
                ValueType::List
            }
            ExprKind::Range { start, end } => {
                for bound in [*start, *end] {
                    if self.check_expr(bound).is_list() {
                        self.require_scalar_failed(arena.span(bound), "a range bound");
                    }
                }
                ValueType::List
            }
            ExprKind::Unary { op, operand } => {
                let operand_ty = self.check_expr(*operand);
                let func = match op {
                    UnaryOp::Plus => return operand_ty,
                    UnaryOp::Neg => "_neg",
                    UnaryOp::Not => "_not",
                };
                self.call_operator(id, func, &[operand_ty], span)
            }
            ExprKind::Binary { op, left, right } => {
                let left_ty = self.check_expr(*left);
                let right_ty = self.check_expr(*right);
                if *op == BinaryOp::Pow && right_ty.is_list() {
                    self.require_scalar_failed(arena.span(*right), "an exponent");
                    return left_ty;
                }
                self.call_operator(id, op.function_name(), &[left_ty, right_ty], span)
            }
            ExprKind::Ternary {
                cond,
                then_expr,
                else_expr,
            } => {
                self.check_condition(*cond);
                let then_ty = self.check_expr(*then_expr);
                let else_ty = self.check_expr(*else_expr);
                then_ty.combine(else_ty)
            }
            ExprKind::Call { func, args } => {
                let name = self.interner.lookup(*func);
                if name == "con" {
                    self.check_con(*args)
                } else {
                    self.check_call(id, name, *args, span)
                }
            }
        }
    }

    /// `con(x, a, b, c)`: scalar condition, branches combine like operands.
    fn check_con(&mut self, args: ExprRange) -> ValueType {
        let ids: SmallVec<[ExprId; 4]> = self.script.arena.list(args).iter().copied().collect();
        let Some((&cond, branches)) = ids.split_first() else {
            return ValueType::Scalar;
        };
        self.check_condition(cond);
        let mut ty = ValueType::Scalar;
        for &branch in branches {
            ty = ty.combine(self.check_expr(branch));
        }
        ty
    }

    fn check_call(&mut self, id: ExprId, name: &str, args: ExprRange, span: Span) -> ValueType {
        let script = self.script;
        let arg_types: SmallVec<[ValueType; 4]> = script
            .arena
            .list(args)
            .iter()
            .map(|&arg| self.check_expr(arg))
            .collect();
        match self.registry.lookup(name, &arg_types) {
            Ok(info) => {
                self.calls[id.index()] = Some(*info);
                info.ret
            }
            // Reported during resolution.
            Err(LookupError::UndefinedFunction { .. }) => ValueType::Scalar,
            Err(err @ LookupError::NoMatchingSignature { .. }) => {
                self.no_matching_signature(&err, span);
                ValueType::Scalar
            }
        }
    }

    fn call_operator(&mut self, id: ExprId, func: &str, args: &[ValueType], span: Span) -> ValueType {
        match self.lookup_operator(func, args, span) {
            Some(info) => {
                self.calls[id.index()] = Some(info);
                info.ret
            }
            None => args
                .iter()
                .copied()
                .fold(ValueType::Scalar, ValueType::combine),
        }
    }

    fn lookup_operator(&mut self, func: &str, args: &[ValueType], span: Span) -> Option<FunctionInfo> {
        match self.registry.lookup(func, args) {
            Ok(info) => Some(*info),
            Err(err) => {
                self.no_matching_signature(&err, span);
                None
            }
        }
    }

    fn no_matching_signature(&mut self, err: &LookupError, span: Span) {
        let mut diag = Diagnostic::error(ErrorCode::E3003)
            .with_message(err.to_string())
            .with_label(span, "no matching signature");
        if let LookupError::NoMatchingSignature { candidates, .. } = err {
            for candidate in candidates {
                diag = diag.with_note(format!("candidate: {candidate}"));
            }
        }
        self.diagnostics.push(diag);
    }
}
