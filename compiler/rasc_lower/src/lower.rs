//! Parse tree to IR.

use rasc_diagnostic::{Diagnostic, ErrorCode};
use rasc_ir::{
    ensure_sufficient_stack, ExprId, ExprKind as AstExpr, Script, Span, Stmt as AstStmt, StmtKind,
    StringInterner, UnaryOp, ValueType,
};
use rasc_registry::{FunctionInfo, Registry};
use rasc_types::{NameRef, SymbolId, SymbolKind, TypedScript};
use rustc_hash::FxHashMap;

use crate::fold;
use crate::ir::{
    Call, Con, Expr, ExprKind, ImageIndex, ImageRead, ImageVarDecl, ImageVarId, ReadPos, Slot,
    Stmt, Target,
};
use crate::{CompiledScript, ExecModel};

/// Where a symbol's value lives at run time.
#[derive(Copy, Clone, Debug)]
enum Storage {
    SourceImage(ImageIndex),
    DestImage(ImageIndex),
    ImageVar(ImageVarId),
    Local(Slot),
}

pub(crate) struct Lowerer<'a> {
    script: &'a Script,
    interner: &'a StringInterner,
    registry: &'a Registry,
    typed: &'a TypedScript,
    model: ExecModel,
    storage: FxHashMap<SymbolId, Storage>,
    local_count: u32,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Lowerer<'a> {
    pub(crate) fn new(
        script: &'a Script,
        interner: &'a StringInterner,
        registry: &'a Registry,
        typed: &'a TypedScript,
        model: ExecModel,
    ) -> Self {
        let resolution = &typed.resolution;
        let mut storage = FxHashMap::default();
        for (i, &id) in resolution.image_symbols.iter().enumerate() {
            let index = ImageIndex(i as u32);
            let place = match resolution.symbols.symbol(id).kind {
                SymbolKind::DestImage => Storage::DestImage(index),
                _ => Storage::SourceImage(index),
            };
            storage.insert(id, place);
        }
        for (i, id) in resolution.init_symbols.iter().enumerate() {
            if let Some(id) = id {
                storage.insert(*id, Storage::ImageVar(ImageVarId(i as u32)));
            }
        }
        let mut local_count = 0;
        for (id, symbol) in resolution.symbols.iter() {
            if !storage.contains_key(&id) && !symbol.kind.is_image() {
                storage.insert(id, Storage::Local(Slot(local_count)));
                local_count += 1;
            }
        }
        Lowerer {
            script,
            interner,
            registry,
            typed,
            model,
            storage,
            local_count,
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn lower(mut self) -> Result<CompiledScript, Vec<Diagnostic>> {
        self.diagnostics.extend(check_model(self.typed, self.model));

        let script = self.script;
        let mut image_vars = Vec::with_capacity(script.init.len());
        for decl in &script.init {
            let default = decl.default.map(|d| self.lower_expr(d));
            image_vars.push(ImageVarDecl {
                name: self.interner.lookup(decl.name).to_string(),
                default,
            });
        }
        let body = self.lower_stmts(&script.body);

        if !self.diagnostics.is_empty() {
            return Err(self.diagnostics);
        }
        Ok(CompiledScript {
            model: self.model,
            image_params: self.typed.resolution.image_params.clone(),
            image_vars,
            local_count: self.local_count as usize,
            body,
            options: self.typed.resolution.options,
        })
    }

    /// The indirect model returns one value, so it can feed one image.
    fn storage(&mut self, id: Option<SymbolId>) -> Option<Storage> {
        let storage = id.and_then(|id| self.storage.get(&id).copied());
        if storage.is_none() {
            self.internal("unresolved name reached lowering");
        }
        storage
    }

    #[cold]
    fn internal(&mut self, message: &str) {
        self.diagnostics
            .push(Diagnostic::error(ErrorCode::E3003).with_message(format!("internal: {message}")));
    }

    // Statements

    fn lower_stmts(&mut self, stmts: &'a [AstStmt]) -> Vec<Stmt> {
        let mut out = Vec::with_capacity(stmts.len());
        for stmt in stmts {
            self.lower_stmt(stmt, &mut out);
        }
        out
    }

    /// Lower a nested body; a block is flattened into the statement list.
    fn lower_body(&mut self, stmt: &'a AstStmt) -> Vec<Stmt> {
        let mut out = Vec::new();
        self.lower_stmt(stmt, &mut out);
        out
    }

    fn lower_stmt(&mut self, stmt: &'a AstStmt, out: &mut Vec<Stmt>) {
        let target = self.typed.resolution.stmt_targets[stmt.id.index()];
        match &stmt.kind {
            StmtKind::Assign { op, value, .. } => {
                let value = self.lower_expr(*value);
                let Some(storage) = self.storage(target) else {
                    return;
                };
                let value = match op.binary_op() {
                    None => value,
                    Some(_) => {
                        let current = self.read_storage(storage, self.target_type(target));
                        self.stmt_call(stmt, vec![current, value])
                    }
                };
                out.push(self.write_storage(storage, value));
            }
            StmtKind::IncDec { .. } => {
                let Some(storage) = self.storage(target) else {
                    return;
                };
                let current = self.read_storage(storage, self.target_type(target));
                let value = self.stmt_call(stmt, vec![current, Expr::literal(1.0)]);
                out.push(self.write_storage(storage, value));
            }
            StmtKind::Expr(expr) => {
                let expr = self.lower_expr(*expr);
                out.push(Stmt::Eval(expr));
            }
            StmtKind::Block(stmts) => {
                for stmt in stmts {
                    self.lower_stmt(stmt, out);
                }
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond = self.lower_expr(*cond);
                let then_branch = self.lower_body(then_branch);
                let else_branch = else_branch
                    .as_ref()
                    .map(|stmt| self.lower_body(stmt))
                    .unwrap_or_default();
                out.push(Stmt::If {
                    cond,
                    then_branch,
                    else_branch,
                });
            }
            StmtKind::While { cond, body } => {
                let cond = self.lower_expr(*cond);
                let body = self.lower_body(body);
                out.push(Stmt::While { cond, body });
            }
            StmtKind::Until { cond, body } => {
                let cond = self.lower_expr(*cond);
                let body = self.lower_body(body);
                out.push(Stmt::Until { cond, body });
            }
            StmtKind::Foreach { source, body, .. } => {
                let source = self.lower_expr(*source);
                let Some(Storage::Local(var)) = self.storage(target) else {
                    self.internal("loop variable without a slot");
                    return;
                };
                let body = self.lower_body(body);
                out.push(Stmt::ForEach { var, source, body });
            }
            StmtKind::Break => out.push(Stmt::Break),
            StmtKind::BreakIf(cond) => {
                let cond = self.lower_expr(*cond);
                out.push(Stmt::BreakIf(cond));
            }
            StmtKind::Empty => {}
        }
    }

    fn target_type(&self, target: Option<SymbolId>) -> ValueType {
        target.map_or(ValueType::Scalar, |id| {
            self.typed.resolution.symbols.symbol(id).kind.value_type()
        })
    }

    fn read_storage(&mut self, storage: Storage, ty: ValueType) -> Expr {
        let kind = match storage {
            Storage::Local(slot) => ExprKind::Local(slot),
            Storage::ImageVar(var) => ExprKind::ImageVar(var),
            Storage::SourceImage(image) => ExprKind::ImageRead(ImageRead {
                image,
                pos: None,
                band: None,
            }),
            Storage::DestImage(_) => {
                self.internal("destination image read");
                ExprKind::Literal(f64::NAN)
            }
        };
        Expr { kind, ty }
    }

    fn write_storage(&mut self, storage: Storage, value: Expr) -> Stmt {
        match storage {
            Storage::Local(slot) => Stmt::Assign {
                target: Target::Local(slot),
                value,
            },
            Storage::ImageVar(var) => Stmt::Assign {
                target: Target::ImageVar(var),
                value,
            },
            Storage::DestImage(image) => match self.model {
                ExecModel::Direct => Stmt::WriteDest { image, value },
                ExecModel::Indirect => Stmt::Return(value),
            },
            Storage::SourceImage(_) => {
                self.internal("source image write");
                Stmt::Eval(value)
            }
        }
    }

    /// Read-modify-write call of a compound assignment or `++`/`--`.
    fn stmt_call(&mut self, stmt: &AstStmt, args: Vec<Expr>) -> Expr {
        match self.typed.stmt_calls[stmt.id.index()] {
            Some(func) => self.make_call(func, args),
            None => {
                self.internal("compound assignment without a signature");
                Expr::literal(f64::NAN)
            }
        }
    }

    // Expressions

    fn lower_expr(&mut self, id: ExprId) -> Expr {
        ensure_sufficient_stack(|| self.lower_expr_inner(id))
    }

    fn lower_expr_inner(&mut self, id: ExprId) -> Expr {
        let script = self.script;
        let arena = &script.arena;
        let ty = self.typed.expr_type(id);
        match arena.kind(id) {
            AstExpr::Number(n) => Expr::literal(*n),
            AstExpr::Bool(b) => Expr::literal(if *b { 1.0 } else { 0.0 }),
            AstExpr::Null => Expr::literal(f64::NAN),
            AstExpr::Ident(_) => match self.typed.resolution.expr_refs[id.index()] {
                Some(NameRef::Constant(value)) => Expr::literal(value),
                Some(NameRef::Symbol(symbol)) => match self.storage(Some(symbol)) {
                    Some(storage) => self.read_storage(storage, ty),
                    None => Expr::literal(f64::NAN),
                },
                None => {
                    self.internal("unresolved identifier");
                    Expr::literal(f64::NAN)
                }
            },
            AstExpr::List(items) => {
                let items = arena.list(*items).iter().map(|&i| self.lower_expr(i)).collect();
                Expr {
                    kind: ExprKind::List(items),
                    ty: ValueType::List,
                }
            }
            AstExpr::Range { start, end } => {
                let start = self.lower_expr(*start);
                let end = self.lower_expr(*end);
                Expr {
                    kind: ExprKind::Range(Box::new(start), Box::new(end)),
                    ty: ValueType::List,
                }
            }
            AstExpr::Indexed { pos, band, .. } => {
                let symbol = match self.typed.resolution.expr_refs[id.index()] {
                    Some(NameRef::Symbol(symbol)) => Some(symbol),
                    _ => None,
                };
                let Some(Storage::SourceImage(image)) = self.storage(symbol) else {
                    self.internal("indexed read of a non-image");
                    return Expr::literal(f64::NAN);
                };
                let pos = pos.map(|pos| ReadPos {
                    x: Box::new(self.lower_expr(pos.x.expr)),
                    y: Box::new(self.lower_expr(pos.y.expr)),
                    x_absolute: pos.x.absolute,
                    y_absolute: pos.y.absolute,
                });
                let band = band.map(|band| Box::new(self.lower_expr(band)));
                Expr::scalar(ExprKind::ImageRead(ImageRead { image, pos, band }))
            }
            AstExpr::Unary { op, operand } => {
                let operand = self.lower_expr(*operand);
                if *op == UnaryOp::Plus {
                    return operand;
                }
                self.expr_call(id, vec![operand])
            }
            AstExpr::Binary { left, right, .. } => {
                let args = vec![self.lower_expr(*left), self.lower_expr(*right)];
                self.expr_call(id, args)
            }
            AstExpr::Ternary {
                cond,
                then_expr,
                else_expr,
            } => {
                // c ? a : b  ==  con(truth(c), a, b)
                let cond = self.lower_expr(*cond);
                let cond = self.truth(cond);
                let branches = vec![self.lower_expr(*then_expr), self.lower_expr(*else_expr)];
                Expr {
                    kind: ExprKind::Con(Con {
                        cond: Box::new(cond),
                        branches,
                    }),
                    ty,
                }
            }
            AstExpr::Call { func, args } => {
                let args: Vec<Expr> = arena.list(*args).iter().map(|&a| self.lower_expr(a)).collect();
                if self.interner.lookup(*func) == "con" {
                    let mut args = args.into_iter();
                    let Some(cond) = args.next() else {
                        self.internal("`con` without a condition");
                        return Expr::literal(f64::NAN);
                    };
                    return Expr {
                        kind: ExprKind::Con(Con {
                            cond: Box::new(cond),
                            branches: args.collect(),
                        }),
                        ty,
                    };
                }
                self.expr_call(id, args)
            }
        }
    }

    fn expr_call(&mut self, id: ExprId, args: Vec<Expr>) -> Expr {
        match self.typed.call(id) {
            Some(func) => {
                let func = *func;
                self.make_call(func, args)
            }
            None => {
                self.internal("call without a signature");
                Expr::literal(f64::NAN)
            }
        }
    }

    fn truth(&mut self, cond: Expr) -> Expr {
        match self.registry.lookup("_truth", &[cond.ty]) {
            Ok(func) => {
                let func = *func;
                self.make_call(func, vec![cond])
            }
            Err(_) => {
                self.internal("missing `_truth`");
                cond
            }
        }
    }

    /// Build a call node, folding it when the function is pure and all
    /// arguments are literals.
    fn make_call(&mut self, func: FunctionInfo, args: Vec<Expr>) -> Expr {
        if let Some(value) = fold::try_fold(&func, &args) {
            return Expr::literal(value);
        }
        Expr {
            ty: func.ret,
            kind: ExprKind::Call(Call { func, args }),
        }
    }
}

/// The indirect model returns one value per pixel, so it takes at most one
/// destination image.
pub(crate) fn check_model(typed: &TypedScript, model: ExecModel) -> Option<Diagnostic> {
    if model != ExecModel::Indirect {
        return None;
    }
    let resolution = &typed.resolution;
    let dests: Vec<_> = resolution.image_params.dests().collect();
    if dests.len() <= 1 {
        return None;
    }
    let mut diag = Diagnostic::error(ErrorCode::E4001)
        .with_message(format!(
            "the indirect model supports one destination image, found {}",
            dests.len()
        ))
        .with_note(format!("destination images: {}", dests.join(", ")));
    let spans = resolution.image_symbols.iter().filter_map(|&id| {
        let symbol = resolution.symbols.symbol(id);
        (symbol.kind == SymbolKind::DestImage && symbol.span != Span::DUMMY).then_some(symbol.span)
    });
    for span in spans {
        diag = diag.with_label(span, "destination image");
    }
    Some(diag)
}
