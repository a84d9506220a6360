//! Symbol and scope resolution.
//!
//! One pass over the script classifies every identifier, declares
//! implicit variables and reports misuse of images, constants and loop
//! variables. Errors never stop the walk.

use rasc_diagnostic::{undefined_variable, Diagnostic, ErrorCode};
use rasc_ir::{
    ensure_sufficient_stack, ExprId, ExprKind, ImageParams, ImageRole, Name, OptionValue, Script,
    Span, Stmt, StmtId, StmtKind, StringInterner,
};
use rasc_registry::{OptionArg, OptionError, Registry, ScriptOptions};

use crate::scope::{ScopeId, SymbolId, SymbolKind, SymbolTable};

/// What an identifier in expression position refers to.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum NameRef {
    Symbol(SymbolId),
    /// A registry constant, already replaced by its value.
    Constant(f64),
}

/// Resolver output, indexed by `ExprId` and `StmtId`.
#[derive(Clone, Debug)]
pub struct Resolution {
    pub image_params: ImageParams,
    pub symbols: SymbolTable,
    /// Image symbols in `image_params` order.
    pub image_symbols: Vec<SymbolId>,
    /// One entry per `init` declaration.
    pub init_symbols: Vec<Option<SymbolId>>,
    /// Identifier and image-read expressions.
    pub expr_refs: Vec<Option<NameRef>>,
    /// Assignment and increment targets, `foreach` loop variables.
    pub stmt_targets: Vec<Option<SymbolId>>,
    pub options: ScriptOptions,
}

pub struct ResolveOutput {
    pub resolution: Resolution,
    pub diagnostics: Vec<Diagnostic>,
}

/// Resolve every name in `script` against `image_params`, its `init`
/// declarations and the registry.
#[tracing::instrument(level = "debug", skip_all)]
pub fn resolve(
    script: &Script,
    interner: &mut StringInterner,
    registry: &Registry,
    image_params: &ImageParams,
) -> ResolveOutput {
    let images: Vec<(Name, ImageRole)> = image_params
        .iter()
        .map(|(name, role)| (interner.intern(name), role))
        .collect();

    let mut resolver = Resolver::new(script, interner, registry, image_params.clone());
    resolver.seed_images(&images);
    resolver.resolve_options();
    resolver.resolve_init();
    resolver.resolve_body();
    resolver.report_unused_images();

    let output = resolver.finish();
    tracing::debug!(
        symbols = output.resolution.symbols.len(),
        scopes = output.resolution.symbols.scope_count(),
        errors = output.diagnostics.iter().filter(|d| d.is_error()).count(),
        "resolution complete"
    );
    output
}

struct Resolver<'a> {
    script: &'a Script,
    interner: &'a StringInterner,
    registry: &'a Registry,
    image_params: ImageParams,
    symbols: SymbolTable,
    scope: ScopeId,
    loop_depth: u32,
    image_symbols: Vec<SymbolId>,
    init_symbols: Vec<Option<SymbolId>>,
    expr_refs: Vec<Option<NameRef>>,
    stmt_targets: Vec<Option<SymbolId>>,
    options: ScriptOptions,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Resolver<'a> {
    fn new(
        script: &'a Script,
        interner: &'a StringInterner,
        registry: &'a Registry,
        image_params: ImageParams,
    ) -> Self {
        Resolver {
            script,
            interner,
            registry,
            image_params,
            symbols: SymbolTable::new(),
            scope: ScopeId::GLOBAL,
            loop_depth: 0,
            image_symbols: Vec::new(),
            init_symbols: Vec::with_capacity(script.init.len()),
            expr_refs: vec![None; script.arena.len()],
            stmt_targets: vec![None; script.stmt_count as usize],
            options: ScriptOptions::default(),
            diagnostics: Vec::new(),
        }
    }

    fn finish(self) -> ResolveOutput {
        ResolveOutput {
            resolution: Resolution {
                image_params: self.image_params,
                symbols: self.symbols,
                image_symbols: self.image_symbols,
                init_symbols: self.init_symbols,
                expr_refs: self.expr_refs,
                stmt_targets: self.stmt_targets,
                options: self.options,
            },
            diagnostics: self.diagnostics,
        }
    }

    fn name(&self, name: Name) -> &'a str {
        self.interner.lookup(name)
    }

    fn error(&mut self, diag: Diagnostic) {
        self.diagnostics.push(diag);
    }

    fn with_child_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let parent = self.scope;
        self.scope = self.symbols.push_scope(parent);
        let result = f(self);
        self.scope = parent;
        result
    }

    fn in_loop<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.loop_depth += 1;
        let result = f(self);
        self.loop_depth -= 1;
        result
    }

    // Header

    fn seed_images(&mut self, images: &[(Name, ImageRole)]) {
        for &(name, role) in images {
            let span = self
                .script
                .images
                .iter()
                .find(|decl| decl.name == name)
                .map_or(Span::DUMMY, |decl| decl.span);
            let kind = match role {
                ImageRole::Source => SymbolKind::SourceImage,
                ImageRole::Dest => SymbolKind::DestImage,
            };
            let id = self.symbols.declare(ScopeId::GLOBAL, name, kind, span);
            self.image_symbols.push(id);
        }
    }

    fn resolve_options(&mut self) {
        let script = self.script;
        for decl in &script.options {
            let name = self.name(decl.name);
            let arg = match decl.value {
                OptionValue::Number(n) => OptionArg::Number(n),
                OptionValue::Bool(b) => OptionArg::Bool(b),
                OptionValue::Null => OptionArg::Null,
                OptionValue::Ident(value) => OptionArg::Name(self.name(value)),
            };
            match self.registry.apply_option(name, arg) {
                Ok(setting) => self.options.apply(setting),
                Err(err @ OptionError::UnknownOption { .. }) => self.error(
                    Diagnostic::warning(ErrorCode::W5002)
                        .with_message(err.to_string())
                        .with_label(decl.name_span, "option ignored"),
                ),
                Err(err @ OptionError::InvalidValue { .. }) => self.error(
                    Diagnostic::warning(ErrorCode::W5003)
                        .with_message(err.to_string())
                        .with_label(decl.value_span, "option ignored"),
                ),
            }
        }
    }

    fn resolve_init(&mut self) {
        let script = self.script;
        for decl in &script.init {
            if let Some(default) = decl.default {
                self.resolve_expr(default);
            }
            let text = self.name(decl.name);
            let existing = self.symbols.lookup_local(ScopeId::GLOBAL, decl.name);
            let existing = existing.map(|id| {
                let symbol = self.symbols.symbol(id);
                (symbol.kind, symbol.span)
            });
            let symbol = match existing {
                Some((kind, _)) if kind.is_image() => {
                    let diag = Diagnostic::error(ErrorCode::E2003)
                        .with_message(format!(
                            "image variable `{text}` cannot be redeclared as an image-scope variable"
                        ))
                        .with_label(decl.span, "redeclared here");
                    self.error(diag);
                    None
                }
                Some((_, first)) => {
                    self.error(
                        Diagnostic::error(ErrorCode::E2002)
                            .with_message(format!("`{text}` is declared more than once"))
                            .with_label(decl.span, "duplicate declaration")
                            .with_secondary_label(first, "first declared here"),
                    );
                    None
                }
                None if self.registry.is_constant(text) => {
                    self.error(
                        Diagnostic::error(ErrorCode::E2007)
                            .with_message(format!("cannot declare constant `{text}` as a variable"))
                            .with_label(decl.span, "constant"),
                    );
                    None
                }
                None => Some(self.symbols.declare(
                    ScopeId::GLOBAL,
                    decl.name,
                    SymbolKind::Unknown,
                    decl.span,
                )),
            };
            self.init_symbols.push(symbol);
        }
    }

    fn resolve_body(&mut self) {
        let script = self.script;
        // Pixel scope: locals of the body live here, below image scope.
        self.with_child_scope(|this| this.resolve_stmts(&script.body));
    }

    fn report_unused_images(&mut self) {
        for &id in &self.image_symbols {
            let symbol = self.symbols.symbol(id);
            if symbol.used {
                continue;
            }
            let mut diag = Diagnostic::warning(ErrorCode::W5001)
                .with_message(format!("image `{}` is never used", self.name(symbol.name)));
            if symbol.span != Span::DUMMY {
                diag = diag.with_label(symbol.span, "declared here");
            }
            self.diagnostics.push(diag);
        }
    }

    // Statements

    fn resolve_stmts(&mut self, stmts: &'a [Stmt]) {
        for stmt in stmts {
            self.resolve_stmt(stmt);
        }
    }

    /// Body of a conditional or loop: always a fresh scope.
    fn resolve_nested(&mut self, stmt: &'a Stmt) {
        self.with_child_scope(|this| match &stmt.kind {
            StmtKind::Block(stmts) => this.resolve_stmts(stmts),
            _ => this.resolve_stmt(stmt),
        });
    }

    fn resolve_stmt(&mut self, stmt: &'a Stmt) {
        match &stmt.kind {
            StmtKind::Assign {
                target,
                target_span,
                op,
                value,
            } => {
                self.resolve_expr(*value);
                let compound = op.binary_op().map(|_| op.symbol());
                self.resolve_target(stmt.id, *target, *target_span, compound);
            }
            StmtKind::IncDec {
                target,
                target_span,
                op,
                ..
            } => {
                self.resolve_target(stmt.id, *target, *target_span, Some(op.symbol()));
            }
            StmtKind::Expr(expr) => self.resolve_expr(*expr),
            StmtKind::Block(stmts) => self.with_child_scope(|this| this.resolve_stmts(stmts)),
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(*cond);
                self.resolve_nested(then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_nested(else_branch);
                }
            }
            StmtKind::While { cond, body } | StmtKind::Until { cond, body } => {
                self.resolve_expr(*cond);
                self.in_loop(|this| this.resolve_nested(body));
            }
            StmtKind::Foreach {
                var,
                var_span,
                source,
                body,
            } => {
                self.resolve_expr(*source);
                self.with_child_scope(|this| {
                    let id = this
                        .symbols
                        .declare(this.scope, *var, SymbolKind::LoopVariable, *var_span);
                    this.stmt_targets[stmt.id.index()] = Some(id);
                    this.in_loop(|this| this.resolve_nested(body));
                });
            }
            StmtKind::Break => self.check_in_loop(stmt.span, "break"),
            StmtKind::BreakIf(cond) => {
                self.resolve_expr(*cond);
                self.check_in_loop(stmt.span, "breakif");
            }
            StmtKind::Empty => {}
        }
    }

    fn check_in_loop(&mut self, span: Span, keyword: &str) {
        if self.loop_depth == 0 {
            self.error(
                Diagnostic::error(ErrorCode::E2012)
                    .with_message(format!("`{keyword}` outside of a loop"))
                    .with_label(span, "not inside `while`, `until` or `foreach`"),
            );
        }
    }

    /// Resolve the target of an assignment. `compound` holds the operator
    /// when the target is also read (`+=`, `++`).
    fn resolve_target(&mut self, stmt: StmtId, name: Name, span: Span, compound: Option<&str>) {
        let text = self.name(name);
        let Some(id) = self.symbols.lookup(self.scope, name) else {
            if self.registry.is_constant(text) {
                self.error(
                    Diagnostic::error(ErrorCode::E2007)
                        .with_message(format!("cannot assign to constant `{text}`"))
                        .with_label(span, "constant"),
                );
            } else if compound.is_some() {
                self.error(undefined_variable(span, text));
            } else {
                let id = self.symbols.declare(self.scope, name, SymbolKind::Unknown, span);
                self.stmt_targets[stmt.index()] = Some(id);
            }
            return;
        };

        let kind = self.symbols.symbol(id).kind;
        match kind {
            SymbolKind::SourceImage => self.error(
                Diagnostic::error(ErrorCode::E2004)
                    .with_message(format!("cannot write to source image `{text}`"))
                    .with_label(span, "source images are read-only"),
            ),
            SymbolKind::DestImage => {
                if let Some(op) = compound {
                    self.error(
                        Diagnostic::error(ErrorCode::E2005)
                            .with_message(format!(
                                "invalid assignment operator `{op}` with destination image `{text}`"
                            ))
                            .with_label(span, "destination images only accept `=`")
                            .with_note("destination images are write-only and cannot be read back"),
                    );
                }
            }
            SymbolKind::LoopVariable => self.error(
                Diagnostic::error(ErrorCode::E2008)
                    .with_message(format!("cannot assign to loop variable `{text}`"))
                    .with_label(span, "loop variable"),
            ),
            SymbolKind::Scalar | SymbolKind::List | SymbolKind::Unknown => {}
        }
        self.symbols.mark_used(id);
        self.stmt_targets[stmt.index()] = Some(id);
    }

    // Expressions

    fn resolve_expr(&mut self, id: ExprId) {
        ensure_sufficient_stack(|| self.resolve_expr_inner(id));
    }

    fn resolve_expr_inner(&mut self, id: ExprId) {
        let script = self.script;
        let arena = &script.arena;
        let span = arena.span(id);
        match arena.kind(id) {
            ExprKind::Number(_) | ExprKind::Bool(_) | ExprKind::Null => {}
            ExprKind::Ident(name) => self.resolve_read(id, *name, span),
            ExprKind::Call { func, args } => {
                for &arg in arena.list(*args) {
                    self.resolve_expr(arg);
                }
                self.resolve_call(*func, args.len(), span);
            }
            ExprKind::List(items) => {
                for &item in arena.list(*items) {
                    self.resolve_expr(item);
                }
            }
            ExprKind::Indexed { name, pos, band } => {
                if let Some(pos) = pos {
                    self.resolve_expr(pos.x.expr);
                    self.resolve_expr(pos.y.expr);
                }
                if let Some(band) = band {
                    self.resolve_expr(*band);
                }
                self.resolve_image_read(id, *name, span);
            }
            ExprKind::Unary { operand, .. } => self.resolve_expr(*operand),
            ExprKind::Binary { left, right, .. } => {
                self.resolve_expr(*left);
                self.resolve_expr(*right);
            }
            ExprKind::Ternary {
                cond,
                then_expr,
                else_expr,
            } => {
                self.resolve_expr(*cond);
                self.resolve_expr(*then_expr);
                self.resolve_expr(*else_expr);
            }
            ExprKind::Range { start, end } => {
                self.resolve_expr(*start);
                self.resolve_expr(*end);
            }
        }
    }

    fn resolve_read(&mut self, expr: ExprId, name: Name, span: Span) {
        let text = self.name(name);
        if let Some(id) = self.symbols.lookup(self.scope, name) {
            if self.symbols.symbol(id).kind == SymbolKind::DestImage {
                self.error(read_dest_image(span, text));
            }
            self.symbols.mark_used(id);
            self.expr_refs[expr.index()] = Some(NameRef::Symbol(id));
        } else if let Some(value) = self.registry.constant(text) {
            self.expr_refs[expr.index()] = Some(NameRef::Constant(value));
        } else {
            self.error(undefined_variable(span, text));
        }
    }

    fn resolve_image_read(&mut self, expr: ExprId, name: Name, span: Span) {
        let text = self.name(name);
        let Some(id) = self.symbols.lookup(self.scope, name) else {
            self.error(undefined_variable(span, text));
            return;
        };
        let kind = self.symbols.symbol(id).kind;
        match kind {
            SymbolKind::SourceImage => {}
            SymbolKind::DestImage => self.error(read_dest_image(span, text)),
            kind => self.error(
                Diagnostic::error(ErrorCode::E2010)
                    .with_message(format!("cannot index `{text}`: it is not a source image"))
                    .with_label(span, format!("`{text}` is a {kind}")),
            ),
        }
        self.symbols.mark_used(id);
        self.expr_refs[expr.index()] = Some(NameRef::Symbol(id));
    }

    fn resolve_call(&mut self, func: Name, argc: usize, span: Span) {
        let text = self.name(func);
        if text == "con" {
            if !(1..=4).contains(&argc) {
                self.error(
                    Diagnostic::error(ErrorCode::E3004)
                        .with_message(format!("`con` takes 1 to 4 arguments, found {argc}"))
                        .with_label(span, "wrong number of arguments"),
                );
            }
        } else if !self.registry.has_function(text) {
            self.error(
                Diagnostic::error(ErrorCode::E2009)
                    .with_message(format!("undefined function `{text}`"))
                    .with_label(span, "not a registered function"),
            );
        }
    }
}

fn read_dest_image(span: Span, name: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E2006)
        .with_message(format!("cannot read destination image `{name}`"))
        .with_label(span, "destination images are write-only")
}
