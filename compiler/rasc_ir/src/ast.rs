//! Parse tree.
//!
//! Expressions are flattened into an [`ExprArena`] and referenced by
//! [`ExprId`]; phases after parsing attach their results in side tables
//! keyed by `ExprId` and [`StmtId`] instead of mutating the tree.

use std::fmt;

use crate::{ImageRole, Name, Span};

/// Index of an expression in its [`ExprArena`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ExprId(u32);

impl ExprId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExprId({})", self.0)
    }
}

/// Contiguous run of expression ids (call arguments, list items).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct ExprRange {
    start: u32,
    len: u32,
}

impl ExprRange {
    pub const EMPTY: ExprRange = ExprRange { start: 0, len: 0 };

    #[inline]
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Statement identifier, unique within one script.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct StmtId(u32);

impl StmtId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        StmtId(raw)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    Or,
    Xor,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::Xor => "^|",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "^",
        }
    }

    /// Name of the runtime function implementing this operator.
    pub fn function_name(self) -> &'static str {
        match self {
            BinaryOp::Or => "_or",
            BinaryOp::Xor => "_xor",
            BinaryOp::And => "_and",
            BinaryOp::Eq => "_eq",
            BinaryOp::NotEq => "_ne",
            BinaryOp::Lt => "_lt",
            BinaryOp::LtEq => "_le",
            BinaryOp::Gt => "_gt",
            BinaryOp::GtEq => "_ge",
            BinaryOp::Add => "_add",
            BinaryOp::Sub => "_sub",
            BinaryOp::Mul => "_mul",
            BinaryOp::Div => "_div",
            BinaryOp::Mod => "_mod",
            BinaryOp::Pow => "_pow",
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    Neg,
    Not,
    Plus,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::Plus => "+",
        }
    }
}

/// Assignment operator of an assignment statement.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl AssignOp {
    /// The arithmetic applied by a compound operator; `None` for plain `=`.
    pub fn binary_op(self) -> Option<BinaryOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::Add => Some(BinaryOp::Add),
            AssignOp::Sub => Some(BinaryOp::Sub),
            AssignOp::Mul => Some(BinaryOp::Mul),
            AssignOp::Div => Some(BinaryOp::Div),
            AssignOp::Mod => Some(BinaryOp::Mod),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Mod => "%=",
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum IncDec {
    Inc,
    Dec,
}

impl IncDec {
    pub fn symbol(self) -> &'static str {
        match self {
            IncDec::Inc => "++",
            IncDec::Dec => "--",
        }
    }
}

/// One axis of a pixel position specifier.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Axis {
    pub expr: ExprId,
    /// `$`-prefixed: a world coordinate rather than an offset from the
    /// current position.
    pub absolute: bool,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct PixelPos {
    pub x: Axis,
    pub y: Axis,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Number(f64),
    Bool(bool),
    /// `null` / `NaN`.
    Null,
    Ident(Name),
    Call {
        func: Name,
        args: ExprRange,
    },
    List(ExprRange),
    /// `name[...]`: image read with a position and/or band.
    Indexed {
        name: Name,
        pos: Option<PixelPos>,
        band: Option<ExprId>,
    },
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    Binary {
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    },
    Ternary {
        cond: ExprId,
        then_expr: ExprId,
        else_expr: ExprId,
    },
    /// `a:b`, only produced as a `foreach` source.
    Range {
        start: ExprId,
        end: ExprId,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

/// Flat storage for all expressions of one script.
#[derive(Clone, Debug, Default)]
pub struct ExprArena {
    exprs: Vec<Expr>,
    lists: Vec<ExprId>,
}

impl ExprArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, kind: ExprKind, span: Span) -> ExprId {
        let id = ExprId(u32::try_from(self.exprs.len()).unwrap_or(u32::MAX));
        self.exprs.push(Expr { kind, span });
        id
    }

    pub fn alloc_list(&mut self, items: impl IntoIterator<Item = ExprId>) -> ExprRange {
        let start = self.lists.len();
        self.lists.extend(items);
        let to_u32 = |v: usize| u32::try_from(v).unwrap_or(u32::MAX);
        ExprRange {
            start: to_u32(start),
            len: to_u32(self.lists.len() - start),
        }
    }

    #[inline]
    pub fn get(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    #[inline]
    pub fn kind(&self, id: ExprId) -> &ExprKind {
        &self.exprs[id.index()].kind
    }

    #[inline]
    pub fn span(&self, id: ExprId) -> Span {
        self.exprs[id.index()].span
    }

    #[inline]
    pub fn list(&self, range: ExprRange) -> &[ExprId] {
        let start = range.start as usize;
        &self.lists[start..start + range.len()]
    }

    /// Number of expressions; side tables indexed by `ExprId` use this size.
    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    Assign {
        target: Name,
        target_span: Span,
        op: AssignOp,
        value: ExprId,
    },
    IncDec {
        target: Name,
        target_span: Span,
        op: IncDec,
        prefix: bool,
    },
    Expr(ExprId),
    Block(Vec<Stmt>),
    If {
        cond: ExprId,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        cond: ExprId,
        body: Box<Stmt>,
    },
    Until {
        cond: ExprId,
        body: Box<Stmt>,
    },
    Foreach {
        var: Name,
        var_span: Span,
        source: ExprId,
        body: Box<Stmt>,
    },
    Break,
    BreakIf(ExprId),
    Empty,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    pub id: StmtId,
    pub kind: StmtKind,
    pub span: Span,
}

/// Value on the right of an option directive.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum OptionValue {
    Number(f64),
    Bool(bool),
    Null,
    Ident(Name),
}

#[derive(Clone, Debug, PartialEq)]
pub struct OptionDecl {
    pub name: Name,
    pub value: OptionValue,
    pub name_span: Span,
    pub value_span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImageDecl {
    pub name: Name,
    pub role: ImageRole,
    pub span: Span,
}

/// Image-scope variable declared in an `init` block.
#[derive(Clone, Debug, PartialEq)]
pub struct InitDecl {
    pub name: Name,
    pub default: Option<ExprId>,
    pub span: Span,
}

/// A parsed script.
#[derive(Clone, Debug, Default)]
pub struct Script {
    pub options: Vec<OptionDecl>,
    pub images: Vec<ImageDecl>,
    pub init: Vec<InitDecl>,
    pub body: Vec<Stmt>,
    pub arena: ExprArena,
    /// Number of `StmtId`s handed out; side tables indexed by `StmtId` use this size.
    pub stmt_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_lists() {
        let mut arena = ExprArena::new();
        let a = arena.alloc(ExprKind::Number(1.0), Span::new(0, 1));
        let b = arena.alloc(ExprKind::Number(2.0), Span::new(2, 3));
        let range = arena.alloc_list([a, b]);
        assert_eq!(arena.list(range), &[a, b]);
        assert_eq!(arena.list(ExprRange::EMPTY), &[] as &[ExprId]);
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.span(b), Span::new(2, 3));
    }

    #[test]
    fn test_compound_ops_map_to_binary() {
        assert_eq!(AssignOp::Assign.binary_op(), None);
        assert_eq!(AssignOp::Add.binary_op(), Some(BinaryOp::Add));
        assert_eq!(AssignOp::Mod.binary_op(), Some(BinaryOp::Mod));
        assert_eq!(BinaryOp::Pow.function_name(), "_pow");
    }
}
