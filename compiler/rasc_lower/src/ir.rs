//! Evaluable IR.
//!
//! A small owned tree. Names are gone: locals are slots, image-scope
//! variables and images are indices into the [`CompiledScript`] tables,
//! and every operator is a call to a registry function.
//!
//! [`CompiledScript`]: crate::CompiledScript

use rasc_ir::ValueType;
use rasc_registry::FunctionInfo;

/// Local (pixel-scope) variable slot.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Slot(pub u32);

impl Slot {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index into [`CompiledScript::image_vars`](crate::CompiledScript::image_vars).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ImageVarId(pub u32);

impl ImageVarId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index into [`CompiledScript::image_params`](crate::CompiledScript::image_params).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ImageIndex(pub u32);

impl ImageIndex {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: ValueType,
}

impl Expr {
    pub fn scalar(kind: ExprKind) -> Self {
        Expr {
            kind,
            ty: ValueType::Scalar,
        }
    }

    pub fn literal(value: f64) -> Self {
        Self::scalar(ExprKind::Literal(value))
    }

    pub fn as_literal(&self) -> Option<f64> {
        match self.kind {
            ExprKind::Literal(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Literal(f64),
    List(Vec<Expr>),
    /// Inclusive integer-stepped range `start:end`.
    Range(Box<Expr>, Box<Expr>),
    Local(Slot),
    ImageVar(ImageVarId),
    ImageRead(ImageRead),
    Call(Call),
    Con(Con),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Call {
    pub func: FunctionInfo,
    pub args: Vec<Expr>,
}

/// `con(cond, branches...)`.
///
/// The sign of `cond` is pushed once; branches are chosen from the peeked
/// sign and the entry is popped when the node is done.
#[derive(Clone, Debug, PartialEq)]
pub struct Con {
    pub cond: Box<Expr>,
    /// Zero to three branch expressions.
    pub branches: Vec<Expr>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImageRead {
    pub image: ImageIndex,
    /// Defaults to the current pixel.
    pub pos: Option<ReadPos>,
    /// Defaults to band 0.
    pub band: Option<Box<Expr>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReadPos {
    pub x: Box<Expr>,
    pub y: Box<Expr>,
    /// Absolute world coordinate rather than an offset from the current
    /// position, per axis.
    pub x_absolute: bool,
    pub y_absolute: bool,
}

/// Assignable storage.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Target {
    Local(Slot),
    ImageVar(ImageVarId),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Assign { target: Target, value: Expr },
    /// Direct model: store into a destination image at the current pixel.
    WriteDest { image: ImageIndex, value: Expr },
    /// Indirect model: hand the pixel value to the caller and stop.
    Return(Expr),
    Eval(Expr),
    If {
        cond: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Vec<Stmt>,
    },
    While { cond: Expr, body: Vec<Stmt> },
    Until { cond: Expr, body: Vec<Stmt> },
    ForEach {
        var: Slot,
        source: Expr,
        body: Vec<Stmt>,
    },
    Break,
    BreakIf(Expr),
}

/// Image-scope variable of a compiled script.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageVarDecl {
    pub name: String,
    pub default: Option<Expr>,
}
