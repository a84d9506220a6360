//! rasc IR - shared front-end data structures.
//!
//! This crate contains the types every compiler phase agrees on:
//! - Spans for source locations
//! - Names for interned identifiers
//! - Tokens and `TokenList` for lexer output
//! - The parse tree (`Script`, statements, `ExprArena` of expressions)
//! - Value types and image roles
//!
//! # Design
//!
//! - **Intern identifiers**: strings become `Name(u32)` once, at lex time.
//! - **Flatten expressions**: no `Box<Expr>`, children are `ExprId` indices
//!   into an `ExprArena`. Later phases key their side tables by `ExprId`.
//! - Statements stay a small owned tree, each tagged with a `StmtId`.

pub mod ast;
mod image;
mod interner;
mod span;
mod stack;
mod token;
mod value_type;

pub use ast::{
    AssignOp, Axis, BinaryOp, Expr, ExprArena, ExprId, ExprKind, ExprRange, ImageDecl, IncDec,
    InitDecl, OptionDecl, OptionValue, PixelPos, Script, Stmt, StmtId, StmtKind, UnaryOp,
};
pub use image::{ImageParams, ImageParamsError, ImageRole};
pub use interner::{Name, StringInterner};
pub use span::Span;
pub use stack::ensure_sufficient_stack;
pub use token::{Token, TokenKind, TokenList};
pub use value_type::ValueType;
