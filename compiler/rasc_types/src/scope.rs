//! Scope arena and symbols.
//!
//! Scopes are records in a flat arena, each pointing at its parent by
//! index. The global scope is always [`ScopeId::GLOBAL`] and holds image
//! variables and image-scope (`init`) variables; everything the pixel body
//! declares lives in descendants of it.

use std::fmt;

use rasc_ir::{Name, Span, ValueType};
use rustc_hash::FxHashMap;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ScopeId(u32);

impl ScopeId {
    pub const GLOBAL: ScopeId = ScopeId(0);

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct SymbolId(u32);

impl SymbolId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum SymbolKind {
    SourceImage,
    DestImage,
    Scalar,
    List,
    LoopVariable,
    /// Declared but not yet assigned; replaced once by the checker.
    Unknown,
}

impl SymbolKind {
    pub fn is_image(self) -> bool {
        matches!(self, SymbolKind::SourceImage | SymbolKind::DestImage)
    }

    /// Type of a read of this symbol.
    pub fn value_type(self) -> ValueType {
        match self {
            SymbolKind::List => ValueType::List,
            _ => ValueType::Scalar,
        }
    }
}

impl From<ValueType> for SymbolKind {
    fn from(ty: ValueType) -> Self {
        match ty {
            ValueType::Scalar => SymbolKind::Scalar,
            ValueType::List => SymbolKind::List,
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolKind::SourceImage => write!(f, "source image"),
            SymbolKind::DestImage => write!(f, "destination image"),
            SymbolKind::Scalar => write!(f, "scalar"),
            SymbolKind::List => write!(f, "list"),
            SymbolKind::LoopVariable => write!(f, "loop variable"),
            SymbolKind::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Symbol {
    pub name: Name,
    pub kind: SymbolKind,
    /// Scope the symbol was declared in.
    pub scope: ScopeId,
    /// Declaration site; `Span::DUMMY` for caller-supplied images.
    pub span: Span,
    /// Read or written anywhere in the script.
    pub used: bool,
}

impl Symbol {
    /// A non-image variable of the global scope.
    pub fn is_image_scope(&self) -> bool {
        self.scope == ScopeId::GLOBAL && !self.kind.is_image()
    }
}

#[derive(Clone, Debug, Default)]
struct ScopeData {
    parent: Option<ScopeId>,
    bindings: FxHashMap<Name, SymbolId>,
}

/// All scopes and symbols of one compilation.
#[derive(Clone, Debug)]
pub struct SymbolTable {
    scopes: Vec<ScopeData>,
    symbols: Vec<Symbol>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// A table holding only the empty global scope.
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![ScopeData::default()],
            symbols: Vec::new(),
        }
    }

    pub fn push_scope(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(to_u32(self.scopes.len()));
        self.scopes.push(ScopeData {
            parent: Some(parent),
            bindings: FxHashMap::default(),
        });
        id
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope.index()].parent
    }

    /// Bind `name` in `scope`, shadowing any outer binding.
    pub fn declare(&mut self, scope: ScopeId, name: Name, kind: SymbolKind, span: Span) -> SymbolId {
        let id = SymbolId(to_u32(self.symbols.len()));
        self.symbols.push(Symbol {
            name,
            kind,
            scope,
            span,
            used: false,
        });
        self.scopes[scope.index()].bindings.insert(name, id);
        id
    }

    /// Look `name` up in `scope` and then each enclosing scope.
    pub fn lookup(&self, scope: ScopeId, name: Name) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(s) = current {
            let data = &self.scopes[s.index()];
            if let Some(&id) = data.bindings.get(&name) {
                return Some(id);
            }
            current = data.parent;
        }
        None
    }

    pub fn lookup_local(&self, scope: ScopeId, name: Name) -> Option<SymbolId> {
        self.scopes[scope.index()].bindings.get(&name).copied()
    }

    #[inline]
    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    pub fn mark_used(&mut self, id: SymbolId) {
        self.symbols[id.index()].used = true;
    }

    /// Replace an `Unknown` kind. Concrete kinds never change; the
    /// existing kind is returned as the error.
    pub fn finalize(&mut self, id: SymbolId, kind: SymbolKind) -> Result<(), SymbolKind> {
        let symbol = &mut self.symbols[id.index()];
        if symbol.kind == SymbolKind::Unknown {
            symbol.kind = kind;
            Ok(())
        } else {
            Err(symbol.kind)
        }
    }

    /// Give every still-unknown symbol the kind `kind`.
    pub fn finalize_remaining(&mut self, kind: SymbolKind) {
        for symbol in &mut self.symbols {
            if symbol.kind == SymbolKind::Unknown {
                symbol.kind = kind;
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (SymbolId(to_u32(i)), s))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }
}

fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rasc_ir::StringInterner;

    #[test]
    fn test_inner_scope_shadows_outer() {
        let mut interner = StringInterner::new();
        let a = interner.intern("a");
        let mut table = SymbolTable::new();
        let outer = table.declare(ScopeId::GLOBAL, a, SymbolKind::Scalar, Span::DUMMY);
        let child = table.push_scope(ScopeId::GLOBAL);
        assert_eq!(table.lookup(child, a), Some(outer));
        assert_eq!(table.lookup_local(child, a), None);

        let inner = table.declare(child, a, SymbolKind::List, Span::DUMMY);
        assert_eq!(table.lookup(child, a), Some(inner));
        assert_eq!(table.lookup(ScopeId::GLOBAL, a), Some(outer));
        assert_eq!(table.parent(child), Some(ScopeId::GLOBAL));
    }

    #[test]
    fn test_unknown_is_finalized_once() {
        let mut interner = StringInterner::new();
        let v = interner.intern("v");
        let mut table = SymbolTable::new();
        let id = table.declare(ScopeId::GLOBAL, v, SymbolKind::Unknown, Span::DUMMY);
        assert_eq!(table.finalize(id, SymbolKind::List), Ok(()));
        assert_eq!(table.finalize(id, SymbolKind::Scalar), Err(SymbolKind::List));
        assert_eq!(table.symbol(id).kind, SymbolKind::List);
        assert!(table.symbol(id).is_image_scope());
    }
}
