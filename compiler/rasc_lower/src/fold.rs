//! Compile-time evaluation of pure calls with literal arguments.

use rasc_registry::{FunctionImpl, FunctionInfo};

use crate::ir::{Expr, ExprKind};

/// Value of `func(args)` if it can be computed now.
///
/// Volatile and proxy functions are never folded. Reductions fold only
/// over a list literal of literals.
pub(crate) fn try_fold(func: &FunctionInfo, args: &[Expr]) -> Option<f64> {
    if !func.is_foldable() {
        return None;
    }
    match (func.imp, args) {
        (FunctionImpl::Nullary(f), []) => Some(f()),
        (FunctionImpl::Unary(f), [a]) => Some(f(a.as_literal()?)),
        (FunctionImpl::Binary(f), [a, b]) => Some(f(a.as_literal()?, b.as_literal()?)),
        (FunctionImpl::Reduce(f), [list]) => {
            let ExprKind::List(items) = &list.kind else {
                return None;
            };
            let values: Option<Vec<f64>> = items.iter().map(Expr::as_literal).collect();
            Some(f(&values?))
        }
        _ => None,
    }
}
