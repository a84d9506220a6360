//! Stack growth for the recursive passes.
//!
//! Resolution, type checking, lowering and evaluation all recurse over the
//! expression tree. Deeply nested scripts (long operator chains, nested
//! `con` calls) would otherwise overflow the default thread stack.

/// Keep at least this much stack available before recursing.
const RED_ZONE: usize = 64 * 1024;

/// Size of each new stack segment.
const GROWTH: usize = 1024 * 1024;

/// Run `f`, growing the stack first if less than the red zone remains.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, GROWTH, f)
}

/// WASM manages its own stack.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_recursion_survives() {
        fn depth(n: u64) -> u64 {
            ensure_sufficient_stack(|| if n == 0 { 0 } else { depth(n - 1) + 1 })
        }
        assert_eq!(depth(50_000), 50_000);
    }
}
