use std::fmt;

/// Type of a script value.
///
/// Lists exist for loop iteration and function arguments; every image
/// sample and most variables are scalars.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ValueType {
    Scalar,
    List,
}

impl ValueType {
    /// Result type of a binary operation.
    ///
    /// Same-typed operands keep their type; a scalar mixed with a list
    /// broadcasts to a list.
    #[inline]
    #[must_use]
    pub fn combine(self, other: ValueType) -> ValueType {
        if self == other {
            self
        } else {
            ValueType::List
        }
    }

    #[inline]
    pub fn is_list(self) -> bool {
        matches!(self, ValueType::List)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Scalar => write!(f, "scalar"),
            ValueType::List => write!(f, "list"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_rules() {
        use ValueType::{List, Scalar};
        assert_eq!(Scalar.combine(Scalar), Scalar);
        assert_eq!(List.combine(List), List);
        assert_eq!(Scalar.combine(List), List);
        assert_eq!(List.combine(Scalar), List);
    }
}
