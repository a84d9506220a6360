//! Error codes for all compiler diagnostics.
//!
//! The first digit names the phase that reports the code, which keeps the
//! codes searchable and stable across message rewording.

use std::fmt;

/// Error codes for all compiler diagnostics.
///
/// - E0xxx: lexer
/// - E1xxx: parser
/// - E2xxx: symbol resolution
/// - E3xxx: type checking
/// - E4xxx: lowering
/// - W5xxx: warnings
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Lexer Errors (E0xxx)
    /// Invalid character in source
    E0001,
    /// Invalid number literal
    E0002,
    /// Unterminated block comment
    E0003,

    // Parser Errors (E1xxx)
    /// Unexpected token
    E1001,
    /// Expected expression
    E1002,
    /// Unclosed delimiter
    E1003,
    /// Expected identifier
    E1004,
    /// Header block after body statements
    E1005,
    /// Malformed image position specifier
    E1006,

    // Resolution Errors (E2xxx)
    /// Undefined variable
    E2001,
    /// Duplicate declaration
    E2002,
    /// Image variable redeclared as a scalar
    E2003,
    /// Write to a source image
    E2004,
    /// Invalid assignment operator with destination image
    E2005,
    /// Read from a destination image
    E2006,
    /// Assignment to a constant
    E2007,
    /// Assignment to a loop variable
    E2008,
    /// Undefined function
    E2009,
    /// Indexed access to something that is not a source image
    E2010,
    /// Conflicting image role declaration
    E2011,
    /// `break` outside of a loop
    E2012,

    // Type Errors (E3xxx)
    /// Assignment changes a variable's kind
    E3001,
    /// List where a scalar is required
    E3002,
    /// No function signature matches the argument types
    E3003,
    /// Wrong number of `con` arguments
    E3004,

    // Lowering Errors (E4xxx)
    /// More than one destination image under the indirect model
    E4001,

    // Warnings (W5xxx)
    /// Declared image is never used
    W5001,
    /// Unknown option name
    W5002,
    /// Invalid option value
    W5003,
    /// `images` block ignored because the caller supplied image parameters
    W5004,
}

impl ErrorCode {
    /// All codes, in declaration order.
    pub const ALL: &'static [ErrorCode] = &[
        ErrorCode::E0001,
        ErrorCode::E0002,
        ErrorCode::E0003,
        ErrorCode::E1001,
        ErrorCode::E1002,
        ErrorCode::E1003,
        ErrorCode::E1004,
        ErrorCode::E1005,
        ErrorCode::E1006,
        ErrorCode::E2001,
        ErrorCode::E2002,
        ErrorCode::E2003,
        ErrorCode::E2004,
        ErrorCode::E2005,
        ErrorCode::E2006,
        ErrorCode::E2007,
        ErrorCode::E2008,
        ErrorCode::E2009,
        ErrorCode::E2010,
        ErrorCode::E2011,
        ErrorCode::E2012,
        ErrorCode::E3001,
        ErrorCode::E3002,
        ErrorCode::E3003,
        ErrorCode::E3004,
        ErrorCode::E4001,
        ErrorCode::W5001,
        ErrorCode::W5002,
        ErrorCode::W5003,
        ErrorCode::W5004,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E0001 => "E0001",
            ErrorCode::E0002 => "E0002",
            ErrorCode::E0003 => "E0003",
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E1003 => "E1003",
            ErrorCode::E1004 => "E1004",
            ErrorCode::E1005 => "E1005",
            ErrorCode::E1006 => "E1006",
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2002 => "E2002",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E2004 => "E2004",
            ErrorCode::E2005 => "E2005",
            ErrorCode::E2006 => "E2006",
            ErrorCode::E2007 => "E2007",
            ErrorCode::E2008 => "E2008",
            ErrorCode::E2009 => "E2009",
            ErrorCode::E2010 => "E2010",
            ErrorCode::E2011 => "E2011",
            ErrorCode::E2012 => "E2012",
            ErrorCode::E3001 => "E3001",
            ErrorCode::E3002 => "E3002",
            ErrorCode::E3003 => "E3003",
            ErrorCode::E3004 => "E3004",
            ErrorCode::E4001 => "E4001",
            ErrorCode::W5001 => "W5001",
            ErrorCode::W5002 => "W5002",
            ErrorCode::W5003 => "W5003",
            ErrorCode::W5004 => "W5004",
        }
    }

    /// One-line description, for `--explain`-style listings.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E0001 => "invalid character in source",
            ErrorCode::E0002 => "invalid number literal",
            ErrorCode::E0003 => "unterminated block comment",
            ErrorCode::E1001 => "unexpected token",
            ErrorCode::E1002 => "expected expression",
            ErrorCode::E1003 => "unclosed delimiter",
            ErrorCode::E1004 => "expected identifier",
            ErrorCode::E1005 => "header block after statements",
            ErrorCode::E1006 => "malformed image position",
            ErrorCode::E2001 => "undefined variable",
            ErrorCode::E2002 => "duplicate declaration",
            ErrorCode::E2003 => "image variable redeclared",
            ErrorCode::E2004 => "write to source image",
            ErrorCode::E2005 => "invalid assignment operator with destination image",
            ErrorCode::E2006 => "read from destination image",
            ErrorCode::E2007 => "assignment to constant",
            ErrorCode::E2008 => "assignment to loop variable",
            ErrorCode::E2009 => "undefined function",
            ErrorCode::E2010 => "indexed access to non-image",
            ErrorCode::E2011 => "conflicting image role",
            ErrorCode::E2012 => "break outside of loop",
            ErrorCode::E3001 => "variable kind mismatch",
            ErrorCode::E3002 => "list used where scalar is required",
            ErrorCode::E3003 => "no matching function signature",
            ErrorCode::E3004 => "wrong number of con arguments",
            ErrorCode::E4001 => "too many destination images",
            ErrorCode::W5001 => "unused image",
            ErrorCode::W5002 => "unknown option",
            ErrorCode::W5003 => "invalid option value",
            ErrorCode::W5004 => "images block ignored",
        }
    }

    pub fn is_lexer_error(&self) -> bool {
        self.as_str().starts_with("E0")
    }

    pub fn is_parser_error(&self) -> bool {
        self.as_str().starts_with("E1")
    }

    /// Lexer and parser codes; these stop compilation before resolution.
    pub fn is_syntax_error(&self) -> bool {
        self.is_lexer_error() || self.is_parser_error()
    }

    pub fn is_warning(&self) -> bool {
        self.as_str().starts_with('W')
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a code string like `"E2005"`, case-insensitively.
impl std::str::FromStr for ErrorCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        Self::ALL
            .iter()
            .find(|code| code.as_str() == upper)
            .copied()
            .ok_or(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_codes_round_trip_through_str() {
        for code in ErrorCode::ALL {
            assert_eq!(code.as_str().parse::<ErrorCode>(), Ok(*code));
        }
        assert_eq!("e2005".parse::<ErrorCode>(), Ok(ErrorCode::E2005));
        assert!("E9999".parse::<ErrorCode>().is_err());
    }

    #[test]
    fn test_phase_classification() {
        assert!(ErrorCode::E0001.is_syntax_error());
        assert!(ErrorCode::E1003.is_syntax_error());
        assert!(!ErrorCode::E2001.is_syntax_error());
        assert!(ErrorCode::W5002.is_warning());
        assert!(!ErrorCode::E4001.is_warning());
    }
}
