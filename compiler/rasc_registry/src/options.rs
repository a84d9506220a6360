//! Script option directives.

/// The value written on the right of an option directive.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum OptionArg<'a> {
    Number(f64),
    Null,
    Bool(bool),
    /// A bare name, usually a constant.
    Name(&'a str),
}

/// What an option turns on.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum OptionSetting {
    /// Value returned for source reads outside the image bounds.
    Outside(f64),
}

/// Behavior an option controls.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OptionKind {
    /// `outside = <number | null | constant>;`
    Outside,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OptionSpec {
    pub name: &'static str,
    pub kind: OptionKind,
}

impl OptionSpec {
    /// Human-readable description of the accepted values.
    pub fn expected(&self) -> &'static str {
        match self.kind {
            OptionKind::Outside => "a number, `null` or a constant",
        }
    }

    pub(crate) fn accept(
        &self,
        arg: OptionArg<'_>,
        constant: impl Fn(&str) -> Option<f64>,
    ) -> Result<OptionSetting, OptionError> {
        let invalid = || OptionError::InvalidValue {
            name: self.name.to_string(),
            expected: self.expected(),
        };
        match self.kind {
            OptionKind::Outside => {
                let value = match arg {
                    OptionArg::Number(n) => n,
                    OptionArg::Null => f64::NAN,
                    OptionArg::Name(name) => constant(name).ok_or_else(invalid)?,
                    OptionArg::Bool(_) => return Err(invalid()),
                };
                Ok(OptionSetting::Outside(value))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum OptionError {
    #[error("unknown option `{name}`")]
    UnknownOption { name: String },
    #[error("invalid value for option `{name}`: expected {expected}")]
    InvalidValue { name: String, expected: &'static str },
}

/// Options in effect for one compiled script.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ScriptOptions {
    /// Sentinel for out-of-bounds source reads; `None` makes them faults.
    pub outside: Option<f64>,
}

impl ScriptOptions {
    pub fn apply(&mut self, setting: OptionSetting) {
        match setting {
            OptionSetting::Outside(value) => self.outside = Some(value),
        }
    }
}
