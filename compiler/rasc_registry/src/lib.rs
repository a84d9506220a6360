//! Function, constant and option registries.
//!
//! A [`Registry`] maps script-level names to evaluation semantics. It is
//! built once, never mutated during compilation, and passed explicitly to
//! the compiler, so tests can substitute their own tables.

mod math;
mod ops;
mod options;
mod table;

use std::fmt;

use rasc_ir::ValueType;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

pub use ops::is_true;
pub use options::{OptionArg, OptionError, OptionKind, OptionSetting, OptionSpec, ScriptOptions};

/// Where a function's implementation lives.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Provider {
    /// Pure math library function.
    Math,
    /// Built-in runtime function (operators, random numbers).
    Runtime,
    /// Reads a field of the running evaluation.
    Proxy,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Math => write!(f, "math"),
            Provider::Runtime => write!(f, "runtime"),
            Provider::Proxy => write!(f, "proxy"),
        }
    }
}

/// Runtime value read by a proxy function.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum RuntimeField {
    /// Current world X position.
    X,
    /// Current world Y position.
    Y,
    Width,
    Height,
    XMin,
    YMin,
    XMax,
    YMax,
    /// Step size along X.
    XRes,
    /// Step size along Y.
    YRes,
}

/// Random number generators, drawn from the runtime's own RNG.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum RandomFn {
    /// Uniform in `[0, x)`.
    Uniform,
    /// Uniform integer in `[0, floor(x)]`.
    Int,
}

/// Concrete implementation of a registered function.
///
/// Scalar-shaped implementations are also used for list arguments when the
/// signature is broadcast: the function is applied element-wise.
#[derive(Copy, Clone)]
pub enum FunctionImpl {
    Nullary(fn() -> f64),
    Unary(fn(f64) -> f64),
    Binary(fn(f64, f64) -> f64),
    /// Reduces a whole list to a scalar.
    Reduce(fn(&[f64]) -> f64),
    Random(RandomFn),
    Proxy(RuntimeField),
}

impl fmt::Debug for FunctionImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionImpl::Nullary(_) => write!(f, "Nullary"),
            FunctionImpl::Unary(_) => write!(f, "Unary"),
            FunctionImpl::Binary(_) => write!(f, "Binary"),
            FunctionImpl::Reduce(_) => write!(f, "Reduce"),
            FunctionImpl::Random(r) => write!(f, "Random({r:?})"),
            FunctionImpl::Proxy(p) => write!(f, "Proxy({p:?})"),
        }
    }
}

/// One registered signature.
#[derive(Copy, Clone, Debug)]
pub struct FunctionInfo {
    pub name: &'static str,
    pub params: &'static [ValueType],
    pub ret: ValueType,
    pub provider: Provider,
    pub imp: FunctionImpl,
    /// Result may differ between calls with the same arguments.
    pub volatile: bool,
}

impl FunctionInfo {
    /// Whether a call with all-literal arguments may be evaluated at
    /// compile time.
    pub fn is_foldable(&self) -> bool {
        !self.volatile && self.provider != Provider::Proxy
    }

    /// `name(scalar, list) -> list`
    pub fn signature(&self) -> String {
        let params: Vec<String> = self.params.iter().map(ToString::to_string).collect();
        format!("{}({}) -> {}", self.name, params.join(", "), self.ret)
    }
}

/// Signatures are identified by name and parameter types; the
/// implementation pointer is not compared.
impl PartialEq for FunctionInfo {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.params == other.params && self.ret == other.ret
    }
}

/// Failed function lookup.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("undefined function `{name}`")]
    UndefinedFunction { name: String },
    #[error("no signature of `{name}` accepts ({args})")]
    NoMatchingSignature {
        name: String,
        args: String,
        candidates: Vec<String>,
    },
}

/// Function, constant and option tables.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    functions: FxHashMap<&'static str, SmallVec<[FunctionInfo; 4]>>,
    constants: FxHashMap<&'static str, f64>,
    options: FxHashMap<&'static str, OptionSpec>,
}

impl Registry {
    /// A registry with nothing in it.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The standard function, constant and option tables.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        table::register_standard(&mut registry);
        registry
    }

    pub fn register(&mut self, info: FunctionInfo) {
        self.functions.entry(info.name).or_default().push(info);
    }

    pub fn register_constant(&mut self, name: &'static str, value: f64) {
        self.constants.insert(name, value);
    }

    pub fn register_option(&mut self, spec: OptionSpec) {
        self.options.insert(spec.name, spec);
    }

    /// Find the signature of `name` that takes exactly `args`.
    pub fn lookup(&self, name: &str, args: &[ValueType]) -> Result<&FunctionInfo, LookupError> {
        let Some(overloads) = self.functions.get(name) else {
            return Err(LookupError::UndefinedFunction {
                name: name.to_string(),
            });
        };
        overloads
            .iter()
            .find(|info| info.params == args)
            .ok_or_else(|| LookupError::NoMatchingSignature {
                name: name.to_string(),
                args: args
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
                candidates: overloads.iter().map(FunctionInfo::signature).collect(),
            })
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn constant(&self, name: &str) -> Option<f64> {
        self.constants.get(name).copied()
    }

    pub fn is_constant(&self, name: &str) -> bool {
        self.constants.contains_key(name)
    }

    pub fn option(&self, name: &str) -> Option<&OptionSpec> {
        self.options.get(name)
    }

    /// Validate an option directive and convert its value.
    ///
    /// Both failure cases are warnings for the caller; the script still
    /// compiles without the option.
    pub fn apply_option(&self, name: &str, arg: OptionArg<'_>) -> Result<OptionSetting, OptionError> {
        let spec = self.option(name).ok_or_else(|| OptionError::UnknownOption {
            name: name.to_string(),
        })?;
        spec.accept(arg, |c| self.constant(c))
    }

    /// Registered function names, sorted.
    pub fn function_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.functions.keys().copied().collect();
        names.sort_unstable();
        names
    }
}
