use std::fmt;

use crate::name::Name;

pub type PsResult<T> = anyhow::Result<T>;

/*
postscript spec page 523

dictfull No more room in dictionary
dictstackunderflow Too many end operators
invalidaccess Attempt to violate access attribute
invalidfileaccess Unacceptable access string
invalidfont Invalid Font resource name or font dictionary
ioerror Input/output error
limitcheck Implementation limit exceeded
nocurrentpoint Current point undefined
rangecheck Operand out of bounds
stackoverflow Operand stack overflow
stackunderflow Operand stack underflow
syntaxerror PostScript language syntax error
typecheck Operand of wrong type
undefined Name not known
undefinedresult Overflow, underflow, or meaningless result
unmatchedmark Expected mark not on stack
VMerror Virtual memory exhausted
*/

#[derive(Debug, Clone)]
pub enum PostScriptError {
    /// Operand stack underflow
    StackUnderflow,

    /// Operand stack overflow
    StackOverflow,

    /// Operand of wrong type
    TypeCheck,

    /// Operand out of bounds
    RangeCheck,

    /// Name not known
    Undefined { key: Name },

    /// Overflow, underflow, or meaningless result
    UndefinedResult,

    /// Attempt to violate access attribute
    InvalidAccess,

    /// Unacceptable access string
    InvalidFileAccess,

    /// Input/output error
    IoError,

    /// Implementation limit exceeded
    LimitCheck,

    /// Current point undefined
    NoCurrentPoint,

    /// Expected mark not on stack
    UnmatchedMark,

    /// Too many end operators
    DictStackUnderflow,

    /// No more room in dictionary
    DictFull,

    /// PostScript language syntax error
    SyntaxError,

    /// Virtual memory exhausted
    VmError,

    /// Invalid Font resource name or font dictionary
    InvalidFont,
}

impl PostScriptError {
    /// The classical error name, as consulted in `errordict` and recorded
    /// in `$error`
    pub fn name(&self) -> &'static [u8] {
        match self {
            Self::StackUnderflow => b"stackunderflow",
            Self::StackOverflow => b"stackoverflow",
            Self::TypeCheck => b"typecheck",
            Self::RangeCheck => b"rangecheck",
            Self::Undefined { .. } => b"undefined",
            Self::UndefinedResult => b"undefinedresult",
            Self::InvalidAccess => b"invalidaccess",
            Self::InvalidFileAccess => b"invalidfileaccess",
            Self::IoError => b"ioerror",
            Self::LimitCheck => b"limitcheck",
            Self::NoCurrentPoint => b"nocurrentpoint",
            Self::UnmatchedMark => b"unmatchedmark",
            Self::DictStackUnderflow => b"dictstackunderflow",
            Self::DictFull => b"dictfull",
            Self::SyntaxError => b"syntaxerror",
            Self::VmError => b"VMerror",
            Self::InvalidFont => b"invalidfont",
        }
    }
}

impl fmt::Display for PostScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined { key } => write!(f, "undefined: {:?}", key),
            _ => write!(f, "{}", String::from_utf8_lossy(self.name())),
        }
    }
}

impl std::error::Error for PostScriptError {}
