//! The `ParseFailure` tree described in SPEC_FULL.md §B / spec.md §7.

use std::fmt;

/// Where in the source tree a failure occurred.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Location {
    pub source_name: String,
    pub line_no: usize,
    pub col_no: usize,
}

impl Location {
    pub fn new(source_name: impl Into<String>, line_no: usize, col_no: usize) -> Self {
        Self { source_name: source_name.into(), line_no, col_no }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source_name, self.line_no, self.col_no)
    }
}

/// Why a type name failed to resolve. Shared between the Type Resolver and
/// every declaration parser that asks it to resolve a type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeErrorKind {
    #[error("type `{name}` does not resolve in namespace `{namespace}`")]
    Unresolved { name: String, namespace: String },

    #[error("type `{0}` has a platform-dependent width; use a fixed-width integer instead")]
    PlatformDependentInt(String),

    #[error("collection `{0}` is not currently supported")]
    UnimplementedCollection(String),
}

/// Why a field declarator was rejected, spec.md §4.4.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldErrorKind {
    #[error("field declaration could not be parsed: {0}")]
    InvalidDeclaration(String),

    #[error("complex declarations must be on their own line: {0}")]
    ComplexDeclaration(String),

    #[error("field type is invalid: {0}")]
    InvalidType(TypeErrorKind),
}

/// Why a parameter declarator was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MethodErrorKind {
    #[error("non-virtual, non-override methods cannot be part of an interface")]
    NonExtendable,

    #[error("method is declared `final`, which cannot be extended by generated bindings")]
    FinalMethod,

    #[error("parameter declaration could not be parsed: {0}")]
    InvalidParamDeclaration(String),

    #[error("parameter type is invalid: {0}")]
    InvalidParamType(TypeErrorKind),

    #[error("return type is invalid: {0}")]
    InvalidReturnType(TypeErrorKind),

    #[error("parameter uses an unsupported pointer, non-const reference, or array form: {0}")]
    ReferenceParam(String),

    #[error("return type is `auto` but no trailing return type (`-> T`) was given")]
    MissingTailReturn,

    #[error("unbalanced angle brackets in parameter list")]
    UnbalancedAngleBrackets,
}

/// The full error tree. Every variant carries the `Location` of the offending
/// line so callers can report it without re-deriving it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseFailure {
    #[error("{location}: mismatched bracket: expected {expected:?}, found '{found}'")]
    MismatchedBracket { location: Location, expected: Option<char>, found: char },

    #[error("{location}: invalid @IPC annotation: {message}")]
    InvalidAnnotation { location: Location, message: String },

    #[error("{location}: invalid field declaration: {kind}")]
    InvalidFieldDeclaration { location: Location, kind: FieldErrorKind },

    #[error("{location}: {kind}")]
    InvalidMethodDeclaration { location: Location, kind: MethodErrorKind },

    #[error("{location}: {kind}")]
    InvalidType { location: Location, kind: TypeErrorKind },

    #[error("{location}: duplicate name `{name}`")]
    DuplicateName { location: Location, name: String },

    #[error("include `{include}` referenced from `{from}` could not be resolved")]
    IncludeResolution { include: String, from: String },

    #[error("circular or unresolvable include order among: {}", .remaining.join(", "))]
    CircularInclude { remaining: Vec<String> },

    #[error("{location}: {message}")]
    ParsingError { location: Location, message: String },
}

impl ParseFailure {
    pub fn location(&self) -> Option<&Location> {
        match self {
            ParseFailure::MismatchedBracket { location, .. }
            | ParseFailure::InvalidAnnotation { location, .. }
            | ParseFailure::InvalidFieldDeclaration { location, .. }
            | ParseFailure::InvalidMethodDeclaration { location, .. }
            | ParseFailure::InvalidType { location, .. }
            | ParseFailure::DuplicateName { location, .. }
            | ParseFailure::ParsingError { location, .. } => Some(location),
            ParseFailure::IncludeResolution { .. } | ParseFailure::CircularInclude { .. } => None,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseFailure>;
