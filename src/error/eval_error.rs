/// Classifies an evaluation failure for exit-status reporting.
///
/// Most failures are plain `Evaluation` errors; `Reference` covers unbound
/// names on the read side, `Syntax` covers context-only tokens used outside
/// their context, and `Arithmetic` covers the few numeric guards that fail
/// instead of producing `NaN` or an infinity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A name was used but is unbound.
    Reference,
    /// A semantic failure: wrong arity, invalid assignment target, etc.
    Evaluation,
    /// A context-only token (`end`, `:`) used outside its context.
    Syntax,
    /// A numeric domain guard or invalid matrix index.
    Arithmetic,
}

#[derive(Debug)]
/// Represents all errors that can be raised during evaluation.
pub enum EvalError {
    /// Tried to read a name with no binding.
    UndefinedSymbol {
        /// The name that failed to resolve.
        name: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// Tried to read a structure field that does not exist.
    UndefinedField {
        /// The missing field name.
        name: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// Referenced a function-valued name without an argument list.
    CallWithoutArguments {
        /// The function name.
        name: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// A call supplied the wrong number of arguments.
    WrongArgumentCount {
        /// The function name.
        name:     String,
        /// The number of arguments the function takes.
        expected: usize,
        /// The number of arguments actually supplied.
        found:    usize,
        /// The source line where the error occurred.
        line:     usize,
    },
    /// A mapper function was invoked with more than one argument.
    MapperArguments {
        /// The function name.
        name: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// A multi-assignment requested more results than the producer yields.
    ReturnListElement {
        /// The 1-based element number that was requested.
        number: usize,
        /// The source line where the error occurred.
        line:   usize,
    },
    /// A compound assignment operator was used with multiple targets.
    ComputedMultipleAssignment {
        /// The source line where the error occurred.
        line: usize,
    },
    /// The left side of an assignment is not a valid target.
    InvalidAssignmentTarget {
        /// The source line where the error occurred.
        line: usize,
    },
    /// Field access or field assignment on a non-structure value.
    NotAStructure {
        /// The name of the offending binding.
        name: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// A dynamic field designator evaluated to something other than a string.
    FieldNameNotString {
        /// The source line where the error occurred.
        line: usize,
    },
    /// An indexing operation was structurally invalid.
    InvalidIndexing {
        /// Details about the failure.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// A subscript points outside the array.
    IndexOutOfBounds {
        /// The number of addressable elements.
        length: usize,
        /// The subscript that was requested.
        found:  usize,
        /// The source line where the error occurred.
        line:   usize,
    },
    /// Operand shapes do not agree.
    ShapeMismatch {
        /// Details about the mismatch.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// A value had an unexpected or incompatible type.
    TypeMismatch {
        /// Details about the mismatch.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// A context-only token was used outside its context.
    ContextToken {
        /// The token (`end` or `:`).
        token: &'static str,
        /// The source line where the error occurred.
        line:  usize,
    },
    /// `factorial` was applied outside the non-negative integers.
    FactorialDomain {
        /// The source line where the error occurred.
        line: usize,
    },
    /// An operation belongs to an external provider that is not registered.
    ExternalOperation {
        /// Description of the missing operation.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// An expression that had to produce a value produced none.
    MissingValue {
        /// The source line where the error occurred.
        line: usize,
    },
}

impl EvalError {
    /// Classifies this error into one of the four kinds.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UndefinedSymbol { .. } | Self::UndefinedField { .. } => ErrorKind::Reference,
            Self::ContextToken { .. } => ErrorKind::Syntax,
            Self::FactorialDomain { .. }
            | Self::IndexOutOfBounds { .. }
            | Self::InvalidIndexing { .. } => ErrorKind::Arithmetic,
            _ => ErrorKind::Evaluation,
        }
    }
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UndefinedSymbol { name, line } => {
                write!(f, "Error on line {line}: '{name}' undefined.")
            },
            Self::UndefinedField { name, line } => {
                write!(f, "Error on line {line}: Invalid use of undefined field '{name}'.")
            },
            Self::CallWithoutArguments { name, line } => {
                write!(f, "Error on line {line}: calling {name} without arguments list.")
            },
            Self::WrongArgumentCount { name,
                                       expected,
                                       found,
                                       line, } => write!(f,
                                                         "Error on line {line}: '{name}' called with {found} arguments, expected {expected}."),
            Self::MapperArguments { name, line } => write!(f,
                                                           "Error on line {line}: mapper function '{name}' takes a single argument."),
            Self::ReturnListElement { number, line } => {
                write!(f, "Error on line {line}: element number {number} undefined in return list.")
            },
            Self::ComputedMultipleAssignment { line } => {
                write!(f, "Error on line {line}: computed multiple assignment not allowed.")
            },
            Self::InvalidAssignmentTarget { line } => {
                write!(f, "Error on line {line}: Invalid left side of assignment.")
            },
            Self::NotAStructure { name, line } => {
                write!(f, "Error on line {line}: '{name}' is not a structure.")
            },
            Self::FieldNameNotString { line } => {
                write!(f, "Error on line {line}: Dynamic field name must be a string.")
            },
            Self::InvalidIndexing { details, line } => {
                write!(f, "Error on line {line}: Invalid indexing: {details}.")
            },
            Self::IndexOutOfBounds { length,
                                     found,
                                     line, } => write!(f,
                                                       "Error on line {line}: Index {found} out of bounds for an array of length {length}."),
            Self::ShapeMismatch { details, line } => {
                write!(f, "Error on line {line}: Shape mismatch: {details}.")
            },
            Self::TypeMismatch { details, line } => {
                write!(f, "Error on line {line}: Type error: {details}.")
            },
            Self::ContextToken { token, line } => {
                write!(f, "Error on line {line}: '{token}' used outside an indexing context.")
            },
            Self::FactorialDomain { line } => write!(f,
                                                     "Error on line {line}: factorial is only defined for non-negative integers."),
            Self::ExternalOperation { details, line } => {
                write!(f, "Error on line {line}: {details} requires an external provider.")
            },
            Self::MissingValue { line } => write!(f, "Error on line {line}: Value missing."),
        }
    }
}

impl std::error::Error for EvalError {}
