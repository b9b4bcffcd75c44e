#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidVersion,
    EmptyCalls,
    UnknownOpcode,
    UnknownField,
    InvalidInputValue,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidVersion => "InvalidVersion",
            ErrorCode::EmptyCalls => "EmptyCalls",
            ErrorCode::UnknownOpcode => "UnknownOpcode",
            ErrorCode::UnknownField => "UnknownField",
            ErrorCode::InvalidInputValue => "InvalidInputValue",
        }
    }
}

/// A problem found while validating a call file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallError {
    pub code: ErrorCode,
    pub message: String,
    pub path: Option<String>,
}

impl CallError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl std::fmt::Display for CallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}: {} (path: {})", self.code.as_str(), self.message, path),
            None => write!(f, "{}: {}", self.code.as_str(), self.message),
        }
    }
}

impl std::error::Error for CallError {}

pub type ValidationResult = Result<(), Vec<CallError>>;

/// Raised by `try_evaluate` when the executor asks for an opcode the
/// registry does not know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalError {
    pub opcode: String,
}

impl EvalError {
    pub fn unknown_opcode(opcode: impl Into<String>) -> Self {
        Self {
            opcode: opcode.into(),
        }
    }
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown opcode: {}", self.opcode)
    }
}

impl std::error::Error for EvalError {}

/// Local validation failure of the `repeat` operator. Never leaves the
/// operator: it is logged and turned into an empty string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RepeatError {
    NegativeCount(f64),
    InfiniteCount,
    TooLong { units: usize },
}

impl std::fmt::Display for RepeatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepeatError::NegativeCount(n) => write!(f, "repeat count must not be negative, got {}", n),
            RepeatError::InfiniteCount => write!(f, "repeat count must be finite"),
            RepeatError::TooLong { units } => {
                write!(f, "repeated string would be {} units long", units)
            }
        }
    }
}

impl std::error::Error for RepeatError {}
