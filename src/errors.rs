use thiserror::Error; // Import the `Error` derive macro from the `thiserror` crate

/// Coarse classification of a failed preprocessing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Structure,
    Evaluation,
    Config,
    Io,
}

// Define an enum to represent possible preprocessing errors
#[derive(Debug, Error)] // Automatically implement `Debug` and `Error` traits for the enum
pub enum PreprocessError {
    // Directive nesting is unbalanced
    #[error("structure error{}: {message}", at_line(.line))]
    Structure { message: String, line: Option<usize> },

    // A directive condition could not be evaluated against the context
    #[error("evaluation error{}: {message} in `{expression}`; context: {context}", at_line(.line))]
    Evaluation {
        expression: String,
        message: String,
        context: String,
        line: Option<usize>,
    },

    // The defines document is not a flat object of scalars
    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PreprocessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PreprocessError::Structure { .. } => ErrorKind::Structure,
            PreprocessError::Evaluation { .. } => ErrorKind::Evaluation,
            PreprocessError::Config(_) => ErrorKind::Config,
            PreprocessError::Io(_) => ErrorKind::Io,
        }
    }

    /// 1-based source line the error was raised at, when known.
    pub fn line(&self) -> Option<usize> {
        match self {
            PreprocessError::Structure { line, .. } | PreprocessError::Evaluation { line, .. } => {
                *line
            }
            _ => None,
        }
    }
}

fn at_line(line: &Option<usize>) -> String {
    line.map(|l| format!(" at line {l}")).unwrap_or_default()
}

// Type alias for results that use `PreprocessError` as the error type
pub type Result<T> = std::result::Result<T, PreprocessError>;
