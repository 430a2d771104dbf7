use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Lex,
    Syntax,
    Scope,
    Type,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lex => "lex error",
            Self::Syntax => "syntax error",
            Self::Scope => "scope error",
            Self::Type => "type error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The first error found in a program. Compilation stops as soon as one is produced.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {kind}: {message}\n{source_line}")]
pub struct CompileError {
    pub kind: ErrorKind,

    /// 1-based line the error was found on.
    pub line: usize,
    pub message: String,

    /// The offending line of source, trimmed.
    pub source_line: String,
}

pub type CompileResult<T> = Result<T, CompileError>;
