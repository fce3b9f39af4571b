use thiserror::Error;

/// Failures while decoding the textual artifacts of the engine: patch text and deltas.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("invalid patch header `{0}`")]
    PatchHeader(String),
    #[error("invalid patch line `{0}`")]
    PatchLine(String),
    #[error("patch header declares {declared} source units but its body covers {actual}")]
    PatchLength { declared: usize, actual: usize },
    #[error("invalid delta token `{0}`")]
    DeltaToken(String),
    #[error("delta covers {consumed} source units but the source text has {expected}")]
    DeltaLength { consumed: usize, expected: usize },
    #[error("invalid percent escape in `{0}`")]
    Escape(String),
    #[error("decoded text is not valid utf-8")]
    Utf8,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("pattern of {len} units exceeds the matcher limit of {max}")]
    PatternTooLong { len: usize, max: usize },
    #[error("text is not valid utf-8")]
    Utf8Error,
}
