/// Broad failure categories. Each one maps to a process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid CLI or configuration values.
    Usage,
    /// An expected column is missing or matched by more than one header.
    SchemaResolution,
    /// A retained record carries a date that is not `DD/MM/YYYY`.
    DateParse,
    /// The input file or URL could not be read.
    SourceUnavailable,
    /// The GeoJSON reference data could not be read or understood.
    Geo,
    /// Writing an export file failed.
    Export,
    /// Terminal setup, drawing or event polling failed.
    Terminal,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Usage => 2,
            ErrorKind::SchemaResolution | ErrorKind::DateParse => 3,
            ErrorKind::SourceUnavailable => 4,
            ErrorKind::Geo => 5,
            ErrorKind::Export => 6,
            ErrorKind::Terminal => 7,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SchemaResolution, message)
    }

    pub fn date_parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DateParse, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SourceUnavailable, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
