use reqwest::StatusCode;

/// Failure of the HTTP layer itself (connection, timeout, cookie jar).
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Cookie jar error: {0}")]
    Cookies(String),
}

/// Fatal login failures. Any of these aborts the run before batch processing.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("ZwiftPower login redirect not found.")]
    RedirectMissing,
    #[error("Zwift login form not found.")]
    FormNotFound,
    #[error("Zwift login failed with status {0}. Check credentials or login flow.")]
    SubmissionFailed(StatusCode),
    #[error("Could not verify login (status {0}), ZwiftPower flow may have changed.")]
    VerificationFailed(StatusCode),
    #[error("Transport failure during login: {0}")]
    Transport(#[from] TransportError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing Zwift credentials: {0} is not set (environment or .env file).")]
    MissingCredential(&'static str),
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Input file {0:?} does not exist.")]
    NotFound(std::path::PathBuf),
    #[error("Input is missing the '{0}' column.")]
    MissingColumn(String),
    #[error("Input file is empty.")]
    Empty,
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Excel error: {0}")]
    Excel(#[from] calamine::XlsxError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("Result count {records} does not match input row count {rows}.")]
    RowCountMismatch { rows: usize, records: usize },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
