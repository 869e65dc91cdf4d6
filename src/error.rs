use thiserror::Error;

pub type PsoResult<T> = Result<T, PsoError>;

#[derive(Error, Debug)]
pub enum PsoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX export error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Invalid value for {field}: {value} (expected {expected})")]
    InvalidConfig {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("Unknown objective function: {0}")]
    UnknownObjective(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}

impl PsoError {
    pub(crate) fn invalid(
        field: &'static str,
        value: impl ToString,
        expected: &'static str,
    ) -> Self {
        PsoError::InvalidConfig {
            field,
            value: value.to_string(),
            expected,
        }
    }
}
