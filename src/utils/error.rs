use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to parse product card: {reason}")]
    CardParse { reason: String },

    #[error("Dataset is missing required columns: {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    #[error("Dataset has columns not present in the table schema: {}", columns.join(", "))]
    UnexpectedColumns { columns: Vec<String> },

    #[error("Dataset '{source_name}' contains no rows")]
    EmptyDataset { source_name: String },

    #[error("Price '{value}' in row {row} is not numeric after cleanup")]
    NonNumericPrice { row: usize, value: String },

    #[error("Price '{value}' in row {row} is too large to convert")]
    PriceOverflow { row: usize, value: String },

    #[error("Sink '{sink}' failed: {message}")]
    SinkError { sink: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn config(message: impl Into<String>) -> Self {
        EtlError::ConfigError {
            message: message.into(),
        }
    }

    /// How bad the failure is for the run; the binary maps this to an exit code.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::CardParse { .. } => ErrorSeverity::Low,
            EtlError::HttpError(_) | EtlError::SinkError { .. } => ErrorSeverity::Medium,
            EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::MissingColumns { .. }
            | EtlError::UnexpectedColumns { .. }
            | EtlError::EmptyDataset { .. }
            | EtlError::NonNumericPrice { .. }
            | EtlError::PriceOverflow { .. }
            | EtlError::ConfigError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorSeverity::High,
            EtlError::IoError(_) | EtlError::DatabaseError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::HttpError(_) => "Check network connectivity and that the catalog URL is reachable",
            EtlError::CsvError(_) => "Make sure the dataset file is a well-formed CSV with a header row",
            EtlError::IoError(_) => "Check that the output path exists and is writable",
            EtlError::SerializationError(_) => "Inspect the dataset for values that cannot be serialized",
            EtlError::DatabaseError(_) => "Verify the database URL, credentials and that PostgreSQL is running",
            EtlError::ConfigError { .. } | EtlError::InvalidConfigValueError { .. } => "Fix the configuration file or command line flags",
            EtlError::CardParse { .. } => "The card markup changed; review the selector configuration",
            EtlError::MissingColumns { .. } | EtlError::UnexpectedColumns { .. } => {
                "Re-run the previous stage so the dataset has the expected columns"
            }
            EtlError::EmptyDataset { .. } => "Re-run the extract stage; it produced no rows",
            EtlError::NonNumericPrice { .. } | EtlError::PriceOverflow { .. } => {
                "Check the price markup or the currency settings in [transform]"
            }
            EtlError::SinkError { .. } => "Check the sink credentials and endpoint",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::MissingColumns { columns } => {
                format!("The dataset is missing these columns: {}", columns.join(", "))
            }
            EtlError::EmptyDataset { source_name } => {
                format!("Nothing to process: '{}' has no rows", source_name)
            }
            EtlError::NonNumericPrice { row, value } => {
                format!("Row {} has a price that is not a number: '{}'", row, value)
            }
            EtlError::PriceOverflow { row, value } => {
                format!("Row {} has a price too large to convert: '{}'", row, value)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
