use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("HTTP request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV report error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Service '{service}' has no configured endpoint")]
    ServiceNotConfigured { service: String },

    #[error("No service selected; call switch_to() before dispatching")]
    NoServiceSelected,

    #[error("{method} {url} ({service}) expected {expected}, got {actual}: {body}")]
    UnexpectedStatus {
        service: String,
        method: String,
        url: String,
        expected: String,
        actual: u16,
        body: String,
    },

    #[error("Response from {url} is not valid JSON: {message}")]
    InvalidJson { url: String, message: String },

    #[error("Missing JSON field '{path}'")]
    MissingField { path: String },

    #[error("Assertion failed: {message}")]
    AssertionFailed { message: String },

    #[error("Timed out after {waited_ms}ms waiting for {what}")]
    PollTimeout { what: String, waited_ms: u128 },

    #[error("Fixture setup failed at '{stage}': {message}")]
    FixtureError { stage: String, message: String },

    #[error("Scenario '{scenario}' failed: {message}")]
    ScenarioError { scenario: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Contract,
    Fixture,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl E2eError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            E2eError::ConfigValidationError { .. }
            | E2eError::InvalidConfigValueError { .. }
            | E2eError::MissingConfigError { .. }
            | E2eError::ServiceNotConfigured { .. }
            | E2eError::NoServiceSelected
            | E2eError::UrlError(_) => ErrorCategory::Configuration,
            E2eError::ApiError(_) | E2eError::PollTimeout { .. } => ErrorCategory::Network,
            E2eError::UnexpectedStatus { .. }
            | E2eError::InvalidJson { .. }
            | E2eError::MissingField { .. }
            | E2eError::AssertionFailed { .. }
            | E2eError::ScenarioError { .. } => ErrorCategory::Contract,
            E2eError::FixtureError { .. } => ErrorCategory::Fixture,
            E2eError::IoError(_)
            | E2eError::SerializationError(_)
            | E2eError::CsvError(_)
            | E2eError::ZipError(_) => ErrorCategory::Output,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Contract | ErrorCategory::Fixture => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::Output => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Suite configuration problem: {}", self),
            ErrorCategory::Network => format!("A remote service could not be reached in time: {}", self),
            ErrorCategory::Contract => format!("A service response did not match expectations: {}", self),
            ErrorCategory::Fixture => format!("Test fixtures could not be created: {}", self),
            ErrorCategory::Output => format!("The run report could not be written: {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            E2eError::ServiceNotConfigured { .. } => "Add the service base URL under [services] in the suite config",
            E2eError::NoServiceSelected => "Select a service with switch_to() or use on(service)",
            E2eError::PollTimeout { .. } => "Raise [polling].timeout_seconds or check the indexing pipeline",
            E2eError::FixtureError { .. } => "Check the account service and the [auth] client credentials",
            _ => match self.category() {
                ErrorCategory::Configuration => "Fix the suite config and run again",
                ErrorCategory::Network => "Check that the target environment is up and reachable",
                ErrorCategory::Contract => "Inspect the response body in the debug log (-v)",
                ErrorCategory::Fixture => "Check the account service and the [auth] client credentials",
                ErrorCategory::Output => "Check that [report].output_path is writable",
            },
        }
    }

    /// 將錯誤包裝為 fixture 階段錯誤，保留原始訊息
    pub fn in_fixture(self, stage: &str) -> Self {
        match self {
            E2eError::FixtureError { .. } => self,
            other => E2eError::FixtureError {
                stage: stage.to_string(),
                message: other.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, E2eError>;
