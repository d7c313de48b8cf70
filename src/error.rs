use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Backend returned {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("Unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Not authenticated")]
    Unauthenticated,
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthenticated)
            || matches!(self, ApiError::Status { status: 401, .. })
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("Invalid appointment date: {0:?}")]
    Date(String),

    #[error("Invalid appointment time: {0:?}")]
    Time(String),

    #[error("Appointment time does not exist in the local time zone: {0}")]
    NonexistentLocalTime(String),
}

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("CPF must have 11 digits")]
    InvalidCpf,

    #[error("Birth date must be a valid DD/MM/YYYY date")]
    InvalidBirthDate,

    #[error("Unknown document template: {0}")]
    UnknownTemplate(String),

    #[error("Invalid file name: {0:?}")]
    InvalidFileName(String),
}

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Invalid PDF payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Failed to write document: {0}")]
    Io(#[from] std::io::Error),
}
