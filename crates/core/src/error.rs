/// Broad classification of a [`ClinicError`], used by front ends to choose a response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    Unauthorized,
    NotFound,
    Upstream,
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("not authenticated with the EMR")]
    Unauthorized,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("EMR request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("EMR returned {status} for {url}: {message}")]
    Status {
        status: u16,
        url: String,
        message: String,
    },
    #[error("OpenMRS error: {0}")]
    OpenMrs(#[from] openmrs::OpenMrsError),
    #[error("FHIR error: {0}")]
    Fhir(#[from] fhir::FhirError),
    #[error("invalid header value: {0}")]
    InvalidHeader(String),
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV output is not valid UTF-8: {0}")]
    CsvEncoding(#[from] std::string::FromUtf8Error),
}

impl ClinicError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClinicError::InvalidInput(_) => ErrorKind::InvalidInput,
            ClinicError::Unauthorized => ErrorKind::Unauthorized,
            ClinicError::NotFound(_) => ErrorKind::NotFound,
            ClinicError::Http(_)
            | ClinicError::Status { .. }
            | ClinicError::OpenMrs(_)
            | ClinicError::Fhir(_) => ErrorKind::Upstream,
            ClinicError::Config(_)
            | ClinicError::InvalidHeader(_)
            | ClinicError::Csv(_)
            | ClinicError::CsvEncoding(_) => ErrorKind::Internal,
        }
    }

    pub fn is_auth_failure(&self) -> bool {
        self.kind() == ErrorKind::Unauthorized
    }
}

impl From<clinic_types::TextError> for ClinicError {
    fn from(err: clinic_types::TextError) -> Self {
        ClinicError::InvalidInput(err.to_string())
    }
}

impl From<clinic_types::IdError> for ClinicError {
    fn from(err: clinic_types::IdError) -> Self {
        ClinicError::InvalidInput(err.to_string())
    }
}

pub type ClinicResult<T> = std::result::Result<T, ClinicError>;
