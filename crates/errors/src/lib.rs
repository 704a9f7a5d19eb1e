use thiserror::Error;

/// Coarse classification used by callers that only care about the family of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidInput,
    Internal,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("address not found: {id}")]
    AddressNotFound { id: i64 },
    #[error("client not found: {id}")]
    ClientNotFound { id: i64 },
    #[error("driver not found: {id}")]
    DriverNotFound { id: i64 },
    #[error("service not found: {id}")]
    ServiceNotFound { id: i64 },
    #[error("driver {id} is not available")]
    DriverUnavailable { id: i64 },
    #[error("driver {driver_id} is not assigned to service {service_id}")]
    DriverMismatch { service_id: i64, driver_id: i64 },
    #[error("service {id} cannot {action} while {status}")]
    InvalidTransition {
        id: i64,
        status: String,
        action: String,
    },
    #[error("service {id} is {status} and can no longer change")]
    ServiceFinalized { id: i64, status: String },
    #[error("service {id} changed concurrently (expected {expected}, found {actual})")]
    StaleService {
        id: i64,
        expected: String,
        actual: String,
    },
    #[error("could not claim a driver after {attempts} attempts")]
    ClaimContention { attempts: usize },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("database operation failed: {0}")]
    DatabaseOperation(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("internal error: {0}")]
    Internal(String),
}

pub type DispatchResult<T> = Result<T, DispatchError>;

impl DispatchError {
    pub fn address_not_found(id: i64) -> Self {
        Self::AddressNotFound { id }
    }
    pub fn client_not_found(id: i64) -> Self {
        Self::ClientNotFound { id }
    }
    pub fn driver_not_found(id: i64) -> Self {
        Self::DriverNotFound { id }
    }
    pub fn service_not_found(id: i64) -> Self {
        Self::ServiceNotFound { id }
    }
    pub fn driver_unavailable(id: i64) -> Self {
        Self::DriverUnavailable { id }
    }
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }
    pub fn database_error<S: Into<String>>(msg: S) -> Self {
        Self::DatabaseOperation(msg.into())
    }
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }
    pub fn invalid_transition<S: ToString, A: Into<String>>(id: i64, status: S, action: A) -> Self {
        Self::InvalidTransition {
            id,
            status: status.to_string(),
            action: action.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::AddressNotFound { .. }
            | DispatchError::ClientNotFound { .. }
            | DispatchError::DriverNotFound { .. }
            | DispatchError::ServiceNotFound { .. } => ErrorKind::NotFound,
            DispatchError::DriverUnavailable { .. }
            | DispatchError::DriverMismatch { .. }
            | DispatchError::InvalidTransition { .. }
            | DispatchError::ServiceFinalized { .. }
            | DispatchError::StaleService { .. }
            | DispatchError::ClaimContention { .. } => ErrorKind::Conflict,
            DispatchError::InvalidInput(_) => ErrorKind::InvalidInput,
            DispatchError::DatabaseOperation(_)
            | DispatchError::Configuration(_)
            | DispatchError::Internal(_) => ErrorKind::Internal,
        }
    }
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }
    pub fn is_invalid_input(&self) -> bool {
        self.kind() == ErrorKind::InvalidInput
    }
    pub fn is_retryable(&self) -> bool {
        matches!(self, DispatchError::DatabaseOperation(_))
    }
    pub fn user_message(&self) -> &str {
        match self {
            DispatchError::AddressNotFound { .. } => "The requested address does not exist",
            DispatchError::ClientNotFound { .. } => "The requested client does not exist",
            DispatchError::DriverNotFound { .. } => "The requested driver does not exist",
            DispatchError::ServiceNotFound { .. } => "The requested service does not exist",
            DispatchError::DriverUnavailable { .. } => "The driver is not available",
            DispatchError::DriverMismatch { .. } => "The driver is not assigned to this service",
            DispatchError::InvalidTransition { .. }
            | DispatchError::ServiceFinalized { .. }
            | DispatchError::StaleService { .. } => "The service cannot change to that state",
            DispatchError::ClaimContention { .. } => "All nearby drivers were taken, try again",
            DispatchError::InvalidInput(_) => "The request data is invalid",
            _ => "The system is busy, please try again later",
        }
    }
}

impl From<sqlx::Error> for DispatchError {
    fn from(err: sqlx::Error) -> Self {
        DispatchError::DatabaseOperation(err.to_string())
    }
}
