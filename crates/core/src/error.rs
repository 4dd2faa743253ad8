use crate::status::PrescriptionStatus;

#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },
    #[error("prescription {number} cannot move from {from} to {to}")]
    InvalidTransition {
        number: String,
        from: PrescriptionStatus,
        to: PrescriptionStatus,
    },
    #[error("unknown identity: {0}")]
    Unauthenticated(String),
    #[error("{user_id} lacks a role permitted to {action}")]
    Forbidden { user_id: String, action: &'static str },

    #[error("invalid identifier: {0}")]
    Uuid(#[from] clinic_uuid::UuidError),
    #[error("invalid text: {0}")]
    Text(#[from] clinic_types::TextError),
    #[error("invalid number: {0}")]
    Quantity(#[from] clinic_types::QuantityError),

    #[error("failed to create database directory: {0}")]
    DatabaseDirCreation(std::io::Error),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("migration {version} failed: {reason}")]
    MigrationFailed { version: i64, reason: String },
    #[error("corrupt row in {table}: {reason}")]
    CorruptRow { table: &'static str, reason: String },
}

impl ClinicError {
    pub(crate) fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// True for errors caused by the request rather than by the store.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_)
                | Self::Validation(_)
                | Self::NotFound { .. }
                | Self::InvalidTransition { .. }
                | Self::Unauthenticated(_)
                | Self::Forbidden { .. }
                | Self::Uuid(_)
                | Self::Text(_)
                | Self::Quantity(_)
        )
    }
}

pub type ClinicResult<T> = std::result::Result<T, ClinicError>;
