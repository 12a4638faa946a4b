use galang_xendit::XenditError;
use sea_orm::{DbErr, SqlErr};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    Conflict(String),

    #[error("Campaign {0} has already ended")]
    AlreadyEnded(i32),

    #[error("Campaign {0} has ended and no longer accepts donations")]
    CampaignEnded(i32),

    #[error("{0}")]
    InvalidState(String),

    #[error("Insufficient funds: requested {requested}, withdrawable {available}")]
    InsufficientFunds { requested: i64, available: i64 },

    #[error("Payment gateway error: {0}")]
    Gateway(#[from] XenditError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Database(#[from] DbErr),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Error::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Error::Forbidden(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Turn a unique-constraint violation into `Conflict`, pass anything else through.
    pub(crate) fn from_insert(err: DbErr, conflict: impl FnOnce() -> String) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Error::Conflict(conflict()),
            _ => Error::Database(err),
        }
    }
}
