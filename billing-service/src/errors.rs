//! Domain errors for billing-service and their mapping onto `AppError`.

use service_core::error::AppError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubscriptionError {
    #[error("subscription not found")]
    NotFound,

    #[error("subscription already exists")]
    AlreadyExists,

    #[error("subscription type is invalid")]
    InvalidType,
}

impl SubscriptionError {
    /// Stable machine-readable code.
    pub fn reason(&self) -> &'static str {
        match self {
            SubscriptionError::NotFound => "SUBSCRIPTION_NOT_FOUND_ERROR",
            SubscriptionError::AlreadyExists => "SUBSCRIPTION_ALREADY_EXIST_ERROR",
            SubscriptionError::InvalidType => "SUBSCRIPTION_TYPE_INVALID",
        }
    }
}

impl From<SubscriptionError> for AppError {
    fn from(err: SubscriptionError) -> Self {
        match err {
            SubscriptionError::NotFound => AppError::NotFound(anyhow::Error::new(err)),
            SubscriptionError::AlreadyExists | SubscriptionError::InvalidType => {
                AppError::ValidationError(anyhow::Error::new(err))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransactionError {
    #[error("transaction not found")]
    NotFound,
}

impl TransactionError {
    pub fn reason(&self) -> &'static str {
        match self {
            TransactionError::NotFound => "TRANSACTION_NOT_FOUND_ERROR",
        }
    }
}

impl From<TransactionError> for AppError {
    fn from(err: TransactionError) -> Self {
        AppError::NotFound(anyhow::Error::new(err))
    }
}

/// The domain error carried by an `AppError`, if any.
pub fn subscription_error(err: &AppError) -> Option<SubscriptionError> {
    match err {
        AppError::NotFound(e) | AppError::ValidationError(e) => {
            e.downcast_ref::<SubscriptionError>().copied()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_errors_map_to_status() {
        let cases = [
            (SubscriptionError::NotFound, 404),
            (SubscriptionError::AlreadyExists, 422),
            (SubscriptionError::InvalidType, 422),
        ];
        for (err, status) in cases {
            let app: AppError = err.into();
            assert_eq!(app.status_code().as_u16(), status);
            assert_eq!(subscription_error(&app), Some(err));
        }
    }

    #[test]
    fn test_transaction_not_found() {
        let app: AppError = TransactionError::NotFound.into();
        assert_eq!(app.status_code().as_u16(), 404);
        assert_eq!(TransactionError::NotFound.reason(), "TRANSACTION_NOT_FOUND_ERROR");
    }
}
