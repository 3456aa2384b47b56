use evsales_analyser::insights::InsightError;

use super::SalesError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Sales error: {0}")]
    SalesError(#[from] SalesError),

    #[error("Insight error: {0}")]
    InsightError(#[from] InsightError),
}
