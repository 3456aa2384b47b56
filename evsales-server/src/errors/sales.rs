use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum SalesError {
    #[error("Brand not found")]
    BrandNotFound,
}

impl SalesError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SalesError::BrandNotFound => StatusCode::NOT_FOUND,
        }
    }
}
