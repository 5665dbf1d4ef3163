use axum::{
    http::StatusCode,
    response::{
        IntoResponse,
        Response,
    },
};
use se_exporter_client::ClientError;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Collecting metrics from the remote API failed: {0}")]
    Collect(#[from] ClientError),
    #[error("Encoding metrics failed: {0}")]
    Encode(#[from] std::fmt::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Collect(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error!(%self, "scrape failed");
        (status, self.to_string()).into_response()
    }
}
