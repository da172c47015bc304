//! Response envelope and the error type returned by every handler.
//!
//! Success: `{"success": true, "data": ...}` or `{"success": true, "message": ...}`.
//! Failure: `{"success": false, "code": ..., "message": ..., "errors"?: [...]}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use affdesk_core::auth::PasswordError;
use affdesk_core::communication::ThreadError;
use affdesk_core::flow::FlowRuleError;
use affdesk_core::stats::StatsError;
use affdesk_core::workflow::WorkflowError;
use affdesk_db::repositories::{
    BizdevError, CommunicationError, DirectoryError, ExpenseError, FlowError, FlowStatsError,
    InvestmentError, OrganizationError, PaymentError, SalaryError, UserError,
};
use affdesk_shared::{AppError, FieldError, JwtError};

/// Result type for handlers.
pub type ApiResult<T = Response> = Result<T, ApiError>;

#[derive(Serialize)]
struct DataEnvelope<T> {
    success: bool,
    data: T,
}

#[derive(Serialize)]
struct MessageEnvelope<'a> {
    success: bool,
    message: &'a str,
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    success: bool,
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a [FieldError]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

/// 200 with `data`.
pub fn ok<T: Serialize>(data: T) -> Response {
    (
        StatusCode::OK,
        Json(DataEnvelope {
            success: true,
            data,
        }),
    )
        .into_response()
}

/// 201 with `data`.
pub fn created<T: Serialize>(data: T) -> Response {
    (
        StatusCode::CREATED,
        Json(DataEnvelope {
            success: true,
            data,
        }),
    )
        .into_response()
}

/// 200 with a `message` and no data.
pub fn message(message: &str) -> Response {
    (
        StatusCode::OK,
        Json(MessageEnvelope {
            success: true,
            message,
        }),
    )
        .into_response()
}

/// Handler error; renders an `AppError` inside the envelope.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// 403 with `message`.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self(AppError::Forbidden(message.into()))
    }

    /// 401 with `message`.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self(AppError::Unauthorized(message.into()))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if err.is_internal() {
            tracing::error!(error = %err, "Request failed");
        }

        let errors = match &err {
            AppError::InvalidInput(fields) => Some(fields.as_slice()),
            _ => None,
        };
        let detail = (cfg!(debug_assertions) && err.is_internal()).then(|| err.to_string());

        let body = ErrorEnvelope {
            success: false,
            code: err.error_code(),
            message: err.public_message(),
            errors,
            detail,
        };
        (status, Json(body)).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self(affdesk_db::db_error(err))
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::TooShort => Self(AppError::field("password", err.to_string())),
            _ => Self(AppError::Internal(err.to_string())),
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::EncodingError(_) => Self(AppError::Internal(err.to_string())),
            JwtError::Expired => Self::unauthorized("Token has expired"),
            JwtError::DecodingError(_) | JwtError::WrongKind => {
                Self::unauthorized("Invalid or malformed token")
            }
        }
    }
}

/// Errors that already know how to become an `AppError`.
macro_rules! via_app_error {
    ($($err:ty),+ $(,)?) => {
        $(
            impl From<$err> for ApiError {
                fn from(err: $err) -> Self {
                    Self(AppError::from(err))
                }
            }
        )+
    };
}

via_app_error!(
    BizdevError,
    CommunicationError,
    DirectoryError,
    ExpenseError,
    FlowError,
    FlowStatsError,
    InvestmentError,
    OrganizationError,
    PaymentError,
    SalaryError,
    UserError,
    FlowRuleError,
    StatsError,
    ThreadError,
    WorkflowError,
);

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_ok_envelope() {
        let response = ok(serde_json::json!({"id": 1}));
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["id"], 1);
    }

    #[tokio::test]
    async fn test_field_errors_rendered() {
        let response = ApiError(AppError::field("email", "is invalid")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["errors"][0]["field"], "email");
        assert_eq!(body["errors"][0]["message"], "is invalid");
    }

    #[tokio::test]
    async fn test_internal_error_hides_message() {
        let response = ApiError(AppError::Database("relation does not exist".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Internal server error");
        assert!(body.get("errors").is_none());
    }

    #[test]
    fn test_workflow_error_is_bad_request() {
        let err = ApiError::from(WorkflowError::RejectionReasonRequired);
        assert_eq!(err.0.status_code(), 400);
    }
}
