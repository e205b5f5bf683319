// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::domain::enums::UnknownVariant;
use crate::domain::validation::ValidationError;
use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use diesel::r2d2::PoolError;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use miette::Diagnostic;
use serde_json::json;

/// Everything a request can fail with. Each variant maps onto one HTTP status.
#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum AppError {
	#[error(transparent)]
	#[diagnostic(code(fieldline::validation))]
	Validation(#[from] ValidationError),
	#[error("{0}")]
	#[diagnostic(code(fieldline::bad_request))]
	BadRequest(String),
	#[error("authentication required")]
	#[diagnostic(code(fieldline::unauthenticated))]
	Unauthenticated,
	#[error("{0}")]
	#[diagnostic(code(fieldline::forbidden))]
	Forbidden(String),
	#[error("{0} not found")]
	#[diagnostic(code(fieldline::not_found))]
	NotFound(&'static str),
	#[error("{0}")]
	#[diagnostic(code(fieldline::conflict))]
	Conflict(String),
	#[error("attachments may be at most {0} bytes")]
	#[diagnostic(code(fieldline::too_large))]
	PayloadTooLarge(u64),
	#[error("database error")]
	#[diagnostic(code(fieldline::database))]
	Database(#[source] DieselError),
	#[error("database connection unavailable")]
	#[diagnostic(code(fieldline::pool))]
	Pool(#[from] PoolError),
	#[error("file storage error")]
	#[diagnostic(code(fieldline::io))]
	Io(#[from] std::io::Error),
	#[error("{0}")]
	#[diagnostic(code(fieldline::internal))]
	Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
	pub fn forbidden(message: impl Into<String>) -> Self {
		Self::Forbidden(message.into())
	}

	pub fn status_code(&self) -> StatusCode {
		match self {
			Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
			Self::Unauthenticated => StatusCode::UNAUTHORIZED,
			Self::Forbidden(_) => StatusCode::FORBIDDEN,
			Self::NotFound(_) => StatusCode::NOT_FOUND,
			Self::Conflict(_) => StatusCode::CONFLICT,
			Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
			Self::Database(_) | Self::Pool(_) | Self::Io(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// The message shown to clients. Server-side failures are only described in the log.
	pub fn public_message(&self) -> String {
		if self.status_code() == StatusCode::INTERNAL_SERVER_ERROR {
			String::from("internal server error")
		} else {
			self.to_string()
		}
	}
}

impl From<DieselError> for AppError {
	fn from(error: DieselError) -> Self {
		match error {
			DieselError::NotFound => Self::NotFound("record"),
			DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
				Self::Conflict(String::from("a record with that identifier already exists"))
			}
			DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
				Self::Conflict(String::from("the record is still referenced by other records"))
			}
			error => Self::Database(error),
		}
	}
}

impl From<UnknownVariant> for AppError {
	fn from(error: UnknownVariant) -> Self {
		Self::BadRequest(error.to_string())
	}
}

impl From<JsonRejection> for AppError {
	fn from(rejection: JsonRejection) -> Self {
		Self::BadRequest(rejection.body_text())
	}
}

impl From<QueryRejection> for AppError {
	fn from(rejection: QueryRejection) -> Self {
		Self::BadRequest(rejection.body_text())
	}
}

impl From<PathRejection> for AppError {
	fn from(rejection: PathRejection) -> Self {
		Self::BadRequest(rejection.body_text())
	}
}

impl From<MultipartRejection> for AppError {
	fn from(rejection: MultipartRejection) -> Self {
		Self::BadRequest(rejection.body_text())
	}
}

impl AppError {
	/// Maps a failure reading an upload, reporting the body limit as 413.
	pub fn from_multipart(error: MultipartError, max_bytes: u64) -> Self {
		if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
			Self::PayloadTooLarge(max_bytes)
		} else {
			Self::BadRequest(error.body_text())
		}
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response {
		let status = self.status_code();
		if status == StatusCode::INTERNAL_SERVER_ERROR {
			tracing::error!(source = ?self, "Request failed");
		}
		(status, Json(json!({ "error": self.public_message() }))).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use http_body_util::BodyExt;

	#[test]
	fn database_errors_are_classified() {
		assert!(matches!(AppError::from(DieselError::NotFound), AppError::NotFound(_)));
		assert_eq!(
			AppError::from(DieselError::RollbackTransaction).status_code(),
			StatusCode::INTERNAL_SERVER_ERROR
		);
	}

	#[test]
	fn internal_details_are_hidden() {
		let error = AppError::Internal(String::from("disk on fire"));
		assert_eq!(error.public_message(), "internal server error");
		let error = AppError::from(ValidationError::new("title", "is required"));
		assert_eq!(error.public_message(), "title: is required");
	}

	#[tokio::test]
	async fn response_body_carries_the_message() {
		let response = AppError::NotFound("ticket").into_response();
		assert_eq!(response.status(), StatusCode::NOT_FOUND);
		let body = response.into_body().collect().await.unwrap().to_bytes();
		let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
		assert_eq!(body["error"], "ticket not found");
	}
}
