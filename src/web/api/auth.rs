// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::ApiJson;
use crate::config::ConfigData;
use crate::database::DbPool;
use crate::error::{AppError, AppResult};
use crate::model::{Company, User};
use crate::store::tokens;
use crate::web::auth::authenticate;
use crate::web::context::RequestContext;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
	username: String,
	password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
	token: String,
	expires_at: DateTime<Utc>,
	user: User,
}

#[derive(Debug, Serialize)]
pub struct Me {
	user: User,
	company: Company,
}

pub async fn issue_token(
	State(db_connection_pool): State<DbPool>,
	State(config): State<Arc<ConfigData>>,
	ApiJson(request): ApiJson<TokenRequest>,
) -> AppResult<(StatusCode, Json<TokenResponse>)> {
	let mut db_connection = db_connection_pool.get()?;
	let user = authenticate(
		&mut db_connection,
		&request.username,
		&request.password,
		config.auth.pepper.as_deref(),
	)?;
	let Some(user) = user else {
		tracing::info!(username = %request.username, "Rejected token request");
		return Err(AppError::Unauthenticated);
	};

	let (token, expires_at) = tokens::issue(&mut db_connection, &user.id, config.auth.token_lifetime_hours)?;
	tracing::info!(user = %user.id, "Issued API token");
	Ok((
		StatusCode::CREATED,
		Json(TokenResponse {
			token,
			expires_at,
			user,
		}),
	))
}

pub async fn revoke_token(
	State(db_connection_pool): State<DbPool>,
	authorization: Option<TypedHeader<Authorization<Bearer>>>,
) -> AppResult<StatusCode> {
	let Some(TypedHeader(authorization)) = authorization else {
		return Err(AppError::Unauthenticated);
	};
	let mut db_connection = db_connection_pool.get()?;
	if tokens::revoke(&mut db_connection, authorization.token())? {
		Ok(StatusCode::NO_CONTENT)
	} else {
		Err(AppError::Unauthenticated)
	}
}

pub async fn me(context: RequestContext) -> Json<Me> {
	Json(Me {
		user: context.user,
		company: context.company,
	})
}
