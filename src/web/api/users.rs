// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::{ApiJson, ApiPath};
use crate::config::ConfigData;
use crate::database::DbPool;
use crate::domain::validation;
use crate::error::{AppError, AppResult};
use crate::model::User;
use crate::store::users::{self, NewUser, UserChanges};
use crate::web::auth::hash_password;
use crate::web::context::RequestContext;
use crate::web::permissions::can_manage_users;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct NewPassword {
	password: String,
}

fn hash(config: &ConfigData, password: &str) -> AppResult<String> {
	let password = validation::password(password)?;
	hash_password(password, config.auth.pepper.as_deref()).map_err(|error| AppError::Internal(error.to_string()))
}

pub async fn list(context: RequestContext, State(db_connection_pool): State<DbPool>) -> AppResult<Json<Vec<User>>> {
	context.require(can_manage_users)?;
	let mut db_connection = db_connection_pool.get()?;
	Ok(Json(users::list(&mut db_connection, &context.company.code)?))
}

pub async fn get(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiPath(id): ApiPath<String>,
) -> AppResult<Json<User>> {
	context.require(can_manage_users)?;
	let mut db_connection = db_connection_pool.get()?;
	Ok(Json(users::get(&mut db_connection, &context.company.code, &id)?))
}

pub async fn create(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	State(config): State<Arc<ConfigData>>,
	ApiJson(input): ApiJson<NewUser>,
) -> AppResult<(StatusCode, Json<User>)> {
	context.require(can_manage_users)?;
	let password_hash = hash(&config, &input.password)?;
	let mut db_connection = db_connection_pool.get()?;
	let user = users::create(&mut db_connection, context.scope(), &input, password_hash)?;
	Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiPath(id): ApiPath<String>,
	ApiJson(changes): ApiJson<UserChanges>,
) -> AppResult<Json<User>> {
	context.require(can_manage_users)?;
	let mut db_connection = db_connection_pool.get()?;
	Ok(Json(users::update(&mut db_connection, context.scope(), &id, &changes)?))
}

pub async fn deactivate(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiPath(id): ApiPath<String>,
) -> AppResult<Json<User>> {
	context.require(can_manage_users)?;
	let mut db_connection = db_connection_pool.get()?;
	Ok(Json(users::deactivate(&mut db_connection, context.scope(), &id)?))
}

pub async fn set_password(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	State(config): State<Arc<ConfigData>>,
	ApiPath(id): ApiPath<String>,
	ApiJson(new_password): ApiJson<NewPassword>,
) -> AppResult<StatusCode> {
	context.require(can_manage_users)?;
	let password_hash = hash(&config, &new_password.password)?;
	let mut db_connection = db_connection_pool.get()?;
	users::set_password_hash(&mut db_connection, context.scope(), &id, password_hash)?;
	Ok(StatusCode::NO_CONTENT)
}
