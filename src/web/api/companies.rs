// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::{ApiJson, ApiPath};
use crate::database::DbPool;
use crate::error::AppResult;
use crate::model::Company;
use crate::store::companies::{self, CompanyChanges, NewCompany};
use crate::web::context::RequestContext;
use crate::web::permissions::can_manage_companies;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

pub async fn list(context: RequestContext, State(db_connection_pool): State<DbPool>) -> AppResult<Json<Vec<Company>>> {
	context.require(can_manage_companies)?;
	let mut db_connection = db_connection_pool.get()?;
	Ok(Json(companies::list(&mut db_connection)?))
}

pub async fn get(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiPath(code): ApiPath<String>,
) -> AppResult<Json<Company>> {
	context.require(can_manage_companies)?;
	let mut db_connection = db_connection_pool.get()?;
	Ok(Json(companies::get(&mut db_connection, &code.to_uppercase())?))
}

pub async fn create(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiJson(input): ApiJson<NewCompany>,
) -> AppResult<(StatusCode, Json<Company>)> {
	context.require(can_manage_companies)?;
	let mut db_connection = db_connection_pool.get()?;
	let company = companies::create(&mut db_connection, &context.user.id, &input)?;
	Ok((StatusCode::CREATED, Json(company)))
}

pub async fn update(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiPath(code): ApiPath<String>,
	ApiJson(changes): ApiJson<CompanyChanges>,
) -> AppResult<Json<Company>> {
	context.require(can_manage_companies)?;
	let mut db_connection = db_connection_pool.get()?;
	Ok(Json(companies::update(
		&mut db_connection,
		&context.user.id,
		&code.to_uppercase(),
		&changes,
	)?))
}
