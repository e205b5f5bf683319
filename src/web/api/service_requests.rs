// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::{ApiJson, ApiPath, ApiQuery};
use crate::config::ConfigData;
use crate::database::DbPool;
use crate::domain::enums::ServiceRequestStatus;
use crate::domain::validation::optional_text;
use crate::error::AppResult;
use crate::model::ServiceRequest;
use crate::store::lookup::NameLookup;
use crate::store::service_requests::{self, AcceptRequest, RejectRequest, ServiceRequestInput};
use crate::store::tickets::TicketView;
use crate::web::context::RequestContext;
use crate::web::permissions::can_review_service_requests;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct RequestFilter {
	status: Option<String>,
}

/// Public intake. No login; the company comes from the path.
pub async fn submit(
	State(db_connection_pool): State<DbPool>,
	ApiPath(company_code): ApiPath<String>,
	ApiJson(input): ApiJson<ServiceRequestInput>,
) -> AppResult<(StatusCode, Json<ServiceRequest>)> {
	let mut db_connection = db_connection_pool.get()?;
	let request = service_requests::submit(&mut db_connection, &company_code.trim().to_uppercase(), &input)?;
	tracing::info!(company = %request.company_code, request = %request.id, "Service request received");
	Ok((StatusCode::CREATED, Json(request)))
}

pub async fn list(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiQuery(filter): ApiQuery<RequestFilter>,
) -> AppResult<Json<Vec<ServiceRequest>>> {
	context.require(can_review_service_requests)?;
	let status = match optional_text(filter.status.as_deref()) {
		Some(status) => Some(status.parse::<ServiceRequestStatus>()?),
		None => None,
	};
	let mut db_connection = db_connection_pool.get()?;
	Ok(Json(service_requests::list(&mut db_connection, &context.company.code, status)?))
}

pub async fn get(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiPath(id): ApiPath<String>,
) -> AppResult<Json<ServiceRequest>> {
	context.require(can_review_service_requests)?;
	let mut db_connection = db_connection_pool.get()?;
	Ok(Json(service_requests::get(&mut db_connection, &context.company.code, &id)?))
}

/// Accepts a pending request, answering with the ticket it became. Send `{}` to keep the request's own details.
pub async fn accept(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	State(config): State<Arc<ConfigData>>,
	ApiPath(id): ApiPath<String>,
	ApiJson(accept): ApiJson<AcceptRequest>,
) -> AppResult<(StatusCode, Json<TicketView>)> {
	context.require(can_review_service_requests)?;
	let mut db_connection = db_connection_pool.get()?;
	let (_, ticket) = service_requests::accept(&mut db_connection, context.scope(), &config.sla, &id, &accept)?;
	let lookup = NameLookup::load(&mut db_connection, &context.company.code)?;
	Ok((StatusCode::CREATED, Json(TicketView::new(ticket, &lookup, Utc::now()))))
}

pub async fn reject(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiPath(id): ApiPath<String>,
	ApiJson(reject): ApiJson<RejectRequest>,
) -> AppResult<Json<ServiceRequest>> {
	context.require(can_review_service_requests)?;
	let mut db_connection = db_connection_pool.get()?;
	Ok(Json(service_requests::reject(&mut db_connection, context.scope(), &id, &reject)?))
}
