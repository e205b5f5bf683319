// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The JSON API. Everything under `/api` authenticates per request with a bearer token or the login session and
//! answers errors as `{"error": "..."}`.

mod activity;
mod attachments;
mod auth;
mod companies;
mod registries;
pub mod reports;
mod service_requests;
pub mod tickets;
mod users;

use crate::config::ConfigData;
use crate::database::DbPool;
use crate::error::AppError;
use axum::extract::{DefaultBodyLimit, FromRef, FromRequest, FromRequestParts};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::sync::Arc;

/// Room left in an upload body for the multipart framing around the file itself.
const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

/// A JSON body that rejects with the API's error format.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// A query string that rejects with the API's error format.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Path parameters that reject with the API's error format.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

pub fn router<S>(max_attachment_bytes: u64) -> Router<S>
where
	S: Clone + Send + Sync + 'static,
	DbPool: FromRef<S>,
	Arc<ConfigData>: FromRef<S>,
{
	let upload_limit = usize::try_from(max_attachment_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES)).unwrap_or(usize::MAX);

	Router::new()
		.route("/api/health", get(health))
		.route(
			"/api/auth/token",
			post(auth::issue_token).delete(auth::revoke_token),
		)
		.route("/api/auth/me", get(auth::me))
		.route("/api/tickets", get(tickets::list).post(tickets::create))
		.route("/api/tickets/counts", get(tickets::counts))
		.route("/api/tickets/closed", get(tickets::closed))
		.route("/api/tickets/export.csv", get(tickets::export_csv))
		.route(
			"/api/tickets/{id}",
			get(tickets::get).patch(tickets::update).delete(tickets::delete),
		)
		.route("/api/tickets/{id}/print", get(tickets::print))
		.route(
			"/api/tickets/{id}/notes",
			get(tickets::list_notes).post(tickets::add_note),
		)
		.route("/api/tickets/{id}/audit", get(tickets::audit))
		.route(
			"/api/tickets/{id}/attachments",
			get(attachments::list).post(attachments::upload).layer(DefaultBodyLimit::max(upload_limit)),
		)
		.route(
			"/api/attachments/{id}",
			get(attachments::download).delete(attachments::delete),
		)
		.route(
			"/api/customers",
			get(registries::list_customers).post(registries::create_customer),
		)
		.route(
			"/api/customers/{id}",
			get(registries::get_customer)
				.put(registries::update_customer)
				.delete(registries::delete_customer),
		)
		.route(
			"/api/sites",
			get(registries::list_sites).post(registries::create_site),
		)
		.route(
			"/api/sites/{id}",
			get(registries::get_site)
				.put(registries::update_site)
				.delete(registries::delete_site),
		)
		.route(
			"/api/assets",
			get(registries::list_assets).post(registries::create_asset),
		)
		.route(
			"/api/assets/{id}",
			get(registries::get_asset)
				.put(registries::update_asset)
				.delete(registries::delete_asset),
		)
		.route(
			"/api/vendors",
			get(registries::list_vendors).post(registries::create_vendor),
		)
		.route(
			"/api/vendors/{id}",
			get(registries::get_vendor)
				.put(registries::update_vendor)
				.delete(registries::delete_vendor),
		)
		.route(
			"/api/licenses",
			get(registries::list_licenses).post(registries::create_license),
		)
		.route("/api/licenses/expiring", get(registries::expiring_licenses))
		.route(
			"/api/licenses/{id}",
			get(registries::get_license)
				.put(registries::update_license)
				.delete(registries::delete_license),
		)
		.route("/api/users", get(users::list).post(users::create))
		.route(
			"/api/users/{id}",
			get(users::get).patch(users::update).delete(users::deactivate),
		)
		.route("/api/users/{id}/password", post(users::set_password))
		.route("/api/companies", get(companies::list).post(companies::create))
		.route(
			"/api/companies/{code}",
			get(companies::get).patch(companies::update),
		)
		.route("/api/service-requests", get(service_requests::list))
		.route("/api/service-requests/{id}", get(service_requests::get))
		.route("/api/service-requests/{id}/accept", post(service_requests::accept))
		.route("/api/service-requests/{id}/reject", post(service_requests::reject))
		.route(
			"/public/{company_code}/service-requests",
			post(service_requests::submit),
		)
		.route("/api/activity-log", get(activity::list))
		.route("/api/reports/summary", get(reports::summary))
		.route("/api/map/markers", get(reports::map_markers))
		.route("/api/calendar", get(reports::calendar))
}

async fn health() -> Json<Value> {
	Json(json!({ "status": "ok" }))
}
