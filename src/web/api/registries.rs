// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Customers, sites, assets, vendors and licenses. Anyone in the company can read them; coordinators and
//! administrators maintain them.

use super::{ApiJson, ApiPath, ApiQuery};
use crate::database::DbPool;
use crate::error::AppResult;
use crate::model::{Asset, Customer, License, Site, Vendor};
use crate::store::assets::{self, AssetInput};
use crate::store::customers::{self, CustomerInput};
use crate::store::licenses::{self, DEFAULT_EXPIRY_WINDOW_DAYS, LicenseInput, expiry_horizon};
use crate::store::sites::{self, SiteInput};
use crate::store::vendors::{self, VendorInput};
use crate::web::context::RequestContext;
use crate::web::permissions::can_manage_registries;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::Utc;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteFilter {
	customer_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetFilter {
	site_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExpiryWindow {
	days: Option<i64>,
}

pub async fn list_customers(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
) -> AppResult<Json<Vec<Customer>>> {
	let mut db_connection = db_connection_pool.get()?;
	Ok(Json(customers::list(&mut db_connection, &context.company.code)?))
}

pub async fn get_customer(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiPath(id): ApiPath<String>,
) -> AppResult<Json<Customer>> {
	let mut db_connection = db_connection_pool.get()?;
	Ok(Json(customers::get(&mut db_connection, &context.company.code, &id)?))
}

pub async fn create_customer(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiJson(input): ApiJson<CustomerInput>,
) -> AppResult<(StatusCode, Json<Customer>)> {
	context.require(can_manage_registries)?;
	let mut db_connection = db_connection_pool.get()?;
	let customer = customers::create(&mut db_connection, context.scope(), &input)?;
	Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn update_customer(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiPath(id): ApiPath<String>,
	ApiJson(input): ApiJson<CustomerInput>,
) -> AppResult<Json<Customer>> {
	context.require(can_manage_registries)?;
	let mut db_connection = db_connection_pool.get()?;
	Ok(Json(customers::update(&mut db_connection, context.scope(), &id, &input)?))
}

pub async fn delete_customer(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiPath(id): ApiPath<String>,
) -> AppResult<StatusCode> {
	context.require(can_manage_registries)?;
	let mut db_connection = db_connection_pool.get()?;
	customers::delete(&mut db_connection, context.scope(), &id)?;
	Ok(StatusCode::NO_CONTENT)
}

pub async fn list_sites(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiQuery(filter): ApiQuery<SiteFilter>,
) -> AppResult<Json<Vec<Site>>> {
	let mut db_connection = db_connection_pool.get()?;
	Ok(Json(sites::list(
		&mut db_connection,
		&context.company.code,
		filter.customer_id.as_deref(),
	)?))
}

pub async fn get_site(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiPath(id): ApiPath<String>,
) -> AppResult<Json<Site>> {
	let mut db_connection = db_connection_pool.get()?;
	Ok(Json(sites::get(&mut db_connection, &context.company.code, &id)?))
}

pub async fn create_site(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiJson(input): ApiJson<SiteInput>,
) -> AppResult<(StatusCode, Json<Site>)> {
	context.require(can_manage_registries)?;
	let mut db_connection = db_connection_pool.get()?;
	let site = sites::create(&mut db_connection, context.scope(), &input)?;
	Ok((StatusCode::CREATED, Json(site)))
}

pub async fn update_site(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiPath(id): ApiPath<String>,
	ApiJson(input): ApiJson<SiteInput>,
) -> AppResult<Json<Site>> {
	context.require(can_manage_registries)?;
	let mut db_connection = db_connection_pool.get()?;
	Ok(Json(sites::update(&mut db_connection, context.scope(), &id, &input)?))
}

pub async fn delete_site(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiPath(id): ApiPath<String>,
) -> AppResult<StatusCode> {
	context.require(can_manage_registries)?;
	let mut db_connection = db_connection_pool.get()?;
	sites::delete(&mut db_connection, context.scope(), &id)?;
	Ok(StatusCode::NO_CONTENT)
}

pub async fn list_assets(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiQuery(filter): ApiQuery<AssetFilter>,
) -> AppResult<Json<Vec<Asset>>> {
	let mut db_connection = db_connection_pool.get()?;
	Ok(Json(assets::list(
		&mut db_connection,
		&context.company.code,
		filter.site_id.as_deref(),
	)?))
}

pub async fn get_asset(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiPath(id): ApiPath<String>,
) -> AppResult<Json<Asset>> {
	let mut db_connection = db_connection_pool.get()?;
	Ok(Json(assets::get(&mut db_connection, &context.company.code, &id)?))
}

pub async fn create_asset(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiJson(input): ApiJson<AssetInput>,
) -> AppResult<(StatusCode, Json<Asset>)> {
	context.require(can_manage_registries)?;
	let mut db_connection = db_connection_pool.get()?;
	let asset = assets::create(&mut db_connection, context.scope(), &input)?;
	Ok((StatusCode::CREATED, Json(asset)))
}

pub async fn update_asset(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiPath(id): ApiPath<String>,
	ApiJson(input): ApiJson<AssetInput>,
) -> AppResult<Json<Asset>> {
	context.require(can_manage_registries)?;
	let mut db_connection = db_connection_pool.get()?;
	Ok(Json(assets::update(&mut db_connection, context.scope(), &id, &input)?))
}

pub async fn delete_asset(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiPath(id): ApiPath<String>,
) -> AppResult<StatusCode> {
	context.require(can_manage_registries)?;
	let mut db_connection = db_connection_pool.get()?;
	assets::delete(&mut db_connection, context.scope(), &id)?;
	Ok(StatusCode::NO_CONTENT)
}

pub async fn list_vendors(context: RequestContext, State(db_connection_pool): State<DbPool>) -> AppResult<Json<Vec<Vendor>>> {
	let mut db_connection = db_connection_pool.get()?;
	Ok(Json(vendors::list(&mut db_connection, &context.company.code)?))
}

pub async fn get_vendor(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiPath(id): ApiPath<String>,
) -> AppResult<Json<Vendor>> {
	let mut db_connection = db_connection_pool.get()?;
	Ok(Json(vendors::get(&mut db_connection, &context.company.code, &id)?))
}

pub async fn create_vendor(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiJson(input): ApiJson<VendorInput>,
) -> AppResult<(StatusCode, Json<Vendor>)> {
	context.require(can_manage_registries)?;
	let mut db_connection = db_connection_pool.get()?;
	let vendor = vendors::create(&mut db_connection, context.scope(), &input)?;
	Ok((StatusCode::CREATED, Json(vendor)))
}

pub async fn update_vendor(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiPath(id): ApiPath<String>,
	ApiJson(input): ApiJson<VendorInput>,
) -> AppResult<Json<Vendor>> {
	context.require(can_manage_registries)?;
	let mut db_connection = db_connection_pool.get()?;
	Ok(Json(vendors::update(&mut db_connection, context.scope(), &id, &input)?))
}

pub async fn delete_vendor(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiPath(id): ApiPath<String>,
) -> AppResult<StatusCode> {
	context.require(can_manage_registries)?;
	let mut db_connection = db_connection_pool.get()?;
	vendors::delete(&mut db_connection, context.scope(), &id)?;
	Ok(StatusCode::NO_CONTENT)
}

pub async fn list_licenses(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
) -> AppResult<Json<Vec<License>>> {
	let mut db_connection = db_connection_pool.get()?;
	Ok(Json(licenses::list(&mut db_connection, &context.company.code)?))
}

/// Licenses that have lapsed or will within `days` (30 by default).
pub async fn expiring_licenses(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiQuery(window): ApiQuery<ExpiryWindow>,
) -> AppResult<Json<Vec<License>>> {
	let horizon = expiry_horizon(
		Utc::now().date_naive(),
		window.days.unwrap_or(DEFAULT_EXPIRY_WINDOW_DAYS),
	)?;
	let mut db_connection = db_connection_pool.get()?;
	Ok(Json(licenses::expiring(&mut db_connection, &context.company.code, horizon)?))
}

pub async fn get_license(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiPath(id): ApiPath<String>,
) -> AppResult<Json<License>> {
	let mut db_connection = db_connection_pool.get()?;
	Ok(Json(licenses::get(&mut db_connection, &context.company.code, &id)?))
}

pub async fn create_license(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiJson(input): ApiJson<LicenseInput>,
) -> AppResult<(StatusCode, Json<License>)> {
	context.require(can_manage_registries)?;
	let mut db_connection = db_connection_pool.get()?;
	let license = licenses::create(&mut db_connection, context.scope(), &input)?;
	Ok((StatusCode::CREATED, Json(license)))
}

pub async fn update_license(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiPath(id): ApiPath<String>,
	ApiJson(input): ApiJson<LicenseInput>,
) -> AppResult<Json<License>> {
	context.require(can_manage_registries)?;
	let mut db_connection = db_connection_pool.get()?;
	Ok(Json(licenses::update(&mut db_connection, context.scope(), &id, &input)?))
}

pub async fn delete_license(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiPath(id): ApiPath<String>,
) -> AppResult<StatusCode> {
	context.require(can_manage_registries)?;
	let mut db_connection = db_connection_pool.get()?;
	licenses::delete(&mut db_connection, context.scope(), &id)?;
	Ok(StatusCode::NO_CONTENT)
}
