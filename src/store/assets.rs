// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::activity::{self, CREATE, DELETE, UPDATE};
use super::{Scope, sites};
use crate::domain::validation::{ValidationError, ValidationResult, optional_text, ordered, required, required_max};
use crate::error::{AppError, AppResult};
use crate::model::Asset;
use crate::schema::assets;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::Deserialize;

const ENTITY: &str = "asset";

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetInput {
	pub site_id: String,
	pub name: String,
	pub asset_type: Option<String>,
	pub manufacturer: Option<String>,
	pub model: Option<String>,
	pub serial_number: Option<String>,
	pub install_date: Option<NaiveDate>,
	pub warranty_expires: Option<NaiveDate>,
	pub notes: Option<String>,
}

#[derive(AsChangeset)]
#[diesel(table_name = assets, treat_none_as_null = true)]
struct AssetFields {
	site_id: String,
	name: String,
	asset_type: Option<String>,
	manufacturer: Option<String>,
	model: Option<String>,
	serial_number: Option<String>,
	install_date: Option<NaiveDate>,
	warranty_expires: Option<NaiveDate>,
	notes: Option<String>,
	updated_at: DateTime<Utc>,
}

impl AssetInput {
	fn validate(&self, now: DateTime<Utc>) -> ValidationResult<AssetFields> {
		ordered(
			"warrantyExpires",
			self.install_date.as_ref(),
			self.warranty_expires.as_ref(),
		)?;
		Ok(AssetFields {
			site_id: required("siteId", &self.site_id)?,
			name: required_max("name", &self.name, 200)?,
			asset_type: optional_text(self.asset_type.as_deref()),
			manufacturer: optional_text(self.manufacturer.as_deref()),
			model: optional_text(self.model.as_deref()),
			serial_number: optional_text(self.serial_number.as_deref()),
			install_date: self.install_date,
			warranty_expires: self.warranty_expires,
			notes: optional_text(self.notes.as_deref()),
			updated_at: now,
		})
	}
}

fn check_site(db_connection: &mut PgConnection, company_code: &str, site_id: &str) -> AppResult<()> {
	if sites::find(db_connection, company_code, site_id)?.is_none() {
		return Err(ValidationError::new("siteId", "does not name a site of this company").into());
	}
	Ok(())
}

pub fn list(db_connection: &mut PgConnection, company_code: &str, site_id: Option<&str>) -> AppResult<Vec<Asset>> {
	let mut query = assets::table.filter(assets::company_code.eq(company_code)).into_boxed();
	if let Some(site_id) = site_id {
		query = query.filter(assets::site_id.eq(site_id));
	}
	Ok(query.order(assets::name).load(db_connection)?)
}

pub fn find(db_connection: &mut PgConnection, company_code: &str, id: &str) -> AppResult<Option<Asset>> {
	let asset = assets::table
		.filter(assets::id.eq(id).and(assets::company_code.eq(company_code)))
		.first(db_connection)
		.optional()?;
	Ok(asset)
}

pub fn get(db_connection: &mut PgConnection, company_code: &str, id: &str) -> AppResult<Asset> {
	find(db_connection, company_code, id)?.ok_or(AppError::NotFound("asset"))
}

pub fn create(db_connection: &mut PgConnection, scope: Scope, input: &AssetInput) -> AppResult<Asset> {
	let now = Utc::now();
	let fields = input.validate(now)?;
	db_connection.transaction(|db_connection| {
		check_site(db_connection, scope.company_code, &fields.site_id)?;
		let asset = Asset {
			id: cuid2::create_id(),
			company_code: scope.company_code.to_string(),
			site_id: fields.site_id,
			name: fields.name,
			asset_type: fields.asset_type,
			manufacturer: fields.manufacturer,
			model: fields.model,
			serial_number: fields.serial_number,
			install_date: fields.install_date,
			warranty_expires: fields.warranty_expires,
			notes: fields.notes,
			created_at: now,
			updated_at: now,
		};
		diesel::insert_into(assets::table).values(&asset).execute(db_connection)?;
		activity::record(
			db_connection,
			scope.company_code,
			Some(scope.actor_id),
			CREATE,
			ENTITY,
			&asset.id,
			format!("Created asset {}", asset.name),
		)?;
		Ok(asset)
	})
}

pub fn update(db_connection: &mut PgConnection, scope: Scope, id: &str, input: &AssetInput) -> AppResult<Asset> {
	let fields = input.validate(Utc::now())?;
	db_connection.transaction(|db_connection| {
		get(db_connection, scope.company_code, id)?;
		check_site(db_connection, scope.company_code, &fields.site_id)?;
		let asset: Asset = diesel::update(assets::table.find(id))
			.set(&fields)
			.get_result(db_connection)?;
		activity::record(
			db_connection,
			scope.company_code,
			Some(scope.actor_id),
			UPDATE,
			ENTITY,
			id,
			format!("Updated asset {}", asset.name),
		)?;
		Ok(asset)
	})
}

pub fn delete(db_connection: &mut PgConnection, scope: Scope, id: &str) -> AppResult<()> {
	db_connection.transaction(|db_connection| {
		let asset = get(db_connection, scope.company_code, id)?;
		diesel::delete(assets::table.find(id)).execute(db_connection)?;
		activity::record(
			db_connection,
			scope.company_code,
			Some(scope.actor_id),
			DELETE,
			ENTITY,
			id,
			format!("Deleted asset {}", asset.name),
		)?;
		Ok(())
	})
}
