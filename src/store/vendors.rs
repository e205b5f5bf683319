// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::Scope;
use super::activity::{self, CREATE, DELETE, UPDATE};
use crate::domain::validation::{ValidationResult, optional_email, optional_text, required_max};
use crate::error::{AppError, AppResult};
use crate::model::Vendor;
use crate::schema::vendors;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Deserialize;

const ENTITY: &str = "vendor";

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorInput {
	pub name: String,
	pub contact_name: Option<String>,
	pub email: Option<String>,
	pub phone: Option<String>,
	pub service_area: Option<String>,
	pub notes: Option<String>,
	/// Vendors start out active when this is left out.
	pub active: Option<bool>,
}

#[derive(AsChangeset)]
#[diesel(table_name = vendors, treat_none_as_null = true)]
struct VendorFields {
	name: String,
	contact_name: Option<String>,
	email: Option<String>,
	phone: Option<String>,
	service_area: Option<String>,
	notes: Option<String>,
	active: bool,
	updated_at: DateTime<Utc>,
}

impl VendorInput {
	fn validate(&self, now: DateTime<Utc>) -> ValidationResult<VendorFields> {
		Ok(VendorFields {
			name: required_max("name", &self.name, 200)?,
			contact_name: optional_text(self.contact_name.as_deref()),
			email: optional_email("email", self.email.as_deref())?,
			phone: optional_text(self.phone.as_deref()),
			service_area: optional_text(self.service_area.as_deref()),
			notes: optional_text(self.notes.as_deref()),
			active: self.active.unwrap_or(true),
			updated_at: now,
		})
	}
}

pub fn list(db_connection: &mut PgConnection, company_code: &str) -> AppResult<Vec<Vendor>> {
	let vendors = vendors::table
		.filter(vendors::company_code.eq(company_code))
		.order(vendors::name)
		.load(db_connection)?;
	Ok(vendors)
}

pub fn find(db_connection: &mut PgConnection, company_code: &str, id: &str) -> AppResult<Option<Vendor>> {
	let vendor = vendors::table
		.filter(vendors::id.eq(id).and(vendors::company_code.eq(company_code)))
		.first(db_connection)
		.optional()?;
	Ok(vendor)
}

pub fn get(db_connection: &mut PgConnection, company_code: &str, id: &str) -> AppResult<Vendor> {
	find(db_connection, company_code, id)?.ok_or(AppError::NotFound("vendor"))
}

pub fn create(db_connection: &mut PgConnection, scope: Scope, input: &VendorInput) -> AppResult<Vendor> {
	let now = Utc::now();
	let fields = input.validate(now)?;
	let vendor = Vendor {
		id: cuid2::create_id(),
		company_code: scope.company_code.to_string(),
		name: fields.name,
		contact_name: fields.contact_name,
		email: fields.email,
		phone: fields.phone,
		service_area: fields.service_area,
		notes: fields.notes,
		active: fields.active,
		created_at: now,
		updated_at: now,
	};
	db_connection.transaction(|db_connection| {
		diesel::insert_into(vendors::table).values(&vendor).execute(db_connection)?;
		activity::record(
			db_connection,
			scope.company_code,
			Some(scope.actor_id),
			CREATE,
			ENTITY,
			&vendor.id,
			format!("Created vendor {}", vendor.name),
		)?;
		Ok(vendor)
	})
}

pub fn update(db_connection: &mut PgConnection, scope: Scope, id: &str, input: &VendorInput) -> AppResult<Vendor> {
	let fields = input.validate(Utc::now())?;
	db_connection.transaction(|db_connection| {
		get(db_connection, scope.company_code, id)?;
		let vendor: Vendor = diesel::update(vendors::table.find(id))
			.set(&fields)
			.get_result(db_connection)?;
		activity::record(
			db_connection,
			scope.company_code,
			Some(scope.actor_id),
			UPDATE,
			ENTITY,
			id,
			format!("Updated vendor {}", vendor.name),
		)?;
		Ok(vendor)
	})
}

pub fn delete(db_connection: &mut PgConnection, scope: Scope, id: &str) -> AppResult<()> {
	db_connection.transaction(|db_connection| {
		let vendor = get(db_connection, scope.company_code, id)?;
		diesel::delete(vendors::table.find(id)).execute(db_connection)?;
		activity::record(
			db_connection,
			scope.company_code,
			Some(scope.actor_id),
			DELETE,
			ENTITY,
			id,
			format!("Deleted vendor {}", vendor.name),
		)?;
		Ok(())
	})
}
