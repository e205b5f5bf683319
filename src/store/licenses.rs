// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::activity::{self, CREATE, DELETE, UPDATE};
use super::{Scope, customers, vendors};
use crate::domain::validation::{ValidationError, ValidationResult, optional_text, required_max};
use crate::error::{AppError, AppResult};
use crate::model::License;
use crate::schema::licenses;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use diesel::prelude::*;
use serde::Deserialize;

const ENTITY: &str = "license";

pub const DEFAULT_EXPIRY_WINDOW_DAYS: i64 = 30;
pub const MAX_EXPIRY_WINDOW_DAYS: i64 = 3650;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseInput {
	pub product: String,
	pub vendor_id: Option<String>,
	pub customer_id: Option<String>,
	pub license_key: Option<String>,
	pub seats: Option<i32>,
	pub expires_on: Option<NaiveDate>,
	pub notes: Option<String>,
}

#[derive(AsChangeset)]
#[diesel(table_name = licenses, treat_none_as_null = true)]
struct LicenseFields {
	product: String,
	vendor_id: Option<String>,
	customer_id: Option<String>,
	license_key: Option<String>,
	seats: i32,
	expires_on: Option<NaiveDate>,
	notes: Option<String>,
	updated_at: DateTime<Utc>,
}

impl LicenseInput {
	fn validate(&self, now: DateTime<Utc>) -> ValidationResult<LicenseFields> {
		let seats = self.seats.unwrap_or(1);
		if seats < 1 {
			return Err(ValidationError::new("seats", "must be at least 1"));
		}
		Ok(LicenseFields {
			product: required_max("product", &self.product, 200)?,
			vendor_id: optional_text(self.vendor_id.as_deref()),
			customer_id: optional_text(self.customer_id.as_deref()),
			license_key: optional_text(self.license_key.as_deref()),
			seats,
			expires_on: self.expires_on,
			notes: optional_text(self.notes.as_deref()),
			updated_at: now,
		})
	}
}

fn check_references(db_connection: &mut PgConnection, company_code: &str, fields: &LicenseFields) -> AppResult<()> {
	if let Some(vendor_id) = &fields.vendor_id {
		if vendors::find(db_connection, company_code, vendor_id)?.is_none() {
			return Err(ValidationError::new("vendorId", "does not name a vendor of this company").into());
		}
	}
	if let Some(customer_id) = &fields.customer_id {
		if customers::find(db_connection, company_code, customer_id)?.is_none() {
			return Err(ValidationError::new("customerId", "does not name a customer of this company").into());
		}
	}
	Ok(())
}

/// The last expiry date included when looking `days` ahead of `today`.
pub fn expiry_horizon(today: NaiveDate, days: i64) -> ValidationResult<NaiveDate> {
	if !(0..=MAX_EXPIRY_WINDOW_DAYS).contains(&days) {
		return Err(ValidationError::new(
			"days",
			format!("must be between 0 and {}", MAX_EXPIRY_WINDOW_DAYS),
		));
	}
	Ok(today + TimeDelta::days(days))
}

pub fn list(db_connection: &mut PgConnection, company_code: &str) -> AppResult<Vec<License>> {
	let licenses = licenses::table
		.filter(licenses::company_code.eq(company_code))
		.order((licenses::product, licenses::id))
		.load(db_connection)?;
	Ok(licenses)
}

/// Licenses expiring on or before the horizon, soonest first. Ones that have already lapsed are included.
pub fn expiring(db_connection: &mut PgConnection, company_code: &str, horizon: NaiveDate) -> AppResult<Vec<License>> {
	let licenses = licenses::table
		.filter(licenses::company_code.eq(company_code))
		.filter(licenses::expires_on.le(horizon))
		.order((licenses::expires_on, licenses::product))
		.load(db_connection)?;
	Ok(licenses)
}

pub fn get(db_connection: &mut PgConnection, company_code: &str, id: &str) -> AppResult<License> {
	licenses::table
		.filter(licenses::id.eq(id).and(licenses::company_code.eq(company_code)))
		.first(db_connection)
		.optional()?
		.ok_or(AppError::NotFound("license"))
}

pub fn create(db_connection: &mut PgConnection, scope: Scope, input: &LicenseInput) -> AppResult<License> {
	let now = Utc::now();
	let fields = input.validate(now)?;
	db_connection.transaction(|db_connection| {
		check_references(db_connection, scope.company_code, &fields)?;
		let license = License {
			id: cuid2::create_id(),
			company_code: scope.company_code.to_string(),
			product: fields.product,
			vendor_id: fields.vendor_id,
			customer_id: fields.customer_id,
			license_key: fields.license_key,
			seats: fields.seats,
			expires_on: fields.expires_on,
			notes: fields.notes,
			created_at: now,
			updated_at: now,
		};
		diesel::insert_into(licenses::table)
			.values(&license)
			.execute(db_connection)?;
		activity::record(
			db_connection,
			scope.company_code,
			Some(scope.actor_id),
			CREATE,
			ENTITY,
			&license.id,
			format!("Created license {}", license.product),
		)?;
		Ok(license)
	})
}

pub fn update(db_connection: &mut PgConnection, scope: Scope, id: &str, input: &LicenseInput) -> AppResult<License> {
	let fields = input.validate(Utc::now())?;
	db_connection.transaction(|db_connection| {
		get(db_connection, scope.company_code, id)?;
		check_references(db_connection, scope.company_code, &fields)?;
		let license: License = diesel::update(licenses::table.find(id))
			.set(&fields)
			.get_result(db_connection)?;
		activity::record(
			db_connection,
			scope.company_code,
			Some(scope.actor_id),
			UPDATE,
			ENTITY,
			id,
			format!("Updated license {}", license.product),
		)?;
		Ok(license)
	})
}

pub fn delete(db_connection: &mut PgConnection, scope: Scope, id: &str) -> AppResult<()> {
	db_connection.transaction(|db_connection| {
		let license = get(db_connection, scope.company_code, id)?;
		diesel::delete(licenses::table.find(id)).execute(db_connection)?;
		activity::record(
			db_connection,
			scope.company_code,
			Some(scope.actor_id),
			DELETE,
			ENTITY,
			id,
			format!("Deleted license {}", license.product),
		)?;
		Ok(())
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn expiry_horizon_is_bounded() {
		let today = NaiveDate::from_ymd_opt(2025, 1, 30).unwrap();
		assert_eq!(
			expiry_horizon(today, DEFAULT_EXPIRY_WINDOW_DAYS).unwrap(),
			NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
		);
		assert_eq!(expiry_horizon(today, 0).unwrap(), today);
		assert!(expiry_horizon(today, -1).is_err());
		assert!(expiry_horizon(today, MAX_EXPIRY_WINDOW_DAYS + 1).is_err());
	}

	#[test]
	fn seats_must_be_positive() {
		let input = LicenseInput {
			product: String::from("Monitoring"),
			seats: Some(0),
			..LicenseInput::default()
		};
		assert_eq!(input.validate(Utc::now()).err().unwrap().field, "seats");
		let input = LicenseInput {
			product: String::from("Monitoring"),
			..LicenseInput::default()
		};
		assert_eq!(input.validate(Utc::now()).ok().unwrap().seats, 1);
	}
}
