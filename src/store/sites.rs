// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::activity::{self, CREATE, DELETE, UPDATE};
use super::{Scope, customers};
use crate::domain::validation::{ValidationError, ValidationResult, optional_text, required, required_max};
use crate::error::{AppError, AppResult};
use crate::model::Site;
use crate::schema::sites;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Deserialize;

const ENTITY: &str = "site";

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteInput {
	pub customer_id: String,
	pub name: String,
	pub address: Option<String>,
	pub city: Option<String>,
	pub region: Option<String>,
	pub postal_code: Option<String>,
	pub latitude: Option<String>,
	pub longitude: Option<String>,
	pub notes: Option<String>,
}

#[derive(AsChangeset)]
#[diesel(table_name = sites, treat_none_as_null = true)]
struct SiteFields {
	customer_id: String,
	name: String,
	address: Option<String>,
	city: Option<String>,
	region: Option<String>,
	postal_code: Option<String>,
	latitude: Option<String>,
	longitude: Option<String>,
	notes: Option<String>,
	updated_at: DateTime<Utc>,
}

impl SiteInput {
	fn validate(&self, now: DateTime<Utc>) -> ValidationResult<SiteFields> {
		Ok(SiteFields {
			customer_id: required("customerId", &self.customer_id)?,
			name: required_max("name", &self.name, 200)?,
			address: optional_text(self.address.as_deref()),
			city: optional_text(self.city.as_deref()),
			region: optional_text(self.region.as_deref()),
			postal_code: optional_text(self.postal_code.as_deref()),
			latitude: optional_text(self.latitude.as_deref()),
			longitude: optional_text(self.longitude.as_deref()),
			notes: optional_text(self.notes.as_deref()),
			updated_at: now,
		})
	}
}

fn check_customer(db_connection: &mut PgConnection, company_code: &str, customer_id: &str) -> AppResult<()> {
	if customers::find(db_connection, company_code, customer_id)?.is_none() {
		return Err(ValidationError::new("customerId", "does not name a customer of this company").into());
	}
	Ok(())
}

pub fn list(db_connection: &mut PgConnection, company_code: &str, customer_id: Option<&str>) -> AppResult<Vec<Site>> {
	let mut query = sites::table.filter(sites::company_code.eq(company_code)).into_boxed();
	if let Some(customer_id) = customer_id {
		query = query.filter(sites::customer_id.eq(customer_id));
	}
	Ok(query.order(sites::name).load(db_connection)?)
}

pub fn find(db_connection: &mut PgConnection, company_code: &str, id: &str) -> AppResult<Option<Site>> {
	let site = sites::table
		.filter(sites::id.eq(id).and(sites::company_code.eq(company_code)))
		.first(db_connection)
		.optional()?;
	Ok(site)
}

pub fn get(db_connection: &mut PgConnection, company_code: &str, id: &str) -> AppResult<Site> {
	find(db_connection, company_code, id)?.ok_or(AppError::NotFound("site"))
}

pub fn create(db_connection: &mut PgConnection, scope: Scope, input: &SiteInput) -> AppResult<Site> {
	let now = Utc::now();
	let fields = input.validate(now)?;
	db_connection.transaction(|db_connection| {
		check_customer(db_connection, scope.company_code, &fields.customer_id)?;
		let site = Site {
			id: cuid2::create_id(),
			company_code: scope.company_code.to_string(),
			customer_id: fields.customer_id,
			name: fields.name,
			address: fields.address,
			city: fields.city,
			region: fields.region,
			postal_code: fields.postal_code,
			latitude: fields.latitude,
			longitude: fields.longitude,
			notes: fields.notes,
			created_at: now,
			updated_at: now,
		};
		diesel::insert_into(sites::table).values(&site).execute(db_connection)?;
		activity::record(
			db_connection,
			scope.company_code,
			Some(scope.actor_id),
			CREATE,
			ENTITY,
			&site.id,
			format!("Created site {}", site.name),
		)?;
		Ok(site)
	})
}

pub fn update(db_connection: &mut PgConnection, scope: Scope, id: &str, input: &SiteInput) -> AppResult<Site> {
	let fields = input.validate(Utc::now())?;
	db_connection.transaction(|db_connection| {
		get(db_connection, scope.company_code, id)?;
		check_customer(db_connection, scope.company_code, &fields.customer_id)?;
		let site: Site = diesel::update(sites::table.find(id))
			.set(&fields)
			.get_result(db_connection)?;
		activity::record(
			db_connection,
			scope.company_code,
			Some(scope.actor_id),
			UPDATE,
			ENTITY,
			id,
			format!("Updated site {}", site.name),
		)?;
		Ok(site)
	})
}

pub fn delete(db_connection: &mut PgConnection, scope: Scope, id: &str) -> AppResult<()> {
	db_connection.transaction(|db_connection| {
		let site = get(db_connection, scope.company_code, id)?;
		diesel::delete(sites::table.find(id)).execute(db_connection)?;
		activity::record(
			db_connection,
			scope.company_code,
			Some(scope.actor_id),
			DELETE,
			ENTITY,
			id,
			format!("Deleted site {}", site.name),
		)?;
		Ok(())
	})
}
