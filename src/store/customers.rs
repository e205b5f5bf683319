// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::Scope;
use super::activity::{self, CREATE, DELETE, UPDATE};
use crate::domain::validation::{ValidationResult, optional_email, optional_text, required_max};
use crate::error::{AppError, AppResult};
use crate::model::Customer;
use crate::schema::customers;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Deserialize;

const ENTITY: &str = "customer";

/// Submitted customer fields, for both creating and replacing a customer.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
	pub name: String,
	pub contact_name: Option<String>,
	pub contact_email: Option<String>,
	pub contact_phone: Option<String>,
	pub address: Option<String>,
	pub notes: Option<String>,
}

#[derive(AsChangeset)]
#[diesel(table_name = customers, treat_none_as_null = true)]
struct CustomerFields {
	name: String,
	contact_name: Option<String>,
	contact_email: Option<String>,
	contact_phone: Option<String>,
	address: Option<String>,
	notes: Option<String>,
	updated_at: DateTime<Utc>,
}

impl CustomerInput {
	fn validate(&self, now: DateTime<Utc>) -> ValidationResult<CustomerFields> {
		Ok(CustomerFields {
			name: required_max("name", &self.name, 200)?,
			contact_name: optional_text(self.contact_name.as_deref()),
			contact_email: optional_email("contactEmail", self.contact_email.as_deref())?,
			contact_phone: optional_text(self.contact_phone.as_deref()),
			address: optional_text(self.address.as_deref()),
			notes: optional_text(self.notes.as_deref()),
			updated_at: now,
		})
	}
}

pub fn list(db_connection: &mut PgConnection, company_code: &str) -> AppResult<Vec<Customer>> {
	let customers = customers::table
		.filter(customers::company_code.eq(company_code))
		.order(customers::name)
		.load(db_connection)?;
	Ok(customers)
}

pub fn find(db_connection: &mut PgConnection, company_code: &str, id: &str) -> AppResult<Option<Customer>> {
	let customer = customers::table
		.filter(customers::id.eq(id).and(customers::company_code.eq(company_code)))
		.first(db_connection)
		.optional()?;
	Ok(customer)
}

pub fn get(db_connection: &mut PgConnection, company_code: &str, id: &str) -> AppResult<Customer> {
	find(db_connection, company_code, id)?.ok_or(AppError::NotFound("customer"))
}

pub fn create(db_connection: &mut PgConnection, scope: Scope, input: &CustomerInput) -> AppResult<Customer> {
	let now = Utc::now();
	let fields = input.validate(now)?;
	let customer = Customer {
		id: cuid2::create_id(),
		company_code: scope.company_code.to_string(),
		name: fields.name,
		contact_name: fields.contact_name,
		contact_email: fields.contact_email,
		contact_phone: fields.contact_phone,
		address: fields.address,
		notes: fields.notes,
		created_at: now,
		updated_at: now,
	};
	db_connection.transaction(|db_connection| {
		diesel::insert_into(customers::table)
			.values(&customer)
			.execute(db_connection)?;
		activity::record(
			db_connection,
			scope.company_code,
			Some(scope.actor_id),
			CREATE,
			ENTITY,
			&customer.id,
			format!("Created customer {}", customer.name),
		)?;
		Ok(customer)
	})
}

pub fn update(db_connection: &mut PgConnection, scope: Scope, id: &str, input: &CustomerInput) -> AppResult<Customer> {
	let fields = input.validate(Utc::now())?;
	db_connection.transaction(|db_connection| {
		get(db_connection, scope.company_code, id)?;
		let customer: Customer = diesel::update(customers::table.find(id))
			.set(&fields)
			.get_result(db_connection)?;
		activity::record(
			db_connection,
			scope.company_code,
			Some(scope.actor_id),
			UPDATE,
			ENTITY,
			id,
			format!("Updated customer {}", customer.name),
		)?;
		Ok(customer)
	})
}

/// Deleting a customer that sites, tickets or licenses still point to is a conflict.
pub fn delete(db_connection: &mut PgConnection, scope: Scope, id: &str) -> AppResult<()> {
	db_connection.transaction(|db_connection| {
		let customer = get(db_connection, scope.company_code, id)?;
		diesel::delete(customers::table.find(id)).execute(db_connection)?;
		activity::record(
			db_connection,
			scope.company_code,
			Some(scope.actor_id),
			DELETE,
			ENTITY,
			id,
			format!("Deleted customer {}", customer.name),
		)?;
		Ok(())
	})
}
