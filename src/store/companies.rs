// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::activity::{self, CREATE, UPDATE};
use crate::domain::validation::{self, required_max};
use crate::error::{AppError, AppResult};
use crate::model::Company;
use crate::schema::companies;
use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;

const ENTITY: &str = "company";

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCompany {
	pub code: String,
	pub name: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyChanges {
	pub name: Option<String>,
	pub active: Option<bool>,
}

pub fn list(db_connection: &mut PgConnection) -> AppResult<Vec<Company>> {
	Ok(companies::table.order(companies::code).load(db_connection)?)
}

pub fn find(db_connection: &mut PgConnection, code: &str) -> AppResult<Option<Company>> {
	Ok(companies::table.find(code).first(db_connection).optional()?)
}

pub fn get(db_connection: &mut PgConnection, code: &str) -> AppResult<Company> {
	find(db_connection, code)?.ok_or(AppError::NotFound("company"))
}

pub fn create(db_connection: &mut PgConnection, actor_id: &str, input: &NewCompany) -> AppResult<Company> {
	let code = validation::company_code(&input.code)?;
	let name = required_max("name", &input.name, 200)?;

	db_connection.transaction(|db_connection| {
		if find(db_connection, &code)?.is_some() {
			return Err(AppError::Conflict(format!("company code {} is already in use", code)));
		}
		let company = Company {
			code,
			name,
			active: true,
			next_ticket_number: 1,
			created_at: Utc::now(),
		};
		diesel::insert_into(companies::table)
			.values(&company)
			.execute(db_connection)?;
		activity::record(
			db_connection,
			&company.code,
			Some(actor_id),
			CREATE,
			ENTITY,
			&company.code,
			format!("Created company {}", company.name),
		)?;
		Ok(company)
	})
}

pub fn update(
	db_connection: &mut PgConnection,
	actor_id: &str,
	code: &str,
	changes: &CompanyChanges,
) -> AppResult<Company> {
	let name = match &changes.name {
		Some(name) => Some(required_max("name", name, 200)?),
		None => None,
	};

	db_connection.transaction(|db_connection| {
		let mut company = get(db_connection, code)?;
		if let Some(name) = name {
			company.name = name;
		}
		if let Some(active) = changes.active {
			company.active = active;
		}
		diesel::update(companies::table.find(code))
			.set((companies::name.eq(&company.name), companies::active.eq(company.active)))
			.execute(db_connection)?;
		activity::record(
			db_connection,
			code,
			Some(actor_id),
			UPDATE,
			ENTITY,
			code,
			format!(
				"Updated company {} ({})",
				company.name,
				if company.active { "active" } else { "inactive" }
			),
		)?;
		Ok(company)
	})
}
