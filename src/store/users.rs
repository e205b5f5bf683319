// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::Scope;
use super::activity::{self, CREATE, DELETE, UPDATE};
use super::tokens;
use crate::domain::deserialize_some;
use crate::domain::enums::UserRole;
use crate::domain::validation::{self, optional_email, required_max};
use crate::error::{AppError, AppResult};
use crate::model::User;
use crate::schema::users;
use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;

const ENTITY: &str = "user";

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
	pub username: String,
	pub display_name: String,
	pub email: Option<String>,
	pub role: UserRole,
	pub password: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserChanges {
	pub display_name: Option<String>,
	#[serde(default, deserialize_with = "deserialize_some")]
	pub email: Option<Option<String>>,
	pub role: Option<UserRole>,
	pub active: Option<bool>,
}

pub fn list(db_connection: &mut PgConnection, company_code: &str) -> AppResult<Vec<User>> {
	let users = users::table
		.filter(users::company_code.eq(company_code))
		.order(users::display_name)
		.load(db_connection)?;
	Ok(users)
}

pub fn get(db_connection: &mut PgConnection, company_code: &str, id: &str) -> AppResult<User> {
	users::table
		.filter(users::id.eq(id).and(users::company_code.eq(company_code)))
		.first(db_connection)
		.optional()?
		.ok_or(AppError::NotFound("user"))
}

/// Looks up a user by ID regardless of company, as authentication needs to.
pub fn find_by_id(db_connection: &mut PgConnection, id: &str) -> AppResult<Option<User>> {
	Ok(users::table.find(id).first(db_connection).optional()?)
}

pub fn find_by_username(db_connection: &mut PgConnection, username: &str) -> AppResult<Option<User>> {
	let username = username.trim().to_lowercase();
	Ok(users::table
		.filter(users::username.eq(username))
		.first(db_connection)
		.optional()?)
}

/// Creates a user in the scoped company. The password must already be validated and hashed.
pub fn create(
	db_connection: &mut PgConnection,
	scope: Scope,
	input: &NewUser,
	password_hash: String,
) -> AppResult<User> {
	let username = validation::username(&input.username)?;
	let display_name = required_max("displayName", &input.display_name, 200)?;
	let email = optional_email("email", input.email.as_deref())?;

	db_connection.transaction(|db_connection| {
		if find_by_username(db_connection, &username)?.is_some() {
			return Err(AppError::Conflict(format!("username {} is already taken", username)));
		}
		let user = User {
			id: cuid2::create_id(),
			company_code: scope.company_code.to_string(),
			username,
			display_name,
			email,
			role: input.role,
			password_hash,
			active: true,
			created_at: Utc::now(),
		};
		diesel::insert_into(users::table).values(&user).execute(db_connection)?;
		activity::record(
			db_connection,
			scope.company_code,
			Some(scope.actor_id),
			CREATE,
			ENTITY,
			&user.id,
			format!("Created {} {}", user.role, user.username),
		)?;
		Ok(user)
	})
}

pub fn update(db_connection: &mut PgConnection, scope: Scope, id: &str, changes: &UserChanges) -> AppResult<User> {
	let display_name = match &changes.display_name {
		Some(name) => Some(required_max("displayName", name, 200)?),
		None => None,
	};
	let email = match &changes.email {
		Some(email) => Some(optional_email("email", email.as_deref())?),
		None => None,
	};
	if id == scope.actor_id && (changes.active == Some(false) || changes.role.is_some_and(|role| role != UserRole::Admin))
	{
		return Err(AppError::forbidden("you cannot demote or deactivate your own account"));
	}

	db_connection.transaction(|db_connection| {
		let mut user = get(db_connection, scope.company_code, id)?;
		if let Some(display_name) = display_name {
			user.display_name = display_name;
		}
		if let Some(email) = email {
			user.email = email;
		}
		if let Some(role) = changes.role {
			user.role = role;
		}
		if let Some(active) = changes.active {
			user.active = active;
		}
		diesel::update(users::table.find(id))
			.set((
				users::display_name.eq(&user.display_name),
				users::email.eq(&user.email),
				users::role.eq(user.role),
				users::active.eq(user.active),
			))
			.execute(db_connection)?;
		if !user.active {
			tokens::revoke_all_for_user(db_connection, id)?;
		}
		activity::record(
			db_connection,
			scope.company_code,
			Some(scope.actor_id),
			UPDATE,
			ENTITY,
			id,
			format!("Updated user {}", user.username),
		)?;
		Ok(user)
	})
}

/// Users are never removed, as tickets and audit entries keep pointing at them. Deactivating also revokes their
/// API tokens.
pub fn deactivate(db_connection: &mut PgConnection, scope: Scope, id: &str) -> AppResult<User> {
	if id == scope.actor_id {
		return Err(AppError::forbidden("you cannot deactivate your own account"));
	}
	db_connection.transaction(|db_connection| {
		let mut user = get(db_connection, scope.company_code, id)?;
		diesel::update(users::table.find(id))
			.set(users::active.eq(false))
			.execute(db_connection)?;
		let revoked = tokens::revoke_all_for_user(db_connection, id)?;
		user.active = false;
		activity::record(
			db_connection,
			scope.company_code,
			Some(scope.actor_id),
			DELETE,
			ENTITY,
			id,
			format!("Deactivated user {} and revoked {} tokens", user.username, revoked),
		)?;
		Ok(user)
	})
}

/// Replaces a user's password and revokes their API tokens.
pub fn set_password_hash(
	db_connection: &mut PgConnection,
	scope: Scope,
	id: &str,
	password_hash: String,
) -> AppResult<()> {
	db_connection.transaction(|db_connection| {
		let user = get(db_connection, scope.company_code, id)?;
		diesel::update(users::table.find(id))
			.set(users::password_hash.eq(password_hash))
			.execute(db_connection)?;
		let revoked = tokens::revoke_all_for_user(db_connection, id)?;
		activity::record(
			db_connection,
			scope.company_code,
			Some(scope.actor_id),
			UPDATE,
			ENTITY,
			id,
			format!("Changed password for {} and revoked {} tokens", user.username, revoked),
		)?;
		Ok(())
	})
}
