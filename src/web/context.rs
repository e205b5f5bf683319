// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Works out who is making a request and which company they're working in.

use super::permissions;
use super::session_key::{ACTIVE_COMPANY, USER_ID};
use crate::database::DbPool;
use crate::domain::enums::UserRole;
use crate::error::{AppError, AppResult};
use crate::model::{Company, Ticket, User};
use crate::store::{Scope, companies, tokens, users};
use axum::extract::{FromRef, FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use tower_sessions::Session;

pub const COMPANY_HEADER: &str = "x-company-code";
pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The authenticated user and the company the request works in.
#[derive(Clone, Debug)]
pub struct RequestContext {
	pub user: User,
	pub company: Company,
}

impl RequestContext {
	pub fn role(&self) -> UserRole {
		self.user.role
	}

	pub fn scope(&self) -> Scope<'_> {
		Scope {
			company_code: &self.company.code,
			actor_id: &self.user.id,
		}
	}

	/// Fails with 403 unless the role check passes.
	pub fn require(&self, check: fn(UserRole) -> bool) -> AppResult<()> {
		if check(self.user.role) {
			Ok(())
		} else {
			Err(AppError::forbidden("your role does not allow this"))
		}
	}

	pub fn can_view_ticket(&self, ticket: &Ticket) -> bool {
		permissions::can_view_ticket(self.user.role, &self.user.id, ticket.assigned_to.as_deref())
	}

	/// The assignee ticket listings must be limited to, if the user can't see every ticket.
	pub fn ticket_restriction(&self) -> Option<String> {
		if permissions::sees_all_tickets(self.user.role) {
			None
		} else {
			Some(self.user.id.clone())
		}
	}
}

fn header_value<'a>(parts: &'a Parts, name: &str) -> AppResult<Option<&'a str>> {
	match parts.headers.get(name) {
		Some(value) => match value.to_str() {
			Ok(value) => Ok(Some(value.trim()).filter(|value| !value.is_empty())),
			Err(_) => Err(AppError::BadRequest(format!("the {} header is not valid text", name))),
		},
		None => Ok(None),
	}
}

/// Identity headers are only accepted when they agree with the authenticated user.
pub fn check_identity_headers(user: &User, claimed_id: Option<&str>, claimed_role: Option<&str>) -> AppResult<()> {
	if let Some(claimed_id) = claimed_id {
		if claimed_id != user.id {
			return Err(AppError::forbidden("x-user-id does not match the authenticated user"));
		}
	}
	if let Some(claimed_role) = claimed_role {
		let matches = claimed_role.parse::<UserRole>().is_ok_and(|role| role == user.role);
		if !matches {
			return Err(AppError::forbidden("x-user-role does not match the authenticated user"));
		}
	}
	Ok(())
}

/// A company code a request asked for, whether it differs from the user's own company, and whether it came
/// from the session rather than the request headers.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CompanyChoice {
	pub code: String,
	pub switched: bool,
	pub from_session: bool,
}

/// Picks the company a request works in. The header wins, then an administrator's session choice, then the
/// user's own company. Only administrators may pick a company other than their own.
pub fn choose_company(
	role: UserRole,
	own_code: &str,
	header: Option<&str>,
	session_choice: Option<&str>,
) -> AppResult<CompanyChoice> {
	let requested = match header {
		Some(code) => Some((code.trim().to_uppercase(), false)),
		None if permissions::can_switch_company(role) => session_choice.map(|code| (code.to_string(), true)),
		None => None,
	};
	match requested {
		Some((code, from_session)) if code != own_code => {
			if !permissions::can_switch_company(role) {
				return Err(AppError::forbidden("you may only work in your own company"));
			}
			Ok(CompanyChoice {
				code,
				switched: true,
				from_session,
			})
		}
		_ => Ok(CompanyChoice {
			code: own_code.to_string(),
			switched: false,
			from_session: false,
		}),
	}
}

/// Whether a company remembered in the session has since disappeared or been deactivated. Such a choice is
/// dropped in favour of the user's own company; an explicit header naming the same company is still refused.
pub fn is_stale_session_choice(choice: &CompanyChoice, company: Option<&Company>) -> bool {
	choice.from_session && choice.switched && !company.is_some_and(|company| company.active)
}

/// Checks the chosen company is usable.
pub fn check_company(role: UserRole, company: Option<Company>, switched: bool) -> AppResult<Company> {
	let Some(company) = company else {
		return Err(AppError::NotFound("company"));
	};
	if !company.active {
		if switched {
			return Err(AppError::NotFound("company"));
		}
		if role != UserRole::Admin {
			return Err(AppError::forbidden("your company has been deactivated"));
		}
	}
	Ok(company)
}

impl<S> FromRequestParts<S> for RequestContext
where
	DbPool: FromRef<S>,
	S: Send + Sync,
{
	type Rejection = AppError;

	async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
		let bearer = <TypedHeader<Authorization<Bearer>> as OptionalFromRequestParts<S>>::from_request_parts(parts, state)
			.await
			.map_err(|_| AppError::Unauthenticated)?;
		let session = parts.extensions.get::<Session>().cloned();

		let (user_id, session) = match (&bearer, session) {
			(Some(_), _) => (None, None),
			(None, Some(session)) => {
				let user_id: Option<String> = session.get(USER_ID).await.map_err(|error| {
					tracing::error!(source = ?error, "Failed to retrieve user ID from session");
					AppError::Internal(String::from("session unavailable"))
				})?;
				let Some(user_id) = user_id else {
					return Err(AppError::Unauthenticated);
				};
				(Some(user_id), Some(session))
			}
			(None, None) => return Err(AppError::Unauthenticated),
		};

		let db_connection_pool = DbPool::from_ref(state);
		let mut db_connection = db_connection_pool.get()?;

		let user = match (&bearer, &user_id) {
			(Some(TypedHeader(authorization)), _) => tokens::find_user(&mut db_connection, authorization.token())?,
			(None, Some(user_id)) => users::find_by_id(&mut db_connection, user_id)?,
			(None, None) => None,
		};
		let Some(user) = user.filter(|user| user.active) else {
			return Err(AppError::Unauthenticated);
		};

		check_identity_headers(
			&user,
			header_value(parts, USER_ID_HEADER)?,
			header_value(parts, USER_ROLE_HEADER)?,
		)?;

		let session_choice: Option<String> = match &session {
			Some(session) => session.get(ACTIVE_COMPANY).await.unwrap_or_else(|error| {
				tracing::warn!(source = ?error, "Couldn't read the active company from the session");
				None
			}),
			None => None,
		};
		let choice = choose_company(
			user.role,
			&user.company_code,
			header_value(parts, COMPANY_HEADER)?,
			session_choice.as_deref(),
		)?;
		let mut company = companies::find(&mut db_connection, &choice.code)?;
		let mut switched = choice.switched;
		if is_stale_session_choice(&choice, company.as_ref()) {
			tracing::info!(user = %user.username, company = %choice.code, "Dropping stale company choice from session");
			if let Some(session) = &session {
				if let Err(error) = session.remove::<String>(ACTIVE_COMPANY).await {
					tracing::warn!(source = ?error, "Couldn't clear the active company from the session");
				}
			}
			company = companies::find(&mut db_connection, &user.company_code)?;
			switched = false;
		}
		let company = check_company(user.role, company, switched)?;

		Ok(Self { user, company })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Utc;

	fn user(role: UserRole) -> User {
		User {
			id: String::from("u1"),
			company_code: String::from("HQ"),
			username: String::from("sam"),
			display_name: String::from("Sam"),
			email: None,
			role,
			password_hash: String::new(),
			active: true,
			created_at: Utc::now(),
		}
	}

	fn company(code: &str, active: bool) -> Company {
		Company {
			code: code.to_string(),
			name: code.to_string(),
			active,
			next_ticket_number: 1,
			created_at: Utc::now(),
		}
	}

	#[test]
	fn identity_headers_must_match() {
		let technician = user(UserRole::Technician);
		assert!(check_identity_headers(&technician, None, None).is_ok());
		assert!(check_identity_headers(&technician, Some("u1"), Some("technician")).is_ok());
		assert!(matches!(
			check_identity_headers(&technician, Some("u2"), None),
			Err(AppError::Forbidden(_))
		));
		assert!(matches!(
			check_identity_headers(&technician, None, Some("Admin")),
			Err(AppError::Forbidden(_))
		));
		assert!(check_identity_headers(&technician, None, Some("wizard")).is_err());
	}

	#[test]
	fn non_admins_stay_in_their_company() {
		let own = choose_company(UserRole::Coordinator, "HQ", Some("hq"), None).unwrap();
		assert_eq!(
			own,
			CompanyChoice {
				code: String::from("HQ"),
				switched: false,
				from_session: false,
			}
		);
		assert!(matches!(
			choose_company(UserRole::Coordinator, "HQ", Some("ACME"), None),
			Err(AppError::Forbidden(_))
		));
		// A stale session choice is ignored for non-admins.
		let own = choose_company(UserRole::Technician, "HQ", None, Some("ACME")).unwrap();
		assert_eq!(own.code, "HQ");
	}

	#[test]
	fn admins_can_switch_companies() {
		let choice = choose_company(UserRole::Admin, "HQ", Some("acme"), Some("OTHER")).unwrap();
		assert_eq!(
			choice,
			CompanyChoice {
				code: String::from("ACME"),
				switched: true,
				from_session: false,
			}
		);
		let choice = choose_company(UserRole::Admin, "HQ", None, Some("OTHER")).unwrap();
		assert_eq!(choice.code, "OTHER");
		assert!(choice.from_session);
		let choice = choose_company(UserRole::Admin, "HQ", None, None).unwrap();
		assert!(!choice.switched);
	}

	#[test]
	fn inactive_companies_are_refused() {
		assert!(matches!(
			check_company(UserRole::Admin, None, true),
			Err(AppError::NotFound(_))
		));
		assert!(matches!(
			check_company(UserRole::Admin, Some(company("ACME", false)), true),
			Err(AppError::NotFound(_))
		));
		assert!(check_company(UserRole::Admin, Some(company("HQ", false)), false).is_ok());
		assert!(matches!(
			check_company(UserRole::Coordinator, Some(company("HQ", false)), false),
			Err(AppError::Forbidden(_))
		));
		assert!(check_company(UserRole::Technician, Some(company("HQ", true)), false).is_ok());
	}

	#[test]
	fn deactivated_session_company_falls_back_to_own() {
		let remembered = choose_company(UserRole::Admin, "HQ", None, Some("OLD")).unwrap();
		assert!(is_stale_session_choice(&remembered, Some(&company("OLD", false))));
		assert!(is_stale_session_choice(&remembered, None));
		assert!(!is_stale_session_choice(&remembered, Some(&company("OLD", true))));

		// Naming the same company explicitly is still an error.
		let requested = choose_company(UserRole::Admin, "HQ", Some("old"), Some("OLD")).unwrap();
		assert!(!is_stale_session_choice(&requested, Some(&company("OLD", false))));
		assert!(matches!(
			check_company(UserRole::Admin, Some(company("OLD", false)), requested.switched),
			Err(AppError::NotFound(_))
		));

		let own = choose_company(UserRole::Admin, "HQ", None, Some("HQ")).unwrap();
		assert!(!is_stale_session_choice(&own, Some(&company("HQ", false))));
	}
}
