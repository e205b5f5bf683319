// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::session_key::{ACTIVE_COMPANY, LOGIN_RETURN_PATH, USER_ID};
use super::state::AppState;
use crate::domain::enums::UserRole;
use crate::error::AppResult;
use crate::model::User;
use crate::store::{companies, users};
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::Form;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use diesel::PgConnection;
use serde::Deserialize;
use tower_sessions::Session;

#[derive(Debug, thiserror::Error)]
#[error("password hashing failed: {0}")]
pub struct PasswordHashError(String);

fn peppered(password: &str, pepper: Option<&str>) -> String {
	match pepper {
		Some(pepper) => format!("{}{}", pepper, password),
		None => password.to_string(),
	}
}

/// Hashes a password into an Argon2id PHC string. The pepper, if any, is prepended first.
pub fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, PasswordHashError> {
	let salt = SaltString::generate(&mut OsRng);
	Argon2::default()
		.hash_password(peppered(password, pepper).as_bytes(), &salt)
		.map(|hash| hash.to_string())
		.map_err(|error| PasswordHashError(error.to_string()))
}

/// Checks a password against a stored hash. A malformed stored hash never matches.
pub fn verify_password(password: &str, hash: &str, pepper: Option<&str>) -> bool {
	let parsed_hash = match PasswordHash::new(hash) {
		Ok(hash) => hash,
		Err(error) => {
			tracing::warn!(source = ?error, "Stored password hash is malformed");
			return false;
		}
	};
	Argon2::default()
		.verify_password(peppered(password, pepper).as_bytes(), &parsed_hash)
		.is_ok()
}

/// Checks a username and password, returning the user if they may sign in.
///
/// Unknown users, wrong passwords, deactivated users and non-admins of deactivated companies all fail the same way.
pub fn authenticate(
	db_connection: &mut PgConnection,
	username: &str,
	password: &str,
	pepper: Option<&str>,
) -> AppResult<Option<User>> {
	let Some(user) = users::find_by_username(db_connection, username)? else {
		return Ok(None);
	};
	if !user.active || !verify_password(password, &user.password_hash, pepper) {
		return Ok(None);
	}
	if user.role != UserRole::Admin {
		let company_active = companies::find(db_connection, &user.company_code)?.is_some_and(|company| company.active);
		if !company_active {
			return Ok(None);
		}
	}
	Ok(Some(user))
}

/// Paths reachable without a login session: the login flow itself, the JSON API (which authenticates on its own),
/// the public intake form and static files.
fn is_public_path(path: &str) -> bool {
	const PUBLIC_PREFIXES: [&str; 5] = ["/api/", "/auth/", "/public/", "/pkg/", "/login"];
	if PUBLIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
		return true;
	}
	path.rsplit('/').next().is_some_and(|segment| segment.contains('.'))
}

/// Only local paths are accepted as a place to return to after logging in.
fn safe_return_path(path: Option<String>) -> String {
	match path {
		Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
		_ => String::from("/"),
	}
}

/// Axum layer function for page logins. Sends requests without a logged-in session to the login page, remembering
/// where they were going.
pub async fn login_redirect_layer(session: Session, request: Request, next: Next) -> Response {
	if is_public_path(request.uri().path()) {
		return next.run(request).await;
	}

	let user_id: Option<String> = match session.get(USER_ID).await {
		Ok(id) => id,
		Err(error) => {
			tracing::error!(source = ?error, "Failed to retrieve user ID from session");
			return StatusCode::INTERNAL_SERVER_ERROR.into_response();
		}
	};

	if user_id.is_none() {
		let request_path_with_query = request
			.uri()
			.path_and_query()
			.map(|path_and_query| path_and_query.as_str().to_string())
			.unwrap_or_default();
		if let Err(error) = session.insert(LOGIN_RETURN_PATH, request_path_with_query).await {
			tracing::error!(source = ?error, "Failed to set login return path to session");
			return StatusCode::INTERNAL_SERVER_ERROR.into_response();
		}
		return Redirect::to("/login").into_response();
	}

	next.run(request).await
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
	username: String,
	password: String,
}

/// Route function for the login form
pub async fn login_route(session: Session, State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
	let mut db_connection = match state.db_connection_pool.get() {
		Ok(connection) => connection,
		Err(error) => {
			tracing::error!(source = ?error, "Failed to get a database connection for login");
			return StatusCode::INTERNAL_SERVER_ERROR.into_response();
		}
	};

	let pepper = state.config.auth.pepper.as_deref();
	let user = match authenticate(&mut db_connection, &form.username, &form.password, pepper) {
		Ok(user) => user,
		Err(error) => return error.into_response(),
	};
	let Some(user) = user else {
		tracing::info!(username = %form.username, "Failed login");
		return Redirect::to("/login?failed=true").into_response();
	};

	let return_path: Option<String> = match session.remove(LOGIN_RETURN_PATH).await {
		Ok(path) => path,
		Err(error) => {
			tracing::error!(source = ?error, "Failed to get login return path");
			return StatusCode::INTERNAL_SERVER_ERROR.into_response();
		}
	};

	if let Err(error) = session.cycle_id().await {
		tracing::error!(source = ?error, "Failed to renew session ID on login");
		return StatusCode::INTERNAL_SERVER_ERROR.into_response();
	}
	if let Err(error) = session.remove::<String>(ACTIVE_COMPANY).await {
		tracing::error!(source = ?error, "Failed to reset active company on login");
		return StatusCode::INTERNAL_SERVER_ERROR.into_response();
	}
	if let Err(error) = session.insert(USER_ID, &user.id).await {
		tracing::error!(source = ?error, "Failed to store user ID");
		return StatusCode::INTERNAL_SERVER_ERROR.into_response();
	}

	tracing::info!(user = %user.id, username = %user.username, "Logged in");
	Redirect::to(&safe_return_path(return_path)).into_response()
}

/// Route function for logging out
pub async fn logout_route(session: Session) -> Response {
	if let Err(error) = session.flush().await {
		tracing::error!(source = ?error, "Failed to clear session on logout");
		return StatusCode::INTERNAL_SERVER_ERROR.into_response();
	}
	Redirect::to("/login").into_response()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn passwords_verify_with_matching_pepper() {
		let hash = hash_password("correct horse", Some("pepper!")).unwrap();
		assert!(hash.starts_with("$argon2id$"));
		assert!(verify_password("correct horse", &hash, Some("pepper!")));
		assert!(!verify_password("correct horse", &hash, None));
		assert!(!verify_password("wrong horse", &hash, Some("pepper!")));
	}

	#[test]
	fn malformed_hashes_never_match() {
		assert!(!verify_password("anything", "not-a-hash", None));
	}

	#[test]
	fn public_paths_skip_the_login_redirect() {
		assert!(is_public_path("/api/tickets"));
		assert!(is_public_path("/login"));
		assert!(is_public_path("/pkg/fieldline.js"));
		assert!(is_public_path("/favicon.ico"));
		assert!(!is_public_path("/"));
		assert!(!is_public_path("/tickets/abc"));
	}

	#[test]
	fn only_local_return_paths_are_followed() {
		assert_eq!(safe_return_path(Some(String::from("/tickets?status=Open"))), "/tickets?status=Open");
		assert_eq!(safe_return_path(Some(String::from("//evil.example"))), "/");
		assert_eq!(safe_return_path(Some(String::from("https://evil.example"))), "/");
		assert_eq!(safe_return_path(None), "/");
	}
}
