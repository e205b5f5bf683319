// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::error::AppResult;
use crate::model::{ApiToken, User};
use crate::schema::{api_tokens, users};
use argon2::password_hash::rand_core::{OsRng, RngCore};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeDelta, Utc};
use diesel::prelude::*;
use sha2::{Digest, Sha256};

/// Makes a new opaque bearer token: 32 random bytes, base64url without padding.
pub fn generate_token() -> String {
	let mut bytes = [0u8; 32];
	OsRng.fill_bytes(&mut bytes);
	URL_SAFE_NO_PAD.encode(bytes)
}

/// The form a token is stored and looked up in.
pub fn hash_token(token: &str) -> String {
	let mut hasher = Sha256::new();
	hasher.update(token.as_bytes());
	hex::encode(hasher.finalize())
}

/// Issues a token for the user. The returned string is the only copy of the raw token.
pub fn issue(
	db_connection: &mut PgConnection,
	user_id: &str,
	lifetime_hours: i64,
) -> AppResult<(String, DateTime<Utc>)> {
	let token = generate_token();
	let now = Utc::now();
	let expires_at = now + TimeDelta::hours(lifetime_hours);
	let record = ApiToken {
		token_hash: hash_token(&token),
		user_id: user_id.to_string(),
		created_at: now,
		expires_at,
	};
	diesel::insert_into(api_tokens::table)
		.values(&record)
		.execute(db_connection)?;
	Ok((token, expires_at))
}

/// Finds the user a presented token belongs to, if the token exists and hasn't expired.
pub fn find_user(db_connection: &mut PgConnection, token: &str) -> AppResult<Option<User>> {
	let user = api_tokens::table
		.inner_join(users::table)
		.filter(api_tokens::token_hash.eq(hash_token(token)))
		.filter(api_tokens::expires_at.gt(Utc::now()))
		.select(users::all_columns)
		.first(db_connection)
		.optional()?;
	Ok(user)
}

pub fn revoke(db_connection: &mut PgConnection, token: &str) -> AppResult<bool> {
	let removed = diesel::delete(api_tokens::table.find(hash_token(token))).execute(db_connection)?;
	Ok(removed > 0)
}

pub fn revoke_all_for_user(db_connection: &mut PgConnection, user_id: &str) -> AppResult<usize> {
	Ok(diesel::delete(api_tokens::table.filter(api_tokens::user_id.eq(user_id))).execute(db_connection)?)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tokens_are_url_safe_and_unique() {
		let first = generate_token();
		let second = generate_token();
		assert_ne!(first, second);
		assert_eq!(first.len(), 43);
		assert!(
			first
				.chars()
				.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
		);
	}

	#[test]
	fn token_hash_is_stable_hex() {
		let hash = hash_token("abc");
		assert_eq!(hash, hash_token("abc"));
		assert_ne!(hash, hash_token("abd"));
		assert_eq!(hash.len(), 64);
		assert_eq!(
			hash,
			"ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
		);
	}
}
