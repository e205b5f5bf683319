// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Serialize};

/// A business rule a submitted record broke.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
	pub field: String,
	pub message: String,
}

impl ValidationError {
	pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			field: field.into(),
			message: message.into(),
		}
	}
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trims the value and rejects it if nothing is left.
pub fn required(field: &str, value: &str) -> ValidationResult<String> {
	let trimmed = value.trim();
	if trimmed.is_empty() {
		return Err(ValidationError::new(field, "is required"));
	}
	Ok(trimmed.to_string())
}

/// Like [required], also enforcing a maximum length in characters.
pub fn required_max(field: &str, value: &str, max_chars: usize) -> ValidationResult<String> {
	let value = required(field, value)?;
	if value.chars().count() > max_chars {
		return Err(ValidationError::new(
			field,
			format!("must be at most {} characters", max_chars),
		));
	}
	Ok(value)
}

/// Trims an optional text field; blank input is stored as nothing.
pub fn optional_text(value: Option<&str>) -> Option<String> {
	value.map(str::trim).filter(|value| !value.is_empty()).map(String::from)
}

/// A loose shape check: one `@`, something before it and a dotted domain after it.
pub fn email(field: &str, value: &str) -> ValidationResult<String> {
	let value = value.trim();
	let valid = match value.split_once('@') {
		Some((local, domain)) => {
			!local.is_empty()
				&& !domain.contains('@')
				&& domain.contains('.')
				&& !domain.starts_with('.')
				&& !domain.ends_with('.')
				&& !value.contains(char::is_whitespace)
		}
		None => false,
	};
	if valid {
		Ok(value.to_string())
	} else {
		Err(ValidationError::new(field, "is not a valid email address"))
	}
}

/// Optional email: blank is fine, anything else must look like an address.
pub fn optional_email(field: &str, value: Option<&str>) -> ValidationResult<Option<String>> {
	match optional_text(value) {
		Some(value) => email(field, &value).map(Some),
		None => Ok(None),
	}
}

/// Company codes are 2-16 characters of `A-Z`, `0-9`, `_` or `-`; lowercase input is accepted and upper-cased.
pub fn company_code(value: &str) -> ValidationResult<String> {
	let code = value.trim().to_uppercase();
	let length = code.chars().count();
	if !(2..=16).contains(&length) {
		return Err(ValidationError::new("code", "must be between 2 and 16 characters"));
	}
	if !code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == '-') {
		return Err(ValidationError::new(
			"code",
			"may only contain letters, digits, '_' and '-'",
		));
	}
	Ok(code)
}

/// Usernames are case-insensitive and stored lowercase.
pub fn username(value: &str) -> ValidationResult<String> {
	let username = required_max("username", value, 64)?.to_lowercase();
	if username.contains(char::is_whitespace) {
		return Err(ValidationError::new("username", "may not contain spaces"));
	}
	Ok(username)
}

pub fn password(value: &str) -> ValidationResult<&str> {
	if value.chars().count() < 8 {
		return Err(ValidationError::new("password", "must be at least 8 characters"));
	}
	Ok(value)
}

/// Checks that an end doesn't come before its start, when both are present.
pub fn ordered<T: PartialOrd>(field: &str, start: Option<&T>, end: Option<&T>) -> ValidationResult<()> {
	if let (Some(start), Some(end)) = (start, end) {
		if end < start {
			return Err(ValidationError::new(field, "must not be before the start"));
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn required_trims_and_rejects_blank() {
		assert_eq!(required("title", "  Pump  "), Ok(String::from("Pump")));
		assert_eq!(required("title", "   "), Err(ValidationError::new("title", "is required")));
		assert!(required_max("title", "abcdef", 5).is_err());
	}

	#[test]
	fn email_shape() {
		assert!(email("email", "ops@example.com").is_ok());
		assert!(email("email", "ops@localhost").is_err());
		assert!(email("email", "@example.com").is_err());
		assert!(email("email", "a@b@example.com").is_err());
		assert!(email("email", "a b@example.com").is_err());
		assert_eq!(optional_email("email", Some("  ")), Ok(None));
	}

	#[test]
	fn company_codes_are_normalized() {
		assert_eq!(company_code(" acme-1 "), Ok(String::from("ACME-1")));
		assert!(company_code("A").is_err());
		assert!(company_code("ACME CORP").is_err());
		assert!(company_code("ABCDEFGHIJKLMNOPQ").is_err());
	}

	#[test]
	fn usernames_are_lowercased() {
		assert_eq!(username("Dispatch"), Ok(String::from("dispatch")));
		assert!(username("two words").is_err());
	}

	#[test]
	fn ordering_only_applies_when_both_present() {
		assert!(ordered("end", Some(&2), Some(&1)).is_err());
		assert!(ordered("end", Some(&1), Some(&1)).is_ok());
		assert!(ordered::<i32>("end", None, Some(&1)).is_ok());
	}
}
