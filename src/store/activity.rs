// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::error::AppResult;
use crate::model::ActivityLogEntry;
use crate::schema::activity_log;
use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;

pub const DEFAULT_LIMIT: i64 = 100;
pub const MAX_LIMIT: i64 = 500;

pub const CREATE: &str = "create";
pub const UPDATE: &str = "update";
pub const DELETE: &str = "delete";

/// Writes one activity log entry. `actor_id` is empty for anonymous requests.
pub fn record(
	db_connection: &mut PgConnection,
	company_code: &str,
	actor_id: Option<&str>,
	action: &str,
	entity_type: &str,
	entity_id: &str,
	summary: impl Into<String>,
) -> AppResult<()> {
	let entry = ActivityLogEntry {
		id: cuid2::create_id(),
		company_code: company_code.to_string(),
		actor_id: actor_id.map(String::from),
		action: action.to_string(),
		entity_type: entity_type.to_string(),
		entity_id: entity_id.to_string(),
		summary: summary.into(),
		created_at: Utc::now(),
	};
	diesel::insert_into(activity_log::table)
		.values(&entry)
		.execute(db_connection)?;
	tracing::debug!(
		company = %company_code,
		action = %action,
		entity_type = %entity_type,
		entity_id = %entity_id,
		"Recorded activity"
	);
	Ok(())
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityQuery {
	pub entity_type: Option<String>,
	pub entity_id: Option<String>,
	pub limit: Option<i64>,
}

impl ActivityQuery {
	/// The requested page size, clamped to what we're willing to return.
	pub fn effective_limit(&self) -> i64 {
		self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
	}
}

/// Lists activity for a company, newest first.
pub fn list(
	db_connection: &mut PgConnection,
	company_code: &str,
	query: &ActivityQuery,
) -> AppResult<Vec<ActivityLogEntry>> {
	let mut statement = activity_log::table
		.filter(activity_log::company_code.eq(company_code))
		.into_boxed();
	if let Some(entity_type) = &query.entity_type {
		statement = statement.filter(activity_log::entity_type.eq(entity_type));
	}
	if let Some(entity_id) = &query.entity_id {
		statement = statement.filter(activity_log::entity_id.eq(entity_id));
	}
	let entries = statement
		.order((activity_log::created_at.desc(), activity_log::id.desc()))
		.limit(query.effective_limit())
		.load(db_connection)?;
	Ok(entries)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn limit_is_clamped() {
		assert_eq!(ActivityQuery::default().effective_limit(), DEFAULT_LIMIT);
		let query = ActivityQuery {
			limit: Some(10_000),
			..ActivityQuery::default()
		};
		assert_eq!(query.effective_limit(), MAX_LIMIT);
		let query = ActivityQuery {
			limit: Some(0),
			..ActivityQuery::default()
		};
		assert_eq!(query.effective_limit(), 1);
	}
}
