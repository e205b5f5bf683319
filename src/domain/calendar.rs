// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::enums::{TicketPriority, TicketStatus};
use super::validation::{ValidationError, ValidationResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MAX_CALENDAR_DAYS: i64 = 92;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEntry {
	pub ticket_id: String,
	pub ticket_number: String,
	pub title: String,
	pub status: TicketStatus,
	pub priority: TicketPriority,
	pub assigned_to: Option<String>,
	pub assignee_name: Option<String>,
	pub scheduled_start: DateTime<Utc>,
	pub scheduled_end: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
	pub date: NaiveDate,
	pub entries: Vec<CalendarEntry>,
}

/// Checks a requested calendar range: inclusive, in order and not excessively long.
pub fn check_range(from: NaiveDate, to: NaiveDate) -> ValidationResult<()> {
	if to < from {
		return Err(ValidationError::new("to", "must not be before from"));
	}
	if (to - from).num_days() >= MAX_CALENDAR_DAYS {
		return Err(ValidationError::new(
			"to",
			format!("calendar ranges are limited to {} days", MAX_CALENDAR_DAYS),
		));
	}
	Ok(())
}

/// Groups scheduled tickets by the UTC date they start on.
///
/// Entries outside the range are dropped and days without entries are left out.
pub fn group_by_day(
	entries: impl IntoIterator<Item = CalendarEntry>,
	from: NaiveDate,
	to: NaiveDate,
) -> ValidationResult<Vec<CalendarDay>> {
	check_range(from, to)?;

	let mut days: BTreeMap<NaiveDate, Vec<CalendarEntry>> = BTreeMap::new();
	for entry in entries {
		let date = entry.scheduled_start.date_naive();
		if date < from || date > to {
			continue;
		}
		days.entry(date).or_default().push(entry);
	}

	Ok(days
		.into_iter()
		.map(|(date, mut entries)| {
			entries.sort_by(|a, b| {
				a.scheduled_start
					.cmp(&b.scheduled_start)
					.then_with(|| a.ticket_number.cmp(&b.ticket_number))
			});
			CalendarDay { date, entries }
		})
		.collect())
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;

	fn entry(number: &str, day: u32, hour: u32) -> CalendarEntry {
		CalendarEntry {
			ticket_id: number.to_lowercase(),
			ticket_number: number.to_string(),
			title: String::from("Visit"),
			status: TicketStatus::Scheduled,
			priority: TicketPriority::Normal,
			assigned_to: None,
			assignee_name: None,
			scheduled_start: Utc.with_ymd_and_hms(2025, 6, day, hour, 0, 0).unwrap(),
			scheduled_end: None,
		}
	}

	fn date(day: u32) -> NaiveDate {
		NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
	}

	#[test]
	fn entries_are_grouped_and_sorted() {
		let days = group_by_day(
			[
				entry("HQ-00003", 3, 15),
				entry("HQ-00002", 2, 9),
				entry("HQ-00004", 3, 8),
				entry("HQ-00001", 3, 8),
				entry("HQ-00009", 9, 8),
			],
			date(1),
			date(7),
		)
		.unwrap();

		assert_eq!(days.len(), 2);
		assert_eq!(days[0].date, date(2));
		let numbers: Vec<&str> = days[1].entries.iter().map(|e| e.ticket_number.as_str()).collect();
		assert_eq!(numbers, vec!["HQ-00001", "HQ-00004", "HQ-00003"]);
	}

	#[test]
	fn range_is_inclusive_on_both_ends() {
		let days = group_by_day([entry("HQ-00001", 1, 0), entry("HQ-00002", 7, 23)], date(1), date(7)).unwrap();
		assert_eq!(days.len(), 2);
	}

	#[test]
	fn invalid_ranges_are_rejected() {
		assert!(check_range(date(5), date(4)).is_err());
		assert!(check_range(date(1), date(1) + chrono::TimeDelta::days(MAX_CALENDAR_DAYS)).is_err());
		assert!(check_range(date(1), date(1) + chrono::TimeDelta::days(MAX_CALENDAR_DAYS - 1)).is_ok());
	}
}
