// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::enums::TicketPriority;
use super::validation::{ValidationError, ValidationResult};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Hours allowed before a ticket of each priority is due.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SlaTable {
	pub critical_hours: i64,
	pub high_hours: i64,
	pub normal_hours: i64,
	pub low_hours: i64,
}

impl Default for SlaTable {
	fn default() -> Self {
		Self {
			critical_hours: 4,
			high_hours: 8,
			normal_hours: 24,
			low_hours: 72,
		}
	}
}

impl SlaTable {
	pub fn hours(&self, priority: TicketPriority) -> i64 {
		match priority {
			TicketPriority::Critical => self.critical_hours,
			TicketPriority::High => self.high_hours,
			TicketPriority::Normal => self.normal_hours,
			TicketPriority::Low => self.low_hours,
		}
	}
}

/// Gets the SLA deadline for a ticket.
///
/// The clock starts at the scheduled start when there is one, otherwise at ticket creation. A start so far out that
/// the deadline can't be represented is rejected.
pub fn compute_sla_due(
	priority: TicketPriority,
	scheduled_start: Option<DateTime<Utc>>,
	created_at: DateTime<Utc>,
	table: &SlaTable,
) -> ValidationResult<DateTime<Utc>> {
	let base = scheduled_start.unwrap_or(created_at);
	TimeDelta::try_hours(table.hours(priority))
		.and_then(|allowed| base.checked_add_signed(allowed))
		.ok_or_else(|| ValidationError::new("scheduledStart", "is out of range"))
}

/// Whether a ticket missed its SLA.
///
/// Closed tickets are judged by when they closed; everything else by the current time.
pub fn is_breached(sla_due: Option<DateTime<Utc>>, closed_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
	match sla_due {
		Some(due) => closed_at.unwrap_or(now) > due,
		None => false,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;

	fn at(hour: u32) -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2025, 3, 10, hour, 0, 0).unwrap()
	}

	#[test]
	fn due_date_follows_priority_table() {
		let table = SlaTable::default();
		let created = at(8);
		assert_eq!(compute_sla_due(TicketPriority::Critical, None, created, &table).unwrap(), at(12));
		assert_eq!(compute_sla_due(TicketPriority::High, None, created, &table).unwrap(), at(16));
		assert_eq!(
			compute_sla_due(TicketPriority::Normal, None, created, &table).unwrap(),
			created + TimeDelta::hours(24)
		);
		assert_eq!(
			compute_sla_due(TicketPriority::Low, None, created, &table).unwrap(),
			created + TimeDelta::hours(72)
		);
	}

	#[test]
	fn scheduled_start_takes_precedence_over_creation() {
		let table = SlaTable::default();
		let due = compute_sla_due(TicketPriority::Critical, Some(at(13)), at(8), &table).unwrap();
		assert_eq!(due, at(17));
	}

	#[test]
	fn custom_table_is_respected() {
		let table = SlaTable {
			critical_hours: 1,
			..SlaTable::default()
		};
		assert_eq!(compute_sla_due(TicketPriority::Critical, None, at(8), &table).unwrap(), at(9));
	}

	#[test]
	fn unrepresentable_deadline_is_rejected() {
		let table = SlaTable::default();
		let far_future = DateTime::<Utc>::MAX_UTC - TimeDelta::hours(1);
		let error = compute_sla_due(TicketPriority::Low, Some(far_future), at(8), &table).unwrap_err();
		assert_eq!(error.field, "scheduledStart");

		let huge_table = SlaTable {
			low_hours: i64::MAX,
			..SlaTable::default()
		};
		assert!(compute_sla_due(TicketPriority::Low, None, at(8), &huge_table).is_err());
	}

	#[test]
	fn breach_uses_close_time_when_closed() {
		let due = Some(at(12));
		assert!(!is_breached(due, Some(at(11)), at(20)));
		assert!(is_breached(due, Some(at(13)), at(9)));
		assert!(is_breached(due, None, at(13)));
		assert!(!is_breached(due, None, at(12)));
		assert!(!is_breached(None, None, at(23)));
	}
}
