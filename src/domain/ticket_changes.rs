// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::deserialize_some;
use super::enums::{TicketPriority, TicketStatus};
use super::sla::{SlaTable, compute_sla_due};
use super::validation::{ValidationError, ValidationResult, optional_text, ordered, required_max};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_TITLE_LENGTH: usize = 200;

/// The editable state of a ticket, independent of how it's stored.
#[derive(Clone, Debug, PartialEq)]
pub struct TicketDraft {
	pub title: String,
	pub description: String,
	pub status: TicketStatus,
	pub priority: TicketPriority,
	pub customer_id: Option<String>,
	pub site_id: Option<String>,
	pub asset_id: Option<String>,
	pub vendor_id: Option<String>,
	pub assigned_to: Option<String>,
	pub scheduled_start: Option<DateTime<Utc>>,
	pub scheduled_end: Option<DateTime<Utc>>,
	pub sla_due: Option<DateTime<Utc>>,
	pub resolution: Option<String>,
	pub created_at: DateTime<Utc>,
	pub closed_at: Option<DateTime<Utc>>,
}

/// A request to open a ticket.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTicket {
	pub title: String,
	#[serde(default)]
	pub description: String,
	pub status: Option<TicketStatus>,
	pub priority: Option<TicketPriority>,
	pub customer_id: Option<String>,
	pub site_id: Option<String>,
	pub asset_id: Option<String>,
	pub vendor_id: Option<String>,
	pub assigned_to: Option<String>,
	pub scheduled_start: Option<DateTime<Utc>>,
	pub scheduled_end: Option<DateTime<Utc>>,
	pub resolution: Option<String>,
}

/// A partial update. For nullable fields, an absent key leaves the value alone and an explicit `null` clears it.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketChanges {
	pub title: Option<String>,
	pub description: Option<String>,
	pub status: Option<TicketStatus>,
	pub priority: Option<TicketPriority>,
	#[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
	pub customer_id: Option<Option<String>>,
	#[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
	pub site_id: Option<Option<String>>,
	#[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
	pub asset_id: Option<Option<String>>,
	#[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
	pub vendor_id: Option<Option<String>>,
	#[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
	pub assigned_to: Option<Option<String>>,
	#[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
	pub scheduled_start: Option<Option<DateTime<Utc>>>,
	#[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
	pub scheduled_end: Option<Option<DateTime<Utc>>>,
	#[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
	pub resolution: Option<Option<String>>,
}

impl TicketChanges {
	/// Names of the fields this update touches.
	pub fn touched_fields(&self) -> Vec<&'static str> {
		let present = [
			("title", self.title.is_some()),
			("description", self.description.is_some()),
			("status", self.status.is_some()),
			("priority", self.priority.is_some()),
			("customerId", self.customer_id.is_some()),
			("siteId", self.site_id.is_some()),
			("assetId", self.asset_id.is_some()),
			("vendorId", self.vendor_id.is_some()),
			("assignedTo", self.assigned_to.is_some()),
			("scheduledStart", self.scheduled_start.is_some()),
			("scheduledEnd", self.scheduled_end.is_some()),
			("resolution", self.resolution.is_some()),
		];
		present
			.into_iter()
			.filter_map(|(name, is_present)| is_present.then_some(name))
			.collect()
	}

	pub fn is_empty(&self) -> bool {
		self.touched_fields().is_empty()
	}
}

/// One entry of a ticket's audit trail.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
	pub field: String,
	pub old_value: Option<String>,
	pub new_value: Option<String>,
}

/// Builds the initial state of a new ticket.
pub fn new_ticket(input: &NewTicket, now: DateTime<Utc>, sla_table: &SlaTable) -> ValidationResult<TicketDraft> {
	let priority = input.priority.unwrap_or_default();
	let status = match input.status {
		Some(status) => status,
		None if input.scheduled_start.is_some() => TicketStatus::Scheduled,
		None => TicketStatus::Open,
	};
	let draft = TicketDraft {
		title: required_max("title", &input.title, MAX_TITLE_LENGTH)?,
		description: input.description.trim().to_string(),
		status,
		priority,
		customer_id: optional_text(input.customer_id.as_deref()),
		site_id: optional_text(input.site_id.as_deref()),
		asset_id: optional_text(input.asset_id.as_deref()),
		vendor_id: optional_text(input.vendor_id.as_deref()),
		assigned_to: optional_text(input.assigned_to.as_deref()),
		scheduled_start: input.scheduled_start,
		scheduled_end: input.scheduled_end,
		sla_due: Some(compute_sla_due(priority, input.scheduled_start, now, sla_table)?),
		resolution: optional_text(input.resolution.as_deref()),
		created_at: now,
		closed_at: (status == TicketStatus::Closed).then_some(now),
	};
	check_invariants(&draft)?;
	Ok(draft)
}

/// Applies a partial update, returning the new state and the audit trail entries for it.
pub fn apply_changes(
	current: &TicketDraft,
	changes: &TicketChanges,
	now: DateTime<Utc>,
	sla_table: &SlaTable,
) -> ValidationResult<(TicketDraft, Vec<FieldChange>)> {
	let mut next = current.clone();

	if let Some(title) = &changes.title {
		next.title = required_max("title", title, MAX_TITLE_LENGTH)?;
	}
	if let Some(description) = &changes.description {
		next.description = description.trim().to_string();
	}
	if let Some(status) = changes.status {
		next.status = status;
	}
	if let Some(priority) = changes.priority {
		next.priority = priority;
	}
	if let Some(customer_id) = &changes.customer_id {
		next.customer_id = optional_text(customer_id.as_deref());
	}
	if let Some(site_id) = &changes.site_id {
		next.site_id = optional_text(site_id.as_deref());
	}
	if let Some(asset_id) = &changes.asset_id {
		next.asset_id = optional_text(asset_id.as_deref());
	}
	if let Some(vendor_id) = &changes.vendor_id {
		next.vendor_id = optional_text(vendor_id.as_deref());
	}
	if let Some(assigned_to) = &changes.assigned_to {
		next.assigned_to = optional_text(assigned_to.as_deref());
	}
	if let Some(scheduled_start) = changes.scheduled_start {
		next.scheduled_start = scheduled_start;
	}
	if let Some(scheduled_end) = changes.scheduled_end {
		next.scheduled_end = scheduled_end;
	}
	if let Some(resolution) = &changes.resolution {
		next.resolution = optional_text(resolution.as_deref());
	}

	if next.priority != current.priority || next.scheduled_start != current.scheduled_start {
		next.sla_due = Some(compute_sla_due(
			next.priority,
			next.scheduled_start,
			next.created_at,
			sla_table,
		)?);
	}

	match (current.status == TicketStatus::Closed, next.status == TicketStatus::Closed) {
		(false, true) => next.closed_at = Some(now),
		(true, false) => next.closed_at = None,
		_ => (),
	}

	check_invariants(&next)?;
	let trail = diff(current, &next);
	Ok((next, trail))
}

fn check_invariants(draft: &TicketDraft) -> ValidationResult<()> {
	if draft.status == TicketStatus::Closed && draft.resolution.is_none() {
		return Err(ValidationError::new(
			"resolution",
			"is required before a ticket can be closed",
		));
	}
	ordered(
		"scheduledEnd",
		draft.scheduled_start.as_ref(),
		draft.scheduled_end.as_ref(),
	)?;
	Ok(())
}

/// Lists every field that differs between two states of a ticket.
pub fn diff(before: &TicketDraft, after: &TicketDraft) -> Vec<FieldChange> {
	let mut changes = Vec::new();
	let mut compare = |field: &str, old: Option<String>, new: Option<String>| {
		if old != new {
			changes.push(FieldChange {
				field: field.to_string(),
				old_value: old,
				new_value: new,
			});
		}
	};
	let time = |value: Option<DateTime<Utc>>| value.map(|value| value.to_rfc3339());

	compare("title", Some(before.title.clone()), Some(after.title.clone()));
	compare(
		"description",
		Some(before.description.clone()),
		Some(after.description.clone()),
	);
	compare(
		"status",
		Some(before.status.to_string()),
		Some(after.status.to_string()),
	);
	compare(
		"priority",
		Some(before.priority.to_string()),
		Some(after.priority.to_string()),
	);
	compare("customerId", before.customer_id.clone(), after.customer_id.clone());
	compare("siteId", before.site_id.clone(), after.site_id.clone());
	compare("assetId", before.asset_id.clone(), after.asset_id.clone());
	compare("vendorId", before.vendor_id.clone(), after.vendor_id.clone());
	compare("assignedTo", before.assigned_to.clone(), after.assigned_to.clone());
	compare("scheduledStart", time(before.scheduled_start), time(after.scheduled_start));
	compare("scheduledEnd", time(before.scheduled_end), time(after.scheduled_end));
	compare("slaDue", time(before.sla_due), time(after.sla_due));
	compare("resolution", before.resolution.clone(), after.resolution.clone());
	compare("closedAt", time(before.closed_at), time(after.closed_at));

	changes
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{TimeDelta, TimeZone};

	fn now() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2025, 4, 2, 10, 0, 0).unwrap()
	}

	fn open_ticket() -> TicketDraft {
		new_ticket(
			&NewTicket {
				title: String::from("  No heat in lobby "),
				priority: Some(TicketPriority::High),
				..NewTicket::default()
			},
			now(),
			&SlaTable::default(),
		)
		.unwrap()
	}

	#[test]
	fn new_ticket_defaults_and_derives_sla() {
		let ticket = open_ticket();
		assert_eq!(ticket.title, "No heat in lobby");
		assert_eq!(ticket.status, TicketStatus::Open);
		assert_eq!(ticket.sla_due, Some(now() + TimeDelta::hours(8)));
		assert_eq!(ticket.closed_at, None);
	}

	#[test]
	fn scheduled_ticket_starts_scheduled_and_uses_start_for_sla() {
		let start = now() + TimeDelta::days(1);
		let ticket = new_ticket(
			&NewTicket {
				title: String::from("Annual service"),
				scheduled_start: Some(start),
				..NewTicket::default()
			},
			now(),
			&SlaTable::default(),
		)
		.unwrap();
		assert_eq!(ticket.status, TicketStatus::Scheduled);
		assert_eq!(ticket.priority, TicketPriority::Normal);
		assert_eq!(ticket.sla_due, Some(start + TimeDelta::hours(24)));
	}

	#[test]
	fn far_future_start_is_a_validation_error() {
		let input: NewTicket =
			serde_json::from_str(r#"{"title":"x","priority":"Low","scheduledStart":"+262142-12-31T23:00:00Z"}"#).unwrap();
		assert!(input.scheduled_start.is_some());
		let error = new_ticket(&input, now(), &SlaTable::default()).unwrap_err();
		assert_eq!(error.field, "scheduledStart");

		let changes = TicketChanges {
			scheduled_start: input.scheduled_start.map(Some),
			..TicketChanges::default()
		};
		let error = apply_changes(&open_ticket(), &changes, now(), &SlaTable::default()).unwrap_err();
		assert_eq!(error.field, "scheduledStart");
	}

	#[test]
	fn blank_title_is_rejected() {
		let result = new_ticket(&NewTicket::default(), now(), &SlaTable::default());
		assert_eq!(result.unwrap_err().field, "title");
	}

	#[test]
	fn closing_requires_resolution() {
		let ticket = open_ticket();
		let changes = TicketChanges {
			status: Some(TicketStatus::Closed),
			..TicketChanges::default()
		};
		let error = apply_changes(&ticket, &changes, now(), &SlaTable::default()).unwrap_err();
		assert_eq!(error.field, "resolution");

		let changes = TicketChanges {
			status: Some(TicketStatus::Closed),
			resolution: Some(Some(String::from("   "))),
			..TicketChanges::default()
		};
		assert!(apply_changes(&ticket, &changes, now(), &SlaTable::default()).is_err());
	}

	#[test]
	fn closing_and_reopening_tracks_closed_at() {
		let ticket = open_ticket();
		let later = now() + TimeDelta::hours(3);
		let changes = TicketChanges {
			status: Some(TicketStatus::Closed),
			resolution: Some(Some(String::from("Reset boiler"))),
			..TicketChanges::default()
		};
		let (closed, trail) = apply_changes(&ticket, &changes, later, &SlaTable::default()).unwrap();
		assert_eq!(closed.closed_at, Some(later));
		let fields: Vec<&str> = trail.iter().map(|change| change.field.as_str()).collect();
		assert_eq!(fields, vec!["status", "resolution", "closedAt"]);
		assert_eq!(trail[0].old_value.as_deref(), Some("Open"));
		assert_eq!(trail[0].new_value.as_deref(), Some("Closed"));

		let reopen = TicketChanges {
			status: Some(TicketStatus::InProgress),
			..TicketChanges::default()
		};
		let (reopened, _) = apply_changes(&closed, &reopen, later, &SlaTable::default()).unwrap();
		assert_eq!(reopened.closed_at, None);
		assert_eq!(reopened.resolution.as_deref(), Some("Reset boiler"));
	}

	#[test]
	fn priority_or_schedule_change_recomputes_sla() {
		let ticket = open_ticket();
		let changes = TicketChanges {
			priority: Some(TicketPriority::Critical),
			..TicketChanges::default()
		};
		let (updated, trail) = apply_changes(&ticket, &changes, now(), &SlaTable::default()).unwrap();
		assert_eq!(updated.sla_due, Some(now() + TimeDelta::hours(4)));
		assert!(trail.iter().any(|change| change.field == "slaDue"));

		let start = now() + TimeDelta::hours(30);
		let changes = TicketChanges {
			scheduled_start: Some(Some(start)),
			..TicketChanges::default()
		};
		let (updated, _) = apply_changes(&updated, &changes, now(), &SlaTable::default()).unwrap();
		assert_eq!(updated.sla_due, Some(start + TimeDelta::hours(4)));
	}

	#[test]
	fn schedule_end_must_follow_start() {
		let ticket = open_ticket();
		let changes = TicketChanges {
			scheduled_start: Some(Some(now() + TimeDelta::hours(5))),
			scheduled_end: Some(Some(now() + TimeDelta::hours(4))),
			..TicketChanges::default()
		};
		let error = apply_changes(&ticket, &changes, now(), &SlaTable::default()).unwrap_err();
		assert_eq!(error.field, "scheduledEnd");
	}

	#[test]
	fn explicit_null_clears_but_absent_keeps() {
		let mut ticket = open_ticket();
		ticket.assigned_to = Some(String::from("tech1"));
		ticket.site_id = Some(String::from("site1"));

		let changes: TicketChanges = serde_json::from_str(r#"{"assignedTo": null}"#).unwrap();
		assert_eq!(changes.touched_fields(), vec!["assignedTo"]);
		let (updated, trail) = apply_changes(&ticket, &changes, now(), &SlaTable::default()).unwrap();
		assert_eq!(updated.assigned_to, None);
		assert_eq!(updated.site_id.as_deref(), Some("site1"));
		assert_eq!(
			trail,
			vec![FieldChange {
				field: String::from("assignedTo"),
				old_value: Some(String::from("tech1")),
				new_value: None,
			}]
		);
	}

	#[test]
	fn no_op_update_produces_no_trail() {
		let ticket = open_ticket();
		let changes = TicketChanges {
			title: Some(String::from("No heat in lobby")),
			..TicketChanges::default()
		};
		let (_, trail) = apply_changes(&ticket, &changes, now(), &SlaTable::default()).unwrap();
		assert!(trail.is_empty());
		assert!(TicketChanges::default().is_empty());
	}
}
