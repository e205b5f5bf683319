// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::enums::{TicketPriority, TicketStatus};
use super::sla::is_breached;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const UNASSIGNED_BUCKET: &str = "unassigned";
pub const NO_CUSTOMER_BUCKET: &str = "no customer";

/// The subset of a ticket that reporting looks at, with related names already resolved.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTicket {
	pub id: String,
	pub ticket_number: String,
	pub title: String,
	pub description: String,
	pub status: TicketStatus,
	pub priority: TicketPriority,
	pub assigned_to: Option<String>,
	pub assignee_name: Option<String>,
	pub customer_id: Option<String>,
	pub customer_name: Option<String>,
	pub created_at: DateTime<Utc>,
	pub closed_at: Option<DateTime<Utc>>,
	pub sla_due: Option<DateTime<Utc>>,
}

/// Which tickets a report or listing should include. Empty fields don't restrict anything.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFilter {
	#[serde(default)]
	pub statuses: Vec<TicketStatus>,
	pub priority: Option<TicketPriority>,
	pub assigned_to: Option<String>,
	pub customer_id: Option<String>,
	/// First creation date included
	pub from: Option<NaiveDate>,
	/// Last creation date included
	pub to: Option<NaiveDate>,
	/// Case-insensitive text matched against the number, title and description
	pub query: Option<String>,
}

impl ReportFilter {
	pub fn matches(&self, ticket: &ReportTicket) -> bool {
		if !self.statuses.is_empty() && !self.statuses.contains(&ticket.status) {
			return false;
		}
		if self.priority.is_some_and(|priority| priority != ticket.priority) {
			return false;
		}
		if let Some(assigned_to) = &self.assigned_to {
			if ticket.assigned_to.as_deref() != Some(assigned_to.as_str()) {
				return false;
			}
		}
		if let Some(customer_id) = &self.customer_id {
			if ticket.customer_id.as_deref() != Some(customer_id.as_str()) {
				return false;
			}
		}
		let created_on = ticket.created_at.date_naive();
		if self.from.is_some_and(|from| created_on < from) {
			return false;
		}
		if self.to.is_some_and(|to| created_on > to) {
			return false;
		}
		if let Some(query) = self.query.as_deref().map(str::trim).filter(|query| !query.is_empty()) {
			let query = query.to_lowercase();
			let found = [&ticket.ticket_number, &ticket.title, &ticket.description]
				.iter()
				.any(|text| text.to_lowercase().contains(&query));
			if !found {
				return false;
			}
		}
		true
	}
}

/// Applies the filter, keeping the input order.
pub fn filter_tickets<'a>(tickets: &'a [ReportTicket], filter: &ReportFilter) -> Vec<&'a ReportTicket> {
	tickets.iter().filter(|ticket| filter.matches(ticket)).collect()
}

/// Per-status counts as shown on the ticket count badge.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
	pub by_status: BTreeMap<TicketStatus, usize>,
	pub active: usize,
}

pub fn status_counts<'a>(statuses: impl IntoIterator<Item = &'a TicketStatus>) -> StatusCounts {
	let mut by_status: BTreeMap<TicketStatus, usize> = TicketStatus::ALL.into_iter().map(|s| (s, 0)).collect();
	let mut active = 0;
	for status in statuses {
		*by_status.entry(*status).or_default() += 1;
		if status.is_active() {
			active += 1;
		}
	}
	StatusCounts { by_status, active }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketReport {
	pub total: usize,
	pub by_status: BTreeMap<TicketStatus, usize>,
	pub by_priority: BTreeMap<TicketPriority, usize>,
	pub by_technician: BTreeMap<String, usize>,
	pub by_customer: BTreeMap<String, usize>,
	pub open: usize,
	pub overdue_open: usize,
	pub closed: usize,
	pub sla_met: usize,
	pub sla_breached: usize,
	/// Share of closed tickets with a due date that closed on time, 0-100
	pub sla_compliance_percent: Option<f64>,
	pub average_resolution_hours: Option<f64>,
}

/// Aggregates already-filtered tickets into report figures.
pub fn summarize<'a>(tickets: impl IntoIterator<Item = &'a ReportTicket>, now: DateTime<Utc>) -> TicketReport {
	let mut report = TicketReport {
		by_status: TicketStatus::ALL.into_iter().map(|s| (s, 0)).collect(),
		by_priority: TicketPriority::ALL.into_iter().map(|p| (p, 0)).collect(),
		..TicketReport::default()
	};
	let mut resolution_hours_total = 0.0;
	let mut resolved_count = 0usize;

	for ticket in tickets {
		report.total += 1;
		*report.by_status.entry(ticket.status).or_default() += 1;
		*report.by_priority.entry(ticket.priority).or_default() += 1;

		let technician = ticket
			.assignee_name
			.clone()
			.or_else(|| ticket.assigned_to.clone())
			.unwrap_or_else(|| String::from(UNASSIGNED_BUCKET));
		*report.by_technician.entry(technician).or_default() += 1;

		let customer = ticket
			.customer_name
			.clone()
			.or_else(|| ticket.customer_id.clone())
			.unwrap_or_else(|| String::from(NO_CUSTOMER_BUCKET));
		*report.by_customer.entry(customer).or_default() += 1;

		if ticket.status.is_active() {
			report.open += 1;
			if is_breached(ticket.sla_due, None, now) {
				report.overdue_open += 1;
			}
		}

		if ticket.status == TicketStatus::Closed {
			report.closed += 1;
			if let Some(closed_at) = ticket.closed_at {
				if ticket.sla_due.is_some() {
					if is_breached(ticket.sla_due, Some(closed_at), now) {
						report.sla_breached += 1;
					} else {
						report.sla_met += 1;
					}
				}
				let hours = (closed_at - ticket.created_at).num_seconds() as f64 / 3600.0;
				resolution_hours_total += hours;
				resolved_count += 1;
			}
		}
	}

	let judged = report.sla_met + report.sla_breached;
	if judged > 0 {
		report.sla_compliance_percent = Some(report.sla_met as f64 * 100.0 / judged as f64);
	}
	if resolved_count > 0 {
		report.average_resolution_hours = Some(resolution_hours_total / resolved_count as f64);
	}

	report
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{TimeDelta, TimeZone};

	fn created() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap()
	}

	fn ticket(number: &str, status: TicketStatus, priority: TicketPriority) -> ReportTicket {
		ReportTicket {
			id: number.to_lowercase(),
			ticket_number: number.to_string(),
			title: format!("Ticket {}", number),
			description: String::new(),
			status,
			priority,
			assigned_to: None,
			assignee_name: None,
			customer_id: None,
			customer_name: None,
			created_at: created(),
			closed_at: None,
			sla_due: None,
		}
	}

	#[test]
	fn filter_combines_all_criteria() {
		let mut pump = ticket("HQ-00001", TicketStatus::Open, TicketPriority::High);
		pump.title = String::from("Replace PUMP seal");
		pump.assigned_to = Some(String::from("tech1"));
		let mut other = ticket("HQ-00002", TicketStatus::Open, TicketPriority::High);
		other.assigned_to = Some(String::from("tech2"));
		let closed = ticket("HQ-00003", TicketStatus::Closed, TicketPriority::High);
		let tickets = vec![pump, other, closed];

		let filter = ReportFilter {
			statuses: vec![TicketStatus::Open],
			priority: Some(TicketPriority::High),
			assigned_to: Some(String::from("tech1")),
			query: Some(String::from("pump")),
			..ReportFilter::default()
		};
		let matched = filter_tickets(&tickets, &filter);
		assert_eq!(matched.len(), 1);
		assert_eq!(matched[0].ticket_number, "HQ-00001");

		assert_eq!(filter_tickets(&tickets, &ReportFilter::default()).len(), 3);
	}

	#[test]
	fn date_range_is_inclusive() {
		let tickets = vec![ticket("HQ-00001", TicketStatus::Open, TicketPriority::Low)];
		let day = created().date_naive();
		let filter = ReportFilter {
			from: Some(day),
			to: Some(day),
			..ReportFilter::default()
		};
		assert_eq!(filter_tickets(&tickets, &filter).len(), 1);

		let filter = ReportFilter {
			from: day.succ_opt(),
			..ReportFilter::default()
		};
		assert!(filter_tickets(&tickets, &filter).is_empty());
	}

	#[test]
	fn summary_counts_sla_and_resolution() {
		let now = created() + TimeDelta::hours(48);

		let mut on_time = ticket("HQ-00001", TicketStatus::Closed, TicketPriority::High);
		on_time.sla_due = Some(created() + TimeDelta::hours(8));
		on_time.closed_at = Some(created() + TimeDelta::hours(4));

		let mut late = ticket("HQ-00002", TicketStatus::Closed, TicketPriority::Critical);
		late.sla_due = Some(created() + TimeDelta::hours(4));
		late.closed_at = Some(created() + TimeDelta::hours(12));
		late.assigned_to = Some(String::from("tech1"));
		late.assignee_name = Some(String::from("Ada"));

		let mut overdue = ticket("HQ-00003", TicketStatus::InProgress, TicketPriority::Normal);
		overdue.sla_due = Some(created() + TimeDelta::hours(24));
		overdue.customer_name = Some(String::from("Acme"));

		let pending = ticket("HQ-00004", TicketStatus::Open, TicketPriority::Low);

		let tickets = [on_time, late, overdue, pending];
		let report = summarize(&tickets, now);

		assert_eq!(report.total, 4);
		assert_eq!(report.closed, 2);
		assert_eq!(report.open, 2);
		assert_eq!(report.overdue_open, 1);
		assert_eq!(report.sla_met, 1);
		assert_eq!(report.sla_breached, 1);
		assert_eq!(report.sla_compliance_percent, Some(50.0));
		assert_eq!(report.average_resolution_hours, Some(8.0));
		assert_eq!(report.by_status[&TicketStatus::Closed], 2);
		assert_eq!(report.by_status[&TicketStatus::OnHold], 0);
		assert_eq!(report.by_priority[&TicketPriority::Critical], 1);
		assert_eq!(report.by_technician["Ada"], 1);
		assert_eq!(report.by_technician[UNASSIGNED_BUCKET], 3);
		assert_eq!(report.by_customer["Acme"], 1);
		assert_eq!(report.by_customer[NO_CUSTOMER_BUCKET], 3);
	}

	#[test]
	fn empty_summary_has_no_averages() {
		let report = summarize(&[], created());
		assert_eq!(report.total, 0);
		assert_eq!(report.sla_compliance_percent, None);
		assert_eq!(report.average_resolution_hours, None);
	}

	#[test]
	fn status_counts_track_active_total() {
		let statuses = [TicketStatus::Open, TicketStatus::Open, TicketStatus::Closed, TicketStatus::OnHold];
		let counts = status_counts(&statuses);
		assert_eq!(counts.active, 3);
		assert_eq!(counts.by_status[&TicketStatus::Open], 2);
		assert_eq!(counts.by_status[&TicketStatus::Cancelled], 0);
	}
}
