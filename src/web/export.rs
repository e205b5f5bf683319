// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::error::{AppError, AppResult};
use crate::model::Ticket;
use crate::store::lookup::NameLookup;
use chrono::{DateTime, Utc};

pub const CSV_HEADER: [&str; 10] = [
	"Ticket",
	"Title",
	"Status",
	"Priority",
	"Customer",
	"Site",
	"Assigned To",
	"Scheduled Start",
	"SLA Due",
	"Closed At",
];

fn timestamp(value: Option<DateTime<Utc>>) -> String {
	value.map(|value| value.to_rfc3339()).unwrap_or_default()
}

/// Writes tickets as CSV, one CRLF-terminated row per ticket under [CSV_HEADER].
pub fn tickets_csv(tickets: &[Ticket], lookup: &NameLookup) -> AppResult<String> {
	let mut writer = csv::WriterBuilder::new()
		.terminator(csv::Terminator::CRLF)
		.from_writer(Vec::new());
	writer.write_record(CSV_HEADER).map_err(csv_error)?;
	for ticket in tickets {
		writer
			.write_record([
				ticket.ticket_number.clone(),
				ticket.title.clone(),
				ticket.status.label().to_string(),
				ticket.priority.label().to_string(),
				lookup.customer_name(ticket.customer_id.as_deref()).unwrap_or_default(),
				lookup.site_name(ticket.site_id.as_deref()).unwrap_or_default(),
				lookup.user_name(ticket.assigned_to.as_deref()).unwrap_or_default(),
				timestamp(ticket.scheduled_start),
				timestamp(ticket.sla_due),
				timestamp(ticket.closed_at),
			])
			.map_err(csv_error)?;
	}
	let bytes = writer
		.into_inner()
		.map_err(|error| AppError::Internal(format!("Couldn't finish CSV export: {}", error)))?;
	String::from_utf8(bytes).map_err(|error| AppError::Internal(format!("CSV export wasn't UTF-8: {}", error)))
}

fn csv_error(error: csv::Error) -> AppError {
	AppError::Internal(format!("Couldn't write CSV export: {}", error))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::domain::enums::{TicketPriority, TicketStatus, UserRole};
	use crate::model::{Customer, User};
	use chrono::TimeZone;

	fn ticket(number: &str, title: &str) -> Ticket {
		let created = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
		Ticket {
			id: number.to_lowercase(),
			company_code: String::from("HQ"),
			ticket_number: number.to_string(),
			title: title.to_string(),
			description: String::new(),
			status: TicketStatus::InProgress,
			priority: TicketPriority::High,
			customer_id: Some(String::from("c1")),
			site_id: None,
			asset_id: None,
			vendor_id: None,
			assigned_to: Some(String::from("u1")),
			scheduled_start: None,
			scheduled_end: None,
			sla_due: Some(created + chrono::TimeDelta::hours(8)),
			resolution: None,
			created_by: String::from("u0"),
			created_at: created,
			updated_at: created,
			closed_at: None,
		}
	}

	#[test]
	fn csv_has_header_and_quoted_rows() {
		let now = Utc::now();
		let mut lookup = NameLookup::default();
		lookup.customers.insert(
			String::from("c1"),
			Customer {
				id: String::from("c1"),
				company_code: String::from("HQ"),
				name: String::from("Acme, Inc."),
				contact_name: None,
				contact_email: None,
				contact_phone: None,
				address: None,
				notes: None,
				created_at: now,
				updated_at: now,
			},
		);
		lookup.users.insert(
			String::from("u1"),
			User {
				id: String::from("u1"),
				company_code: String::from("HQ"),
				username: String::from("jo"),
				display_name: String::from("Jo Tech"),
				email: None,
				role: UserRole::Technician,
				password_hash: String::new(),
				active: true,
				created_at: now,
			},
		);

		let csv = tickets_csv(&[ticket("HQ-00001", "Replace \"main\" valve")], &lookup).unwrap();
		assert!(csv.ends_with("\r\n"));
		let mut lines = csv.split_terminator("\r\n");
		assert_eq!(
			lines.next(),
			Some("Ticket,Title,Status,Priority,Customer,Site,Assigned To,Scheduled Start,SLA Due,Closed At")
		);
		assert_eq!(
			lines.next(),
			Some(
				"HQ-00001,\"Replace \"\"main\"\" valve\",In Progress,High,\"Acme, Inc.\",,Jo Tech,,2025-03-01T17:00:00+00:00,"
			)
		);
		assert_eq!(lines.next(), None);
	}
}
