// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::domain::enums::{TicketPriority, TicketStatus, UserRole};
use crate::domain::reports::StatusCounts;
use chrono::{DateTime, NaiveDate, Utc};
use leptos::prelude::*;
use leptos_router::params::Params;
use serde::{Deserialize, Serialize};

/// How often the header badge and the map refresh themselves.
pub const REFRESH_INTERVAL_SECONDS: u64 = 60;

#[derive(Clone, Debug, Params, PartialEq)]
pub struct TicketParams {
	pub id: Option<String>,
}

/// Who is signed in and where they're working.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SessionInfo {
	pub user_id: String,
	pub display_name: String,
	pub role: UserRole,
	pub company_code: String,
	pub company_name: String,
}

/// A ticket as shown in page tables.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TicketRow {
	pub id: String,
	pub ticket_number: String,
	pub title: String,
	pub status: TicketStatus,
	pub priority: TicketPriority,
	pub customer_name: Option<String>,
	pub site_name: Option<String>,
	pub assignee_name: Option<String>,
	pub scheduled_start: Option<DateTime<Utc>>,
	pub sla_due: Option<DateTime<Utc>>,
	pub sla_breached: bool,
	pub closed_at: Option<DateTime<Utc>>,
}

/// Makes a URL to the view for a ticket
pub fn make_ticket_url(ticket_id: &str) -> String {
	format!("/tickets/{}", ticket_id)
}

pub fn display_time(time: Option<DateTime<Utc>>) -> String {
	time.map(|time| time.format("%Y-%m-%d %H:%M").to_string()).unwrap_or_default()
}

/// Reads a date from a form field, treating a blank field as absent.
pub fn parse_date_input(value: Option<&str>) -> Result<Option<NaiveDate>, ServerFnError> {
	match value.map(str::trim).filter(|value| !value.is_empty()) {
		Some(value) => match value.parse() {
			Ok(date) => Ok(Some(date)),
			Err(_) => Err(ServerFnError::new(format!("{} is not a date", value))),
		},
		None => Ok(None),
	}
}

#[server]
pub async fn get_session_info() -> Result<SessionInfo, ServerFnError> {
	use super::server_utils::request_context;

	let (_, context) = request_context().await?;
	Ok(SessionInfo {
		user_id: context.user.id,
		display_name: context.user.display_name,
		role: context.user.role,
		company_code: context.company.code,
		company_name: context.company.name,
	})
}

#[server]
pub async fn get_ticket_counts() -> Result<StatusCounts, ServerFnError> {
	use super::server_utils::{request_context, server_error};
	use crate::web::api::tickets::count_tickets;

	let (state, context) = request_context().await?;
	let mut db_connection = state.db_connection_pool.get()?;
	count_tickets(&mut db_connection, &context).map_err(server_error)
}

/// A table of tickets, used by the ticket list, the closed list and the dashboard.
#[component]
pub fn TicketTable(tickets: Vec<TicketRow>, #[prop(optional)] show_closed_at: bool) -> impl IntoView {
	if tickets.is_empty() {
		return view! { <p class="ticket_table_empty">"No tickets"</p> }.into_any();
	}

	view! {
		<table class="ticket_table">
			<thead>
				<tr>
					<th>"Ticket"</th>
					<th>"Title"</th>
					<th>"Status"</th>
					<th>"Priority"</th>
					<th>"Customer"</th>
					<th>"Site"</th>
					<th>"Assigned To"</th>
					<th>"Scheduled"</th>
					<th>{if show_closed_at { "Closed" } else { "SLA Due" }}</th>
				</tr>
			</thead>
			<tbody>
				{
					tickets.into_iter().map(|ticket| {
						let last_column = if show_closed_at {
							display_time(ticket.closed_at)
						} else {
							display_time(ticket.sla_due)
						};
						view! {
							<tr class:sla_breached=ticket.sla_breached>
								<td>
									<a href={make_ticket_url(&ticket.id)}>{ticket.ticket_number.clone()}</a>
								</td>
								<td>{ticket.title}</td>
								<td>{ticket.status.label()}</td>
								<td>{ticket.priority.label()}</td>
								<td>{ticket.customer_name.unwrap_or_default()}</td>
								<td>{ticket.site_name.unwrap_or_default()}</td>
								<td>{ticket.assignee_name.unwrap_or_default()}</td>
								<td>{display_time(ticket.scheduled_start)}</td>
								<td>{last_column}</td>
							</tr>
						}
					}).collect::<Vec<_>>()
				}
			</tbody>
		</table>
	}
	.into_any()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn blank_dates_are_absent() {
		assert_eq!(parse_date_input(None).unwrap(), None);
		assert_eq!(parse_date_input(Some("  ")).unwrap(), None);
		assert_eq!(
			parse_date_input(Some("2025-04-01")).unwrap(),
			NaiveDate::from_ymd_opt(2025, 4, 1)
		);
		assert!(parse_date_input(Some("April")).is_err());
	}

	#[test]
	fn times_display_in_minutes() {
		let time = DateTime::parse_from_rfc3339("2025-04-01T09:30:15Z").unwrap().with_timezone(&Utc);
		assert_eq!(display_time(Some(time)), "2025-04-01 09:30");
		assert_eq!(display_time(None), "");
	}
}
