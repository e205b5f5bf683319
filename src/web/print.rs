// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The printable work order for a ticket.

use crate::model::Ticket;
use crate::store::lookup::TicketNames;
use crate::store::tickets::NoteView;
use chrono::{DateTime, Utc};
use leptos::prelude::*;

const PRINT_STYLE: &str = "body { font-family: sans-serif; margin: 2em; } \
	table.fields th { text-align: left; padding-right: 1.5em; vertical-align: top; } \
	.description, .resolution, .note_body { white-space: pre-wrap; } \
	.note { border-top: 1px solid #999; padding: 0.5em 0; } \
	footer { margin-top: 2em; font-size: 0.8em; color: #555; }";

fn display_time(value: Option<DateTime<Utc>>) -> String {
	value
		.map(|value| value.format("%Y-%m-%d %H:%M UTC").to_string())
		.unwrap_or_default()
}

/// Renders a standalone HTML page for printing a ticket. All values are escaped by the renderer.
pub fn render_ticket(ticket: &Ticket, names: &TicketNames, notes: &[NoteView], base_url: &str) -> String {
	let schedule = match (ticket.scheduled_start, ticket.scheduled_end) {
		(Some(start), Some(end)) => format!("{} to {}", display_time(Some(start)), display_time(Some(end))),
		(Some(start), None) => display_time(Some(start)),
		_ => String::new(),
	};
	let fields: Vec<(&'static str, String)> = vec![
		("Status", ticket.status.label().to_string()),
		("Priority", ticket.priority.label().to_string()),
		("Customer", names.customer_name.clone().unwrap_or_default()),
		("Site", names.site_name.clone().unwrap_or_default()),
		("Address", names.site_address.clone().unwrap_or_default()),
		("Asset", names.asset_name.clone().unwrap_or_default()),
		("Assigned To", names.assignee_name.clone().unwrap_or_default()),
		("Scheduled", schedule),
		("SLA Due", display_time(ticket.sla_due)),
	];
	let notes: Vec<(String, String, String)> = notes
		.iter()
		.map(|note| {
			(
				note.author_name.clone().unwrap_or_default(),
				display_time(Some(note.note.created_at)),
				note.note.body.clone(),
			)
		})
		.collect();
	let heading = format!("{} {}", ticket.ticket_number, ticket.title);
	let title = heading.clone();
	let description = ticket.description.clone();
	let resolution = ticket.resolution.clone().unwrap_or_default();
	let link = format!("{}/tickets/{}", base_url.trim_end_matches('/'), ticket.id);

	let owner = Owner::new();
	let body = owner.with(move || {
		view! {
			<html lang="en">
				<head>
					<meta charset="utf-8" />
					<title>{title}</title>
					<style>{PRINT_STYLE}</style>
				</head>
				<body>
					<h1>{heading}</h1>
					<table class="fields">
						{fields
							.into_iter()
							.map(|(label, value)| view! {
								<tr>
									<th>{label}</th>
									<td>{value}</td>
								</tr>
							})
							.collect_view()}
					</table>
					<h2>"Description"</h2>
					<div class="description">{description}</div>
					<h2>"Resolution"</h2>
					<div class="resolution">{resolution}</div>
					<h2>"Coordinator Notes"</h2>
					{notes
						.into_iter()
						.map(|(author, time, body)| view! {
							<div class="note">
								<div class="note_header">{author} " - " {time}</div>
								<div class="note_body">{body}</div>
							</div>
						})
						.collect_view()}
					<footer>{link}</footer>
				</body>
			</html>
		}
		.to_html()
	});
	format!("<!DOCTYPE html>{}", body)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::domain::enums::{TicketPriority, TicketStatus};
	use crate::model::CoordinatorNote;

	#[test]
	fn values_are_escaped() {
		let now = Utc::now();
		let ticket = Ticket {
			id: String::from("t1"),
			company_code: String::from("HQ"),
			ticket_number: String::from("HQ-00007"),
			title: String::from("<script>alert(1)</script>"),
			description: String::from("Pump & valve"),
			status: TicketStatus::Closed,
			priority: TicketPriority::Low,
			customer_id: None,
			site_id: None,
			asset_id: None,
			vendor_id: None,
			assigned_to: None,
			scheduled_start: None,
			scheduled_end: None,
			sla_due: None,
			resolution: Some(String::from("Replaced seal")),
			created_by: String::from("u1"),
			created_at: now,
			updated_at: now,
			closed_at: Some(now),
		};
		let names = TicketNames {
			customer_name: Some(String::from("Acme")),
			..TicketNames::default()
		};
		let notes = vec![NoteView {
			note: CoordinatorNote {
				id: String::from("n1"),
				ticket_id: String::from("t1"),
				author_id: String::from("u1"),
				body: String::from("Bring <ladder>"),
				created_at: now,
			},
			author_name: Some(String::from("Kim")),
		}];

		let html = render_ticket(&ticket, &names, &notes, "https://fieldline.example/");
		assert!(html.starts_with("<!DOCTYPE html>"));
		assert!(html.contains("HQ-00007 &lt;script&gt;alert(1)&lt;/script&gt;"));
		assert!(!html.contains("<script>"));
		assert!(html.contains("Pump &amp; valve"));
		assert!(html.contains("Bring &lt;ladder&gt;"));
		assert!(html.contains("Replaced seal"));
		assert!(html.contains("Acme"));
		assert!(html.contains("https://fieldline.example/tickets/t1"));
	}
}
