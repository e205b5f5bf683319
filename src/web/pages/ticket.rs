// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::errors::not_found::NotFound;
use super::utils::{TicketParams, TicketRow, display_time};
use chrono::{DateTime, Utc};
use leptos::prelude::*;
use leptos_router::hooks::use_params;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TicketDetail {
	pub row: TicketRow,
	pub description: String,
	pub resolution: Option<String>,
	pub site_address: Option<String>,
	pub asset_name: Option<String>,
	pub vendor_name: Option<String>,
	pub scheduled_end: Option<DateTime<Utc>>,
	pub notes: Vec<NoteRow>,
	pub audit: Vec<AuditRow>,
	pub attachments: Vec<AttachmentRow>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NoteRow {
	pub id: String,
	pub author_name: Option<String>,
	pub created_at: DateTime<Utc>,
	pub body: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AuditRow {
	pub id: String,
	pub actor_name: Option<String>,
	pub field: String,
	pub old_value: Option<String>,
	pub new_value: Option<String>,
	pub changed_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AttachmentRow {
	pub id: String,
	pub file_name: String,
	pub size_bytes: i64,
	pub uploaded_at: DateTime<Utc>,
}

#[component]
pub fn TicketPage() -> impl IntoView {
	let params = use_params::<TicketParams>();
	let params = params.read();
	let ticket_id = params.as_ref().ok().and_then(|params| params.id.clone());

	let Some(ticket_id) = ticket_id else {
		return view! { <NotFound /> }.into_any();
	};

	let add_note = ServerAction::<AddNote>::new();
	let ticket = {
		let ticket_id = ticket_id.clone();
		Resource::new(
			move || add_note.version().get(),
			move |_| get_ticket_detail(ticket_id.clone()),
		)
	};

	view! {
		<Transition fallback=|| view! { <div id="ticket_view_loading">"Loading ticket..."</div> }>
			{
				move || match ticket.read().as_ref().and_then(|ticket| ticket.as_ref().ok()).cloned().flatten() {
					Some(ticket) => {
						let row = ticket.row;
						let fields: Vec<(&'static str, String)> = vec![
							("Status", row.status.label().to_string()),
							("Priority", row.priority.label().to_string()),
							("Customer", row.customer_name.unwrap_or_default()),
							("Site", row.site_name.unwrap_or_default()),
							("Address", ticket.site_address.unwrap_or_default()),
							("Asset", ticket.asset_name.unwrap_or_default()),
							("Vendor", ticket.vendor_name.unwrap_or_default()),
							("Assigned To", row.assignee_name.unwrap_or_default()),
							("Scheduled Start", display_time(row.scheduled_start)),
							("Scheduled End", display_time(ticket.scheduled_end)),
							("SLA Due", display_time(row.sla_due)),
							("Closed", display_time(row.closed_at)),
						];
						view! {
							<div id="ticket_header">
								<h1 id="ticket_title">{row.ticket_number.clone()} " " {row.title.clone()}</h1>
								<a id="ticket_print_link" href={format!("/api/tickets/{}/print", row.id)} target="_blank">
									"Print"
								</a>
								{row.sla_breached.then(|| view! { <span class="sla_breached_flag">"SLA breached"</span> })}
							</div>
							<table id="ticket_fields">
								<tbody>
									{
										fields.into_iter().map(|(label, value)| view! {
											<tr>
												<th>{label}</th>
												<td>{value}</td>
											</tr>
										}).collect::<Vec<_>>()
									}
								</tbody>
							</table>
							<h2>"Description"</h2>
							<div id="ticket_description">{ticket.description}</div>
							<h2>"Resolution"</h2>
							<div id="ticket_resolution">{ticket.resolution.unwrap_or_default()}</div>
							<h2>"Coordinator Notes"</h2>
							<div id="ticket_notes">
								{
									ticket.notes.into_iter().map(|note| view! {
										<div class="ticket_note">
											<div class="ticket_note_start">
												<span class="ticket_note_author">{note.author_name.unwrap_or_default()}</span>
												<span class="ticket_note_time">{display_time(Some(note.created_at))}</span>
											</div>
											<div class="ticket_note_body">{note.body}</div>
										</div>
									}).collect::<Vec<_>>()
								}
							</div>
							<ActionForm action=add_note>
								<input type="hidden" name="ticket_id" value={row.id.clone()} />
								<textarea name="body" required=true></textarea>
								<input type="submit" value="Add Note" />
							</ActionForm>
							<h2>"Attachments"</h2>
							<ul id="ticket_attachments">
								{
									ticket.attachments.into_iter().map(|attachment| view! {
										<li>
											<a href={format!("/api/attachments/{}", attachment.id)}>{attachment.file_name}</a>
											" (" {format_size(attachment.size_bytes)} ", " {display_time(Some(attachment.uploaded_at))} ")"
										</li>
									}).collect::<Vec<_>>()
								}
							</ul>
							<h2>"History"</h2>
							<table id="ticket_audit">
								<thead>
									<tr>
										<th>"When"</th>
										<th>"Who"</th>
										<th>"Field"</th>
										<th>"From"</th>
										<th>"To"</th>
									</tr>
								</thead>
								<tbody>
									{
										ticket.audit.into_iter().map(|entry| view! {
											<tr>
												<td>{display_time(Some(entry.changed_at))}</td>
												<td>{entry.actor_name.unwrap_or_default()}</td>
												<td>{entry.field}</td>
												<td>{entry.old_value.unwrap_or_default()}</td>
												<td>{entry.new_value.unwrap_or_default()}</td>
											</tr>
										}).collect::<Vec<_>>()
									}
								</tbody>
							</table>
						}.into_any()
					}
					None => view! { <NotFound /> }.into_any(),
				}
			}
		</Transition>
	}
	.into_any()
}

fn format_size(size_bytes: i64) -> String {
	const KIB: i64 = 1024;
	const MIB: i64 = 1024 * KIB;
	if size_bytes >= MIB {
		format!("{:.1} MiB", size_bytes as f64 / MIB as f64)
	} else if size_bytes >= KIB {
		format!("{:.1} KiB", size_bytes as f64 / KIB as f64)
	} else {
		format!("{} bytes", size_bytes)
	}
}

#[server]
async fn get_ticket_detail(ticket_id: String) -> Result<Option<TicketDetail>, ServerFnError> {
	use super::server_utils::{request_context, server_error};
	use crate::error::AppError;
	use crate::store::lookup::NameLookup;
	use crate::store::tickets::{self, TicketView};
	use crate::store::attachments;
	use crate::web::api::tickets::visible_ticket;

	let (state, context) = request_context().await?;
	let mut db_connection = state.db_connection_pool.get()?;

	let ticket = match visible_ticket(&mut db_connection, &context, &ticket_id) {
		Ok(ticket) => ticket,
		Err(AppError::NotFound(_)) => return Ok(None),
		Err(error) => return Err(server_error(error)),
	};
	let company_code = &context.company.code;
	let lookup = NameLookup::load(&mut db_connection, company_code).map_err(server_error)?;
	let notes = tickets::list_notes(&mut db_connection, company_code, &ticket.id).map_err(server_error)?;
	let audit = tickets::audit_trail(&mut db_connection, company_code, &ticket.id).map_err(server_error)?;
	let ticket_attachments =
		attachments::list_for_ticket(&mut db_connection, company_code, &ticket.id).map_err(server_error)?;

	let view = TicketView::new(ticket, &lookup, chrono::Utc::now());
	let description = view.ticket.description.clone();
	let resolution = view.ticket.resolution.clone();
	let scheduled_end = view.ticket.scheduled_end;
	let site_address = view.names.site_address.clone();
	let asset_name = view.names.asset_name.clone();
	let vendor_name = view.names.vendor_name.clone();

	Ok(Some(TicketDetail {
		row: TicketRow::from(view),
		description,
		resolution,
		site_address,
		asset_name,
		vendor_name,
		scheduled_end,
		notes: notes
			.into_iter()
			.map(|note| NoteRow {
				id: note.note.id,
				author_name: note.author_name,
				created_at: note.note.created_at,
				body: note.note.body,
			})
			.collect(),
		audit: audit
			.into_iter()
			.map(|entry| AuditRow {
				id: entry.entry.id,
				actor_name: entry.actor_name,
				field: entry.entry.field,
				old_value: entry.entry.old_value,
				new_value: entry.entry.new_value,
				changed_at: entry.entry.changed_at,
			})
			.collect(),
		attachments: ticket_attachments
			.into_iter()
			.map(|attachment| AttachmentRow {
				id: attachment.id,
				file_name: attachment.file_name,
				size_bytes: attachment.size_bytes,
				uploaded_at: attachment.uploaded_at,
			})
			.collect(),
	}))
}

#[server]
async fn add_note(ticket_id: String, body: String) -> Result<(), ServerFnError> {
	use super::server_utils::{request_context, server_error};
	use crate::store::tickets;
	use crate::web::api::tickets::visible_ticket;

	let (state, context) = request_context().await?;
	let mut db_connection = state.db_connection_pool.get()?;
	let ticket = visible_ticket(&mut db_connection, &context, &ticket_id).map_err(server_error)?;
	tickets::add_note(&mut db_connection, context.scope(), &ticket.id, &body).map_err(server_error)?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sizes_are_readable() {
		assert_eq!(format_size(512), "512 bytes");
		assert_eq!(format_size(2048), "2.0 KiB");
		assert_eq!(format_size(5 * 1024 * 1024 + 512 * 1024), "5.5 MiB");
	}
}
