// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::activity::{self, CREATE, DELETE, UPDATE};
use super::lookup::{NameLookup, TicketNames};
use super::{Scope, assets, customers, sites, users, vendors};
use crate::domain::enums::TicketStatus;
use crate::domain::reports::ReportFilter;
use crate::domain::sla::{SlaTable, is_breached};
use crate::domain::ticket_changes::{NewTicket, TicketChanges, TicketDraft, apply_changes, new_ticket};
use crate::domain::validation::{ValidationError, required_max};
use crate::error::{AppError, AppResult};
use crate::model::{Attachment, AuditEntry, CoordinatorNote, Ticket, TicketUpdate};
use crate::schema::{attachments, audit_entries, companies, coordinator_notes, tickets, users as users_table};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;

const ENTITY: &str = "ticket";

pub const MAX_NOTE_LENGTH: usize = 4000;

/// Which tickets a listing wants.
#[derive(Clone, Debug, Default)]
pub struct TicketQuery {
	pub filter: ReportFilter,
	/// Also list closed and cancelled tickets. Ignored when the filter names statuses.
	pub include_closed: bool,
	/// Only list closed tickets, most recently closed first.
	pub only_closed: bool,
	/// Restricts the listing to one assignee regardless of the filter, for technicians.
	pub restrict_to_assignee: Option<String>,
}

/// A ticket as returned to clients, with its references resolved to names.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketView {
	#[serde(flatten)]
	pub ticket: Ticket,
	#[serde(flatten)]
	pub names: TicketNames,
	pub sla_breached: bool,
}

impl TicketView {
	pub fn new(ticket: Ticket, lookup: &NameLookup, now: DateTime<Utc>) -> Self {
		let names = lookup.ticket_names(&ticket);
		let sla_breached = is_breached(ticket.sla_due, ticket.closed_at, now);
		Self {
			ticket,
			names,
			sla_breached,
		}
	}
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteView {
	#[serde(flatten)]
	pub note: CoordinatorNote,
	pub author_name: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditView {
	#[serde(flatten)]
	pub entry: AuditEntry,
	pub actor_name: Option<String>,
}

pub fn format_ticket_number(company_code: &str, sequence: i32) -> String {
	format!("{}-{:05}", company_code, sequence)
}

/// Takes the company's next ticket number. Must run inside the transaction creating the ticket so that concurrent
/// creations each get their own number.
fn allocate_ticket_number(db_connection: &mut PgConnection, company_code: &str) -> AppResult<String> {
	let next: Option<i32> = diesel::update(companies::table.find(company_code))
		.set(companies::next_ticket_number.eq(companies::next_ticket_number + 1))
		.returning(companies::next_ticket_number)
		.get_result(db_connection)
		.optional()?;
	let Some(next) = next else {
		return Err(AppError::NotFound("company"));
	};
	Ok(format_ticket_number(company_code, next - 1))
}

/// Checks that everything a ticket points at exists in the same company and fits together.
fn check_references(db_connection: &mut PgConnection, company_code: &str, draft: &TicketDraft) -> AppResult<()> {
	if let Some(customer_id) = &draft.customer_id {
		if customers::find(db_connection, company_code, customer_id)?.is_none() {
			return Err(ValidationError::new("customerId", "does not name a customer of this company").into());
		}
	}
	if let Some(site_id) = &draft.site_id {
		let Some(site) = sites::find(db_connection, company_code, site_id)? else {
			return Err(ValidationError::new("siteId", "does not name a site of this company").into());
		};
		if let Some(customer_id) = &draft.customer_id {
			if &site.customer_id != customer_id {
				return Err(ValidationError::new("siteId", "belongs to a different customer").into());
			}
		}
	}
	if let Some(asset_id) = &draft.asset_id {
		let Some(asset) = assets::find(db_connection, company_code, asset_id)? else {
			return Err(ValidationError::new("assetId", "does not name an asset of this company").into());
		};
		if let Some(site_id) = &draft.site_id {
			if &asset.site_id != site_id {
				return Err(ValidationError::new("assetId", "is installed at a different site").into());
			}
		}
	}
	if let Some(vendor_id) = &draft.vendor_id {
		if vendors::find(db_connection, company_code, vendor_id)?.is_none() {
			return Err(ValidationError::new("vendorId", "does not name a vendor of this company").into());
		}
	}
	if let Some(assigned_to) = &draft.assigned_to {
		match users::get(db_connection, company_code, assigned_to) {
			Ok(user) if user.active => (),
			Ok(_) => return Err(ValidationError::new("assignedTo", "is not an active user").into()),
			Err(AppError::NotFound(_)) => {
				return Err(ValidationError::new("assignedTo", "does not name a user of this company").into());
			}
			Err(error) => return Err(error),
		}
	}
	Ok(())
}

/// Loads the tickets a listing could include, before any text or date filtering.
pub fn load(db_connection: &mut PgConnection, company_code: &str, query: &TicketQuery) -> AppResult<Vec<Ticket>> {
	let mut statement = tickets::table
		.filter(tickets::company_code.eq(company_code))
		.into_boxed();
	if let Some(assignee) = &query.restrict_to_assignee {
		statement = statement.filter(tickets::assigned_to.eq(assignee));
	}
	if query.only_closed {
		statement = statement
			.filter(tickets::status.eq(TicketStatus::Closed))
			.order((tickets::closed_at.desc(), tickets::id));
	} else {
		if !query.filter.statuses.is_empty() {
			statement = statement.filter(tickets::status.eq_any(query.filter.statuses.clone()));
		} else if !query.include_closed {
			statement = statement.filter(tickets::status.ne_all(vec![TicketStatus::Closed, TicketStatus::Cancelled]));
		}
		statement = statement.order((tickets::created_at.desc(), tickets::id));
	}
	Ok(statement.load(db_connection)?)
}

/// Lists tickets matching the query, with names resolved.
pub fn list(
	db_connection: &mut PgConnection,
	company_code: &str,
	query: &TicketQuery,
	now: DateTime<Utc>,
) -> AppResult<Vec<TicketView>> {
	let tickets = load(db_connection, company_code, query)?;
	let lookup = NameLookup::load(db_connection, company_code)?;
	Ok(filter_with_lookup(tickets, &lookup, &query.filter)
		.into_iter()
		.map(|ticket| TicketView::new(ticket, &lookup, now))
		.collect())
}

/// Applies the report filter to loaded tickets.
pub fn filter_with_lookup(tickets: Vec<Ticket>, lookup: &NameLookup, filter: &ReportFilter) -> Vec<Ticket> {
	tickets
		.into_iter()
		.filter(|ticket| {
			let report_ticket = ticket.report_ticket(
				lookup.user_name(ticket.assigned_to.as_deref()),
				lookup.customer_name(ticket.customer_id.as_deref()),
			);
			filter.matches(&report_ticket)
		})
		.collect()
}

pub fn get(db_connection: &mut PgConnection, company_code: &str, id: &str) -> AppResult<Ticket> {
	tickets::table
		.filter(tickets::id.eq(id).and(tickets::company_code.eq(company_code)))
		.first(db_connection)
		.optional()?
		.ok_or(AppError::NotFound("ticket"))
}

pub fn create(
	db_connection: &mut PgConnection,
	scope: Scope,
	sla_table: &SlaTable,
	input: &NewTicket,
) -> AppResult<Ticket> {
	let draft = new_ticket(input, Utc::now(), sla_table)?;
	db_connection.transaction(|db_connection| insert_draft(db_connection, scope, draft))
}

/// Stores a validated draft as a new ticket. Callers provide the transaction.
pub fn insert_draft(db_connection: &mut PgConnection, scope: Scope, draft: TicketDraft) -> AppResult<Ticket> {
	check_references(db_connection, scope.company_code, &draft)?;
	let ticket_number = allocate_ticket_number(db_connection, scope.company_code)?;
	let ticket = Ticket::from_draft(
		cuid2::create_id(),
		scope.company_code.to_string(),
		ticket_number,
		scope.actor_id.to_string(),
		draft,
	);
	diesel::insert_into(tickets::table).values(&ticket).execute(db_connection)?;
	activity::record(
		db_connection,
		scope.company_code,
		Some(scope.actor_id),
		CREATE,
		ENTITY,
		&ticket.id,
		format!("Opened {}: {}", ticket.ticket_number, ticket.title),
	)?;
	tracing::info!(company = %scope.company_code, ticket = %ticket.ticket_number, "Ticket created");
	Ok(ticket)
}

/// Applies a partial update, writing one audit entry per changed field.
pub fn update(
	db_connection: &mut PgConnection,
	scope: Scope,
	sla_table: &SlaTable,
	id: &str,
	changes: &TicketChanges,
) -> AppResult<Ticket> {
	db_connection.transaction(|db_connection| {
		let current: Ticket = tickets::table
			.filter(tickets::id.eq(id).and(tickets::company_code.eq(scope.company_code)))
			.for_update()
			.first(db_connection)
			.optional()?
			.ok_or(AppError::NotFound("ticket"))?;

		let now = Utc::now();
		let (next, trail) = apply_changes(&current.draft(), changes, now, sla_table)?;
		if trail.is_empty() {
			return Ok(current);
		}
		check_references(db_connection, scope.company_code, &next)?;

		let updated: Ticket = diesel::update(tickets::table.find(id))
			.set(TicketUpdate::new(next, now))
			.get_result(db_connection)?;

		let entries: Vec<AuditEntry> = trail
			.iter()
			.map(|change| AuditEntry {
				id: cuid2::create_id(),
				ticket_id: id.to_string(),
				actor_id: scope.actor_id.to_string(),
				field: change.field.clone(),
				old_value: change.old_value.clone(),
				new_value: change.new_value.clone(),
				changed_at: now,
			})
			.collect();
		diesel::insert_into(audit_entries::table)
			.values(&entries)
			.execute(db_connection)?;

		let fields: Vec<&str> = trail.iter().map(|change| change.field.as_str()).collect();
		activity::record(
			db_connection,
			scope.company_code,
			Some(scope.actor_id),
			UPDATE,
			ENTITY,
			id,
			format!("Updated {}: {}", updated.ticket_number, fields.join(", ")),
		)?;
		Ok(updated)
	})
}

/// Deletes a ticket with its notes, audit trail and attachment records. Returns the attachments so their files
/// can be removed afterwards.
pub fn delete(db_connection: &mut PgConnection, scope: Scope, id: &str) -> AppResult<Vec<Attachment>> {
	db_connection.transaction(|db_connection| {
		let ticket = get(db_connection, scope.company_code, id)?;
		let attachments: Vec<Attachment> = attachments::table
			.filter(attachments::ticket_id.eq(id))
			.load(db_connection)?;
		diesel::delete(tickets::table.find(id)).execute(db_connection)?;
		activity::record(
			db_connection,
			scope.company_code,
			Some(scope.actor_id),
			DELETE,
			ENTITY,
			id,
			format!("Deleted {}: {}", ticket.ticket_number, ticket.title),
		)?;
		Ok(attachments)
	})
}

pub fn list_notes(db_connection: &mut PgConnection, company_code: &str, ticket_id: &str) -> AppResult<Vec<NoteView>> {
	get(db_connection, company_code, ticket_id)?;
	let notes: Vec<(CoordinatorNote, Option<String>)> = coordinator_notes::table
		.left_join(users_table::table.on(users_table::id.eq(coordinator_notes::author_id)))
		.filter(coordinator_notes::ticket_id.eq(ticket_id))
		.order((coordinator_notes::created_at, coordinator_notes::id))
		.select((coordinator_notes::all_columns, users_table::display_name.nullable()))
		.load(db_connection)?;
	Ok(notes
		.into_iter()
		.map(|(note, author_name)| NoteView { note, author_name })
		.collect())
}

pub fn add_note(db_connection: &mut PgConnection, scope: Scope, ticket_id: &str, body: &str) -> AppResult<CoordinatorNote> {
	let body = required_max("body", body, MAX_NOTE_LENGTH)?;
	db_connection.transaction(|db_connection| {
		let ticket = get(db_connection, scope.company_code, ticket_id)?;
		let note = CoordinatorNote {
			id: cuid2::create_id(),
			ticket_id: ticket_id.to_string(),
			author_id: scope.actor_id.to_string(),
			body,
			created_at: Utc::now(),
		};
		diesel::insert_into(coordinator_notes::table)
			.values(&note)
			.execute(db_connection)?;
		activity::record(
			db_connection,
			scope.company_code,
			Some(scope.actor_id),
			CREATE,
			"note",
			&note.id,
			format!("Added a note to {}", ticket.ticket_number),
		)?;
		Ok(note)
	})
}

pub fn audit_trail(db_connection: &mut PgConnection, company_code: &str, ticket_id: &str) -> AppResult<Vec<AuditView>> {
	get(db_connection, company_code, ticket_id)?;
	let entries: Vec<(AuditEntry, Option<String>)> = audit_entries::table
		.left_join(users_table::table.on(users_table::id.eq(audit_entries::actor_id)))
		.filter(audit_entries::ticket_id.eq(ticket_id))
		.order((audit_entries::changed_at, audit_entries::id))
		.select((audit_entries::all_columns, users_table::display_name.nullable()))
		.load(db_connection)?;
	Ok(entries
		.into_iter()
		.map(|(entry, actor_name)| AuditView { entry, actor_name })
		.collect())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ticket_numbers_are_zero_padded() {
		assert_eq!(format_ticket_number("HQ", 1), "HQ-00001");
		assert_eq!(format_ticket_number("ACME", 12345), "ACME-12345");
		assert_eq!(format_ticket_number("ACME", 123456), "ACME-123456");
	}
}
