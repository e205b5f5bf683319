// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::{ApiJson, ApiPath, ApiQuery};
use crate::config::ConfigData;
use crate::database::DbPool;
use crate::domain::enums::{TicketPriority, TicketStatus, parse_list};
use crate::domain::reports::{ReportFilter, StatusCounts, status_counts};
use crate::domain::ticket_changes::{NewTicket, TicketChanges};
use crate::domain::validation::{optional_text, ordered};
use crate::error::{AppError, AppResult};
use crate::model::{Attachment, CoordinatorNote, Ticket};
use crate::store::lookup::NameLookup;
use crate::store::tickets::{self, AuditView, NoteView, TicketQuery, TicketView};
use crate::web::context::RequestContext;
use crate::web::export::tickets_csv;
use crate::web::permissions;
use crate::web::print::render_ticket;
use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use chrono::{NaiveDate, Utc};
use diesel::PgConnection;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Query string accepted by ticket listings, reports and the CSV export.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketListParams {
	/// Comma-separated statuses
	pub status: Option<String>,
	pub priority: Option<String>,
	pub assigned_to: Option<String>,
	pub customer_id: Option<String>,
	pub from: Option<NaiveDate>,
	pub to: Option<NaiveDate>,
	pub q: Option<String>,
	#[serde(default)]
	pub include_closed: bool,
}

impl TicketListParams {
	pub fn filter(&self) -> AppResult<ReportFilter> {
		let statuses: Vec<TicketStatus> = match &self.status {
			Some(status) => parse_list(status)?,
			None => Vec::new(),
		};
		let priority = match optional_text(self.priority.as_deref()) {
			Some(priority) => Some(priority.parse::<TicketPriority>()?),
			None => None,
		};
		ordered("to", self.from.as_ref(), self.to.as_ref())?;
		Ok(ReportFilter {
			statuses,
			priority,
			assigned_to: optional_text(self.assigned_to.as_deref()),
			customer_id: optional_text(self.customer_id.as_deref()),
			from: self.from,
			to: self.to,
			query: optional_text(self.q.as_deref()),
		})
	}

	/// The listing query for this request, limited to what the caller may see.
	pub fn query(&self, context: &RequestContext) -> AppResult<TicketQuery> {
		Ok(TicketQuery {
			filter: self.filter()?,
			include_closed: self.include_closed,
			only_closed: false,
			restrict_to_assignee: context.ticket_restriction(),
		})
	}
}

#[derive(Debug, Deserialize)]
pub struct NewNote {
	body: String,
}

/// Gets a ticket the caller is allowed to see. Tickets hidden from technicians look like they don't exist.
pub fn visible_ticket(db_connection: &mut PgConnection, context: &RequestContext, id: &str) -> AppResult<Ticket> {
	let ticket = tickets::get(db_connection, &context.company.code, id)?;
	if context.can_view_ticket(&ticket) {
		Ok(ticket)
	} else {
		Err(AppError::NotFound("ticket"))
	}
}

fn view(db_connection: &mut PgConnection, company_code: &str, ticket: Ticket) -> AppResult<TicketView> {
	let lookup = NameLookup::load(db_connection, company_code)?;
	Ok(TicketView::new(ticket, &lookup, Utc::now()))
}

/// Counts for the ticket badge, over every ticket the caller can see.
pub fn count_tickets(db_connection: &mut PgConnection, context: &RequestContext) -> AppResult<StatusCounts> {
	let query = TicketQuery {
		include_closed: true,
		restrict_to_assignee: context.ticket_restriction(),
		..TicketQuery::default()
	};
	let tickets = tickets::load(db_connection, &context.company.code, &query)?;
	Ok(status_counts(tickets.iter().map(|ticket| &ticket.status)))
}

/// Removes attachment files whose records are gone. Failures only leave stray files behind, so they're logged.
pub async fn remove_attachment_files(attachment_dir: &Path, attachments: &[Attachment]) {
	for attachment in attachments {
		let path = crate::store::attachments::file_path(attachment_dir, &attachment.company_code, &attachment.id);
		if let Err(error) = tokio::fs::remove_file(&path).await {
			tracing::warn!(source = ?error, path = %path.display(), "Couldn't remove attachment file");
		}
	}
}

pub async fn list(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiQuery(params): ApiQuery<TicketListParams>,
) -> AppResult<Json<Vec<TicketView>>> {
	let query = params.query(&context)?;
	let mut db_connection = db_connection_pool.get()?;
	let tickets = tickets::list(&mut db_connection, &context.company.code, &query, Utc::now())?;
	Ok(Json(tickets))
}

pub async fn closed(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiQuery(params): ApiQuery<TicketListParams>,
) -> AppResult<Json<Vec<TicketView>>> {
	let query = TicketQuery {
		only_closed: true,
		..params.query(&context)?
	};
	let mut db_connection = db_connection_pool.get()?;
	let tickets = tickets::list(&mut db_connection, &context.company.code, &query, Utc::now())?;
	Ok(Json(tickets))
}

pub async fn counts(context: RequestContext, State(db_connection_pool): State<DbPool>) -> AppResult<Json<StatusCounts>> {
	let mut db_connection = db_connection_pool.get()?;
	Ok(Json(count_tickets(&mut db_connection, &context)?))
}

pub async fn export_csv(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiQuery(params): ApiQuery<TicketListParams>,
) -> AppResult<Response> {
	let query = params.query(&context)?;
	let mut db_connection = db_connection_pool.get()?;
	let loaded = tickets::load(&mut db_connection, &context.company.code, &query)?;
	let lookup = NameLookup::load(&mut db_connection, &context.company.code)?;
	let tickets = tickets::filter_with_lookup(loaded, &lookup, &query.filter);
	let csv = tickets_csv(&tickets, &lookup)?;
	Ok((
		[
			(header::CONTENT_TYPE, "text/csv; charset=utf-8"),
			(header::CONTENT_DISPOSITION, "attachment; filename=\"tickets.csv\""),
		],
		csv,
	)
		.into_response())
}

pub async fn create(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	State(config): State<Arc<ConfigData>>,
	ApiJson(input): ApiJson<NewTicket>,
) -> AppResult<(StatusCode, Json<TicketView>)> {
	context.require(permissions::can_create_tickets)?;
	let mut db_connection = db_connection_pool.get()?;
	let ticket = tickets::create(&mut db_connection, context.scope(), &config.sla, &input)?;
	let view = view(&mut db_connection, &context.company.code, ticket)?;
	Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiPath(id): ApiPath<String>,
) -> AppResult<Json<TicketView>> {
	let mut db_connection = db_connection_pool.get()?;
	let ticket = visible_ticket(&mut db_connection, &context, &id)?;
	Ok(Json(view(&mut db_connection, &context.company.code, ticket)?))
}

pub async fn update(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	State(config): State<Arc<ConfigData>>,
	ApiPath(id): ApiPath<String>,
	ApiJson(changes): ApiJson<TicketChanges>,
) -> AppResult<Json<TicketView>> {
	if let Some(field) = permissions::disallowed_ticket_field(context.role(), &changes.touched_fields()) {
		return Err(AppError::forbidden(format!("your role may not change {}", field)));
	}
	let mut db_connection = db_connection_pool.get()?;
	visible_ticket(&mut db_connection, &context, &id)?;
	let ticket = tickets::update(&mut db_connection, context.scope(), &config.sla, &id, &changes)?;
	Ok(Json(view(&mut db_connection, &context.company.code, ticket)?))
}

pub async fn delete(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	State(config): State<Arc<ConfigData>>,
	ApiPath(id): ApiPath<String>,
) -> AppResult<StatusCode> {
	context.require(permissions::can_delete)?;
	let attachments = {
		let mut db_connection = db_connection_pool.get()?;
		tickets::delete(&mut db_connection, context.scope(), &id)?
	};
	remove_attachment_files(&config.web.attachment_dir, &attachments).await;
	Ok(StatusCode::NO_CONTENT)
}

pub async fn print(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	State(config): State<Arc<ConfigData>>,
	ApiPath(id): ApiPath<String>,
) -> AppResult<Html<String>> {
	let mut db_connection = db_connection_pool.get()?;
	let ticket = visible_ticket(&mut db_connection, &context, &id)?;
	let lookup = NameLookup::load(&mut db_connection, &context.company.code)?;
	let notes = tickets::list_notes(&mut db_connection, &context.company.code, &ticket.id)?;
	let names = lookup.ticket_names(&ticket);
	Ok(Html(render_ticket(&ticket, &names, &notes, &config.web.base_url)))
}

pub async fn list_notes(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiPath(id): ApiPath<String>,
) -> AppResult<Json<Vec<NoteView>>> {
	let mut db_connection = db_connection_pool.get()?;
	let ticket = visible_ticket(&mut db_connection, &context, &id)?;
	Ok(Json(tickets::list_notes(&mut db_connection, &context.company.code, &ticket.id)?))
}

pub async fn add_note(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiPath(id): ApiPath<String>,
	ApiJson(note): ApiJson<NewNote>,
) -> AppResult<(StatusCode, Json<CoordinatorNote>)> {
	let mut db_connection = db_connection_pool.get()?;
	let ticket = visible_ticket(&mut db_connection, &context, &id)?;
	let note = tickets::add_note(&mut db_connection, context.scope(), &ticket.id, &note.body)?;
	Ok((StatusCode::CREATED, Json(note)))
}

pub async fn audit(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiPath(id): ApiPath<String>,
) -> AppResult<Json<Vec<AuditView>>> {
	let mut db_connection = db_connection_pool.get()?;
	let ticket = visible_ticket(&mut db_connection, &context, &id)?;
	Ok(Json(tickets::audit_trail(&mut db_connection, &context.company.code, &ticket.id)?))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn params_become_a_filter() {
		let params = TicketListParams {
			status: Some(String::from("open, in_progress")),
			priority: Some(String::from("high")),
			q: Some(String::from("  ")),
			from: NaiveDate::from_ymd_opt(2025, 1, 1),
			..TicketListParams::default()
		};
		let filter = params.filter().unwrap();
		assert_eq!(filter.statuses, vec![TicketStatus::Open, TicketStatus::InProgress]);
		assert_eq!(filter.priority, Some(TicketPriority::High));
		assert_eq!(filter.query, None);
	}

	#[test]
	fn bad_params_are_rejected() {
		let params = TicketListParams {
			status: Some(String::from("finished")),
			..TicketListParams::default()
		};
		assert!(matches!(params.filter(), Err(AppError::BadRequest(_))));

		let params = TicketListParams {
			from: NaiveDate::from_ymd_opt(2025, 2, 1),
			to: NaiveDate::from_ymd_opt(2025, 1, 1),
			..TicketListParams::default()
		};
		assert!(matches!(params.filter(), Err(AppError::Validation(_))));
	}
}
