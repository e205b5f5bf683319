// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::activity::{self, CREATE, UPDATE};
use super::{Scope, companies, customers, sites, tickets};
use crate::domain::enums::{ServiceRequestStatus, TicketPriority};
use crate::domain::sla::SlaTable;
use crate::domain::ticket_changes::{MAX_TITLE_LENGTH, NewTicket, new_ticket};
use crate::domain::validation::{ValidationError, optional_email, optional_text, required, required_max};
use crate::error::{AppError, AppResult};
use crate::model::{ServiceRequest, Ticket};
use crate::schema::service_requests;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Deserialize;

const ENTITY: &str = "service request";
const MAX_DESCRIPTION_LENGTH: usize = 10_000;
const TITLE_PREVIEW_LENGTH: usize = 80;

/// What the public intake form submits.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequestInput {
	pub requester_name: String,
	pub requester_email: Option<String>,
	pub requester_phone: Option<String>,
	pub location: Option<String>,
	pub description: String,
	pub requested_priority: Option<TicketPriority>,
	pub customer_id: Option<String>,
	pub site_id: Option<String>,
}

/// Optional adjustments a coordinator makes while accepting a request.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptRequest {
	pub title: Option<String>,
	pub priority: Option<TicketPriority>,
	pub assigned_to: Option<String>,
	pub scheduled_start: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectRequest {
	pub note: Option<String>,
}

/// The ticket title used when a coordinator doesn't give one: the first line of the description, shortened.
pub fn default_title(description: &str) -> String {
	let first_line = description.lines().map(str::trim).find(|line| !line.is_empty()).unwrap_or("Service request");
	if first_line.chars().count() <= TITLE_PREVIEW_LENGTH {
		first_line.to_string()
	} else {
		let mut title: String = first_line.chars().take(TITLE_PREVIEW_LENGTH - 3).collect();
		title.push_str("...");
		title
	}
}

/// Builds the ticket description: the request text followed by the requester's details.
pub fn ticket_description(request: &ServiceRequest) -> String {
	let mut description = request.description.clone();
	description.push_str("\n\nRequested by ");
	description.push_str(&request.requester_name);
	for detail in [&request.requester_email, &request.requester_phone].into_iter().flatten() {
		description.push_str(", ");
		description.push_str(detail);
	}
	if let Some(location) = &request.location {
		description.push_str("\nLocation: ");
		description.push_str(location);
	}
	description
}

/// Takes a request from the public form. The company must exist and be active.
pub fn submit(db_connection: &mut PgConnection, company_code: &str, input: &ServiceRequestInput) -> AppResult<ServiceRequest> {
	let requester_name = required_max("requesterName", &input.requester_name, 200)?;
	let description = required_max("description", &input.description, MAX_DESCRIPTION_LENGTH)?;
	let requester_email = optional_email("requesterEmail", input.requester_email.as_deref())?;
	let customer_id = optional_text(input.customer_id.as_deref());
	let site_id = optional_text(input.site_id.as_deref());

	db_connection.transaction(|db_connection| {
		let company = companies::find(db_connection, company_code)?;
		let Some(company) = company.filter(|company| company.active) else {
			return Err(AppError::NotFound("company"));
		};
		if let Some(customer_id) = &customer_id {
			if customers::find(db_connection, &company.code, customer_id)?.is_none() {
				return Err(ValidationError::new("customerId", "is not known").into());
			}
		}
		if let Some(site_id) = &site_id {
			let Some(site) = sites::find(db_connection, &company.code, site_id)? else {
				return Err(ValidationError::new("siteId", "is not known").into());
			};
			if customer_id.as_ref().is_some_and(|customer_id| &site.customer_id != customer_id) {
				return Err(ValidationError::new("siteId", "belongs to a different customer").into());
			}
		}

		let request = ServiceRequest {
			id: cuid2::create_id(),
			company_code: company.code.clone(),
			customer_id,
			site_id,
			requester_name,
			requester_email,
			requester_phone: optional_text(input.requester_phone.as_deref()),
			location: optional_text(input.location.as_deref()),
			description,
			requested_priority: input.requested_priority.unwrap_or_default(),
			status: ServiceRequestStatus::Pending,
			ticket_id: None,
			review_note: None,
			reviewed_by: None,
			reviewed_at: None,
			created_at: Utc::now(),
		};
		diesel::insert_into(service_requests::table)
			.values(&request)
			.execute(db_connection)?;
		activity::record(
			db_connection,
			&company.code,
			None,
			CREATE,
			ENTITY,
			&request.id,
			format!("Service request received from {}", request.requester_name),
		)?;
		Ok(request)
	})
}

pub fn list(
	db_connection: &mut PgConnection,
	company_code: &str,
	status: Option<ServiceRequestStatus>,
) -> AppResult<Vec<ServiceRequest>> {
	let mut query = service_requests::table
		.filter(service_requests::company_code.eq(company_code))
		.into_boxed();
	if let Some(status) = status {
		query = query.filter(service_requests::status.eq(status));
	}
	Ok(query
		.order((service_requests::created_at.desc(), service_requests::id))
		.load(db_connection)?)
}

pub fn get(db_connection: &mut PgConnection, company_code: &str, id: &str) -> AppResult<ServiceRequest> {
	service_requests::table
		.filter(service_requests::id.eq(id).and(service_requests::company_code.eq(company_code)))
		.first(db_connection)
		.optional()?
		.ok_or(AppError::NotFound("service request"))
}

fn get_pending_for_update(db_connection: &mut PgConnection, company_code: &str, id: &str) -> AppResult<ServiceRequest> {
	let request: ServiceRequest = service_requests::table
		.filter(service_requests::id.eq(id).and(service_requests::company_code.eq(company_code)))
		.for_update()
		.first(db_connection)
		.optional()?
		.ok_or(AppError::NotFound("service request"))?;
	if request.status != ServiceRequestStatus::Pending {
		return Err(AppError::Conflict(format!(
			"service request was already {}",
			request.status.label().to_lowercase()
		)));
	}
	Ok(request)
}

/// Turns a pending request into a ticket in one transaction.
pub fn accept(
	db_connection: &mut PgConnection,
	scope: Scope,
	sla_table: &SlaTable,
	id: &str,
	accept: &AcceptRequest,
) -> AppResult<(ServiceRequest, Ticket)> {
	db_connection.transaction(|db_connection| {
		let request = get_pending_for_update(db_connection, scope.company_code, id)?;

		let title = match &accept.title {
			Some(title) => required_max("title", title, MAX_TITLE_LENGTH)?,
			None => default_title(&request.description),
		};
		let input = NewTicket {
			title,
			description: ticket_description(&request),
			priority: Some(accept.priority.unwrap_or(request.requested_priority)),
			customer_id: request.customer_id.clone(),
			site_id: request.site_id.clone(),
			assigned_to: accept.assigned_to.clone(),
			scheduled_start: accept.scheduled_start,
			..NewTicket::default()
		};
		let now = Utc::now();
		let draft = new_ticket(&input, now, sla_table)?;
		let ticket = tickets::insert_draft(db_connection, scope, draft)?;

		let request: ServiceRequest = diesel::update(service_requests::table.find(id))
			.set((
				service_requests::status.eq(ServiceRequestStatus::Accepted),
				service_requests::ticket_id.eq(Some(&ticket.id)),
				service_requests::reviewed_by.eq(Some(scope.actor_id)),
				service_requests::reviewed_at.eq(Some(now)),
			))
			.get_result(db_connection)?;
		activity::record(
			db_connection,
			scope.company_code,
			Some(scope.actor_id),
			UPDATE,
			ENTITY,
			id,
			format!("Accepted service request as {}", ticket.ticket_number),
		)?;
		Ok((request, ticket))
	})
}

pub fn reject(db_connection: &mut PgConnection, scope: Scope, id: &str, reject: &RejectRequest) -> AppResult<ServiceRequest> {
	let note = match reject.note.as_deref() {
		Some(note) => Some(required("note", note)?),
		None => None,
	};
	db_connection.transaction(|db_connection| {
		get_pending_for_update(db_connection, scope.company_code, id)?;
		let request: ServiceRequest = diesel::update(service_requests::table.find(id))
			.set((
				service_requests::status.eq(ServiceRequestStatus::Rejected),
				service_requests::review_note.eq(&note),
				service_requests::reviewed_by.eq(Some(scope.actor_id)),
				service_requests::reviewed_at.eq(Some(Utc::now())),
			))
			.get_result(db_connection)?;
		activity::record(
			db_connection,
			scope.company_code,
			Some(scope.actor_id),
			UPDATE,
			ENTITY,
			id,
			"Rejected service request",
		)?;
		Ok(request)
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_title_uses_first_line() {
		assert_eq!(default_title("\n  Leaking pipe in basement\nWater everywhere"), "Leaking pipe in basement");
		assert_eq!(default_title("   "), "Service request");
		let long = "x".repeat(120);
		let title = default_title(&long);
		assert_eq!(title.chars().count(), TITLE_PREVIEW_LENGTH);
		assert!(title.ends_with("..."));
	}

	#[test]
	fn ticket_description_includes_requester() {
		let request = ServiceRequest {
			id: String::from("sr1"),
			company_code: String::from("HQ"),
			customer_id: None,
			site_id: None,
			requester_name: String::from("Dana"),
			requester_email: Some(String::from("dana@example.com")),
			requester_phone: None,
			location: Some(String::from("Building 4")),
			description: String::from("Door sensor stuck"),
			requested_priority: TicketPriority::High,
			status: ServiceRequestStatus::Pending,
			ticket_id: None,
			review_note: None,
			reviewed_by: None,
			reviewed_at: None,
			created_at: Utc::now(),
		};
		assert_eq!(
			ticket_description(&request),
			"Door sensor stuck\n\nRequested by Dana, dana@example.com\nLocation: Building 4"
		);
	}
}
