// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Database records. Field order follows the column order in [crate::schema].

use crate::domain::enums::{ServiceRequestStatus, TicketPriority, TicketStatus, UserRole};
use crate::domain::reports::ReportTicket;
use crate::domain::ticket_changes::TicketDraft;
use crate::schema::{
	activity_log, api_tokens, assets, attachments, audit_entries, companies, coordinator_notes, customers, licenses,
	service_requests, sessions, sites, tickets, users, vendors,
};
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::Serialize;

/// A tenant. Everything else in the database belongs to exactly one company.
#[derive(Clone, Debug, Insertable, Queryable, Serialize)]
#[diesel(table_name = companies)]
#[serde(rename_all = "camelCase")]
pub struct Company {
	/// Short upper-case code, also used as the ticket number prefix
	pub code: String,
	pub name: String,
	pub active: bool,
	#[serde(skip)]
	pub next_ticket_number: i32,
	pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Insertable, Queryable, Serialize)]
#[diesel(table_name = users)]
#[serde(rename_all = "camelCase")]
pub struct User {
	pub id: String,
	pub company_code: String,
	pub username: String,
	pub display_name: String,
	pub email: Option<String>,
	pub role: UserRole,
	#[serde(skip)]
	pub password_hash: String,
	pub active: bool,
	pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Insertable, Queryable)]
#[diesel(table_name = api_tokens)]
pub struct ApiToken {
	/// Hex SHA-256 of the token handed to the client; the token itself is never stored.
	pub token_hash: String,
	pub user_id: String,
	pub created_at: DateTime<Utc>,
	pub expires_at: DateTime<Utc>,
}

#[derive(Insertable, Queryable)]
#[diesel(table_name = sessions)]
pub struct Session {
	pub session_id: BigDecimal,
	pub data: String,
	pub expires: DateTime<Utc>,
}

#[derive(Clone, Debug, Insertable, Queryable, Serialize)]
#[diesel(table_name = customers)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
	pub id: String,
	pub company_code: String,
	pub name: String,
	pub contact_name: Option<String>,
	pub contact_email: Option<String>,
	pub contact_phone: Option<String>,
	pub address: Option<String>,
	pub notes: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Insertable, Queryable, Serialize)]
#[diesel(table_name = sites)]
#[serde(rename_all = "camelCase")]
pub struct Site {
	pub id: String,
	pub company_code: String,
	pub customer_id: String,
	pub name: String,
	pub address: Option<String>,
	pub city: Option<String>,
	pub region: Option<String>,
	pub postal_code: Option<String>,
	/// Kept as entered; parsed only when markers are drawn.
	pub latitude: Option<String>,
	pub longitude: Option<String>,
	pub notes: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Site {
	/// The address parts that are filled in, joined for display.
	pub fn full_address(&self) -> Option<String> {
		let parts: Vec<&str> = [&self.address, &self.city, &self.region, &self.postal_code]
			.into_iter()
			.filter_map(|part| part.as_deref())
			.collect();
		if parts.is_empty() { None } else { Some(parts.join(", ")) }
	}
}

#[derive(Clone, Debug, Insertable, Queryable, Serialize)]
#[diesel(table_name = assets)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
	pub id: String,
	pub company_code: String,
	pub site_id: String,
	pub name: String,
	pub asset_type: Option<String>,
	pub manufacturer: Option<String>,
	pub model: Option<String>,
	pub serial_number: Option<String>,
	pub install_date: Option<NaiveDate>,
	pub warranty_expires: Option<NaiveDate>,
	pub notes: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Insertable, Queryable, Serialize)]
#[diesel(table_name = vendors)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
	pub id: String,
	pub company_code: String,
	pub name: String,
	pub contact_name: Option<String>,
	pub email: Option<String>,
	pub phone: Option<String>,
	pub service_area: Option<String>,
	pub notes: Option<String>,
	pub active: bool,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Insertable, Queryable, Serialize)]
#[diesel(table_name = licenses)]
#[serde(rename_all = "camelCase")]
pub struct License {
	pub id: String,
	pub company_code: String,
	pub product: String,
	pub vendor_id: Option<String>,
	pub customer_id: Option<String>,
	pub license_key: Option<String>,
	pub seats: i32,
	pub expires_on: Option<NaiveDate>,
	pub notes: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Insertable, Queryable, Serialize)]
#[diesel(table_name = tickets)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
	pub id: String,
	pub company_code: String,
	/// `<company code>-<sequence>`, e.g. `HQ-00042`
	pub ticket_number: String,
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
	pub created_by: String,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub closed_at: Option<DateTime<Utc>>,
}

impl Ticket {
	pub fn from_draft(
		id: String,
		company_code: String,
		ticket_number: String,
		created_by: String,
		draft: TicketDraft,
	) -> Self {
		Self {
			id,
			company_code,
			ticket_number,
			title: draft.title,
			description: draft.description,
			status: draft.status,
			priority: draft.priority,
			customer_id: draft.customer_id,
			site_id: draft.site_id,
			asset_id: draft.asset_id,
			vendor_id: draft.vendor_id,
			assigned_to: draft.assigned_to,
			scheduled_start: draft.scheduled_start,
			scheduled_end: draft.scheduled_end,
			sla_due: draft.sla_due,
			resolution: draft.resolution,
			created_by,
			created_at: draft.created_at,
			updated_at: draft.created_at,
			closed_at: draft.closed_at,
		}
	}

	/// Gets the editable part of the ticket.
	pub fn draft(&self) -> TicketDraft {
		TicketDraft {
			title: self.title.clone(),
			description: self.description.clone(),
			status: self.status,
			priority: self.priority,
			customer_id: self.customer_id.clone(),
			site_id: self.site_id.clone(),
			asset_id: self.asset_id.clone(),
			vendor_id: self.vendor_id.clone(),
			assigned_to: self.assigned_to.clone(),
			scheduled_start: self.scheduled_start,
			scheduled_end: self.scheduled_end,
			sla_due: self.sla_due,
			resolution: self.resolution.clone(),
			created_at: self.created_at,
			closed_at: self.closed_at,
		}
	}

	pub fn report_ticket(&self, assignee_name: Option<String>, customer_name: Option<String>) -> ReportTicket {
		ReportTicket {
			id: self.id.clone(),
			ticket_number: self.ticket_number.clone(),
			title: self.title.clone(),
			description: self.description.clone(),
			status: self.status,
			priority: self.priority,
			assigned_to: self.assigned_to.clone(),
			assignee_name,
			customer_id: self.customer_id.clone(),
			customer_name,
			created_at: self.created_at,
			closed_at: self.closed_at,
			sla_due: self.sla_due,
		}
	}
}

/// The stored columns a ticket update may rewrite.
#[derive(AsChangeset)]
#[diesel(table_name = tickets, treat_none_as_null = true)]
pub struct TicketUpdate {
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
	pub updated_at: DateTime<Utc>,
	pub closed_at: Option<DateTime<Utc>>,
}

impl TicketUpdate {
	pub fn new(draft: TicketDraft, updated_at: DateTime<Utc>) -> Self {
		Self {
			title: draft.title,
			description: draft.description,
			status: draft.status,
			priority: draft.priority,
			customer_id: draft.customer_id,
			site_id: draft.site_id,
			asset_id: draft.asset_id,
			vendor_id: draft.vendor_id,
			assigned_to: draft.assigned_to,
			scheduled_start: draft.scheduled_start,
			scheduled_end: draft.scheduled_end,
			sla_due: draft.sla_due,
			resolution: draft.resolution,
			updated_at,
			closed_at: draft.closed_at,
		}
	}
}

#[derive(Clone, Debug, Insertable, Queryable, Serialize)]
#[diesel(table_name = coordinator_notes)]
#[serde(rename_all = "camelCase")]
pub struct CoordinatorNote {
	pub id: String,
	pub ticket_id: String,
	pub author_id: String,
	pub body: String,
	pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Insertable, Queryable, Serialize)]
#[diesel(table_name = audit_entries)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
	pub id: String,
	pub ticket_id: String,
	pub actor_id: String,
	pub field: String,
	pub old_value: Option<String>,
	pub new_value: Option<String>,
	pub changed_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Insertable, Queryable, Serialize)]
#[diesel(table_name = attachments)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
	pub id: String,
	pub company_code: String,
	pub ticket_id: String,
	pub file_name: String,
	pub content_type: String,
	pub size_bytes: i64,
	pub uploaded_by: String,
	pub uploaded_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Insertable, Queryable, Serialize)]
#[diesel(table_name = activity_log)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogEntry {
	pub id: String,
	pub company_code: String,
	/// Empty for actions taken by anonymous requests, such as public service requests
	pub actor_id: Option<String>,
	pub action: String,
	pub entity_type: String,
	pub entity_id: String,
	pub summary: String,
	pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Insertable, Queryable, Serialize)]
#[diesel(table_name = service_requests)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
	pub id: String,
	pub company_code: String,
	pub customer_id: Option<String>,
	pub site_id: Option<String>,
	pub requester_name: String,
	pub requester_email: Option<String>,
	pub requester_phone: Option<String>,
	pub location: Option<String>,
	pub description: String,
	pub requested_priority: TicketPriority,
	pub status: ServiceRequestStatus,
	pub ticket_id: Option<String>,
	pub review_note: Option<String>,
	pub reviewed_by: Option<String>,
	pub reviewed_at: Option<DateTime<Utc>>,
	pub created_at: DateTime<Utc>,
}
