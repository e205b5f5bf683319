// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::utils::TicketRow;
use crate::error::AppError;
use crate::store::tickets::TicketView;
use crate::web::context::RequestContext;
use crate::web::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use leptos::prelude::*;

/// Converts a failure for a server function, hiding internal details the same way the JSON API does.
pub fn server_error(error: AppError) -> ServerFnError {
	if error.status_code() == StatusCode::INTERNAL_SERVER_ERROR {
		tracing::error!(source = ?error, "Server function failed");
	}
	ServerFnError::new(error.public_message())
}

/// Gets the app state and the signed-in user's context for a request.
/// Must be used from a server function; relies on extracting request data.
pub async fn request_context() -> Result<(AppState, RequestContext), ServerFnError> {
	let state: AppState = expect_context();
	let Some(mut parts) = use_context::<Parts>() else {
		return Err(ServerFnError::new("request data unavailable"));
	};
	let context = RequestContext::from_request_parts(&mut parts, &state)
		.await
		.map_err(server_error)?;
	Ok((state, context))
}

impl From<TicketView> for TicketRow {
	fn from(view: TicketView) -> Self {
		let ticket = view.ticket;
		Self {
			id: ticket.id,
			ticket_number: ticket.ticket_number,
			title: ticket.title,
			status: ticket.status,
			priority: ticket.priority,
			customer_name: view.names.customer_name,
			site_name: view.names.site_name,
			assignee_name: view.names.assignee_name,
			scheduled_start: ticket.scheduled_start,
			sla_due: ticket.sla_due,
			sla_breached: view.sla_breached,
			closed_at: ticket.closed_at,
		}
	}
}
