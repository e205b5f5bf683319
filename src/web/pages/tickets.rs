// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::utils::{TicketRow, TicketTable};
use crate::domain::enums::TicketStatus;
use leptos::prelude::*;
use leptos_router::hooks::use_query_map;

#[component]
pub fn TicketsPage() -> impl IntoView {
	let query = use_query_map();
	let status = move || query.read().get("status");
	let tickets = Resource::new(status, |status| list_tickets(status, false));

	view! {
		<h2>"Active Tickets"</h2>
		<form id="ticket_filter" method="get" action="/tickets">
			<label>
				"Status "
				<select name="status">
					<option value="">"Any active"</option>
					{
						TicketStatus::ALL.into_iter().map(|option| {
							let selected = move || status().is_some_and(|status| status == option.label());
							view! {
								<option value={option.label()} selected=selected>{option.label()}</option>
							}
						}).collect::<Vec<_>>()
					}
				</select>
			</label>
			<input type="submit" value="Filter" />
		</form>
		<Transition fallback=|| view! { <div class="loading">"Loading tickets..."</div> }>
			{
				move || tickets.read().as_ref().map(|tickets| match tickets {
					Ok(tickets) => view! { <TicketTable tickets={tickets.clone()} /> }.into_any(),
					Err(error) => view! { <p class="error">{error.to_string()}</p> }.into_any(),
				})
			}
		</Transition>
	}
}

/// Lists the tickets the current user can see. `status` is a comma-separated status list; `closed` switches to
/// closed tickets, most recently closed first.
#[server]
pub async fn list_tickets(status: Option<String>, closed: bool) -> Result<Vec<TicketRow>, ServerFnError> {
	use super::server_utils::{request_context, server_error};
	use crate::store::tickets;
	use crate::web::api::tickets::TicketListParams;
	use chrono::Utc;

	let (state, context) = request_context().await?;
	let params = TicketListParams {
		status: status.filter(|status| !status.trim().is_empty()),
		..TicketListParams::default()
	};
	let mut query = params.query(&context).map_err(server_error)?;
	query.only_closed = closed;

	let mut db_connection = state.db_connection_pool.get()?;
	let tickets = tickets::list(&mut db_connection, &context.company.code, &query, Utc::now()).map_err(server_error)?;
	Ok(tickets.into_iter().map(TicketRow::from).collect())
}
