// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::tickets::list_tickets;
use super::utils::TicketTable;
use leptos::prelude::*;

#[component]
pub fn ClosedTicketsPage() -> impl IntoView {
	let tickets = OnceResource::new(list_tickets(None, true));

	view! {
		<h2>"Closed Tickets"</h2>
		<Transition fallback=|| view! { <div class="loading">"Loading tickets..."</div> }>
			{
				move || tickets.read().as_ref().map(|tickets| match tickets {
					Ok(tickets) => view! { <TicketTable tickets={tickets.clone()} show_closed_at=true /> }.into_any(),
					Err(error) => view! { <p class="error">{error.to_string()}</p> }.into_any(),
				})
			}
		</Transition>
	}
}
