// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::utils::{TicketRow, TicketTable, get_ticket_counts};
use leptos::prelude::*;

#[component]
pub fn Dashboard() -> impl IntoView {
	let counts = OnceResource::new(get_ticket_counts());
	let upcoming = OnceResource::new(get_upcoming_tickets());

	view! {
		<div id="dashboard_layout">
			<section id="dashboard_counts">
				<h2>"Tickets by Status"</h2>
				<Transition fallback=|| view! { <div class="loading">"Loading counts..."</div> }>
					{
						move || counts.read().as_ref().and_then(|counts| counts.as_ref().ok()).map(|counts| {
							let active = counts.active;
							view! {
								<table class="dashboard_counts">
									<tbody>
										{
											counts.by_status.iter().map(|(status, count)| view! {
												<tr>
													<td>
														<a href={format!("/tickets?status={}", status.label())}>{status.label()}</a>
													</td>
													<td>{*count}</td>
												</tr>
											}).collect::<Vec<_>>()
										}
									</tbody>
									<tfoot>
										<tr>
											<th>"Active"</th>
											<th>{active}</th>
										</tr>
									</tfoot>
								</table>
							}
						})
					}
				</Transition>
			</section>
			<section id="dashboard_upcoming">
				<h2>"Your Next Scheduled Tickets"</h2>
				<Transition fallback=|| view! { <div class="loading">"Loading tickets..."</div> }>
					{
						move || upcoming
							.read()
							.as_ref()
							.and_then(|tickets| tickets.as_ref().ok())
							.map(|tickets| view! { <TicketTable tickets={tickets.clone()} /> })
					}
				</Transition>
			</section>
		</div>
	}
}

/// Active tickets assigned to the current user that are scheduled from today on, soonest first.
#[server]
async fn get_upcoming_tickets() -> Result<Vec<TicketRow>, ServerFnError> {
	use super::server_utils::{request_context, server_error};
	use crate::domain::reports::ReportFilter;
	use crate::store::tickets::{self, TicketQuery};
	use chrono::Utc;

	const UPCOMING_TICKET_LIMIT: usize = 10;

	let (state, context) = request_context().await?;
	let mut db_connection = state.db_connection_pool.get()?;

	let now = Utc::now();
	let start_of_today = now
		.date_naive()
		.and_hms_opt(0, 0, 0)
		.map(|start| start.and_utc())
		.unwrap_or(now);
	let query = TicketQuery {
		filter: ReportFilter {
			assigned_to: Some(context.user.id.clone()),
			..ReportFilter::default()
		},
		..TicketQuery::default()
	};
	let mut upcoming: Vec<_> = tickets::list(&mut db_connection, &context.company.code, &query, now)
		.map_err(server_error)?
		.into_iter()
		.filter(|view| view.ticket.scheduled_start.is_some_and(|start| start >= start_of_today))
		.collect();
	upcoming.sort_by(|a, b| a.ticket.scheduled_start.cmp(&b.ticket.scheduled_start));
	upcoming.truncate(UPCOMING_TICKET_LIMIT);

	Ok(upcoming.into_iter().map(TicketRow::from).collect())
}
