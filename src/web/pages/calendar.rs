// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::utils::{display_time, make_ticket_url};
use crate::domain::calendar::CalendarDay;
use leptos::prelude::*;
use leptos_router::hooks::use_query_map;

#[component]
pub fn CalendarPage() -> impl IntoView {
	let query = use_query_map();
	let calendar = Resource::new(
		move || {
			let query = query.read();
			(query.get("from"), query.get("to"))
		},
		|(from, to)| get_calendar(from, to),
	);

	view! {
		<h1>"Schedule"</h1>
		<form id="calendar_range" method="get" action="/calendar">
			<label>"From " <input type="date" name="from" value=move || query.read().get("from").unwrap_or_default() /></label>
			<label>"To " <input type="date" name="to" value=move || query.read().get("to").unwrap_or_default() /></label>
			<input type="submit" value="Show" />
		</form>
		<Transition fallback=|| view! { <div class="loading">"Loading schedule..."</div> }>
			{
				move || calendar.read().as_ref().map(|calendar| match calendar {
					Ok(days) => view! {
						<div id="calendar_days">
							{days.iter().cloned().map(|day| view! { <CalendarDayView day /> }).collect::<Vec<_>>()}
						</div>
					}
					.into_any(),
					Err(error) => view! { <div class="error">{error.to_string()}</div> }.into_any(),
				})
			}
		</Transition>
	}
}

#[component]
fn CalendarDayView(day: CalendarDay) -> impl IntoView {
	view! {
		<section class="calendar_day">
			<h2>{day.date.format("%A %Y-%m-%d").to_string()}</h2>
			{
				if day.entries.is_empty() {
					view! { <div class="calendar_day_empty">"Nothing scheduled"</div> }.into_any()
				} else {
					view! {
						<ul class="calendar_entries">
							{
								day.entries.into_iter().map(|entry| view! {
									<li class="calendar_entry">
										<span class="calendar_entry_time">
											{display_time(Some(entry.scheduled_start))}
											{entry.scheduled_end.map(|end| format!(" to {}", display_time(Some(end))))}
										</span>
										" "
										<a href={make_ticket_url(&entry.ticket_id)}>{entry.ticket_number} " " {entry.title}</a>
										" "
										<span class="calendar_entry_assignee">{entry.assignee_name.unwrap_or_default()}</span>
									</li>
								}).collect::<Vec<_>>()
							}
						</ul>
					}
					.into_any()
				}
			}
		</section>
	}
}

#[server]
async fn get_calendar(from: Option<String>, to: Option<String>) -> Result<Vec<CalendarDay>, ServerFnError> {
	use super::server_utils::{request_context, server_error};
	use super::utils::parse_date_input;
	use crate::web::api::reports::{build_calendar, default_calendar_end};

	let from = parse_date_input(from.as_deref())?.unwrap_or_else(|| chrono::Utc::now().date_naive());
	let to = parse_date_input(to.as_deref())?.unwrap_or_else(|| default_calendar_end(from));

	let (state, context) = request_context().await?;
	let mut db_connection = state.db_connection_pool.get()?;
	build_calendar(&mut db_connection, &context, from, to, None).map_err(server_error)
}
