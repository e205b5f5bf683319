// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::utils::{REFRESH_INTERVAL_SECONDS, make_ticket_url};
use crate::domain::clustering::MarkerCluster;
use leptos::prelude::*;
use std::time::Duration;

/// Ticket locations grouped for the map view. Refreshes itself so dispatchers see new work without reloading.
#[component]
pub fn MapPage() -> impl IntoView {
	let (include_closed, set_include_closed) = signal(false);
	let (refresh_count, set_refresh_count) = signal(0u32);
	let markers = Resource::new(
		move || (include_closed.get(), refresh_count.get()),
		|(include_closed, _)| get_map_markers(include_closed),
	);

	Effect::new(move || {
		let interval = set_interval_with_handle(
			move || set_refresh_count.update(|count| *count = count.wrapping_add(1)),
			Duration::from_secs(REFRESH_INTERVAL_SECONDS),
		);
		if let Ok(interval) = interval {
			on_cleanup(move || interval.clear());
		}
	});

	view! {
		<h1>"Ticket Map"</h1>
		<label id="map_include_closed">
			<input
				type="checkbox"
				prop:checked=include_closed
				on:change=move |event| set_include_closed.set(event_target_checked(&event))
			/>
			"Include closed tickets"
		</label>
		<Transition fallback=|| view! { <div class="loading">"Loading map..."</div> }>
			{
				move || markers.read().as_ref().and_then(|markers| markers.as_ref().ok()).map(|markers| {
					if markers.is_empty() {
						return view! { <div id="map_empty">"No tickets have a mapped site."</div> }.into_any();
					}
					view! {
						<table id="map_markers">
							<thead>
								<tr>
									<th>"Location"</th>
									<th>"Tickets"</th>
								</tr>
							</thead>
							<tbody>
								{markers.iter().cloned().map(|marker| view! { <MarkerRow marker /> }).collect::<Vec<_>>()}
							</tbody>
						</table>
					}
					.into_any()
				})
			}
		</Transition>
	}
}

#[component]
fn MarkerRow(marker: MarkerCluster) -> impl IntoView {
	let badge_style = format!("width: {0}px; height: {0}px;", marker.badge_size);
	view! {
		<tr class="map_marker">
			<td>{format!("{:.4}, {:.4}", marker.latitude, marker.longitude)}</td>
			<td>
				<span class="map_marker_badge" style={badge_style}>{marker.count}</span>
				<ul class="map_marker_tickets">
					{
						marker.ticket_ids.into_iter().map(|ticket_id| view! {
							<li>
								<a href={make_ticket_url(&ticket_id)}>{ticket_id.clone()}</a>
							</li>
						}).collect::<Vec<_>>()
					}
				</ul>
			</td>
		</tr>
	}
}

#[server]
async fn get_map_markers(include_closed: bool) -> Result<Vec<MarkerCluster>, ServerFnError> {
	use super::server_utils::{request_context, server_error};
	use crate::web::api::reports::build_markers;

	let (state, context) = request_context().await?;
	let mut db_connection = state.db_connection_pool.get()?;
	build_markers(&mut db_connection, &context, include_closed).map_err(server_error)
}
