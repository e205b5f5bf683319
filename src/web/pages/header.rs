// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::utils::{REFRESH_INTERVAL_SECONDS, SessionInfo, get_ticket_counts};
use crate::web::permissions;
use leptos::prelude::*;
use std::time::Duration;

#[component]
pub fn PageHeader(session: SessionInfo) -> impl IntoView {
	let (refresh_count, set_refresh_count) = signal(0u32);
	let counts = Resource::new(move || refresh_count.get(), |_| get_ticket_counts());

	Effect::new(move |_| {
		let interval = set_interval_with_handle(
			move || set_refresh_count.update(|count| *count += 1),
			Duration::from_secs(REFRESH_INTERVAL_SECONDS),
		);
		if let Ok(interval) = interval {
			on_cleanup(move || interval.clear());
		}
	});

	let role = session.role;
	let mut links: Vec<(&'static str, &'static str)> = vec![
		("/", "Dashboard"),
		("/tickets", "Tickets"),
		("/closed", "Closed"),
		("/calendar", "Calendar"),
		("/map", "Map"),
	];
	if permissions::can_view_reports(role) {
		links.push(("/reports", "Reports"));
	}
	if permissions::can_switch_company(role) {
		links.push(("/company", "Company"));
	}

	view! {
		<header id="header">
			<div id="header_company">
				<h1 id="header_company_name">{session.company_name.clone()}</h1>
				<span id="header_company_code">{session.company_code.clone()}</span>
			</div>
			<nav id="header_nav">
				{
					links.into_iter().map(|(href, label)| view! {
						<a href={href}>
							{label}
							{
								(href == "/tickets").then(|| view! {
									<Transition>
										{
											move || counts
												.read()
												.as_ref()
												.and_then(|counts| counts.as_ref().ok())
												.map(|counts| view! {
													<span id="header_ticket_badge">{counts.active}</span>
												})
										}
									</Transition>
								})
							}
						</a>
					}).collect::<Vec<_>>()
				}
			</nav>
			<div id="header_user">
				<span>{session.display_name.clone()}</span>
				<span class="header_role">{role.label()}</span>
				<form method="post" action="/auth/logout">
					<input type="submit" value="Log out" />
				</form>
			</div>
		</header>
	}
}
