// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::calendar::CalendarPage;
use super::closed::ClosedTicketsPage;
use super::company_switch::CompanySwitchPage;
use super::dashboard::Dashboard;
use super::errors::error::Error;
use super::errors::not_found::NotFound;
use super::header::PageHeader;
use super::login::LoginPage;
use super::map::MapPage;
use super::reports::ReportsPage;
use super::ticket::TicketPage;
use super::tickets::TicketsPage;
use super::utils::get_session_info;
use leptos::prelude::*;
use leptos_meta::{Stylesheet, Title, provide_meta_context};
use leptos_router::components::{ParentRoute, Route, Router, Routes};
use leptos_router::nested_router::Outlet;
use leptos_router::path;

#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	view! {
		<Stylesheet href="/pkg/fieldline.css" />
		<Title text="Fieldline" />

		<Router>
			<Routes fallback=|| view! { <NotFound /> }>
				<Route path=path!("/login") view=LoginPage />
				<ParentRoute path=path!("") view=MainPage>
					<Route path=path!("/") view=Dashboard />
					<Route path=path!("/tickets") view=TicketsPage />
					<Route path=path!("/tickets/:id") view=TicketPage />
					<Route path=path!("/closed") view=ClosedTicketsPage />
					<Route path=path!("/map") view=MapPage />
					<Route path=path!("/calendar") view=CalendarPage />
					<Route path=path!("/reports") view=ReportsPage />
					<Route path=path!("/company") view=CompanySwitchPage />
				</ParentRoute>
			</Routes>
		</Router>
	}
}

#[component]
fn MainPage() -> impl IntoView {
	view! {
		<Await future=get_session_info() let:session>
			{
				match session {
					Ok(session) => view! {
						<PageHeader session={session.clone()} />
						<main>
							<Outlet />
						</main>
					}.into_any(),
					Err(_) => view! {
						<Error />
					}.into_any()
				}
			}
		</Await>
	}
}
