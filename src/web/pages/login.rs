// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use leptos::prelude::*;
use leptos_meta::Title;
use leptos_router::hooks::use_query_map;

#[component]
pub fn LoginPage() -> impl IntoView {
	let query = use_query_map();
	let failed = move || query.read().get("failed").is_some_and(|failed| failed == "true");

	view! {
		<Title text="Log In" />
		<div id="login_page">
			<h1>"Fieldline"</h1>
			<Show when=failed>
				<div id="login_failed">"The username or password is incorrect."</div>
			</Show>
			<form id="login_form" method="post" action="/auth/login">
				<label>
					"Username"
					<input type="text" name="username" autocomplete="username" required=true />
				</label>
				<label>
					"Password"
					<input type="password" name="password" autocomplete="current-password" required=true />
				</label>
				<input type="submit" value="Log In" />
			</form>
		</div>
	}
}
