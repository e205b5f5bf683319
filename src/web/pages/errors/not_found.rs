// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use leptos::prelude::*;

#[component]
pub fn NotFound() -> impl IntoView {
	view! {
		<div id="not_found_page">
			<h1>"Not found!"</h1>
			<p>"There's no page or ticket here, or it isn't one you can see."</p>
			<p><a href="/">"Back to the dashboard"</a></p>
		</div>
	}
}
