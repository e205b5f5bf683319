// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use leptos::prelude::*;

/// Shown when the page's data couldn't be loaded, usually because the login session ended.
#[component]
pub fn Error() -> impl IntoView {
	view! {
		<div id="error_page">
			<h1>"Something went wrong"</h1>
			<p>"This page couldn't be loaded. Your session may have ended."</p>
			<p><a href="/login">"Log in again"</a></p>
		</div>
	}
}
