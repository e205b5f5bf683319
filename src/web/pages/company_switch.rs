// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use leptos::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CompanyOption {
	pub code: String,
	pub name: String,
	pub current: bool,
}

/// Lets an administrator choose which company their pages work in.
#[component]
pub fn CompanySwitchPage() -> impl IntoView {
	let companies = OnceResource::new(list_companies());
	let switch_company = ServerAction::<SetActiveCompany>::new();

	view! {
		<h1>"Switch Company"</h1>
		<Transition fallback=|| view! { <div class="loading">"Loading companies..."</div> }>
			{
				move || companies.get().map(|companies| match companies {
					Ok(companies) => view! {
						<ActionForm action=switch_company>
							<select name="code">
								{
									companies.into_iter().map(|company| {
										let label = format!("{} ({})", company.name, company.code);
										view! {
											<option value={company.code} selected=company.current>
												{label}
											</option>
										}
									}).collect::<Vec<_>>()
								}
							</select>
							<input type="submit" value="Switch" />
						</ActionForm>
					}
					.into_any(),
					Err(error) => view! { <p class="error">{error.to_string()}</p> }.into_any(),
				})
			}
		</Transition>
		{
			move || switch_company.value().get().and_then(|result| result.err()).map(|error| view! {
				<p class="error">{error.to_string()}</p>
			})
		}
	}
}

#[server]
async fn list_companies() -> Result<Vec<CompanyOption>, ServerFnError> {
	use super::server_utils::{request_context, server_error};
	use crate::store::companies;
	use crate::web::permissions::can_switch_company;

	let (state, context) = request_context().await?;
	context.require(can_switch_company).map_err(server_error)?;
	let mut db_connection = state.db_connection_pool.get()?;
	let companies = companies::list(&mut db_connection).map_err(server_error)?;
	Ok(companies
		.into_iter()
		.filter(|company| company.active)
		.map(|company| CompanyOption {
			current: company.code == context.company.code,
			code: company.code,
			name: company.name,
		})
		.collect())
}

#[server]
async fn set_active_company(code: String) -> Result<(), ServerFnError> {
	use super::server_utils::{request_context, server_error};
	use crate::store::companies;
	use crate::web::context::check_company;
	use crate::web::permissions::can_switch_company;
	use crate::web::session_key::ACTIVE_COMPANY;
	use tower_sessions::Session;

	let (state, context) = request_context().await?;
	context.require(can_switch_company).map_err(server_error)?;

	let code = code.trim().to_uppercase();
	let switched = code != context.user.company_code;
	let mut db_connection = state.db_connection_pool.get()?;
	let company = companies::find(&mut db_connection, &code).map_err(server_error)?;
	let company = check_company(context.role(), company, switched).map_err(server_error)?;

	let session: Session = leptos_axum::extract().await?;
	if switched {
		session.insert(ACTIVE_COMPANY, &company.code).await?;
	} else {
		session.remove::<String>(ACTIVE_COMPANY).await?;
	}
	tracing::info!(user = %context.user.id, company = %company.code, "Switched active company");

	leptos_axum::redirect("/");
	Ok(())
}
