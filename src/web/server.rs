// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::api;
use super::auth::{login_redirect_layer, login_route, logout_route};
use super::pages::app::App;
use super::pages::shell::shell;
use super::session::DatabaseStore;
use super::state::AppState;
use crate::config::ConfigData;
use crate::database::DbPool;
use axum::Router;
use axum::middleware::from_fn;
use axum::routing::post;
use leptos::prelude::*;
use leptos_axum::{LeptosRoutes, file_and_error_handler_with_context, generate_route_list};
use miette::IntoDiagnostic;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::SameSite;
use tower_sessions::service::SessionManagerLayer;

pub async fn run_server_task(config: Arc<ConfigData>, db_connection_pool: DbPool) {
	let task_result = run_server(config, db_connection_pool).await;
	if let Err(error) = task_result {
		tracing::error!(source = ?error, "Web server failed to run");
	}
}

async fn run_server(config: Arc<ConfigData>, db_connection_pool: DbPool) -> miette::Result<()> {
	let web_config = get_configuration(None).into_diagnostic()?;
	let site_addr = &config.web.bind_addr;
	let leptos_options = web_config.leptos_options;
	let routes = generate_route_list(App);

	let session_store = DatabaseStore::new(db_connection_pool.clone());
	let session_layer = SessionManagerLayer::new(session_store)
		.with_same_site(SameSite::Lax)
		.with_secure(config.web.base_url.starts_with("https://"));

	let app_state = AppState {
		leptos_options,
		config: Arc::clone(&config),
		db_connection_pool,
	};

	let app = Router::new()
		.leptos_routes_with_context(
			&app_state,
			routes,
			{
				let app_state = app_state.clone();
				move || provide_context(app_state.clone())
			},
			{
				let leptos_options = app_state.leptos_options.clone();
				move || shell(leptos_options.clone())
			},
		)
		.merge(api::router(config.web.max_attachment_bytes))
		.route("/auth/login", post(login_route))
		.route("/auth/logout", post(logout_route))
		.fallback(file_and_error_handler_with_context::<AppState, _>(
			{
				let app_state = app_state.clone();
				move || provide_context(app_state.clone())
			},
			shell,
		))
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(session_layer)
				.layer(from_fn(login_redirect_layer)),
		)
		.with_state(app_state);

	tracing::info!(address = %site_addr, "Listening");
	let listener = TcpListener::bind(&site_addr).await.into_diagnostic()?;
	axum::serve(listener, app.into_make_service())
		.with_graceful_shutdown(shutdown_signal())
		.await
		.into_diagnostic()?;

	Ok(())
}

async fn shutdown_signal() {
	if let Err(error) = tokio::signal::ctrl_c().await {
		tracing::error!(source = ?error, "Couldn't listen for the shutdown signal");
		std::future::pending::<()>().await;
	}
	tracing::info!("Shutting down");
}
