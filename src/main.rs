// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#[cfg(feature = "ssr")]
use fieldline::{config, database, web};
#[cfg(feature = "ssr")]
use std::sync::Arc;
#[cfg(feature = "ssr")]
use std::time::Duration;

#[cfg(feature = "ssr")]
const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() -> miette::Result<()> {
	use miette::IntoDiagnostic;
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fieldline=info,tower_http=info"));
	tracing_subscriber::fmt().with_env_filter(filter).init();

	let config_path = std::env::args().nth(1).unwrap_or_else(|| String::from("config.kdl"));
	let config = Arc::new(config::parse_config(&config_path).await?);

	let db_connection_pool = database::connect_db(&config)?;
	database::run_embedded_migrations(&db_connection_pool)?;
	if let Some(bootstrap) = &config.bootstrap {
		database::bootstrap_first_admin(&db_connection_pool, bootstrap, config.auth.pepper.as_deref())?;
	}
	tokio::fs::create_dir_all(&config.web.attachment_dir).await.into_diagnostic()?;

	tokio::spawn(run_maintenance(db_connection_pool.clone()));
	web::server::run_server_task(config, db_connection_pool).await;

	Ok(())
}

/// Clears out expired API tokens and login sessions.
#[cfg(feature = "ssr")]
async fn run_maintenance(db_connection_pool: database::DbPool) {
	let mut interval = tokio::time::interval(MAINTENANCE_INTERVAL);
	loop {
		interval.tick().await;
		let mut db_connection = match db_connection_pool.get() {
			Ok(connection) => connection,
			Err(error) => {
				tracing::error!(source = ?error, "Failed to get a database connection for maintenance");
				continue;
			}
		};
		match database::delete_expired_tokens(&mut db_connection) {
			Ok(count) => tracing::debug!(count, "Removed expired API tokens"),
			Err(error) => tracing::error!(source = ?error, "Failed to remove expired API tokens"),
		}
		match web::session::delete_expired_sessions(&mut db_connection) {
			Ok(count) => tracing::debug!(count, "Removed expired sessions"),
			Err(error) => tracing::error!(source = ?error, "Failed to remove expired sessions"),
		}
	}
}

#[cfg(not(feature = "ssr"))]
pub fn main() {
	// The client side is started through the library's hydrate function.
}
