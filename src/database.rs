// © 2024 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::config::{BootstrapArgs, ConfigData, DatabaseArgs};
use crate::domain::enums::UserRole;
use crate::domain::validation;
use crate::model::{Company, User};
use crate::schema::{api_tokens, companies, users};
use crate::web::auth::hash_password;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use miette::{Diagnostic, IntoDiagnostic};
use std::error::Error;
use std::fmt;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub type DbPool = Pool<ConnectionManager<PgConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<PgConnection>>;

// To get boxed errors (as returned by the migration runner) into miette, we need a wrapper type for them.
#[derive(Debug, Diagnostic)]
pub struct MigrationError(pub Box<dyn Error + Send + Sync>);

impl fmt::Display for MigrationError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(&self.0, f)
	}
}

impl Error for MigrationError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		self.0.source()
	}
}

pub fn connect_db(config: &ConfigData) -> miette::Result<DbPool> {
	let url = db_url(&config.database);
	let manager: ConnectionManager<PgConnection> = ConnectionManager::new(url);
	Pool::builder().test_on_check_out(true).build(manager).into_diagnostic()
}

fn db_url(db_config: &DatabaseArgs) -> String {
	match db_config.port {
		Some(port) => format!(
			"postgres://{}:{}@{}:{}/{}",
			db_config.username, db_config.password, db_config.host, port, db_config.database
		),
		None => format!(
			"postgres://{}:{}@{}/{}",
			db_config.username, db_config.password, db_config.host, db_config.database
		),
	}
}

pub fn run_embedded_migrations(db_connection_pool: &DbPool) -> Result<(), MigrationError> {
	let mut db_connection = match db_connection_pool.get() {
		Ok(connection) => connection,
		Err(error) => return Err(MigrationError(Box::new(error))),
	};
	run_pending_migrations(&mut db_connection)
}

/// Brings a single connection's database up to date; also used by tests that manage their own connection.
pub fn run_pending_migrations(db_connection: &mut PgConnection) -> Result<(), MigrationError> {
	match db_connection.run_pending_migrations(MIGRATIONS) {
		Ok(_) => Ok(()),
		Err(error) => Err(MigrationError(error)),
	}
}

/// Creates the configured first company and administrator if nobody can log in yet.
pub fn bootstrap_first_admin(
	db_connection_pool: &DbPool,
	bootstrap: &BootstrapArgs,
	pepper: Option<&str>,
) -> miette::Result<()> {
	let mut db_connection = db_connection_pool.get().into_diagnostic()?;

	let user_count: i64 = users::table.count().get_result(&mut db_connection).into_diagnostic()?;
	if user_count > 0 {
		return Ok(());
	}

	let company_code = validation::company_code(&bootstrap.company_code).into_diagnostic()?;
	let username = validation::username(&bootstrap.admin_username).into_diagnostic()?;
	let password = validation::password(&bootstrap.admin_password).into_diagnostic()?;
	let password_hash = hash_password(password, pepper).into_diagnostic()?;
	let now = Utc::now();

	db_connection
		.transaction(|db_connection| {
			let existing_company: Option<Company> = companies::table
				.find(&company_code)
				.first(db_connection)
				.optional()?;
			if existing_company.is_none() {
				let company = Company {
					code: company_code.clone(),
					name: bootstrap.company_name.clone(),
					active: true,
					next_ticket_number: 1,
					created_at: now,
				};
				diesel::insert_into(companies::table)
					.values(&company)
					.execute(db_connection)?;
			}

			let admin = User {
				id: cuid2::create_id(),
				company_code: company_code.clone(),
				username: username.clone(),
				display_name: String::from("Administrator"),
				email: None,
				role: UserRole::Admin,
				password_hash,
				active: true,
				created_at: now,
			};
			diesel::insert_into(users::table).values(&admin).execute(db_connection)?;
			Ok::<(), diesel::result::Error>(())
		})
		.into_diagnostic()?;

	tracing::info!(company = %company_code, username = %username, "Created first administrator");
	Ok(())
}

/// Removes API tokens past their expiry. Returns how many were removed.
pub fn delete_expired_tokens(db_connection: &mut PgConnection) -> QueryResult<usize> {
	diesel::delete(api_tokens::table.filter(api_tokens::expires_at.le(Utc::now()))).execute(db_connection)
}
