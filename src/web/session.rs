// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::database::{DbConnection, DbPool};
use crate::model::Session;
use crate::schema::sessions;
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use time::OffsetDateTime;
use tower_sessions::session::{Id, Record};
use tower_sessions::{SessionStore, session_store};

#[derive(Clone, Debug)]
pub struct DatabaseStore {
	db_connection_pool: DbPool,
}

impl DatabaseStore {
	pub fn new(db_connection_pool: DbPool) -> Self {
		Self { db_connection_pool }
	}

	fn connection(&self) -> session_store::Result<DbConnection> {
		self.db_connection_pool
			.get()
			.map_err(|error| session_store::Error::Backend(format!("Couldn't get database connection: {}", error)))
	}
}

fn encode_record(record: &Record) -> session_store::Result<Session> {
	let data = serde_json::to_string(&record.data)
		.map_err(|error| session_store::Error::Encode(format!("{:?}", error)))?;
	let expires: i64 = record
		.expiry_date
		.unix_timestamp_nanos()
		.try_into()
		.map_err(|error| session_store::Error::Backend(format!("Timestamp out of bounds: {}", error)))?;
	Ok(Session {
		session_id: record.id.0.into(),
		data,
		expires: DateTime::from_timestamp_nanos(expires),
	})
}

fn decode_session(session_id: Id, session: Session) -> session_store::Result<Record> {
	let data =
		serde_json::from_str(&session.data).map_err(|error| session_store::Error::Decode(format!("{:?}", error)))?;
	let expiry_date = session
		.expires
		.timestamp_nanos_opt()
		.ok_or_else(|| session_store::Error::Backend(String::from("Out of range expiration timestamp")))?;
	let expiry_date = OffsetDateTime::from_unix_timestamp_nanos(expiry_date.into())
		.map_err(|error| session_store::Error::Backend(format!("Timestamp conversion error: {}", error)))?;
	Ok(Record {
		id: session_id,
		data,
		expiry_date,
	})
}

/// Removes sessions past their expiry. Returns how many were removed.
pub fn delete_expired_sessions(db_connection: &mut PgConnection) -> QueryResult<usize> {
	diesel::delete(sessions::table.filter(sessions::expires.le(Utc::now()))).execute(db_connection)
}

#[async_trait]
impl SessionStore for DatabaseStore {
	async fn create(&self, record: &mut Record) -> session_store::Result<()> {
		let mut db_connection = self.connection()?;
		let new_session = encode_record(record)?;

		diesel::insert_into(sessions::table)
			.values(new_session)
			.execute(&mut db_connection)
			.map_err(|error| session_store::Error::Backend(format!("Failed to create new session: {}", error)))?;

		Ok(())
	}

	async fn save(&self, record: &Record) -> session_store::Result<()> {
		let mut db_connection = self.connection()?;
		let session = encode_record(record)?;

		// Saving a session the store doesn't know (e.g. one removed by expiry cleanup) recreates it.
		diesel::insert_into(sessions::table)
			.values(&session)
			.on_conflict(sessions::session_id)
			.do_update()
			.set((sessions::data.eq(&session.data), sessions::expires.eq(session.expires)))
			.execute(&mut db_connection)
			.map_err(|error| session_store::Error::Backend(format!("Failed to update session: {}", error)))?;

		Ok(())
	}

	async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
		let mut db_connection = self.connection()?;

		let db_session_id: BigDecimal = session_id.0.into();
		let session: Option<Session> = sessions::table
			.find(db_session_id)
			.filter(sessions::expires.gt(Utc::now()))
			.first(&mut db_connection)
			.optional()
			.map_err(|error| {
				session_store::Error::Backend(format!("Couldn't retrieve session from database: {}", error))
			})?;

		match session {
			Some(session) => Ok(Some(decode_session(*session_id, session)?)),
			None => Ok(None),
		}
	}

	async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
		let mut db_connection = self.connection()?;

		let db_session_id: BigDecimal = session_id.0.into();
		diesel::delete(sessions::table.filter(sessions::session_id.eq(db_session_id)))
			.execute(&mut db_connection)
			.map_err(|error| session_store::Error::Backend(format!("Failed to delete session: {}", error)))?;

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;
	use time::Duration;

	#[test]
	fn records_survive_encoding() {
		let mut data = HashMap::new();
		data.insert(String::from("user_id"), serde_json::json!("abc"));
		let record = Record {
			id: Id(42),
			data,
			expiry_date: OffsetDateTime::UNIX_EPOCH + Duration::days(20_000),
		};

		let session = encode_record(&record).unwrap();
		assert_eq!(session.session_id, BigDecimal::from(42));
		let decoded = decode_session(record.id, session).unwrap();
		assert_eq!(decoded.data, record.data);
		assert_eq!(decoded.expiry_date, record.expiry_date);
	}
}
