// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::activity::{self, CREATE, DELETE};
use super::{Scope, tickets};
use crate::domain::validation::{ValidationError, ValidationResult};
use crate::error::{AppError, AppResult};
use crate::model::Attachment;
use crate::schema::attachments;
use chrono::Utc;
use diesel::prelude::*;
use std::path::{Path, PathBuf};

const ENTITY: &str = "attachment";
const MAX_FILE_NAME_LENGTH: usize = 255;

/// Where an attachment's bytes live on disk.
pub fn file_path(attachment_dir: &Path, company_code: &str, attachment_id: &str) -> PathBuf {
	attachment_dir.join(company_code).join(attachment_id)
}

/// Reduces an uploaded file name to its last path component, since browsers and clients differ on what they send.
pub fn clean_file_name(file_name: &str) -> ValidationResult<String> {
	let name = file_name
		.rsplit(['/', '\\'])
		.next()
		.unwrap_or_default()
		.trim()
		.replace(|c: char| c.is_control(), "");
	if name.is_empty() || name == "." || name == ".." {
		return Err(ValidationError::new("file", "needs a file name"));
	}
	Ok(name.chars().take(MAX_FILE_NAME_LENGTH).collect())
}

pub fn list_for_ticket(
	db_connection: &mut PgConnection,
	company_code: &str,
	ticket_id: &str,
) -> AppResult<Vec<Attachment>> {
	tickets::get(db_connection, company_code, ticket_id)?;
	let attachments = attachments::table
		.filter(attachments::ticket_id.eq(ticket_id))
		.filter(attachments::company_code.eq(company_code))
		.order((attachments::uploaded_at, attachments::id))
		.load(db_connection)?;
	Ok(attachments)
}

pub fn get(db_connection: &mut PgConnection, company_code: &str, id: &str) -> AppResult<Attachment> {
	attachments::table
		.filter(attachments::id.eq(id).and(attachments::company_code.eq(company_code)))
		.first(db_connection)
		.optional()?
		.ok_or(AppError::NotFound("attachment"))
}

/// Records an uploaded file whose bytes have already been written under `id`.
pub fn create(
	db_connection: &mut PgConnection,
	scope: Scope,
	id: String,
	ticket_id: &str,
	file_name: String,
	content_type: String,
	size_bytes: i64,
) -> AppResult<Attachment> {
	db_connection.transaction(|db_connection| {
		let ticket = tickets::get(db_connection, scope.company_code, ticket_id)?;
		let attachment = Attachment {
			id,
			company_code: scope.company_code.to_string(),
			ticket_id: ticket.id.clone(),
			file_name,
			content_type,
			size_bytes,
			uploaded_by: scope.actor_id.to_string(),
			uploaded_at: Utc::now(),
		};
		diesel::insert_into(attachments::table)
			.values(&attachment)
			.execute(db_connection)?;
		activity::record(
			db_connection,
			scope.company_code,
			Some(scope.actor_id),
			CREATE,
			ENTITY,
			&attachment.id,
			format!("Attached {} to {}", attachment.file_name, ticket.ticket_number),
		)?;
		Ok(attachment)
	})
}

pub fn delete(db_connection: &mut PgConnection, scope: Scope, id: &str) -> AppResult<Attachment> {
	db_connection.transaction(|db_connection| {
		let attachment = get(db_connection, scope.company_code, id)?;
		diesel::delete(attachments::table.find(id)).execute(db_connection)?;
		activity::record(
			db_connection,
			scope.company_code,
			Some(scope.actor_id),
			DELETE,
			ENTITY,
			id,
			format!("Removed attachment {}", attachment.file_name),
		)?;
		Ok(attachment)
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn file_names_lose_their_directories() {
		assert_eq!(clean_file_name("report.pdf").unwrap(), "report.pdf");
		assert_eq!(clean_file_name("C:\\Users\\me\\photo.jpg").unwrap(), "photo.jpg");
		assert_eq!(clean_file_name("../../etc/passwd").unwrap(), "passwd");
		assert!(clean_file_name("uploads/").is_err());
		assert!(clean_file_name("..").is_err());
	}

	#[test]
	fn files_are_stored_per_company() {
		let path = file_path(Path::new("/var/fieldline"), "HQ", "abc123");
		assert_eq!(path, PathBuf::from("/var/fieldline/HQ/abc123"));
	}
}
