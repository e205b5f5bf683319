// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::ApiPath;
use super::tickets::{remove_attachment_files, visible_ticket};
use crate::config::ConfigData;
use crate::database::DbPool;
use crate::error::{AppError, AppResult};
use crate::model::Attachment;
use crate::store::attachments::{self, clean_file_name, file_path};
use crate::web::context::RequestContext;
use crate::web::permissions;
use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

const FILE_FIELD: &str = "file";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

pub async fn list(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiPath(ticket_id): ApiPath<String>,
) -> AppResult<Json<Vec<Attachment>>> {
	let mut db_connection = db_connection_pool.get()?;
	let ticket = visible_ticket(&mut db_connection, &context, &ticket_id)?;
	Ok(Json(attachments::list_for_ticket(
		&mut db_connection,
		&context.company.code,
		&ticket.id,
	)?))
}

/// Accepts a multipart upload with the file in the `file` field.
pub async fn upload(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	State(config): State<Arc<ConfigData>>,
	ApiPath(ticket_id): ApiPath<String>,
	mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<Attachment>)> {
	let max_bytes = config.web.max_attachment_bytes;
	{
		let mut db_connection = db_connection_pool.get()?;
		visible_ticket(&mut db_connection, &context, &ticket_id)?;
	}

	let mut upload = None;
	while let Some(mut field) = multipart
		.next_field()
		.await
		.map_err(|error| AppError::from_multipart(error, max_bytes))?
	{
		if field.name() != Some(FILE_FIELD) {
			continue;
		}
		let file_name = clean_file_name(field.file_name().unwrap_or_default())?;
		let content_type = field.content_type().unwrap_or(DEFAULT_CONTENT_TYPE).to_string();
		let mut contents: Vec<u8> = Vec::new();
		while let Some(chunk) = field
			.chunk()
			.await
			.map_err(|error| AppError::from_multipart(error, max_bytes))?
		{
			if (contents.len() + chunk.len()) as u64 > max_bytes {
				return Err(AppError::PayloadTooLarge(max_bytes));
			}
			contents.extend_from_slice(&chunk);
		}
		upload = Some((file_name, content_type, contents));
		break;
	}
	let Some((file_name, content_type, contents)) = upload else {
		return Err(AppError::BadRequest(format!("the upload needs a `{}` field", FILE_FIELD)));
	};

	let id = cuid2::create_id();
	let path = file_path(&config.web.attachment_dir, &context.company.code, &id);
	if let Some(parent) = path.parent() {
		tokio::fs::create_dir_all(parent).await?;
	}
	tokio::fs::write(&path, &contents).await?;

	let size_bytes = i64::try_from(contents.len()).map_err(|_| AppError::PayloadTooLarge(max_bytes))?;
	let created = match db_connection_pool.get() {
		Ok(mut db_connection) => attachments::create(
			&mut db_connection,
			context.scope(),
			id,
			&ticket_id,
			file_name,
			content_type,
			size_bytes,
		),
		Err(error) => Err(error.into()),
	};
	match created {
		Ok(attachment) => Ok((StatusCode::CREATED, Json(attachment))),
		Err(error) => {
			if let Err(remove_error) = tokio::fs::remove_file(&path).await {
				tracing::warn!(source = ?remove_error, path = %path.display(), "Couldn't remove orphaned upload");
			}
			Err(error)
		}
	}
}

pub async fn download(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	State(config): State<Arc<ConfigData>>,
	ApiPath(id): ApiPath<String>,
) -> AppResult<Response> {
	let attachment = {
		let mut db_connection = db_connection_pool.get()?;
		let attachment = attachments::get(&mut db_connection, &context.company.code, &id)?;
		visible_ticket(&mut db_connection, &context, &attachment.ticket_id)?;
		attachment
	};
	let path = file_path(&config.web.attachment_dir, &attachment.company_code, &attachment.id);
	let contents = match tokio::fs::read(&path).await {
		Ok(contents) => contents,
		Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
			tracing::warn!(attachment = %attachment.id, path = %path.display(), "Attachment file is missing");
			return Err(AppError::NotFound("attachment file"));
		}
		Err(error) => return Err(error.into()),
	};

	let content_type = HeaderValue::from_str(&attachment.content_type)
		.unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
	let disposition = format!(
		"attachment; filename=\"{}\"",
		attachment.file_name.replace(['"', '\\'], "_")
	);
	let disposition = HeaderValue::from_str(&disposition).unwrap_or_else(|_| HeaderValue::from_static("attachment"));
	Ok((
		[(header::CONTENT_TYPE, content_type), (header::CONTENT_DISPOSITION, disposition)],
		contents,
	)
		.into_response())
}

pub async fn delete(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	State(config): State<Arc<ConfigData>>,
	ApiPath(id): ApiPath<String>,
) -> AppResult<StatusCode> {
	context.require(permissions::can_delete)?;
	let attachment = {
		let mut db_connection = db_connection_pool.get()?;
		attachments::delete(&mut db_connection, context.scope(), &id)?
	};
	remove_attachment_files(&config.web.attachment_dir, &[attachment]).await;
	Ok(StatusCode::NO_CONTENT)
}
