// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::ApiQuery;
use crate::database::DbPool;
use crate::error::AppResult;
use crate::model::ActivityLogEntry;
use crate::store::activity::{self, ActivityQuery};
use crate::web::context::RequestContext;
use crate::web::permissions::can_view_activity;
use axum::Json;
use axum::extract::State;

pub async fn list(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiQuery(query): ApiQuery<ActivityQuery>,
) -> AppResult<Json<Vec<ActivityLogEntry>>> {
	context.require(can_view_activity)?;
	let mut db_connection = db_connection_pool.get()?;
	Ok(Json(activity::list(&mut db_connection, &context.company.code, &query)?))
}
