// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Read-only views computed over many tickets: the report summary, map markers and the schedule calendar.

use super::ApiQuery;
use super::tickets::TicketListParams;
use crate::database::DbPool;
use crate::domain::calendar::{CalendarDay, CalendarEntry, check_range, group_by_day};
use crate::domain::clustering::{MarkerCluster, MarkerPoint, cluster_markers};
use crate::domain::reports::{ReportFilter, ReportTicket, TicketReport, summarize};
use crate::domain::validation::optional_text;
use crate::error::AppResult;
use crate::store::lookup::NameLookup;
use crate::store::tickets::{self, TicketQuery};
use crate::web::context::RequestContext;
use crate::web::permissions::can_view_reports;
use axum::Json;
use axum::extract::State;
use chrono::{NaiveDate, TimeDelta, Utc};
use diesel::PgConnection;
use serde::Deserialize;

/// Days shown when a calendar request gives no end date.
pub const DEFAULT_CALENDAR_DAYS: i64 = 7;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapParams {
	#[serde(default)]
	include_closed: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarParams {
	from: Option<NaiveDate>,
	to: Option<NaiveDate>,
	assigned_to: Option<String>,
}

/// Report figures over every ticket matching the filter, closed ones included.
pub fn build_summary(
	db_connection: &mut PgConnection,
	context: &RequestContext,
	filter: ReportFilter,
) -> AppResult<TicketReport> {
	let query = TicketQuery {
		filter,
		include_closed: true,
		only_closed: false,
		restrict_to_assignee: context.ticket_restriction(),
	};
	let loaded = tickets::load(db_connection, &context.company.code, &query)?;
	let lookup = NameLookup::load(db_connection, &context.company.code)?;
	let report_tickets: Vec<ReportTicket> = tickets::filter_with_lookup(loaded, &lookup, &query.filter)
		.iter()
		.map(|ticket| {
			ticket.report_ticket(
				lookup.user_name(ticket.assigned_to.as_deref()),
				lookup.customer_name(ticket.customer_id.as_deref()),
			)
		})
		.collect();
	Ok(summarize(&report_tickets, Utc::now()))
}

/// Clusters the visible tickets by the coordinates of their sites.
pub fn build_markers(
	db_connection: &mut PgConnection,
	context: &RequestContext,
	include_closed: bool,
) -> AppResult<Vec<MarkerCluster>> {
	let query = TicketQuery {
		include_closed,
		restrict_to_assignee: context.ticket_restriction(),
		..TicketQuery::default()
	};
	let tickets = tickets::load(db_connection, &context.company.code, &query)?;
	let lookup = NameLookup::load(db_connection, &context.company.code)?;
	let points = tickets.iter().filter_map(|ticket| {
		let site = lookup.site(ticket.site_id.as_deref())?;
		Some(MarkerPoint {
			ticket_id: &ticket.id,
			latitude: site.latitude.as_deref(),
			longitude: site.longitude.as_deref(),
		})
	});
	Ok(cluster_markers(points))
}

/// Active scheduled tickets grouped by the day they start.
pub fn build_calendar(
	db_connection: &mut PgConnection,
	context: &RequestContext,
	from: NaiveDate,
	to: NaiveDate,
	assigned_to: Option<String>,
) -> AppResult<Vec<CalendarDay>> {
	check_range(from, to)?;
	let query = TicketQuery {
		filter: ReportFilter {
			assigned_to,
			..ReportFilter::default()
		},
		restrict_to_assignee: context.ticket_restriction(),
		..TicketQuery::default()
	};
	let loaded = tickets::load(db_connection, &context.company.code, &query)?;
	let lookup = NameLookup::load(db_connection, &context.company.code)?;
	let entries = tickets::filter_with_lookup(loaded, &lookup, &query.filter)
		.into_iter()
		.filter_map(|ticket| {
			let scheduled_start = ticket.scheduled_start?;
			Some(CalendarEntry {
				assignee_name: lookup.user_name(ticket.assigned_to.as_deref()),
				ticket_id: ticket.id,
				ticket_number: ticket.ticket_number,
				title: ticket.title,
				status: ticket.status,
				priority: ticket.priority,
				assigned_to: ticket.assigned_to,
				scheduled_start,
				scheduled_end: ticket.scheduled_end,
			})
		});
	Ok(group_by_day(entries, from, to)?)
}

/// The default calendar window: a week from the given start.
pub fn default_calendar_end(from: NaiveDate) -> NaiveDate {
	from + TimeDelta::days(DEFAULT_CALENDAR_DAYS - 1)
}

pub async fn summary(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiQuery(params): ApiQuery<TicketListParams>,
) -> AppResult<Json<TicketReport>> {
	context.require(can_view_reports)?;
	let filter = params.filter()?;
	let mut db_connection = db_connection_pool.get()?;
	Ok(Json(build_summary(&mut db_connection, &context, filter)?))
}

pub async fn map_markers(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiQuery(params): ApiQuery<MapParams>,
) -> AppResult<Json<Vec<MarkerCluster>>> {
	let mut db_connection = db_connection_pool.get()?;
	Ok(Json(build_markers(&mut db_connection, &context, params.include_closed)?))
}

pub async fn calendar(
	context: RequestContext,
	State(db_connection_pool): State<DbPool>,
	ApiQuery(params): ApiQuery<CalendarParams>,
) -> AppResult<Json<Vec<CalendarDay>>> {
	let from = params.from.unwrap_or_else(|| Utc::now().date_naive());
	let to = params.to.unwrap_or_else(|| default_calendar_end(from));
	let mut db_connection = db_connection_pool.get()?;
	Ok(Json(build_calendar(
		&mut db_connection,
		&context,
		from,
		to,
		optional_text(params.assigned_to.as_deref()),
	)?))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_window_is_a_week() {
		let from = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
		assert_eq!(default_calendar_end(from), NaiveDate::from_ymd_opt(2025, 7, 6).unwrap());
		assert!(check_range(from, default_calendar_end(from)).is_ok());
	}
}
