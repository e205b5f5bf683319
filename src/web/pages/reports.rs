// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::domain::enums::{TicketPriority, TicketStatus};
use crate::domain::reports::TicketReport;
use leptos::prelude::*;
use leptos_router::hooks::{use_location, use_query_map};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The report filters as they appear in the page's query string.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ReportQuery {
	pub status: Option<String>,
	pub priority: Option<String>,
	pub assigned_to: Option<String>,
	pub customer_id: Option<String>,
	pub from: Option<String>,
	pub to: Option<String>,
	pub q: Option<String>,
}

/// Builds the CSV export link for the report's current filters. Reports cover closed tickets, so the export does too.
fn export_url(search: &str) -> String {
	let search = search.trim_start_matches('?');
	if search.is_empty() {
		String::from("/api/tickets/export.csv?includeClosed=true")
	} else {
		format!("/api/tickets/export.csv?{}&includeClosed=true", search)
	}
}

fn format_percent(value: Option<f64>) -> String {
	value.map(|value| format!("{:.1}%", value)).unwrap_or_else(|| String::from("n/a"))
}

fn format_hours(value: Option<f64>) -> String {
	value.map(|value| format!("{:.1} h", value)).unwrap_or_else(|| String::from("n/a"))
}

#[component]
pub fn ReportsPage() -> impl IntoView {
	let query = use_query_map();
	let location = use_location();
	let report_query = move || {
		let query = query.read();
		ReportQuery {
			status: query.get("status"),
			priority: query.get("priority"),
			assigned_to: query.get("assignedTo"),
			customer_id: query.get("customerId"),
			from: query.get("from"),
			to: query.get("to"),
			q: query.get("q"),
		}
	};
	let report = Resource::new(report_query, get_report);
	let export_link = move || export_url(&location.search.get());
	let field = move |name: &'static str| move || query.read().get(name).unwrap_or_default();

	view! {
		<h1>"Reports"</h1>
		<form id="report_filter" method="get" action="/reports">
			<label>
				"Status "
				<select name="status">
					<option value="">"Any"</option>
					{
						TicketStatus::ALL.into_iter().map(|option| {
							let selected = move || query.read().get("status").is_some_and(|status| status == option.label());
							view! { <option value={option.label()} selected=selected>{option.label()}</option> }
						}).collect::<Vec<_>>()
					}
				</select>
			</label>
			<label>
				"Priority "
				<select name="priority">
					<option value="">"Any"</option>
					{
						TicketPriority::ALL.into_iter().map(|option| {
							let selected = move || query.read().get("priority").is_some_and(|priority| priority == option.label());
							view! { <option value={option.label()} selected=selected>{option.label()}</option> }
						}).collect::<Vec<_>>()
					}
				</select>
			</label>
			<label>"Created from " <input type="date" name="from" value=field("from") /></label>
			<label>"to " <input type="date" name="to" value=field("to") /></label>
			<label>"Search " <input type="text" name="q" value=field("q") /></label>
			<input type="submit" value="Run Report" />
			<a id="report_export" href=export_link>"Download CSV"</a>
		</form>
		<Transition fallback=|| view! { <div class="loading">"Running report..."</div> }>
			{
				move || report.read().as_ref().map(|report| match report {
					Ok(report) => view! { <ReportView report={report.clone()} /> }.into_any(),
					Err(error) => view! { <p class="error">{error.to_string()}</p> }.into_any(),
				})
			}
		</Transition>
	}
}

#[component]
fn ReportView(report: TicketReport) -> impl IntoView {
	let by_status: Vec<(String, usize)> = report
		.by_status
		.iter()
		.map(|(status, count)| (status.label().to_string(), *count))
		.collect();
	let by_priority: Vec<(String, usize)> = report
		.by_priority
		.iter()
		.map(|(priority, count)| (priority.label().to_string(), *count))
		.collect();

	view! {
		<table id="report_totals">
			<tbody>
				<tr><th>"Tickets"</th><td>{report.total}</td></tr>
				<tr><th>"Open"</th><td>{report.open}</td></tr>
				<tr><th>"Open past SLA"</th><td>{report.overdue_open}</td></tr>
				<tr><th>"Closed"</th><td>{report.closed}</td></tr>
				<tr><th>"Closed within SLA"</th><td>{report.sla_met}</td></tr>
				<tr><th>"Closed after SLA"</th><td>{report.sla_breached}</td></tr>
				<tr><th>"SLA compliance"</th><td>{format_percent(report.sla_compliance_percent)}</td></tr>
				<tr><th>"Average resolution"</th><td>{format_hours(report.average_resolution_hours)}</td></tr>
			</tbody>
		</table>
		<div id="report_breakdowns">
			<Breakdown title="By Status" rows=by_status />
			<Breakdown title="By Priority" rows=by_priority />
			<Breakdown title="By Technician" rows=counted(report.by_technician) />
			<Breakdown title="By Customer" rows=counted(report.by_customer) />
		</div>
	}
}

fn counted(counts: BTreeMap<String, usize>) -> Vec<(String, usize)> {
	counts.into_iter().collect()
}

#[component]
fn Breakdown(title: &'static str, rows: Vec<(String, usize)>) -> impl IntoView {
	view! {
		<section class="report_breakdown">
			<h2>{title}</h2>
			<table>
				<tbody>
					{
						rows.into_iter().map(|(name, count)| view! {
							<tr>
								<td>{name}</td>
								<td>{count}</td>
							</tr>
						}).collect::<Vec<_>>()
					}
				</tbody>
			</table>
		</section>
	}
}

#[server]
async fn get_report(query: ReportQuery) -> Result<TicketReport, ServerFnError> {
	use super::server_utils::{request_context, server_error};
	use super::utils::parse_date_input;
	use crate::web::api::reports::build_summary;
	use crate::web::api::tickets::TicketListParams;
	use crate::web::permissions::can_view_reports;

	let params = TicketListParams {
		status: query.status,
		priority: query.priority,
		assigned_to: query.assigned_to,
		customer_id: query.customer_id,
		from: parse_date_input(query.from.as_deref())?,
		to: parse_date_input(query.to.as_deref())?,
		q: query.q,
		include_closed: true,
	};

	let (state, context) = request_context().await?;
	context.require(can_view_reports).map_err(server_error)?;
	let filter = params.filter().map_err(server_error)?;
	let mut db_connection = state.db_connection_pool.get()?;
	build_summary(&mut db_connection, &context, filter).map_err(server_error)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn export_link_keeps_filters() {
		assert_eq!(export_url(""), "/api/tickets/export.csv?includeClosed=true");
		assert_eq!(
			export_url("?status=open&q=pump"),
			"/api/tickets/export.csv?status=open&q=pump&includeClosed=true"
		);
	}

	#[test]
	fn missing_figures_show_as_not_available() {
		assert_eq!(format_percent(Some(87.456)), "87.5%");
		assert_eq!(format_percent(None), "n/a");
		assert_eq!(format_hours(Some(3.0)), "3.0 h");
	}
}
