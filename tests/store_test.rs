// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Storage tests against a real PostgreSQL database. Set `FIELDLINE_TEST_DATABASE_URL` to run them; every test
//! works inside a transaction that is never committed.

use chrono::Utc;
use diesel::prelude::*;
use fieldline::database::run_pending_migrations;
use fieldline::domain::enums::{TicketPriority, TicketStatus, UserRole};
use fieldline::domain::sla::SlaTable;
use fieldline::domain::ticket_changes::{NewTicket, TicketChanges};
use fieldline::error::AppError;
use fieldline::model::{Company, User};
use fieldline::schema::{companies, users};
use fieldline::store::customers::{self, CustomerInput};
use fieldline::store::sites::{self, SiteInput};
use fieldline::store::{Scope, tokens, users as user_store};
use fieldline::store::service_requests::{self, AcceptRequest, ServiceRequestInput};
use fieldline::store::tickets::{self, TicketQuery};

fn test_connection() -> Option<PgConnection> {
	let url = std::env::var("FIELDLINE_TEST_DATABASE_URL").ok()?;
	let mut db_connection = PgConnection::establish(&url).unwrap();
	run_pending_migrations(&mut db_connection).unwrap();
	db_connection.begin_test_transaction().unwrap();
	Some(db_connection)
}

/// Adds a company with one user of the given role, returning the user's ID.
fn seed_company(db_connection: &mut PgConnection, code: &str, role: UserRole) -> String {
	let now = Utc::now();
	diesel::insert_into(companies::table)
		.values(&Company {
			code: code.to_string(),
			name: format!("{} Services", code),
			active: true,
			next_ticket_number: 1,
			created_at: now,
		})
		.execute(db_connection)
		.unwrap();
	let user_id = cuid2::create_id();
	diesel::insert_into(users::table)
		.values(&User {
			id: user_id.clone(),
			company_code: code.to_string(),
			username: format!("{}-user", code.to_lowercase()),
			display_name: String::from("Pat Dispatcher"),
			email: None,
			role,
			password_hash: String::new(),
			active: true,
			created_at: now,
		})
		.execute(db_connection)
		.unwrap();
	user_id
}

fn new_ticket(title: &str) -> NewTicket {
	NewTicket {
		title: title.to_string(),
		description: String::from("Unit reports a fault"),
		priority: Some(TicketPriority::High),
		..NewTicket::default()
	}
}

#[test]
fn ticket_numbers_count_up_per_company() {
	let Some(mut db_connection) = test_connection() else {
		return;
	};
	let first_user = seed_company(&mut db_connection, "TNA", UserRole::Coordinator);
	let second_user = seed_company(&mut db_connection, "TNB", UserRole::Coordinator);
	let sla = SlaTable::default();
	let first_scope = Scope {
		company_code: "TNA",
		actor_id: &first_user,
	};
	let second_scope = Scope {
		company_code: "TNB",
		actor_id: &second_user,
	};

	let a1 = tickets::create(&mut db_connection, first_scope, &sla, &new_ticket("Chiller down")).unwrap();
	let a2 = tickets::create(&mut db_connection, first_scope, &sla, &new_ticket("Door sensor")).unwrap();
	let b1 = tickets::create(&mut db_connection, second_scope, &sla, &new_ticket("Boiler leak")).unwrap();

	assert_eq!(a1.ticket_number, "TNA-00001");
	assert_eq!(a2.ticket_number, "TNA-00002");
	assert_eq!(b1.ticket_number, "TNB-00001");
	assert!(a1.sla_due.is_some());
}

#[test]
fn tickets_are_invisible_across_companies() {
	let Some(mut db_connection) = test_connection() else {
		return;
	};
	let user = seed_company(&mut db_connection, "ISA", UserRole::Coordinator);
	seed_company(&mut db_connection, "ISB", UserRole::Coordinator);
	let scope = Scope {
		company_code: "ISA",
		actor_id: &user,
	};
	let ticket = tickets::create(&mut db_connection, scope, &SlaTable::default(), &new_ticket("Pump noise")).unwrap();

	assert!(tickets::get(&mut db_connection, "ISA", &ticket.id).is_ok());
	assert!(matches!(
		tickets::get(&mut db_connection, "ISB", &ticket.id),
		Err(AppError::NotFound(_))
	));
	let listed = tickets::list(&mut db_connection, "ISB", &TicketQuery::default(), Utc::now()).unwrap();
	assert!(listed.is_empty());
}

#[test]
fn updates_write_audit_entries_and_close_tickets() {
	let Some(mut db_connection) = test_connection() else {
		return;
	};
	let user = seed_company(&mut db_connection, "AUD", UserRole::Coordinator);
	let scope = Scope {
		company_code: "AUD",
		actor_id: &user,
	};
	let sla = SlaTable::default();
	let ticket = tickets::create(&mut db_connection, scope, &sla, &new_ticket("Roof unit")).unwrap();

	let changes = TicketChanges {
		status: Some(TicketStatus::Closed),
		resolution: Some(Some(String::from("Replaced contactor"))),
		..TicketChanges::default()
	};
	let updated = tickets::update(&mut db_connection, scope, &sla, &ticket.id, &changes).unwrap();
	assert_eq!(updated.status, TicketStatus::Closed);
	assert!(updated.closed_at.is_some());

	let trail = tickets::audit_trail(&mut db_connection, "AUD", &ticket.id).unwrap();
	let fields: Vec<&str> = trail.iter().map(|entry| entry.entry.field.as_str()).collect();
	assert!(fields.contains(&"status"));
	assert!(fields.contains(&"resolution"));

	let active = tickets::list(&mut db_connection, "AUD", &TicketQuery::default(), Utc::now()).unwrap();
	assert!(active.is_empty());
	let closed_query = TicketQuery {
		only_closed: true,
		..TicketQuery::default()
	};
	let closed = tickets::list(&mut db_connection, "AUD", &closed_query, Utc::now()).unwrap();
	assert_eq!(closed.len(), 1);

	let unchanged = tickets::update(&mut db_connection, scope, &sla, &ticket.id, &TicketChanges::default()).unwrap();
	assert_eq!(unchanged.updated_at, updated.updated_at);
}

#[test]
fn notes_are_attributed_to_their_author() {
	let Some(mut db_connection) = test_connection() else {
		return;
	};
	let user = seed_company(&mut db_connection, "NOT", UserRole::Coordinator);
	let scope = Scope {
		company_code: "NOT",
		actor_id: &user,
	};
	let ticket = tickets::create(&mut db_connection, scope, &SlaTable::default(), &new_ticket("Alarm panel")).unwrap();
	tickets::add_note(&mut db_connection, scope, &ticket.id, "Customer called back").unwrap();
	assert!(tickets::add_note(&mut db_connection, scope, &ticket.id, "   ").is_err());

	let notes = tickets::list_notes(&mut db_connection, "NOT", &ticket.id).unwrap();
	assert_eq!(notes.len(), 1);
	assert_eq!(notes[0].author_name.as_deref(), Some("Pat Dispatcher"));
}

#[test]
fn service_requests_become_tickets_once() {
	let Some(mut db_connection) = test_connection() else {
		return;
	};
	let user = seed_company(&mut db_connection, "SRQ", UserRole::Coordinator);
	let input = ServiceRequestInput {
		requester_name: String::from("Morgan"),
		requester_email: Some(String::from("morgan@example.com")),
		requester_phone: None,
		location: Some(String::from("Loading dock")),
		description: String::from("Freezer alarm keeps sounding overnight"),
		requested_priority: Some(TicketPriority::Critical),
		customer_id: None,
		site_id: None,
	};
	let request = service_requests::submit(&mut db_connection, "SRQ", &input).unwrap();
	assert!(matches!(
		service_requests::submit(&mut db_connection, "NOPE", &input),
		Err(AppError::NotFound(_))
	));

	let scope = Scope {
		company_code: "SRQ",
		actor_id: &user,
	};
	let sla = SlaTable::default();
	let (accepted, ticket) =
		service_requests::accept(&mut db_connection, scope, &sla, &request.id, &AcceptRequest::default()).unwrap();
	assert_eq!(accepted.ticket_id.as_deref(), Some(ticket.id.as_str()));
	assert_eq!(ticket.priority, TicketPriority::Critical);
	assert!(ticket.description.contains("Morgan"));

	assert!(service_requests::accept(&mut db_connection, scope, &sla, &request.id, &AcceptRequest::default()).is_err());
}

#[test]
fn intake_rejects_a_site_of_another_customer() {
	let Some(mut db_connection) = test_connection() else {
		return;
	};
	let user = seed_company(&mut db_connection, "SIT", UserRole::Coordinator);
	let scope = Scope {
		company_code: "SIT",
		actor_id: &user,
	};
	let mut customer = |name: &str| {
		let input = CustomerInput {
			name: name.to_string(),
			..CustomerInput::default()
		};
		customers::create(&mut db_connection, scope, &input).unwrap()
	};
	let first = customer("Northwind");
	let second = customer("Contoso");
	let second_site = sites::create(
		&mut db_connection,
		scope,
		&SiteInput {
			customer_id: second.id.clone(),
			name: String::from("Contoso Warehouse"),
			..SiteInput::default()
		},
	)
	.unwrap();

	let mismatched = ServiceRequestInput {
		requester_name: String::from("Robin"),
		description: String::from("Gate motor stuck"),
		customer_id: Some(first.id.clone()),
		site_id: Some(second_site.id.clone()),
		..ServiceRequestInput::default()
	};
	match service_requests::submit(&mut db_connection, "SIT", &mismatched) {
		Err(AppError::Validation(error)) => assert_eq!(error.field, "siteId"),
		other => panic!("expected a siteId validation error, got {:?}", other),
	}

	let matched = ServiceRequestInput {
		customer_id: Some(second.id.clone()),
		..mismatched
	};
	let request = service_requests::submit(&mut db_connection, "SIT", &matched).unwrap();
	let sla = SlaTable::default();
	let (_, ticket) =
		service_requests::accept(&mut db_connection, scope, &sla, &request.id, &AcceptRequest::default()).unwrap();
	assert_eq!(ticket.site_id.as_deref(), Some(second_site.id.as_str()));
}

#[test]
fn password_reset_revokes_api_tokens() {
	let Some(mut db_connection) = test_connection() else {
		return;
	};
	let admin = seed_company(&mut db_connection, "PWR", UserRole::Admin);
	let technician = cuid2::create_id();
	diesel::insert_into(users::table)
		.values(&User {
			id: technician.clone(),
			company_code: String::from("PWR"),
			username: String::from("pwr-tech"),
			display_name: String::from("Jo Technician"),
			email: None,
			role: UserRole::Technician,
			password_hash: String::new(),
			active: true,
			created_at: Utc::now(),
		})
		.execute(&mut db_connection)
		.unwrap();
	let (token, _) = tokens::issue(&mut db_connection, &technician, 24).unwrap();
	assert!(tokens::find_user(&mut db_connection, &token).unwrap().is_some());

	let scope = Scope {
		company_code: "PWR",
		actor_id: &admin,
	};
	user_store::set_password_hash(&mut db_connection, scope, &technician, String::from("$argon2id$new")).unwrap();
	assert!(tokens::find_user(&mut db_connection, &token).unwrap().is_none());
}
