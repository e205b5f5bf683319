// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Queries and writes for each record type. Every function here is limited to one company, and every write
//! records an activity log entry in the same connection.

pub mod activity;
pub mod assets;
pub mod attachments;
pub mod companies;
pub mod customers;
pub mod licenses;
pub mod lookup;
pub mod service_requests;
pub mod sites;
pub mod tickets;
pub mod tokens;
pub mod users;
pub mod vendors;

/// The company a request works in and the user doing the work.
#[derive(Clone, Copy, Debug)]
pub struct Scope<'a> {
	pub company_code: &'a str,
	pub actor_id: &'a str,
}
