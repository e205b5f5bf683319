// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! What each role may do. Admins can do everything, coordinators run their company's day-to-day work, and
//! technicians work the tickets assigned to them.

use crate::domain::enums::UserRole;

/// Ticket fields a technician may change on their own tickets.
pub const TECHNICIAN_EDITABLE_FIELDS: [&str; 2] = ["status", "resolution"];

fn at_least_coordinator(role: UserRole) -> bool {
	role >= UserRole::Coordinator
}

pub fn can_manage_users(role: UserRole) -> bool {
	role == UserRole::Admin
}

pub fn can_manage_companies(role: UserRole) -> bool {
	role == UserRole::Admin
}

/// Admins may work in any company; everyone else stays in their own.
pub fn can_switch_company(role: UserRole) -> bool {
	role == UserRole::Admin
}

pub fn can_manage_registries(role: UserRole) -> bool {
	at_least_coordinator(role)
}

pub fn can_create_tickets(role: UserRole) -> bool {
	at_least_coordinator(role)
}

pub fn can_delete(role: UserRole) -> bool {
	at_least_coordinator(role)
}

pub fn can_review_service_requests(role: UserRole) -> bool {
	at_least_coordinator(role)
}

pub fn can_view_reports(role: UserRole) -> bool {
	at_least_coordinator(role)
}

pub fn can_view_activity(role: UserRole) -> bool {
	at_least_coordinator(role)
}

/// Whether the user can see every ticket of the company rather than just their own.
pub fn sees_all_tickets(role: UserRole) -> bool {
	at_least_coordinator(role)
}

/// Technicians only see tickets assigned to them.
pub fn can_view_ticket(role: UserRole, user_id: &str, assigned_to: Option<&str>) -> bool {
	sees_all_tickets(role) || assigned_to == Some(user_id)
}

/// Checks the fields of a ticket update against what the role may touch. Returns the first field that isn't allowed.
pub fn disallowed_ticket_field<'a>(role: UserRole, fields: &[&'a str]) -> Option<&'a str> {
	if at_least_coordinator(role) {
		return None;
	}
	fields
		.iter()
		.copied()
		.find(|field| !TECHNICIAN_EDITABLE_FIELDS.contains(field))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn role_capabilities() {
		assert!(can_manage_users(UserRole::Admin));
		assert!(!can_manage_users(UserRole::Coordinator));
		assert!(can_manage_registries(UserRole::Coordinator));
		assert!(!can_manage_registries(UserRole::Technician));
		assert!(!can_delete(UserRole::Technician));
		assert!(can_view_reports(UserRole::Admin));
		assert!(!can_switch_company(UserRole::Coordinator));
	}

	#[test]
	fn technicians_only_see_their_tickets() {
		assert!(can_view_ticket(UserRole::Technician, "u1", Some("u1")));
		assert!(!can_view_ticket(UserRole::Technician, "u1", Some("u2")));
		assert!(!can_view_ticket(UserRole::Technician, "u1", None));
		assert!(can_view_ticket(UserRole::Coordinator, "u1", None));
	}

	#[test]
	fn technicians_may_only_change_status_and_resolution() {
		assert_eq!(
			disallowed_ticket_field(UserRole::Technician, &["status", "resolution"]),
			None
		);
		assert_eq!(
			disallowed_ticket_field(UserRole::Technician, &["status", "assignedTo"]),
			Some("assignedTo")
		);
		assert_eq!(
			disallowed_ticket_field(UserRole::Coordinator, &["assignedTo", "priority"]),
			None
		);
	}
}
