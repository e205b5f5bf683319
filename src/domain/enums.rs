// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a ticket.
#[cfg_attr(feature = "ssr", derive(diesel_derive_enum::DbEnum))]
#[cfg_attr(feature = "ssr", ExistingTypePath = "crate::schema::sql_types::TicketStatus")]
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum TicketStatus {
	Open,
	Scheduled,
	InProgress,
	OnHold,
	Completed,
	Closed,
	Cancelled,
}

impl TicketStatus {
	pub const ALL: [TicketStatus; 7] = [
		Self::Open,
		Self::Scheduled,
		Self::InProgress,
		Self::OnHold,
		Self::Completed,
		Self::Closed,
		Self::Cancelled,
	];

	/// Active tickets still need work; closed and cancelled tickets do not.
	pub fn is_active(self) -> bool {
		!matches!(self, Self::Closed | Self::Cancelled)
	}

	pub fn label(self) -> &'static str {
		match self {
			Self::Open => "Open",
			Self::Scheduled => "Scheduled",
			Self::InProgress => "In Progress",
			Self::OnHold => "On Hold",
			Self::Completed => "Completed",
			Self::Closed => "Closed",
			Self::Cancelled => "Cancelled",
		}
	}
}

impl fmt::Display for TicketStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

impl FromStr for TicketStatus {
	type Err = UnknownVariant;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|status| matches_label(s, status.label()))
			.ok_or_else(|| UnknownVariant::new("status", s))
	}
}

/// Ticket urgency; drives the SLA due date.
#[cfg_attr(feature = "ssr", derive(diesel_derive_enum::DbEnum))]
#[cfg_attr(feature = "ssr", ExistingTypePath = "crate::schema::sql_types::TicketPriority")]
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum TicketPriority {
	Critical,
	High,
	Normal,
	Low,
}

impl TicketPriority {
	pub const ALL: [TicketPriority; 4] = [Self::Critical, Self::High, Self::Normal, Self::Low];

	pub fn label(self) -> &'static str {
		match self {
			Self::Critical => "Critical",
			Self::High => "High",
			Self::Normal => "Normal",
			Self::Low => "Low",
		}
	}
}

impl Default for TicketPriority {
	fn default() -> Self {
		Self::Normal
	}
}

impl fmt::Display for TicketPriority {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

impl FromStr for TicketPriority {
	type Err = UnknownVariant;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|priority| matches_label(s, priority.label()))
			.ok_or_else(|| UnknownVariant::new("priority", s))
	}
}

/// What a user is allowed to do. Ordered from least to most privileged.
#[cfg_attr(feature = "ssr", derive(diesel_derive_enum::DbEnum))]
#[cfg_attr(feature = "ssr", ExistingTypePath = "crate::schema::sql_types::UserRole")]
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum UserRole {
	Technician,
	Coordinator,
	Admin,
}

impl UserRole {
	pub const ALL: [UserRole; 3] = [Self::Technician, Self::Coordinator, Self::Admin];

	pub fn label(self) -> &'static str {
		match self {
			Self::Technician => "Technician",
			Self::Coordinator => "Coordinator",
			Self::Admin => "Admin",
		}
	}
}

impl Default for UserRole {
	fn default() -> Self {
		Self::Technician
	}
}

impl fmt::Display for UserRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

impl FromStr for UserRole {
	type Err = UnknownVariant;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|role| matches_label(s, role.label()))
			.ok_or_else(|| UnknownVariant::new("role", s))
	}
}

/// Review state of a customer-submitted service request.
#[cfg_attr(feature = "ssr", derive(diesel_derive_enum::DbEnum))]
#[cfg_attr(feature = "ssr", ExistingTypePath = "crate::schema::sql_types::ServiceRequestStatus")]
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum ServiceRequestStatus {
	Pending,
	Accepted,
	Rejected,
}

impl ServiceRequestStatus {
	pub const ALL: [ServiceRequestStatus; 3] = [Self::Pending, Self::Accepted, Self::Rejected];

	pub fn label(self) -> &'static str {
		match self {
			Self::Pending => "Pending",
			Self::Accepted => "Accepted",
			Self::Rejected => "Rejected",
		}
	}
}

impl fmt::Display for ServiceRequestStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

impl FromStr for ServiceRequestStatus {
	type Err = UnknownVariant;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|status| matches_label(s, status.label()))
			.ok_or_else(|| UnknownVariant::new("service request status", s))
	}
}

/// Returned when a query string or header names a variant that doesn't exist.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("unknown {kind} \"{value}\"")]
pub struct UnknownVariant {
	pub kind: &'static str,
	pub value: String,
}

impl UnknownVariant {
	fn new(kind: &'static str, value: &str) -> Self {
		Self {
			kind,
			value: value.to_string(),
		}
	}
}

/// Accepts "In Progress", "in_progress", "InProgress" and "inprogress" alike.
fn matches_label(input: &str, label: &str) -> bool {
	let normalize = |value: &str| -> String {
		value
			.chars()
			.filter(|c| !matches!(c, ' ' | '_' | '-'))
			.flat_map(char::to_lowercase)
			.collect()
	};
	normalize(input) == normalize(label)
}

/// Parses a comma-separated list of variants, ignoring empty segments.
pub fn parse_list<T: FromStr<Err = UnknownVariant>>(input: &str) -> Result<Vec<T>, UnknownVariant> {
	input
		.split(',')
		.map(str::trim)
		.filter(|segment| !segment.is_empty())
		.map(T::from_str)
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn status_parses_labels_and_variant_names() {
		assert_eq!("In Progress".parse::<TicketStatus>(), Ok(TicketStatus::InProgress));
		assert_eq!("in_progress".parse::<TicketStatus>(), Ok(TicketStatus::InProgress));
		assert_eq!("OnHold".parse::<TicketStatus>(), Ok(TicketStatus::OnHold));
		assert!("Finished".parse::<TicketStatus>().is_err());
	}

	#[test]
	fn only_closed_and_cancelled_are_inactive() {
		let inactive: Vec<TicketStatus> = TicketStatus::ALL.into_iter().filter(|s| !s.is_active()).collect();
		assert_eq!(inactive, vec![TicketStatus::Closed, TicketStatus::Cancelled]);
	}

	#[test]
	fn role_order_reflects_privilege() {
		assert!(UserRole::Admin > UserRole::Coordinator);
		assert!(UserRole::Coordinator > UserRole::Technician);
	}

	#[test]
	fn list_parsing_skips_blank_segments() {
		let statuses: Vec<TicketStatus> = parse_list("open, ,closed,").unwrap();
		assert_eq!(statuses, vec![TicketStatus::Open, TicketStatus::Closed]);

		let error = parse_list::<TicketPriority>("high,urgent").unwrap_err();
		assert_eq!(error.value, "urgent");
	}
}
