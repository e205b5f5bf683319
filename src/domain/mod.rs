// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Field-service rules that don't depend on storage or HTTP: SLA deadlines, ticket change handling, map
//! clustering, reporting and calendar grouping. Compiled for both the server and the hydrated client.

pub mod calendar;
pub mod clustering;
pub mod enums;
pub mod reports;
pub mod sla;
pub mod ticket_changes;
pub mod validation;

use serde::{Deserialize, Deserializer};

/// Deserializes a present value (including `null`) as `Some`, so that with `#[serde(default)]` an absent key stays
/// `None` while an explicit `null` becomes `Some(None)`.
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
	T: Deserialize<'de>,
	D: Deserializer<'de>,
{
	T::deserialize(deserializer).map(Some)
}
