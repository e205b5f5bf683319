// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Coordinates are grouped at this many decimal places (roughly 11m at the equator).
pub const CLUSTER_PRECISION: i32 = 4;

const BASE_BADGE_SIZE: u32 = 24;
const BADGE_GROWTH: u32 = 4;
const MAX_BADGE_STEPS: u32 = 10;

/// A ticket location as stored on its site, before any parsing.
#[derive(Clone, Debug)]
pub struct MarkerPoint<'a> {
	pub ticket_id: &'a str,
	pub latitude: Option<&'a str>,
	pub longitude: Option<&'a str>,
}

/// Tickets sharing a rounded location.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerCluster {
	pub latitude: f64,
	pub longitude: f64,
	pub count: usize,
	pub ticket_ids: Vec<String>,
	/// Diameter of the map badge in pixels
	pub badge_size: u32,
}

/// Gets the badge diameter for a cluster of the given size.
pub fn badge_size(count: usize) -> u32 {
	let steps = u32::try_from(count.saturating_sub(1)).unwrap_or(u32::MAX).min(MAX_BADGE_STEPS);
	BASE_BADGE_SIZE + BADGE_GROWTH * steps
}

/// Parses a single coordinate, rejecting anything that couldn't be drawn on a map.
pub fn parse_coordinate(value: &str, limit: f64) -> Option<f64> {
	let value: f64 = value.trim().parse().ok()?;
	if value.is_finite() && value.abs() <= limit {
		Some(value)
	} else {
		None
	}
}

fn rounding_key(value: f64) -> i64 {
	let scale = 10f64.powi(CLUSTER_PRECISION);
	(value * scale).round() as i64
}

/// Groups markers whose coordinates round to the same point.
///
/// Points with missing or malformed coordinates are skipped. The largest clusters come first; ties are broken by
/// position so the output is stable between refreshes.
pub fn cluster_markers<'a>(points: impl IntoIterator<Item = MarkerPoint<'a>>) -> Vec<MarkerCluster> {
	let scale = 10f64.powi(CLUSTER_PRECISION);
	let mut groups: HashMap<(i64, i64), Vec<String>> = HashMap::new();
	let mut order: Vec<(i64, i64)> = Vec::new();

	for point in points {
		let (Some(latitude), Some(longitude)) = (point.latitude, point.longitude) else {
			continue;
		};
		let (Some(latitude), Some(longitude)) = (parse_coordinate(latitude, 90.0), parse_coordinate(longitude, 180.0))
		else {
			continue;
		};
		let key = (rounding_key(latitude), rounding_key(longitude));
		let ticket_ids = groups.entry(key).or_insert_with(|| {
			order.push(key);
			Vec::new()
		});
		ticket_ids.push(point.ticket_id.to_string());
	}

	let mut clusters: Vec<MarkerCluster> = order
		.into_iter()
		.filter_map(|key| {
			let ticket_ids = groups.remove(&key)?;
			let count = ticket_ids.len();
			Some(MarkerCluster {
				latitude: key.0 as f64 / scale,
				longitude: key.1 as f64 / scale,
				count,
				ticket_ids,
				badge_size: badge_size(count),
			})
		})
		.collect();

	clusters.sort_by(|a, b| {
		b.count
			.cmp(&a.count)
			.then_with(|| a.latitude.total_cmp(&b.latitude))
			.then_with(|| a.longitude.total_cmp(&b.longitude))
	});
	clusters
}

#[cfg(test)]
mod tests {
	use super::*;

	fn point<'a>(ticket_id: &'a str, latitude: &'a str, longitude: &'a str) -> MarkerPoint<'a> {
		MarkerPoint {
			ticket_id,
			latitude: Some(latitude),
			longitude: Some(longitude),
		}
	}

	#[test]
	fn nearby_points_share_a_cluster() {
		let clusters = cluster_markers([
			point("a", "51.50071", "-0.12462"),
			point("b", "51.500712", "-0.124619"),
			point("c", "48.8584", "2.2945"),
		]);

		assert_eq!(clusters.len(), 2);
		assert_eq!(clusters[0].count, 2);
		assert_eq!(clusters[0].ticket_ids, vec!["a", "b"]);
		assert_eq!(clusters[0].latitude, 51.5007);
		assert_eq!(clusters[0].longitude, -0.1246);
		assert_eq!(clusters[1].ticket_ids, vec!["c"]);
	}

	#[test]
	fn malformed_and_missing_coordinates_are_skipped() {
		let clusters = cluster_markers([
			point("bad", "north", "-0.1"),
			point("range", "91.0", "10.0"),
			point("nan", "NaN", "1.0"),
			MarkerPoint {
				ticket_id: "missing",
				latitude: None,
				longitude: Some("1.0"),
			},
			point("ok", " 10.0 ", "20.0"),
		]);

		assert_eq!(clusters.len(), 1);
		assert_eq!(clusters[0].ticket_ids, vec!["ok"]);
	}

	#[test]
	fn badge_grows_with_count_up_to_a_limit() {
		assert_eq!(badge_size(1), 24);
		assert_eq!(badge_size(2), 28);
		assert_eq!(badge_size(11), 64);
		assert_eq!(badge_size(500), 64);
		assert_eq!(badge_size(0), 24);
	}

	#[test]
	fn equal_sized_clusters_are_ordered_by_position() {
		let clusters = cluster_markers([point("east", "10", "20"), point("west", "10", "-20")]);
		let ids: Vec<&str> = clusters.iter().map(|c| c.ticket_ids[0].as_str()).collect();
		assert_eq!(ids, vec!["west", "east"]);
	}
}
