//! Route ordering.
//!
//! Greedy nearest-neighbour from a starting point. Good enough for a day's
//! worth of bars; not an optimal tour.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometres.
const EARTH_RADIUS_KM: f64 = 6_371.0;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a point.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether the coordinates are within range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle distance in kilometres (haversine).
    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

/// A stop to be ordered.
#[derive(Debug, Clone, PartialEq)]
pub struct Stop<'a> {
    /// Identifier returned in the ordering.
    pub id: &'a str,
    /// Where it is, if known.
    pub location: Option<GeoPoint>,
}

/// Order stops by repeatedly visiting the nearest unvisited one.
///
/// Starts from `start` when given, otherwise from the first stop that has a
/// location. Stops without a location keep their relative order and come
/// last. Ties go to the stop listed first.
#[must_use]
pub fn order_stops(start: Option<GeoPoint>, stops: &[Stop<'_>]) -> Vec<String> {
    let (mut located, unlocated): (Vec<_>, Vec<_>) =
        stops.iter().partition(|s| s.location.is_some());

    let mut ordered = Vec::with_capacity(stops.len());

    let mut current = match start {
        Some(point) => Some(point),
        None if !located.is_empty() => {
            let first = located.remove(0);
            ordered.push(first.id.to_string());
            first.location
        }
        None => None,
    };

    while let Some(here) = current {
        let nearest = located
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.location.map(|loc| (i, here.distance_km(&loc))))
            .fold(None, |best: Option<(usize, f64)>, (i, d)| match best {
                Some((_, best_d)) if best_d <= d => best,
                _ => Some((i, d)),
            });

        match nearest {
            Some((i, _)) => {
                let next = located.remove(i);
                ordered.push(next.id.to_string());
                current = next.location;
            }
            None => current = None,
        }
    }

    ordered.extend(unlocated.iter().map(|s| s.id.to_string()));
    ordered
}

/// Total travel distance along the given order, from `start` if provided.
#[must_use]
pub fn route_length_km(start: Option<GeoPoint>, points: &[GeoPoint]) -> f64 {
    let mut total = 0.0;
    let mut previous = start;
    for point in points {
        if let Some(prev) = previous {
            total += prev.distance_km(point);
        }
        previous = Some(*point);
    }
    total
}
