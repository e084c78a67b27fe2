use chrono::{DateTime, Utc};

use super::domain::{GeoPoint, TransportPlan, TransportStatus};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Average shuttle speed assumed when quoting a pickup ETA.
const AVERAGE_SPEED_KMH: f64 = 40.0;

/// Great-circle distance between two points, via the haversine formula.
pub fn great_circle_km(from: GeoPoint, to: GeoPoint) -> f64 {
    let from_lat = from.latitude.to_radians();
    let to_lat = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + from_lat.cos() * to_lat.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

pub fn eta_minutes(distance_km: f64) -> u32 {
    (distance_km / AVERAGE_SPEED_KMH * 60.0).ceil() as u32
}

/// Build the pickup plan persisted by workflow step 2.
pub fn plan_pickup(
    pickup: GeoPoint,
    destination: GeoPoint,
    scheduled_at: DateTime<Utc>,
) -> TransportPlan {
    let distance_km = great_circle_km(pickup, destination);
    TransportPlan {
        pickup,
        distance_km,
        eta_minutes: eta_minutes(distance_km),
        status: TransportStatus::Scheduled,
        scheduled_at,
    }
}
