use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use camera::{CameraPosition, Drag, Viewport};
pub use error::{Error, Result};
pub use pin::{NewPin, Pin};
pub use reaction::{Bookmark, Like};
pub use settings::{Settings, Theme};
pub use store::Store;

pub mod camera;
pub mod error;
pub mod pin;
pub mod reaction;
pub mod settings;
pub mod store;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS: f64 = 6_371_000.0;

/// Max distance in meters between the camera target and a pin for the pin
/// details to be opened.
pub const INTERACTION_DISTANCE: f64 = 100.0;

/// A geographic coordinate in degrees.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> GeoPoint {
        GeoPoint {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.latitude, self.longitude)
    }
}

/// Parses `"<lat>,<lon>"`, each side either decimal degrees or
/// degree-minute-second notation such as `44°29'39"N`.
impl FromStr for GeoPoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<GeoPoint> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| Error::InvalidCoordinate(format!("expected <lat>,<lon>: {}", s)))?;
        let latitude = latlon::parse_lat(lat.trim())
            .map_err(|e| Error::InvalidCoordinate(format!("{}: {:?}", lat.trim(), e)))?;
        let longitude = latlon::parse_lng(lon.trim())
            .map_err(|e| Error::InvalidCoordinate(format!("{}: {:?}", lon.trim(), e)))?;
        Ok(GeoPoint::new(latitude, longitude))
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(p: GeoPoint) -> Self {
        geo::Point::new(p.longitude, p.latitude)
    }
}

impl From<geo::Point<f64>> for GeoPoint {
    fn from(p: geo::Point<f64>) -> Self {
        GeoPoint::new(p.y(), p.x())
    }
}

/// Great-circle distance in meters between two points (haversine).
pub fn distance(p1: GeoPoint, p2: GeoPoint) -> f64 {
    let lat1 = p1.latitude.to_radians();
    let lat2 = p2.latitude.to_radians();
    let delta_lat = (p2.latitude - p1.latitude).to_radians();
    let delta_lon = (p2.longitude - p1.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1 for antipodal points.
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS * c
}

fn within_reach(distance: f64) -> bool {
    distance <= INTERACTION_DISTANCE
}

/// Whether a pin at `pin` may be opened from `center`.
pub fn is_interactable(center: GeoPoint, pin: GeoPoint) -> bool {
    within_reach(distance(center, pin))
}

/// Gate a pin's details behind [`is_interactable`].
pub fn open_pin(center: GeoPoint, pin: &Pin) -> Result<&Pin> {
    let distance = distance(center, pin.location());
    if within_reach(distance) {
        Ok(pin)
    } else {
        warn!(pin = %pin.id, distance, "pin out of reach");
        Err(Error::TooFar { distance })
    }
}

/// Finds pins around a center, the way the map overlay draws them around the
/// camera target.
pub struct Searcher {
    center: GeoPoint,
    radius: f64,
    sort_by_distance: bool,
}

impl Searcher {
    pub fn new(center: GeoPoint, radius: f64, sort_by_distance: bool) -> Searcher {
        Searcher {
            center,
            radius,
            sort_by_distance,
        }
    }

    pub fn center(&self) -> GeoPoint {
        self.center
    }

    pub fn filter<'a>(&self, pin: &'a Pin) -> Option<Match<'a>> {
        let distance = distance(self.center, pin.location());
        if distance <= self.radius {
            debug!(pin = %pin.id, distance, "pin in range");
            Some(Match {
                pin,
                distance,
                interactable: within_reach(distance),
            })
        } else {
            debug!(pin = %pin.id, distance, "skipping pin");
            None
        }
    }

    pub fn search<'a, I>(&self, pins: I) -> Vec<Match<'a>>
    where
        I: IntoIterator<Item = &'a Pin>,
    {
        let mut found: Vec<Match<'a>> = pins.into_iter().filter_map(|p| self.filter(p)).collect();
        if self.sort_by_distance {
            found.sort_by(|a, b| {
                a.distance
                    .total_cmp(&b.distance)
                    .then_with(|| a.pin.title.cmp(&b.pin.title))
            });
        }
        found
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match<'a> {
    pub pin: &'a Pin,
    pub distance: f64,
    pub interactable: bool,
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use geo::{Distance, Haversine};
    use uuid::Uuid;

    use super::*;

    const ORIGIN: GeoPoint = GeoPoint::new(0.0, 0.0);

    fn pin_at(title: &str, latitude: f64, longitude: f64) -> Pin {
        Pin {
            id: Uuid::new_v4(),
            created_at: Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 0).unwrap(),
            title: title.to_string(),
            description: String::new(),
            latitude,
            longitude,
            user_id: Uuid::nil(),
        }
    }

    // Point on the equator `meters` east of the origin.
    fn east_of_origin(meters: f64) -> GeoPoint {
        GeoPoint::new(0.0, (meters / EARTH_RADIUS).to_degrees())
    }

    #[test]
    fn distance_to_self_is_zero() {
        let bologna = GeoPoint::new(44.4949, 11.3426);
        assert_eq!(distance(bologna, bologna), 0.0);
        assert_eq!(distance(ORIGIN, ORIGIN), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let cesena = GeoPoint::new(44.1391, 12.2431);
        let sydney = GeoPoint::new(-33.8688, 151.2093);
        let d1 = distance(cesena, sydney);
        let d2 = distance(sydney, cesena);
        assert!((d1 - d2).abs() < 1e-6);
    }

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let d = distance(ORIGIN, GeoPoint::new(0.0, 1.0));
        assert!((d - 111_195.0).abs() < 111_195.0 * 0.01, "got {}", d);
    }

    #[test]
    fn distance_grows_with_separation() {
        let mut last = 0.0;
        for step in 1..=18 {
            let d = distance(ORIGIN, GeoPoint::new(0.0, step as f64 * 10.0));
            assert!(d > last);
            last = d;
        }
    }

    #[test]
    fn distance_of_antipodes_is_half_circumference() {
        let d = distance(ORIGIN, GeoPoint::new(0.0, 180.0));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS).abs() < 1.0);
    }

    #[test]
    fn distance_matches_geo_haversine() {
        let bologna = GeoPoint::new(44.4949, 11.3426);
        let rimini = GeoPoint::new(44.0678, 12.5695);
        // geo uses the IUGG mean radius, ours is rounded to 6371 km.
        let scale = EARTH_RADIUS / 6_371_008.8;
        let origin: geo::Point = bologna.into();
        let destination: geo::Point = rimini.into();
        let expected = Haversine::distance(origin, destination) * scale;
        let d = distance(bologna, rimini);
        assert!((d - expected).abs() / expected < 1e-5, "{} vs {}", d, expected);
    }

    #[test]
    fn geo_point_round_trips_through_geo() {
        let p = GeoPoint::new(45.9645464, -108.276076);
        let point: geo::Point<f64> = p.into();
        assert_eq!(point.x(), -108.276076);
        assert_eq!(point.y(), 45.9645464);
        assert_eq!(GeoPoint::from(point), p);
    }

    #[test]
    fn parse_decimal_point() {
        let p: GeoPoint = "44.4949, -11.3426".parse().unwrap();
        assert!((p.latitude - 44.4949).abs() < 1e-9);
        assert!((p.longitude + 11.3426).abs() < 1e-9);
    }

    #[test]
    fn parse_missing_separator() {
        let res = "44.4949".parse::<GeoPoint>();
        assert!(matches!(res, Err(Error::InvalidCoordinate(_))));
    }

    #[test]
    fn validity() {
        assert!(GeoPoint::new(90.0, -180.0).is_valid());
        assert!(!GeoPoint::new(90.5, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, 181.0).is_valid());
    }

    #[test]
    fn gate_at_the_boundary() {
        let eps = 0.01;
        assert!(is_interactable(ORIGIN, east_of_origin(INTERACTION_DISTANCE - eps)));
        assert!(!is_interactable(ORIGIN, east_of_origin(INTERACTION_DISTANCE + eps)));
    }

    #[test]
    fn gate_scenario() {
        let far = GeoPoint::new(0.0, 0.0009);
        let near = GeoPoint::new(0.0, 0.0008);

        let d_far = distance(ORIGIN, far);
        assert!((d_far - 100.1).abs() < 0.1, "got {}", d_far);
        assert!(!is_interactable(ORIGIN, far));

        let d_near = distance(ORIGIN, near);
        assert!((d_near - 89.0).abs() < 0.5, "got {}", d_near);
        assert!(is_interactable(ORIGIN, near));
    }

    #[test]
    fn gate_and_search_agree_on_reach() {
        let searcher = Searcher::new(ORIGIN, 1_000.0, false);
        for meters in [0.0, 50.0, 99.99, 100.0, 100.01, 150.0] {
            let location = east_of_origin(meters);
            let pin = pin_at("p", location.latitude, location.longitude);
            let reachable = is_interactable(ORIGIN, location);

            assert_eq!(open_pin(ORIGIN, &pin).is_ok(), reachable, "{} m", meters);
            assert_eq!(searcher.filter(&pin).unwrap().interactable, reachable, "{} m", meters);
        }
    }

    #[test]
    fn open_pin_too_far() {
        let pin = pin_at("far", 0.0, 0.0009);
        match open_pin(ORIGIN, &pin) {
            Err(Error::TooFar { distance }) => assert!(distance > INTERACTION_DISTANCE),
            other => panic!("unexpected {:?}", other),
        }

        let pin = pin_at("near", 0.0, 0.0008);
        assert_eq!(open_pin(ORIGIN, &pin).unwrap().title, "near");
    }

    #[test]
    fn search_filters_and_sorts() {
        let pins = vec![
            pin_at("b", 0.0, 0.005),
            pin_at("far away", 10.0, 10.0),
            pin_at("a", 0.0, 0.0005),
            pin_at("c", 0.0, -0.005),
        ];
        let searcher = Searcher::new(ORIGIN, 1_000.0, true);

        let found = searcher.search(&pins);

        let titles: Vec<&str> = found.iter().map(|m| m.pin.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
        assert!(found[0].interactable);
        assert!(!found[1].interactable);
    }

    #[test]
    fn search_keeps_order_when_unsorted() {
        let pins = vec![pin_at("b", 0.0, 0.005), pin_at("a", 0.0, 0.0005)];
        let searcher = Searcher::new(ORIGIN, 1_000.0, false);

        let found = searcher.search(&pins);

        assert_eq!(found[0].pin.title, "b");
        assert_eq!(found[1].pin.title, "a");
    }
}
