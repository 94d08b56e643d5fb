//! Navigation geometry on a spherical Earth
//!
//! Distance uses the haversine formula, bearing the initial great-circle
//! bearing. Both take coordinates in degrees and are pure: they are
//! re-evaluated on every location sample and never cached.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StepandError};
use crate::mission::Mission;

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Geographic coordinate in degrees
///
/// Construction validates the range, so every `Coordinate` in the system
/// is finite with latitude in `-90..=90` and longitude in `-180..=180`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = StepandError;

    fn try_from(raw: RawCoordinate) -> Result<Self> {
        Coordinate::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    /// Create a validated coordinate
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);

        if !valid {
            return Err(StepandError::InvalidCoordinate {
                latitude,
                longitude,
            });
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Coordinate from literals known to be in range
    pub(crate) const fn from_static(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Latitude in degrees
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Displace by fixed angular offsets
    ///
    /// Longitude wraps into `[-180, 180)`; a latitude past a pole is an error.
    pub fn offset(&self, delta_lat: f64, delta_lon: f64) -> Result<Self> {
        let latitude = self.latitude + delta_lat;
        let longitude = self.longitude + delta_lon;
        let longitude = if (-180.0..=180.0).contains(&longitude) {
            longitude
        } else {
            (longitude + 180.0).rem_euclid(360.0) - 180.0
        };
        Self::new(latitude, longitude)
    }

    /// Distance to another coordinate in meters
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        distance(self, other)
    }

    /// Initial bearing to another coordinate, `None` if they coincide
    pub fn bearing_to(&self, other: &Coordinate) -> Option<f64> {
        bearing(self, other)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// A location sample from the device
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawUserLocation")]
pub struct UserLocation {
    /// Where the user is
    pub coordinate: Coordinate,
    /// Compass bearing the device faces, if known
    heading: Option<f64>,
}

#[derive(Deserialize)]
struct RawUserLocation {
    coordinate: Coordinate,
    heading: Option<f64>,
}

impl TryFrom<RawUserLocation> for UserLocation {
    type Error = StepandError;

    fn try_from(raw: RawUserLocation) -> Result<Self> {
        let location = UserLocation::new(raw.coordinate);
        match raw.heading {
            Some(h) => location.with_heading(h),
            None => Ok(location),
        }
    }
}

impl UserLocation {
    /// Create a location without heading
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            heading: None,
        }
    }

    /// Attach a heading in degrees, `[0, 360)`
    pub fn with_heading(mut self, heading: f64) -> Result<Self> {
        if !heading.is_finite() || !(0.0..360.0).contains(&heading) {
            return Err(StepandError::InvalidHeading(heading));
        }
        self.heading = Some(heading);
        Ok(self)
    }

    /// Parse raw degrees from a sensor
    pub fn from_degrees(latitude: f64, longitude: f64, heading: Option<f64>) -> Result<Self> {
        let location = Self::new(Coordinate::new(latitude, longitude)?);
        match heading {
            Some(h) => location.with_heading(h),
            None => Ok(location),
        }
    }

    /// Device heading in degrees
    pub fn heading(&self) -> Option<f64> {
        self.heading
    }
}

/// Great-circle distance in meters (haversine)
pub fn distance(from: &Coordinate, to: &Coordinate) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let dlat = (to.latitude - from.latitude).to_radians();
    let dlon = (to.longitude - from.longitude).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1 for near-antipodal points
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Initial bearing in degrees `[0, 360)`, clockwise from true north
///
/// Returns `None` when origin and target coincide; callers hold the
/// previous direction in that case.
pub fn bearing(from: &Coordinate, to: &Coordinate) -> Option<f64> {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let dlon = (to.longitude - from.longitude).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

    if x == 0.0 && y == 0.0 {
        return None;
    }

    Some(wrap_360(y.atan2(x).to_degrees()))
}

/// Bearing relative to where the device faces, for an on-screen arrow
///
/// A missing heading counts as facing north.
pub fn relative_bearing(bearing: f64, heading: Option<f64>) -> f64 {
    bearing - heading.unwrap_or(0.0)
}

/// Normalize an angle into `[0, 360)`
pub fn wrap_360(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can return exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Normalize an angle into `(-180, 180]`
pub fn wrap_180(degrees: f64) -> f64 {
    let wrapped = wrap_360(degrees);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Inclusive proximity test, no hysteresis
pub fn is_near(distance_m: f64, radius_m: f64) -> bool {
    distance_m <= radius_m
}

/// Navigation output for one location sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavigationFix {
    /// Ground distance to the target in meters
    pub distance_m: f64,
    /// Initial bearing to the target, `None` when standing on it
    pub bearing_deg: Option<f64>,
    /// Bearing minus device heading
    pub relative_bearing_deg: Option<f64>,
    /// Within the mission radius
    pub is_near: bool,
}

impl NavigationFix {
    /// Compute the fix from the user's location to a mission target
    pub fn compute(user: &UserLocation, mission: &Mission) -> Self {
        let target = mission.location();
        let distance_m = distance(&user.coordinate, &target);
        let bearing_deg = bearing(&user.coordinate, &target);

        Self {
            distance_m,
            bearing_deg,
            relative_bearing_deg: bearing_deg.map(|b| relative_bearing(b, user.heading())),
            is_near: is_near(distance_m, mission.radius_m()),
        }
    }
}
