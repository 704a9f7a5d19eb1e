use serde::{Deserialize, Serialize};

use fleet_errors::{DispatchError, DispatchResult};

/// A WGS-84 position in decimal degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> DispatchResult<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(DispatchError::invalid_input(format!(
                "latitude must be between -90 and 90, got {latitude}"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(DispatchError::invalid_input(format!(
                "longitude must be between -180 and 180, got {longitude}"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Builds coordinates from nullable columns; exactly one side present is rejected.
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> DispatchResult<Option<Self>> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => Self::new(lat, lon).map(Some),
            (None, None) => Ok(None),
            _ => Err(DispatchError::invalid_input(
                "latitude and longitude must be both present or both absent",
            )),
        }
    }

    pub fn as_tuple(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

/// Which parts of the pickup location a driver's home address has to share.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LocationPolicy {
    #[default]
    CityAndCountry,
    CityOnly,
}

impl LocationPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationPolicy::CityAndCountry => "city_and_country",
            LocationPolicy::CityOnly => "city_only",
        }
    }
}

impl std::str::FromStr for LocationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "city_and_country" => Ok(LocationPolicy::CityAndCountry),
            "city_only" => Ok(LocationPolicy::CityOnly),
            _ => Err(format!(
                "Invalid location policy: {s}. Valid policies: city_and_country, city_only"
            )),
        }
    }
}

impl std::fmt::Display for LocationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_range() {
        assert!(Coordinates::new(4.60971, -74.08175).is_ok());
        assert!(Coordinates::new(90.0, 180.0).is_ok());
        assert!(Coordinates::new(-90.0, -180.0).is_ok());
        assert!(Coordinates::new(90.1, 0.0).is_err());
        assert!(Coordinates::new(0.0, -180.5).is_err());
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_coordinates_from_parts() {
        assert_eq!(Coordinates::from_parts(None, None).unwrap(), None);
        assert!(Coordinates::from_parts(Some(1.0), Some(2.0)).unwrap().is_some());

        let err = Coordinates::from_parts(Some(1.0), None).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_location_policy_parsing() {
        assert_eq!(
            "city_only".parse::<LocationPolicy>().unwrap(),
            LocationPolicy::CityOnly
        );
        assert_eq!(
            "CITY_AND_COUNTRY".parse::<LocationPolicy>().unwrap(),
            LocationPolicy::CityAndCountry
        );
        assert!("planet".parse::<LocationPolicy>().is_err());
        assert_eq!(LocationPolicy::default().to_string(), "city_and_country");
    }
}
