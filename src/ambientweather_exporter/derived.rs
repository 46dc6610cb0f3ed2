// ambientweather_exporter - Prometheus metrics exporter for Ambient Weather stations
//
// Copyright 2022 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

//! Comfort metrics computed from the basic readings of a report.
//!
//! All temperatures are in degrees fahrenheit, humidity is relative humidity from
//! 0 to 100, and wind speed is in miles per hour.

use crate::fields::ParsedField;

/// Temperature at or below which wind chill is used for "feels like".
pub const WIND_CHILL_MAX_F: f64 = 40.0;
/// Minimum wind speed for wind chill to have any effect.
pub const WIND_CHILL_MIN_MPH: f64 = 5.0;
/// Temperature at or above which heat index is used for "feels like".
pub const HEAT_INDEX_MIN_F: f64 = 80.0;

/// Wind chill using the NWS formula, or `temp_f` when it's too warm or not windy enough.
pub fn wind_chill(temp_f: f64, wind_mph: f64) -> f64 {
    if temp_f > WIND_CHILL_MAX_F || wind_mph < WIND_CHILL_MIN_MPH {
        return temp_f;
    }

    let wind_exp = wind_mph.powf(0.16);
    35.74 + (0.6215 * temp_f) - (35.75 * wind_exp) + (0.4275 * temp_f * wind_exp)
}

/// Heat index following <https://www.wpc.ncep.noaa.gov/html/heatindex_equation.shtml>
pub fn heat_index(temp_f: f64, rh: f64) -> f64 {
    if temp_f < HEAT_INDEX_MIN_F {
        return temp_f;
    }

    let simple = 0.5 * (temp_f + 61.0 + ((temp_f - 68.0) * 1.2) + (rh * 0.094));
    if simple < HEAT_INDEX_MIN_F {
        return simple;
    }

    let t = temp_f;
    let hi = -42.379 + 2.04901523 * t + 10.14333127 * rh
        - 0.22475541 * t * rh
        - 0.00683783 * t * t
        - 0.05481717 * rh * rh
        + 0.00122874 * t * t * rh
        + 0.00085282 * t * rh * rh
        - 0.00000199 * t * t * rh * rh;

    if rh < 13.0 && (80.0..=112.0).contains(&t) {
        hi - ((13.0 - rh) / 4.0) * ((17.0 - (t - 95.0).abs()) / 17.0).sqrt()
    } else if rh > 85.0 && (80.0..=87.0).contains(&t) {
        hi + ((rh - 85.0) / 10.0) * ((87.0 - t) / 5.0)
    } else {
        hi
    }
}

/// Dew point using the Magnus formula.
pub fn dew_point(temp_f: f64, rh: f64) -> f64 {
    const A: f64 = 17.625;
    const B: f64 = 243.04;

    let temp_c = (temp_f - 32.0) * 5.0 / 9.0;
    let alpha = (rh / 100.0).ln() + ((A * temp_c) / (B + temp_c));
    (B * alpha / (A - alpha)) * 9.0 / 5.0 + 32.0
}

/// Basic readings from a single report that derived metrics are computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedContext {
    pub temp_f: ParsedField,
    pub humidity: ParsedField,
    pub wind_speed_mph: ParsedField,
}

impl Default for DerivedContext {
    fn default() -> Self {
        DerivedContext {
            temp_f: ParsedField::Absent,
            humidity: ParsedField::Absent,
            wind_speed_mph: ParsedField::Absent,
        }
    }
}

impl DerivedContext {
    /// Dew point if both temperature and humidity were valid.
    ///
    /// Humidity of zero or less has no dew point so `None` is returned for it.
    pub fn dew_point(&self) -> Option<f64> {
        let temp = self.temp_f.value()?;
        let rh = self.humidity.value()?;
        Some(dew_point(temp, rh)).filter(|v| v.is_finite())
    }

    /// Temperature adjusted for heat index or wind chill if temperature was valid.
    ///
    /// Heat index is only used when humidity was valid and wind chill only when wind
    /// speed was valid. Otherwise the temperature is used unchanged.
    pub fn feels_like(&self) -> Option<f64> {
        let temp = self.temp_f.value()?;

        Some(match (self.humidity.value(), self.wind_speed_mph.value()) {
            (Some(rh), _) if temp >= HEAT_INDEX_MIN_F => heat_index(temp, rh),
            (_, Some(mph)) if temp <= WIND_CHILL_MAX_F => wind_chill(temp, mph),
            _ => temp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{dew_point, heat_index, wind_chill, DerivedContext};
    use crate::fields::ParsedField;

    const EPSILON: f64 = 0.01;

    fn assert_close(expected: f64, actual: f64, tolerance: f64) {
        assert!(
            (expected - actual).abs() < tolerance,
            "expected {} got {}",
            expected,
            actual
        );
    }

    fn context(temp: ParsedField, humidity: ParsedField, wind: ParsedField) -> DerivedContext {
        DerivedContext {
            temp_f: temp,
            humidity,
            wind_speed_mph: wind,
        }
    }

    #[test]
    fn test_wind_chill_too_warm() {
        assert_eq!(45.0, wind_chill(45.0, 10.0));
    }

    #[test]
    fn test_wind_chill_not_windy() {
        assert_eq!(30.0, wind_chill(30.0, 2.0));
    }

    #[test]
    fn test_wind_chill() {
        assert_close(21.25, wind_chill(30.0, 10.0), EPSILON);
        assert_close(-19.40, wind_chill(0.0, 15.0), EPSILON);
        assert_close(36.47, wind_chill(40.0, 5.0), EPSILON);
    }

    #[test]
    fn test_heat_index_too_cool() {
        assert_eq!(75.0, heat_index(75.0, 50.0));
    }

    #[test]
    fn test_heat_index_simple() {
        let simple = 0.5 * (80.0 + 61.0 + (12.0 * 1.2) + (40.0 * 0.094));
        assert!(simple < 80.0);
        assert_close(simple, heat_index(80.0, 40.0), 1e-9);
    }

    #[test]
    fn test_heat_index_rothfusz() {
        assert_close(105.22, heat_index(95.0, 50.0), EPSILON);
        assert_close(90.68, heat_index(90.0, 40.0), EPSILON);
    }

    #[test]
    fn test_heat_index_low_humidity_adjustment() {
        assert_close(94.12, heat_index(100.0, 10.0), EPSILON);
    }

    #[test]
    fn test_heat_index_high_humidity_adjustment() {
        assert_close(101.78, heat_index(85.0, 90.0), EPSILON);
    }

    #[test]
    fn test_dew_point() {
        assert_close(50.6, dew_point(70.0, 50.0), 0.5);
        assert_close(50.0, dew_point(50.0, 100.0), EPSILON);
        assert_close(78.90, dew_point(90.0, 70.0), EPSILON);
    }

    #[test]
    fn test_context_dew_point_requires_both() {
        let missing = context(ParsedField::Value(70.0), ParsedField::Absent, ParsedField::Absent);
        let malformed = context(
            ParsedField::Value(70.0),
            ParsedField::Malformed("abc".to_owned()),
            ParsedField::Absent,
        );
        let valid = context(ParsedField::Value(70.0), ParsedField::Value(50.0), ParsedField::Absent);

        assert_eq!(None, missing.dew_point());
        assert_eq!(None, malformed.dew_point());
        assert_close(50.5, valid.dew_point().unwrap(), 0.5);
    }

    #[test]
    fn test_context_dew_point_zero_humidity() {
        let ctx = context(ParsedField::Value(70.0), ParsedField::Value(0.0), ParsedField::Absent);
        assert_eq!(None, ctx.dew_point());
    }

    #[test]
    fn test_feels_like_requires_temperature() {
        let ctx = context(
            ParsedField::Malformed("x".to_owned()),
            ParsedField::Value(50.0),
            ParsedField::Value(10.0),
        );
        assert_eq!(None, ctx.feels_like());
        assert_eq!(None, DerivedContext::default().feels_like());
    }

    #[test]
    fn test_feels_like_mild_is_raw_temperature() {
        for temp in 41..=79 {
            let temp = f64::from(temp);
            for rh in [0.0, 50.0, 100.0] {
                for mph in [0.0, 10.0, 60.0] {
                    let ctx = context(ParsedField::Value(temp), ParsedField::Value(rh), ParsedField::Value(mph));
                    assert_eq!(Some(temp), ctx.feels_like());
                }
            }
        }
    }

    #[test]
    fn test_feels_like_heat_index() {
        let ctx = context(ParsedField::Value(95.0), ParsedField::Value(50.0), ParsedField::Value(10.0));
        assert_eq!(Some(heat_index(95.0, 50.0)), ctx.feels_like());
    }

    #[test]
    fn test_feels_like_wind_chill() {
        let ctx = context(ParsedField::Value(30.0), ParsedField::Value(50.0), ParsedField::Value(10.0));
        assert_eq!(Some(wind_chill(30.0, 10.0)), ctx.feels_like());
    }

    #[test]
    fn test_feels_like_falls_back_without_secondary() {
        let hot = context(
            ParsedField::Value(95.0),
            ParsedField::Malformed("abc".to_owned()),
            ParsedField::Value(10.0),
        );
        let cold = context(ParsedField::Value(30.0), ParsedField::Value(50.0), ParsedField::Absent);

        assert_eq!(Some(95.0), hot.feels_like());
        assert_eq!(Some(30.0), cold.feels_like());
    }
}
