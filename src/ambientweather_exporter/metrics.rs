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

use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use std::error;
use std::fmt;
use std::sync::atomic::AtomicU64;

const LABEL_NAME: &str = "name";
const LABEL_SENSOR: &str = "sensor";
const LABEL_TYPE: &str = "type";
const LABEL_PERIOD: &str = "period";
const LABEL_OUTCOME: &str = "outcome";

const OUTCOME_PROCESSED: &str = "processed";
const OUTCOME_FAILED: &str = "failed";

type Labels = Vec<(&'static str, String)>;
type GaugeFamily = Family<Labels, Gauge<f64, AtomicU64>>;

/// Every gauge family exported for a station.
///
/// The label names of each family are fixed. The first label of every family is
/// always the configured name of the station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricFamily {
    Temperature,
    Battery,
    Humidity,
    Barometer,
    WindDir,
    WindSpeedMph,
    SolarRadiation,
    RainIn,
    Ultraviolet,
}

impl MetricFamily {
    pub const ALL: [MetricFamily; 9] = [
        Self::Temperature,
        Self::Battery,
        Self::Humidity,
        Self::Barometer,
        Self::WindDir,
        Self::WindSpeedMph,
        Self::SolarRadiation,
        Self::RainIn,
        Self::Ultraviolet,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Battery => "battery",
            Self::Humidity => "humidity",
            Self::Barometer => "barometer",
            Self::WindDir => "wind_dir",
            Self::WindSpeedMph => "wind_speed_mph",
            Self::SolarRadiation => "solar_radiation",
            Self::RainIn => "rain_in",
            Self::Ultraviolet => "ultraviolet",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            Self::Temperature => "Temperature in degrees fahrenheit",
            Self::Battery => "Sensor battery status (1 = ok, 0 = low)",
            Self::Humidity => "Relative humidity (0-100)",
            Self::Barometer => "Barometric pressure in inches of mercury",
            Self::WindDir => "Wind direction in degrees",
            Self::WindSpeedMph => "Wind speed in miles per hour",
            Self::SolarRadiation => "Solar radiation in watts per square meter",
            Self::RainIn => "Rainfall in inches",
            Self::Ultraviolet => "Ultraviolet index",
        }
    }

    pub fn label_names(self) -> &'static [&'static str] {
        match self {
            Self::Temperature | Self::Battery | Self::Humidity => &[LABEL_NAME, LABEL_SENSOR],
            Self::Barometer | Self::WindSpeedMph => &[LABEL_NAME, LABEL_TYPE],
            Self::RainIn => &[LABEL_NAME, LABEL_PERIOD],
            Self::WindDir | Self::SolarRadiation | Self::Ultraviolet => &[LABEL_NAME],
        }
    }
}

impl fmt::Display for MetricFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single gauge: a family and values for each of its labels, in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricIdentity {
    pub family: MetricFamily,
    pub labels: Vec<String>,
}

impl MetricIdentity {
    pub fn new<I, S>(family: MetricFamily, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MetricIdentity {
            family,
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for MetricIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{{}}}", self.family, self.labels.join(","))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    LabelMismatch {
        family: MetricFamily,
        expected: usize,
        actual: usize,
    },
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LabelMismatch {
                family,
                expected,
                actual,
            } => write!(f, "{} expects {} label values, got {}", family, expected, actual),
        }
    }
}

impl error::Error for SinkError {}

/// Destination for the values parsed and computed from station reports.
///
/// Implementations must allow concurrent calls from multiple reports. The most recent
/// call to `set` for a particular gauge wins.
pub trait MetricSink: Send + Sync {
    fn set(&self, id: &MetricIdentity, value: f64) -> Result<(), SinkError>;
}

/// Holder for the gauges that are set from station reports.
///
/// All gauge families are created and registered upon call to `StationMetrics::new()`.
/// Individual gauges within a family only exist once a report has included a valid
/// value for them.
#[derive(Debug, Clone, Default)]
pub struct StationMetrics {
    temperature: GaugeFamily,
    battery: GaugeFamily,
    humidity: GaugeFamily,
    barometer: GaugeFamily,
    wind_dir: GaugeFamily,
    wind_speed_mph: GaugeFamily,
    solar_radiation: GaugeFamily,
    rain_in: GaugeFamily,
    ultraviolet: GaugeFamily,
}

impl StationMetrics {
    pub fn new(reg: &mut Registry) -> Self {
        let metrics = Self::default();
        for family in MetricFamily::ALL {
            reg.register(family.name(), family.help(), metrics.family(family).clone());
        }

        metrics
    }

    fn family(&self, family: MetricFamily) -> &GaugeFamily {
        match family {
            MetricFamily::Temperature => &self.temperature,
            MetricFamily::Battery => &self.battery,
            MetricFamily::Humidity => &self.humidity,
            MetricFamily::Barometer => &self.barometer,
            MetricFamily::WindDir => &self.wind_dir,
            MetricFamily::WindSpeedMph => &self.wind_speed_mph,
            MetricFamily::SolarRadiation => &self.solar_radiation,
            MetricFamily::RainIn => &self.rain_in,
            MetricFamily::Ultraviolet => &self.ultraviolet,
        }
    }
}

impl MetricSink for StationMetrics {
    fn set(&self, id: &MetricIdentity, value: f64) -> Result<(), SinkError> {
        let names = id.family.label_names();
        if names.len() != id.labels.len() {
            return Err(SinkError::LabelMismatch {
                family: id.family,
                expected: names.len(),
                actual: id.labels.len(),
            });
        }

        let labels: Labels = names.iter().copied().zip(id.labels.iter().cloned()).collect();
        self.family(id.family).get_or_create(&labels).set(value);
        Ok(())
    }
}

/// Counters about the exporter itself rather than the station.
#[derive(Debug, Clone, Default)]
pub struct ReportMetrics {
    reports: Family<Labels, Counter>,
    decode_errors: Counter,
    malformed_fields: Counter,
}

impl ReportMetrics {
    pub fn new(reg: &mut Registry) -> Self {
        let metrics = Self::default();
        reg.register(
            "ambientweather_reports",
            "Station reports received by processing outcome",
            metrics.reports.clone(),
        );
        reg.register(
            "ambientweather_query_decode_errors",
            "Station reports that could only be partially decoded",
            metrics.decode_errors.clone(),
        );
        reg.register(
            "ambientweather_malformed_fields",
            "Report fields that were present but not valid numbers",
            metrics.malformed_fields.clone(),
        );

        metrics
    }

    pub fn processed(&self) {
        self.reports
            .get_or_create(&vec![(LABEL_OUTCOME, OUTCOME_PROCESSED.to_owned())])
            .inc();
    }

    pub fn failed(&self) {
        self.reports
            .get_or_create(&vec![(LABEL_OUTCOME, OUTCOME_FAILED.to_owned())])
            .inc();
    }

    pub fn decode_error(&self) {
        self.decode_errors.inc();
    }

    pub fn malformed_fields(&self, count: u64) {
        self.malformed_fields.inc_by(count);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::{MetricFamily, MetricIdentity, MetricSink, SinkError};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Sink that keeps every value set in memory, optionally panicking for one family.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingSink {
        values: Mutex<HashMap<MetricIdentity, f64>>,
        panic_on: Option<MetricFamily>,
    }

    impl RecordingSink {
        pub(crate) fn panicking(family: MetricFamily) -> Self {
            RecordingSink {
                panic_on: Some(family),
                ..Default::default()
            }
        }

        pub(crate) fn get(&self, family: MetricFamily, labels: &[&str]) -> Option<f64> {
            let id = MetricIdentity::new(family, labels.iter().copied());
            self.values.lock().unwrap().get(&id).copied()
        }

        pub(crate) fn snapshot(&self) -> HashMap<MetricIdentity, f64> {
            self.values.lock().unwrap().clone()
        }

        pub(crate) fn len(&self) -> usize {
            self.values.lock().unwrap().len()
        }
    }

    impl MetricSink for RecordingSink {
        fn set(&self, id: &MetricIdentity, value: f64) -> Result<(), SinkError> {
            if self.panic_on == Some(id.family) {
                panic!("refusing to set {}", id);
            }

            self.values.lock().unwrap().insert(id.clone(), value);
            Ok(())
        }
    }
}
