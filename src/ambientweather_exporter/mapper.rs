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

use crate::derived::DerivedContext;
use crate::fields::{self, ParsedField, RawObservation};
use crate::metrics::{MetricSink, SinkError};
use crate::schema::{self, BaseReading, Binding, Derivation};
use std::error;
use std::fmt;
use std::sync::Arc;

#[derive(Debug)]
pub enum ObservationError {
    Sink(SinkError),
}

impl fmt::Display for ObservationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sink(e) => write!(f, "unable to publish metric: {}", e),
        }
    }
}

impl error::Error for ObservationError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Sink(e) => Some(e),
        }
    }
}

impl From<SinkError> for ObservationError {
    fn from(e: SinkError) -> Self {
        Self::Sink(e)
    }
}

/// Counts of what happened to each field considered for a single report.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MappingSummary {
    pub published: usize,
    pub absent: usize,
    pub malformed: usize,
    pub decode_error: bool,
}

/// Publish the fields of station reports as gauges labeled with the station name.
pub struct ObservationMapper {
    station: String,
    sink: Arc<dyn MetricSink>,
}

impl ObservationMapper {
    pub fn new<S: Into<String>>(station: S, sink: Arc<dyn MetricSink>) -> Self {
        ObservationMapper {
            station: station.into(),
            sink,
        }
    }

    pub fn station(&self) -> &str {
        &self.station
    }

    /// Decode a raw report query string and publish every field that could be parsed.
    ///
    /// A query string that can only be partially decoded is logged and the fields that
    /// could be decoded are still published.
    pub fn observe_query(&self, query: &str) -> Result<MappingSummary, ObservationError> {
        let (fields, err) = fields::extract(query);
        if let Some(e) = &err {
            tracing::warn!(message = "unable to fully decode station report", error = %e);
        }

        let mut summary = self.observe(&fields)?;
        summary.decode_error = err.is_some();
        Ok(summary)
    }

    /// Publish every field of a report that parses, along with derived values.
    ///
    /// Fields that are missing or not valid numbers are skipped and the gauges for them
    /// keep whatever value they had before. Derived values are only published when all
    /// readings they depend on parsed.
    pub fn observe(&self, fields: &RawObservation) -> Result<MappingSummary, ObservationError> {
        let mut summary = MappingSummary::default();
        let mut base = DerivedContext::default();

        for group in schema::CHANNELS {
            for index in group.enumerate(fields) {
                for binding in group.bindings(&self.station, index) {
                    self.publish(fields, &binding, &mut summary)?;
                }
            }
        }

        for entry in schema::FIELDS {
            let parsed = self.publish(fields, &entry.binding(&self.station), &mut summary)?;
            match entry.base {
                Some(BaseReading::Temperature) => base.temp_f = parsed,
                Some(BaseReading::Humidity) => base.humidity = parsed,
                Some(BaseReading::WindSpeed) => base.wind_speed_mph = parsed,
                None => {}
            }
        }

        for entry in schema::DERIVED {
            let value = match entry.derivation {
                Derivation::DewPoint => base.dew_point(),
                Derivation::FeelsLike => base.feels_like(),
            };

            if let Some(v) = value {
                self.sink.set(&entry.identity(&self.station), v)?;
                summary.published += 1;
            }
        }

        Ok(summary)
    }

    fn publish(
        &self,
        fields: &RawObservation,
        binding: &Binding,
        summary: &mut MappingSummary,
    ) -> Result<ParsedField, SinkError> {
        let parsed = fields::parse(fields, &binding.field);
        match &parsed {
            ParsedField::Value(v) => {
                self.sink.set(&binding.identity, *v)?;
                summary.published += 1;
            }
            ParsedField::Absent => summary.absent += 1,
            ParsedField::Malformed(_) => summary.malformed += 1,
        }

        Ok(parsed)
    }
}
