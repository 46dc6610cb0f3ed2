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

//! Fields understood by the exporter and the gauges they are published as.
//!
//! Every report is evaluated against the same tables: numbered channel groups
//! first, then fixed fields, then values derived from fixed fields.

use crate::channels::{ChannelField, ChannelGroup, Numbered};
use crate::metrics::{MetricFamily, MetricIdentity};

const SENSOR_INDOOR: &str = "indoor";
const SENSOR_OUTDOOR: &str = "outdoor";

/// A field to parse and the gauge to set when it parses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub field: String,
    pub identity: MetricIdentity,
}

/// Readings that derived metrics are computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseReading {
    Temperature,
    Humidity,
    WindSpeed,
}

/// A field that every report may include.
///
/// `label` is the second label value of the gauge, if its family has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldEntry {
    pub field: &'static str,
    pub family: MetricFamily,
    pub label: Option<&'static str>,
    pub base: Option<BaseReading>,
}

impl FieldEntry {
    const fn new(field: &'static str, family: MetricFamily, label: Option<&'static str>) -> Self {
        FieldEntry {
            field,
            family,
            label,
            base: None,
        }
    }

    const fn base(self, reading: BaseReading) -> Self {
        FieldEntry {
            base: Some(reading),
            ..self
        }
    }

    pub fn binding(&self, station: &str) -> Binding {
        Binding {
            field: self.field.to_owned(),
            identity: identity(self.family, station, self.label),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivation {
    DewPoint,
    FeelsLike,
}

/// A gauge computed from base readings rather than parsed from a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedEntry {
    pub derivation: Derivation,
    pub family: MetricFamily,
    pub label: &'static str,
}

impl DerivedEntry {
    pub fn identity(&self, station: &str) -> MetricIdentity {
        identity(self.family, station, Some(self.label))
    }
}

fn identity(family: MetricFamily, station: &str, label: Option<&str>) -> MetricIdentity {
    MetricIdentity::new(family, std::iter::once(station).chain(label))
}

/// Auxiliary temperature probes, each with their own battery.
pub const PROBES: ChannelGroup = ChannelGroup {
    name: "probe",
    defining: Numbered::new("temp", "f"),
    max_channels: 10,
    fields: &[
        ChannelField {
            field: Numbered::new("temp", "f"),
            family: MetricFamily::Temperature,
            sensor: Numbered::new("", ""),
        },
        ChannelField {
            field: Numbered::new("batt", ""),
            family: MetricFamily::Battery,
            sensor: Numbered::new("", ""),
        },
    ],
};

/// Soil moisture probes, each with their own battery.
pub const SOIL: ChannelGroup = ChannelGroup {
    name: "soil",
    defining: Numbered::new("soilhum", ""),
    max_channels: 10,
    fields: &[
        ChannelField {
            field: Numbered::new("soilhum", ""),
            family: MetricFamily::Humidity,
            sensor: Numbered::new("soil", ""),
        },
        ChannelField {
            field: Numbered::new("battsm", ""),
            family: MetricFamily::Battery,
            sensor: Numbered::new("soil", ""),
        },
    ],
};

/// Humidity reported by older firmware for auxiliary probes.
pub const HUMIDITY_CHANNELS: ChannelGroup = ChannelGroup {
    name: "humidity",
    defining: Numbered::new("humidity", ""),
    max_channels: 10,
    fields: &[ChannelField {
        field: Numbered::new("humidity", ""),
        family: MetricFamily::Humidity,
        sensor: Numbered::new("", ""),
    }],
};

pub const CHANNELS: &[ChannelGroup] = &[PROBES, SOIL, HUMIDITY_CHANNELS];

pub const FIELDS: &[FieldEntry] = &[
    FieldEntry::new("tempinf", MetricFamily::Temperature, Some(SENSOR_INDOOR)),
    FieldEntry::new("tempf", MetricFamily::Temperature, Some(SENSOR_OUTDOOR)).base(BaseReading::Temperature),
    FieldEntry::new("battout", MetricFamily::Battery, Some(SENSOR_OUTDOOR)),
    FieldEntry::new("battin", MetricFamily::Battery, Some(SENSOR_INDOOR)),
    FieldEntry::new("humidity", MetricFamily::Humidity, Some(SENSOR_OUTDOOR)).base(BaseReading::Humidity),
    FieldEntry::new("humidityin", MetricFamily::Humidity, Some(SENSOR_INDOOR)),
    FieldEntry::new("baromrelin", MetricFamily::Barometer, Some("relative")),
    FieldEntry::new("baromabsin", MetricFamily::Barometer, Some("absolute")),
    FieldEntry::new("winddir", MetricFamily::WindDir, None),
    FieldEntry::new("windspeedmph", MetricFamily::WindSpeedMph, Some("sustained")).base(BaseReading::WindSpeed),
    FieldEntry::new("windgustmph", MetricFamily::WindSpeedMph, Some("gusts")),
    FieldEntry::new("solarradiation", MetricFamily::SolarRadiation, None),
    FieldEntry::new("uv", MetricFamily::Ultraviolet, None),
    FieldEntry::new("hourlyrainin", MetricFamily::RainIn, Some("hourly")),
    FieldEntry::new("dailyrainin", MetricFamily::RainIn, Some("daily")),
    FieldEntry::new("weeklyrainin", MetricFamily::RainIn, Some("weekly")),
    FieldEntry::new("monthlyrainin", MetricFamily::RainIn, Some("monthly")),
    FieldEntry::new("yearlyrainin", MetricFamily::RainIn, Some("yearly")),
    FieldEntry::new("eventrainin", MetricFamily::RainIn, Some("event")),
];

pub const DERIVED: &[DerivedEntry] = &[
    DerivedEntry {
        derivation: Derivation::DewPoint,
        family: MetricFamily::Temperature,
        label: "dewpoint",
    },
    DerivedEntry {
        derivation: Derivation::FeelsLike,
        family: MetricFamily::Temperature,
        label: "feelsLike",
    },
];
