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

use crate::fields::RawObservation;
use crate::metrics::{MetricFamily, MetricIdentity};
use crate::schema::Binding;

/// A field name or label value formed from a channel index, e.g. `temp` `3` `f`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Numbered {
    pub prefix: &'static str,
    pub suffix: &'static str,
}

impl Numbered {
    pub const fn new(prefix: &'static str, suffix: &'static str) -> Self {
        Numbered { prefix, suffix }
    }

    pub fn format(&self, index: usize) -> String {
        format!("{}{}{}", self.prefix, index, self.suffix)
    }
}

/// A field reported for each channel of a group and the gauge it sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelField {
    pub field: Numbered,
    pub family: MetricFamily,
    pub sensor: Numbered,
}

/// Sensors that a station may have several of, numbered from 1.
///
/// A channel exists when its defining field is present in a report. Stations number
/// channels contiguously so enumeration stops at the first missing channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelGroup {
    pub name: &'static str,
    pub defining: Numbered,
    pub max_channels: usize,
    pub fields: &'static [ChannelField],
}

impl ChannelGroup {
    /// Return the index of each channel present in a report.
    pub fn enumerate(&self, fields: &RawObservation) -> Vec<usize> {
        (1..=self.max_channels)
            .take_while(|i| fields.contains(&self.defining.format(*i)))
            .collect()
    }

    /// Return the field to parse and gauge to set for each field of a single channel.
    pub fn bindings(&self, station: &str, index: usize) -> Vec<Binding> {
        self.fields
            .iter()
            .map(|f| Binding {
                field: f.field.format(index),
                identity: MetricIdentity::new(f.family, [station.to_owned(), f.sensor.format(index)]),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{ChannelField, ChannelGroup, Numbered};
    use crate::fields::RawObservation;
    use crate::metrics::{MetricFamily, MetricIdentity};
    use crate::schema::{CHANNELS, PROBES, SOIL};

    fn report(names: &[&str]) -> RawObservation {
        names.iter().map(|n| (*n, "1")).collect()
    }

    #[test]
    fn test_enumerate_contiguous() {
        let fields = report(&["temp1f", "temp2f", "temp3f", "batt1"]);
        assert_eq!(vec![1, 2, 3], PROBES.enumerate(&fields));
    }

    #[test]
    fn test_enumerate_stops_at_gap() {
        let fields = report(&["temp1f", "temp2f", "temp4f"]);
        assert_eq!(vec![1, 2], PROBES.enumerate(&fields));
    }

    #[test]
    fn test_enumerate_none_without_first() {
        let fields = report(&["temp2f", "temp3f", "soilhum2"]);
        assert!(PROBES.enumerate(&fields).is_empty());
        assert!(SOIL.enumerate(&fields).is_empty());
    }

    #[test]
    fn test_enumerate_capped() {
        let names: Vec<String> = (1..=12).map(|i| format!("temp{}f", i)).collect();
        let fields: RawObservation = names.iter().map(|n| (n.as_str(), "50")).collect();

        assert_eq!((1..=10).collect::<Vec<_>>(), PROBES.enumerate(&fields));
    }

    #[test]
    fn test_enumerate_groups_independent() {
        let fields = report(&["temp1f", "soilhum1", "soilhum2", "battsm1"]);
        assert_eq!(vec![1], PROBES.enumerate(&fields));
        assert_eq!(vec![1, 2], SOIL.enumerate(&fields));
    }

    #[test]
    fn test_enumerate_present_but_malformed_counts() {
        let fields: RawObservation = [("temp1f", "abc"), ("temp2f", "70")].into_iter().collect();
        assert_eq!(vec![1, 2], PROBES.enumerate(&fields));
    }

    #[test]
    fn test_bindings() {
        let bindings = SOIL.bindings("home", 3);

        assert_eq!(2, bindings.len());
        assert_eq!("soilhum3", bindings[0].field);
        assert_eq!(
            MetricIdentity::new(MetricFamily::Humidity, ["home", "soil3"]),
            bindings[0].identity
        );
        assert_eq!("battsm3", bindings[1].field);
        assert_eq!(
            MetricIdentity::new(MetricFamily::Battery, ["home", "soil3"]),
            bindings[1].identity
        );
    }

    #[test]
    fn test_custom_group() {
        const FIELDS: &[ChannelField] = &[ChannelField {
            field: Numbered::new("leak", ""),
            family: MetricFamily::Battery,
            sensor: Numbered::new("leak", ""),
        }];
        let group = ChannelGroup {
            name: "leak",
            defining: Numbered::new("leak", ""),
            max_channels: 2,
            fields: FIELDS,
        };

        let fields = report(&["leak1", "leak2", "leak3"]);
        assert_eq!(vec![1, 2], group.enumerate(&fields));
        assert_eq!("leak2", group.bindings("home", 2)[0].identity.labels[1]);
    }

    #[test]
    fn test_all_groups_have_fields() {
        for group in CHANNELS {
            assert!(!group.fields.is_empty(), "{}", group.name);
            assert!(group.max_channels > 0, "{}", group.name);
        }
    }
}
