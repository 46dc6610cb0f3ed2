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

use percent_encoding::percent_decode_str;
use std::collections::BTreeMap;
use std::error;
use std::fmt;

/// Every field sent in a single station report along with every value sent for it.
///
/// Stations don't normally repeat fields but nothing stops them from doing so. All
/// values are kept in the order they were sent and only the first one is used.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RawObservation {
    fields: BTreeMap<String, Vec<String>>,
}

impl RawObservation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<N, V>(&mut self, name: N, value: V)
    where
        N: Into<String>,
        V: Into<String>,
    {
        self.fields.entry(name.into()).or_default().push(value.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Return the first value sent for a field, if any.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.first()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<N, V> FromIterator<(N, V)> for RawObservation
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut obs = RawObservation::new();
        for (name, value) in iter {
            obs.insert(name, value);
        }

        obs
    }
}

/// Reason a single `name=value` pair in a report couldn't be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeFailure {
    InvalidEscape,
    Semicolon,
    InvalidUtf8,
}

impl fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEscape => write!(f, "invalid percent escape"),
            Self::Semicolon => write!(f, "invalid semicolon separator"),
            Self::InvalidUtf8 => write!(f, "invalid UTF-8"),
        }
    }
}

/// Error for a report that could only be partially decoded.
///
/// Only the first failing pair is kept, along with a count of all pairs that were
/// dropped. Pairs that decoded correctly are still returned by `extract`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDecodeError {
    pub pair: String,
    pub reason: DecodeFailure,
    pub skipped: usize,
}

impl fmt::Display for QueryDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unable to decode '{}': {} ({} pairs skipped)",
            self.pair, self.reason, self.skipped
        )
    }
}

impl error::Error for QueryDecodeError {}

/// Decode a URL encoded query string into the fields it contains.
///
/// Decoding continues past pairs that are malformed so that a single bad pair
/// doesn't discard the rest of a report. If any pair was dropped, an error describing
/// the first one is returned alongside the fields that could be decoded.
pub fn extract(query: &str) -> (RawObservation, Option<QueryDecodeError>) {
    let mut fields = RawObservation::new();
    let mut error: Option<QueryDecodeError> = None;

    for pair in query.split('&').filter(|p| !p.is_empty()) {
        match decode_pair(pair) {
            Ok((name, value)) => fields.insert(name, value),
            Err(reason) => match error.as_mut() {
                Some(e) => e.skipped += 1,
                None => {
                    error = Some(QueryDecodeError {
                        pair: pair.to_owned(),
                        reason,
                        skipped: 1,
                    })
                }
            },
        }
    }

    (fields, error)
}

fn decode_pair(pair: &str) -> Result<(String, String), DecodeFailure> {
    if pair.contains(';') {
        return Err(DecodeFailure::Semicolon);
    }

    let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
    Ok((decode_component(name)?, decode_component(value)?))
}

fn decode_component(raw: &str) -> Result<String, DecodeFailure> {
    // percent_decode passes bad escapes through untouched so they're checked here first
    let bytes = raw.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'%' {
            let valid = bytes
                .get(i + 1..i + 3)
                .map(|hex| hex.iter().all(u8::is_ascii_hexdigit))
                .unwrap_or(false);

            if !valid {
                return Err(DecodeFailure::InvalidEscape);
            }
        }
    }

    let spaces = raw.replace('+', " ");
    percent_decode_str(&spaces)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| DecodeFailure::InvalidUtf8)
}

/// Result of converting a single field of a report to a number.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedField {
    Value(f64),
    Absent,
    Malformed(String),
}

impl ParsedField {
    /// Return the parsed number if the field was present and valid.
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            _ => None,
        }
    }
}

/// Parse the first value of the field `name` as a finite floating point number.
///
/// Missing fields are `Absent` and aren't logged. Fields that are present but not a
/// number are `Malformed` and logged as a warning since they indicate a problem with
/// the station or its firmware.
pub fn parse(fields: &RawObservation, name: &str) -> ParsedField {
    let raw = match fields.first(name) {
        Some(raw) => raw,
        None => return ParsedField::Absent,
    };

    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => ParsedField::Value(v),
        _ => {
            tracing::warn!(message = "unable to parse report field", field = %name, raw = %raw);
            ParsedField::Malformed(raw.to_owned())
        }
    }
}
