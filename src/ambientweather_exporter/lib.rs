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

//! Prometheus metrics exporter for Ambient Weather station reports
//!
//! ## Features
//!
//! `ambientweather_exporter` accepts the reports that [Ambient Weather] stations push to a "custom server"
//! and exposes the readings in them as Prometheus metrics. Stations send dozens of fields depending on
//! the sensors attached to them. Only fields present and valid in a report update metrics, everything
//! else keeps the value from the last report that included it. The following metrics are emitted when
//! available. Each has a `name` label set to the configured name of the station.
//!
//! * `temperature{name=$NAME, sensor=$SENSOR}` - Temperature in degrees fahrenheit. `sensor` is one of
//!   `outdoor`, `indoor`, `dewpoint`, `feelsLike`, or the channel number of an auxiliary probe.
//! * `humidity{name=$NAME, sensor=$SENSOR}` - Relative humidity (0-100). `sensor` is one of `outdoor`,
//!   `indoor`, a channel number, or `soilN` for soil moisture probes.
//! * `battery{name=$NAME, sensor=$SENSOR}` - Sensor battery status, 1 for OK and 0 for low.
//! * `barometer{name=$NAME, type=$TYPE}` - Relative or absolute barometric pressure in inches of mercury.
//! * `wind_dir{name=$NAME}` - Wind direction in degrees.
//! * `wind_speed_mph{name=$NAME, type=$TYPE}` - Sustained wind speed or gusts in miles per hour.
//! * `solar_radiation{name=$NAME}` - Solar radiation in watts per square meter.
//! * `ultraviolet{name=$NAME}` - Ultraviolet index.
//! * `rain_in{name=$NAME, period=$PERIOD}` - Rainfall in inches over the `hourly`, `daily`, `weekly`,
//!   `monthly`, `yearly`, or `event` period.
//!
//! Dew point and "feels like" temperature are computed from outdoor temperature, humidity, and wind
//! speed. "Feels like" is the heat index at or above 80°F, wind chill at or below 40°F, and the outdoor
//! temperature otherwise.
//!
//! The exporter also emits metrics about the reports it has received.
//!
//! * `ambientweather_reports_total{outcome=$OUTCOME}` - Reports `processed` or `failed`.
//! * `ambientweather_query_decode_errors_total` - Reports that could only be partially decoded.
//! * `ambientweather_malformed_fields_total` - Report fields that were not valid numbers.
//!
//! [Ambient Weather]: https://ambientweather.com/
//!
//! ## Build
//!
//! `ambientweather_exporter` is a Rust program and must be built from source using a
//! [Rust toolchain](https://rustup.rs/).
//!
//! ```text
//! git clone git@github.com:56quarters/ambientweather_exporter.git && cd ambientweather_exporter
//! cargo build --release
//! ```
//!
//! ## Usage
//!
//! ### Configuring a station
//!
//! Using the `awnet` app, configure the "Customized" upload settings of your station to point at the
//! host running `ambientweather_exporter`, port `2184`, path `/data/report/`, with the "Ambient Weather"
//! protocol. Stations will then send a report every upload interval.
//!
//! ### Run
//!
//! Pick a name for your station to be used for the `name` label on all metrics.
//!
//! ```text
//! ./ambientweather_exporter --station-name backyard
//! ```
//!
//! ### Prometheus
//!
//! Prometheus metrics are exposed on port `2184` at `/metrics`. Once `ambientweather_exporter`
//! is running, configure scrapes of it by your Prometheus server. Add the host running
//! `ambientweather_exporter` as a target under the Prometheus `scrape_configs` section as described
//! by the example below.
//!
//! ```yaml
//! # Sample config for Prometheus.
//!
//! global:
//!   scrape_interval:     15s
//!   evaluation_interval: 15s
//!   external_labels:
//!     monitor: 'my_prom'
//!
//! scrape_configs:
//! - job_name: ambientweather_exporter
//!   static_configs:
//!   - targets: ['example:2184']
//! ```
//!

pub mod channels;
pub mod derived;
pub mod fields;
pub mod http;
pub mod mapper;
pub mod metrics;
pub mod report;
pub mod schema;
