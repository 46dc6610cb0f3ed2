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

use ambientweather_exporter::http::{self, RequestContext};
use ambientweather_exporter::mapper::ObservationMapper;
use ambientweather_exporter::metrics::{ReportMetrics, StationMetrics};
use ambientweather_exporter::report::ReportHandler;
use clap::Parser;
use prometheus_client::registry::Registry;
use std::error::Error;
use std::io;
use std::net::SocketAddr;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{self, SignalKind};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::Level;

const DEFAULT_LOG_LEVEL: Level = Level::INFO;
const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 2184);
const DEFAULT_TIMEOUT_MILLIS: u64 = 5000;
const DEFAULT_STATION_NAME: &str = "Unknown";
const DEFAULT_REPORT_PATH: &str = "/data/report/";

#[derive(Debug, Parser)]
#[clap(name = "ambientweather_exporter", version = clap::crate_version!())]
struct AmbientWeatherExporterApplication {
    /// Weather station name to use for the 'name' label on all metrics
    #[clap(long, default_value_t = DEFAULT_STATION_NAME.into())]
    station_name: String,

    /// Path that the weather station sends reports to. Report fields may be appended
    /// directly to this path or sent as a query string.
    #[clap(long, default_value_t = DEFAULT_REPORT_PATH.into())]
    report_path: String,

    /// Logging verbosity. Allowed values are 'trace', 'debug', 'info', 'warn', and 'error'
    /// (case insensitive)
    #[clap(long, default_value_t = DEFAULT_LOG_LEVEL)]
    log_level: Level,

    /// Timeout for handling a single HTTP request, in milliseconds.
    #[clap(long, default_value_t = DEFAULT_TIMEOUT_MILLIS)]
    timeout_millis: u64,

    /// Address to bind to. By default, ambientweather_exporter will bind to public address
    /// since the purpose is to accept reports from a weather station on the local network
    /// and expose metrics to an external system (Prometheus or another agent for ingestion)
    #[clap(long, default_value_t = DEFAULT_BIND_ADDR.into())]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let opts = AmbientWeatherExporterApplication::parse();
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(opts.log_level)
            .finish(),
    )
    .expect("failed to set tracing subscriber");

    tracing::info!(
        message = "ambientweather_exporter starting",
        version = clap::crate_version!(),
        station_name = %opts.station_name,
        report_path = %opts.report_path,
    );

    let mut registry = Registry::default();
    let station_metrics = Arc::new(StationMetrics::new(&mut registry));
    let report_metrics = ReportMetrics::new(&mut registry);

    let mapper = ObservationMapper::new(opts.station_name.clone(), station_metrics);
    let reports = ReportHandler::new(mapper, report_metrics);
    let context = Arc::new(RequestContext::new(registry, reports, &opts.report_path));

    let app = http::router(context)
        .layer(TimeoutLayer::new(Duration::from_millis(opts.timeout_millis)))
        .layer(TraceLayer::new_for_http());

    let server = axum::Server::try_bind(&opts.bind)
        .unwrap_or_else(|e| {
            tracing::error!(message = "error binding to address", address = %opts.bind, error = %e);
            process::exit(1)
        })
        .serve(app.into_make_service());

    tracing::info!(message = "server started", address = %server.local_addr());

    server
        .with_graceful_shutdown(async {
            // Wait for either SIGTERM or SIGINT to shutdown
            tokio::select! {
                _ = sigterm() => {}
                _ = sigint() => {}
            }
        })
        .await?;

    tracing::info!("server shutdown");
    Ok(())
}

/// Return after the first SIGTERM signal received by this process
async fn sigterm() -> io::Result<()> {
    unix::signal(SignalKind::terminate())?.recv().await;
    Ok(())
}

/// Return after the first SIGINT signal received by this process
async fn sigint() -> io::Result<()> {
    unix::signal(SignalKind::interrupt())?.recv().await;
    Ok(())
}
