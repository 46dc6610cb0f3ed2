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

use crate::mapper::ObservationMapper;
use crate::metrics::ReportMetrics;
use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};
use tracing::Instrument;

/// Process station reports in the background, isolated from each other.
///
/// Each report is handled by its own task. Any failure while processing a report,
/// including a panic, is logged and counted but never affects other reports or the
/// server accepting them.
pub struct ReportHandler {
    mapper: Arc<ObservationMapper>,
    metrics: ReportMetrics,
}

impl ReportHandler {
    pub fn new(mapper: ObservationMapper, metrics: ReportMetrics) -> Self {
        ReportHandler {
            mapper: Arc::new(mapper),
            metrics,
        }
    }

    /// Start processing the query string of a report, returning immediately.
    ///
    /// The returned handle completes once all values from the report have been
    /// published (or processing failed). Callers that don't care when that happens
    /// may drop it.
    pub fn accept(&self, query: String) -> JoinHandle<()> {
        let mapper = Arc::clone(&self.mapper);
        let metrics = self.metrics.clone();
        let span = tracing::debug_span!("report", station = %mapper.station());

        tokio::spawn(
            async move {
                let worker = {
                    let query = query.clone();
                    tokio::spawn(async move { mapper.observe_query(&query) }.in_current_span())
                };

                match worker.await {
                    Ok(Ok(summary)) => {
                        metrics.malformed_fields(summary.malformed as u64);
                        if summary.decode_error {
                            metrics.decode_error();
                        }
                        metrics.processed();

                        tracing::debug!(
                            message = "processed station report",
                            published = summary.published,
                            absent = summary.absent,
                            malformed = summary.malformed,
                        );
                    }
                    Ok(Err(e)) => {
                        metrics.failed();
                        tracing::error!(message = "failed to process station report", error = %e, query = %query);
                    }
                    Err(e) => {
                        metrics.failed();
                        tracing::error!(
                            message = "unexpected fault processing station report",
                            error = %fault_message(e),
                            query = %query,
                        );
                    }
                }
            }
            .instrument(span),
        )
    }
}

fn fault_message(err: JoinError) -> String {
    match err.try_into_panic() {
        Ok(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_owned()),
        Err(err) => err.to_string(),
    }
}
