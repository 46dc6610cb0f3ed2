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

use crate::report::ReportHandler;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::Router;
use prometheus_client::encoding::text::encode;
use prometheus_client::registry::Registry;
use std::sync::Arc;

const OPENMETRICS_CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// State shared by all HTTP requests.
pub struct RequestContext {
    registry: Registry,
    reports: ReportHandler,
    report_path: String,
}

impl RequestContext {
    pub fn new(registry: Registry, reports: ReportHandler, report_path: &str) -> Self {
        RequestContext {
            registry,
            reports,
            report_path: normalize_path(report_path),
        }
    }
}

/// Build routes for accepting station reports and exposing metrics.
///
/// Stations append report fields directly to the configured path, so any request at
/// or below that path is treated as a report.
pub fn router(context: Arc<RequestContext>) -> Router {
    let base = context.report_path.clone();
    let routes = Router::new().route("/metrics", get(text_metrics));

    // A catch-all at the root would conflict with /metrics
    let routes = if base == "/" {
        routes.fallback(report)
    } else {
        routes
            .route(&base, any(report))
            .route(&format!("{}/", base), any(report))
            .route(&format!("{}/*fields", base), any(report))
    };

    routes.with_state(context)
}

/// Return the report fields from the path and query string of a request.
pub fn report_query(report_path: &str, uri: &Uri) -> String {
    let path = uri
        .path()
        .strip_prefix(report_path)
        .unwrap_or_default()
        .trim_start_matches('/');

    match uri.query() {
        Some(q) if !path.is_empty() => format!("{}&{}", path, q),
        Some(q) => q.to_owned(),
        None => path.to_owned(),
    }
}

fn normalize_path(path: &str) -> String {
    format!("/{}", path.trim_matches('/'))
}

async fn report(State(context): State<Arc<RequestContext>>, uri: Uri) -> StatusCode {
    let query = report_query(&context.report_path, &uri);
    tracing::trace!(message = "accepted station report", query = %query);

    // Stations don't do anything with the response so processing isn't waited on
    let _ = context.reports.accept(query);
    StatusCode::NO_CONTENT
}

async fn text_metrics(State(context): State<Arc<RequestContext>>) -> Response {
    let mut buf = String::new();

    match encode(&mut buf, &context.registry) {
        Ok(_) => {
            tracing::debug!(message = "encoded prometheus metrics to text format", num_bytes = buf.len());
            ([(CONTENT_TYPE, OPENMETRICS_CONTENT_TYPE)], buf).into_response()
        }
        Err(e) => {
            tracing::error!(message = "error encoding metrics", error = %e);
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_path, report_query};
    use axum::http::Uri;

    fn query(path: &str, uri: &str) -> String {
        report_query(&normalize_path(path), &uri.parse::<Uri>().unwrap())
    }

    #[test]
    fn test_report_query_in_path() {
        assert_eq!(
            "&PASSKEY=ABC&tempf=71.2",
            query("/data/report/", "/data/report/&PASSKEY=ABC&tempf=71.2")
        );
    }

    #[test]
    fn test_report_query_string() {
        assert_eq!("tempf=71.2&uv=1", query("/data/report/", "/data/report/?tempf=71.2&uv=1"));
        assert_eq!("tempf=71.2", query("/data/report", "/data/report?tempf=71.2"));
    }

    #[test]
    fn test_report_query_path_and_string() {
        assert_eq!(
            "stationtype=WS2902&tempf=40&uv=2",
            query("/data/report/", "/data/report/stationtype=WS2902&tempf=40?uv=2")
        );
    }

    #[test]
    fn test_report_query_keeps_escapes() {
        assert_eq!(
            "dateutc=2022-07-04+12%3A30%3A00",
            query("/data/report/", "/data/report/dateutc=2022-07-04+12%3A30%3A00")
        );
    }

    #[test]
    fn test_report_query_empty() {
        assert_eq!("", query("/data/report/", "/data/report/"));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!("/data/report", normalize_path("/data/report/"));
        assert_eq!("/data/report", normalize_path("data/report"));
        assert_eq!("/", normalize_path("/"));
    }
}
