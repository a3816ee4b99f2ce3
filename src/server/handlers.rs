use axum::{
    extract::{ConnectInfo, Query, Request, State},
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error};

use super::client_ip::resolve_client_ip;
use super::AppState;
use crate::geo::{AsnRecord, CityRecord, GeoResult};

/// Query string of the locate endpoint
#[derive(Debug, Default, PartialEq)]
pub struct LocateQuery {
    /// Address to locate instead of the caller's
    pub ip: Option<String>,
    /// JSONP callback name
    pub callback: Option<String>,
}

impl LocateQuery {
    /// Read `ip` and `callback` from the request URI
    ///
    /// Each key takes its first value; repeated or unknown parameters are
    /// ignored.
    pub fn from_uri(uri: &Uri) -> Self {
        let pairs = Query::<Vec<(String, String)>>::try_from_uri(uri)
            .map(|Query(pairs)| pairs)
            .unwrap_or_default();
        let first = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        };

        LocateQuery {
            ip: first("ip"),
            callback: first("callback"),
        }
    }
}

/// GET /
///
/// Locates the requested (or calling) address in the city and ASN
/// databases. Always answers 200; fields the databases cannot supply keep
/// their defaults.
pub async fn locate_handler(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let query = LocateQuery::from_uri(request.uri());
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let ip = resolve_client_ip(query.ip.as_deref(), request.headers(), peer);
    let result = state.locate(&ip);
    debug!(ip = %result.ip, country = %result.country_code, asn = result.asn, "located");

    match query.callback.as_deref() {
        Some(callback) if is_valid_callback(callback) => jsonp_response(callback, &result),
        _ => Json(result).into_response(),
    }
}

/// GET /health
pub async fn health_handler(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<serde_json::Value>) {
    let city_open = state.city.handle().is_open();
    let asn_open = state.asn.handle().is_open();
    let (code, status) = if city_open && asn_open {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    (
        code,
        Json(json!({
            "status": status,
            "service": "ipsearch",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

impl AppState {
    /// Look `ip` up in both databases and merge the results
    pub fn locate(&self, ip: &str) -> GeoResult {
        let city: CityRecord = self.city.lookup_or_default(ip);
        let asn: AsnRecord = self.asn.lookup_or_default(ip);
        GeoResult::new(ip, city, asn)
    }
}

/// Whether `name` is safe to echo as a JavaScript function reference
///
/// Accepts identifier paths such as `cb`, `jQuery123_456` or `app.geo.done`.
pub fn is_valid_callback(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.'))
}

fn jsonp_response(callback: &str, result: &GeoResult) -> Response {
    match serde_json::to_string(result) {
        Ok(json) => (
            [(header::CONTENT_TYPE, "application/javascript")],
            format!("{}({})", callback, json),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to serialize result: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
