use axum::http::HeaderMap;
use std::net::SocketAddr;

/// Pick the address a request should be located by
///
/// Priority: the `ip` query parameter, `X-Real-IP`, the first entry of
/// `X-Forwarded-For`, then the transport peer. Empty values fall through to
/// the next source; the result is empty only when every source is missing.
/// The value is not validated here; an unparseable address simply yields an
/// empty result from the lookup.
pub fn resolve_client_ip(
    query_ip: Option<&str>,
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
) -> String {
    if let Some(ip) = non_empty(query_ip) {
        return ip.to_string();
    }

    if let Some(ip) = non_empty(header_str(headers, "x-real-ip")) {
        return ip.to_string();
    }

    let forwarded = header_str(headers, "x-forwarded-for").and_then(|v| v.split(',').next());
    if let Some(ip) = non_empty(forwarded) {
        return ip.to_string();
    }

    peer.map(|addr| addr.ip().to_string()).unwrap_or_default()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
