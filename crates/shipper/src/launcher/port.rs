//! Port: decide from `rest_url` whether the metadata service is local, and on
//! which address it should listen.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::OnceLock;

use regex::Regex;

use super::LaunchError;

/// scheme, optional userinfo, host (bracketed IPv6 or plain), optional `:port`.
const AUTHORITY_PATTERN: &str =
    r"^(?:[A-Za-z][A-Za-z0-9+.\-]*://)?(?:[^@/?#]*@)?(?P<host>\[[^\]]*\]|[^:/?#]*)(?::(?P<port>[^/?#]*))?";

fn authority_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(AUTHORITY_PATTERN).expect("authority pattern is a valid regex"))
}

/// Interface the local service binds for a local `host`, `None` for remote
/// hosts. Loopback names stay on loopback; only an explicit `0.0.0.0` opens
/// every interface.
pub fn local_bind_ip(host: &str) -> Option<IpAddr> {
    let host = host.to_ascii_lowercase();
    match host.as_str() {
        "localhost" | "127.0.0.1" => Some(IpAddr::V4(Ipv4Addr::LOCALHOST)),
        "::1" | "[::1]" => Some(IpAddr::V6(Ipv6Addr::LOCALHOST)),
        "0.0.0.0" => Some(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
        _ => None,
    }
}

/// True when `host` names the local machine (case-insensitive).
pub fn is_local_host(host: &str) -> bool {
    local_bind_ip(host).is_some()
}

/// Socket address the local metadata service should bind, derived from the
/// host and port of `url`.
///
/// Returns `Ok(None)` when the URL names a remote host (nothing to launch)
/// and an error when a local URL carries no usable port.
pub fn metadata_addr(url: &str) -> Result<Option<SocketAddr>, LaunchError> {
    let caps = authority_regex()
        .captures(url.trim())
        .ok_or_else(|| LaunchError::InvalidUrl { url: url.to_string() })?;

    let host = caps.name("host").map(|m| m.as_str()).unwrap_or_default();
    if host.is_empty() {
        return Err(LaunchError::InvalidUrl { url: url.to_string() });
    }
    let Some(ip) = local_bind_ip(host) else {
        return Ok(None);
    };

    let digits = caps
        .name("port")
        .map(|m| m.as_str())
        .filter(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| LaunchError::MissingPort { url: url.to_string() })?;

    let port = digits.parse::<u16>().map_err(|_| LaunchError::InvalidPort {
        url: url.to_string(),
        value: digits.to_string(),
    })?;
    Ok(Some(SocketAddr::new(ip, port)))
}
