use std::{net::IpAddr, str::FromStr};

use actix_web::HttpRequest;
use log::trace;
use regex::Regex;

/// Get the remote IP address from the request, for logging security events.
///
/// If `use_x_forwarded_for` is set, the first address in the `X-Forwarded-For` header is preferred, followed by the
/// `for=` entry of a `Forwarded` header. Otherwise (or if neither header is usable) the peer address of the
/// connection is used.
pub fn get_remote_ip(req: &HttpRequest, use_x_forwarded_for: bool) -> Option<IpAddr> {
    let mut result = None;
    if use_x_forwarded_for {
        trace!("Checking X-Forwarded-For header");
        result = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| IpAddr::from_str(s.trim()).ok());
        if result.is_none() {
            result = req.headers().get("Forwarded").and_then(|v| v.to_str().ok()).and_then(forwarded_for);
        }
    }
    result.or_else(|| {
        let peer_addr = req.peer_addr().map(|a| a.ip());
        trace!("Using peer address for remote address: {peer_addr:?}");
        peer_addr
    })
}

fn forwarded_for(header: &str) -> Option<IpAddr> {
    let re = Regex::new(r#"for="?\[?(?P<ip>[0-9a-fA-F.:]+)"#).ok()?;
    re.captures(header).and_then(|caps| caps.name("ip")).and_then(|m| IpAddr::from_str(m.as_str()).ok())
}
