use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Network containing `addr` with the given prefix, e.g. `203.0.113.0/24`
pub fn format_network(addr: IpAddr, prefix_len: u8) -> String {
    match addr {
        IpAddr::V4(ipv4) => {
            let mask = u32::MAX.checked_shl(32 - prefix_len.min(32) as u32).unwrap_or(0);
            let network = Ipv4Addr::from(u32::from(ipv4) & mask);
            format!("{}/{}", network, prefix_len)
        }
        IpAddr::V6(ipv6) => {
            let mask = u128::MAX.checked_shl(128 - prefix_len.min(128) as u32).unwrap_or(0);
            let network = Ipv6Addr::from(u128::from(ipv6) & mask);
            format!("{}/{}", network, prefix_len)
        }
    }
}

/// Format a Unix timestamp as `YYYY-MM-DD HH:MM:SS UTC`
pub fn format_unix_timestamp(timestamp: u64) -> String {
    let days = timestamp / 86400;
    let secs = timestamp % 86400;
    let (year, month, day) = civil_from_days(days as i64);
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02} UTC",
        year,
        month,
        day,
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

/// Days since 1970-01-01 to a proleptic Gregorian (year, month, day)
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}
