#![no_main]
use libfuzzer_sys::fuzz_target;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::OnceLock;

#[path = "../../tests/common/mod.rs"]
mod common;

static DB: OnceLock<ipsearch::Database> = OnceLock::new();

fuzz_target!(|data: &[u8]| {
    let db = DB.get_or_init(|| {
        ipsearch::Database::from_bytes(common::city_db(28)).expect("fixture database")
    });

    // Arbitrary text exercises address parsing
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = db.lookup(s);
    }

    // Raw bytes exercise every tree path
    if data.len() >= 16 {
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&data[..16]);
        let addr = IpAddr::V6(Ipv6Addr::from(bytes));
        assert!(db.lookup_ip(addr).is_ok());
    } else if data.len() >= 4 {
        let addr = IpAddr::V4(Ipv4Addr::new(data[0], data[1], data[2], data[3]));
        assert!(db.lookup_ip(addr).is_ok());
    }
});
