#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Opening garbage must fail cleanly; anything that opens must survive
    // lookups of both address families
    if let Ok(db) = ipsearch::Database::from_bytes(data.to_vec()) {
        let _ = db.lookup("203.0.113.5");
        let _ = db.lookup("2001:db8::1");
        let _ = db.lookup("::ffff:198.51.100.1");
    }
});
