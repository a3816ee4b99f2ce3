#![no_main]
use ipsearch::data_section::DataDecoder;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // First byte picks a start offset so pointers land mid-buffer too
    let offset = data[0] as usize;
    let decoder = DataDecoder::new(&data[1..]);
    if let Ok(value) = decoder.decode(offset) {
        // Anything that decodes must serialize
        let _ = serde_json::to_string(&value);
    }
});
