#![no_main]
use campquery::query::{RawQuery, ResultsOptions, translate};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 8192 { return; }
    if let Ok(s) = std::str::from_utf8(data) {
        // `&`-separated `key=value` pairs; translation may reject but must not panic
        let raw: RawQuery = s
            .split('&')
            .map(|p| p.split_once('=').unwrap_or((p, "")))
            .collect();
        if let Ok(t) = translate(&raw, &ResultsOptions::default()) {
            let _ = t.filter.to_document();
            assert_eq!(t.page.offset, (t.page.page - 1).saturating_mul(t.page.limit));
        }
    }
});
