#![no_main]
use libfuzzer_sys::fuzz_target;
use rawfilt::filter::{chain, DeltaOptions, FilterEntry};

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    // First two bytes pick the chain shape, the rest is payload.
    let d1 = u32::from(data[0]) + 1;
    let d2 = u32::from(data[1]) + 1;
    let payload = &data[2..];

    let chains: [&[FilterEntry]; 3] = [
        &[FilterEntry::delta(DeltaOptions::new(d1))],
        &[
            FilterEntry::delta(DeltaOptions::new(d1)),
            FilterEntry::delta(DeltaOptions::new(d2)),
        ],
        &[
            FilterEntry::delta(DeltaOptions::new(d1)),
            FilterEntry::copy(),
        ],
    ];

    for filters in chains {
        let encoded = chain::encode_all(filters, payload).unwrap();
        assert_eq!(encoded.len(), payload.len());
        let decoded = chain::decode_all(filters, &encoded).unwrap();
        assert_eq!(decoded, payload);
    }
});
