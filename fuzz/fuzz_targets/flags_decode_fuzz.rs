#![no_main]
use libfuzzer_sys::fuzz_target;
use rawfilt::wire::flags;

fuzz_target!(|data: &[u8]| {
    // Fuzz the flags decoder with arbitrary header bytes.
    // The decoder must never panic — only return errors.
    let mut pos = 0;
    while pos < data.len() {
        let before = pos;
        match flags::decode(data, &mut pos) {
            Ok(entry) => {
                // Anything that decoded must re-encode canonically and
                // decode back to the same record.
                let bytes = flags::encode_to_vec(&entry).unwrap();
                let mut p = 0;
                assert_eq!(flags::decode(&bytes, &mut p).unwrap(), entry);
                assert_eq!(p, bytes.len());
            }
            Err(_) => break,
        }
        assert!(pos > before, "decode must consume at least one byte");
    }
});
