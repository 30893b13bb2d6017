use proptest::prelude::*;
use rawfilt::filter::{chain, Action, DeltaOptions, FilterEntry, LzmaOptions, Pipeline, Progress};
use rawfilt::wire::flags;

fn run_chunked(mut pipeline: Pipeline, data: &[u8], splits: &[usize], window: usize) -> Vec<u8> {
    // Turn the raw split list into chunk lengths covering the whole input.
    let mut chunks = Vec::new();
    let mut left = data.len();
    for &s in splits {
        if left == 0 {
            break;
        }
        let len = (s % left.max(1)).max(1).min(left);
        chunks.push(len);
        left -= len;
    }
    if left > 0 || chunks.is_empty() {
        chunks.push(left);
    }

    let mut collected = Vec::new();
    let mut consumed = 0;
    for (i, &len) in chunks.iter().enumerate() {
        let chunk = &data[consumed..consumed + len];
        let action = if i == chunks.len() - 1 {
            Action::Finish
        } else {
            Action::Run
        };
        let mut in_pos = 0;
        loop {
            let mut buf = vec![0u8; window];
            let mut out_pos = 0;
            let progress = pipeline
                .step(chunk, &mut in_pos, &mut buf, &mut out_pos, action)
                .unwrap();
            collected.extend_from_slice(&buf[..out_pos]);
            match progress {
                Progress::OutputFull => continue,
                Progress::NeedInput | Progress::Finished => break,
            }
        }
        consumed += len;
    }
    collected
}

proptest! {
    #[test]
    fn prop_delta_roundtrip(
        distance in 1u32..=256,
        data in proptest::collection::vec(any::<u8>(), 0..4096)
    ) {
        let filters = [FilterEntry::delta(DeltaOptions::new(distance))];
        let encoded = chain::encode_all(&filters, &data).unwrap();
        prop_assert_eq!(encoded.len(), data.len(), "delta is size-preserving");
        let decoded = chain::decode_all(&filters, &encoded).unwrap();
        prop_assert_eq!(decoded, data);
    }

    #[test]
    fn prop_stacked_chain_roundtrip(
        d1 in 1u32..=256,
        d2 in 1u32..=256,
        data in proptest::collection::vec(any::<u8>(), 0..2048)
    ) {
        let filters = [
            FilterEntry::delta(DeltaOptions::new(d1)),
            FilterEntry::delta(DeltaOptions::new(d2)),
        ];
        let encoded = chain::encode_all(&filters, &data).unwrap();
        let decoded = chain::decode_all(&filters, &encoded).unwrap();
        prop_assert_eq!(decoded, data);
    }

    #[test]
    fn prop_chunked_encode_matches_whole_buffer(
        distance in 1u32..=256,
        data in proptest::collection::vec(any::<u8>(), 1..2048),
        splits in proptest::collection::vec(1usize..257, 0..32),
        window in 1usize..64
    ) {
        let filters = [FilterEntry::delta(DeltaOptions::new(distance))];
        let expected = chain::encode_all(&filters, &data).unwrap();
        let got = run_chunked(Pipeline::encoder(&filters).unwrap(), &data, &splits, window);
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_chunked_decode_matches_whole_buffer(
        distance in 1u32..=256,
        data in proptest::collection::vec(any::<u8>(), 1..2048),
        splits in proptest::collection::vec(1usize..257, 0..32),
        window in 1usize..64
    ) {
        let filters = [FilterEntry::delta(DeltaOptions::new(distance))];
        let encoded = chain::encode_all(&filters, &data).unwrap();
        let expected = chain::decode_all(&filters, &encoded).unwrap();
        let got = run_chunked(Pipeline::decoder(&filters).unwrap(), &encoded, &splits, window);
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_delta_options_codec_roundtrip(distance in 1u32..=256) {
        let entry = FilterEntry::delta(DeltaOptions::new(distance));
        let bytes = flags::encode_to_vec(&entry).unwrap();
        prop_assert_eq!(bytes.len(), flags::encoded_size(&entry).unwrap());

        let mut pos = 0;
        let decoded = flags::decode(&bytes, &mut pos).unwrap();
        prop_assert_eq!(pos, bytes.len());
        prop_assert_eq!(decoded, entry);
    }

    #[test]
    fn prop_padded_id_decodes_to_same_record(
        distance in 1u32..=256,
        pad in 1usize..8
    ) {
        let entry = FilterEntry::delta(DeltaOptions::new(distance));
        let canonical = flags::encode_to_vec(&entry).unwrap();

        let mut padded = vec![0x80u8; pad];
        padded.extend_from_slice(&canonical);

        let mut pos = 0;
        let decoded = flags::decode(&padded, &mut pos).unwrap();
        prop_assert_eq!(pos, padded.len());
        prop_assert_eq!(decoded, entry);
        // Encode never reproduces the padding.
        prop_assert_eq!(flags::encode_to_vec(&decoded).unwrap(), canonical);
    }

    #[test]
    fn prop_decode_never_reads_past_declared_record(
        distance in 1u32..=256,
        trailing in proptest::collection::vec(any::<u8>(), 0..32)
    ) {
        let entry = FilterEntry::delta(DeltaOptions::new(distance));
        let mut bytes = flags::encode_to_vec(&entry).unwrap();
        let record_len = bytes.len();
        bytes.extend_from_slice(&trailing);

        let mut pos = 0;
        let decoded = flags::decode(&bytes, &mut pos).unwrap();
        prop_assert_eq!(pos, record_len, "trailing bytes must stay unconsumed");
        prop_assert_eq!(decoded, entry);
    }
}

// ---------------------------------------------------------------------------
// LZMA dictionary-size boundary sweep
// ---------------------------------------------------------------------------

/// Brute-force sweep of the dictionary-size codec around every code
/// boundary. The codec is lossy by design: decoding yields the smallest
/// encodable size covering the request, so the roundtrip is bounded by a
/// ratio rather than exact.
#[test]
fn lzma_dict_size_tolerance_at_every_boundary() {
    let mut boundaries = vec![
        LzmaOptions::DICT_SIZE_MIN,
        LzmaOptions::DICT_SIZE_MIN + 1,
        LzmaOptions::DICT_SIZE_MAX - 1,
        LzmaOptions::DICT_SIZE_MAX,
    ];
    // Every exactly-encodable size, plus its neighbors on both sides.
    let mut size = LzmaOptions::DICT_SIZE_MIN;
    while size < LzmaOptions::DICT_SIZE_MAX {
        boundaries.extend([size - 1, size, size + 1]);
        // Encodable sizes alternate 2^k and 3 * 2^(k-1).
        size = if size.is_power_of_two() {
            size / 2 * 3
        } else {
            size / 3 * 4
        };
    }

    for requested in boundaries {
        if !(LzmaOptions::DICT_SIZE_MIN..=LzmaOptions::DICT_SIZE_MAX).contains(&requested) {
            continue;
        }
        let opts = LzmaOptions {
            dictionary_size: requested,
            ..LzmaOptions::default()
        };
        let entry = FilterEntry::lzma(opts);
        let bytes = flags::encode_to_vec(&entry).unwrap();
        let mut pos = 0;
        let decoded = flags::decode(&bytes, &mut pos).unwrap();

        let got = match decoded.options {
            Some(rawfilt::filter::FilterOptions::Lzma(o)) => o.dictionary_size,
            other => panic!("expected LZMA options, got {other:?}"),
        };
        assert!(got >= requested, "requested {requested}, decoded {got}");
        assert!(
            u64::from(got) < u64::from(requested) + u64::from(requested) / 2,
            "requested {requested}, decoded {got}"
        );
        // Re-encoding the decoded record is byte-stable.
        assert_eq!(flags::encode_to_vec(&decoded).unwrap(), bytes);
    }
}

#[test]
#[ignore = "performance properties are workload and machine dependent"]
fn perf_property_delta_not_pathological() {
    use std::time::Instant;
    let data: Vec<u8> = (0..8 * 1024 * 1024).map(|i| (i % 251) as u8).collect();
    let filters = [FilterEntry::delta(DeltaOptions::new(4))];

    let t0 = Instant::now();
    let encoded = chain::encode_all(&filters, &data).unwrap();
    let decoded = chain::decode_all(&filters, &encoded).unwrap();
    let dt = t0.elapsed();
    assert_eq!(decoded, data);
    assert!(dt.as_secs_f64() < 20.0, "roundtrip took {dt:?}");
}
