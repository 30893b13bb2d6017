// Filter Flags: the self-delimiting per-filter records embedded in
// container headers.
//
// Layout per record: varint id, varint options size, then exactly that many
// filter-specific payload bytes. Encoding is canonical (one valid byte
// sequence per record); decoding tolerates padded varints but cross-checks
// every declared size against the registry and the remaining input before
// any payload byte reaches a property decoder.

use log::debug;

use crate::error::{Error, Result};
use crate::filter::delta::DeltaOptions;
use crate::filter::lzma::LzmaOptions;
use crate::filter::{FilterEntry, FilterId, FilterOptions};
use crate::wire::varint;

/// Upper bound on any declared options size. Nothing in the registry comes
/// close; a larger declaration is corruption, and it is rejected before the
/// size is used for slicing or allocation.
pub const MAX_OPTIONS_SIZE: u64 = 1024;

// ---------------------------------------------------------------------------
// Registry hooks
// ---------------------------------------------------------------------------

/// Property decoder for one filter: turns a payload slice of exactly the
/// declared size into options. Selected once per record, before the payload
/// is touched.
type PropsDecoder = fn(&[u8]) -> Result<Option<FilterOptions>>;

fn props_decoder(id: FilterId) -> Option<PropsDecoder> {
    match id {
        FilterId::COPY => Some(|props| {
            if props.is_empty() {
                Ok(None)
            } else {
                Err(Error::HeaderCorruption(format!(
                    "copy filter carries no options, got {} bytes",
                    props.len()
                )))
            }
        }),
        FilterId::DELTA => {
            Some(|props| DeltaOptions::decode_props(props).map(|o| Some(FilterOptions::Delta(o))))
        }
        FilterId::LZMA => {
            Some(|props| LzmaOptions::decode_props(props).map(|o| Some(FilterOptions::Lzma(o))))
        }
        _ => None,
    }
}

/// Size of `entry`'s options payload, with the options fully validated.
fn props_size(entry: &FilterEntry) -> Result<usize> {
    match entry.id {
        FilterId::COPY => {
            if entry.options.is_some() {
                return Err(Error::Options("copy filter takes no options".into()));
            }
            Ok(0)
        }
        FilterId::DELTA => {
            entry.delta_options()?.validate()?;
            Ok(DeltaOptions::PROPS_SIZE)
        }
        FilterId::LZMA => {
            entry.lzma_options()?.validate()?;
            Ok(LzmaOptions::PROPS_SIZE)
        }
        _ => Err(Error::UnsupportedFilter(entry.id)),
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Exact encoded size of the record for `entry`.
///
/// This is the same computation [`encode`] performs, exposed so callers can
/// size a destination buffer before writing.
pub fn encoded_size(entry: &FilterEntry) -> Result<usize> {
    let props = props_size(entry)?;
    Ok(varint::len(entry.id.0) + varint::len(props as u64) + props)
}

/// Encode one record at `out[*out_pos..]`, advancing the cursor.
///
/// Fails on an unsupported id, on options that do not validate, or when the
/// space left is smaller than [`encoded_size`]. The byte count actually
/// written is checked against the prediction; disagreement is an internal
/// error, not a data error.
pub fn encode(entry: &FilterEntry, out: &mut [u8], out_pos: &mut usize) -> Result<()> {
    let props = props_size(entry)?;
    let total = varint::len(entry.id.0) + varint::len(props as u64) + props;

    let available = out.len() - *out_pos;
    if available < total {
        return Err(Error::BufferTooSmall {
            needed: total,
            available,
        });
    }

    let start = *out_pos;
    varint::write(entry.id.0, out, out_pos)?;
    varint::write(props as u64, out, out_pos)?;

    match entry.id {
        FilterId::COPY => {}
        FilterId::DELTA => {
            let payload = entry.delta_options()?.encode_props()?;
            out[*out_pos..*out_pos + payload.len()].copy_from_slice(&payload);
            *out_pos += payload.len();
        }
        FilterId::LZMA => {
            let payload = entry.lzma_options()?.encode_props()?;
            out[*out_pos..*out_pos + payload.len()].copy_from_slice(&payload);
            *out_pos += payload.len();
        }
        _ => return Err(Error::UnsupportedFilter(entry.id)),
    }

    if *out_pos - start != total {
        return Err(Error::Internal(
            "encoded filter flags size disagrees with prediction",
        ));
    }
    Ok(())
}

/// Encode one record into a fresh buffer.
pub fn encode_to_vec(entry: &FilterEntry) -> Result<Vec<u8>> {
    let mut out = vec![0u8; encoded_size(entry)?];
    let mut out_pos = 0;
    encode(entry, &mut out, &mut out_pos)?;
    Ok(out)
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode one record at `input[*in_pos..]`, advancing the cursor past
/// exactly the bytes consumed.
///
/// The id is checked against the registry before the size field is read, so
/// an unsupported id fails having consumed the id varint and nothing more.
/// The declared options size is bounds-checked against the per-record limit
/// and the remaining input before the payload is sliced; the property
/// decoder then sees exactly the declared bytes and rejects any length it
/// did not expect, which catches declarations that disagree with the actual
/// payload.
pub fn decode(input: &[u8], in_pos: &mut usize) -> Result<FilterEntry> {
    let id = FilterId(varint::read(input, in_pos)?);

    let decode_props = props_decoder(id).ok_or(Error::UnsupportedFilter(id))?;

    let declared = varint::read(input, in_pos)?;
    if declared > MAX_OPTIONS_SIZE {
        return Err(Error::HeaderCorruption(format!(
            "declared options size {declared} exceeds limit {MAX_OPTIONS_SIZE}"
        )));
    }
    let declared = declared as usize;
    let remaining = input.len() - *in_pos;
    if declared > remaining {
        return Err(Error::HeaderCorruption(format!(
            "declared options size {declared} exceeds remaining input {remaining}"
        )));
    }

    let options = decode_props(&input[*in_pos..*in_pos + declared])?;
    *in_pos += declared;

    debug!("decoded filter flags: id {id}, {declared} option bytes");
    Ok(FilterEntry { id, options })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
