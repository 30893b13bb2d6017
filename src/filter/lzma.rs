// LZMA entropy-coder stage and its option codec.
//
// The entropy coder itself comes from `lzma-rs`; this module adapts it to
// the stage contract and owns the 2-byte property codec. The option codec
// is always available so filter-flags records stay readable; the stage
// requires the `lzma` feature.
//
// The stage is opaque: it buffers its whole logical input, runs the coder
// once at end of stream, then drains the result incrementally through the
// usual progress states. Its memory use scales with the stream, which is
// the entropy coder's own concern rather than the pipeline's.

use crate::error::{Error, Result};

#[cfg(feature = "lzma")]
use std::io;

#[cfg(feature = "lzma")]
use log::trace;

#[cfg(feature = "lzma")]
use crate::filter::stage::{self, Action, Direction, Progress, Stage};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Options for the LZMA filter.
///
/// These describe the coder's parameter block as carried in filter-flags
/// records. The byte stream the stage itself produces is self-describing,
/// so the record exists for the container header's benefit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LzmaOptions {
    /// Literal context bits (lc), `0..=4`.
    pub literal_context_bits: u32,
    /// Literal position bits (lp), `0..=4`.
    pub literal_pos_bits: u32,
    /// Position bits (pb), `0..=4`.
    pub pos_bits: u32,
    /// Dictionary size in bytes, `4 KiB..=1 GiB`.
    pub dictionary_size: u32,
}

impl LzmaOptions {
    /// Smallest encodable dictionary size.
    pub const DICT_SIZE_MIN: u32 = 1 << 12;
    /// Largest encodable dictionary size.
    pub const DICT_SIZE_MAX: u32 = 1 << 30;

    /// Encoded size of the LZMA property payload.
    pub(crate) const PROPS_SIZE: usize = 2;

    /// Largest valid dictionary-size code: `(2 | 0) << (36 / 2 + 11)` is
    /// exactly [`Self::DICT_SIZE_MAX`].
    const DICT_CODE_MAX: u8 = 36;

    /// Check every field against its valid range.
    pub fn validate(&self) -> Result<()> {
        if self.literal_context_bits > 4 {
            return Err(Error::Options(format!(
                "LZMA lc {} out of range 0..=4",
                self.literal_context_bits
            )));
        }
        if self.literal_pos_bits > 4 {
            return Err(Error::Options(format!(
                "LZMA lp {} out of range 0..=4",
                self.literal_pos_bits
            )));
        }
        if self.pos_bits > 4 {
            return Err(Error::Options(format!(
                "LZMA pb {} out of range 0..=4",
                self.pos_bits
            )));
        }
        if self.dictionary_size < Self::DICT_SIZE_MIN
            || self.dictionary_size > Self::DICT_SIZE_MAX
        {
            return Err(Error::Options(format!(
                "LZMA dictionary size {} out of range {}..={}",
                self.dictionary_size,
                Self::DICT_SIZE_MIN,
                Self::DICT_SIZE_MAX
            )));
        }
        Ok(())
    }

    /// Dictionary size encoded by `code`: one mantissa bit, five exponent
    /// bits, `(2 | (code & 1)) << (code / 2 + 11)`.
    fn dict_size_for_code(code: u8) -> u32 {
        (2 | u32::from(code) & 1) << (u32::from(code) / 2 + 11)
    }

    /// Serialize to the 2-byte wire payload.
    ///
    /// Byte 0 packs the bit counts as `(pb * 5 + lp) * 9 + lc`. Byte 1 is
    /// the dictionary-size code: the smallest code whose decoded size covers
    /// the requested size. Decoding therefore yields a size in
    /// `[requested, requested + requested / 2)`, and re-encoding a decoded
    /// record reproduces the same bytes.
    pub(crate) fn encode_props(&self) -> Result<[u8; Self::PROPS_SIZE]> {
        self.validate()?;
        let packed =
            ((self.pos_bits * 5 + self.literal_pos_bits) * 9 + self.literal_context_bits) as u8;

        let mut code = 0u8;
        while Self::dict_size_for_code(code) < self.dictionary_size {
            code += 1;
        }
        Ok([packed, code])
    }

    /// Deserialize from the wire payload, re-validating every field.
    pub(crate) fn decode_props(props: &[u8]) -> Result<Self> {
        if props.len() != Self::PROPS_SIZE {
            return Err(Error::HeaderCorruption(format!(
                "LZMA properties are {} bytes, expected {}",
                props.len(),
                Self::PROPS_SIZE
            )));
        }

        let packed = u32::from(props[0]);
        if packed >= 225 {
            return Err(Error::HeaderCorruption(format!(
                "LZMA packed bit counts {packed} out of range"
            )));
        }
        let literal_context_bits = packed % 9;
        let literal_pos_bits = (packed / 9) % 5;
        let pos_bits = packed / 45;

        if props[1] & 0xC0 != 0 {
            return Err(Error::HeaderCorruption(
                "reserved bits set in LZMA dictionary flags".into(),
            ));
        }
        if props[1] > Self::DICT_CODE_MAX {
            return Err(Error::HeaderCorruption(format!(
                "LZMA dictionary code {} out of range 0..={}",
                props[1],
                Self::DICT_CODE_MAX
            )));
        }

        let opts = Self {
            literal_context_bits,
            literal_pos_bits,
            pos_bits,
            dictionary_size: Self::dict_size_for_code(props[1]),
        };
        opts.validate()
            .map_err(|_| Error::HeaderCorruption("decoded LZMA options out of range".into()))?;
        Ok(opts)
    }
}

impl Default for LzmaOptions {
    fn default() -> Self {
        Self {
            literal_context_bits: 3,
            literal_pos_bits: 0,
            pos_bits: 2,
            dictionary_size: 1 << 23,
        }
    }
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// The LZMA stage: an opaque, size-changing pipeline member.
///
/// Unlike the size-preserving filters it cannot transform a shared window in
/// place, so it gathers its logical input (directly, or by pulling through
/// its inner stage), codes it in one pass at end of stream, and then hands
/// out the result as the caller provides output space.
#[cfg(feature = "lzma")]
pub struct LzmaStage {
    next: Option<Box<dyn Stage>>,
    direction: Direction,
    gathered: Vec<u8>,
    coded: Option<Vec<u8>>,
    drained: usize,
}

#[cfg(feature = "lzma")]
impl LzmaStage {
    pub(crate) fn new(direction: Direction, next: Option<Box<dyn Stage>>) -> Self {
        Self {
            next,
            direction,
            gathered: Vec::new(),
            coded: None,
            drained: 0,
        }
    }

    /// Pull everything currently available on the input side into the
    /// gather buffer.
    fn gather(&mut self, input: &[u8], in_pos: &mut usize, action: Action) -> Result<Progress> {
        match self.next.as_mut() {
            None => {
                self.gathered.extend_from_slice(&input[*in_pos..]);
                *in_pos = input.len();
                Ok(stage::intake_progress(input.len(), *in_pos, action))
            }
            Some(next) => {
                let mut window = [0u8; 8192];
                loop {
                    let mut pos = 0;
                    let progress = next.step(input, in_pos, &mut window, &mut pos, action)?;
                    self.gathered.extend_from_slice(&window[..pos]);
                    match progress {
                        Progress::OutputFull => continue,
                        done => return Ok(done),
                    }
                }
            }
        }
    }

    fn code(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        match self.direction {
            Direction::Encode => {
                let mut cursor = io::Cursor::new(self.gathered.as_slice());
                lzma_rs::lzma_compress(&mut cursor, &mut out)
                    .map_err(|_| Error::Internal("LZMA compression failed"))?;
            }
            Direction::Decode => {
                let mut reader = io::BufReader::new(io::Cursor::new(self.gathered.as_slice()));
                lzma_rs::lzma_decompress(&mut reader, &mut out)
                    .map_err(|e| Error::Data(format!("LZMA stream: {e}")))?;
            }
        }
        Ok(out)
    }
}

#[cfg(feature = "lzma")]
impl Stage for LzmaStage {
    fn step(
        &mut self,
        input: &[u8],
        in_pos: &mut usize,
        output: &mut [u8],
        out_pos: &mut usize,
        action: Action,
    ) -> Result<Progress> {
        if self.coded.is_none() {
            match self.gather(input, in_pos, action)? {
                Progress::Finished => {
                    let coded = self.code()?;
                    trace!(
                        "lzma {:?}: {} bytes in, {} bytes out",
                        self.direction,
                        self.gathered.len(),
                        coded.len()
                    );
                    self.gathered.clear();
                    self.coded = Some(coded);
                }
                progress => return Ok(progress),
            }
        }

        let Some(coded) = self.coded.as_deref() else {
            return Err(Error::Internal("LZMA stage lost its coded buffer"));
        };
        stage::copy_bounded(coded, &mut self.drained, output, out_pos);
        if self.drained == coded.len() {
            Ok(Progress::Finished)
        } else {
            Ok(Progress::OutputFull)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
