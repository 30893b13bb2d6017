// Pipeline assembly and end-to-end processing.
//
// A pipeline owns a chain of stages built once from an ordered filter list.
// The canonical list order is outermost-first: the filter nearest the
// compressed representation comes first, the filter nearest the raw data
// last. Internally the chain is linked so that the stage facing the
// application input has no inner stage (it copies or consumes directly) and
// the head stage produces the final output:
//
// - encoding reverses the list, so raw input enters through the last-listed
//   filter and the head is the first-listed one;
// - decoding keeps the list order, so compressed input enters through the
//   first-listed filter and the head is the last-listed one.
//
// Which stage copies and which transforms in place follows purely from that
// position, decided here at assembly time, never from the data.

use log::debug;

use crate::error::{Error, Result};
use crate::filter::copy::CopyStage;
use crate::filter::delta::DeltaStage;
use crate::filter::stage::{Action, Direction, Progress, Stage};
use crate::filter::{FilterEntry, FilterId};

#[cfg(feature = "lzma")]
use crate::filter::lzma::LzmaStage;

// ---------------------------------------------------------------------------
// Stage registry
// ---------------------------------------------------------------------------

/// Instantiate the stage for `entry`, wrapping `next` (the stage closer to
/// the application input, or `None` for the stage that reads it directly).
fn make_stage(
    entry: &FilterEntry,
    direction: Direction,
    next: Option<Box<dyn Stage>>,
) -> Result<Box<dyn Stage>> {
    match entry.id {
        FilterId::COPY => {
            if entry.options.is_some() {
                return Err(Error::Options("copy filter takes no options".into()));
            }
            Ok(Box::new(CopyStage::new(next)))
        }
        FilterId::DELTA => Ok(Box::new(DeltaStage::new(
            &entry.delta_options()?,
            direction,
            next,
        )?)),
        #[cfg(feature = "lzma")]
        FilterId::LZMA => {
            // The stage itself is parameter-free (its byte stream is
            // self-describing); options are still validated here so a bad
            // chain fails at assembly, not at header-encode time.
            entry.lzma_options()?.validate()?;
            Ok(Box::new(LzmaStage::new(direction, next)))
        }
        _ => Err(Error::UnsupportedFilter(entry.id)),
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// A live chain of filter stages.
///
/// Stages are owned exclusively by their outer neighbor and never exposed;
/// callers interact only with [`step`](Self::step) on the whole chain.
/// A pipeline is a sequential state machine: `step` calls must be strictly
/// ordered, because later bytes depend on history mutated by earlier ones.
pub struct Pipeline {
    head: Box<dyn Stage>,
}

impl core::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Pipeline").finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Build an encoding pipeline from an outermost-first filter list.
    pub fn encoder(filters: &[FilterEntry]) -> Result<Self> {
        Self::build(filters, Direction::Encode)
    }

    /// Build a decoding pipeline from the same outermost-first filter list
    /// the encoder was built from.
    pub fn decoder(filters: &[FilterEntry]) -> Result<Self> {
        Self::build(filters, Direction::Decode)
    }

    fn build(filters: &[FilterEntry], direction: Direction) -> Result<Self> {
        let mut chain: Option<Box<dyn Stage>> = None;
        match direction {
            Direction::Encode => {
                for entry in filters.iter().rev() {
                    chain = Some(make_stage(entry, direction, chain.take())?);
                }
            }
            Direction::Decode => {
                for entry in filters.iter() {
                    chain = Some(make_stage(entry, direction, chain.take())?);
                }
            }
        }

        let head = chain.ok_or_else(|| {
            Error::Options("a filter chain needs at least one filter".into())
        })?;

        debug!(
            "assembled {:?} pipeline: {} stages, ids {:?}",
            direction,
            filters.len(),
            filters.iter().map(|f| f.id.0).collect::<Vec<_>>()
        );
        Ok(Self { head })
    }

    /// Process one step: consume from `input[*in_pos..]`, produce into
    /// `output[*out_pos..]`, advancing both cursors.
    ///
    /// See [`Stage::step`] for the incremental-processing contract. On
    /// error, bytes already written remain valid; the failed call is simply
    /// abandoned.
    pub fn step(
        &mut self,
        input: &[u8],
        in_pos: &mut usize,
        output: &mut [u8],
        out_pos: &mut usize,
        action: Action,
    ) -> Result<Progress> {
        self.head.step(input, in_pos, output, out_pos, action)
    }
}

// ---------------------------------------------------------------------------
// Whole-buffer convenience
// ---------------------------------------------------------------------------

/// Run `input` through an encoding pipeline built from `filters`.
pub fn encode_all(filters: &[FilterEntry], input: &[u8]) -> Result<Vec<u8>> {
    run_all(Pipeline::encoder(filters)?, input)
}

/// Run `input` through a decoding pipeline built from `filters`.
pub fn decode_all(filters: &[FilterEntry], input: &[u8]) -> Result<Vec<u8>> {
    run_all(Pipeline::decoder(filters)?, input)
}

fn run_all(mut pipeline: Pipeline, input: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut window = [0u8; 4096];
    let mut in_pos = 0;
    loop {
        let mut out_pos = 0;
        let progress = pipeline.step(input, &mut in_pos, &mut window, &mut out_pos, Action::Finish)?;
        out.extend_from_slice(&window[..out_pos]);
        match progress {
            Progress::Finished => return Ok(out),
            Progress::OutputFull => continue,
            Progress::NeedInput => {
                return Err(Error::Internal("pipeline demanded input past end of stream"))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
