// Byte-wise delta filter.
//
// Encoding replaces each byte with its difference (mod 256) from the byte
// `distance` positions earlier; decoding adds the difference back. The
// filter is size-preserving and purely streaming: its only state is one
// history ring and a fixed distance chosen at construction.

use log::trace;

use crate::error::{Error, Result};
use crate::filter::ring::{HistoryRing, RING_SIZE};
use crate::filter::stage::{self, Action, Direction, Progress, Stage};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Flavor of delta arithmetic. Only byte-wise deltas exist today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum DeltaKind {
    /// Subtract the byte `distance` positions back, mod 256.
    #[default]
    Byte,
}

/// Options for the delta filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeltaOptions {
    /// Delta flavor.
    pub kind: DeltaKind,
    /// Lookback distance in bytes, `1..=256`.
    pub distance: u32,
}

impl DeltaOptions {
    /// Smallest valid lookback distance.
    pub const DISTANCE_MIN: u32 = 1;
    /// Largest valid lookback distance; equals the history ring capacity.
    pub const DISTANCE_MAX: u32 = RING_SIZE as u32;

    /// Encoded size of the delta property payload.
    pub(crate) const PROPS_SIZE: usize = 1;

    /// Byte-wise delta options with the given distance. The distance is
    /// checked by [`validate`](Self::validate) when the options are used,
    /// not here.
    pub fn new(distance: u32) -> Self {
        Self {
            kind: DeltaKind::Byte,
            distance,
        }
    }

    /// Check the invariants the wire format and the coder rely on.
    ///
    /// An out-of-range distance is a hard error; it is never clamped.
    pub fn validate(&self) -> Result<()> {
        if self.distance < Self::DISTANCE_MIN || self.distance > Self::DISTANCE_MAX {
            return Err(Error::Options(format!(
                "delta distance {} out of range {}..={}",
                self.distance,
                Self::DISTANCE_MIN,
                Self::DISTANCE_MAX
            )));
        }
        Ok(())
    }

    /// Serialize to the 1-byte wire payload: `distance - 1`, so the wire
    /// range 0..=255 covers distances 1..=256.
    pub(crate) fn encode_props(&self) -> Result<[u8; Self::PROPS_SIZE]> {
        self.validate()?;
        Ok([(self.distance - 1) as u8])
    }

    /// Deserialize from the wire payload, re-validating the range. Wire data
    /// is untrusted even though encoding guarantees the range.
    pub(crate) fn decode_props(props: &[u8]) -> Result<Self> {
        if props.len() != Self::PROPS_SIZE {
            return Err(Error::HeaderCorruption(format!(
                "delta properties are {} bytes, expected {}",
                props.len(),
                Self::PROPS_SIZE
            )));
        }
        let opts = Self::new(u32::from(props[0]) + 1);
        opts.validate()
            .map_err(|_| Error::HeaderCorruption("delta distance out of range".into()))?;
        Ok(opts)
    }
}

impl Default for DeltaOptions {
    fn default() -> Self {
        Self::new(1)
    }
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// A delta filter stage in a live pipeline.
///
/// With no inner stage it reads the application input directly: it copies a
/// bounded window into the output and transforms the freshly written bytes.
/// With an inner stage it lets that stage fill the output window first, then
/// transforms the same bytes in place. Both paths funnel through one
/// transform routine, so the two produce identical bytes for identical
/// logical input.
pub struct DeltaStage {
    next: Option<Box<dyn Stage>>,
    direction: Direction,
    distance: usize,
    ring: HistoryRing,
}

impl DeltaStage {
    pub(crate) fn new(
        options: &DeltaOptions,
        direction: Direction,
        next: Option<Box<dyn Stage>>,
    ) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            next,
            direction,
            distance: options.distance as usize,
            ring: HistoryRing::new(),
        })
    }

    /// Apply the delta arithmetic to a window of bytes, in place.
    fn transform(&mut self, window: &mut [u8]) {
        match self.direction {
            Direction::Encode => {
                for b in window.iter_mut() {
                    let prior = self.ring.peek(self.distance);
                    self.ring.push(*b);
                    *b = b.wrapping_sub(prior);
                }
            }
            Direction::Decode => {
                for b in window.iter_mut() {
                    *b = b.wrapping_add(self.ring.peek(self.distance));
                    self.ring.push(*b);
                }
            }
        }
    }
}

impl Stage for DeltaStage {
    fn step(
        &mut self,
        input: &[u8],
        in_pos: &mut usize,
        output: &mut [u8],
        out_pos: &mut usize,
        action: Action,
    ) -> Result<Progress> {
        let out_start = *out_pos;

        let progress = match self.next.as_mut() {
            None => {
                stage::copy_bounded(input, in_pos, output, out_pos);
                stage::intake_progress(input.len(), *in_pos, action)
            }
            Some(next) => next.step(input, in_pos, output, out_pos, action)?,
        };

        self.transform(&mut output[out_start..*out_pos]);
        trace!(
            "delta d={} {:?}: transformed {} bytes",
            self.distance,
            self.direction,
            *out_pos - out_start
        );
        Ok(progress)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
