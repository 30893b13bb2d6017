// The contract every pipeline stage implements.
//
// A stage consumes bytes from an input window and produces bytes into an
// output window, advancing caller-owned cursors. Stages are chained by
// ownership: each stage may hold the next stage toward the application
// input, and a stage with no inner stage reads the application input itself.

use crate::error::Result;

// ---------------------------------------------------------------------------
// Step inputs and outputs
// ---------------------------------------------------------------------------

/// The caller's intent for a `step` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// More input may follow after the current buffer.
    Run,
    /// The current input buffer is the last of the stream.
    Finish,
}

/// What a stage accomplished in one `step` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Everything available was consumed; the stage wants more input.
    NeedInput,
    /// The stage produced all it can for now; call again with output space.
    OutputFull,
    /// End of stream: the input side finished and every buffered byte has
    /// been flushed.
    Finished,
}

/// Whether a pipeline transforms toward or away from the compressed
/// representation. Fixed per stage at construction; stages never re-decide
/// their direction afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Raw bytes in, filtered bytes out.
    Encode,
    /// Filtered bytes in, raw bytes out.
    Decode,
}

// ---------------------------------------------------------------------------
// Stage trait
// ---------------------------------------------------------------------------

/// A single pipeline stage.
///
/// `step` must process `min(input remaining, output remaining, inner stage
/// capacity)` bytes per call and update both cursors in place. It must be
/// safe to call repeatedly with shrinking or growing buffer windows: no byte
/// may be dropped or duplicated across resumptions. `Progress::Finished` is
/// returned only once the input side has signalled [`Action::Finish`] and
/// all internally buffered bytes have been flushed downstream.
pub trait Stage {
    /// Consume from `input[*in_pos..]`, produce into `output[*out_pos..]`.
    fn step(
        &mut self,
        input: &[u8],
        in_pos: &mut usize,
        output: &mut [u8],
        out_pos: &mut usize,
        action: Action,
    ) -> Result<Progress>;
}

// ---------------------------------------------------------------------------
// Shared helpers for stages that face the application input
// ---------------------------------------------------------------------------

/// Copy as many bytes as fit from `input[*in_pos..]` to `output[*out_pos..]`,
/// advancing both cursors. Returns the number of bytes copied.
pub(crate) fn copy_bounded(
    input: &[u8],
    in_pos: &mut usize,
    output: &mut [u8],
    out_pos: &mut usize,
) -> usize {
    let n = (input.len() - *in_pos).min(output.len() - *out_pos);
    output[*out_pos..*out_pos + n].copy_from_slice(&input[*in_pos..*in_pos + n]);
    *in_pos += n;
    *out_pos += n;
    n
}

/// Progress report for a stage that just copied or buffered directly from
/// the application input.
pub(crate) fn intake_progress(input_len: usize, in_pos: usize, action: Action) -> Progress {
    if in_pos == input_len {
        match action {
            Action::Finish => Progress::Finished,
            Action::Run => Progress::NeedInput,
        }
    } else {
        Progress::OutputFull
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
