// Passthrough filter.
//
// Useful as an explicit "no transform" chain entry. When it faces the
// application input it is a bounded copy; when it wraps another stage it
// delegates untouched, since copying between stages would change nothing.

use crate::error::Result;
use crate::filter::stage::{self, Action, Progress, Stage};

/// A passthrough stage. Carries no state beyond its chain link.
pub struct CopyStage {
    next: Option<Box<dyn Stage>>,
}

impl CopyStage {
    pub(crate) fn new(next: Option<Box<dyn Stage>>) -> Self {
        Self { next }
    }
}

impl Stage for CopyStage {
    fn step(
        &mut self,
        input: &[u8],
        in_pos: &mut usize,
        output: &mut [u8],
        out_pos: &mut usize,
        action: Action,
    ) -> Result<Progress> {
        match self.next.as_mut() {
            Some(next) => next.step(input, in_pos, output, out_pos, action),
            None => {
                stage::copy_bounded(input, in_pos, output, out_pos);
                Ok(stage::intake_progress(input.len(), *in_pos, action))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
