use std::{path::Path, sync::Arc};

use crate::{ProminentSign, TextFrame};

/// The image a tracking step runs on.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    pub index: usize,
    pub timestamp: f64,
    pub image_path: &'a Path,
}

/// Consumer of the text landmarks, called once per image with everything
/// accumulated so far. The slices are only valid for the call.
pub trait FrameTracker {
    fn track(
        &mut self,
        input: FrameInput<'_>,
        frames: &[Arc<TextFrame>],
        signs: &[ProminentSign],
    );
}
