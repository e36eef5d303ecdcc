use std::path::PathBuf;

/// Progress checkpoints of a processing run, in the order they are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Checkpoint {
    /// Frames decoded from the input video
    FramesExtracted,
    /// Tracking service returned per-frame detections
    TrackingComplete,
    /// Movement filter applied
    FilterApplied,
    /// Trace drawn on every frame
    FramesAnnotated,
    /// Output video written
    VideoSaved,
}

impl Checkpoint {
    pub const ALL: [Checkpoint; 5] = [
        Checkpoint::FramesExtracted,
        Checkpoint::TrackingComplete,
        Checkpoint::FilterApplied,
        Checkpoint::FramesAnnotated,
        Checkpoint::VideoSaved,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn description(self) -> &'static str {
        match self {
            Checkpoint::FramesExtracted => "Frames Extracted",
            Checkpoint::TrackingComplete => "Object Tracking Complete",
            Checkpoint::FilterApplied => "Movement Filter Applied",
            Checkpoint::FramesAnnotated => "Frames Annotated",
            Checkpoint::VideoSaved => "Video Saved",
        }
    }
}

/// Snapshot of a run's progress, delivered after every checkpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    flags: [bool; 5],
    /// Annotated video, set once the run completes
    pub video: Option<PathBuf>,
}

impl Progress {
    pub fn mark(&mut self, checkpoint: Checkpoint) {
        self.flags[checkpoint.index()] = true;
    }

    pub fn is_done(&self, checkpoint: Checkpoint) -> bool {
        self.flags[checkpoint.index()]
    }

    pub fn flags(&self) -> [bool; 5] {
        self.flags
    }

    pub fn is_complete(&self) -> bool {
        self.flags.iter().all(|&done| done)
    }

    /// The most recent checkpoint reached, if any.
    pub fn last(&self) -> Option<Checkpoint> {
        Checkpoint::ALL.into_iter().rev().find(|&c| self.is_done(c))
    }
}
