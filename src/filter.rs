mod bbox;
mod detection;
mod movement;

pub use bbox::BBox;
pub use detection::{Detection, TrackSequence};
pub use movement::{MovementFilter, filter_moving_objects};
