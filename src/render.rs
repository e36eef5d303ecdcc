mod overlay;
mod trace;

pub use overlay::CircleStamp;
pub use trace::{TRACE_COLOR, TRACE_DECAY, TRACE_RADIUS, TraceRenderer, opacity_weights};
