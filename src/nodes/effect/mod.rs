//! Audio effect nodes (one summed input)

mod distortion;
mod envelope;
mod filter;
mod pan;

pub use distortion::{Distorter, DistortionMessage};
pub use envelope::{Envelope, EnvelopeMessage};
pub use filter::{Filter, FilterMessage};
pub use pan::{PanMessage, Panner};
