/// Live location module
///
/// This module handles:
/// - One-shot and continuous location tracking (tracker.rs)
/// - The text readout those updates drive (readout.rs)

pub mod readout;
pub mod tracker;

pub use readout::TrackerReadout;
pub use tracker::{LocationTracker, TrackerEvent};
