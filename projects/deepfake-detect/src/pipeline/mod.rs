// Per-frame classification, voting and the detector that ties them together

pub mod aggregate;
pub mod classify;
pub mod detector;
pub mod types;
