// ABOUTME: Session module - lifecycle of one ring and its agent threads.
// ABOUTME: Contains start/stop/join/shutdown and the final report.

mod report;
mod session;

pub use report::SessionReport;
pub use session::Session;
