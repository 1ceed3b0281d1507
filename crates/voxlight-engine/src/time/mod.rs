//! Time subsystem.
//!
//! Timers here are polled with explicit `Instant`s so they stay testable and
//! decoupled from the runtime; the window loop wakes up at `Ticker::deadline`.

mod ticker;

pub use ticker::Ticker;
