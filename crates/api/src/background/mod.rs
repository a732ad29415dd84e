//! Long-running tasks spawned next to the server.
//!
//! Each task accepts a [`CancellationToken`](tokio_util::sync::CancellationToken)
//! and returns once it is cancelled.

pub mod session_sweep;
