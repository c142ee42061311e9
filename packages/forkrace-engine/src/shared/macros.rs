//! Shared macros
//!
//! The access path runs once per load/store of the instrumented program, so
//! its per-access logging compiles away unless the `trace` feature is on.

/// Per-access trace logging; no-op without the `trace` feature
#[cfg(not(feature = "trace"))]
#[macro_export]
macro_rules! hot_trace {
    ($($arg:tt)*) => {};
}

/// Per-access trace logging; forwards to `tracing::trace!`
#[cfg(feature = "trace")]
#[macro_export]
macro_rules! hot_trace {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}
