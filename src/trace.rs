//! Stage spans and counters behind the optional `tracing` feature.
//!
//! `trace_span!` opens an info span for a pipeline stage, `trace_event!`
//! reports stage counters at info level and `trace_detail!` reports per-rule
//! counters at debug level. Without the feature the span macro yields a
//! [`StageGuard`] and the event macros only evaluate their values.

/// Opens an info-level span named `$name` with optional span fields.
///
/// With `tracing` enabled this is `tracing::info_span!`; call `.entered()` on
/// the result and hold the guard for the stage. Without the feature it yields
/// a [`StageGuard`] and the fields are not evaluated.
#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        tracing::info_span!($name $(, $($field)*)?)
    };
}

/// Opens an info-level span; compiled out, see the `tracing` variant.
#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        $crate::trace::StageGuard
    };
}

/// Emits an info-level event named `$name` carrying one or more
/// `key = value` counters.
///
/// With `tracing` enabled this forwards to `tracing::info!`, which evaluates
/// the values only when a subscriber wants the event. Without the feature
/// each value is evaluated once and discarded.
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($name:expr $(, $key:ident = $value:expr)+ $(,)?) => {
        tracing::info!(name: $name, $($key = $value),+)
    };
}

/// Emits a debug-level event named `$name` carrying one or more
/// `key = value` counters, for per-rule and per-cluster detail.
///
/// With `tracing` enabled this forwards to `tracing::debug!`. Without it each
/// value is evaluated once and discarded.
#[cfg(feature = "tracing")]
macro_rules! trace_detail {
    ($name:expr $(, $key:ident = $value:expr)+ $(,)?) => {
        tracing::debug!(name: $name, $($key = $value),+)
    };
}

/// Evaluates and discards the event values; `tracing` is compiled out.
#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($name:expr $(, $key:ident = $value:expr)+ $(,)?) => {
        $( let _ = $value; )+
    };
}

/// Evaluates and discards the detail values; `tracing` is compiled out.
#[cfg(not(feature = "tracing"))]
macro_rules! trace_detail {
    ($name:expr $(, $key:ident = $value:expr)+ $(,)?) => {
        $( let _ = $value; )+
    };
}

pub(crate) use trace_detail;
pub(crate) use trace_event;
pub(crate) use trace_span;

/// Stand-in for an entered span when tracing is compiled out.
///
/// `trace_span!` returns this zero-sized value in builds without the
/// `tracing` feature so call sites can write `trace_span!(..).entered()` in
/// both builds. With the feature enabled the macro returns a real
/// `tracing::Span` and this type does not exist.
#[cfg(not(feature = "tracing"))]
pub struct StageGuard;

#[cfg(not(feature = "tracing"))]
impl StageGuard {
    /// Mirrors `tracing::Span::entered`; returns the guard unchanged.
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}
