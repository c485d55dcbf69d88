//! Timed wrappers around caller-supplied callables
//!
//! A wrapper forwards its argument to the inner callable and hands back the
//! result untouched. Only invocations that complete are recorded: a panic
//! unwinds straight through the wrapper, and an `Err` from a fallible
//! callable is returned before the record step.
//!
//! Callables take a single argument. Use `()` for none and a tuple for
//! several.

use crate::registry::Registry;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Run `f` once and return its result with the elapsed wall-clock time
///
/// # Example
/// ```
/// use calltimer::interceptor::measure;
///
/// let (value, elapsed) = measure(|| 6 * 7);
/// assert_eq!(value, 42);
/// assert!(elapsed.as_secs() < 1);
/// ```
pub fn measure<R, F>(f: F) -> (R, Duration)
where
    F: FnOnce() -> R,
{
    let start = Instant::now();
    let value = f();
    (value, start.elapsed())
}

/// Wrap `f` so that each completed call is recorded under `key`
pub fn wrap<A, R, F>(registry: Arc<Registry>, key: impl Into<String>, f: F) -> impl Fn(A) -> R
where
    F: Fn(A) -> R,
{
    wrap_with(registry, key, f, |_, _| {})
}

/// Like [`wrap`], then call `on_recorded` with the key and its new call count
pub fn wrap_with<A, R, F, H>(
    registry: Arc<Registry>,
    key: impl Into<String>,
    f: F,
    on_recorded: H,
) -> impl Fn(A) -> R
where
    F: Fn(A) -> R,
    H: Fn(&str, u64),
{
    let key = key.into();
    move |args| {
        let (value, elapsed) = measure(|| f(args));
        let calls = registry.record(&key, elapsed);
        on_recorded(&key, calls);
        value
    }
}

/// Wrap a fallible `f`; calls returning `Err` are passed through unrecorded
pub fn wrap_fallible<A, T, E, F>(
    registry: Arc<Registry>,
    key: impl Into<String>,
    f: F,
) -> impl Fn(A) -> Result<T, E>
where
    F: Fn(A) -> Result<T, E>,
{
    wrap_fallible_with(registry, key, f, |_, _| {})
}

/// Like [`wrap_fallible`], then call `on_recorded` after each `Ok`
pub fn wrap_fallible_with<A, T, E, F, H>(
    registry: Arc<Registry>,
    key: impl Into<String>,
    f: F,
    on_recorded: H,
) -> impl Fn(A) -> Result<T, E>
where
    F: Fn(A) -> Result<T, E>,
    H: Fn(&str, u64),
{
    let key = key.into();
    move |args| {
        let (result, elapsed) = measure(|| f(args));
        let value = result?;
        let calls = registry.record(&key, elapsed);
        on_recorded(&key, calls);
        Ok(value)
    }
}
