//! Injected diagnostic hooks.
//!
//! Trace and assert callbacks are process-wide configuration with explicit
//! install/teardown; nothing here is mutated from render call sites. When
//! no hook is installed, traces go to the `log` facade and failed asserts
//! abort.

use parking_lot::RwLock;

/// Receives free-form diagnostic messages.
pub type TraceHook = fn(&str);

/// Receives failed invariant checks. Returning `true` aborts the process
/// (the default behavior when no hook is installed); returning `false`
/// continues execution, for capture-and-continue diagnostics.
pub type AssertHook = fn(expression: &str, message: &str, file: &str, line: u32) -> bool;

static TRACE_HOOK: RwLock<Option<TraceHook>> = RwLock::new(None);
static ASSERT_HOOK: RwLock<Option<AssertHook>> = RwLock::new(None);

pub fn set_trace_hook(hook: TraceHook) {
    *TRACE_HOOK.write() = Some(hook);
}

pub fn clear_trace_hook() {
    *TRACE_HOOK.write() = None;
}

pub fn trace(message: &str) {
    match *TRACE_HOOK.read() {
        Some(hook) => hook(message),
        None => log::trace!("{message}"),
    }
}

pub fn set_assert_hook(hook: AssertHook) {
    *ASSERT_HOOK.write() = Some(hook);
}

pub fn clear_assert_hook() {
    *ASSERT_HOOK.write() = None;
}

/// Report a failed invariant. Returns whether the caller must abort.
pub fn assert_failed(expression: &str, message: &str, file: &str, line: u32) -> bool {
    match *ASSERT_HOOK.read() {
        Some(hook) => hook(expression, message, file, line),
        None => {
            log::error!("[assert] {expression} failed at {file}:{line}: {message}");
            true
        }
    }
}

/// Invariant check for programming errors that would otherwise corrupt GPU
/// state. Routes through the assert hook, then panics unless the hook
/// elected to continue.
macro_rules! fatal_assert {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            let message = format!($($arg)+);
            if $crate::hooks::assert_failed(stringify!($cond), &message, file!(), line!()) {
                panic!("{}", message);
            }
        }
    };
}

pub(crate) use fatal_assert;
