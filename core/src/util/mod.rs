pub mod channel;
pub mod safemap;

pub use channel::{receiver_stream, unbounded_receiver_stream};
pub use safemap::SafeMap;

/// Formats an action log with consistent styling.
/// First argument is always a "thing" that performed the action (in bold blue)
/// Second argument is the action name (in green)
/// Remaining arguments are formatted as additional context (dimmed)
#[macro_export]
macro_rules! action_info {
    ($thing:expr, $action:expr) => {
        tracing::info!("\x1b[1;34m{}\x1b[0m → \x1b[32m{}\x1b[0m", $thing, $action)
    };
    ($thing:expr, $action:expr, $($arg:expr),+) => {
        tracing::info!("\x1b[1;34m{}\x1b[0m → \x1b[32m{}\x1b[0m \x1b[2m{}\x1b[0m", $thing, $action, format!("{}", format_args!($($arg),+)))
    };
}

#[macro_export]
macro_rules! action_debug {
    ($thing:expr, $action:expr) => {
        tracing::debug!("\x1b[1;34m{}\x1b[0m → \x1b[32m{}\x1b[0m", $thing, $action)
    };
    ($thing:expr, $action:expr, $($arg:expr),+) => {
        tracing::debug!("\x1b[1;34m{}\x1b[0m → \x1b[32m{}\x1b[0m \x1b[2m{}\x1b[0m", $thing, $action, format!("{}", format_args!($($arg),+)))
    };
}

#[macro_export]
macro_rules! action_warn {
    ($thing:expr, $action:expr) => {
        tracing::warn!("\x1b[1;34m{}\x1b[0m → \x1b[32m{}\x1b[0m", $thing, $action)
    };
    ($thing:expr, $action:expr, $($arg:expr),+) => {
        tracing::warn!("\x1b[1;34m{}\x1b[0m → \x1b[32m{}\x1b[0m \x1b[2m{}\x1b[0m", $thing, $action, format!("{}", format_args!($($arg),+)))
    };
}
