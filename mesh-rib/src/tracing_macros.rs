/// RIB-specific tracing macros that automatically include `proto="rib"`
/// for better log categorization and filtering.

#[macro_export]
macro_rules! rib_info {
    ($($arg:tt)*) => {
        tracing::info!(proto = "rib", $($arg)*)
    };
}

#[macro_export]
macro_rules! rib_warn {
    ($($arg:tt)*) => {
        tracing::warn!(proto = "rib", $($arg)*)
    };
}

#[macro_export]
macro_rules! rib_error {
    ($($arg:tt)*) => {
        tracing::error!(proto = "rib", $($arg)*)
    };
}

#[macro_export]
macro_rules! rib_debug {
    ($($arg:tt)*) => {
        tracing::debug!(proto = "rib", $($arg)*)
    };
}
