//! Logging macros that attribute messages to the enclosing function
//!
//! ```
//! use layerlog::{log_info, LogBuffer};
//!
//! fn load_assets(buffer: &LogBuffer) {
//!     log_info!(buffer, "loaded {} textures", 12);
//! }
//!
//! let buffer = LogBuffer::new("assets");
//! load_assets(&buffer);
//! assert_eq!(buffer.messages()[0].call_site().as_str(), "load_assets");
//! ```

/// Name of the function this macro is expanded in, without its module path
#[macro_export]
macro_rules! function_name {
    () => {{
        fn __here() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        $crate::logging::function_from_type_name(type_name_of(__here))
    }};
}

/// Log a formatted message at an explicit level, attributed to the enclosing function
#[macro_export]
macro_rules! log_at {
    ($buffer:expr, $level:expr, $($arg:tt)+) => {
        $buffer.log_at(
            $crate::logging::CallSite::new($crate::function_name!()),
            ::std::format!($($arg)+),
            $level,
        )
    };
}

#[macro_export]
macro_rules! log_debug {
    ($buffer:expr, $($arg:tt)+) => {
        $crate::log_at!($buffer, $crate::logging::Level::Debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_info {
    ($buffer:expr, $($arg:tt)+) => {
        $crate::log_at!($buffer, $crate::logging::Level::Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($buffer:expr, $($arg:tt)+) => {
        $crate::log_at!($buffer, $crate::logging::Level::Warning, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_critical {
    ($buffer:expr, $($arg:tt)+) => {
        $crate::log_at!($buffer, $crate::logging::Level::Critical, $($arg)+)
    };
}
