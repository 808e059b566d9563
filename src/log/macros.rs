//! 로그 매크로
//!
//! log_error!, log_warn!, log_info!, log_debug!, log_trace!
//! 첫 인자는 로거를 가진 Context.

#[macro_export]
macro_rules! log_error {
    ($ctx:expr, $($arg:tt)*) => {
        $ctx.logger().log($crate::log::LogLevel::Error, ::std::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($ctx:expr, $($arg:tt)*) => {
        $ctx.logger().log($crate::log::LogLevel::Warn, ::std::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($ctx:expr, $($arg:tt)*) => {
        $ctx.logger().log($crate::log::LogLevel::Info, ::std::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_debug {
    ($ctx:expr, $($arg:tt)*) => {
        $ctx.logger().log($crate::log::LogLevel::Debug, ::std::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_trace {
    ($ctx:expr, $($arg:tt)*) => {
        $ctx.logger().log($crate::log::LogLevel::Trace, ::std::format_args!($($arg)*))
    };
}
