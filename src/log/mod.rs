//! 컨텍스트별 로깅
//!
//! - 로그 레벨: ERROR, WARN, INFO, DEBUG, TRACE
//! - 레벨 필터링 후 싱크(LogSink)로 전달
//! - 기본 싱크: stderr, 캡처용: 링 버퍼
//!
//! 전역 상태 없음. 로거는 Context가 소유한다.

mod buffer;
mod macros;

pub use buffer::{LogRecord, RingBuffer};

use std::fmt;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => " WARN",
            LogLevel::Info => " INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }

    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => LogLevel::Error,
            1 => LogLevel::Warn,
            2 => LogLevel::Info,
            3 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    /// 숫자("0"~"4") 또는 이름(대소문자 무시)으로 파싱
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Ok(n) = s.parse::<u8>() {
            return (n <= 4).then(|| Self::from_u8(n));
        }
        match s.to_ascii_lowercase().as_str() {
            "error" | "err" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 로그 출력 대상
pub trait LogSink: Send + Sync {
    fn write(&self, level: LogLevel, args: fmt::Arguments<'_>);
}

impl<T: LogSink + ?Sized> LogSink for Arc<T> {
    fn write(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        (**self).write(level, args)
    }
}

/// stderr 싱크 (기본값)
pub struct StderrSink;

impl LogSink for StderrSink {
    fn write(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        let stderr = std::io::stderr();
        let mut out = stderr.lock();
        let _ = writeln!(out, "kmodule: {}: {}", level, args);
    }
}

/// 레벨 필터 + 싱크
pub struct Logger {
    level: AtomicU8,
    sink: Box<dyn LogSink>,
}

impl Logger {
    pub fn new(level: LogLevel, sink: Box<dyn LogSink>) -> Self {
        Self {
            level: AtomicU8::new(level as u8),
            sink,
        }
    }

    pub fn set_level(&self, level: LogLevel) {
        self.level.store(level as u8, Ordering::Relaxed);
    }

    pub fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.level.load(Ordering::Relaxed))
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        (level as u8) <= self.level.load(Ordering::Relaxed)
    }

    /// 로그 메시지 출력
    pub fn log(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        if !self.enabled(level) {
            return;
        }
        self.sink.write(level, args);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").field("level", &self.level()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_str() {
        assert_eq!(LogLevel::from_str("0"), Some(LogLevel::Error));
        assert_eq!(LogLevel::from_str("3"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_str("9"), None);
        assert_eq!(LogLevel::from_str("DeBuG"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_str("warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_str("loud"), None);
    }

    #[test]
    fn test_filtering() {
        let ring = Arc::new(RingBuffer::new(1024));
        let logger = Logger::new(LogLevel::Info, Box::new(ring.clone()));

        logger.log(LogLevel::Error, format_args!("kept {}", 1));
        logger.log(LogLevel::Debug, format_args!("dropped"));
        assert_eq!(ring.records().len(), 1);

        logger.set_level(LogLevel::Trace);
        logger.log(LogLevel::Debug, format_args!("now kept"));

        let records = ring.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "kept 1");
        assert_eq!(records[1].level, LogLevel::Debug);
    }
}
