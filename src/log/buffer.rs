//! 로그 링 버퍼
//!
//! 메시지 바이트 총량 기준 순환 버퍼. 가득 차면 가장 오래된 엔트리부터 버린다.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use super::{LogLevel, LogSink};

/// 저장된 로그 한 줄
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
}

struct Ring {
    entries: VecDeque<LogRecord>,
    used: usize,
}

/// 메모리 캡처 싱크
pub struct RingBuffer {
    capacity: usize,
    inner: Mutex<Ring>,
}

impl RingBuffer {
    /// `capacity`: 보관할 메시지 바이트 총량
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(Ring {
                entries: VecDeque::new(),
                used: 0,
            }),
        }
    }

    pub fn append(&self, level: LogLevel, message: String) {
        // 버퍼 절반보다 큰 메시지는 무시
        if message.len() > self.capacity / 2 {
            return;
        }

        let mut ring = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        while ring.used + message.len() > self.capacity {
            match ring.entries.pop_front() {
                Some(old) => ring.used -= old.message.len(),
                None => break,
            }
        }
        ring.used += message.len();
        ring.entries.push_back(LogRecord { level, message });
    }

    /// 현재 내용 스냅샷 (오래된 순)
    pub fn records(&self) -> Vec<LogRecord> {
        let ring = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        ring.entries.iter().cloned().collect()
    }

    pub fn clear(&self) {
        let mut ring = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        ring.entries.clear();
        ring.used = 0;
    }

    /// 주어진 문자열을 포함하는 메시지가 있는지
    pub fn contains(&self, needle: &str) -> bool {
        let ring = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        ring.entries.iter().any(|r| r.message.contains(needle))
    }
}

impl LogSink for RingBuffer {
    fn write(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        self.append(level, args.to_string());
    }
}
