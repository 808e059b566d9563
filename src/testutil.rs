//! 테스트 공용 도구
//!
//! - 링 버퍼 로그를 캡처하는 컨텍스트
//! - 호출을 기록하는 가짜 커널
//! - 항상 실패하는 인덱스

use std::ffi::CStr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::index::{DepRecord, ModuleIndex, TextIndex};
use crate::kernel::KernelBackend;
use crate::log::{LogLevel, RingBuffer};

const LOG_CAPACITY: usize = 64 * 1024;

/// 빈 인덱스 + 가짜 커널
pub fn test_context() -> (Arc<Context>, Arc<RingBuffer>) {
    context_with(Config::default(), Box::new(TextIndex::default()))
}

pub fn context_with(config: Config, index: Box<dyn ModuleIndex>) -> (Arc<Context>, Arc<RingBuffer>) {
    context_with_kernel(config, index, FakeKernel::new())
}

pub fn context_with_kernel(
    config: Config,
    index: Box<dyn ModuleIndex>,
    kernel: FakeKernel,
) -> (Arc<Context>, Arc<RingBuffer>) {
    let log = Arc::new(RingBuffer::new(LOG_CAPACITY));
    let config = config.with_log_level(LogLevel::Trace);
    let ctx = Context::with_backends(config, index, Box::new(kernel), Box::new(log.clone()));
    (ctx, log)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelCall {
    Init { image: Vec<u8>, args: String },
    Delete { name: String, flags: u32 },
}

/// 호출 기록용 커널. clone은 기록을 공유한다.
#[derive(Debug, Clone, Default)]
pub struct FakeKernel {
    calls: Arc<Mutex<Vec<KernelCall>>>,
    errno: Option<i32>,
}

impl FakeKernel {
    pub fn new() -> Self {
        Self::default()
    }

    /// 모든 호출이 `errno`로 실패
    pub fn failing(errno: i32) -> Self {
        Self {
            errno: Some(errno),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<KernelCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: KernelCall) -> std::result::Result<(), i32> {
        self.calls.lock().unwrap().push(call);
        match self.errno {
            Some(errno) => Err(errno),
            None => Ok(()),
        }
    }
}

impl KernelBackend for FakeKernel {
    fn init_module(&self, image: &[u8], args: &CStr) -> std::result::Result<(), i32> {
        self.record(KernelCall::Init {
            image: image.to_vec(),
            args: args.to_string_lossy().into_owned(),
        })
    }

    fn delete_module(&self, name: &CStr, flags: u32) -> std::result::Result<(), i32> {
        self.record(KernelCall::Delete {
            name: name.to_string_lossy().into_owned(),
            flags,
        })
    }
}

/// 모든 조회가 실패하는 인덱스
pub struct FailingIndex;

impl FailingIndex {
    fn error() -> Error {
        Error::Index {
            file: PathBuf::from("modules.dep"),
            line: 1,
            reason: "corrupted",
        }
    }
}

impl ModuleIndex for FailingIndex {
    fn dependency_line(&self, _name: &str) -> Result<Option<DepRecord>> {
        Err(Self::error())
    }

    fn symbol_modules(&self, _alias: &str) -> Result<Vec<String>> {
        Err(Self::error())
    }

    fn alias_modules(&self, _alias: &str) -> Result<Vec<String>> {
        Err(Self::error())
    }
}
