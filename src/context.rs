//! 라이브러리 컨텍스트
//!
//! 설정, 로거, 모듈 인덱스, 커널 백엔드, 모듈 저장소를 한데 묶는다.
//! `Arc<Context>`로 공유되며 모든 [`Module`](crate::module::Module) 핸들이
//! 자신의 컨텍스트를 참조한다.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::Config;
use crate::error::Result;
use crate::index::{ModuleIndex, TextIndex};
use crate::kernel::{KernelBackend, LinuxKernel};
use crate::log::{LogLevel, LogSink, Logger, StderrSink};
use crate::log_debug;
use crate::module::registry::ModuleRegistry;

pub struct Context {
    config: Config,
    logger: Logger,
    index: Box<dyn ModuleIndex>,
    kernel: Box<dyn KernelBackend>,
    modules: RwLock<ModuleRegistry>,
}

impl Context {
    /// 실행 중인 커널 + `config.dirname`의 텍스트 인덱스
    pub fn new(config: Config) -> Result<Arc<Self>> {
        let index = TextIndex::load(&config.dirname)?;
        Ok(Self::with_backends(
            config,
            Box::new(index),
            Box::new(LinuxKernel),
            Box::new(StderrSink),
        ))
    }

    /// 협력 객체를 직접 지정
    pub fn with_backends(
        config: Config,
        index: Box<dyn ModuleIndex>,
        kernel: Box<dyn KernelBackend>,
        sink: Box<dyn LogSink>,
    ) -> Arc<Self> {
        let logger = Logger::new(config.log_level, sink);
        let ctx = Arc::new(Self {
            config,
            logger,
            index,
            kernel,
            modules: RwLock::new(ModuleRegistry::new()),
        });

        log_debug!(
            ctx,
            "[context] created: dirname={} sysfs={}",
            ctx.config.dirname.display(),
            ctx.config.sysfs_root.display()
        );
        ctx
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn set_log_level(&self, level: LogLevel) {
        self.logger.set_level(level);
    }

    pub fn log_level(&self) -> LogLevel {
        self.logger.level()
    }

    /// 살아 있는 모듈 엔트리 수
    pub fn live_modules(&self) -> usize {
        self.modules().len()
    }

    pub(crate) fn index(&self) -> &dyn ModuleIndex {
        self.index.as_ref()
    }

    pub(crate) fn kernel(&self) -> &dyn KernelBackend {
        self.kernel.as_ref()
    }

    // 저장소 락 안에서는 Module 핸들을 drop하지 않는다
    pub(crate) fn modules(&self) -> RwLockReadGuard<'_, ModuleRegistry> {
        self.modules.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn modules_mut(&self) -> RwLockWriteGuard<'_, ModuleRegistry> {
        self.modules.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("logger", &self.logger)
            .field("live_modules", &self.live_modules())
            .finish()
    }
}
