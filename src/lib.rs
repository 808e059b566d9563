//! kmodule - 리눅스 커널 모듈 관리 라이브러리
//!
//! # 구성
//! - [`context`]: 설정, 로거, 인덱스, 커널 백엔드, 모듈 저장소를 묶는 컨텍스트
//! - [`module`]: 참조 카운트 모듈 핸들, 의존성 파싱, 별칭 조회, 로드/언로드, sysfs 조회
//! - [`index`]: modules.dep / modules.symbols / modules.alias 텍스트 인덱스
//! - [`kernel`]: init_module / delete_module 시스템 콜
//! - [`config`]: 경로, 로그 레벨, alias 설정
//! - [`log`]: 컨텍스트별 로거
//!
//! # 예시
//! ```no_run
//! use kmodule::{Config, Context, Module, RemoveFlags};
//!
//! let ctx = Context::new(Config::from_env())?;
//! for module in Module::lookup(&ctx, "fs-ext4")? {
//!     println!("{:?} refcnt={}", module.name(), module.use_count()?);
//!     module.remove(RemoveFlags::NOWAIT)?;
//! }
//! # Ok::<(), kmodule::Error>(())
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod index;
pub mod kernel;
pub mod log;
pub mod module;

#[cfg(test)]
mod testutil;

pub use config::Config;
pub use context::Context;
pub use error::{Error, Result};
pub use log::LogLevel;
pub use module::{InsertFlags, Module, ModuleInitState, RemoveFlags, Section};
