//! 라이브러리 에러 타입
//!
//! 모든 실패는 [`Error`] 하나로 표현하고, 외부 경계에서는 [`Error::errno`]로
//! errno 스타일 음수 코드로 변환한다.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// 결과 타입
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// 필수 입력이 비었거나 잘못됨
    #[error("invalid argument")]
    InvalidArgument,

    /// 경로가 존재하지 않음
    #[error("'{}' does not exist", path.display())]
    NotFound { path: PathBuf },

    /// 호출자의 사용 오류 또는 미지원 동작
    #[error("not supported: {0}")]
    Unsupported(&'static str),

    /// open/read/stat/readdir 실패
    #[error("could not access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 커널이 노출한 파일 내용이 예상과 다름
    #[error("unexpected content in '{}': '{content}'", path.display())]
    Malformed { path: PathBuf, content: String },

    /// init_module / delete_module 실패
    #[error("{op} '{module}' failed: {}", io::Error::from_raw_os_error(*errno))]
    Kernel {
        op: &'static str,
        module: String,
        errno: i32,
    },

    /// 의존성 목록을 두 번 초기화하려 함
    #[error("dependencies of '{module}' are already resolved")]
    AlreadyResolved { module: String },

    /// 모듈 인덱스/설정 파일의 잘못된 레코드
    #[error("{}:{line}: {reason}", file.display())]
    Index {
        file: PathBuf,
        line: usize,
        reason: &'static str,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// errno 스타일 음수 코드
    pub fn errno(&self) -> i32 {
        match self {
            Error::InvalidArgument => -libc::EINVAL,
            Error::NotFound { .. } => -libc::ENOENT,
            Error::Unsupported(_) => -libc::ENOSYS,
            Error::Io { source, .. } => -source.raw_os_error().unwrap_or(libc::EIO),
            Error::Malformed { .. } => -libc::EINVAL,
            Error::Kernel { errno, .. } => -errno,
            Error::AlreadyResolved { .. } => -libc::EBUSY,
            Error::Index { .. } => -libc::EINVAL,
        }
    }
}
