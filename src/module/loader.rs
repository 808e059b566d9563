//! 모듈 로드/언로드
//!
//! - insert: 모듈 파일을 mmap해서 init_module에 그대로 전달
//! - remove: 정규화된 이름으로 delete_module 호출 (FORCE/NOWAIT만 전달)

use std::ffi::CString;
use std::fs::File;
use std::io;
use std::ops::BitOr;

use crate::error::{Error, Result};
use crate::kernel::MappedImage;
use crate::{log_error, log_info};

use super::{Module, open_error};

/// 로드 플래그 (아직 구현된 비트 없음)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InsertFlags(pub u32);

impl InsertFlags {
    pub const NONE: Self = Self(0);
}

/// 언로드 플래그
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RemoveFlags(pub u32);

impl RemoveFlags {
    pub const NONE: Self = Self(0);
    /// 사용 중이어도 강제 제거
    pub const FORCE: Self = Self(libc::O_TRUNC as u32);
    /// 참조가 남아 있으면 기다리지 않고 실패
    pub const NOWAIT: Self = Self(libc::O_NONBLOCK as u32);

    /// 커널이 인식하는 비트만 남김
    pub fn kernel_bits(self) -> u32 {
        self.0 & (Self::FORCE.0 | Self::NOWAIT.0)
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for RemoveFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl Module {
    /// 경로로 생성된 모듈을 커널에 로드
    pub fn insert(&self, flags: InsertFlags) -> Result<()> {
        let Some(path) = self.path() else {
            log_error!(self.ctx, "[module] Not supported to load a module by name yet");
            return Err(Error::Unsupported("loading a module by name"));
        };

        if flags != InsertFlags::NONE {
            log_info!(self.ctx, "[module] Flags are not implemented yet");
        }

        let file = File::open(&path).map_err(|e| {
            log_error!(self.ctx, "[module] could not open '{}': {}", path.display(), e);
            open_error(&path, e)
        })?;

        // image가 file보다 먼저 drop: munmap 후 close
        let image = MappedImage::map(&file).map_err(|e| {
            log_error!(self.ctx, "[module] could not map '{}': {}", path.display(), e);
            Error::io(&path, e)
        })?;

        let args = c"";
        self.ctx
            .kernel()
            .init_module(image.as_slice(), args)
            .map_err(|errno| {
                log_error!(
                    self.ctx,
                    "[module] Failed to insert module '{}': {}",
                    path.display(),
                    io::Error::from_raw_os_error(errno)
                );
                Error::Kernel {
                    op: "init_module",
                    module: path.display().to_string(),
                    errno,
                }
            })
    }

    /// 커널에서 모듈 제거
    pub fn remove(&self, flags: RemoveFlags) -> Result<()> {
        let modname = self.modname()?;
        let flags = flags.kernel_bits();

        let name = CString::new(modname.as_str()).map_err(|_| Error::InvalidArgument)?;
        self.ctx
            .kernel()
            .delete_module(&name, flags)
            .map_err(|errno| {
                log_error!(
                    self.ctx,
                    "[module] Removing '{}': {}",
                    modname,
                    io::Error::from_raw_os_error(errno)
                );
                Error::Kernel {
                    op: "delete_module",
                    module: modname,
                    errno,
                }
            })
    }
}
