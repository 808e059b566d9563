//! 커널 인터페이스
//!
//! - `init_module(2)`: 메모리 이미지 + 길이 + 인자 문자열
//! - `delete_module(2)`: 모듈 이름 + 플래그
//!
//! 테스트에서는 [`KernelBackend`]를 가짜 구현으로 대체한다.

use std::ffi::CStr;
use std::fs::File;
use std::io;
use std::os::fd::AsRawFd;
use std::ptr;
use std::slice;

/// 커널 모듈 로드/언로드 능력
///
/// 실패 시 양수 errno를 그대로 돌려준다.
pub trait KernelBackend: Send + Sync {
    fn init_module(&self, image: &[u8], args: &CStr) -> Result<(), i32>;
    fn delete_module(&self, name: &CStr, flags: u32) -> Result<(), i32>;
}

/// 실행 중인 리눅스 커널
#[derive(Debug, Default, Clone, Copy)]
pub struct LinuxKernel;

impl KernelBackend for LinuxKernel {
    fn init_module(&self, image: &[u8], args: &CStr) -> Result<(), i32> {
        let ret = unsafe {
            libc::syscall(
                libc::SYS_init_module,
                image.as_ptr() as *const libc::c_void,
                image.len() as libc::c_ulong,
                args.as_ptr(),
            )
        };
        if ret < 0 { Err(last_errno()) } else { Ok(()) }
    }

    fn delete_module(&self, name: &CStr, flags: u32) -> Result<(), i32> {
        let ret = unsafe {
            libc::syscall(
                libc::SYS_delete_module,
                name.as_ptr(),
                flags as libc::c_uint,
            )
        };
        if ret < 0 { Err(last_errno()) } else { Ok(()) }
    }
}

fn last_errno() -> i32 {
    io::Error::last_os_error()
        .raw_os_error()
        .unwrap_or(libc::EIO)
}

/// 읽기 전용, private 메모리 매핑된 파일 이미지. drop 시 munmap.
pub struct MappedImage {
    addr: *mut libc::c_void,
    len: usize,
}

impl MappedImage {
    /// 열린 파일 전체를 매핑
    pub fn map(file: &File) -> io::Result<Self> {
        let len = file.metadata()?.len() as usize;
        if len == 0 {
            return Err(io::Error::from_raw_os_error(libc::EINVAL));
        }

        let addr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ,
                libc::MAP_PRIVATE,
                file.as_raw_fd(),
                0,
            )
        };
        if addr == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }

        Ok(Self { addr, len })
    }

    pub fn as_slice(&self) -> &[u8] {
        // addr..addr+len 은 drop 전까지 유효한 읽기 전용 매핑
        unsafe { slice::from_raw_parts(self.addr as *const u8, self.len) }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Drop for MappedImage {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.addr, self.len);
        }
    }
}
