//! sysfs 모듈 상태 조회
//!
//! `<sysfs>/module/<name>/` 아래 파일을 읽는다:
//! - `initstate`: `live\n` | `coming\n` | `going\n` (없고 디렉토리만 있으면 builtin)
//! - `refcnt`: 10진 정수
//! - `holders/`: 이 모듈을 사용하는 모듈 이름들
//! - `sections/`: 섹션 이름별 16진 로드 주소
//!
//! 단일 파일 읽기는 첫 에러를 전파하고, 디렉토리 스캔은 엔트리별 실패를
//! 로그로 남기고 건너뛴다.

use std::fmt;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::log_error;

use super::{Module, open_error};

/// initstate 읽기 최대 길이
const INITSTATE_MAX: u64 = 31;
/// 숫자 한 줄 읽기 최대 길이
const NUMBER_MAX: u64 = 63;

/// 모듈 초기화 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleInitState {
    /// 커널 이미지에 내장
    Builtin,
    /// 로드 완료
    Live,
    /// 초기화 중
    Coming,
    /// 제거 중
    Going,
}

impl ModuleInitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleInitState::Builtin => "builtin",
            ModuleInitState::Live => "live",
            ModuleInitState::Coming => "coming",
            ModuleInitState::Going => "going",
        }
    }
}

impl fmt::Display for ModuleInitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 로드된 모듈의 ELF 섹션
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    name: String,
    address: u64,
}

impl Section {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> u64 {
        self.address
    }
}

impl Module {
    fn sysfs_dir(&self) -> Result<PathBuf> {
        Ok(self
            .ctx
            .config()
            .sysfs_root
            .join("module")
            .join(self.modname()?))
    }

    /// 초기화 상태
    pub fn initstate(&self) -> Result<ModuleInitState> {
        let dir = self.sysfs_dir()?;
        let path = dir.join("initstate");

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) => {
                if dir.is_dir() {
                    return Ok(ModuleInitState::Builtin);
                }
                log_error!(self.ctx, "[sysfs] could not open '{}': {}", path.display(), e);
                return Err(open_error(&path, e));
            }
        };

        let buf = read_limited(file, &path, INITSTATE_MAX).inspect_err(|e| {
            log_error!(self.ctx, "[sysfs] could not read from '{}': {}", path.display(), e);
        })?;

        match buf.as_str() {
            "live\n" => Ok(ModuleInitState::Live),
            "coming\n" => Ok(ModuleInitState::Coming),
            "going\n" => Ok(ModuleInitState::Going),
            _ => {
                log_error!(self.ctx, "[sysfs] unknown {}: '{}'", path.display(), buf);
                Err(Error::Malformed {
                    path,
                    content: buf,
                })
            }
        }
    }

    /// 커널 쪽 사용 카운트 (`refcnt`)
    pub fn use_count(&self) -> Result<i32> {
        let path = self.sysfs_dir()?.join("refcnt");

        let file = File::open(&path).map_err(|e| {
            log_error!(self.ctx, "[sysfs] could not open '{}': {}", path.display(), e);
            open_error(&path, e)
        })?;

        let buf = read_limited(file, &path, NUMBER_MAX).inspect_err(|e| {
            log_error!(self.ctx, "[sysfs] could not read from '{}': {}", path.display(), e);
        })?;
        parse_long(&buf)
            .and_then(|n| i32::try_from(n).ok())
            .ok_or_else(|| {
                log_error!(
                    self.ctx,
                    "[sysfs] could not read integer from '{}': '{}'",
                    path.display(),
                    buf.trim_end()
                );
                Error::Malformed {
                    path: path.clone(),
                    content: buf.clone(),
                }
            })
    }

    /// 이 모듈을 사용 중인 모듈들. 디렉토리를 열 수 없으면 빈 목록.
    pub fn holders(&self) -> Vec<Module> {
        let Some(dir) = self.scan_dir("holders") else {
            return Vec::new();
        };

        let mut list = Vec::new();
        for (path, file_name) in dir {
            let holder = file_name
                .to_str()
                .ok_or(Error::InvalidArgument)
                .and_then(|name| Module::new_from_name(&self.ctx, name));

            match holder {
                Ok(module) => list.push(module),
                Err(e) => {
                    log_error!(
                        self.ctx,
                        "[sysfs] could not create module for '{}': {}",
                        path.display(),
                        e
                    );
                }
            }
        }
        list
    }

    /// 섹션 이름과 로드 주소. 디렉토리를 열 수 없으면 빈 목록.
    pub fn sections(&self) -> Vec<Section> {
        let Some(dir) = self.scan_dir("sections") else {
            return Vec::new();
        };

        let mut list = Vec::new();
        for (path, file_name) in dir {
            let Some(name) = file_name.to_str() else {
                log_error!(self.ctx, "[sysfs] invalid section name '{}'", path.display());
                continue;
            };

            let file = match File::open(&path) {
                Ok(file) => file,
                Err(e) => {
                    log_error!(self.ctx, "[sysfs] could not open '{}': {}", path.display(), e);
                    continue;
                }
            };

            let address = read_limited(file, &path, NUMBER_MAX).and_then(|buf| {
                parse_ulong_hex(&buf).ok_or(Error::Malformed {
                    path: path.clone(),
                    content: buf,
                })
            });

            match address {
                Ok(address) => list.push(Section {
                    name: name.to_owned(),
                    address,
                }),
                Err(e) => {
                    log_error!(
                        self.ctx,
                        "[sysfs] could not read long from '{}': {}",
                        path.display(),
                        e
                    );
                }
            }
        }
        list
    }

    /// `<모듈 디렉토리>/<sub>`의 엔트리 (경로, 파일명). 열기 실패는 로그 후 `None`.
    fn scan_dir(&self, sub: &str) -> Option<Vec<(PathBuf, std::ffi::OsString)>> {
        let dir = match self.sysfs_dir() {
            Ok(dir) => dir.join(sub),
            Err(e) => {
                log_error!(self.ctx, "[sysfs] no name for {}: {}", self.display_name(), e);
                return None;
            }
        };

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                log_error!(self.ctx, "[sysfs] could not open '{}': {}", dir.display(), e);
                return None;
            }
        };

        let mut out = Vec::new();
        for entry in entries {
            match entry {
                Ok(entry) => out.push((entry.path(), entry.file_name())),
                Err(e) => {
                    log_error!(self.ctx, "[sysfs] could not read '{}': {}", dir.display(), e);
                }
            }
        }
        Some(out)
    }
}

/// 최대 `limit` 바이트를 문자열로 읽음
fn read_limited(file: File, path: &Path, limit: u64) -> Result<String> {
    let mut buf = String::new();
    file.take(limit)
        .read_to_string(&mut buf)
        .map_err(|e| Error::io(path, e))?;
    Ok(buf)
}

/// 끝의 개행 하나를 뗀 숫자 부분
fn number_digits(buf: &str) -> Option<&str> {
    let s = buf.strip_suffix('\n').unwrap_or(buf).trim_start();
    (!s.is_empty()).then_some(s)
}

/// 10진 정수 한 줄
fn parse_long(buf: &str) -> Option<i64> {
    number_digits(buf)?.parse().ok()
}

/// 16진 주소 한 줄 (`0x` 접두사 허용)
fn parse_ulong_hex(buf: &str) -> Option<u64> {
    let s = number_digits(buf)?;
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u64::from_str_radix(digits, 16).ok()
}
