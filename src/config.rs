//! 라이브러리 설정
//!
//! 컨텍스트 생성 시 한 번 넘겨받아 보관한다. 전역 설정은 없다.
//!
//! - sysfs 루트 (기본 `/sys`)
//! - 모듈 인덱스 디렉토리 (기본 `/lib/modules/<uname -r>`)
//! - 로그 레벨 (기본 ERROR, 환경 변수 `KMOD_LOG`로 변경)
//! - modprobe.d 스타일 alias 테이블

use std::ffi::CStr;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::index::{self, fnmatch};
use crate::log::LogLevel;

/// 로그 레벨 환경 변수
pub const LOG_ENV: &str = "KMOD_LOG";

const DEFAULT_SYSFS_ROOT: &str = "/sys";
const MODULES_ROOT: &str = "/lib/modules";

/// 설정 파일의 `alias <패턴> <모듈>` 한 줄
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    pub pattern: String,
    pub module: String,
}

/// 컨텍스트 설정
#[derive(Debug, Clone)]
pub struct Config {
    pub sysfs_root: PathBuf,
    pub dirname: PathBuf,
    pub log_level: LogLevel,
    pub aliases: Vec<AliasEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sysfs_root: PathBuf::from(DEFAULT_SYSFS_ROOT),
            dirname: default_dirname(),
            log_level: LogLevel::Error,
            aliases: Vec::new(),
        }
    }
}

impl Config {
    /// 기본값 + `KMOD_LOG`
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = std::env::var(LOG_ENV) {
            config.apply_log_env(&value);
        }
        config
    }

    fn apply_log_env(&mut self, value: &str) {
        if let Some(level) = LogLevel::from_str(value) {
            self.log_level = level;
        }
    }

    pub fn with_sysfs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.sysfs_root = root.into();
        self
    }

    pub fn with_dirname(mut self, dirname: impl Into<PathBuf>) -> Self {
        self.dirname = dirname.into();
        self
    }

    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    pub fn add_alias(&mut self, pattern: &str, module: &str) {
        self.aliases.push(AliasEntry {
            pattern: pattern.to_owned(),
            module: module.to_owned(),
        });
    }

    /// 설정 파일 내용에서 alias 줄만 읽는다. 다른 지시어는 무시.
    pub fn parse_aliases(&mut self, file: &Path, text: &str) -> Result<()> {
        for (lineno, line) in index::records(text) {
            if let Some((pattern, module)) = index::parse_alias_directive(file, lineno, line)? {
                self.aliases.push(AliasEntry { pattern, module });
            }
        }
        Ok(())
    }

    /// 디렉토리의 `*.conf` 파일을 이름 순으로 읽는다. 디렉토리가 없으면 무시.
    pub fn load_aliases_from(&mut self, dir: &Path) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(Error::io(dir, e)),
        };

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| Error::io(dir, e))?.path();
            if path.extension().is_some_and(|ext| ext == "conf") {
                files.push(path);
            }
        }
        files.sort();

        for path in files {
            if let Some(text) = index::read_optional(&path)? {
                self.parse_aliases(&path, &text)?;
            }
        }
        Ok(())
    }

    /// 별칭과 일치하는 모듈 이름들 (테이블 순서)
    pub fn lookup_alias(&self, alias: &str) -> Vec<String> {
        self.aliases
            .iter()
            .filter(|entry| fnmatch(&entry.pattern, alias))
            .map(|entry| entry.module.clone())
            .collect()
    }
}

/// `/lib/modules/<커널 릴리스>`
fn default_dirname() -> PathBuf {
    let root = PathBuf::from(MODULES_ROOT);
    match kernel_release() {
        Some(release) => root.join(release),
        None => root,
    }
}

fn kernel_release() -> Option<String> {
    let mut uts: libc::utsname = unsafe { std::mem::zeroed() };
    if unsafe { libc::uname(&mut uts) } != 0 {
        return None;
    }
    // release는 NUL 종료 보장
    let release = unsafe { CStr::from_ptr(uts.release.as_ptr()) };
    release.to_str().ok().map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.sysfs_root, Path::new("/sys"));
        assert!(config.dirname.starts_with("/lib/modules"));
        assert_eq!(config.log_level, LogLevel::Error);
        assert!(config.aliases.is_empty());
    }

    #[test]
    fn test_log_env_value() {
        let mut config = Config::default();
        config.apply_log_env("debug");
        assert_eq!(config.log_level, LogLevel::Debug);

        // 알 수 없는 값은 무시
        config.apply_log_env("verbose");
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_parse_aliases() {
        let mut config = Config::default();
        config
            .parse_aliases(
                Path::new("local.conf"),
                "# local overrides\n\
                 options snd-hda-intel model=auto\n\
                 alias char-major-10-* misc-dev\n\
                 \n\
                 blacklist pcspkr\n\
                 alias fs-ext4 ext4\n",
            )
            .unwrap();

        assert_eq!(config.aliases.len(), 2);
        assert_eq!(config.lookup_alias("char-major-10-200"), ["misc_dev"]);
        assert_eq!(config.lookup_alias("fs-ext4"), ["ext4"]);
        assert!(config.lookup_alias("fs-xfs").is_empty());
    }

    #[test]
    fn test_malformed_alias_names_line() {
        let mut config = Config::default();
        let err = config
            .parse_aliases(Path::new("bad.conf"), "\nalias only-pattern\n")
            .unwrap_err();
        assert!(matches!(err, Error::Index { line: 2, .. }));
    }

    #[test]
    fn test_load_aliases_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("20-b.conf"), "alias net-pf-* second\n").unwrap();
        fs::write(dir.path().join("10-a.conf"), "alias net-pf-* first\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "alias net-pf-* ignored\n").unwrap();

        let mut config = Config::default();
        config.load_aliases_from(dir.path()).unwrap();
        assert_eq!(config.lookup_alias("net-pf-10"), ["first", "second"]);

        config
            .load_aliases_from(&dir.path().join("missing"))
            .unwrap();
        assert_eq!(config.aliases.len(), 2);
    }
}
