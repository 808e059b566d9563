//! 모듈 인덱스
//!
//! depmod가 만드는 텍스트 인덱스 파일을 읽는다:
//! - `modules.dep`: `kernel/a.ko: kernel/b.ko kernel/c.ko`
//! - `modules.symbols`: `alias symbol:<심볼> <모듈>`
//! - `modules.alias`: `alias <패턴> <모듈>`
//!
//! [`ModuleIndex`] trait 뒤에 숨겨서 다른 형식(바이너리 인덱스 등)이나
//! 테스트용 구현으로 바꿀 수 있다.

pub mod pattern;

pub use pattern::fnmatch;

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::module::name;

pub const MODULES_DEP: &str = "modules.dep";
pub const MODULES_SYMBOLS: &str = "modules.symbols";
pub const MODULES_ALIAS: &str = "modules.alias";

/// 심볼 별칭 접두사
const SYMBOL_PREFIX: &str = "symbol:";

/// modules.dep 한 줄
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepRecord {
    /// 인덱스 디렉토리 기준 모듈 파일 경로
    pub path: String,
    /// 원본 라인 (`path: dep1 dep2 ...`)
    pub line: String,
}

/// 별칭 조회 소스 2~4
pub trait ModuleIndex: Send + Sync {
    /// 모듈 이름으로 의존성 레코드 조회
    fn dependency_line(&self, name: &str) -> Result<Option<DepRecord>>;

    /// `symbol:<이름>` 별칭을 제공하는 모듈들
    fn symbol_modules(&self, alias: &str) -> Result<Vec<String>>;

    /// 패턴 별칭과 일치하는 모듈들
    fn alias_modules(&self, alias: &str) -> Result<Vec<String>>;
}

/// 텍스트 인덱스 (메모리에 전부 적재)
#[derive(Debug, Default, Clone)]
pub struct TextIndex {
    deps: HashMap<String, DepRecord>,
    symbols: HashMap<String, Vec<String>>,
    aliases: Vec<(String, String)>,
}

impl TextIndex {
    /// 디렉토리에서 세 파일을 읽는다. 없는 파일은 빈 테이블.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut index = Self::default();

        let files: [(&str, fn(&mut Self, &Path, &str) -> Result<()>); 3] = [
            (MODULES_DEP, Self::parse_dep),
            (MODULES_SYMBOLS, Self::parse_symbols),
            (MODULES_ALIAS, Self::parse_aliases),
        ];

        for (file, parse) in files {
            let path = dir.join(file);
            if let Some(text) = read_optional(&path)? {
                parse(&mut index, &path, &text)?;
            }
        }

        Ok(index)
    }

    /// modules.dep 내용 추가. 키는 콜론 앞 경로의 정규화된 이름.
    pub fn parse_dep(&mut self, file: &Path, text: &str) -> Result<()> {
        for (lineno, line) in records(text) {
            let Some((path, _)) = line.split_once(':') else {
                return Err(index_error(file, lineno, "missing ':'"));
            };
            let path = path.trim();
            let key = name::modname_owned(path)
                .filter(|n| !n.is_empty())
                .ok_or_else(|| index_error(file, lineno, "invalid module path"))?;

            self.deps.insert(
                key,
                DepRecord {
                    path: path.to_owned(),
                    line: line.to_owned(),
                },
            );
        }
        Ok(())
    }

    /// modules.symbols 내용 추가
    pub fn parse_symbols(&mut self, file: &Path, text: &str) -> Result<()> {
        for (lineno, line) in records(text) {
            if let Some((symbol, module)) = parse_alias_directive(file, lineno, line)? {
                self.symbols.entry(symbol).or_default().push(module);
            }
        }
        Ok(())
    }

    /// modules.alias 내용 추가
    pub fn parse_aliases(&mut self, file: &Path, text: &str) -> Result<()> {
        for (lineno, line) in records(text) {
            if let Some(entry) = parse_alias_directive(file, lineno, line)? {
                self.aliases.push(entry);
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.deps.is_empty() && self.symbols.is_empty() && self.aliases.is_empty()
    }
}

impl ModuleIndex for TextIndex {
    fn dependency_line(&self, name: &str) -> Result<Option<DepRecord>> {
        Ok(self.deps.get(name).cloned())
    }

    fn symbol_modules(&self, alias: &str) -> Result<Vec<String>> {
        if !alias.starts_with(SYMBOL_PREFIX) {
            return Ok(Vec::new());
        }
        Ok(self.symbols.get(alias).cloned().unwrap_or_default())
    }

    fn alias_modules(&self, alias: &str) -> Result<Vec<String>> {
        Ok(self
            .aliases
            .iter()
            .filter(|(pattern, _)| fnmatch(pattern, alias))
            .map(|(_, module)| module.clone())
            .collect())
    }
}

/// `alias <패턴> <모듈>` 한 줄. 다른 지시어는 `None`.
pub(crate) fn parse_alias_directive(
    file: &Path,
    lineno: usize,
    line: &str,
) -> Result<Option<(String, String)>> {
    let mut fields = line.split_whitespace();
    if fields.next() != Some("alias") {
        return Ok(None);
    }

    match (fields.next(), fields.next()) {
        (Some(pattern), Some(module)) => {
            let module = name::modname_owned(module)
                .ok_or_else(|| index_error(file, lineno, "invalid module name"))?;
            Ok(Some((pattern.to_owned(), module)))
        }
        _ => Err(index_error(file, lineno, "alias needs a pattern and a module")),
    }
}

/// 주석과 빈 줄을 뺀 (줄 번호, 내용)
pub(crate) fn records(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim_end()))
        .filter(|(_, line)| {
            let line = line.trim_start();
            !line.is_empty() && !line.starts_with('#')
        })
}

pub(crate) fn index_error(file: &Path, line: usize, reason: &'static str) -> Error {
    Error::Index {
        file: PathBuf::from(file),
        line,
        reason,
    }
}

/// 파일이 없으면 `None`
pub(crate) fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(path, e)),
    }
}
