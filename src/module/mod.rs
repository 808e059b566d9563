//! 커널 모듈 엔티티
//!
//! - [`Module`]: 컨텍스트 저장소 엔트리에 대한 참조 카운트 핸들
//! - 의존성 라인 파싱 (deps)
//! - 별칭 조회 체인 (lookup)
//! - 커널 로드/언로드 (loader)
//! - sysfs 상태 조회 (sysfs)

pub mod deps;
pub mod loader;
pub mod lookup;
pub mod name;
pub(crate) mod registry;
pub mod sysfs;

pub use loader::{InsertFlags, RemoveFlags};
pub use registry::ModuleId;
pub use sysfs::{ModuleInitState, Section};

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::log_debug;

use registry::{DepState, ModuleEntry};

/// 모듈 핸들
///
/// 핸들 하나가 참조 하나다. `clone()`은 참조 카운트를 올리고 `drop`은 내린다.
/// 카운트가 0이 되면 엔트리(이름, 경로, 의존성 목록)가 해제되고, 의존성 목록의
/// 각 핸들도 함께 해제되어 해당 모듈의 카운트를 내린다.
pub struct Module {
    ctx: Arc<Context>,
    id: ModuleId,
}

impl Module {
    /// 이름으로 모듈 생성
    pub fn new_from_name(ctx: &Arc<Context>, name: &str) -> Result<Module> {
        if name.is_empty() {
            return Err(Error::InvalidArgument);
        }
        Ok(Self::register(ctx, ModuleEntry::new(Some(name.to_owned()), None)))
    }

    /// 존재하는 파일 경로로 모듈 생성. 이름은 처음 필요할 때 경로에서 유도한다.
    pub fn new_from_path(ctx: &Arc<Context>, path: impl AsRef<Path>) -> Result<Module> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(Error::InvalidArgument);
        }
        fs::metadata(path).map_err(|e| open_error(path, e))?;

        Ok(Self::register(
            ctx,
            ModuleEntry::new(None, Some(path.to_path_buf())),
        ))
    }

    fn register(ctx: &Arc<Context>, entry: ModuleEntry) -> Module {
        let id = ctx.modules_mut().insert(entry);
        Module {
            ctx: Arc::clone(ctx),
            id,
        }
    }

    /// 이미 참조 카운트가 올라간 엔트리를 핸들로 감싼다
    fn adopt(ctx: &Arc<Context>, id: ModuleId) -> Module {
        Module {
            ctx: Arc::clone(ctx),
            id,
        }
    }

    /// 참조 해제. 마지막 참조였으면 `true`.
    pub fn unref(self) -> bool {
        let ctx = Arc::clone(&self.ctx);
        let id = self.id;
        drop(self);
        !ctx.modules().contains(id)
    }

    /// 목록의 모든 핸들 해제
    pub fn unref_list(list: Vec<Module>) {
        drop(list);
    }

    pub fn id(&self) -> ModuleId {
        self.id
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.ctx
    }

    /// 현재 참조 카운트
    pub fn refcount(&self) -> usize {
        self.with_entry(|entry| entry.ref_count()).unwrap_or(0)
    }

    /// 생성 시 저장된 이름 (경로에서 유도하지 않음)
    pub fn name(&self) -> Option<String> {
        self.with_entry(|entry| entry.name.clone()).flatten()
    }

    /// 생성 시 저장된 경로
    pub fn path(&self) -> Option<PathBuf> {
        self.with_entry(|entry| entry.path.clone()).flatten()
    }

    /// 정규화된 모듈 이름. 이름이 없으면 경로에서 유도해 저장한다.
    pub fn modname(&self) -> Result<String> {
        let path = match self.with_entry(|e| (e.name.clone(), e.path.clone())) {
            Some((Some(name), _)) => return Ok(name),
            Some((None, Some(path))) => path,
            _ => return Err(Error::InvalidArgument),
        };

        let derived = path
            .to_str()
            .and_then(name::modname_owned)
            .ok_or(Error::InvalidArgument)?;

        let mut modules = self.ctx.modules_mut();
        let entry = modules.get_mut(self.id).ok_or(Error::InvalidArgument)?;
        Ok(entry.name.get_or_insert(derived).clone())
    }

    /// 의존성 목록 (파싱 전이면 `None`). 반환된 핸들은 각자 참조를 가진다.
    pub fn dependencies(&self) -> Option<Vec<Module>> {
        let ids: Vec<ModuleId> = {
            let modules = self.ctx.modules();
            let entry = modules.get(self.id)?;
            let DepState::Resolved(list) = &entry.deps else {
                return None;
            };
            list.iter()
                .filter_map(|dep| modules.get(dep.id).map(|e| (dep.id, e)))
                .map(|(id, e)| {
                    e.get();
                    id
                })
                .collect()
        };

        Some(ids.into_iter().map(|id| Self::adopt(&self.ctx, id)).collect())
    }

    pub(crate) fn set_path(&self, path: PathBuf) {
        if let Some(entry) = self.ctx.modules_mut().get_mut(self.id) {
            entry.path.get_or_insert(path);
        }
    }

    pub(crate) fn display_name(&self) -> String {
        self.with_entry(ModuleEntry::display_name)
            .unwrap_or_else(|| String::from("?"))
    }

    pub(crate) fn with_entry<R>(&self, f: impl FnOnce(&ModuleEntry) -> R) -> Option<R> {
        self.ctx.modules().get(self.id).map(f)
    }
}

impl Clone for Module {
    fn clone(&self) -> Self {
        self.with_entry(ModuleEntry::get);
        Self::adopt(&self.ctx, self.id)
    }
}

impl Drop for Module {
    fn drop(&mut self) {
        let last = self.with_entry(|entry| entry.put() == 1).unwrap_or(false);
        if !last {
            return;
        }

        // 락을 놓은 뒤 drop: 의존성 핸들 해제가 다시 저장소 락을 잡는다
        let entry = self.ctx.modules_mut().remove(self.id);
        if let Some(entry) = entry {
            log_debug!(self.ctx, "[module] '{}' released", entry.display_name());
            drop(entry);
        }
    }
}

impl PartialEq for Module {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.ctx, &other.ctx) && self.id == other.id
    }
}

impl Eq for Module {}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("path", &self.path())
            .finish()
    }
}

/// open/stat 실패 변환: ENOENT는 NotFound, 나머지는 Io
pub(crate) fn open_error(path: &Path, err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::NotFound {
        Error::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        Error::io(path, err)
    }
}
