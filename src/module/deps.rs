//! 의존성 라인 파싱
//!
//! `kernel/foo.ko: kernel/bar-baz.ko kernel/qux.ko` 한 줄을 의존성 모듈 핸들
//! 목록으로 변환한다. 각 의존성의 재귀적 해석은 해당 모듈이 조회될 때까지 미룬다.

use crate::error::{Error, Result};
use crate::{log_debug, log_error};

use super::registry::DepState;
use super::{Module, name};

impl Module {
    /// 의존성 라인을 파싱해 의존성 목록을 한 번만 설정한다.
    ///
    /// `:`가 없거나 뒤가 비어 있으면 의존성 0개. 이미 설정된(또는 설정 중인)
    /// 모듈에 다시 호출하면 기존 목록을 건드리지 않고 `AlreadyResolved`로 실패한다.
    /// 의존성 생성 실패 시 지금까지 만든 핸들을 모두 해제하고 미설정 상태로 되돌린다.
    pub fn parse_dependency_line(&self, line: &str) -> Result<usize> {
        self.begin_resolve()?;

        match self.build_dependencies(line) {
            Ok(list) => {
                let count = list.len();
                if let Some(entry) = self.ctx.modules_mut().get_mut(self.id) {
                    entry.deps = DepState::Resolved(list);
                }
                log_debug!(
                    self.ctx,
                    "[module] {} dependencies for {}",
                    count,
                    self.display_name()
                );
                Ok(count)
            }
            Err(e) => {
                if let Some(entry) = self.ctx.modules_mut().get_mut(self.id) {
                    entry.deps = DepState::Unresolved;
                }
                Err(e)
            }
        }
    }

    /// 의존성 목록이 설정되었는지
    pub fn dependencies_resolved(&self) -> bool {
        self.with_entry(|entry| matches!(entry.deps, DepState::Resolved(_)))
            .unwrap_or(false)
    }

    /// Unresolved → Resolving 전이 (원자적)
    fn begin_resolve(&self) -> Result<()> {
        let mut modules = self.ctx.modules_mut();
        let entry = modules.get_mut(self.id).ok_or(Error::InvalidArgument)?;

        match entry.deps {
            DepState::Unresolved => {
                entry.deps = DepState::Resolving;
                Ok(())
            }
            DepState::Resolving | DepState::Resolved(_) => {
                let module = entry.display_name();
                drop(modules);
                log_error!(
                    self.ctx,
                    "[module] dependencies of '{}' parsed twice",
                    module
                );
                Err(Error::AlreadyResolved { module })
            }
        }
    }

    fn build_dependencies(&self, line: &str) -> Result<Vec<Module>> {
        let Some((_, rest)) = line.split_once(':') else {
            return Ok(Vec::new());
        };

        let mut list = Vec::new();
        for token in rest
            .split(|c: char| c == ' ' || c == '\t' || c == '\n')
            .filter(|t| !t.is_empty())
        {
            let dep = name::modname(token)
                .ok_or(Error::InvalidArgument)
                .and_then(|modname| Module::new_from_name(&self.ctx, &modname));

            match dep {
                Ok(dep) => {
                    log_debug!(self.ctx, "[module] add dep: {}", token);
                    list.push(dep);
                }
                Err(e) => {
                    log_error!(
                        self.ctx,
                        "[module] could not create dependency '{}' of {}: {}",
                        token,
                        self.display_name(),
                        e
                    );
                    // list drop → 이미 만든 의존성 핸들 해제
                    return Err(e);
                }
            }
        }

        Ok(list)
    }
}
