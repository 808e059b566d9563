//! 별칭 → 모듈 조회 체인
//!
//! 조회 순서 (처음으로 결과가 나온 소스에서 종료, 소스 간 병합 없음):
//! 1. 설정 파일 alias (관리자 지정, 나머지 전부를 덮어씀)
//! 2. modules.dep (별칭을 모듈 이름 그대로 취급)
//! 3. modules.symbols (`symbol:` 별칭)
//! 4. modules.alias (와일드카드 패턴)
//!
//! 소스 에러는 다음 소스로 넘어가지 않고 즉시 전파한다.

use std::sync::Arc;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::{log_debug, log_error};

use super::Module;

type LookupFn = fn(&Arc<Context>, &str, &mut Vec<Module>) -> Result<()>;

/// 우선순위 순 조회 소스
const SOURCES: [(&str, LookupFn); 4] = [
    ("config", lookup_config),
    ("modules.dep", lookup_moddep),
    ("modules.symbols", lookup_symbols),
    ("modules.alias", lookup_aliases),
];

impl Module {
    /// 별칭을 모듈 목록으로 해석해 `list`에 채운다.
    ///
    /// `list`는 비어 있어야 한다. 아무 소스에도 없으면 빈 목록으로 성공.
    /// 실패 시 `list`는 비워진다.
    pub fn new_from_lookup(ctx: &Arc<Context>, alias: &str, list: &mut Vec<Module>) -> Result<()> {
        if alias.is_empty() {
            return Err(Error::InvalidArgument);
        }

        if !list.is_empty() {
            log_error!(ctx, "[lookup] An empty list is needed to create lookup");
            return Err(Error::Unsupported("lookup into a non-empty list"));
        }

        for (source, lookup) in SOURCES {
            if let Err(e) = lookup(ctx, alias, list) {
                log_error!(ctx, "[lookup] {} lookup of '{}' failed: {}", source, alias, e);
                Module::unref_list(std::mem::take(list));
                return Err(e);
            }

            if !list.is_empty() {
                log_debug!(
                    ctx,
                    "[lookup] '{}' resolved by {} to {} module(s)",
                    alias,
                    source,
                    list.len()
                );
                return Ok(());
            }
        }

        log_debug!(ctx, "[lookup] no module for '{}'", alias);
        Ok(())
    }

    /// [`Module::new_from_lookup`]의 편의 형태
    pub fn lookup(ctx: &Arc<Context>, alias: &str) -> Result<Vec<Module>> {
        let mut list = Vec::new();
        Self::new_from_lookup(ctx, alias, &mut list)?;
        Ok(list)
    }
}

fn push_by_name(ctx: &Arc<Context>, names: Vec<String>, list: &mut Vec<Module>) -> Result<()> {
    for name in names {
        list.push(Module::new_from_name(ctx, &name)?);
    }
    Ok(())
}

fn lookup_config(ctx: &Arc<Context>, alias: &str, list: &mut Vec<Module>) -> Result<()> {
    push_by_name(ctx, ctx.config().lookup_alias(alias), list)
}

fn lookup_moddep(ctx: &Arc<Context>, alias: &str, list: &mut Vec<Module>) -> Result<()> {
    let Some(record) = ctx.index().dependency_line(alias)? else {
        return Ok(());
    };

    let module = Module::new_from_name(ctx, alias)?;
    module.set_path(ctx.config().dirname.join(&record.path));
    module.parse_dependency_line(&record.line)?;
    list.push(module);
    Ok(())
}

fn lookup_symbols(ctx: &Arc<Context>, alias: &str, list: &mut Vec<Module>) -> Result<()> {
    push_by_name(ctx, ctx.index().symbol_modules(alias)?, list)
}

fn lookup_aliases(ctx: &Arc<Context>, alias: &str, list: &mut Vec<Module>) -> Result<()> {
    push_by_name(ctx, ctx.index().alias_modules(alias)?, list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::index::TextIndex;
    use crate::testutil::{FailingIndex, context_with};

    fn names(list: &[Module]) -> Vec<String> {
        list.iter().map(|m| m.name().unwrap()).collect()
    }

    fn index() -> TextIndex {
        let mut index = TextIndex::default();
        index
            .parse_dep(
                "modules.dep".as_ref(),
                "kernel/drivers/net/e1000e.ko: kernel/drivers/ptp/ptp.ko kernel/drivers/pps/pps_core.ko\n\
                 kernel/drivers/ptp/ptp.ko: kernel/drivers/pps/pps_core.ko\n\
                 kernel/drivers/pps/pps_core.ko:\n",
            )
            .unwrap();
        index
            .parse_symbols(
                "modules.symbols".as_ref(),
                "alias symbol:ptp_clock_register ptp\n",
            )
            .unwrap();
        index
            .parse_aliases(
                "modules.alias".as_ref(),
                "alias pci:v00008086d000010D3sv*sd*bc*sc*i* e1000e\n\
                 alias fs-ext4 ext4\n",
            )
            .unwrap();
        index
    }

    #[test]
    fn test_config_overrides_everything() {
        let mut config = Config::default();
        config.add_alias("fs-ext4", "my_ext4");
        let (ctx, _log) = context_with(config, Box::new(index()));

        let list = Module::lookup(&ctx, "fs-ext4").unwrap();
        assert_eq!(names(&list), ["my_ext4"]);
    }

    #[test]
    fn test_moddep_resolves_path_and_dependencies() {
        let config = Config::default().with_dirname("/lib/modules/6.1.0");
        let (ctx, _log) = context_with(config, Box::new(index()));

        let list = Module::lookup(&ctx, "e1000e").unwrap();
        assert_eq!(list.len(), 1);
        let module = &list[0];
        assert_eq!(module.name().as_deref(), Some("e1000e"));
        assert_eq!(
            module.path().unwrap(),
            std::path::Path::new("/lib/modules/6.1.0/kernel/drivers/net/e1000e.ko")
        );
        let deps = module.dependencies().unwrap();
        assert_eq!(names(&deps), ["ptp", "pps_core"]);
    }

    #[test]
    fn test_symbol_and_alias_sources() {
        let (ctx, _log) = context_with(Config::default(), Box::new(index()));

        let list = Module::lookup(&ctx, "symbol:ptp_clock_register").unwrap();
        assert_eq!(names(&list), ["ptp"]);

        let list = Module::lookup(&ctx, "pci:v00008086d000010D3sv00001028sd00000000bc02sc00i00").unwrap();
        assert_eq!(names(&list), ["e1000e"]);
    }

    #[test]
    fn test_nothing_found_is_empty_success() {
        let (ctx, _log) = context_with(Config::default(), Box::new(index()));
        let list = Module::lookup(&ctx, "nonexistent_xyz").unwrap();
        assert!(list.is_empty());
        assert_eq!(ctx.live_modules(), 0);
    }

    #[test]
    fn test_non_empty_list_rejected() {
        let (ctx, log) = context_with(Config::default(), Box::new(index()));
        let mut list = vec![Module::new_from_name(&ctx, "stale").unwrap()];

        let err = Module::new_from_lookup(&ctx, "e1000e", &mut list).unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
        assert_eq!(err.errno(), -libc::ENOSYS);
        assert!(log.contains("empty list"));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_source_error_propagates_without_fallthrough() {
        let (ctx, _log) = context_with(Config::default(), Box::new(FailingIndex));

        let mut list = Vec::new();
        let err = Module::new_from_lookup(&ctx, "anything", &mut list).unwrap_err();
        assert!(matches!(err, Error::Index { .. }));
        assert!(list.is_empty());
        assert_eq!(ctx.live_modules(), 0);
    }
}
