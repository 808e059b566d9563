//! 모듈 엔트리 저장소 (arena)
//!
//! 컨텍스트마다 하나. 엔트리는 (index, generation) 핸들로 주소 지정되고
//! 엔트리별 원자적 참조 카운트를 가진다. 의존성 간선은 핸들 복사본이다.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::Module;

/// 안정적인 모듈 핸들 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId {
    index: u32,
    generation: u32,
}

/// 의존성 목록 상태
pub(crate) enum DepState {
    /// 아직 파싱 안 됨
    Unresolved,
    /// 파싱 진행 중 (다른 호출자는 거부)
    Resolving,
    /// 파싱 완료, 이후 불변
    Resolved(Vec<Module>),
}

/// 모듈 엔트리
pub(crate) struct ModuleEntry {
    pub name: Option<String>,
    pub path: Option<PathBuf>,
    pub deps: DepState,
    pub refcount: AtomicUsize,
}

impl ModuleEntry {
    pub fn new(name: Option<String>, path: Option<PathBuf>) -> Self {
        Self {
            name,
            path,
            deps: DepState::Unresolved,
            refcount: AtomicUsize::new(1),
        }
    }

    /// 로그용 표시 이름
    pub fn display_name(&self) -> String {
        match (&self.name, &self.path) {
            (Some(name), _) => name.clone(),
            (None, Some(path)) => path.display().to_string(),
            (None, None) => String::from("?"),
        }
    }

    pub fn get(&self) -> usize {
        self.refcount.fetch_add(1, Ordering::SeqCst)
    }

    /// 감소 전 값 반환
    pub fn put(&self) -> usize {
        self.refcount.fetch_sub(1, Ordering::SeqCst)
    }

    pub fn ref_count(&self) -> usize {
        self.refcount.load(Ordering::SeqCst)
    }
}

struct Slot {
    generation: u32,
    entry: Option<ModuleEntry>,
}

#[derive(Default)]
pub(crate) struct ModuleRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: ModuleEntry) -> ModuleId {
        self.live += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.entry = Some(entry);
            return ModuleId {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            entry: Some(entry),
        });
        ModuleId {
            index,
            generation: 0,
        }
    }

    pub fn get(&self, id: ModuleId) -> Option<&ModuleEntry> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    pub fn get_mut(&mut self, id: ModuleId) -> Option<&mut ModuleEntry> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_mut())
    }

    /// 엔트리 제거. 반환값은 락 밖에서 drop해야 한다 (의존성 핸들 해제가 다시 락을 잡음).
    pub fn remove(&mut self, id: ModuleId) -> Option<ModuleEntry> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let entry = slot.entry.take()?;
        self.free.push(id.index);
        self.live -= 1;
        Some(entry)
    }

    pub fn contains(&self, id: ModuleId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_remove_reuse() {
        let mut registry = ModuleRegistry::new();
        let a = registry.insert(ModuleEntry::new(Some("a".into()), None));
        let b = registry.insert(ModuleEntry::new(Some("b".into()), None));
        assert_eq!(registry.len(), 2);

        let removed = registry.remove(a).map(|e| e.display_name());
        assert_eq!(removed.as_deref(), Some("a"));
        assert!(!registry.contains(a));
        assert!(registry.remove(a).is_none());

        // 같은 슬롯 재사용 시 이전 핸들은 무효
        let c = registry.insert(ModuleEntry::new(None, Some("/x/c.ko".into())));
        assert_ne!(a, c);
        assert!(!registry.contains(a));
        assert_eq!(registry.get(c).map(|e| e.display_name()).as_deref(), Some("/x/c.ko"));
        assert!(registry.contains(b));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_entry_refcount() {
        let entry = ModuleEntry::new(Some("m".into()), None);
        assert_eq!(entry.ref_count(), 1);
        assert_eq!(entry.get(), 1);
        assert_eq!(entry.put(), 2);
        assert_eq!(entry.put(), 1);
        assert_eq!(entry.ref_count(), 0);
    }
}
