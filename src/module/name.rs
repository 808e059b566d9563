//! 경로 → 모듈 이름 정규화
//!
//! `/lib/modules/foo-bar.ko` → `foo_bar`
//! - 디렉토리 제거
//! - 첫 번째 `.` 이후 제거
//! - `-` → `_`

use std::borrow::Cow;

/// 파일명 추출 (마지막 `/` 이후)
pub fn basename(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}

/// 정규화된 모듈 이름 (빌림 모드)
///
/// `-`가 없으면 입력을 그대로 빌려서 반환하고, 있을 때만 새로 할당한다.
/// 파일명 부분이 비어 있으면 `None`.
pub fn modname(path: &str) -> Option<Cow<'_, str>> {
    let base = basename(path);
    if base.is_empty() {
        return None;
    }

    let stem = match base.find('.') {
        Some(pos) => &base[..pos],
        None => base,
    };

    if stem.contains('-') {
        Some(Cow::Owned(stem.replace('-', "_")))
    } else {
        Some(Cow::Borrowed(stem))
    }
}

/// 정규화된 모듈 이름 (소유 모드)
pub fn modname_owned(path: &str) -> Option<String> {
    modname(path).map(Cow::into_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basename() {
        assert_eq!(basename("/lib/modules/foo.ko"), "foo.ko");
        assert_eq!(basename("foo.ko"), "foo.ko");
        assert_eq!(basename("/lib/modules/"), "");
    }

    #[test]
    fn test_modname() {
        assert_eq!(modname("/lib/modules/foo-bar.ko").as_deref(), Some("foo_bar"));
        assert_eq!(modname("kernel/fs/ext4.ko.xz").as_deref(), Some("ext4"));
        assert_eq!(modname("snd-hda-intel").as_deref(), Some("snd_hda_intel"));
        assert_eq!(modname("a-b.c-d").as_deref(), Some("a_b"));
        assert_eq!(modname("/lib/modules/"), None);
        assert_eq!(modname(""), None);
    }

    #[test]
    fn test_modname_borrows_when_possible() {
        let path = String::from("/lib/modules/qux.ko");
        assert!(matches!(modname(&path), Some(Cow::Borrowed("qux"))));
        assert!(matches!(modname("bar-baz"), Some(Cow::Owned(_))));
        assert_eq!(modname_owned("/x/y-z.ko"), Some(String::from("y_z")));
    }
}
