//! 셸 와일드카드 매칭 (alias 패턴용)
//!
//! - `*`: 0개 이상 임의 문자
//! - `?`: 임의 문자 1개
//! - `[abc]`, `[a-z]`, `[!x]`/`[^x]`: 문자 클래스
//! - `\x`: 이스케이프

/// `pattern`이 `text` 전체와 일치하는지
pub fn fnmatch(pattern: &str, text: &str) -> bool {
    matches(pattern.as_bytes(), text.as_bytes())
}

fn matches(pat: &[u8], text: &[u8]) -> bool {
    let (mut p, mut t) = (0, 0);
    // 마지막 `*` 직후 패턴 위치와, 그 `*`가 흡수한 텍스트 끝
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pat.len() && pat[p] == b'*' {
            p += 1;
            star = Some((p, t));
            continue;
        }

        if p < pat.len() {
            let (ok, next) = single(pat, p, text[t]);
            if ok {
                p = next;
                t += 1;
                continue;
            }
        }

        // 불일치: `*`가 한 글자 더 흡수하도록 되돌림
        match star {
            Some((sp, st)) => {
                p = sp;
                t = st + 1;
                star = Some((sp, st + 1));
            }
            None => return false,
        }
    }

    while p < pat.len() && pat[p] == b'*' {
        p += 1;
    }
    p == pat.len()
}

/// `pat[p]`에서 시작하는 한 글자 패턴과 `c` 비교 → (일치 여부, 다음 패턴 위치)
fn single(pat: &[u8], p: usize, c: u8) -> (bool, usize) {
    match pat[p] {
        b'?' => (true, p + 1),
        b'[' => class(pat, p + 1, c).unwrap_or((c == b'[', p + 1)),
        b'\\' if p + 1 < pat.len() => (pat[p + 1] == c, p + 2),
        b => (b == c, p + 1),
    }
}

/// `[` 다음부터 클래스 해석. 닫는 `]`가 없으면 `None` (리터럴 `[` 취급)
fn class(pat: &[u8], mut i: usize, c: u8) -> Option<(bool, usize)> {
    let negate = matches!(pat.get(i), Some(b'!') | Some(b'^'));
    if negate {
        i += 1;
    }

    let mut found = false;
    let mut first = true;
    loop {
        let lo = *pat.get(i)?;
        if lo == b']' && !first {
            return Some((found != negate, i + 1));
        }
        first = false;

        match (pat.get(i + 1), pat.get(i + 2)) {
            (Some(b'-'), Some(&hi)) if hi != b']' => {
                if lo <= c && c <= hi {
                    found = true;
                }
                i += 3;
            }
            _ => {
                if lo == c {
                    found = true;
                }
                i += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_and_wildcards() {
        assert!(fnmatch("e1000e", "e1000e"));
        assert!(!fnmatch("e1000e", "e1000"));
        assert!(fnmatch("snd-*", "snd-hda"));
        assert!(fnmatch("*", ""));
        assert!(fnmatch("a?c", "abc"));
        assert!(!fnmatch("a?c", "ac"));
        assert!(fnmatch("*sv*sd*", "pci:v1sv2sd3"));
        assert!(!fnmatch("*x", "abc"));
    }

    #[test]
    fn test_modalias_pattern() {
        let pat = "pci:v00008086d000010D3sv*sd*bc*sc*i*";
        assert!(fnmatch(pat, "pci:v00008086d000010D3sv00001028sd00000000bc02sc00i00"));
        assert!(!fnmatch(pat, "pci:v00008086d000010D4sv00001028sd00000000bc02sc00i00"));
    }

    #[test]
    fn test_classes_and_escapes() {
        assert!(fnmatch("usb:v[0-9]*", "usb:v7abc"));
        assert!(!fnmatch("usb:v[0-9]*", "usb:vXabc"));
        assert!(fnmatch("[!a]x", "bx"));
        assert!(!fnmatch("[^a]x", "ax"));
        assert!(fnmatch("[]]", "]"));
        assert!(fnmatch("a\\*b", "a*b"));
        assert!(!fnmatch("a\\*b", "axb"));
        assert!(fnmatch("[abc", "[abc"));
    }
}
