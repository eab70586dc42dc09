//! Byte-pattern search shared by the sniffer and the scanners.

/// Find the first occurrence of `pattern` in `haystack` at or after `start`.
///
/// Returns the absolute offset of the match. Empty patterns never match.
pub(crate) fn find_pattern(haystack: &[u8], pattern: &[u8], start: usize) -> Option<usize> {
    if pattern.is_empty() || start >= haystack.len() {
        return None;
    }

    haystack[start..]
        .windows(pattern.len())
        .position(|window| window == pattern)
        .map(|offset| start + offset)
}

#[cfg(test)]
mod tests {
    use super::find_pattern;

    #[test]
    fn finds_pattern_at_offset() {
        let data = [0u8, 1, 2, 3, 4, 2, 3];
        assert_eq!(find_pattern(&data, &[2, 3], 0), Some(2));
        assert_eq!(find_pattern(&data, &[2, 3], 3), Some(5));
        assert_eq!(find_pattern(&data, &[2, 3], 6), None);
    }

    #[test]
    fn empty_pattern_never_matches() {
        assert_eq!(find_pattern(&[1, 2, 3], &[], 0), None);
    }

    #[test]
    fn start_past_end_is_none() {
        assert_eq!(find_pattern(&[1, 2], &[1], 5), None);
    }

    #[test]
    fn pattern_longer_than_haystack_is_none() {
        assert_eq!(find_pattern(&[1, 2], &[1, 2, 3], 0), None);
    }
}
