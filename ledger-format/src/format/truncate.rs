//! Width-aware text elision
//!
//! Lengths are counted in characters, so multi-byte payees and account
//! names are never split inside a code point.

use crate::config::ElisionStyle;

const ELLIPSIS: &str = "..";

/// Shortens text to a column width according to an [`ElisionStyle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Truncator {
    style: ElisionStyle,
    abbrev_length: usize,
}

impl Default for Truncator {
    fn default() -> Self {
        Self::new(ElisionStyle::default(), 2)
    }
}

impl Truncator {
    /// Create a truncator
    pub fn new(style: ElisionStyle, abbrev_length: usize) -> Self {
        Self { style, abbrev_length }
    }

    /// Shorten `text` to at most `width` characters
    ///
    /// Text that already fits is returned unchanged. `is_path` marks a
    /// colon-separated account path, which [`ElisionStyle::Abbreviate`]
    /// shortens segment by segment; every other input falls back to a
    /// trailing cut under that style.
    pub fn truncate(&self, text: &str, width: usize, is_path: bool) -> String {
        let chars: Vec<char> = text.chars().collect();
        if chars.len() <= width {
            return text.to_string();
        }
        if width < ELLIPSIS.len() {
            return ELLIPSIS.chars().take(width).collect();
        }

        match self.style {
            ElisionStyle::TruncateLeading => truncate_leading(&chars, width),
            ElisionStyle::TruncateMiddle => truncate_middle(&chars, width),
            ElisionStyle::Abbreviate if is_path => self.abbreviate(text, chars.len(), width),
            ElisionStyle::Abbreviate | ElisionStyle::TruncateTrailing => {
                truncate_trailing(&chars, width)
            }
        }
    }

    fn abbreviate(&self, text: &str, len: usize, width: usize) -> String {
        let segments: Vec<&str> = text.split(':').collect();
        let last = segments.len() - 1;

        let mut result = String::with_capacity(text.len());
        let mut newlen = len;
        for (i, segment) in segments.iter().enumerate() {
            if i == last {
                result.push_str(segment);
                break;
            }
            if newlen > width {
                let seg_len = segment.chars().count();
                let kept = seg_len.min(self.abbrev_length);
                result.extend(segment.chars().take(kept));
                newlen -= seg_len - kept;
            } else {
                result.push_str(segment);
            }
            result.push(':');
        }

        if newlen > width {
            let chars: Vec<char> = result.chars().collect();
            truncate_leading(&chars, width)
        } else {
            result
        }
    }
}

fn truncate_leading(chars: &[char], width: usize) -> String {
    let mut kept = chars[chars.len() - width..].to_vec();
    kept[0] = '.';
    kept[1] = '.';
    kept.into_iter().collect()
}

fn truncate_middle(chars: &[char], width: usize) -> String {
    let head = width / 2;
    let tail = width - head;
    let mut kept: Vec<char> = chars[..head].to_vec();
    kept.extend_from_slice(&chars[chars.len() - tail..]);
    kept[head - 1] = '.';
    kept[head] = '.';
    kept.into_iter().collect()
}

fn truncate_trailing(chars: &[char], width: usize) -> String {
    let mut kept: String = chars[..width - ELLIPSIS.len()].iter().collect();
    kept.push_str(ELLIPSIS);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn truncator(style: ElisionStyle) -> Truncator {
        Truncator::new(style, 2)
    }

    #[test]
    fn test_fits_unchanged() {
        let t = truncator(ElisionStyle::TruncateLeading);
        assert_eq!(t.truncate("Cash", 4, false), "Cash");
        assert_eq!(t.truncate("Cash", 10, true), "Cash");
    }

    #[test]
    fn test_trailing() {
        let t = truncator(ElisionStyle::TruncateTrailing);
        assert_eq!(t.truncate("Supermarket", 8, false), "Superm..");
    }

    #[test]
    fn test_leading() {
        let t = truncator(ElisionStyle::TruncateLeading);
        assert_eq!(t.truncate("Supermarket", 8, false), "..market");
    }

    #[test]
    fn test_middle() {
        let t = truncator(ElisionStyle::TruncateMiddle);
        assert_eq!(t.truncate("Supermarket", 8, false), "Sup..ket");
        assert_eq!(t.truncate("Supermarket", 7, false), "Su..ket");
    }

    #[test]
    fn test_abbreviate_path() {
        let t = truncator(ElisionStyle::Abbreviate);
        assert_eq!(t.truncate("Assets:Current:Checking", 10, true), "..Checking");
        assert_eq!(t.truncate("Assets:Current:Checking", 14, true), "As:Cu:Checking");
        assert_eq!(t.truncate("Assets:Current:Checking", 19, true), "As:Current:Checking");
    }

    #[test]
    fn test_abbreviate_without_path_trails() {
        let t = truncator(ElisionStyle::Abbreviate);
        assert_eq!(t.truncate("Supermarket", 8, false), "Superm..");
    }

    #[test]
    fn test_abbreviate_short_segments() {
        let t = Truncator::new(ElisionStyle::Abbreviate, 3);
        assert_eq!(t.truncate("A:Bank:Savings", 13, true), "A:Ban:Savings");
        assert_eq!(t.truncate("A:Bank:Savings", 12, true), "..an:Savings");
    }

    #[test]
    fn test_narrow_widths() {
        let t = truncator(ElisionStyle::TruncateTrailing);
        assert_eq!(t.truncate("Groceries", 1, false), ".");
        assert_eq!(t.truncate("Groceries", 0, false), "");
        assert_eq!(t.truncate("Groceries", 2, false), "..");
    }

    #[test]
    fn test_multibyte() {
        let t = truncator(ElisionStyle::TruncateTrailing);
        assert_eq!(t.truncate("Café Crème", 6, false), "Café..");
    }

    fn style() -> impl Strategy<Value = ElisionStyle> {
        prop_oneof![
            Just(ElisionStyle::TruncateLeading),
            Just(ElisionStyle::TruncateMiddle),
            Just(ElisionStyle::TruncateTrailing),
            Just(ElisionStyle::Abbreviate),
        ]
    }

    proptest! {
        #[test]
        fn prop_length_is_min_of_text_and_width(
            style in style(),
            text in "[a-zA-Z: ]{0,40}",
            width in 2usize..50,
        ) {
            let result = truncator(style).truncate(&text, width, false);
            prop_assert_eq!(result.chars().count(), text.chars().count().min(width));
        }

        #[test]
        fn prop_abbreviated_paths_fit(
            segments in proptest::collection::vec("[A-Za-z]{1,12}", 1..6),
            width in 2usize..40,
        ) {
            let path = segments.join(":");
            let result = truncator(ElisionStyle::Abbreviate).truncate(&path, width, true);
            prop_assert!(result.chars().count() <= width);
            let last = segments.last().map(String::as_str).unwrap_or("");
            if result.chars().count() == path.chars().count() {
                prop_assert_eq!(&result, &path);
            } else if !result.starts_with("..") {
                prop_assert!(result.ends_with(last));
            }
        }
    }
}
