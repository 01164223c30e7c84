//! Page specification parsing
//!
//! A page spec is a comma-separated list of 1-based page numbers and
//! inclusive `start-end` ranges, e.g. `"1-3,5,7-9"`. Whitespace around
//! tokens and around the dash is ignored; empty tokens are skipped.
//!
//! A spec may name at most [`MAX_SPEC_PAGES`] pages. Wider ranges such as
//! `"1-4000000000"` are rejected as invalid tokens instead of being expanded.
//! A range counts in full toward the limit even where it overlaps earlier tokens.

use crate::error::{Result, ScrawlError};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Upper bound on the number of pages one spec can expand to
pub const MAX_SPEC_PAGES: usize = 100_000;

static RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s*-\s*(\d+)$").expect("valid regex"));
static SINGLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(-?\d+)$").expect("valid regex"));

/// Parse a page spec into an ordered set of 1-based page numbers
pub fn parse_page_spec(spec: &str) -> Result<BTreeSet<u32>> {
    let mut pages = BTreeSet::new();

    for part in spec.split(',').map(str::trim) {
        if part.is_empty() {
            continue;
        }

        if let Some(captures) = RANGE.captures(part) {
            let start = parse_number(&captures[1], part)?;
            let end = parse_number(&captures[2], part)?;
            if start > end {
                return Err(ScrawlError::InvertedRange { start, end });
            }
            if start < 1 {
                return Err(ScrawlError::NonPositivePage(start));
            }
            if (end - start + 1) as usize > MAX_SPEC_PAGES.saturating_sub(pages.len()) {
                return Err(ScrawlError::InvalidPageToken(part.to_string()));
            }
            pages.extend(to_page(start, part)?..=to_page(end, part)?);
        } else if let Some(captures) = SINGLE.captures(part) {
            let page = parse_number(&captures[1], part)?;
            if page < 1 {
                return Err(ScrawlError::NonPositivePage(page));
            }
            pages.insert(to_page(page, part)?);
        } else {
            return Err(ScrawlError::InvalidPageToken(part.to_string()));
        }
    }

    if pages.is_empty() {
        return Err(ScrawlError::EmptyPageSpec);
    }
    Ok(pages)
}

fn parse_number(digits: &str, token: &str) -> Result<i64> {
    digits
        .parse::<i64>()
        .map_err(|_| ScrawlError::InvalidPageToken(token.to_string()))
}

fn to_page(value: i64, token: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| ScrawlError::InvalidPageToken(token.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(spec: &str) -> Vec<u32> {
        parse_page_spec(spec).unwrap().into_iter().collect()
    }

    #[test]
    fn test_single_page() {
        assert_eq!(pages("1"), vec![1]);
    }

    #[test]
    fn test_range() {
        assert_eq!(pages("1-3"), vec![1, 2, 3]);
    }

    #[test]
    fn test_multiple_singles() {
        assert_eq!(pages("1,3,5"), vec![1, 3, 5]);
    }

    #[test]
    fn test_mixed() {
        assert_eq!(pages("1-3,5,7-9"), vec![1, 2, 3, 5, 7, 8, 9]);
    }

    #[test]
    fn test_whitespace_is_ignored() {
        assert_eq!(pages(" 1 - 3 , 5 "), vec![1, 2, 3, 5]);
    }

    #[test]
    fn test_overlaps_and_duplicates_collapse() {
        assert_eq!(pages("3,1-3,2"), vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_tokens_are_skipped() {
        assert_eq!(pages("1,,2,"), vec![1, 2]);
    }

    #[test]
    fn test_zero_page() {
        assert!(matches!(parse_page_spec("0"), Err(ScrawlError::NonPositivePage(0))));
    }

    #[test]
    fn test_negative_page() {
        assert!(matches!(parse_page_spec("-1"), Err(ScrawlError::NonPositivePage(-1))));
    }

    #[test]
    fn test_range_starting_at_zero() {
        assert!(matches!(parse_page_spec("0-3"), Err(ScrawlError::NonPositivePage(0))));
    }

    #[test]
    fn test_inverted_range() {
        assert!(matches!(
            parse_page_spec("5-3"),
            Err(ScrawlError::InvertedRange { start: 5, end: 3 })
        ));
    }

    #[test]
    fn test_invalid_token() {
        match parse_page_spec("abc") {
            Err(ScrawlError::InvalidPageToken(token)) => assert_eq!(token, "abc"),
            other => panic!("Expected InvalidPageToken, got {:?}", other),
        }
        assert!(matches!(parse_page_spec("1-"), Err(ScrawlError::InvalidPageToken(_))));
        assert!(matches!(parse_page_spec("1.5"), Err(ScrawlError::InvalidPageToken(_))));
    }

    #[test]
    fn test_empty_spec() {
        assert!(matches!(parse_page_spec(""), Err(ScrawlError::EmptyPageSpec)));
        assert!(matches!(parse_page_spec(" , "), Err(ScrawlError::EmptyPageSpec)));
    }

    #[test]
    fn test_huge_range_is_rejected() {
        match parse_page_spec("1-4000000000") {
            Err(ScrawlError::InvalidPageToken(token)) => assert_eq!(token, "1-4000000000"),
            other => panic!("Expected InvalidPageToken, got {:?}", other),
        }
    }

    #[test]
    fn test_page_limit_spans_tokens() {
        let widest = format!("1-{}", MAX_SPEC_PAGES);
        assert_eq!(parse_page_spec(&widest).unwrap().len(), MAX_SPEC_PAGES);

        let spec = format!("{},{}-{}", widest, MAX_SPEC_PAGES + 1, MAX_SPEC_PAGES + 2);
        assert!(matches!(
            parse_page_spec(&spec),
            Err(ScrawlError::InvalidPageToken(_))
        ));
    }

    #[test]
    fn test_out_of_range_number() {
        assert!(matches!(
            parse_page_spec("99999999999999999999"),
            Err(ScrawlError::InvalidPageToken(_))
        ));
    }
}
