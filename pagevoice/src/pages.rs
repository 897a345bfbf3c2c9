//! Page range arguments.

/// A 1-based, inclusive page span given on the command line.
///
/// Open ends are filled with 1 and `usize::MAX`; extraction clamps them to
/// the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpan {
    pub start: usize,
    pub end: usize,
}

/// Parse `N`, `A-B`, `A-` (to the last page) or `-B` (from the first page).
pub fn parse_page_span(s: &str) -> Result<PageSpan, String> {
    let s = s.trim();
    let page = |p: &str| -> Result<usize, String> {
        p.trim()
            .parse()
            .map_err(|_| format!("Invalid page number: '{}'", p.trim()))
    };

    let span = match s.split_once('-') {
        None => {
            let n = page(s)?;
            PageSpan { start: n, end: n }
        }
        Some(("", "")) => return Err("Page range needs at least one page number".to_string()),
        Some((start, "")) => PageSpan {
            start: page(start)?,
            end: usize::MAX,
        },
        Some(("", end)) => PageSpan {
            start: 1,
            end: page(end)?,
        },
        Some((start, end)) => PageSpan {
            start: page(start)?,
            end: page(end)?,
        },
    };

    Ok(span)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_page() {
        assert_eq!(parse_page_span("4"), Ok(PageSpan { start: 4, end: 4 }));
    }

    #[test]
    fn test_closed_range() {
        assert_eq!(parse_page_span("2-7"), Ok(PageSpan { start: 2, end: 7 }));
        assert_eq!(parse_page_span(" 2 - 7 "), Ok(PageSpan { start: 2, end: 7 }));
    }

    #[test]
    fn test_open_ranges() {
        assert_eq!(
            parse_page_span("3-"),
            Ok(PageSpan {
                start: 3,
                end: usize::MAX
            })
        );
        assert_eq!(parse_page_span("-5"), Ok(PageSpan { start: 1, end: 5 }));
    }

    #[test]
    fn test_reversed_range_is_left_to_extraction() {
        assert_eq!(parse_page_span("5-3"), Ok(PageSpan { start: 5, end: 3 }));
    }

    #[test]
    fn test_invalid() {
        assert!(parse_page_span("-").is_err());
        assert!(parse_page_span("").is_err());
        assert!(parse_page_span("a-b").is_err());
        assert!(parse_page_span("1-2-3").is_err());
    }
}
