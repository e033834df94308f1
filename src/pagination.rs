//! Offset/size guard applied before any query is compiled.

use crate::constants::{MAX_OFFSET, MAX_PAGE_SIZE, MAX_RESULT_WINDOW};
use crate::{Result, SearchError};

/// A validated page window, ready to be placed into a compiled query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub from: u64,
    pub size: u64,
}

impl Page {
    /// Validates `offset`/`size` and converts them into an unsigned window.
    pub fn checked(offset: i64, size: i64) -> Result<Self> {
        validate(offset, size)?;
        Ok(Self {
            from: offset as u64,
            size: size as u64,
        })
    }
}

/// Accepts iff `0 <= offset <= 10000`, `0 <= size <= 250` and `offset + size <= 10000`.
pub fn validate(offset: i64, size: i64) -> Result<()> {
    let reason = if offset < 0 {
        Some("offset must not be negative")
    } else if size < 0 {
        Some("size must not be negative")
    } else if size > MAX_PAGE_SIZE {
        Some("size exceeds maximum page size")
    } else if offset > MAX_OFFSET {
        Some("offset exceeds maximum offset")
    } else if offset.saturating_add(size) > MAX_RESULT_WINDOW {
        Some("offset + size exceeds result window")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(SearchError::InvalidParams {
            offset,
            size,
            reason,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_cases() {
        assert!(validate(10_000, 0).is_ok());
        assert!(validate(9_999, 2).is_err());
        assert!(validate(0, 250).is_ok());
        assert!(validate(0, 251).is_err());
        assert!(validate(-1, 0).is_err());
        assert!(validate(0, -1).is_err());
        assert!(validate(10_001, 0).is_err());
        assert!(validate(9_750, 250).is_ok());
    }

    #[test]
    fn extreme_values_do_not_overflow() {
        assert!(validate(i64::MAX, i64::MAX).is_err());
        assert!(validate(i64::MIN, 0).is_err());
    }

    #[test]
    fn guard_matches_closed_form_on_a_grid() {
        for offset in (-2..=10_002).step_by(97) {
            for size in -2..=252 {
                let expected = (0..=10_000).contains(&offset)
                    && (0..=250).contains(&size)
                    && offset + size <= 10_000;
                assert_eq!(
                    validate(offset, size).is_ok(),
                    expected,
                    "offset={offset} size={size}"
                );
            }
        }
    }

    #[test]
    fn checked_page_converts() {
        let page = Page::checked(40, 25).unwrap();
        assert_eq!(page, Page { from: 40, size: 25 });

        let err = Page::checked(0, 251).unwrap_err();
        assert!(matches!(err, SearchError::InvalidParams { size: 251, .. }));
    }
}
