use crate::error::{CropError, Result};
use std::collections::BTreeSet;

/// Pdfium indexes pages with a `u16`, so ranges stop there.
pub const LAST_PAGE_INDEX: usize = u16::MAX as usize;

/// Parses a page list such as `"1,3-5"` into sorted, de-duplicated,
/// zero-based page indices.
///
/// Pages are 1-based in the input; ranges are inclusive. A reversed range
/// (`5-3`) selects nothing. Ranges are cut at [`LAST_PAGE_INDEX`]; whether
/// the pages exist in the document is left to the caller.
pub fn parse_page_selection(input: &str) -> Result<Vec<usize>> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }

    let invalid = || CropError::InvalidPageSelection(input.to_string());
    let page = |s: &str| -> Result<usize> {
        match s.trim().parse::<usize>() {
            Ok(n) if n > 0 => Ok(n - 1),
            _ => Err(invalid()),
        }
    };

    let mut pages = BTreeSet::new();
    for part in input.split(',') {
        let part = part.trim();
        match part.split_once('-') {
            Some((start, end)) => {
                if end.contains('-') {
                    return Err(invalid());
                }
                let (start, end) = (page(start)?, page(end)?);
                pages.extend(start..=end.min(LAST_PAGE_INDEX));
            }
            None => {
                pages.insert(page(part)?);
            }
        }
    }

    Ok(pages.into_iter().collect())
}
