// Formatter and page window property tests
// Author: kelexine (https://github.com/kelexine)

use bitflix::format::{self, page_window, PageItem};
use proptest::prelude::*;

fn pages(items: &[PageItem]) -> Vec<u32> {
    items
        .iter()
        .filter_map(|item| match item {
            PageItem::Page(n) => Some(*n),
            PageItem::Ellipsis => None,
        })
        .collect()
}

proptest! {
    #[test]
    fn small_totals_list_every_page(total in 0u32..=5, current in 1u32..=5) {
        let window = page_window(current, total);
        prop_assert_eq!(pages(&window), (1..=total).collect::<Vec<_>>());
        prop_assert!(!window.contains(&PageItem::Ellipsis));
    }

    #[test]
    fn large_totals_keep_ends_and_current(total in 6u32..10_000, offset in 0u32..10_000) {
        let current = 1 + offset % total;
        let window = page_window(current, total);
        let numbers = pages(&window);

        prop_assert_eq!(window.first(), Some(&PageItem::Page(1)));
        prop_assert_eq!(window.last(), Some(&PageItem::Page(total)));
        prop_assert!(numbers.contains(&current));
        prop_assert!(numbers.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(window.len() == 6 || window.len() == 7);
        prop_assert!(!window
            .windows(2)
            .any(|w| w[0] == PageItem::Ellipsis && w[1] == PageItem::Ellipsis));
    }

    #[test]
    fn duration_never_panics(input in ".*") {
        let _ = format::duration(Some(&input));
        let _ = format::year(Some(&input));
    }
}

#[test]
fn test_page_window_serializes_ellipsis_as_text() {
    let json = serde_json::to_value(page_window(5, 10)).unwrap();
    assert_eq!(json, serde_json::json!([1, "...", 4, 5, 6, "...", 10]));
}

#[test]
fn test_card_labels() {
    assert_eq!(format::year(Some("1999-03-31")), "1999");
    assert_eq!(format::year(None), format::NOT_AVAILABLE);
    assert_eq!(format::duration(Some("PT2H16M")), "2h 16m");
    assert_eq!(format::duration(None), format::NOT_AVAILABLE);
}
