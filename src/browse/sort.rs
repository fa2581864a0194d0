//! Client-side sorting of loaded items
//!
//! Sorting is a pure function of the items and the key. It is applied to the
//! whole loaded list every time the view is read and is never persisted; the
//! stored snapshot always keeps arrival order.
//!
//! `SortKey::None` keeps arrival order. The upstream API does not promise a
//! stable order across pages, so arrival order may differ between two
//! sessions for the same filters.

use super::filter::SortKey;
use crate::catalog::ProductSummary;
use std::cmp::Ordering;

/// Sorted copy of `items`
#[must_use]
pub fn sort(items: &[ProductSummary], key: SortKey) -> Vec<ProductSummary> {
    let mut sorted = items.to_vec();
    sort_in_place(&mut sorted, key);
    sorted
}

/// Sort `items` by `key`; stable, so equal items keep their relative order
pub fn sort_in_place(items: &mut [ProductSummary], key: SortKey) {
    match key {
        SortKey::None => {}
        SortKey::NameAsc => items.sort_by(|a, b| compare_names(a, b)),
        SortKey::NameDesc => items.sort_by(|a, b| compare_names(b, a)),
        SortKey::GradeAsc => items.sort_by(|a, b| compare_grades(a, b)),
        SortKey::GradeDesc => items.sort_by(|a, b| compare_grades(b, a)),
    }
}

/// Names compare case- and accent-insensitively first, then by exact text
/// so that distinct names never compare equal. A missing name is the empty
/// string.
fn compare_names(a: &ProductSummary, b: &ProductSummary) -> Ordering {
    collate(a.name.as_deref().unwrap_or(""), b.name.as_deref().unwrap_or(""))
}

/// Grades compare case-insensitively; ungraded items sort before "A"
fn compare_grades(a: &ProductSummary, b: &ProductSummary) -> Ordering {
    let a = a.nutrition_grade.as_deref().unwrap_or("").to_lowercase();
    let b = b.nutrition_grade.as_deref().unwrap_or("").to_lowercase();
    a.cmp(&b)
}

fn collate(a: &str, b: &str) -> Ordering {
    collation_key(a).cmp(&collation_key(b)).then_with(|| a.cmp(b))
}

/// Lowercased text with Latin diacritics folded to their base letters
///
/// Covers Latin-1 and the common Latin Extended-A letters, which is what
/// product names in the catalog use. Other scripts compare by code point.
fn collation_key(s: &str) -> String {
    let mut key = String::with_capacity(s.len());
    for c in s.chars().flat_map(char::to_lowercase) {
        match c {
            'æ' => key.push_str("ae"),
            'œ' => key.push_str("oe"),
            'ß' => key.push_str("ss"),
            _ => key.push(fold_diacritic(c)),
        }
    }
    key
}

const fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => 'c',
        'ď' | 'đ' => 'd',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => 'g',
        'ì' | 'í' | 'î' | 'ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => 'i',
        'ľ' | 'ĺ' | 'ļ' | 'ł' => 'l',
        'ñ' | 'ń' | 'ņ' | 'ň' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ŏ' | 'ő' => 'o',
        'ŕ' | 'ř' => 'r',
        'ś' | 'ŝ' | 'ş' | 'š' => 's',
        'ţ' | 'ť' => 't',
        'ù' | 'ú' | 'û' | 'ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => 'u',
        'ý' | 'ÿ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        _ => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(names: &[&str]) -> Vec<ProductSummary> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| ProductSummary::new(i.to_string(), *n))
            .collect()
    }

    fn names(items: &[ProductSummary]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_deref().unwrap_or("")).collect()
    }

    fn graded(grades: &[Option<&str>]) -> Vec<ProductSummary> {
        grades
            .iter()
            .enumerate()
            .map(|(i, g)| {
                let item = ProductSummary::new(i.to_string(), format!("item {i}"));
                match g {
                    Some(g) => item.with_grade(*g),
                    None => item,
                }
            })
            .collect()
    }

    fn grades(items: &[ProductSummary]) -> Vec<&str> {
        items
            .iter()
            .map(|i| i.nutrition_grade.as_deref().unwrap_or("-"))
            .collect()
    }

    #[test]
    fn test_none_keeps_arrival_order() {
        let items = named(&["pear", "apple", "fig"]);
        assert_eq!(sort(&items, SortKey::None), items);
    }

    #[test]
    fn test_name_asc_is_case_insensitive() {
        let items = named(&["banana", "Apple", "cherry"]);
        assert_eq!(names(&sort(&items, SortKey::NameAsc)), ["Apple", "banana", "cherry"]);
    }

    #[test]
    fn test_accented_names_sort_with_their_base_letter() {
        let items = named(&["zucchini", "Éclair", "fig", "Crème brûlée", "Apple", "Creme"]);
        assert_eq!(
            names(&sort(&items, SortKey::NameAsc)),
            ["Apple", "Creme", "Crème brûlée", "Éclair", "fig", "zucchini"]
        );
    }

    #[test]
    fn test_ligatures_expand() {
        assert_eq!(collation_key("Œufs Straße"), "oeufs strasse");
    }

    #[test]
    fn test_missing_name_sorts_first_ascending() {
        let mut items = named(&["Oats", "Bran"]);
        items.push(ProductSummary {
            code: "x".into(),
            name: None,
            brand: None,
            nutrition_grade: None,
            image_url: None,
        });
        let sorted = sort(&items, SortKey::NameAsc);
        assert_eq!(sorted[0].code, "x");
    }

    #[test]
    fn test_name_desc_reverses_name_asc() {
        let items = named(&["pear", "Apple", "fig", "apple", "Zucchini"]);
        let mut asc = sort(&items, SortKey::NameAsc);
        asc.reverse();
        assert_eq!(sort(&items, SortKey::NameDesc), asc);
    }

    #[test]
    fn test_grade_asc_puts_ungraded_first() {
        let items = graded(&[Some("c"), None, Some("A"), Some("e"), Some("b")]);
        assert_eq!(grades(&sort(&items, SortKey::GradeAsc)), ["-", "A", "b", "c", "e"]);
    }

    #[test]
    fn test_grade_desc_puts_ungraded_last() {
        let items = graded(&[Some("c"), None, Some("A"), Some("e")]);
        assert_eq!(grades(&sort(&items, SortKey::GradeDesc)), ["e", "c", "A", "-"]);
    }

    #[test]
    fn test_equal_grades_keep_arrival_order() {
        let items = graded(&[Some("b"), Some("B"), Some("a"), Some("b")]);
        let sorted = sort(&items, SortKey::GradeAsc);
        let codes: Vec<&str> = sorted.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, ["2", "0", "1", "3"]);
    }

    #[test]
    fn test_sorting_is_idempotent() {
        let mut items = named(&["kiwi", "Date", "apple", "date", "Fig"]);
        items[1].nutrition_grade = Some("d".into());
        items[3].nutrition_grade = Some("a".into());
        for key in SortKey::ALL {
            let once = sort(&items, key);
            assert_eq!(sort(&once, key), once, "not idempotent for {key}");
        }
    }

    #[test]
    fn test_sort_does_not_touch_input() {
        let items = named(&["b", "a"]);
        let _ = sort(&items, SortKey::NameAsc);
        assert_eq!(names(&items), ["b", "a"]);
    }
}
