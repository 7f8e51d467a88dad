//! Row assembly and sorting.

use mlib_common::text::transliterate;

/// Transpose per-column value arrays into one tuple per surviving id.
pub fn assemble(columns: &[Vec<Option<String>>]) -> Vec<Vec<Option<String>>> {
    let row_count = columns.first().map(Vec::len).unwrap_or(0);
    (0..row_count)
        .map(|i| columns.iter().map(|col| col[i].clone()).collect())
        .collect()
}

/// Sort rows by their tab-joined values, transliterated to ASCII and
/// compared case-insensitively. The reversed flag reverses the final
/// sequence afterwards; it is not a descending comparator, so tie order
/// reverses along with everything else.
pub fn sort_rows(rows: &mut [Vec<Option<String>>], reversed: bool) {
    rows.sort_by_cached_key(|row| sort_key(row));
    if reversed {
        rows.reverse();
    }
}

fn sort_key(row: &[Option<String>]) -> String {
    let joined = row
        .iter()
        .map(|cell| cell.as_deref().unwrap_or(""))
        .collect::<Vec<_>>()
        .join("\t");
    transliterate(&joined).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<Option<String>> {
        cells.iter().map(|c| Some(c.to_string())).collect()
    }

    #[test]
    fn transpose_aligns_positions() {
        let columns = vec![
            vec![Some("a".to_string()), Some("b".to_string())],
            vec![None, Some("2".to_string())],
        ];
        let rows = assemble(&columns);
        assert_eq!(rows, vec![
            vec![Some("a".to_string()), None],
            vec![Some("b".to_string()), Some("2".to_string())],
        ]);
    }

    #[test]
    fn sort_is_case_insensitive() {
        let mut rows = vec![row(&["Z", "a"]), row(&["a", "Z"])];
        sort_rows(&mut rows, false);
        assert_eq!(rows, vec![row(&["a", "Z"]), row(&["Z", "a"])]);
    }

    #[test]
    fn sort_strips_diacritics() {
        let mut rows = vec![row(&["Fauré"]), row(&["Fauz"]), row(&["Faura"])];
        sort_rows(&mut rows, false);
        assert_eq!(rows, vec![row(&["Faura"]), row(&["Fauré"]), row(&["Fauz"])]);
    }

    #[test]
    fn reversed_reverses_after_sorting() {
        let mut rows = vec![row(&["b"]), row(&["a"]), row(&["c"])];
        sort_rows(&mut rows, true);
        assert_eq!(rows, vec![row(&["c"]), row(&["b"]), row(&["a"])]);
    }

    #[test]
    fn empty_input_yields_no_rows() {
        assert!(assemble(&[]).is_empty());
    }
}
