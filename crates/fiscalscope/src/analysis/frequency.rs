//! Most and least frequent value per column.

use serde::Serialize;

use crate::input::{format_general, Cell};
use crate::input::Dataset;
use crate::schema::value_counts;

/// Extremes of one column's value distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyRow {
    pub column: String,
    pub most_frequent: String,
    pub max_count: usize,
    pub least_frequent: String,
    pub min_count: usize,
}

/// Most and least frequent value of every column, nulls included.
///
/// Ties keep the value seen first. Columns without any value produce no row.
pub fn identify_value_frequencies(dataset: &Dataset) -> Vec<FrequencyRow> {
    dataset
        .columns()
        .filter_map(|(name, cells)| {
            let counts = value_counts(cells, true);
            let (most, max_count) = counts.first()?;
            let (least, min_count) = counts.last()?;
            Some(FrequencyRow {
                column: name.to_string(),
                most_frequent: render_value(&most.to_cell()),
                max_count: *max_count,
                least_frequent: render_value(&least.to_cell()),
                min_count: *min_count,
            })
        })
        .collect()
}

/// Numbers with 4 significant digits, dates in ISO form, nulls as `NaN`.
fn render_value(cell: &Cell) -> String {
    match cell {
        Cell::Null => "NaN".to_string(),
        Cell::Number(v) => format_general(*v, 4),
        Cell::Date(d) => d.format("%Y-%m-%dT%H:%M:%S").to_string(),
        Cell::Text(s) => s.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequencies_include_null() {
        let ds = Dataset::from_columns(vec![
            (
                "uf",
                vec![Cell::text("SP"), Cell::Null, Cell::Null, Cell::text("RJ")],
            ),
            (
                "valor",
                vec![
                    Cell::Number(1234.5678),
                    Cell::Number(1234.5678),
                    Cell::Number(2.0),
                    Cell::Number(1234.5678),
                ],
            ),
        ])
        .unwrap();

        let rows = identify_value_frequencies(&ds);
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].most_frequent, "NaN");
        assert_eq!(rows[0].max_count, 2);
        assert_eq!(rows[0].least_frequent, "RJ");
        assert_eq!(rows[0].min_count, 1);

        assert_eq!(rows[1].most_frequent, "1235");
        assert_eq!(rows[1].max_count, 3);
        assert_eq!(rows[1].least_frequent, "2");
    }

    #[test]
    fn test_empty_dataset_has_no_rows() {
        let ds = Dataset::from_columns(vec![("a", Vec::<Cell>::new())]).unwrap();
        assert!(identify_value_frequencies(&ds).is_empty());
    }
}
