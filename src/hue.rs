//! Hue partitioning: split rows by a categorical column and color each part.

use crate::dataset::Dataset;
use crate::error::NeonError;
use crate::theme::{Palette, Rgb8};
use ahash::{AHashMap, AHashSet};

/// Rows sharing one hue value.
#[derive(Clone, Debug, PartialEq)]
pub struct HueGroup {
    /// Legend label; `None` for the single group of an un-hued chart.
    pub label: Option<String>,
    pub color: Rgb8,
    /// Row indices, in the order of the row sequence given to `partition`.
    pub rows: Vec<usize>,
}

impl HueGroup {
    pub fn legend_label(&self) -> &str {
        self.label.as_deref().unwrap_or("")
    }
}

/// Distinct values of `column` in first-seen order over the whole dataset.
/// Missing cells are skipped.
pub fn distinct_values(data: &Dataset, column: &str) -> Result<Vec<String>, NeonError> {
    let col = data.column(column)?;
    let mut seen: AHashSet<String> = AHashSet::new();
    let mut out = Vec::new();
    for v in &col.values {
        if let Some(label) = v.label()
            && seen.insert(label.clone())
        {
            out.push(label);
        }
    }
    Ok(out)
}

/// Partition `order` (a row sequence, typically a sorted view of the data)
/// by the `hue` column.
///
/// Group `k` is the k-th distinct hue value as first seen in the *dataset*
/// and is colored `palette[k mod len]`; the rows of each group keep the order
/// of `order`. Without a hue column the result is one unlabeled group with
/// every row of `order`, colored `palette[0]`.
pub fn partition(
    data: &Dataset,
    hue: Option<&str>,
    palette: &Palette,
    order: &[usize],
) -> Result<Vec<HueGroup>, NeonError> {
    let Some(hue) = hue else {
        return Ok(vec![HueGroup {
            label: None,
            color: palette.pick(0),
            rows: order.to_vec(),
        }]);
    };

    let values = distinct_values(data, hue)?;
    assign(data, hue, &values, palette, order)
}

/// Like [`partition`], but the groups follow `hue_order` instead of first-seen
/// order. Hue values not listed are dropped; listed values absent from the
/// data give a group without rows.
pub fn partition_ordered(
    data: &Dataset,
    hue: &str,
    hue_order: &[String],
    palette: &Palette,
    order: &[usize],
) -> Result<Vec<HueGroup>, NeonError> {
    let mut seen: AHashSet<&str> = AHashSet::new();
    if let Some(dup) = hue_order.iter().find(|v| !seen.insert(v.as_str())) {
        return Err(NeonError::InvalidInput(format!("hue value {dup:?} listed twice")));
    }
    assign(data, hue, hue_order, palette, order)
}

fn assign(
    data: &Dataset,
    hue: &str,
    values: &[String],
    palette: &Palette,
    order: &[usize],
) -> Result<Vec<HueGroup>, NeonError> {
    let col = data.column(hue)?;
    let index: AHashMap<&str, usize> = values
        .iter()
        .enumerate()
        .map(|(i, v)| (v.as_str(), i))
        .collect();
    let mut groups: Vec<HueGroup> = values
        .iter()
        .enumerate()
        .map(|(i, v)| HueGroup {
            label: Some(v.clone()),
            color: palette.pick(i),
            rows: Vec::new(),
        })
        .collect();

    for &row in order {
        if let Some(label) = col.values[row].label()
            && let Some(&g) = index.get(label.as_str())
        {
            groups[g].rows.push(row);
        }
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Column, Value};

    fn data() -> Dataset {
        Dataset::from_columns(vec![
            Column::numeric("v", [1.0, 2.0, 3.0, 4.0, 5.0]),
            Column::new(
                "g",
                vec![
                    Value::Text("b".into()),
                    Value::Text("a".into()),
                    Value::Missing,
                    Value::Text("b".into()),
                    Value::Text("c".into()),
                ],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn first_seen_order_and_missing_skipped() {
        assert_eq!(distinct_values(&data(), "g").unwrap(), vec!["b", "a", "c"]);
    }

    #[test]
    fn rows_follow_given_order() {
        let ds = data();
        let groups = partition(&ds, Some("g"), &Palette::neon(), &[4, 3, 2, 1, 0]).unwrap();
        assert_eq!(groups[0].rows, vec![3, 0]);
        assert_eq!(groups[1].rows, vec![1]);
        assert_eq!(groups[2].rows, vec![4]);
    }

    #[test]
    fn no_hue_is_one_group() {
        let ds = data();
        let groups = partition(&ds, None, &Palette::neon(), &[0, 1, 2, 3, 4]).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].label, None);
        assert_eq!(groups[0].color, Palette::neon().pick(0));
        assert_eq!(groups[0].rows.len(), 5);
    }

    #[test]
    fn explicit_order_picks_colors_and_drops_unlisted() {
        let ds = data();
        let order = vec!["c".to_string(), "b".to_string()];
        let groups = partition_ordered(&ds, "g", &order, &Palette::neon(), &[0, 1, 2, 3, 4]).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].legend_label(), "c");
        assert_eq!(groups[0].color, Palette::neon().pick(0));
        assert_eq!(groups[0].rows, vec![4]);
        assert_eq!(groups[1].rows, vec![0, 3]);
    }

    #[test]
    fn repeated_hue_order_entry_is_rejected() {
        let order = vec!["a".to_string(), "a".to_string()];
        let r = partition_ordered(&data(), "g", &order, &Palette::neon(), &[0]);
        assert!(matches!(r, Err(NeonError::InvalidInput(_))));
    }
}
