use neon_tokyo::{Column, Dataset, NeonError, Value};
use std::fs;

#[test]
fn csv_file_is_loaded_with_typed_cells() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sales.csv");
    fs::write(&path, "region,units,price\nNorth,12,3.5\nSouth,,4\nEast,7,NA\n").unwrap();

    let ds = Dataset::from_csv_path(&path).unwrap();
    assert_eq!(ds.len(), 3);
    assert_eq!(ds.column_names(), vec!["region", "units", "price"]);
    assert_eq!(ds.numeric("units").unwrap(), vec![Some(12.0), None, Some(7.0)]);
    assert_eq!(ds.numeric("price").unwrap(), vec![Some(3.5), Some(4.0), None]);
    assert_eq!(ds.numeric_columns(), vec!["units", "price"]);
}

#[test]
fn unreadable_csv_names_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.csv");
    let err = Dataset::from_csv_path(&path).unwrap_err();
    assert!(format!("{err:#}").contains("absent.csv"));
}

#[test]
fn ragged_csv_rows_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ragged.csv");
    fs::write(&path, "a,b\n1,2\n3\n").unwrap();
    assert!(Dataset::from_csv_path(&path).is_err());
}

#[test]
fn json_records_fill_absent_keys_as_missing() {
    let json = r#"[
        {"species": "Adelie", "mass": 3750},
        {"species": "Gentoo", "mass": null},
        {"species": "Chinstrap"}
    ]"#;
    let ds = Dataset::from_json_records(json).unwrap();
    assert_eq!(ds.len(), 3);
    assert_eq!(ds.numeric("mass").unwrap(), vec![Some(3750.0), None, None]);
    assert_eq!(ds.value("species", 2).unwrap(), &Value::Text("Chinstrap".into()));
}

#[test]
fn missing_and_text_columns_are_typed_errors() {
    let ds = Dataset::from_columns(vec![
        Column::text("name", ["a", "b"]),
        Column::numeric("score", [1.0, 2.0]),
    ])
    .unwrap();

    match ds.numeric("nope") {
        Err(NeonError::MissingColumn(c)) => assert_eq!(c, "nope"),
        other => panic!("unexpected {other:?}"),
    }
    match ds.numeric("name") {
        Err(NeonError::NotNumeric { column, row, value }) => {
            assert_eq!((column.as_str(), row, value.as_str()), ("name", 0, "a"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn columns_of_different_length_are_rejected() {
    let err = Dataset::from_columns(vec![
        Column::numeric("x", [1.0, 2.0, 3.0]),
        Column::numeric("y", [1.0]),
    ])
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<NeonError>(),
        Some(NeonError::RaggedColumns { expected: 3, found: 1, .. })
    ));
}

#[test]
fn grouped_values_keep_first_seen_category_order() {
    let ds = Dataset::from_columns(vec![
        Column::text("day", ["Sat", "Thu", "Sat", "Fri", "Thu"]),
        Column::numeric("tip", [3.0, 1.0, 4.0, 2.0, 5.0]),
    ])
    .unwrap();
    let groups = ds.grouped_values("tip", "day").unwrap();
    let labels: Vec<&str> = groups.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["Sat", "Thu", "Fri"]);
    assert_eq!(groups[0].values, vec![3.0, 4.0]);
    assert_eq!(groups[1].values, vec![1.0, 5.0]);
}
