//! Dataset construction, feature intersection, and projection.

use crate::dataset::Dataset;
use crate::error::AakrError;

fn table(pairs: &[(&str, &[f64])]) -> Dataset {
    Dataset::from_columns(
        pairs
            .iter()
            .map(|(n, c)| (n.to_string(), c.to_vec()))
            .collect(),
    )
    .unwrap()
}

#[test]
fn test_from_columns_shape() {
    let d = table(&[("a", &[1.0, 2.0, 3.0]), ("b", &[4.0, 5.0, 6.0])]);
    assert_eq!(d.nrows(), 3);
    assert_eq!(d.nfeatures(), 2);
    assert_eq!(d.feature_names(), &["a".to_string(), "b".to_string()]);
    assert_eq!(d.column("b"), Some([4.0, 5.0, 6.0].as_slice()));
    assert_eq!(d.column("z"), None);
}

#[test]
fn test_from_columns_ragged_fails() {
    let err = Dataset::from_columns(vec![
        ("a".into(), vec![1.0, 2.0]),
        ("b".into(), vec![1.0]),
    ])
    .unwrap_err();
    assert_eq!(err, AakrError::DimensionMismatch { expected: 2, got: 1 });
}

#[test]
fn test_from_columns_duplicate_name_fails() {
    let err = Dataset::from_columns(vec![
        ("a".into(), vec![1.0]),
        ("a".into(), vec![2.0]),
    ])
    .unwrap_err();
    assert!(matches!(err, AakrError::DataAlignment(_)));
}

#[test]
fn test_empty_table_fails() {
    assert!(matches!(
        Dataset::from_columns(vec![]),
        Err(AakrError::InsufficientData(_))
    ));
    assert!(matches!(
        Dataset::from_columns(vec![("a".into(), vec![])]),
        Err(AakrError::InsufficientData(_))
    ));
}

#[test]
fn test_from_rows_matches_columns() {
    let d = Dataset::from_rows(
        vec!["a".into(), "b".into()],
        vec![vec![1.0, 4.0], vec![2.0, 5.0], vec![3.0, 6.0]],
    )
    .unwrap();
    assert_eq!(d.column("a"), Some([1.0, 2.0, 3.0].as_slice()));
    assert_eq!(d.column("b"), Some([4.0, 5.0, 6.0].as_slice()));
}

#[test]
fn test_intersection_preserves_left_order() {
    let x = table(&[
        ("a", &[1.0]),
        ("b", &[1.0]),
        ("c", &[1.0]),
        ("d", &[1.0]),
    ]);
    let y = table(&[("d", &[1.0]), ("b", &[1.0]), ("z", &[1.0])]);
    assert_eq!(
        x.intersect_features(&y),
        vec!["b".to_string(), "d".to_string()]
    );
    // symmetric call follows the other table's order
    assert_eq!(
        y.intersect_features(&x),
        vec!["d".to_string(), "b".to_string()]
    );
}

#[test]
fn test_intersection_empty() {
    let x = table(&[("a", &[1.0])]);
    let y = table(&[("b", &[1.0])]);
    assert!(x.intersect_features(&y).is_empty());
}

#[test]
fn test_project_row_major() {
    let d = table(&[("a", &[1.0, 2.0]), ("b", &[3.0, 4.0]), ("c", &[5.0, 6.0])]);
    let m = d.project(&["c".to_string(), "a".to_string()]).unwrap();
    assert_eq!(m, vec![vec![5.0, 1.0], vec![6.0, 2.0]]);
}

#[test]
fn test_project_missing_feature_fails() {
    let d = table(&[("a", &[1.0])]);
    let err = d.project(&["nope".to_string()]).unwrap_err();
    assert!(matches!(err, AakrError::DataAlignment(_)));
}

#[test]
fn test_select_rows() {
    let d = table(&[("a", &[1.0, 2.0, 3.0, 4.0]), ("b", &[5.0, 6.0, 7.0, 8.0])]);
    let s = d.select_rows(&[3, 1]);
    assert_eq!(s.nrows(), 2);
    assert_eq!(s.column("a"), Some([4.0, 2.0].as_slice()));
    assert_eq!(s.column("b"), Some([8.0, 6.0].as_slice()));
}
