//! PLY I/O tests
//!
//! Tests that 3DGS-style vertex tables survive a trip through disk and come
//! back in a form the builder accepts.

use splat_view::core::{BuildError, GaussianBuilder, REQUIRED_COLUMNS};
use splat_view::io::{load_ply, save_ply, AttributeTable, LoadError, PlyFormat};
use std::fs;

fn splat_table(rows: usize) -> AttributeTable {
    let mut table = AttributeTable::new();
    for (c, name) in REQUIRED_COLUMNS.iter().enumerate() {
        let values = (0..rows)
            .map(|r| match *name {
                "rot_0" => 1.0,
                "rot_1" | "rot_2" | "rot_3" => 0.0,
                _ => (r * 14 + c) as f32 * 0.125 - 3.0,
            })
            .collect();
        table.insert(*name, values);
    }
    // Higher SH bands are carried along but not used for construction.
    table.insert("f_rest_0", vec![0.5; rows]);
    table
}

#[test]
fn test_save_load_all_formats() {
    let table = splat_table(5);
    let temp_dir = std::env::temp_dir();

    for (i, format) in [PlyFormat::Ascii, PlyFormat::BinaryLittleEndian, PlyFormat::BinaryBigEndian]
        .into_iter()
        .enumerate()
    {
        let path = temp_dir.join(format!("splat_view_io_test_{}.ply", i));
        save_ply(&table, &path, format).expect("Failed to save PLY");
        assert!(path.exists(), "PLY file should be created");

        let loaded = load_ply(&path).expect("Failed to load PLY");
        assert_eq!(loaded, table, "format {}", format);

        let header = fs::read(&path).unwrap();
        let header = String::from_utf8_lossy(&header[..64]);
        assert!(header.starts_with("ply\n"));
        assert!(header.contains(&format!("format {} 1.0", format)));

        fs::remove_file(&path).ok();
    }
}

#[test]
fn test_loaded_table_builds() {
    let path = std::env::temp_dir().join("splat_view_io_test_build.ply");
    save_ply(&splat_table(3), &path, PlyFormat::BinaryLittleEndian).unwrap();

    let table = load_ply(&path).unwrap();
    let cloud = GaussianBuilder::default().build(&table).unwrap();
    assert_eq!(cloud.len(), 3);
    assert!(cloud.iter().all(|g| g.is_finite()));

    fs::remove_file(&path).ok();
}

#[test]
fn test_missing_column_is_named() {
    let mut table = splat_table(2);
    table.remove("scale_1");

    let err = GaussianBuilder::default().build(&table).unwrap_err();
    assert_eq!(err, BuildError::MissingColumn("scale_1".to_string()));
    assert!(err.to_string().contains("scale_1"));
}

#[test]
fn test_row_count_mismatch_is_named() {
    let mut table = splat_table(4);
    table.insert("opacity", vec![0.0; 3]);

    match GaussianBuilder::default().build(&table) {
        Err(BuildError::RowCountMismatch {
            column,
            expected,
            found,
        }) => {
            assert_eq!(column, "opacity");
            assert_eq!(expected, 4);
            assert_eq!(found, 3);
        }
        other => panic!("expected row count mismatch, got {:?}", other.map(|c| c.len())),
    }
}

#[test]
fn test_load_missing_file() {
    let path = std::env::temp_dir().join("splat_view_does_not_exist.ply");
    assert!(matches!(load_ply(&path), Err(LoadError::Io(_))));
}
