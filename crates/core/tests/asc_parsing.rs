//! ASC raster reading and writing against real files

mod common;

use ice_dome_core::io::{Raster, RasterHeader, DEFAULT_NODATA};
use ice_dome_core::{DomeError, FieldData};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn test_parse_three_by_two_file() {
    let dir = common::scratch_dir("parse-small");
    let path = dir.join("small.asc");
    std::fs::write(
        &path,
        "ncols 3\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 1\nNODATA_value -9999\n1 2 3\n4 5 6\n",
    )
    .unwrap();

    let raster = Raster::from_path(&path).unwrap();
    assert_eq!(raster.header().origin(), (0.0, 0.0));
    assert_eq!(
        raster.values(),
        &FieldData::from_rows(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap()
    );
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = common::scratch_dir("missing");
    let err = Raster::from_path(dir.join("does_not_exist.asc")).unwrap_err();
    assert!(matches!(err, DomeError::Io { .. }));
    assert!(err.to_string().contains("does_not_exist.asc"));
}

#[test]
fn test_malformed_file_is_format_error() {
    let dir = common::scratch_dir("malformed");
    let path = dir.join("bad.asc");
    std::fs::write(
        &path,
        "ncols 3\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 1\n1 2 3\n4 5 6 7\n",
    )
    .unwrap();
    assert!(matches!(
        Raster::from_path(&path),
        Err(DomeError::Format { line: Some(7), .. })
    ));
}

#[test]
fn test_random_rasters_survive_save_and_load() {
    let dir = common::scratch_dir("roundtrip");
    let mut rng = StdRng::seed_from_u64(2024);

    for case in 0..20 {
        let ncols = rng.random_range(1..12);
        let nrows = rng.random_range(1..12);
        let header = RasterHeader {
            ncols,
            nrows,
            xllcorner: rng.random_range(-3.5e6..3.5e6),
            yllcorner: rng.random_range(-3.5e6..3.5e6),
            cellsize: rng.random_range(0.1..5000.0),
            nodata_value: if case % 2 == 0 { DEFAULT_NODATA } else { -32768.0 },
        };
        let data: Vec<f64> = (0..ncols * nrows)
            .map(|_| rng.random_range(-1000.0..4500.0))
            .collect();
        let raster = Raster::new(header, FieldData::from_vec(ncols, nrows, data).unwrap()).unwrap();

        let path = dir.join(format!("case_{case}.asc"));
        raster.save(&path).unwrap();
        let back = Raster::from_path(&path).unwrap();

        assert_eq!(back.header(), raster.header(), "case {case}");
        let same_bits = back
            .values()
            .as_slice()
            .iter()
            .zip(raster.values().as_slice())
            .all(|(a, b)| a.to_bits() == b.to_bits());
        assert!(same_bits, "case {case}");
    }
}
