use std::fs;
use std::path::Path;

use tempfile::tempdir;

use crate::image_pipeline::common::error::ConversionError;
use crate::image_pipeline::common::source::ImageSource;
use crate::image_pipeline::fits::{
    AstroUnit, CardValue, LATITUDE_KEY, LONGITUDE_KEY, NOT_INFORMED, ObservationMeta, UnitHeader,
    WriteOptions, write_unit,
};
use crate::image_pipeline::pixels::{Plane, SampleType};

fn gradient(width: usize, height: usize) -> Plane {
    let data = (0..(width * height) as u32).map(|v| (v * 37) % 65536).collect();
    Plane::new(width, height, SampleType::U16, data).unwrap()
}

#[test]
fn test_header_set_replaces_in_place() {
    let mut header = UnitHeader::new();
    header.set("latobs", "10 N");
    header.set("OBSERVER", "someone");
    header.set("LATOBS", "20 N");

    assert_eq!(header.len(), 2);
    assert_eq!(header.get_str("LATOBS"), Some("20 N"));
    let keys: Vec<&str> = header.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["LATOBS", "OBSERVER"]);
}

#[test]
fn test_observation_meta_defaults() {
    let header = ObservationMeta::default().to_header();
    assert_eq!(header.get_str(LATITUDE_KEY), Some(NOT_INFORMED));
    assert_eq!(header.get_str(LONGITUDE_KEY), Some(NOT_INFORMED));

    let header = ObservationMeta {
        latitude: Some("48.85 N".to_string()),
        longitude: None,
    }
    .to_header();
    assert_eq!(header.get_str(LATITUDE_KEY), Some("48.85 N"));
    assert_eq!(header.get_str(LONGITUDE_KEY), Some(NOT_INFORMED));
}

#[test]
fn test_write_then_read_preserves_samples() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("unit.fits");
    let grid = gradient(7, 5);

    write_unit(&grid, &path, &UnitHeader::new(), &WriteOptions::default()).unwrap();
    let unit = AstroUnit::read(&path).unwrap();

    assert_eq!(unit.grid(), &grid);
    assert_eq!(unit.grid().sample_type(), SampleType::U16);
    assert_eq!(unit.size(), (5, 7));
    assert_eq!(unit.path(), path.as_path());
}

#[test]
fn test_write_fills_location_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("unit.fits");

    write_unit(&gradient(4, 4), &path, &UnitHeader::new(), &WriteOptions::default()).unwrap();
    let unit = AstroUnit::read(&path).unwrap();

    assert_eq!(unit.header().get_str(LATITUDE_KEY), Some(NOT_INFORMED));
    assert_eq!(unit.header().get_str(LONGITUDE_KEY), Some(NOT_INFORMED));
}

#[test]
fn test_write_sets_header_cards_verbatim() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("unit.fits");

    let mut header = ObservationMeta::new("43.93 N", "5.71 E").to_header();
    header.set("OBSERVER", "Observatoire");
    header.set("EXPOSURE", 42i64);
    header.set("GAIN", 2.5f64);
    header.set("STACKED", true);
    // derived from the grid, not copied
    header.set("BITPIX", 8i64);

    write_unit(&gradient(3, 3), &path, &header, &WriteOptions::default()).unwrap();
    let unit = AstroUnit::read(&path).unwrap();
    let read = unit.header();

    assert_eq!(read.get_str(LATITUDE_KEY), Some("43.93 N"));
    assert_eq!(read.get_str(LONGITUDE_KEY), Some("5.71 E"));
    assert_eq!(read.get_str("OBSERVER"), Some("Observatoire"));
    assert_eq!(read.get_i64("EXPOSURE"), Some(42));
    assert_eq!(read.get_f64("GAIN"), Some(2.5));
    assert_eq!(read.get("STACKED"), Some(&CardValue::Logical(true)));
    assert_eq!(read.get_i64("BITPIX"), Some(16));
    assert_eq!(read.get_i64("BZERO"), Some(32768));
}

#[test]
fn test_write_refuses_existing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("unit.fits");
    let first = gradient(4, 4);

    write_unit(&first, &path, &UnitHeader::new(), &WriteOptions::default()).unwrap();
    let result = write_unit(&gradient(2, 2), &path, &UnitHeader::new(), &WriteOptions::default());

    assert!(matches!(result, Err(ConversionError::UnitWriteError(_))));
    assert_eq!(AstroUnit::read(&path).unwrap().grid().samples(), first.samples());
}

#[test]
fn test_write_overwrites_when_allowed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("unit.fits");
    let second = gradient(2, 3);

    write_unit(&gradient(4, 4), &path, &UnitHeader::new(), &WriteOptions::default()).unwrap();
    write_unit(&second, &path, &UnitHeader::new(), &WriteOptions::overwriting()).unwrap();

    let unit = AstroUnit::read(&path).unwrap();
    assert_eq!(unit.grid().shape(), (3, 2));
    assert_eq!(unit.grid().samples(), second.samples());
}

#[test]
fn test_write_into_missing_directory() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing").join("unit.fits");

    let result = write_unit(&gradient(2, 2), &path, &UnitHeader::new(), &WriteOptions::default());
    assert!(matches!(result, Err(ConversionError::UnitWriteError(_))));
}

#[test]
fn test_write_rejects_invalid_key_without_creating_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("unit.fits");
    let mut header = UnitHeader::new();
    header.set("WAY-TOO-LONG", "value");

    let result = write_unit(&gradient(2, 2), &path, &header, &WriteOptions::default());
    assert!(matches!(result, Err(ConversionError::UnitWriteError(_))));
    assert!(!path.exists());
}

#[test]
fn test_astro_unit_write() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("unit.fits");
    let unit = AstroUnit::new(&path, gradient(6, 2), ObservationMeta::new("1 S", "2 W").to_header());

    unit.write(&WriteOptions::default()).unwrap();
    let read = AstroUnit::read(&path).unwrap();

    assert_eq!(read.grid().samples(), unit.grid().samples());
    assert_eq!(read.header().get_str(LATITUDE_KEY), Some("1 S"));
}

#[test]
fn test_read_missing_file() {
    let dir = tempdir().unwrap();
    let result = AstroUnit::read(dir.path().join("nothing.fits"));
    assert!(matches!(result, Err(ConversionError::UnitReadError(_))));
}

#[test]
fn test_read_non_fits_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.fits");
    fs::write(&path, "just some text, not an image").unwrap();

    let result = AstroUnit::read(&path);
    assert!(matches!(result, Err(ConversionError::UnitReadError(_))));
}

#[test]
fn test_read_truncated_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("unit.fits");
    write_unit(&gradient(64, 64), &path, &UnitHeader::new(), &WriteOptions::default()).unwrap();

    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() - 4000]).unwrap();

    let result = AstroUnit::read(&path);
    assert!(matches!(result, Err(ConversionError::UnitReadError(_))));
}

/// Builds a FITS file by hand: header cards, then big-endian data, each
/// padded to whole blocks.
fn fits_bytes(cards: &[&str], data: &[u8]) -> Vec<u8> {
    let mut bytes: Vec<u8> = cards
        .iter()
        .chain(std::iter::once(&"END"))
        .flat_map(|card| format!("{:<80}", card).into_bytes())
        .collect();
    bytes.resize(bytes.len().div_ceil(2880) * 2880, b' ');
    bytes.extend_from_slice(data);
    bytes.resize(bytes.len().div_ceil(2880) * 2880, 0);
    bytes
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_round_trip_keeps_sample_width() {
    let dir = tempdir().unwrap();
    let grids = [
        Plane::new(3, 2, SampleType::U8, vec![0, 1, 127, 128, 200, 255]).unwrap(),
        Plane::new(3, 2, SampleType::U16, vec![0, 1, 32767, 32768, 40000, 65535]).unwrap(),
        Plane::new(
            3,
            2,
            SampleType::U32,
            vec![0, 1, i32::MAX as u32, 2_147_483_648, 3_000_000_000, u32::MAX],
        )
        .unwrap(),
    ];

    for (n, grid) in grids.iter().enumerate() {
        let path = dir.path().join(format!("unit{}.fits", n));
        write_unit(grid, &path, &UnitHeader::new(), &WriteOptions::default()).unwrap();

        let unit = AstroUnit::read(&path).unwrap();
        assert_eq!(unit.grid(), grid);
        assert_eq!(fs::metadata(&path).unwrap().len() % 2880, 0);
    }
}

#[test]
fn test_read_unsigned_sixteen_bit_convention() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("camera.fits");
    // 0 and 40000 stored as 0 - 32768 and 40000 - 32768
    let data = [0x80u8, 0x00, 0x1C, 0x40];
    fs::write(
        &path,
        fits_bytes(
            &[
                "SIMPLE  =                    T",
                "BITPIX  =                   16",
                "NAXIS   =                    2",
                "NAXIS1  =                    2",
                "NAXIS2  =                    1",
                "BZERO   =              32768.0",
                "BSCALE  =                  1.0",
            ],
            &data,
        ),
    )
    .unwrap();

    let unit = AstroUnit::read(&path).unwrap();
    assert_eq!(unit.grid().samples(), &[0, 40000]);
    assert_eq!(unit.grid().sample_type(), SampleType::U16);
}

#[test]
fn test_read_rejects_scaled_and_blank_data() {
    let dir = tempdir().unwrap();
    let base = [
        "SIMPLE  =                    T",
        "BITPIX  =                   16",
        "NAXIS   =                    2",
        "NAXIS1  =                    2",
        "NAXIS2  =                    1",
    ];
    let data = [0x00u8, 0x05, 0xFF, 0xFF];

    for extra in ["BSCALE  =                  2.0", "BLANK   =                   -1"] {
        let path = dir.path().join("unit.fits");
        let cards: Vec<&str> = base.iter().copied().chain([extra]).collect();
        fs::write(&path, fits_bytes(&cards, &data)).unwrap();

        let result = AstroUnit::read(&path);
        assert!(matches!(result, Err(ConversionError::UnitReadError(_))), "{}", extra);
    }
}

#[test]
fn test_read_ignores_extension_units() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("unit.fits");
    let grid = Plane::new(3, 2, SampleType::U16, vec![1, 2, 3, 4, 5, 6]).unwrap();
    write_unit(&grid, &path, &UnitHeader::new(), &WriteOptions::default()).unwrap();

    let mut bytes = fs::read(&path).unwrap();
    bytes.extend(fits_bytes(
        &[
            "XTENSION= 'IMAGE   '",
            "BITPIX  =                  -32",
            "NAXIS   =                    2",
            "NAXIS1  =                    4",
            "NAXIS2  =                    4",
            "PCOUNT  =                    0",
            "GCOUNT  =                    1",
        ],
        &[0x3F; 64],
    ));
    fs::write(&path, bytes).unwrap();

    let unit = AstroUnit::read(&path).unwrap();
    assert_eq!(unit.grid(), &grid);
}

#[test]
fn test_read_rejects_oversized_axes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("unit.fits");
    fs::write(
        &path,
        fits_bytes(
            &[
                "SIMPLE  =                    T",
                "BITPIX  =                   16",
                "NAXIS   =                    2",
                "NAXIS1  =           4294967296",
                "NAXIS2  =           4294967296",
            ],
            &[],
        ),
    )
    .unwrap();

    let result = AstroUnit::read(&path);
    assert!(matches!(result, Err(ConversionError::UnitReadError(_))));
}

#[test]
fn test_write_leaves_no_staging_files() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("unit.fits");
    let first = gradient(4, 4);

    write_unit(&first, &path, &UnitHeader::new(), &WriteOptions::default()).unwrap();
    let refused = write_unit(&gradient(2, 2), &path, &UnitHeader::new(), &WriteOptions::default());
    assert!(refused.is_err());

    // a directory cannot be replaced by a file, so the move into place fails
    let blocked = dir.path().join("blocked.fits");
    fs::create_dir(&blocked).unwrap();
    fs::write(blocked.join("keep"), b"x").unwrap();
    let failed = write_unit(&first, &blocked, &UnitHeader::new(), &WriteOptions::overwriting());
    assert!(matches!(failed, Err(ConversionError::UnitWriteError(_))));

    assert_eq!(file_names(dir.path()), vec!["blocked.fits", "unit.fits"]);
    assert!(blocked.join("keep").exists());
    assert_eq!(AstroUnit::read(&path).unwrap().grid(), &first);
}
