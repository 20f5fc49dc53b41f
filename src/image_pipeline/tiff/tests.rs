use std::io::Cursor;

use tiff::decoder::{Decoder, DecodingResult};

use crate::image_pipeline::pixels::{PixelArray, SampleType};
use crate::image_pipeline::raw::{ColorSpace, DecodeOptions};
use crate::image_pipeline::common::error::ConversionError;
use crate::image_pipeline::tiff::standard_tiff_writer::tiff_dimensions;
use crate::image_pipeline::tiff::{ConversionConfig, StandardTiffWriter, TiffCompression, TiffWriter};

fn ramp(width: usize, height: usize, sample_type: SampleType) -> PixelArray {
    let max = sample_type.max_value();
    let data = (0..(width * height * 3) as u32).map(|v| (v * 97) % max).collect();
    PixelArray::new(width, height, sample_type, data).unwrap()
}

fn encode(image: &PixelArray, config: &ConversionConfig) -> Vec<u8> {
    let mut output = Vec::new();
    StandardTiffWriter.write_tiff(image, &mut output, config).unwrap();
    output
}

#[test]
fn test_config_builder() {
    let decode = DecodeOptions::builder().color_space(ColorSpace::Srgb).build();
    let config = ConversionConfig::builder()
        .compression(TiffCompression::DeflateBest)
        .predictor(Some(2))
        .validate_dimensions(false)
        .overwrite(true)
        .decode(decode)
        .build();

    assert!(matches!(config.compression, TiffCompression::DeflateBest));
    assert_eq!(config.predictor, Some(2));
    assert!(!config.validate_dimensions);
    assert!(config.overwrite);
    assert_eq!(config.decode.color_space, ColorSpace::Srgb);

    let defaults = ConversionConfig::default();
    assert!(matches!(defaults.compression, TiffCompression::None));
    assert!(!defaults.overwrite);
}

#[test]
fn test_sixteen_bit_round_trip() {
    let image = ramp(9, 4, SampleType::U16);
    let bytes = encode(&image, &ConversionConfig::default());

    let mut decoder = Decoder::new(Cursor::new(bytes)).unwrap();
    assert_eq!(decoder.dimensions().unwrap(), (9, 4));

    match decoder.read_image().unwrap() {
        DecodingResult::U16(data) => {
            let decoded: Vec<u32> = data.into_iter().map(u32::from).collect();
            assert_eq!(decoded, image.samples());
        }
        _ => panic!("expected 16-bit samples"),
    }
}

#[test]
fn test_eight_bit_lzw_round_trip() {
    let image = ramp(5, 6, SampleType::U8);
    let config = ConversionConfig::builder()
        .compression(TiffCompression::Lzw)
        .build();
    let bytes = encode(&image, &config);

    let mut decoder = Decoder::new(Cursor::new(bytes)).unwrap();
    assert_eq!(decoder.dimensions().unwrap(), (5, 6));

    match decoder.read_image().unwrap() {
        DecodingResult::U8(data) => {
            let decoded: Vec<u32> = data.into_iter().map(u32::from).collect();
            assert_eq!(decoded, image.samples());
        }
        _ => panic!("expected 8-bit samples"),
    }
}

#[test]
fn test_dimensions_beyond_tiff_range() {
    assert_eq!(tiff_dimensions(640, 480).unwrap(), (640, 480));

    let too_wide = u32::MAX as usize + 1;
    assert!(matches!(
        tiff_dimensions(too_wide, 2),
        Err(ConversionError::InvalidDimensions(w, 2)) if w == too_wide
    ));
}
