//! Reading the primary unit of a FITS file.
//!
//! Only integer images are accepted. Samples stored with the unsigned
//! convention (BZERO of 32768 for 16-bit data, 2147483648 for 32-bit data)
//! are shifted back to their unsigned values.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use byteorder::{BigEndian, ReadBytesExt};
use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::fits::format::{
    FITS_CARD_SIZE, MAX_AXIS_LEN, MAX_KEY_LEN, block_padding, sample_type,
};
use crate::image_pipeline::fits::header::{CardValue, UnitHeader};
use crate::image_pipeline::pixels::{Plane, SampleType};

/// Upper bound on header cards, stops runaway reads of non-FITS files.
const MAX_HEADER_CARDS: usize = 36 * 1000;
const MAX_AXES: i64 = 999;

/// Structure of the primary data unit, taken from its header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PrimaryLayout {
    pub bitpix: i64,
    pub axes: Vec<usize>,
    /// Header length including padding to the block size
    pub header_bytes: usize,
}

impl PrimaryLayout {
    /// Size of the data array without padding, `None` when it does not fit
    /// in memory addresses.
    pub fn data_bytes(&self) -> Option<usize> {
        if self.axes.is_empty() {
            return Some(0);
        }
        let sample_bytes = self.bitpix.unsigned_abs() as usize / 8;
        self.axes
            .iter()
            .try_fold(sample_bytes, |acc, &len| acc.checked_mul(len))
    }
}

/// How stored integers map to sample values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Scaling {
    zero: i64,
    blank: Option<i64>,
}

impl Scaling {
    fn from_header(header: &UnitHeader) -> std::result::Result<Self, String> {
        if let Some(scale) = header.get("BSCALE") {
            if scale.as_f64() != Some(1.0) {
                return Err(format!("BSCALE {:?} is not supported, only 1", scale));
            }
        }

        let zero = match header.get("BZERO") {
            None => 0,
            Some(value) => match value.as_f64() {
                Some(z) if z.fract() == 0.0 && z.abs() <= u32::MAX as f64 => z as i64,
                _ => return Err(format!("BZERO {:?} is not an integer offset", value)),
            },
        };

        let blank = match header.get("BLANK") {
            None => None,
            Some(value) => Some(
                value
                    .as_i64()
                    .ok_or_else(|| format!("BLANK {:?} is not an integer", value))?,
            ),
        };

        Ok(Self { zero, blank })
    }
}

fn read_error(path: &Path, reason: impl std::fmt::Display) -> ConversionError {
    ConversionError::UnitReadError(format!("{}: {}", path.display(), reason))
}

/// Reads the sample grid and header of the primary unit.
///
/// Extension units after the primary one are ignored. The file is closed
/// before this returns.
pub fn read_unit(path: &Path) -> Result<(Plane, UnitHeader)> {
    let file = File::open(path).map_err(|e| read_error(path, e))?;
    let file_len = file.metadata().map_err(|e| read_error(path, e))?.len();
    let mut reader = BufReader::new(file);

    let (header, layout) =
        read_primary_header(&mut reader).map_err(|reason| read_error(path, reason))?;
    debug!(?layout, cards = header.len(), "Parsed primary header");

    let (width, height) = image_size(&layout).map_err(|reason| read_error(path, reason))?;
    let sample_type = sample_type(layout.bitpix).ok_or_else(|| {
        read_error(
            path,
            format!("BITPIX {} is not an integer sample type", layout.bitpix),
        )
    })?;
    let scaling = Scaling::from_header(&header).map_err(|reason| read_error(path, reason))?;

    let expected = layout
        .data_bytes()
        .and_then(|data| data.checked_add(layout.header_bytes))
        .ok_or_else(|| read_error(path, "declared data size overflows"))?;
    if file_len < expected as u64 {
        return Err(read_error(
            path,
            format!("file is truncated ({} bytes, expected at least {})", file_len, expected),
        ));
    }

    let samples = read_samples(&mut reader, sample_type, width * height, &scaling)
        .map_err(|reason| read_error(path, reason))?;

    let grid = Plane::new(width, height, sample_type, samples)
        .map_err(|e| read_error(path, e))?;
    Ok((grid, header))
}

/// `(width, height)` of a single-channel image unit.
fn image_size(layout: &PrimaryLayout) -> std::result::Result<(usize, usize), String> {
    match layout.axes.as_slice() {
        [] => Err("primary unit holds no image data".to_string()),
        [width, height, rest @ ..] if rest.iter().all(|&n| n == 1) => {
            if *width == 0 || *height == 0 {
                Err(format!("empty {}x{} image", width, height))
            } else {
                Ok((*width, *height))
            }
        }
        axes => Err(format!("image of shape {:?} is not a single 2-D plane", axes)),
    }
}

/// Reads `count` big-endian samples and maps them to unsigned values.
///
/// The reader must be positioned at the start of the data array.
fn read_samples<R: Read>(
    reader: &mut R,
    sample_type: SampleType,
    count: usize,
    scaling: &Scaling,
) -> std::result::Result<Vec<u32>, String> {
    let stored: Vec<i64> = match sample_type {
        SampleType::U8 => {
            let mut raw = vec![0u8; count];
            reader.read_exact(&mut raw).map_err(|e| e.to_string())?;
            raw.into_iter().map(i64::from).collect()
        }
        SampleType::U16 => {
            let mut raw = vec![0i16; count];
            reader
                .read_i16_into::<BigEndian>(&mut raw)
                .map_err(|e| e.to_string())?;
            raw.into_iter().map(i64::from).collect()
        }
        SampleType::U32 => {
            let mut raw = vec![0i32; count];
            reader
                .read_i32_into::<BigEndian>(&mut raw)
                .map_err(|e| e.to_string())?;
            raw.into_iter().map(i64::from).collect()
        }
    };

    let max = i64::from(sample_type.max_value());
    stored
        .into_iter()
        .enumerate()
        .map(|(index, raw)| {
            if scaling.blank == Some(raw) {
                return Err(format!("sample {} is blank (undefined)", index));
            }
            let value = raw + scaling.zero;
            if !(0..=max).contains(&value) {
                return Err(format!(
                    "sample {} has value {} outside the unsigned {}-bit range",
                    index,
                    value,
                    sample_type.bits()
                ));
            }
            Ok(value as u32)
        })
        .collect()
}

/// Parses header cards up to `END` and skips the block padding after them,
/// leaving `reader` at the start of the data array.
pub(crate) fn read_primary_header<R: Read>(
    reader: &mut R,
) -> std::result::Result<(UnitHeader, PrimaryLayout), String> {
    let mut header = UnitHeader::new();
    let mut card = [0u8; FITS_CARD_SIZE];
    let mut cards_read = 0usize;

    loop {
        reader
            .read_exact(&mut card)
            .map_err(|e| format!("header ended before END card: {}", e))?;
        cards_read += 1;

        if !card.is_ascii() {
            return Err("header contains non-ASCII bytes".to_string());
        }
        let text = std::str::from_utf8(&card).map_err(|e| e.to_string())?;

        if cards_read == 1 && !text.starts_with("SIMPLE  =") {
            return Err("not a FITS file (missing SIMPLE card)".to_string());
        }

        let keyword = text[..MAX_KEY_LEN].trim_end();
        if keyword == "END" {
            break;
        }
        if &text[8..10] == "= " && !keyword.is_empty() {
            header.set(keyword, parse_value(&text[10..]));
        }

        if cards_read >= MAX_HEADER_CARDS {
            return Err("header has no END card".to_string());
        }
    }

    if header.get("SIMPLE").and_then(CardValue::as_bool) != Some(true) {
        return Err("file does not conform to the FITS standard".to_string());
    }

    let required = |key: &str| {
        header
            .get_i64(key)
            .ok_or_else(|| format!("missing {} card", key))
    };

    let bitpix = required("BITPIX")?;
    if ![8, 16, 32, 64, -32, -64].contains(&bitpix) {
        return Err(format!("invalid BITPIX {}", bitpix));
    }
    let naxis = required("NAXIS")?;
    if !(0..=MAX_AXES).contains(&naxis) {
        return Err(format!("invalid NAXIS {}", naxis));
    }
    let axes = (1..=naxis)
        .map(|n| {
            let len = required(&format!("NAXIS{}", n))?;
            if !(0..=MAX_AXIS_LEN).contains(&len) {
                return Err(format!("NAXIS{} = {} is out of range", n, len));
            }
            Ok(len as usize)
        })
        .collect::<std::result::Result<Vec<usize>, String>>()?;

    let card_bytes = cards_read * FITS_CARD_SIZE;
    let padding = block_padding(card_bytes);
    std::io::copy(&mut reader.by_ref().take(padding as u64), &mut std::io::sink())
        .map_err(|e| e.to_string())?;

    Ok((
        header,
        PrimaryLayout {
            bitpix,
            axes,
            header_bytes: card_bytes + padding,
        },
    ))
}

/// Parses the value field of a card (the text after `= `).
fn parse_value(raw: &str) -> CardValue {
    let s = raw.trim_start();

    // Quoted string, a doubled quote stands for one quote character
    if let Some(rest) = s.strip_prefix('\'') {
        let mut value = String::new();
        let mut chars = rest.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    value.push('\'');
                    chars.next();
                } else {
                    break;
                }
            } else {
                value.push(c);
            }
        }
        return CardValue::String(value.trim_end().to_string());
    }

    let value_part = s.split('/').next().unwrap_or("").trim();
    match value_part {
        "T" => return CardValue::Logical(true),
        "F" => return CardValue::Logical(false),
        _ => {}
    }

    if let Ok(i) = value_part.parse::<i64>() {
        return CardValue::Integer(i);
    }
    if let Ok(f) = value_part.replace(['D', 'd'], "E").parse::<f64>() {
        return CardValue::Float(f);
    }

    CardValue::String(value_part.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::fits::format::FITS_BLOCK_SIZE;
    use std::io::Cursor;

    fn card(text: &str) -> String {
        format!("{:<80}", text)
    }

    fn header_block(cards: &[&str]) -> Vec<u8> {
        let mut text: String = cards.iter().map(|c| card(c)).collect();
        text.push_str(&card("END"));
        let padded = text.len().div_ceil(FITS_BLOCK_SIZE) * FITS_BLOCK_SIZE;
        let mut bytes = text.into_bytes();
        bytes.resize(padded, b' ');
        bytes
    }

    #[test]
    fn test_parse_value_kinds() {
        assert_eq!(parse_value("                   T"), CardValue::Logical(true));
        assert_eq!(parse_value("                  16 / bits"), CardValue::Integer(16));
        assert_eq!(parse_value("  1.5D2 / scaled"), CardValue::Float(150.0));
        assert_eq!(
            parse_value("'Not informed'       / latitude"),
            CardValue::String("Not informed".to_string())
        );
        assert_eq!(
            parse_value("'O''Brien  '"),
            CardValue::String("O'Brien".to_string())
        );
    }

    #[test]
    fn test_read_primary_header_layout() {
        let mut bytes = header_block(&[
            "SIMPLE  =                    T",
            "BITPIX  =                   16",
            "NAXIS   =                    2",
            "NAXIS1  =                  640",
            "NAXIS2  =                  480",
            "LATOBS  = '45.76 N'",
            "COMMENT a comment card is not stored",
        ]);
        bytes.extend_from_slice(&[0x12, 0x34]);
        let mut reader = Cursor::new(bytes);

        let (header, layout) = read_primary_header(&mut reader).unwrap();

        assert_eq!(layout.bitpix, 16);
        assert_eq!(layout.axes, vec![640, 480]);
        assert_eq!(layout.header_bytes, FITS_BLOCK_SIZE);
        assert_eq!(layout.data_bytes(), Some(640 * 480 * 2));
        assert_eq!(header.get_str("LATOBS"), Some("45.76 N"));
        assert!(!header.contains("COMMENT"));
        assert_eq!(image_size(&layout), Ok((640, 480)));
        // positioned on the first data byte
        assert_eq!(reader.read_u8().unwrap(), 0x12);
    }

    #[test]
    fn test_read_primary_header_rejects_non_fits() {
        let bytes = vec![b'x'; FITS_BLOCK_SIZE];
        assert!(read_primary_header(&mut Cursor::new(bytes)).is_err());
    }

    #[test]
    fn test_read_primary_header_rejects_truncated_header() {
        let bytes = card("SIMPLE  =                    T").into_bytes();
        assert!(read_primary_header(&mut Cursor::new(bytes)).is_err());
    }

    #[test]
    fn test_read_primary_header_rejects_oversized_axes() {
        let bytes = header_block(&[
            "SIMPLE  =                    T",
            "BITPIX  =                   16",
            "NAXIS   =                    2",
            "NAXIS1  =           4294967296",
            "NAXIS2  =           4294967296",
        ]);
        let result = read_primary_header(&mut Cursor::new(bytes));
        assert!(result.unwrap_err().contains("NAXIS1"));
    }

    #[test]
    fn test_data_bytes_overflow() {
        let layout = PrimaryLayout {
            bitpix: 64,
            axes: vec![i32::MAX as usize; 4],
            header_bytes: FITS_BLOCK_SIZE,
        };
        assert_eq!(layout.data_bytes(), None);
    }

    #[test]
    fn test_image_size_rejects_cubes_and_empty_units() {
        let layout = |axes: Vec<usize>| PrimaryLayout {
            bitpix: 16,
            axes,
            header_bytes: FITS_BLOCK_SIZE,
        };
        assert!(image_size(&layout(vec![])).is_err());
        assert!(image_size(&layout(vec![10, 10, 3])).is_err());
        assert_eq!(image_size(&layout(vec![10, 20, 1])), Ok((10, 20)));
    }

    #[test]
    fn test_scaling_from_header() {
        let mut header = UnitHeader::new();
        assert_eq!(
            Scaling::from_header(&header),
            Ok(Scaling { zero: 0, blank: None })
        );

        header.set("BZERO", 32768.0f64);
        header.set("BSCALE", 1i64);
        header.set("BLANK", -1i64);
        assert_eq!(
            Scaling::from_header(&header),
            Ok(Scaling { zero: 32768, blank: Some(-1) })
        );

        header.set("BSCALE", 0.5f64);
        assert!(Scaling::from_header(&header).is_err());

        let mut header = UnitHeader::new();
        header.set("BZERO", 0.25f64);
        assert!(Scaling::from_header(&header).is_err());
    }

    #[test]
    fn test_read_samples_applies_unsigned_offset() {
        let scaling = Scaling { zero: 32768, blank: None };
        let bytes = [0x80u8, 0x00, 0x1C, 0x40, 0x7F, 0xFF];

        let samples =
            read_samples(&mut Cursor::new(bytes), SampleType::U16, 3, &scaling).unwrap();
        assert_eq!(samples, vec![0, 40000, 65535]);
    }

    #[test]
    fn test_read_samples_rejects_negative_and_blank() {
        let plain = Scaling { zero: 0, blank: None };
        let negative = [0xFFu8, 0xFF];
        assert!(read_samples(&mut Cursor::new(negative), SampleType::U16, 1, &plain).is_err());

        let blank = Scaling { zero: 0, blank: Some(7) };
        let bytes = [0x00u8, 0x03, 0x00, 0x07];
        let result = read_samples(&mut Cursor::new(bytes), SampleType::U16, 2, &blank);
        assert!(result.unwrap_err().contains("blank"));
    }
}
