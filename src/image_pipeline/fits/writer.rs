use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{BigEndian, WriteBytesExt};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::fits::format::{
    FITS_CARD_SIZE, MAX_KEY_LEN, bitpix, block_padding, unsigned_zero,
};
use crate::image_pipeline::fits::header::{CardValue, UnitHeader};
use crate::image_pipeline::fits::observation::fill_location_defaults;
use crate::image_pipeline::pixels::{Plane, SampleType};

/// Cards derived from the data itself, never copied from a caller's header.
const STRUCTURAL_KEYS: &[&str] = &[
    "SIMPLE", "BITPIX", "NAXIS", "NAXIS1", "NAXIS2", "NAXIS3", "EXTEND", "BZERO", "BSCALE",
    "BLANK", "XTENSION", "PCOUNT", "GCOUNT", "END",
];

/// Longest string that fits on a single card between the quotes.
const MAX_STRING_LEN: usize = 68;

/// Options for writing FITS units
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// Replace a file already present at the destination
    pub overwrite: bool,
}

impl WriteOptions {
    pub fn overwriting() -> Self {
        Self { overwrite: true }
    }
}

fn write_error(path: &Path, reason: impl std::fmt::Display) -> ConversionError {
    ConversionError::UnitWriteError(format!("{}: {}", path.display(), reason))
}

/// Writes `grid` as the primary unit of a new FITS file.
///
/// Samples keep their width: 8-bit grids are stored as BITPIX 8, 16 and
/// 32-bit grids as signed data with the unsigned BZERO offset. Every card of
/// `header` is written verbatim; `LATOBS` and `LONGOBS` default to
/// "Not informed" when absent.
///
/// The unit is written to a temporary file next to `path` and moved into
/// place once complete, so a failed write never leaves a partial file nor
/// destroys the one it would have replaced.
#[instrument(skip(grid, header, options), fields(path = %path.display(), width = grid.width(), height = grid.height()))]
pub fn write_unit(grid: &Plane, path: &Path, header: &UnitHeader, options: &WriteOptions) -> Result<()> {
    let mut header = header.clone();
    fill_location_defaults(&mut header);

    let mut cards = structural_cards(grid);
    for (key, value) in header.iter() {
        if STRUCTURAL_KEYS.contains(&key) {
            debug!(key, "Skipping structural card");
            continue;
        }
        let card = validate_key(key)
            .and_then(|_| format_value(key, value))
            .map(|value| value_card(key, &value))
            .map_err(|reason| write_error(path, reason))?;
        cards.push(card);
    }

    if path.exists() && !options.overwrite {
        return Err(write_error(path, "file already exists"));
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir).map_err(|e| write_error(path, e))?;
    {
        let mut out = BufWriter::new(staged.as_file_mut());
        write_header(&mut out, &cards)
            .and_then(|_| write_samples(&mut out, grid))
            .and_then(|_| out.flush())
            .map_err(|e| write_error(path, e))?;
    }

    if options.overwrite {
        staged.persist(path).map_err(|e| write_error(path, e))?;
    } else {
        staged.persist_noclobber(path).map_err(|e| write_error(path, e))?;
    }

    info!(sample_type = ?grid.sample_type(), "Wrote FITS unit");
    Ok(())
}

fn structural_cards(grid: &Plane) -> Vec<String> {
    let sample_type = grid.sample_type();
    let mut cards = vec![
        value_card("SIMPLE", &format!("{:>20}", "T")),
        value_card("BITPIX", &format!("{:>20}", bitpix(sample_type))),
        value_card("NAXIS", &format!("{:>20}", 2)),
        value_card("NAXIS1", &format!("{:>20}", grid.width())),
        value_card("NAXIS2", &format!("{:>20}", grid.height())),
    ];
    let zero = unsigned_zero(sample_type);
    if zero != 0 {
        cards.push(value_card("BZERO", &format!("{:>20}", zero)));
        cards.push(value_card("BSCALE", &format!("{:>20}", 1)));
    }
    cards
}

/// One 80-column card, `value` starting at column 11.
fn value_card(key: &str, value: &str) -> String {
    format!("{:<width$}= {:<rest$}", key, value, width = MAX_KEY_LEN, rest = FITS_CARD_SIZE - 10)
}

fn write_header<W: Write>(out: &mut W, cards: &[String]) -> std::io::Result<()> {
    for card in cards {
        out.write_all(card.as_bytes())?;
    }
    out.write_all(format!("{:<80}", "END").as_bytes())?;

    let written = (cards.len() + 1) * FITS_CARD_SIZE;
    out.write_all(&vec![b' '; block_padding(written)])
}

fn write_samples<W: Write>(out: &mut W, grid: &Plane) -> std::io::Result<()> {
    let sample_type = grid.sample_type();
    let zero = unsigned_zero(sample_type);

    // Constructors guarantee every sample fits its type, so the shifted
    // values fit the signed storage type.
    for &value in grid.samples() {
        let stored = i64::from(value) - zero;
        match sample_type {
            SampleType::U8 => out.write_u8(stored as u8)?,
            SampleType::U16 => out.write_i16::<BigEndian>(stored as i16)?,
            SampleType::U32 => out.write_i32::<BigEndian>(stored as i32)?,
        }
    }

    let data_bytes = grid.samples().len() * (sample_type.bits() as usize / 8);
    out.write_all(&vec![0u8; block_padding(data_bytes)])
}

fn validate_key(key: &str) -> std::result::Result<(), String> {
    let valid = !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && key
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(format!("invalid header key {:?}", key))
    }
}

/// Value field of a card, fixed format for numbers and logicals.
fn format_value(key: &str, value: &CardValue) -> std::result::Result<String, String> {
    match value {
        CardValue::String(s) => {
            let escaped = s.replace('\'', "''");
            if escaped.len() > MAX_STRING_LEN || !s.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) {
                return Err(format!(
                    "value of {} must be printable ASCII and at most {} characters",
                    key, MAX_STRING_LEN
                ));
            }
            Ok(format!("'{:<8}'", escaped))
        }
        CardValue::Integer(i) => Ok(format!("{:>20}", i)),
        CardValue::Float(f) if f.is_finite() => {
            Ok(format!("{:>20}", format!("{:?}", f).replace('e', "E")))
        }
        CardValue::Float(_) => Err(format!("value of {} is not a finite number", key)),
        CardValue::Logical(b) => Ok(format!("{:>20}", if *b { "T" } else { "F" })),
    }
}
