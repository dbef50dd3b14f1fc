//! Predictor reversal (spec §4.9): the in-place accumulation step applied to decompressed bytes
//! before they reach the layout assembler.
//!
//! Grounded on `image-rs-image-tiff`'s `decoder::predictor` module (`rev_hpredict_nsamp`,
//! `fp_predict`), generalised into one width-generic, byte-buffer-level routine rather than two
//! numeric-type-specialised functions, since the specification describes both predictors as the
//! same recurrence over `element_size`-wide words (integer words for `Horizontal`, bit-cast float
//! words for `FloatingPoint`).

use crate::byteorder::ByteOrder;

/// Recognised predictor scheme (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Predictor {
    None,
    Horizontal,
    FloatingPoint,
}

impl Predictor {
    pub fn from_code(code: u16) -> Predictor {
        match code {
            crate::tags::predictor_code::HORIZONTAL => Predictor::Horizontal,
            crate::tags::predictor_code::FLOATING_POINT => Predictor::FloatingPoint,
            _ => Predictor::None,
        }
    }
}

/// Reverse the predictor in place over `data`, row by row, where each row is `width *
/// samples_per_pixel` elements of `element_size` bytes (spec §4.9: "Recursion stride is width ×
/// samples_per_pixel").
///
/// `Horizontal` operates on integer element widths only and is a no-op for float pixel types;
/// `FloatingPoint` operates on the matching float width's bit pattern, reinterpreted as an
/// unsigned integer of the same width, and is a no-op for integer pixel types. Widths below 2
/// elements per row have nothing to accumulate against and are left untouched.
#[allow(clippy::too_many_arguments)]
pub fn reverse_predictor(
    predictor: Predictor,
    data: &mut [u8],
    element_size: usize,
    width: usize,
    height: usize,
    samples_per_pixel: usize,
    order: ByteOrder,
    is_float: bool,
) {
    match predictor {
        Predictor::None => {
            tracing::trace!("predictor dispatch: none");
        }
        Predictor::Horizontal => {
            if is_float {
                tracing::trace!("predictor dispatch: horizontal is a no-op for float pixels");
            } else {
                tracing::trace!(width, height, samples_per_pixel, "predictor dispatch: horizontal");
                reverse_rows(data, element_size, width, height, samples_per_pixel, order);
            }
        }
        Predictor::FloatingPoint => {
            if is_float {
                tracing::trace!(width, height, samples_per_pixel, "predictor dispatch: floating point");
                reverse_rows(data, element_size, width, height, samples_per_pixel, order);
            } else {
                tracing::trace!("predictor dispatch: floating point is a no-op for integer pixels");
            }
        }
    }
}

fn reverse_rows(data: &mut [u8], element_size: usize, width: usize, height: usize, samples_per_pixel: usize, order: ByteOrder) {
    if width < 2 {
        return;
    }
    let stride_elements = width * samples_per_pixel;
    let row_bytes = stride_elements * element_size;

    for row in 0..height {
        let row_start = row * row_bytes;
        let Some(row_data) = data.get_mut(row_start..row_start + row_bytes) else { break };
        for col in 1..width {
            for s in 0..samples_per_pixel {
                let elem_index = col * samples_per_pixel + s;
                let prev_index = (col - 1) * samples_per_pixel + s;
                add_wrapping_element(row_data, elem_index, prev_index, element_size, order);
            }
        }
    }
}

fn add_wrapping_element(row: &mut [u8], elem_index: usize, prev_index: usize, element_size: usize, order: ByteOrder) {
    let elem_off = elem_index * element_size;
    let prev_off = prev_index * element_size;

    match element_size {
        1 => {
            row[elem_off] = row[elem_off].wrapping_add(row[prev_off]);
        }
        2 => {
            let prev = order.read_u16(&row[prev_off..prev_off + 2]);
            let cur = order.read_u16(&row[elem_off..elem_off + 2]);
            write_u16(&mut row[elem_off..elem_off + 2], cur.wrapping_add(prev), order);
        }
        4 => {
            let prev = order.read_u32(&row[prev_off..prev_off + 4]);
            let cur = order.read_u32(&row[elem_off..elem_off + 4]);
            write_u32(&mut row[elem_off..elem_off + 4], cur.wrapping_add(prev), order);
        }
        8 => {
            let prev = order.read_u64(&row[prev_off..prev_off + 8]);
            let cur = order.read_u64(&row[elem_off..elem_off + 8]);
            write_u64(&mut row[elem_off..elem_off + 8], cur.wrapping_add(prev), order);
        }
        other => unreachable!("unsupported predictor element size {other}"),
    }
}

fn write_u16(dst: &mut [u8], value: u16, order: ByteOrder) {
    let bytes = match order {
        ByteOrder::Little => value.to_le_bytes(),
        ByteOrder::Big => value.to_be_bytes(),
    };
    dst.copy_from_slice(&bytes);
}

fn write_u32(dst: &mut [u8], value: u32, order: ByteOrder) {
    let bytes = match order {
        ByteOrder::Little => value.to_le_bytes(),
        ByteOrder::Big => value.to_be_bytes(),
    };
    dst.copy_from_slice(&bytes);
}

fn write_u64(dst: &mut [u8], value: u64, order: ByteOrder) {
    let bytes = match order {
        ByteOrder::Little => value.to_le_bytes(),
        ByteOrder::Big => value.to_be_bytes(),
    };
    dst.copy_from_slice(&bytes);
}
