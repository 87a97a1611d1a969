//! Minimal MAT (Level 5, little-endian) writer for test fixtures.

use std::fs;
use std::path::Path;

const MI_INT8: u32 = 1;
const MI_INT32: u32 = 5;
const MI_UINT32: u32 = 6;
pub const MI_DOUBLE: u32 = 9;
const MI_MATRIX: u32 = 14;
pub const MX_DOUBLE_CLASS: u32 = 6;
const MX_INT32_CLASS: u32 = 12;

#[derive(Default)]
pub struct MatWriter {
    body: Vec<u8>,
}

impl MatWriter {
    pub fn new() -> MatWriter {
        MatWriter::default()
    }

    /// Append a real double matrix; `values` are column-major.
    pub fn double(self, name: &str, rows: usize, cols: usize, values: &[f64]) -> MatWriter {
        assert_eq!(rows * cols, values.len());
        let real: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.matrix(name, MX_DOUBLE_CLASS, MI_DOUBLE, rows, cols, &real)
    }

    /// Append a real int32 matrix; `values` are column-major.
    pub fn int32(self, name: &str, rows: usize, cols: usize, values: &[i32]) -> MatWriter {
        assert_eq!(rows * cols, values.len());
        let real: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.matrix(name, MX_INT32_CLASS, MI_INT32, rows, cols, &real)
    }

    /// Append a matrix from raw little-endian element bytes.
    pub fn matrix(
        mut self,
        name: &str,
        class: u32,
        data_type: u32,
        rows: usize,
        cols: usize,
        real: &[u8],
    ) -> MatWriter {
        let mut matrix = Vec::new();
        element(&mut matrix, MI_UINT32, &{
            let mut flags = class.to_le_bytes().to_vec();
            flags.extend_from_slice(&0u32.to_le_bytes());
            flags
        });
        element(&mut matrix, MI_INT32, &{
            let mut dims = (rows as i32).to_le_bytes().to_vec();
            dims.extend_from_slice(&(cols as i32).to_le_bytes());
            dims
        });
        if name.len() <= 4 {
            // small data element: size and type share the tag word
            let tag = ((name.len() as u32) << 16) | MI_INT8;
            matrix.extend_from_slice(&tag.to_le_bytes());
            let mut packed = [0u8; 4];
            packed[..name.len()].copy_from_slice(name.as_bytes());
            matrix.extend_from_slice(&packed);
        } else {
            element(&mut matrix, MI_INT8, name.as_bytes());
        }
        element(&mut matrix, data_type, real);

        element(&mut self.body, MI_MATRIX, &matrix);
        self
    }

    pub fn write(self, path: &Path) {
        let mut text = b"MATLAB 5.0 MAT-file, written by ieeg-psd tests".to_vec();
        text.resize(116, b' ');

        let mut bytes = text;
        bytes.extend_from_slice(&[0u8; 8]);
        bytes.extend_from_slice(&0x0100u16.to_le_bytes());
        bytes.extend_from_slice(b"IM");
        bytes.extend_from_slice(&self.body);
        fs::write(path, bytes).unwrap();
    }
}

fn element(out: &mut Vec<u8>, data_type: u32, payload: &[u8]) {
    out.extend_from_slice(&data_type.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    let padding = (8 - payload.len() % 8) % 8;
    out.extend(std::iter::repeat_n(0u8, padding));
}

/// Write a recording whose channels are the rows of `data`.
pub fn write_recording(path: &Path, channels: &[Vec<f64>], freq: f64) {
    let rows = channels.len();
    let cols = channels[0].len();
    let column_major: Vec<f64> = (0..cols)
        .flat_map(|col| channels.iter().map(move |channel| channel[col]))
        .collect();

    MatWriter::new()
        .double("data", rows, cols, &column_major)
        .double("freq", 1, 1, &[freq])
        .write(path);
}
