//! Loading of EEG segments stored as MAT (Level 5) files.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use matfile::{Array, MatFile, NumericData};
use tracing::debug;

use crate::error::{AnalysisError, Result};

/// One segment: a channels × samples matrix and its sampling rate.
#[derive(Clone, Debug, PartialEq)]
pub struct Recording {
    /// Column-major samples, as stored in the container.
    data: Vec<f64>,
    rows: usize,
    cols: usize,
    pub freq: f64,
}

impl Recording {
    /// Build a recording from one sample vector per channel.
    #[cfg(test)]
    pub fn from_channels(channels: &[Vec<f64>], freq: f64) -> Recording {
        let rows = channels.len();
        let cols = channels.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows * cols);
        for col in 0..cols {
            data.extend(channels.iter().map(|channel| channel[col]));
        }
        Recording {
            data,
            rows,
            cols,
            freq,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.rows
    }

    pub fn sample_count(&self) -> usize {
        self.cols
    }

    /// Collapse the channels into one signal by averaging each sample.
    ///
    /// Rows are channels, so an `N×1` matrix becomes a single sample.
    pub fn reduce_channels(&self) -> Vec<f64> {
        if self.rows == 1 {
            return self.data.clone();
        }

        let rows = self.rows as f64;
        self.data
            .chunks_exact(self.rows)
            .map(|column| column.iter().sum::<f64>() / rows)
            .collect()
    }
}

/// Read `data` and `freq` from the MAT file at `path`.
pub fn load_recording(path: &Path) -> Result<Recording> {
    let file = File::open(path).map_err(|e| AnalysisError::load(path, e.to_string()))?;
    let mat = MatFile::parse(BufReader::new(file))
        .map_err(|e| AnalysisError::load(path, format!("not a readable MAT file: {:?}", e)))?;

    let data = find_field(&mat, "data", path)?;
    let freq = find_field(&mat, "freq", path)?;

    let freq = real_as_f64(freq)
        .first()
        .copied()
        .ok_or_else(|| AnalysisError::load(path, "field 'freq' is empty"))?;
    if !freq.is_finite() || freq <= 0.0 {
        return Err(AnalysisError::load(
            path,
            format!("sampling frequency must be positive, got {}", freq),
        ));
    }

    let (rows, cols) = match data.size().as_slice() {
        [rows, cols] => (*rows, *cols),
        [len] => (1, *len),
        dims => {
            return Err(AnalysisError::load(
                path,
                format!("field 'data' has unsupported shape {:?}", dims),
            ));
        }
    };
    let samples = real_as_f64(data);
    if samples.is_empty() {
        return Err(AnalysisError::load(
            path,
            format!("field 'data' holds no samples (shape {}x{})", rows, cols),
        ));
    }
    if samples.len() != rows * cols {
        return Err(AnalysisError::load(
            path,
            format!(
                "field 'data' holds {} values but its shape {}x{} needs {}",
                samples.len(),
                rows,
                cols,
                rows * cols
            ),
        ));
    }

    let recording = Recording {
        data: samples,
        rows,
        cols,
        freq,
    };
    debug!(
        "loaded {}: {} channels x {} samples at {} Hz",
        path.display(),
        recording.channel_count(),
        recording.sample_count(),
        freq
    );
    Ok(recording)
}

fn find_field<'a>(mat: &'a MatFile, name: &str, path: &Path) -> Result<&'a Array> {
    mat.find_by_name(name)
        .ok_or_else(|| AnalysisError::load(path, format!("missing field '{}'", name)))
}

/// Real part of any numeric class, widened to f64.
fn real_as_f64(array: &Array) -> Vec<f64> {
    fn widen<T: Copy + Into<f64>>(values: &[T]) -> Vec<f64> {
        values.iter().map(|&v| v.into()).collect()
    }

    match array.data() {
        NumericData::Double { real, .. } => real.clone(),
        NumericData::Single { real, .. } => widen(real),
        NumericData::Int8 { real, .. } => widen(real),
        NumericData::UInt8 { real, .. } => widen(real),
        NumericData::Int16 { real, .. } => widen(real),
        NumericData::UInt16 { real, .. } => widen(real),
        NumericData::Int32 { real, .. } => widen(real),
        NumericData::UInt32 { real, .. } => widen(real),
        NumericData::Int64 { real, .. } => real.iter().map(|&v| v as f64).collect(),
        NumericData::UInt64 { real, .. } => real.iter().map(|&v| v as f64).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{MI_DOUBLE, MX_DOUBLE_CLASS, MatWriter, write_recording};

    #[test]
    fn two_channels_average_per_sample() {
        let recording = Recording::from_channels(&[vec![1.0; 6], vec![3.0; 6]], 256.0);
        assert_eq!(recording.channel_count(), 2);
        assert_eq!(recording.reduce_channels(), vec![2.0; 6]);
    }

    #[test]
    fn reduction_is_per_sample() {
        let recording =
            Recording::from_channels(&[vec![0.0, 1.0, 2.0], vec![2.0, 3.0, 6.0]], 100.0);
        assert_eq!(recording.reduce_channels(), vec![1.0, 2.0, 4.0]);
    }

    #[test]
    fn single_channel_is_untouched() {
        let signal = vec![0.5, -1.0, 2.0, 4.0];
        let recording = Recording::from_channels(&[signal.clone()], 100.0);
        assert_eq!(recording.channel_count(), 1);
        assert_eq!(recording.sample_count(), 4);
        assert_eq!(recording.reduce_channels(), signal);
    }

    #[test]
    fn loads_matrix_and_nested_freq() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p1_ictal_seg1.mat");
        write_recording(&path, &[vec![1.0, 2.0, 3.0], vec![3.0, 4.0, 5.0]], 400.0);

        let recording = load_recording(&path).unwrap();
        assert_eq!(recording.freq, 400.0);
        assert_eq!(recording.channel_count(), 2);
        assert_eq!(recording.sample_count(), 3);
        assert_eq!(recording.reduce_channels(), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn row_vector_is_one_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("row.mat");
        MatWriter::new()
            .double("data", 1, 4, &[1.0, 2.0, 3.0, 4.0])
            .double("freq", 1, 1, &[2.0])
            .write(&path);

        let recording = load_recording(&path).unwrap();
        assert_eq!(recording.channel_count(), 1);
        assert_eq!(recording.sample_count(), 4);
        assert_eq!(recording.reduce_channels(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn column_vector_is_channels_of_one_sample() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("column.mat");
        MatWriter::new()
            .double("data", 3, 1, &[1.0, 2.0, 6.0])
            .double("freq", 1, 1, &[2.0])
            .write(&path);

        let recording = load_recording(&path).unwrap();
        assert_eq!(recording.channel_count(), 3);
        assert_eq!(recording.sample_count(), 1);
        assert_eq!(recording.reduce_channels(), vec![3.0]);
    }

    #[test]
    fn missing_data_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nodata.mat");
        MatWriter::new().double("freq", 1, 1, &[256.0]).write(&path);

        let err = load_recording(&path).unwrap_err();
        match err {
            AnalysisError::Load { reason, .. } => assert!(reason.contains("'data'")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn integer_freq_is_widened() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("intfreq.mat");
        MatWriter::new()
            .double("data", 1, 3, &[1.0, 2.0, 3.0])
            .int32("freq", 1, 1, &[512])
            .write(&path);

        let recording = load_recording(&path).unwrap();
        assert_eq!(recording.freq, 512.0);
    }

    #[test]
    fn missing_freq_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nofreq.mat");
        MatWriter::new().double("data", 1, 2, &[0.0, 1.0]).write(&path);

        let err = load_recording(&path).unwrap_err();
        match err {
            AnalysisError::Load { reason, .. } => assert!(reason.contains("freq")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_positive_freq_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zero.mat");
        write_recording(&path, &[vec![0.0, 1.0]], 0.0);

        assert!(matches!(
            load_recording(&path),
            Err(AnalysisError::Load { .. })
        ));
    }

    #[test]
    fn empty_data_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.mat");
        MatWriter::new()
            .double("data", 0, 0, &[])
            .double("freq", 1, 1, &[256.0])
            .write(&path);

        match load_recording(&path).unwrap_err() {
            AnalysisError::Load { reason, .. } => assert!(reason.contains("no samples")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn short_data_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.mat");
        let three: Vec<u8> = [1.0f64, 2.0, 3.0].iter().flat_map(|v| v.to_le_bytes()).collect();
        MatWriter::new()
            .matrix("data", MX_DOUBLE_CLASS, MI_DOUBLE, 2, 2, &three)
            .double("freq", 1, 1, &[256.0])
            .write(&path);

        assert!(matches!(
            load_recording(&path),
            Err(AnalysisError::Load { .. })
        ));
    }

    #[test]
    fn garbage_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.mat");
        std::fs::write(&path, b"definitely not a matrix container").unwrap();

        assert!(matches!(
            load_recording(&path),
            Err(AnalysisError::Load { .. })
        ));
    }
}
