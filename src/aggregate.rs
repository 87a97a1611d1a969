//! Per-class averaging of Welch PSD curves.

use std::path::{Path, PathBuf};

use crossbeam_channel as chan;
use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::psd::{Welch, segment_length};
use crate::recording::load_recording;
use crate::types::{Class, ClassAggregate, PsdCurve};

/// Load one file, collapse its channels and estimate its PSD.
pub fn file_psd(welch: &mut Welch, path: &Path) -> Result<PsdCurve> {
    let recording = load_recording(path)?;
    let signal = recording.reduce_channels();
    let curve = welch.estimate(&signal, recording.freq, segment_length(recording.freq))?;
    debug!("{}: {} bins", path.display(), curve.len());
    Ok(curve)
}

/// Element-wise mean of `curves`, keeping the frequency axis of the last one.
pub fn average_curves(class: &str, curves: Vec<(PathBuf, PsdCurve)>) -> Result<PsdCurve> {
    let Some((_, first)) = curves.first() else {
        return Err(AnalysisError::EmptyInput {
            class: class.to_string(),
        });
    };

    let expected = first.len();
    if let Some((path, curve)) = curves.iter().find(|(_, curve)| curve.len() != expected) {
        return Err(AnalysisError::InconsistentShape {
            path: path.clone(),
            expected,
            found: curve.len(),
        });
    }

    let count = curves.len() as f64;
    let mut sum = vec![0.0f64; expected];
    for (_, curve) in &curves {
        for (acc, p) in sum.iter_mut().zip(&curve.power) {
            *acc += p;
        }
    }

    let frequencies = curves
        .into_iter()
        .last()
        .map(|(_, curve)| curve.frequencies)
        .unwrap_or_default();
    let power = sum.into_iter().map(|p| p / count).collect();

    Ok(PsdCurve { frequencies, power })
}

/// Mean PSD over `files` (names relative to `dir`) for one class.
///
/// With `jobs > 1` the files are spread over scoped worker threads; results
/// are put back in file order so the outcome matches a sequential run.
pub fn compute_class(
    dir: &Path,
    files: &[String],
    class: Class,
    jobs: usize,
) -> Result<ClassAggregate> {
    if files.is_empty() {
        return Err(AnalysisError::EmptyInput {
            class: class.marker().to_string(),
        });
    }

    let curves = if jobs <= 1 || files.len() == 1 {
        let mut welch = Welch::new();
        files
            .iter()
            .map(|name| {
                let path = dir.join(name);
                file_psd(&mut welch, &path).map(|curve| (path, curve))
            })
            .collect::<Result<Vec<_>>>()?
    } else {
        curves_parallel(dir, files, jobs.min(files.len()))?
    };

    let curve = average_curves(class.marker(), curves)?;
    Ok(ClassAggregate {
        class,
        file_count: files.len(),
        curve,
    })
}

fn curves_parallel(
    dir: &Path,
    files: &[String],
    jobs: usize,
) -> Result<Vec<(PathBuf, PsdCurve)>> {
    let (tx_paths, rx_paths) = chan::unbounded::<(usize, PathBuf)>();
    let (tx_curves, rx_curves) = chan::unbounded::<(usize, PathBuf, Result<PsdCurve>)>();

    for (index, name) in files.iter().enumerate() {
        // receiver is alive until the end of this function
        let _ = tx_paths.send((index, dir.join(name)));
    }
    drop(tx_paths);

    std::thread::scope(|scope| {
        for _ in 0..jobs {
            let rx_paths = rx_paths.clone();
            let tx_curves = tx_curves.clone();
            scope.spawn(move || {
                let mut welch = Welch::new();
                while let Ok((index, path)) = rx_paths.recv() {
                    let result = file_psd(&mut welch, &path);
                    if tx_curves.send((index, path, result)).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(tx_curves);

    let mut slots: Vec<Option<(PathBuf, Result<PsdCurve>)>> = files.iter().map(|_| None).collect();
    for (index, path, result) in rx_curves.iter() {
        slots[index] = Some((path, result));
    }

    slots
        .into_iter()
        .flatten()
        .map(|(path, result)| result.map(|curve| (path, curve)))
        .collect()
}
