//! Failure modes of the comparison pipeline.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Input directory does not exist
    #[error("input directory not found: {}", path.display())]
    DirectoryNotFound { path: PathBuf },

    /// Directory listing failed for a reason other than absence
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Recording could not be parsed or lacks `data`/`freq`
    #[error("failed to load {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    /// A class has no matching files
    #[error("no input files for class '{class}'")]
    EmptyInput { class: String },

    /// PSD curves within one class differ in length
    #[error("PSD of {} has {found} bins, expected {expected}", path.display())]
    InconsistentShape {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("FFT failed: {0}")]
    Fft(#[from] realfft::FftError),
}

impl AnalysisError {
    pub(crate) fn load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        AnalysisError::Load {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
