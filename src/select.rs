//! File discovery by class marker.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::types::Class;

pub const RECORDING_EXTENSION: &str = ".mat";

const MARKERS: [&str; 2] = [Class::Ictal.marker(), Class::Interictal.marker()];

/// True when `name` holds an occurrence of `marker` that is not just a
/// fragment of a longer class marker ("ictal" inside "interictal").
pub fn has_marker(name: &str, marker: &str) -> bool {
    let masked: Vec<(usize, usize)> = MARKERS
        .iter()
        .filter(|longer| longer.len() > marker.len() && longer.contains(marker))
        .flat_map(|longer| {
            name.match_indices(longer)
                .map(move |(start, _)| (start, start + longer.len()))
        })
        .collect();

    name.match_indices(marker).any(|(start, _)| {
        let end = start + marker.len();
        !masked.iter().any(|&(lo, hi)| lo <= start && end <= hi)
    })
}

/// Sorted names of the recordings in `dir` carrying `marker`.
///
/// Markers are matched independently, so a name carrying both is returned
/// for both classes.
pub fn select_files(dir: &Path, marker: &str) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir).map_err(|source| match source.kind() {
        ErrorKind::NotFound => AnalysisError::DirectoryNotFound {
            path: dir.to_path_buf(),
        },
        _ => AnalysisError::Io {
            path: dir.to_path_buf(),
            source,
        },
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| AnalysisError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let Ok(name) = entry.file_name().into_string() else {
            debug!("skipping non UTF-8 file name {:?}", entry.file_name());
            continue;
        };
        if has_marker(&name, marker) && name.ends_with(RECORDING_EXTENSION) {
            names.push(name);
        }
    }

    names.sort();
    debug!("{} files match '{}' in {}", names.len(), marker, dir.display());
    Ok(names)
}
