/// The two recording classes being compared.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Class {
    Ictal,
    Interictal,
}

impl Class {
    /// Substring a filename must contain to belong to this class.
    pub const fn marker(self) -> &'static str {
        match self {
            Class::Ictal => "ictal",
            Class::Interictal => "interictal",
        }
    }

    /// Legend label used by the chart.
    pub const fn label(self) -> &'static str {
        match self {
            Class::Ictal => "Seizure (Ictal)",
            Class::Interictal => "Baseline (Interictal)",
        }
    }
}

/// One Welch estimate: frequency bins in Hz and power in V²/Hz.
#[derive(Clone, Debug, PartialEq)]
pub struct PsdCurve {
    pub frequencies: Vec<f64>,
    pub power: Vec<f64>,
}

impl PsdCurve {
    pub fn len(&self) -> usize {
        self.power.len()
    }

    /// Spacing between adjacent bins, zero for a single-bin curve.
    pub fn resolution(&self) -> f64 {
        match self.frequencies.as_slice() {
            [first, second, ..] => second - first,
            _ => 0.0,
        }
    }
}

/// Mean PSD over every file of one class.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassAggregate {
    pub class: Class,
    pub file_count: usize,
    pub curve: PsdCurve,
}
