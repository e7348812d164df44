use std::fmt;

/// Priority tier for job submission.
///
/// The queue has exactly three levels; the tier picks which of the three
/// submission command codes goes on the wire, nothing is encoded in the
/// payload. High jobs always take precedence over Normal, and Normal over
/// Low.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
