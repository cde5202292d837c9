use std::fmt;

use crate::error::TridentError;

/// Class label of a scanned sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Malicious,
    Clean,
    Unknown,
}

impl Label {
    /// Integer encoding used in the `isMalware` column
    pub fn code(self) -> i64 {
        match self {
            Label::Malicious => 1,
            Label::Clean => 0,
            Label::Unknown => -1,
        }
    }

    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Label::Malicious,
            0 => Label::Clean,
            _ => Label::Unknown,
        }
    }

    /// Parse a file-type tag as given on the command line
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "malware" | "malicious" => Some(Label::Malicious),
            "clean" | "benign" => Some(Label::Clean),
            _ => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Malicious => write!(f, "malicious"),
            Label::Clean => write!(f, "clean"),
            Label::Unknown => write!(f, "unknown"),
        }
    }
}

/// One row produced by an extractor
#[derive(Debug)]
pub struct FeatureRecord {
    /// File path of the sample
    pub name: String,
    pub label: Label,
    /// Feature values in schema order, excluding name, label and exception flag
    pub features: Vec<i64>,
    /// Set when an optional structure was defaulted or a lookup failed
    pub raised_exception: bool,
    /// The non-fatal conditions behind `raised_exception`
    pub anomalies: Vec<TridentError>,
}

impl FeatureRecord {
    pub fn new<S: Into<String>>(name: S, label: Label, features: Vec<i64>) -> Self {
        Self {
            name: name.into(),
            label,
            features,
            raised_exception: false,
            anomalies: Vec::new(),
        }
    }

    /// Record a non-fatal condition and raise the exception flag
    pub fn note(&mut self, anomaly: TridentError) {
        self.raised_exception = true;
        self.anomalies.push(anomaly);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_codes() {
        assert_eq!(Label::Malicious.code(), 1);
        assert_eq!(Label::Clean.code(), 0);
        assert_eq!(Label::Unknown.code(), -1);
        assert_eq!(Label::from_code(7), Label::Unknown);
    }

    #[test]
    fn test_label_tags() {
        assert_eq!(Label::from_tag("malware"), Some(Label::Malicious));
        assert_eq!(Label::from_tag("Clean"), Some(Label::Clean));
        assert_eq!(Label::from_tag("maybe"), None);
    }

    #[test]
    fn test_note_raises_flag() {
        let mut record = FeatureRecord::new("x", Label::Unknown, vec![]);
        assert!(!record.raised_exception);
        record.note(TridentError::missing_attribute("BaseOfData"));
        assert!(record.raised_exception);
        assert_eq!(record.anomalies.len(), 1);
    }
}
