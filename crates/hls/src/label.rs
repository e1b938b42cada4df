use std::fmt::Display;
use std::str::FromStr;

/// Canonical quality labels a variant can be mapped to.
///
/// Declaration order is the canonical ladder order: highest quality first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QualityLabel {
    P1080,
    P720,
    P480,
    P360,
}

impl QualityLabel {
    /// All labels in canonical (highest first) order.
    pub const CANONICAL: [QualityLabel; 4] = [
        QualityLabel::P1080,
        QualityLabel::P720,
        QualityLabel::P480,
        QualityLabel::P360,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityLabel::P1080 => "1080p",
            QualityLabel::P720 => "720p",
            QualityLabel::P480 => "480p",
            QualityLabel::P360 => "360p",
        }
    }

    /// Position in the canonical ladder, 0 being the highest quality.
    pub fn rank(&self) -> usize {
        match self {
            QualityLabel::P1080 => 0,
            QualityLabel::P720 => 1,
            QualityLabel::P480 => 2,
            QualityLabel::P360 => 3,
        }
    }

    fn numeric_prefix(&self) -> &'static str {
        match self {
            QualityLabel::P1080 => "1080",
            QualityLabel::P720 => "720",
            QualityLabel::P480 => "480",
            QualityLabel::P360 => "360",
        }
    }

    /// Map a vertical resolution to a label.
    ///
    /// The first canonical label whose numeric prefix matches the leading
    /// digits of `height` wins, so `1080` maps to `1080p` and `720` to `720p`.
    /// Heights that match no label (e.g. `1440`, `240`) yield `None`.
    pub fn from_height(height: u64) -> Option<Self> {
        let digits = height.to_string();
        Self::CANONICAL
            .into_iter()
            .find(|label| digits.starts_with(label.numeric_prefix()))
    }
}

impl Display for QualityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::CANONICAL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("unknown quality label `{s}`"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_height_exact() {
        assert_eq!(QualityLabel::from_height(1080), Some(QualityLabel::P1080));
        assert_eq!(QualityLabel::from_height(720), Some(QualityLabel::P720));
        assert_eq!(QualityLabel::from_height(480), Some(QualityLabel::P480));
        assert_eq!(QualityLabel::from_height(360), Some(QualityLabel::P360));
    }

    #[test]
    fn test_from_height_unrecognized() {
        assert_eq!(QualityLabel::from_height(1440), None);
        assert_eq!(QualityLabel::from_height(240), None);
        assert_eq!(QualityLabel::from_height(0), None);
    }

    #[test]
    fn test_from_height_leading_digits() {
        // Only the leading digits are compared.
        assert_eq!(QualityLabel::from_height(7200), Some(QualityLabel::P720));
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("720P".parse::<QualityLabel>(), Ok(QualityLabel::P720));
        assert_eq!(" 1080p ".parse::<QualityLabel>(), Ok(QualityLabel::P1080));
        assert!("4k".parse::<QualityLabel>().is_err());
    }

    #[test]
    fn test_rank_follows_canonical_order() {
        let ranks: Vec<usize> = QualityLabel::CANONICAL.iter().map(|l| l.rank()).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3]);
    }
}
