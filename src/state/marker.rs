/// Terminal probe markers recorded on resolved URLs
///
/// Downstream stages read the marker as a literal ` (tag)` suffix on the
/// resolved URL column, so the textual form here is a storage contract.
use std::fmt;

/// Outcome recorded on a probed record
///
/// Once a resolved URL carries any marker the record is never probed again and
/// never contributes paths to the observation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    /// The path-less destination answered directly
    Access,

    /// A window candidate answered; the stored URL is the winning candidate
    SubpageFound,

    /// Neither the destination nor any candidate answered
    SubpageMissing,
}

impl Marker {
    /// Tag text stored inside the parentheses
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::SubpageFound => "sub_o",
            Self::SubpageMissing => "sub_x",
        }
    }

    /// Appends this marker to a URL: `https://a.example/x (sub_o)`
    pub fn apply(&self, url: &str) -> String {
        format!("{} ({})", url, self.tag())
    }

    /// Finds a marker anywhere in a stored value, ignoring case
    pub fn detect(value: &str) -> Option<Self> {
        let lowered = value.to_lowercase();
        Self::all()
            .into_iter()
            .find(|marker| lowered.contains(&format!("({})", marker.tag())))
    }

    /// Returns true if the stored value already carries a terminal marker
    pub fn is_marked(value: &str) -> bool {
        Self::detect(value).is_some()
    }

    /// SQL `LIKE` pattern matching values carrying this marker
    ///
    /// `_` is escaped with `\`, so the query must declare `ESCAPE '\'`.
    pub fn like_pattern(&self) -> String {
        format!("%({})%", self.tag().replace('_', "\\_"))
    }

    pub fn all() -> [Self; 3] {
        [Self::Access, Self::SubpageFound, Self::SubpageMissing]
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}
