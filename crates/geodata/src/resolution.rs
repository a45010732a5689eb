use serde::{Deserialize, Serialize};

/// Administrative granularity of a spatial query.
///
/// Each resolution maps to a fixed key length in the municipal key scheme;
/// the conversion is total and bidirectional by length lookup.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    State,
    District,
    Administration,
    Municipal,
}

impl Resolution {
    /// Number of key characters identifying a shape at this resolution.
    pub fn key_length(self) -> usize {
        match self {
            Resolution::State => 2,
            Resolution::District => 5,
            Resolution::Administration => 9,
            Resolution::Municipal => 12,
        }
    }

    pub fn from_key_length(length: usize) -> Option<Self> {
        match length {
            2 => Some(Resolution::State),
            5 => Some(Resolution::District),
            9 => Some(Resolution::Administration),
            12 => Some(Resolution::Municipal),
            _ => None,
        }
    }

    /// Lowercase name used as the `resolution` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Resolution::State => "state",
            Resolution::District => "district",
            Resolution::Administration => "administration",
            Resolution::Municipal => "municipal",
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Resolution;
    use pretty_assertions::assert_eq;

    #[test]
    fn key_length_round_trips() {
        for res in [
            Resolution::State,
            Resolution::District,
            Resolution::Administration,
            Resolution::Municipal,
        ] {
            assert_eq!(Resolution::from_key_length(res.key_length()), Some(res));
        }
        assert_eq!(Resolution::from_key_length(3), None);
    }

    #[test]
    fn serializes_as_lowercase_name() {
        let json = serde_json::to_string(&Resolution::District).unwrap();
        assert_eq!(json, "\"district\"");
        let back: Resolution = serde_json::from_str("\"municipal\"").unwrap();
        assert_eq!(back, Resolution::Municipal);
    }
}
