use geodata::Resolution;

/// Composite cache key: resolution ordinal plus the normalized key set.
///
/// Two queries with the same resolution and the same normalized key set are
/// cache-equivalent. The ordinal is the resolution's key length, `-1` when no
/// resolution was given, so an unresolved "fetch everything" query gets its
/// own distinct key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueryKey {
    pub resolution_ordinal: i32,
    pub keys: Vec<String>,
}

impl QueryKey {
    /// Normalizes a request into its cache key.
    ///
    /// With a resolution, every requested key is truncated to the
    /// resolution's key length first, so callers may pass over-specified
    /// keys (e.g. a municipal key while asking for state-resolution data).
    /// Without a resolution keys are used verbatim and never truncated,
    /// otherwise distinct key sets would collide in the cache. Keys are then
    /// sorted and deduplicated; the normalized set is also what goes out to
    /// the remote source.
    pub fn build(resolution: Option<Resolution>, keys: &[String]) -> Self {
        let resolution_ordinal = resolution.map(|r| r.key_length() as i32).unwrap_or(-1);
        let mut keys: Vec<String> = match resolution {
            Some(res) => keys
                .iter()
                .map(|key| key.chars().take(res.key_length()).collect())
                .collect(),
            None => keys.to_vec(),
        };
        keys.sort();
        keys.dedup();
        Self {
            resolution_ordinal,
            keys,
        }
    }

    /// Deterministic rendering of the composite key for the query index.
    ///
    /// Components are joined with an ASCII unit separator, which cannot
    /// appear in administrative keys.
    pub fn storage_key(&self) -> String {
        let mut out = self.resolution_ordinal.to_string();
        for key in &self.keys {
            out.push('\u{1f}');
            out.push_str(key);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::QueryKey;
    use geodata::Resolution;
    use pretty_assertions::assert_eq;

    fn keys(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn truncates_sorts_and_dedupes_with_resolution() {
        let key = QueryKey::build(
            Some(Resolution::District),
            &keys(&["0340300000", "03403", "01001000"]),
        );
        assert_eq!(key.resolution_ordinal, 5);
        assert_eq!(key.keys, keys(&["01001", "03403"]));
    }

    #[test]
    fn unresolved_queries_keep_raw_keys() {
        let key = QueryKey::build(None, &keys(&["0340300000"]));
        assert_eq!(key.resolution_ordinal, -1);
        assert_eq!(key.keys, keys(&["0340300000"]));
    }

    #[test]
    fn empty_unresolved_query_has_its_own_key() {
        let unresolved = QueryKey::build(None, &[]);
        let state = QueryKey::build(Some(Resolution::State), &[]);
        assert_eq!(unresolved.storage_key(), "-1");
        assert_eq!(state.storage_key(), "2");
        assert_ne!(unresolved, state);
    }

    #[test]
    fn storage_key_separates_components() {
        let a = QueryKey::build(Some(Resolution::State), &keys(&["03", "01"]));
        assert_eq!(a.storage_key(), "2\u{1f}01\u{1f}03");
    }
}
