//! Input sanitization shared by the request boundary.

/// Canonical GUID form: separator dashes stripped, lowercased. Registrations
/// and player records store GUIDs in this form only.
pub fn normalize_guid(raw: &str) -> String {
    raw.trim().replace('-', "").to_ascii_lowercase()
}

/// Pull a required body value, recording its key when absent. Callers check
/// `missing` once after collecting every field so the response can name all
/// absentees at once.
pub fn required<T: Default>(
    value: Option<T>,
    key: &'static str,
    missing: &mut Vec<&'static str>,
) -> T {
    match value {
        Some(value) => value,
        None => {
            missing.push(key);
            T::default()
        }
    }
}

/// Clamp a caller-supplied paging value into `[min, max]`, falling back to
/// `default` when absent or negative-garbage.
pub fn clamp_page(value: Option<i64>, default: i64, min: i64, max: i64) -> u64 {
    let value = value.unwrap_or(default).clamp(min, max);
    u64::try_from(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_dashes_and_case() {
        assert_eq!(
            normalize_guid("6F9619FF-8B86-D011-B42D-00CF4FC964FF"),
            "6f9619ff8b86d011b42d00cf4fc964ff"
        );
        assert_eq!(normalize_guid("  abc-DEF "), "abcdef");
    }

    #[test]
    fn required_collects_missing_keys() {
        let mut missing = Vec::new();
        let kills: i64 = required(Some(5), "kills", &mut missing);
        let deaths: i64 = required(None, "deaths", &mut missing);
        let name: String = required(None, "name", &mut missing);
        assert_eq!(kills, 5);
        assert_eq!(deaths, 0);
        assert!(name.is_empty());
        assert_eq!(missing, vec!["deaths", "name"]);
    }

    #[test]
    fn page_values_are_clamped() {
        assert_eq!(clamp_page(None, 10, 1, 100), 10);
        assert_eq!(clamp_page(Some(0), 10, 1, 100), 1);
        assert_eq!(clamp_page(Some(250), 10, 1, 100), 100);
        assert_eq!(clamp_page(Some(-3), 0, 0, i64::MAX), 0);
    }
}
