use lims_schema::RequestValues;

/// Request values from parsed `key=value` pairs, keeping repeated keys.
#[must_use]
pub fn request_values(pairs: &[(String, String)]) -> RequestValues {
    pairs
        .iter()
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::request_values;

    #[test]
    fn repeated_keys_become_multiple_values() {
        let pairs = vec![
            ("tags".to_string(), "a".to_string()),
            ("name".to_string(), "S1".to_string()),
            ("tags".to_string(), "b".to_string()),
        ];
        let values = request_values(&pairs);
        assert_eq!(values.all("tags"), ["a", "b"]);
        assert_eq!(values.first("name"), Some("S1"));
    }
}
