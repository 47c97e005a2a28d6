use std::collections::BTreeMap;

/// Query parameters with deterministic, lexicographic key order.
///
/// Optional fields stay out of the query string entirely: empty strings,
/// `None` values, and empty slices are skipped, and slice parameters are
/// joined into a single comma-separated value rather than repeated keys.
#[derive(Clone, Debug, Default)]
pub(crate) struct QueryPairs {
    entries: BTreeMap<&'static str, String>,
}

impl QueryPairs {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_str(&mut self, key: &'static str, value: &str) {
        if !value.is_empty() {
            self.entries.insert(key, value.to_owned());
        }
    }

    pub(crate) fn add_csv(&mut self, key: &'static str, items: &[String]) {
        if !items.is_empty() {
            self.entries.insert(key, items.join(","));
        }
    }

    pub(crate) fn add_int(&mut self, key: &'static str, value: Option<u32>) {
        if let Some(value) = value {
            self.entries.insert(key, value.to_string());
        }
    }

    pub(crate) fn add_bool(&mut self, key: &'static str, value: Option<bool>) {
        if let Some(value) = value {
            self.entries.insert(key, value.to_string());
        }
    }

    pub(crate) fn encode(&self) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.entries {
            serializer.append_pair(key, value);
        }
        Some(serializer.finish())
    }
}
