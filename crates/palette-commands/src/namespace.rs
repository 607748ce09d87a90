//! Namespace setup, marker detection and the footer hint

use crate::types::{NamespaceConfig, DEFAULT_NAMESPACE};

/// Setup of the namespaces the palette knows about, in registration order
#[derive(Debug, Clone, Default)]
pub struct NamespaceRegistry {
    entries: Vec<(String, NamespaceConfig)>,
}

impl NamespaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the setup for `marker`, keeping its position on replace
    pub fn add(&mut self, marker: impl Into<String>, config: NamespaceConfig) {
        let marker = marker.into();
        match self.entries.iter_mut().find(|(m, _)| *m == marker) {
            Some((_, existing)) => *existing = config,
            None => self.entries.push((marker, config)),
        }
    }

    pub fn remove(&mut self, marker: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(m, _)| m != marker);
        self.entries.len() != before
    }

    pub fn get(&self, marker: &str) -> Option<&NamespaceConfig> {
        self.entries
            .iter()
            .find(|(m, _)| m == marker)
            .map(|(_, config)| config)
    }

    pub fn markers(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(m, _)| m.as_str())
    }

    /// Footer advertising every named namespace, if there is one
    pub fn footer_text(&self) -> Option<String> {
        let items: Vec<String> = self
            .entries
            .iter()
            .filter(|(marker, _)| marker != DEFAULT_NAMESPACE)
            .filter_map(|(marker, config)| config.name.as_ref().map(|name| format!("{marker}{name}")))
            .collect();
        if items.is_empty() {
            None
        } else {
            Some(format!("TIP — search for {}", format_list(&items)))
        }
    }
}

/// `a`, `a and b`, `a, b and c`
pub fn format_list(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [head @ .., last] => format!("{} and {}", head.join(", "), last),
    }
}

/// Split a leading namespace marker off `search`.
///
/// Returns `None` when the text does not start with one of `markers`;
/// the longest marker wins when several match.
pub fn split_namespace<'a, 'm>(
    search: &'a str,
    markers: impl IntoIterator<Item = &'m str>,
) -> Option<(&'m str, &'a str)> {
    markers
        .into_iter()
        .filter(|m| !m.is_empty() && *m != DEFAULT_NAMESPACE && search.starts_with(*m))
        .max_by_key(|m| m.len())
        .map(|m| (m, &search[m.len()..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_footer_lists_named_namespaces() {
        let mut registry = NamespaceRegistry::new();
        registry.add("@", NamespaceConfig::named("FirstName"));
        registry.add("!", NamespaceConfig::named("SecondName"));
        assert_eq!(
            registry.footer_text().as_deref(),
            Some("TIP — search for @FirstName and !SecondName")
        );

        registry.add("#", NamespaceConfig::named("ThirdName"));
        registry.add("?", NamespaceConfig::default().with_empty_message("nothing"));
        assert_eq!(
            registry.footer_text().as_deref(),
            Some("TIP — search for @FirstName, !SecondName and #ThirdName")
        );
    }

    #[test]
    fn test_no_named_namespace_no_footer() {
        let mut registry = NamespaceRegistry::new();
        assert_eq!(registry.footer_text(), None);
        registry.add("#", NamespaceConfig::default());
        assert_eq!(registry.footer_text(), None);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut registry = NamespaceRegistry::new();
        registry.add("@", NamespaceConfig::named("Users"));
        registry.add("#", NamespaceConfig::named("Tags"));
        registry.add("@", NamespaceConfig::named("People"));
        assert_eq!(registry.markers().collect::<Vec<_>>(), vec!["@", "#"]);
        assert_eq!(
            registry.footer_text().as_deref(),
            Some("TIP — search for @People and #Tags")
        );
    }

    #[test]
    fn test_split_namespace() {
        let markers = ["@", "#", "##"];
        assert_eq!(split_namespace("@bob", markers), Some(("@", "bob")));
        assert_eq!(split_namespace("##x", markers), Some(("##", "x")));
        assert_eq!(split_namespace("?bob", markers), None);
        assert_eq!(split_namespace("bob", markers), None);
    }
}
