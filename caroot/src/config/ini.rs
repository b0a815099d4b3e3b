// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Caroot Authors

use std::collections::BTreeMap;

/// Name of the bucket that collects settings declared before the first
/// section header as well as settings under an explicit `[main]` header.
pub static MAIN_SECTION: &str = "main";

/// Key/value pairs of a single section, in declaration order.
///
/// A later declaration of the same key replaces the value but keeps the
/// key's original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    entries: Vec<(String, String)>,
}

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All sections found in a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedConfig {
    sections: BTreeMap<String, Section>,
}

impl ParsedConfig {
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    /// The merged `main` bucket, empty if the file declared nothing in it.
    pub fn main(&self) -> Section {
        self.sections
            .get(MAIN_SECTION)
            .cloned()
            .unwrap_or_default()
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }
}

/// Parses INI-style configuration text.
///
/// The dialect is deliberately forgiving: lines that are neither a section
/// header, a `key = value` pair, a comment, nor blank are dropped without
/// an error. Keys are lowercased. A value may carry a trailing `{...}`
/// file-metadata annotation (owner/mode hints used by some configuration
/// dialects); the annotation is stripped and only the text before it is
/// kept.
pub fn parse(text: &str) -> ParsedConfig {
    let mut sections: BTreeMap<String, Section> = BTreeMap::new();
    let mut current = MAIN_SECTION.to_string();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(name) = section_header(line) {
            current = name.to_string();
            let _ = sections.entry(current.clone()).or_default();
            continue;
        }
        if let Some((key, value)) = setting_line(line) {
            sections.entry(current.clone()).or_default().insert(key, value);
        }
        // Anything else is free text and is discarded.
    }

    ParsedConfig { sections }
}

fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn section_header(line: &str) -> Option<&str> {
    let inner = line.strip_prefix('[')?.strip_suffix(']')?.trim();
    is_word(inner).then_some(inner)
}

fn setting_line(line: &str) -> Option<(String, String)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if !is_word(key) {
        return None;
    }
    let value = strip_metadata(value.trim());
    Some((key.to_ascii_lowercase(), value.to_string()))
}

/// Drops a trailing `{...}` block from a value, e.g.
/// `/etc/puppet/ca.pem {owner = root, mode = 644}` becomes
/// `/etc/puppet/ca.pem`.
fn strip_metadata(value: &str) -> &str {
    if value.ends_with('}') {
        if let Some(idx) = value.find('{') {
            return value[..idx].trim_end();
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sections() {
        let parsed = parse(
            "[main]\n\
             certname = ca.example.com\n\
             [master]\n\
             dns_alt_names = puppet,foo\n",
        );
        assert_eq!(
            parsed.main().get("certname"),
            Some("ca.example.com")
        );
        let master = parsed.section("master").unwrap(); //#[allow_ci]
        assert_eq!(master.get("dns_alt_names"), Some("puppet,foo"));
        assert!(parsed.section("agent").is_none());
    }

    #[test]
    fn test_top_of_file_settings_merge_into_main() {
        let parsed = parse(
            "server = before\n\
             environment = production\n\
             [main]\n\
             server = after\n",
        );
        let main = parsed.main();
        // Later declaration wins on key collision.
        assert_eq!(main.get("server"), Some("after"));
        assert_eq!(main.get("environment"), Some("production"));
        assert_eq!(main.len(), 2);
    }

    #[test]
    fn test_keys_are_lowercased_and_whitespace_tolerated() {
        let parsed = parse("  [ main ]  \n  CertName   =  ca01  \n");
        assert_eq!(parsed.main().get("certname"), Some("ca01"));
    }

    #[test]
    fn test_metadata_annotation_is_stripped() {
        let parsed = parse(
            "cacrl = /var/lib/puppet/ssl/crl.pem {owner = service, mode = 644}\n",
        );
        assert_eq!(
            parsed.main().get("cacrl"),
            Some("/var/lib/puppet/ssl/crl.pem")
        );
    }

    #[test]
    fn test_garbage_lines_are_dropped() {
        let parsed = parse(
            "certname = ca01\n\
             this line is not a setting\n\
             [not a section header\n\
             = missing key\n\
             certname=ca02\n",
        );
        let main = parsed.main();
        assert_eq!(main.len(), 1);
        assert_eq!(main.get("certname"), Some("ca02"));
    }

    #[test]
    fn test_comments_and_blanks_are_ignored() {
        let parsed = parse("# a comment\n\n   \n# another\nserver = puppet\n");
        assert_eq!(parsed.main().get("server"), Some("puppet"));
        assert_eq!(parsed.main().len(), 1);
    }

    #[test]
    fn test_header_with_invalid_name_does_not_switch_sections() {
        let parsed = parse("[ma in]\nserver = puppet\n");
        // The malformed header is garbage, so the setting still lands in
        // the implicit main bucket.
        assert_eq!(parsed.main().get("server"), Some("puppet"));
    }

    #[test]
    fn test_empty_input() {
        let parsed = parse("");
        assert!(parsed.main().is_empty());
        assert_eq!(parsed.section_names().count(), 0);
    }

    #[test]
    fn test_value_that_is_only_a_metadata_block() {
        let parsed = parse("cacrl = {owner = service}\n");
        assert_eq!(parsed.main().get("cacrl"), Some(""));
    }
}
