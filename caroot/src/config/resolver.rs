// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Caroot Authors

use crate::config::{
    default_table, interpolate, DefaultSpec, Section, ValueHook,
};
use crate::host;
use log::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// One entry of a resolved `server_list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerEntry {
    pub host: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
}

/// A resolved setting value.
///
/// Most settings stay strings; `ca_ttl` resolves to integer seconds and
/// `server_list` to an ordered host/port list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SettingValue {
    String(String),
    Seconds(u64),
    Servers(Vec<ServerEntry>),
}

impl SettingValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_seconds(&self) -> Option<u64> {
        match self {
            SettingValue::Seconds(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_servers(&self) -> Option<&[ServerEntry]> {
        match self {
            SettingValue::Servers(list) => Some(list),
            _ => None,
        }
    }
}

/// The final flat mapping from setting name to resolved value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Settings {
    #[serde(flatten)]
    map: BTreeMap<String, SettingValue>,
}

impl Settings {
    pub fn get(&self, name: &str) -> Option<&SettingValue> {
        self.map.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(SettingValue::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, value: SettingValue) {
        let _ = self.map.insert(name.into(), value);
    }
}

/// Resolves a raw configuration section against the built-in defaults.
///
/// Resolution overlays user values onto the default table, substitutes
/// `$name` references in table order against the incrementally built
/// result, and finally applies the per-setting transforms. Problems are
/// accumulated into an error list and never abort resolution; a value
/// whose references cannot be resolved is carried verbatim.
pub struct SettingsResolver {
    defaults: Vec<(&'static str, DefaultSpec)>,
    host_identifier: ValueHook,
}

impl Default for SettingsResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsResolver {
    pub fn new() -> Self {
        Self::with_host_identifier(Arc::new(|| {
            host::local_identifier().unwrap_or_else(|e| {
                warn!("Could not determine the local host identifier: {e}");
                "localhost".to_string()
            })
        }))
    }

    /// Builds a resolver whose default certname and synthesized subject
    /// alt name come from the given hook instead of the local hostname.
    pub fn with_host_identifier(hook: ValueHook) -> Self {
        Self {
            defaults: default_table(&hook),
            host_identifier: hook,
        }
    }

    /// Resolves `overrides` (the merged `main` bucket, possibly empty)
    /// into the final settings mapping plus the accumulated error log.
    pub fn resolve(&self, overrides: &Section) -> (Settings, Vec<String>) {
        let mut errors = Vec::new();

        // Overlay: defaults in table order, user value winning verbatim;
        // unknown user keys follow in declaration order.
        let mut work: Vec<(String, String)> = Vec::new();
        for (name, spec) in &self.defaults {
            let value = match overrides.get(name) {
                Some(v) => v.to_string(),
                None => match spec {
                    DefaultSpec::Literal(v) => (*v).to_string(),
                    DefaultSpec::Interpolated(template) => {
                        (*template).to_string()
                    }
                    DefaultSpec::Computed(f) => f(),
                },
            };
            work.push((name.to_string(), value));
        }
        for (key, value) in overrides.iter() {
            if !self.defaults.iter().any(|(name, _)| *name == key) {
                work.push((key.to_string(), value.to_string()));
            }
        }

        // Substitute references against the already-resolved snapshot.
        // One pass per setting; a cycle can therefore never loop.
        let mut snapshot: HashMap<String, String> = HashMap::new();
        let mut resolved: Vec<(String, String)> = Vec::new();
        for (name, value) in work {
            let (value, mut errs) = interpolate(&value, &snapshot);
            errors.append(&mut errs);
            let _ = snapshot.insert(name.clone(), value.clone());
            resolved.push((name, value));
        }

        let mut settings = Settings::default();
        for (name, value) in resolved {
            settings.insert(name, SettingValue::String(value));
        }

        self.munge_ca_ttl(&mut settings, &mut errors);
        self.munge_server_list(&mut settings);
        self.munge_alt_names(&mut settings, overrides);

        (settings, errors)
    }

    /// `ca_ttl` becomes an integer seconds count. Malformed input keeps
    /// the raw string and logs an error.
    fn munge_ca_ttl(&self, settings: &mut Settings, errors: &mut Vec<String>) {
        let Some(raw) = settings.get_str("ca_ttl").map(str::to_string) else {
            return;
        };
        match ttl_to_seconds(&raw) {
            Some(seconds) => {
                settings.insert("ca_ttl", SettingValue::Seconds(seconds))
            }
            None => errors.push(format!(
                "Could not parse ca_ttl value {raw} as a duration"
            )),
        }
    }

    /// `server_list` becomes an ordered host/port list; a non-empty list's
    /// first entry overrides `server`/`ca_server` and, when it carries a
    /// port, `masterport`/`ca_port`.
    fn munge_server_list(&self, settings: &mut Settings) {
        let raw = settings
            .get_str("server_list")
            .unwrap_or_default()
            .to_string();
        let entries: Vec<ServerEntry> = raw
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| match entry.split_once(':') {
                Some((host, port)) => ServerEntry {
                    host: host.to_string(),
                    port: Some(port.to_string()),
                },
                None => ServerEntry {
                    host: entry.to_string(),
                    port: None,
                },
            })
            .collect();

        if let Some(first) = entries.first() {
            debug!(
                "server_list is set, using {} as the server address",
                first.host
            );
            settings
                .insert("server", SettingValue::String(first.host.clone()));
            settings
                .insert("ca_server", SettingValue::String(first.host.clone()));
            if let Some(port) = &first.port {
                settings
                    .insert("masterport", SettingValue::String(port.clone()));
                settings
                    .insert("ca_port", SettingValue::String(port.clone()));
            }
        }

        settings.insert("server_list", SettingValue::Servers(entries));
    }

    /// `subject_alt_names` is synthesized from `dns_alt_names` only when
    /// the user section explicitly provides it; otherwise it resolves to
    /// the empty string.
    fn munge_alt_names(&self, settings: &mut Settings, overrides: &Section) {
        let value = if overrides.contains_key("dns_alt_names") {
            let raw = settings
                .get_str("dns_alt_names")
                .unwrap_or_default()
                .to_string();
            let mut names =
                vec![format!("DNS:{}", (self.host_identifier)())];
            for entry in raw.split(',').map(str::trim) {
                if entry.is_empty() {
                    continue;
                }
                if has_type_prefix(entry) {
                    names.push(entry.to_string());
                } else {
                    names.push(format!("DNS:{entry}"));
                }
            }
            names.join(", ")
        } else {
            String::new()
        };
        settings.insert("subject_alt_names", SettingValue::String(value));
    }
}

/// True for entries that already carry an `UPPERCASE:` type prefix such as
/// `IP:` or `DNS:`.
fn has_type_prefix(entry: &str) -> bool {
    match entry.split_once(':') {
        Some((prefix, _)) => {
            !prefix.is_empty()
                && prefix.chars().all(|c| c.is_ascii_uppercase())
        }
        None => false,
    }
}

/// Parses a duration of the form `<integer>[s|m|h|d|y]` into seconds. A
/// bare integer is already seconds; a year counts as 365 days.
fn ttl_to_seconds(value: &str) -> Option<u64> {
    let value = value.trim();
    let (digits, unit) = match value.chars().last()? {
        c if c.is_ascii_digit() => (value, 1),
        's' => (&value[..value.len() - 1], 1),
        'm' => (&value[..value.len() - 1], 60),
        'h' => (&value[..value.len() - 1], 3_600),
        'd' => (&value[..value.len() - 1], 86_400),
        'y' => (&value[..value.len() - 1], 365 * 86_400),
        _ => return None,
    };
    digits.parse::<u64>().ok()?.checked_mul(unit)
}
