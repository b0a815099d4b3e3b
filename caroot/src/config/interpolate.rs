// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Caroot Authors

use pest::Parser;
use pest_derive::Parser;
use std::collections::HashMap;

#[derive(Parser)]
#[grammar = "template.pest"]
pub struct TemplateParser;

/// Substitutes `$name` references in a value with other settings' values.
///
/// A reference name is an alphanumeric/underscore identifier immediately
/// following the `$`. Substitution is all-or-nothing: if every reference
/// resolves against `known`, the fully substituted string is returned;
/// substituted text is not rescanned for further references. If any
/// reference is missing from `known`, the value is returned verbatim and
/// one error per missing reference is recorded, naming the reference and
/// the value it appeared in.
///
/// # Examples
///
/// With `confdir = /etc/puppet` known:
///
/// * `$confdir/ssl` => `/etc/puppet/ssl`
/// * `$ssldir/ca` => `$ssldir/ca` plus an error naming `$ssldir`
pub fn interpolate(
    value: &str,
    known: &HashMap<String, String>,
) -> (String, Vec<String>) {
    let mut pairs = match TemplateParser::parse(Rule::template, value) {
        Ok(pairs) => pairs,
        // The template grammar accepts any input, so this cannot fail.
        Err(_) => return (value.to_string(), Vec::new()),
    };
    let Some(template) = pairs.next() else {
        return (value.to_string(), Vec::new());
    };

    let mut out = String::new();
    let mut errors = Vec::new();
    for item in template.into_inner() {
        match item.as_rule() {
            Rule::reference => {
                let token = item.as_str().to_string();
                let Some(name) = item.into_inner().next() else {
                    continue;
                };
                match known.get(name.as_str()) {
                    Some(resolved) => out.push_str(resolved),
                    None => errors.push(format!(
                        "Could not resolve {token} in {value}"
                    )),
                }
            }
            Rule::text | Rule::dollar => out.push_str(item.as_str()),
            Rule::EOI => break,
            _ => unreachable!(),
        }
    }

    if errors.is_empty() {
        (out, errors)
    } else {
        (value.to_string(), errors)
    }
}
