//! Front-matter parsing

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use std::fmt;

const DELIMITER: &str = "---";

/// Custom deserializer that handles both a single string and a list of strings
fn string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};

    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.split_whitespace().map(str::to_string).collect())
        }

        fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(item) = seq.next_element::<String>()? {
                vec.push(item);
            }
            Ok(vec)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

/// Accepts any YAML scalar and keeps its textual form (`title: 2024` is a title too)
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::Null => Ok(None),
        serde_yaml::Value::String(s) => Ok(Some(s)),
        serde_yaml::Value::Number(n) => Ok(Some(n.to_string())),
        serde_yaml::Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(D::Error::custom(format!(
            "expected a scalar value, found {}",
            value_kind(&other)
        ))),
    }
}

fn value_kind(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "a boolean",
        serde_yaml::Value::Number(_) => "a number",
        serde_yaml::Value::String(_) => "a string",
        serde_yaml::Value::Sequence(_) => "a list",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    }
}

/// Keys the pipeline reads, validated when a file is loaded
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct KnownFields {
    #[serde(deserialize_with = "scalar_string")]
    title: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    date: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    layout: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    permalink: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    slug: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    description: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    image: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    author: Option<String>,
    published: Option<bool>,
    #[serde(deserialize_with = "string_or_vec")]
    tags: Vec<String>,
    #[serde(deserialize_with = "string_or_vec")]
    categories: Vec<String>,
}

/// Front-matter of a post or template: the ordered mapping plus typed views of known keys
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub date: Option<String>,
    pub layout: Option<String>,
    pub permalink: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub author: Option<String>,
    /// Posts are published unless they say otherwise
    pub published: bool,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    /// Every key in declaration order, including the ones above
    pub fields: IndexMap<String, serde_yaml::Value>,
}

impl FrontMatter {
    /// Parse a file that must start with a `---` delimited block.
    /// Returns (front_matter, body).
    pub fn parse(content: &str) -> Result<(Self, &str), String> {
        let (yaml, body) = split(content)?;
        Ok((Self::from_yaml(yaml)?, body))
    }

    /// Parse a template: the block is optional, and without it the whole text is the body
    pub fn parse_optional(content: &str) -> Result<(Self, &str), String> {
        if starts_with_delimiter(content) {
            Self::parse(content)
        } else {
            Ok((
                FrontMatter {
                    published: true,
                    ..Default::default()
                },
                content.trim_start_matches('\u{feff}'),
            ))
        }
    }

    fn from_yaml(yaml: &str) -> Result<Self, String> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(yaml).map_err(|e| format!("invalid YAML: {}", e))?;

        let mapping = match value {
            serde_yaml::Value::Null => serde_yaml::Mapping::new(),
            serde_yaml::Value::Mapping(m) => m,
            other => {
                return Err(format!(
                    "front-matter must be a mapping, found {}",
                    value_kind(&other)
                ))
            }
        };

        let mut fields = IndexMap::with_capacity(mapping.len());
        for (key, value) in &mapping {
            let key = key.as_str().ok_or_else(|| {
                format!("front-matter key must be a string, found {}", value_kind(key))
            })?;
            fields.insert(key.to_string(), value.clone());
        }

        let known: KnownFields = serde_yaml::from_value(serde_yaml::Value::Mapping(mapping))
            .map_err(|e| format!("invalid front-matter: {}", e))?;

        Ok(FrontMatter {
            title: known.title,
            date: known.date,
            layout: known.layout,
            permalink: known.permalink,
            slug: known.slug,
            description: known.description,
            image: known.image,
            author: known.author,
            published: known.published.unwrap_or(true),
            tags: known.tags,
            categories: known.categories,
            fields,
        })
    }
}

fn starts_with_delimiter(content: &str) -> bool {
    content
        .trim_start_matches('\u{feff}')
        .lines()
        .next()
        .map(|line| line.trim_end() == DELIMITER)
        .unwrap_or(false)
}

/// Split `---\n<yaml>\n---\n<body>` into its two parts
pub fn split(content: &str) -> Result<(&str, &str), String> {
    let content = content.trim_start_matches('\u{feff}');
    if !starts_with_delimiter(content) {
        return Err("missing opening `---` delimiter".to_string());
    }

    let after_open = match content.find('\n') {
        Some(pos) => &content[pos + 1..],
        None => return Err("missing closing `---` delimiter".to_string()),
    };

    let mut offset = 0;
    for line in after_open.split_inclusive('\n') {
        let trimmed = line.trim_end();
        if trimmed == DELIMITER || trimmed == "..." {
            let yaml = &after_open[..offset];
            let body = &after_open[offset + line.len()..];
            return Ok((yaml, body.trim_start_matches(['\n', '\r'])));
        }
        offset += line.len();
    }

    Err("missing closing `---` delimiter".to_string())
}

/// Parse a date string in the formats posts commonly use.
/// Strings without an offset are read in `tz`.
pub fn parse_date(s: &str, tz: Tz) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();

    let with_offset = [
        "%Y-%m-%d %H:%M:%S %z",
        "%Y-%m-%d %H:%M %z",
        "%Y-%m-%dT%H:%M:%S%z",
        "%Y-%m-%dT%H:%M:%S%.f%z",
    ];
    for fmt in with_offset {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }

    let naive_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in naive_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return localize(dt, tz);
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return localize(d.and_hms_opt(0, 0, 0)?, tz);
        }
    }

    None
}

fn localize(dt: NaiveDateTime, tz: Tz) -> Option<DateTime<FixedOffset>> {
    tz.from_local_datetime(&dt)
        .earliest()
        .map(|d| d.fixed_offset())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_frontmatter() {
        let content = r#"---
title: Railway Oriented Programming
date: 2024-01-15 10:30:00
layout: post
tags:
  - errors
  - pipelines
categories: functional
---

This is the content.
"#;

        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Railway Oriented Programming"));
        assert_eq!(fm.layout.as_deref(), Some("post"));
        assert_eq!(fm.tags, vec!["errors", "pipelines"]);
        assert_eq!(fm.categories, vec!["functional"]);
        assert!(fm.published);
        assert_eq!(body, "This is the content.\n");
    }

    #[test]
    fn test_fields_keep_declaration_order() {
        let content = "---\nzeta: 1\ntitle: T\nalpha: 2\ndate: 2024-01-01\n---\nbody";
        let (fm, _) = FrontMatter::parse(content).unwrap();
        let keys: Vec<_> = fm.fields.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "title", "alpha", "date"]);
    }

    #[test]
    fn test_missing_delimiters() {
        let err = FrontMatter::parse("title: Nope\n\nbody").unwrap_err();
        assert!(err.contains("opening"));

        let err = FrontMatter::parse("---\ntitle: Nope\n\nbody without a close").unwrap_err();
        assert!(err.contains("closing"));
    }

    #[test]
    fn test_invalid_structure() {
        let err = FrontMatter::parse("---\n- just\n- a list\n---\nbody").unwrap_err();
        assert!(err.contains("mapping"));

        let err = FrontMatter::parse("---\ntitle: [unclosed\n---\nbody").unwrap_err();
        assert!(err.contains("invalid YAML"));

        let err = FrontMatter::parse("---\ntitle:\n  nested: map\n---\nbody").unwrap_err();
        assert!(err.contains("invalid front-matter"));
    }

    #[test]
    fn test_empty_block_is_valid() {
        let (fm, body) = FrontMatter::parse("---\n---\nJust a body").unwrap();
        assert!(fm.fields.is_empty());
        assert!(fm.published);
        assert_eq!(body, "Just a body");
    }

    #[test]
    fn test_scalar_title_and_unpublished() {
        let (fm, _) = FrontMatter::parse("---\ntitle: 1984\npublished: false\n---\n").unwrap();
        assert_eq!(fm.title.as_deref(), Some("1984"));
        assert!(!fm.published);
    }

    #[test]
    fn test_body_may_contain_delimiters() {
        let content = "---\ntitle: Rules\n---\nabove\n\n---\n\nbelow";
        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Rules"));
        assert!(body.contains("above"));
        assert!(body.contains("below"));
    }

    #[test]
    fn test_parse_optional_without_block() {
        let (fm, body) = FrontMatter::parse_optional("<html>{{ content }}</html>").unwrap();
        assert!(fm.layout.is_none());
        assert_eq!(body, "<html>{{ content }}</html>");

        let (fm, body) =
            FrontMatter::parse_optional("---\nlayout: default\n---\n<article/>").unwrap();
        assert_eq!(fm.layout.as_deref(), Some("default"));
        assert_eq!(body, "<article/>");
    }

    #[test]
    fn test_parse_date_formats() {
        let dt = parse_date("2024-01-15 10:30:00", Tz::UTC).unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M").to_string(), "2024-01-15 10:30");

        let dt = parse_date("2024-01-15", chrono_tz::Europe::Paris).unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 3600);

        let dt = parse_date("2024-06-01 08:00:00 +0200", Tz::UTC).unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 7200);

        assert!(parse_date("2024-06-01T08:00:00Z", Tz::UTC).is_some());
        assert!(parse_date("next tuesday", Tz::UTC).is_none());
    }
}
