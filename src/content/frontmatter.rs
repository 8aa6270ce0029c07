//! Front-matter parsing

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Errors raised while splitting or decoding a front-matter header
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("unclosed front-matter block, missing closing `{0}`")]
    Unclosed(&'static str),

    #[error("invalid YAML front-matter: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("invalid JSON front-matter: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Custom deserializer that handles both a single string and a list of strings
fn string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};
    use std::fmt;

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
            Ok(vec![value.to_string()])
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value])
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

/// Front-matter data from a blog post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub description: Option<String>,
    pub summary: Option<String>,
    #[serde(rename = "publishedAt")]
    pub published_at: Option<String>,
    #[serde(deserialize_with = "string_or_vec", default)]
    pub tags: Vec<String>,
    pub author: Option<String>,
    pub image: Option<String>,

    /// Additional custom fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl FrontMatter {
    /// Parse front-matter from content string
    /// Returns (front_matter, remaining_content)
    pub fn parse(content: &str) -> Result<(Self, &str), FrontmatterError> {
        let trimmed = content.trim_start_matches('\u{feff}').trim_start();

        // YAML front-matter (---)
        if let Some(rest) = opening_line(trimmed, "---") {
            return Self::parse_yaml(rest);
        }

        // JSON front-matter (;;;)
        if let Some(rest) = opening_line(trimmed, ";;;") {
            return Self::parse_json(rest);
        }

        // No front-matter found
        Ok((FrontMatter::default(), content))
    }

    fn parse_yaml(rest: &str) -> Result<(Self, &str), FrontmatterError> {
        let (yaml_content, remaining) =
            split_header(rest, "---").ok_or(FrontmatterError::Unclosed("---"))?;

        // Blank or comment-only headers are an empty mapping
        let has_values = yaml_content.lines().any(|line| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        });
        if !has_values {
            return Ok((FrontMatter::default(), remaining));
        }

        let fm = serde_yaml::from_str::<FrontMatter>(yaml_content)?;
        Ok((fm, remaining))
    }

    fn parse_json(rest: &str) -> Result<(Self, &str), FrontmatterError> {
        let (json_content, remaining) =
            split_header(rest, ";;;").ok_or(FrontmatterError::Unclosed(";;;"))?;

        if json_content.trim().is_empty() {
            return Ok((FrontMatter::default(), remaining));
        }

        let fm = serde_json::from_str::<FrontMatter>(json_content)?;
        Ok((fm, remaining))
    }
}

/// Returns the text after `delimiter` when it sits alone on the first line
fn opening_line<'a>(content: &'a str, delimiter: &str) -> Option<&'a str> {
    let rest = content.strip_prefix(delimiter)?;
    let line_end = rest.find('\n').unwrap_or(rest.len());
    if rest[..line_end].trim().is_empty() {
        Some(rest.get(line_end + 1..).unwrap_or(""))
    } else {
        None
    }
}

/// Split at the first line consisting only of `delimiter`
fn split_header<'a>(rest: &'a str, delimiter: &str) -> Option<(&'a str, &'a str)> {
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == delimiter {
            let header = &rest[..offset];
            let body = rest[offset + line.len()..].trim_start_matches(['\n', '\r']);
            return Some((header, body));
        }
        offset += line.len();
    }
    None
}

/// Parse an ISO-8601 date string; values without an offset are taken as UTC
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    // RFC 3339 / ISO 8601 with offset
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    let datetime_formats = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc());
        }
    }

    // Date only, midnight UTC
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
