//! Output formats for parsed specifications and token streams

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::lexing::Token;
use super::model::SubtreeSpecification;

/// Text printed for blank input.
pub const NO_SPECIFICATION: &str = "no specification";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Canonical subtree specification syntax.
    #[default]
    Text,
    Json,
    #[serde(alias = "yml")]
    #[value(alias = "yml")]
    Yaml,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Render the outcome of one parse. `None` stands for blank input.
pub fn render(
    spec: Option<&SubtreeSpecification>,
    format: OutputFormat,
) -> Result<String, FormatError> {
    match format {
        OutputFormat::Text => Ok(spec
            .map(SubtreeSpecification::to_text)
            .unwrap_or_else(|| NO_SPECIFICATION.to_string())),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&spec)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(&spec)?),
    }
}

/// Render a token stream, one token per line in text form.
pub fn render_tokens(tokens: &[Token], format: OutputFormat) -> Result<String, FormatError> {
    match format {
        OutputFormat::Text => Ok(tokens
            .iter()
            .map(|token| format!("{} {:?}", token.kind, token.text))
            .collect::<Vec<_>>()
            .join("\n")),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(tokens)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(tokens)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subtree::lexing::tokenize;
    use crate::subtree::name::DistinguishedName;

    fn sample() -> SubtreeSpecification {
        let mut builder = SubtreeSpecification::builder();
        builder.set_base(DistinguishedName::parse("ou=Eng").unwrap());
        builder.set_max_base_distance(2).unwrap();
        builder.build()
    }

    #[test]
    fn test_text() {
        assert_eq!(
            render(Some(&sample()), OutputFormat::Text).unwrap(),
            "{ base \"ou=Eng\", maximum 2 }"
        );
        assert_eq!(render(None, OutputFormat::Text).unwrap(), NO_SPECIFICATION);
    }

    #[test]
    fn test_json_round_trip() {
        let json = render(Some(&sample()), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["base"], "ou=Eng");
        assert_eq!(value["min_base_distance"], 0);
        assert_eq!(value["max_base_distance"], 2);
        assert!(value["refinement"].is_null());

        let back: SubtreeSpecification = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_json_unbounded_is_null() {
        let json = render(Some(&SubtreeSpecification::default()), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["max_base_distance"].is_null());
        assert_eq!(render(None, OutputFormat::Json).unwrap(), "null");
    }

    #[test]
    fn test_yaml_round_trip() {
        let yaml = render(Some(&sample()), OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("base: ou=Eng"));
        let back: SubtreeSpecification = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_format_names() {
        use clap::ValueEnum;

        assert_eq!(OutputFormat::from_str("json", false), Ok(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("JSON", true), Ok(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("yml", false), Ok(OutputFormat::Yaml));
        assert!(OutputFormat::from_str("xml", true).is_err());
        assert_eq!(OutputFormat::Yaml.to_string(), "yaml");
    }

    #[test]
    fn test_tokens_text() {
        let tokens = tokenize("{ minimum 1 }").unwrap();
        assert_eq!(
            render_tokens(&tokens, OutputFormat::Text).unwrap(),
            "OpenCurly \"{\"\nSpace \" \"\nKeyword(minimum) \"minimum\"\nSpace \" \"\nInteger \"1\"\nSpace \" \"\nCloseCurly \"}\""
        );
    }
}
