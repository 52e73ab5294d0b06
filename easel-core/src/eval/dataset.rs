//! Evaluation datasets
//!
//! A dataset file holds either a single case or a list of cases, as JSON or
//! YAML. Cases are immutable once loaded.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::engine::Payload;
use crate::error::{EaselError, Result};

/// A single evaluation case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalCase {
    /// Optional label used in records and logs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Payload passed verbatim to the node
    pub inputs: Payload,

    /// Expected node output for exact-match comparison
    #[serde(
        rename = "referenceOutputs",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub reference_outputs: Option<Payload>,

    /// Node is known to be non-deterministic; mismatches are reported, not failed
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub flaky: bool,
}

impl EvalCase {
    pub fn new(inputs: Payload) -> Self {
        Self {
            name: None,
            inputs,
            reference_outputs: None,
            flaky: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_reference(mut self, reference_outputs: Payload) -> Self {
        self.reference_outputs = Some(reference_outputs);
        self
    }

    pub fn flaky(mut self) -> Self {
        self.flaky = true;
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DatasetDocument {
    Many(Vec<EvalCase>),
    One(EvalCase),
}

/// Format of a dataset file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Json,
    Yaml,
}

impl DatasetFormat {
    /// Infer the format from a file extension (JSON when unknown)
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => DatasetFormat::Yaml,
            _ => DatasetFormat::Json,
        }
    }
}

/// An ordered collection of evaluation cases
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub name: String,
    pub cases: Vec<EvalCase>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, cases: Vec<EvalCase>) -> Self {
        Self {
            name: name.into(),
            cases,
        }
    }

    /// Load a dataset from a JSON or YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            EaselError::Dataset(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("dataset")
            .to_string();

        let dataset = Self::parse(name, &content, DatasetFormat::from_path(path))?;
        tracing::debug!(dataset = %dataset.name, cases = dataset.len(), "loaded dataset");
        Ok(dataset)
    }

    /// Parse a dataset from a string
    pub fn parse(name: impl Into<String>, content: &str, format: DatasetFormat) -> Result<Self> {
        let document: DatasetDocument = match format {
            DatasetFormat::Json => serde_json::from_str(content)
                .map_err(|e| EaselError::Dataset(format!("Invalid JSON dataset: {}", e)))?,
            DatasetFormat::Yaml => serde_yaml::from_str(content)
                .map_err(|e| EaselError::Dataset(format!("Invalid YAML dataset: {}", e)))?,
        };

        let cases = match document {
            DatasetDocument::Many(cases) => cases,
            DatasetDocument::One(case) => vec![case],
        };

        Ok(Self::new(name, cases))
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn parses_single_case_object() {
        let content = r#"{
            "inputs": {"messages": [{"role": "user", "content": "make it shorter"}]},
            "referenceOutputs": {"next": "rewriteArtifact"}
        }"#;
        let dataset = Dataset::parse("routing", content, DatasetFormat::Json).unwrap();

        assert_eq!(dataset.len(), 1);
        let case = &dataset.cases[0];
        assert_eq!(case.reference_outputs, Some(json!({"next": "rewriteArtifact"})));
        assert!(!case.flaky);
    }

    #[test]
    fn parses_case_list_without_reference() {
        let content = r#"[{"inputs": {"a": 1}}, {"name": "second", "inputs": {"a": 2}, "flaky": true}]"#;
        let dataset = Dataset::parse("gen", content, DatasetFormat::Json).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.cases[0].reference_outputs, None);
        assert_eq!(dataset.cases[1].name.as_deref(), Some("second"));
        assert!(dataset.cases[1].flaky);
    }

    #[test]
    fn loads_yaml_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "- name: followup\n  inputs:\n    messages:\n      - content: add comments\n  referenceOutputs:\n    next: rewriteArtifact\n"
        )
        .unwrap();

        let dataset = Dataset::load(file.path()).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.cases[0].inputs["messages"][0]["content"], "add comments");
        assert_eq!(DatasetFormat::from_path(file.path()), DatasetFormat::Yaml);
    }

    #[test]
    fn missing_inputs_is_a_dataset_error() {
        let err = Dataset::parse("bad", r#"{"referenceOutputs": {}}"#, DatasetFormat::Json)
            .unwrap_err();
        assert!(matches!(err, EaselError::Dataset(_)));
    }

    #[test]
    fn missing_file_is_a_dataset_error() {
        let err = Dataset::load("/nonexistent/cases.json").unwrap_err();
        assert!(matches!(err, EaselError::Dataset(_)));
    }

    #[test]
    fn serializes_with_wire_names() {
        let case = EvalCase::new(json!({})).with_reference(json!({"next": "x"}));
        let value = serde_json::to_value(&case).unwrap();
        assert_eq!(value, json!({"inputs": {}, "referenceOutputs": {"next": "x"}}));
    }
}
