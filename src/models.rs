// Core models for the job dispatcher services

use std::collections::BTreeMap;
use std::fmt;

/// Opaque job identifier handed out by the `run` operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        JobId::new(s)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        JobId::new(s)
    }
}

/// Job status as reported by the service. The vocabulary is owned by the
/// server; anything unrecognised is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Running,
    Finished,
    Error,
    Failure,
    NotFound,
    Other(String),
}

impl JobStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "PENDING" => JobStatus::Pending,
            "RUNNING" => JobStatus::Running,
            "FINISHED" => JobStatus::Finished,
            "ERROR" => JobStatus::Error,
            "FAILURE" => JobStatus::Failure,
            "NOT_FOUND" => JobStatus::NotFound,
            other => JobStatus::Other(other.to_string()),
        }
    }

    /// Only `PENDING` and `RUNNING` keep a job alive.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending | JobStatus::Running)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Finished)
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Running => "RUNNING",
            JobStatus::Finished => "FINISHED",
            JobStatus::Error => "ERROR",
            JobStatus::Failure => "FAILURE",
            JobStatus::NotFound => "NOT_FOUND",
            JobStatus::Other(s) => s,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a result payload is written to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Text,
    Binary,
}

const BINARY_MEDIA_TYPES: [&str; 3] = ["image/png", "image/jpeg", "application/gzip"];

/// An output format offered by a finished job.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultType {
    pub identifier: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_media_type")]
    pub media_type: String,
    #[serde(default = "default_file_suffix")]
    pub file_suffix: String,
}

fn default_media_type() -> String {
    "text/plain".to_string()
}

fn default_file_suffix() -> String {
    "txt".to_string()
}

impl ResultType {
    pub fn new(
        identifier: impl Into<String>,
        media_type: impl Into<String>,
        file_suffix: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            label: None,
            description: None,
            media_type: media_type.into(),
            file_suffix: file_suffix.into(),
        }
    }

    /// Binary for PNG, JPEG and gzip payloads, text for everything else.
    /// Media type parameters such as `;charset=UTF-8` are ignored.
    pub fn write_mode(&self) -> WriteMode {
        let essence = match self.media_type.parse::<mime::Mime>() {
            Ok(m) => m.essence_str().to_ascii_lowercase(),
            Err(_) => self.media_type.trim().to_ascii_lowercase(),
        };
        if BINARY_MEDIA_TYPES.contains(&essence.as_str()) {
            WriteMode::Binary
        } else {
            WriteMode::Text
        }
    }
}

/// A single tool parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl ParamValue {
    /// Read a command-line string. Only `true`/`false` are typed; anything
    /// else is kept exactly as written.
    pub fn infer(raw: &str) -> Self {
        match raw {
            "true" => ParamValue::Bool(true),
            "false" => ParamValue::Bool(false),
            _ => ParamValue::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Float(x) => write!(f, "{}", x),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Text(s)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        ParamValue::Int(i)
    }
}

impl From<f64> for ParamValue {
    fn from(x: f64) -> Self {
        ParamValue::Float(x)
    }
}

/// Tool parameters for a submission. Nothing is validated locally; the
/// service rejects bad values with an error response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    values: BTreeMap<String, ParamValue>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<ParamValue> {
        self.values.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.values.iter()
    }

    /// Parse a `name=value` command-line pair.
    pub fn parse_pair(pair: &str) -> Option<(String, ParamValue)> {
        let (name, value) = pair.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some((name.to_string(), ParamValue::infer(value.trim())))
    }

    /// Name/value pairs as sent in a form-encoded body.
    pub fn to_form_pairs(&self) -> Vec<(String, String)> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }
}

/// One allowed value of a tool parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterValue {
    pub label: Option<String>,
    pub value: Option<String>,
    pub default_value: bool,
    pub properties: Vec<(String, String)>,
}

/// Description of a tool parameter, as returned by `parameterdetails`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterDetails {
    pub name: String,
    pub description: Option<String>,
    pub kind: Option<String>,
    pub values: Vec<ParameterValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_pending_and_running_are_live() {
        assert!(!JobStatus::parse("PENDING").is_terminal());
        assert!(!JobStatus::parse("RUNNING").is_terminal());
        for raw in ["FINISHED", "ERROR", "FAILURE", "NOT_FOUND", "running", "", "QUEUED"] {
            assert!(JobStatus::parse(raw).is_terminal(), "{raw} should stop polling");
        }
    }

    #[test]
    fn test_status_roundtrips_unknown_values() {
        let status = JobStatus::parse(" SUSPENDED\n");
        assert_eq!(status, JobStatus::Other("SUSPENDED".to_string()));
        assert_eq!(status.to_string(), "SUSPENDED");
        assert_eq!(JobStatus::parse("FINISHED\n"), JobStatus::Finished);
    }

    #[test]
    fn test_write_mode_by_media_type() {
        assert_eq!(ResultType::new("png", "image/png", "png").write_mode(), WriteMode::Binary);
        assert_eq!(ResultType::new("jpg", "image/jpeg", "jpg").write_mode(), WriteMode::Binary);
        assert_eq!(
            ResultType::new("gz", "application/gzip;charset=UTF-8", "gz").write_mode(),
            WriteMode::Binary
        );
        assert_eq!(ResultType::new("out", "text/plain", "txt").write_mode(), WriteMode::Text);
        assert_eq!(ResultType::new("xml", "application/xml", "xml").write_mode(), WriteMode::Text);
        assert_eq!(ResultType::new("svg", "image/svg+xml", "svg").write_mode(), WriteMode::Text);
    }

    #[test]
    fn test_parameter_pairs() {
        assert_eq!(
            ParameterSet::parse_pair("database=uniprotkb_swissprot"),
            Some(("database".to_string(), ParamValue::Text("uniprotkb_swissprot".to_string())))
        );
        assert_eq!(
            ParameterSet::parse_pair("alignments=50"),
            Some(("alignments".to_string(), ParamValue::Text("50".to_string())))
        );
        assert_eq!(
            ParameterSet::parse_pair("hsps=true"),
            Some(("hsps".to_string(), ParamValue::Bool(true)))
        );
        assert_eq!(ParameterSet::parse_pair("novalue"), None);
        assert_eq!(ParameterSet::parse_pair("=x"), None);
    }

    #[test]
    fn test_numeric_looking_values_keep_their_text() {
        let mut params = ParameterSet::new();
        for pair in ["taxid=09606", "scores=+5", "exp=1e-3"] {
            let (name, value) = ParameterSet::parse_pair(pair).unwrap();
            params.insert(name, value);
        }
        assert_eq!(
            params.to_form_pairs(),
            vec![
                ("exp".to_string(), "1e-3".to_string()),
                ("scores".to_string(), "+5".to_string()),
                ("taxid".to_string(), "09606".to_string()),
            ]
        );
    }

    #[test]
    fn test_form_pairs_render_booleans_as_words() {
        let params = ParameterSet::new()
            .with("program", "blastp")
            .with("hist", false)
            .with("scores", 5i64);
        assert_eq!(
            params.to_form_pairs(),
            vec![
                ("hist".to_string(), "false".to_string()),
                ("program".to_string(), "blastp".to_string()),
                ("scores".to_string(), "5".to_string()),
            ]
        );
    }
}
