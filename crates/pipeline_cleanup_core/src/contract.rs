use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const INVALIDATE_ALL_PATHS: &[&str] = &["/*"];
pub const MAX_FAILURE_MESSAGE_CHARS: usize = 5_000;
pub const MAX_EXECUTION_SUMMARY_CHARS: usize = 2_048;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodePipelineEvent {
    #[serde(rename = "CodePipeline.job")]
    pub job: PipelineJob,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineJob {
    pub id: String,
    #[serde(default)]
    pub data: JobData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobData {
    #[serde(default)]
    pub action_configuration: ActionConfiguration,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionConfiguration {
    #[serde(default)]
    pub configuration: ActionConfigurationValues,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionConfigurationValues {
    #[serde(rename = "UserParameters", skip_serializing_if = "Option::is_none")]
    pub user_parameters: Option<Value>,
}

impl PipelineJob {
    /// The raw `UserParameters` string. Any other JSON type is a
    /// configuration error rather than a malformed event, so it can still be
    /// reported against the job.
    pub fn user_parameters(&self) -> Result<&str, ConfigurationError> {
        let message = match &self.data.action_configuration.configuration.user_parameters {
            Some(Value::String(raw)) => return Ok(raw),
            Some(Value::Null) | None => "UserParameters must be configured",
            Some(_) => "UserParameters must be a JSON-encoded string",
        };
        Err(ConfigurationError::new(message))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserParameters {
    pub source_name: String,
    pub distribution_id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FailureKind {
    JobFailed,
    ConfigurationError,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::JobFailed => "JobFailed",
            Self::ConfigurationError => "ConfigurationError",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome reported back to the pipeline for one job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobResult {
    Success {
        job_id: String,
        summary: String,
    },
    Failure {
        job_id: String,
        kind: FailureKind,
        message: String,
    },
}

impl JobResult {
    pub fn success(job_id: impl Into<String>, summary: &str) -> Self {
        Self::Success {
            job_id: job_id.into(),
            summary: truncate_summary(summary),
        }
    }

    pub fn failure(job_id: impl Into<String>, kind: FailureKind, message: &str) -> Self {
        Self::Failure {
            job_id: job_id.into(),
            kind,
            message: truncate_failure_message(message),
        }
    }

    pub fn job_id(&self) -> &str {
        match self {
            Self::Success { job_id, .. } | Self::Failure { job_id, .. } => job_id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationError {
    message: String,
}

impl ConfigurationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ConfigurationError {}

pub fn parse_user_parameters(raw: &str) -> Result<UserParameters, ConfigurationError> {
    let parsed: UserParameters =
        serde_json::from_str(raw).map_err(|error| ConfigurationError::new(error.to_string()))?;

    let source_name = parsed.source_name.trim().to_string();
    if source_name.is_empty() {
        return Err(ConfigurationError::new("sourceName cannot be empty"));
    }

    let distribution_id = parsed.distribution_id.trim().to_string();
    if distribution_id.is_empty() {
        return Err(ConfigurationError::new("distributionId cannot be empty"));
    }

    Ok(UserParameters {
        source_name,
        distribution_id,
    })
}

pub fn truncate_failure_message(message: &str) -> String {
    truncate_chars(message, MAX_FAILURE_MESSAGE_CHARS)
}

pub fn truncate_summary(summary: &str) -> String {
    truncate_chars(summary, MAX_EXECUTION_SUMMARY_CHARS)
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((byte_index, _)) => value[..byte_index].to_string(),
        None => value.to_string(),
    }
}
