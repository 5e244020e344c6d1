use pipeline_cleanup_core::caller_reference::next_caller_reference;
use pipeline_cleanup_core::contract::{
    parse_user_parameters, CodePipelineEvent, FailureKind, JobResult, PipelineJob,
};
use serde_json::Value;
use thiserror::Error;

use crate::adapters::distribution::DistributionInvalidator;
use crate::adapters::pipeline::JobResultSink;
use crate::adapters::remote_error::RemoteCallError;
use crate::adapters::storage::BucketEmptier;

pub struct CleanupCollaborators<'a> {
    pub storage: &'a dyn BucketEmptier,
    pub distribution: &'a dyn DistributionInvalidator,
    pub pipeline: &'a dyn JobResultSink,
}

/// Failures that cannot be reported back to the pipeline and therefore fail
/// the Lambda invocation itself.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("malformed CodePipeline event: {0}")]
    MalformedEvent(#[source] serde_json::Error),

    #[error("failed to report result for job {job_id}: {source}")]
    Report {
        job_id: String,
        #[source]
        source: RemoteCallError,
    },
}

/// Empties the configured bucket, invalidates the configured distribution and
/// reports exactly one result for the job.
pub fn handle_cleanup_event(
    event: Value,
    collaborators: &CleanupCollaborators<'_>,
) -> Result<JobResult, HandlerError> {
    tracing::info!(event = %event, "received event");

    let event: CodePipelineEvent =
        serde_json::from_value(event).map_err(HandlerError::MalformedEvent)?;

    let result = run_cleanup_job(&event.job, collaborators);
    report_result(&result, collaborators.pipeline)?;
    Ok(result)
}

fn run_cleanup_job(job: &PipelineJob, collaborators: &CleanupCollaborators<'_>) -> JobResult {
    let parameters = match job.user_parameters().and_then(parse_user_parameters) {
        Ok(value) => value,
        Err(error) => {
            tracing::error!(job_id = %job.id, %error, "invalid user parameters");
            return JobResult::failure(&job.id, FailureKind::ConfigurationError, error.message());
        }
    };

    let deleted = match collaborators.storage.empty_bucket(&parameters.source_name) {
        Ok(value) => value,
        Err(error) => return job_failed(job, error),
    };

    let caller_reference = next_caller_reference();
    let invalidation_id = match collaborators
        .distribution
        .invalidate_all(&parameters.distribution_id, &caller_reference)
    {
        Ok(value) => value,
        Err(error) => return job_failed(job, error),
    };

    JobResult::success(
        &job.id,
        &format!(
            "Emptied {deleted} object(s) from {}; invalidation {invalidation_id} created for {}",
            parameters.source_name, parameters.distribution_id
        ),
    )
}

fn job_failed(job: &PipelineJob, error: RemoteCallError) -> JobResult {
    tracing::error!(
        job_id = %job.id,
        operation = error.operation,
        message = %error.message,
        "cleanup step failed"
    );
    JobResult::failure(&job.id, FailureKind::JobFailed, &error.message)
}

fn report_result(result: &JobResult, pipeline: &dyn JobResultSink) -> Result<(), HandlerError> {
    let reported = match result {
        JobResult::Success { job_id, summary } => pipeline.report_success(job_id, summary),
        JobResult::Failure {
            job_id,
            kind,
            message,
        } => pipeline.report_failure(job_id, *kind, message),
    };

    match reported {
        Ok(()) => {
            tracing::info!(
                job_id = result.job_id(),
                success = result.is_success(),
                "job result reported"
            );
            Ok(())
        }
        Err(source) => {
            tracing::error!(
                job_id = result.job_id(),
                error = %source,
                "failed to report job result"
            );
            Err(HandlerError::Report {
                job_id: result.job_id().to_string(),
                source,
            })
        }
    }
}
