use pipeline_cleanup_core::contract::FailureKind;

use super::remote_error::RemoteCallError;

pub trait JobResultSink {
    fn report_success(&self, job_id: &str, summary: &str) -> Result<(), RemoteCallError>;

    fn report_failure(
        &self,
        job_id: &str,
        kind: FailureKind,
        message: &str,
    ) -> Result<(), RemoteCallError>;
}
