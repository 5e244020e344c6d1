//! S3, CloudFront and CodePipeline implementations of the collaborator traits.
//!
//! The SDK clients are async; the traits are not. Calls are bridged with
//! `block_in_place`, which requires a multi-threaded Tokio runtime.

use std::future::Future;

use aws_sdk_cloudfront::types::{InvalidationBatch, Paths};
use aws_sdk_codepipeline::types::{ExecutionDetails, FailureDetails, FailureType};
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use pipeline_cleanup_core::batching::delete_batches;
use pipeline_cleanup_core::contract::{FailureKind, INVALIDATE_ALL_PATHS};

use super::distribution::DistributionInvalidator;
use super::pipeline::JobResultSink;
use super::remote_error::RemoteCallError;
use super::storage::BucketEmptier;

pub const UNKNOWN_INVALIDATION_ID: &str = "<unknown>";

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

pub struct S3BucketEmptier {
    s3_client: aws_sdk_s3::Client,
}

impl S3BucketEmptier {
    pub fn new(s3_client: aws_sdk_s3::Client) -> Self {
        Self { s3_client }
    }
}

impl BucketEmptier for S3BucketEmptier {
    fn empty_bucket(&self, bucket: &str) -> Result<usize, RemoteCallError> {
        let client = self.s3_client.clone();
        let bucket_name = bucket.to_string();

        let result = block_on(async move { delete_all_objects(&client, &bucket_name).await });
        match &result {
            Ok(deleted) => tracing::info!(bucket, deleted, "bucket emptied"),
            Err(error) => tracing::error!(bucket, %error, "failed to empty bucket"),
        }
        result
    }
}

async fn delete_all_objects(
    client: &aws_sdk_s3::Client,
    bucket: &str,
) -> Result<usize, RemoteCallError> {
    let mut pages = client
        .list_objects_v2()
        .bucket(bucket)
        .into_paginator()
        .send();
    let mut deleted = 0usize;

    while let Some(page) = pages.next().await {
        let page = page.map_err(|error| RemoteCallError::from_sdk("ListObjectsV2", &error))?;
        let keys: Vec<String> = page
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_string))
            .collect();

        for batch in delete_batches(&keys) {
            deleted += delete_batch(client, bucket, batch).await?;
        }
    }

    Ok(deleted)
}

async fn delete_batch(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    keys: &[String],
) -> Result<usize, RemoteCallError> {
    let objects = keys
        .iter()
        .map(|key| ObjectIdentifier::builder().key(key).build())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| RemoteCallError::new("DeleteObjects", error.to_string()))?;
    let delete = Delete::builder()
        .set_objects(Some(objects))
        .quiet(true)
        .build()
        .map_err(|error| RemoteCallError::new("DeleteObjects", error.to_string()))?;

    let output = client
        .delete_objects()
        .bucket(bucket)
        .delete(delete)
        .send()
        .await
        .map_err(|error| RemoteCallError::from_sdk("DeleteObjects", &error))?;

    // Quiet mode only lists keys that could not be deleted.
    if let Some(first) = output.errors().first() {
        return Err(RemoteCallError::new(
            "DeleteObjects",
            format!(
                "{} of {} object(s) not deleted; {}: {}",
                output.errors().len(),
                keys.len(),
                first.key().unwrap_or("<unknown key>"),
                first.message().unwrap_or("unknown error"),
            ),
        ));
    }

    Ok(keys.len())
}

pub struct CloudFrontInvalidator {
    cloudfront_client: aws_sdk_cloudfront::Client,
}

impl CloudFrontInvalidator {
    pub fn new(cloudfront_client: aws_sdk_cloudfront::Client) -> Self {
        Self { cloudfront_client }
    }
}

impl DistributionInvalidator for CloudFrontInvalidator {
    fn invalidate_all(
        &self,
        distribution_id: &str,
        caller_reference: &str,
    ) -> Result<String, RemoteCallError> {
        let paths = Paths::builder()
            .quantity(INVALIDATE_ALL_PATHS.len() as i32)
            .set_items(Some(
                INVALIDATE_ALL_PATHS
                    .iter()
                    .map(|path| path.to_string())
                    .collect(),
            ))
            .build()
            .map_err(|error| RemoteCallError::new("CreateInvalidation", error.to_string()))?;
        let batch = InvalidationBatch::builder()
            .paths(paths)
            .caller_reference(caller_reference)
            .build()
            .map_err(|error| RemoteCallError::new("CreateInvalidation", error.to_string()))?;

        let request = self
            .cloudfront_client
            .create_invalidation()
            .distribution_id(distribution_id)
            .invalidation_batch(batch);
        let result = block_on(async move {
            request
                .send()
                .await
                .map(|output| {
                    output
                        .invalidation()
                        .map(|invalidation| invalidation.id().to_string())
                })
                .map_err(|error| RemoteCallError::from_sdk("CreateInvalidation", &error))
        });

        match result {
            Ok(Some(invalidation_id)) => {
                tracing::info!(
                    distribution_id,
                    caller_reference,
                    invalidation_id = invalidation_id.as_str(),
                    "invalidation created"
                );
                Ok(invalidation_id)
            }
            Ok(None) => {
                tracing::warn!(
                    distribution_id,
                    caller_reference,
                    "invalidation accepted without an invalidation id in the response"
                );
                Ok(UNKNOWN_INVALIDATION_ID.to_string())
            }
            Err(error) => {
                tracing::error!(distribution_id, %error, "failed to invalidate distribution");
                Err(error)
            }
        }
    }
}

pub struct CodePipelineResultSink {
    codepipeline_client: aws_sdk_codepipeline::Client,
}

impl CodePipelineResultSink {
    pub fn new(codepipeline_client: aws_sdk_codepipeline::Client) -> Self {
        Self {
            codepipeline_client,
        }
    }
}

pub fn failure_type(kind: FailureKind) -> FailureType {
    match kind {
        FailureKind::JobFailed => FailureType::JobFailed,
        FailureKind::ConfigurationError => FailureType::ConfigurationError,
    }
}

impl JobResultSink for CodePipelineResultSink {
    fn report_success(&self, job_id: &str, summary: &str) -> Result<(), RemoteCallError> {
        let request = self
            .codepipeline_client
            .put_job_success_result()
            .job_id(job_id)
            .execution_details(ExecutionDetails::builder().summary(summary).build());

        block_on(async move {
            request
                .send()
                .await
                .map(|_| ())
                .map_err(|error| RemoteCallError::from_sdk("PutJobSuccessResult", &error))
        })
    }

    fn report_failure(
        &self,
        job_id: &str,
        kind: FailureKind,
        message: &str,
    ) -> Result<(), RemoteCallError> {
        let details = FailureDetails::builder()
            .r#type(failure_type(kind))
            .message(message)
            .build()
            .map_err(|error| RemoteCallError::new("PutJobFailureResult", error.to_string()))?;

        let request = self
            .codepipeline_client
            .put_job_failure_result()
            .job_id(job_id)
            .failure_details(details);

        block_on(async move {
            request
                .send()
                .await
                .map(|_| ())
                .map_err(|error| RemoteCallError::from_sdk("PutJobFailureResult", &error))
        })
    }
}

#[cfg(test)]
mod tests {
    use aws_sdk_cloudfront::operation::create_invalidation::CreateInvalidationOutput;
    use aws_sdk_cloudfront::primitives::DateTime;
    use aws_sdk_cloudfront::types::Invalidation;
    use aws_sdk_codepipeline::operation::put_job_failure_result::PutJobFailureResultOutput;
    use aws_sdk_codepipeline::operation::put_job_success_result::PutJobSuccessResultOutput;
    use aws_sdk_s3::error::ErrorMetadata;
    use aws_sdk_s3::operation::delete_objects::{DeleteObjectsInput, DeleteObjectsOutput};
    use aws_sdk_s3::operation::list_objects_v2::{ListObjectsV2Error, ListObjectsV2Output};
    use aws_sdk_s3::types::{Error as S3KeyError, Object};
    use aws_smithy_mocks::{mock, mock_client, RuleMode};

    use super::*;

    fn object(key: &str) -> Object {
        Object::builder().key(key).build()
    }

    fn first_deleted_key(input: &DeleteObjectsInput) -> Option<&str> {
        input
            .delete()
            .and_then(|delete| delete.objects().first())
            .map(|object| object.key())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn emptying_an_empty_bucket_twice_deletes_nothing() {
        let first_listing = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|req| req.bucket() == Some("site-bucket"))
            .then_output(|| ListObjectsV2Output::builder().key_count(0).build());
        let second_listing = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|req| req.bucket() == Some("site-bucket"))
            .then_output(|| ListObjectsV2Output::builder().key_count(0).build());
        let delete = mock!(aws_sdk_s3::Client::delete_objects)
            .then_output(|| DeleteObjectsOutput::builder().build());
        let client = mock_client!(
            aws_sdk_s3,
            RuleMode::MatchAny,
            [&first_listing, &second_listing, &delete]
        );
        let emptier = S3BucketEmptier::new(client);

        assert_eq!(emptier.empty_bucket("site-bucket"), Ok(0));
        assert_eq!(emptier.empty_bucket("site-bucket"), Ok(0));
        assert_eq!(first_listing.num_calls() + second_listing.num_calls(), 2);
        assert_eq!(delete.num_calls(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn deletes_every_page_of_a_paginated_listing() {
        let first_page = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|req| req.continuation_token().is_none())
            .then_output(|| {
                ListObjectsV2Output::builder()
                    .contents(object("index.html"))
                    .contents(object("app.js"))
                    .is_truncated(true)
                    .next_continuation_token("page-2")
                    .build()
            });
        let second_page = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|req| req.continuation_token() == Some("page-2"))
            .then_output(|| {
                ListObjectsV2Output::builder()
                    .contents(object("styles.css"))
                    .is_truncated(false)
                    .build()
            });
        let first_delete = mock!(aws_sdk_s3::Client::delete_objects)
            .match_requests(|req| first_deleted_key(req) == Some("index.html"))
            .then_output(|| DeleteObjectsOutput::builder().build());
        let second_delete = mock!(aws_sdk_s3::Client::delete_objects)
            .match_requests(|req| first_deleted_key(req) == Some("styles.css"))
            .then_output(|| DeleteObjectsOutput::builder().build());
        let client = mock_client!(
            aws_sdk_s3,
            RuleMode::MatchAny,
            [&first_page, &second_page, &first_delete, &second_delete]
        );

        let deleted = S3BucketEmptier::new(client)
            .empty_bucket("site-bucket")
            .expect("both pages should be deleted");

        assert_eq!(deleted, 3);
        assert_eq!(first_page.num_calls(), 1);
        assert_eq!(second_page.num_calls(), 1);
        assert_eq!(first_delete.num_calls(), 1);
        assert_eq!(second_delete.num_calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn per_key_delete_errors_fail_the_bucket() {
        let listing = mock!(aws_sdk_s3::Client::list_objects_v2).then_output(|| {
            ListObjectsV2Output::builder()
                .contents(object("index.html"))
                .contents(object("locked.html"))
                .build()
        });
        let delete = mock!(aws_sdk_s3::Client::delete_objects).then_output(|| {
            DeleteObjectsOutput::builder()
                .errors(
                    S3KeyError::builder()
                        .key("locked.html")
                        .code("AccessDenied")
                        .message("Access Denied")
                        .build(),
                )
                .build()
        });
        let client = mock_client!(aws_sdk_s3, RuleMode::MatchAny, [&listing, &delete]);

        let error = S3BucketEmptier::new(client)
            .empty_bucket("site-bucket")
            .expect_err("undeleted keys should fail");

        assert_eq!(error.operation, "DeleteObjects");
        assert_eq!(
            error.message,
            "1 of 2 object(s) not deleted; locked.html: Access Denied"
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn listing_error_carries_service_message() {
        let listing = mock!(aws_sdk_s3::Client::list_objects_v2).then_error(|| {
            ListObjectsV2Error::generic(
                ErrorMetadata::builder()
                    .code("NoSuchBucket")
                    .message("The specified bucket does not exist")
                    .build(),
            )
        });
        let client = mock_client!(aws_sdk_s3, [&listing]);

        let error = S3BucketEmptier::new(client)
            .empty_bucket("missing-bucket")
            .expect_err("missing bucket should fail");

        assert_eq!(
            error,
            RemoteCallError::new("ListObjectsV2", "The specified bucket does not exist")
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn invalidation_returns_created_id() {
        let create = mock!(aws_sdk_cloudfront::Client::create_invalidation)
            .match_requests(|req| req.distribution_id() == Some("E123"))
            .then_output(|| {
                let batch = InvalidationBatch::builder()
                    .paths(
                        Paths::builder()
                            .quantity(1)
                            .items("/*")
                            .build()
                            .expect("paths should build"),
                    )
                    .caller_reference("1700000000123456-0000abcd")
                    .build()
                    .expect("batch should build");
                CreateInvalidationOutput::builder()
                    .invalidation(
                        Invalidation::builder()
                            .id("I2J0I21PCUYOIK")
                            .status("InProgress")
                            .create_time(DateTime::from_secs(1_700_000_000))
                            .invalidation_batch(batch)
                            .build()
                            .expect("invalidation should build"),
                    )
                    .build()
            });
        let client = mock_client!(aws_sdk_cloudfront, [&create]);

        let invalidation_id = CloudFrontInvalidator::new(client)
            .invalidate_all("E123", "1700000000123456-0000abcd")
            .expect("invalidation should succeed");

        assert_eq!(invalidation_id, "I2J0I21PCUYOIK");
        assert_eq!(create.num_calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_invalidation_in_response_uses_placeholder_id() {
        let create = mock!(aws_sdk_cloudfront::Client::create_invalidation)
            .then_output(|| CreateInvalidationOutput::builder().build());
        let client = mock_client!(aws_sdk_cloudfront, [&create]);

        let invalidation_id = CloudFrontInvalidator::new(client)
            .invalidate_all("E123", "1700000000123456-0000abcd")
            .expect("invalidation should succeed");

        assert_eq!(invalidation_id, UNKNOWN_INVALIDATION_ID);
    }

    #[test]
    fn failure_kinds_map_to_pipeline_failure_types() {
        assert_eq!(failure_type(FailureKind::JobFailed), FailureType::JobFailed);
        assert_eq!(
            failure_type(FailureKind::ConfigurationError),
            FailureType::ConfigurationError
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reports_results_for_the_job() {
        let success = mock!(aws_sdk_codepipeline::Client::put_job_success_result)
            .match_requests(|req| req.job_id() == Some("job-42"))
            .then_output(|| PutJobSuccessResultOutput::builder().build());
        let failure = mock!(aws_sdk_codepipeline::Client::put_job_failure_result)
            .match_requests(|req| req.job_id() == Some("job-43"))
            .then_output(|| PutJobFailureResultOutput::builder().build());
        let client = mock_client!(
            aws_sdk_codepipeline,
            RuleMode::MatchAny,
            [&success, &failure]
        );
        let sink = CodePipelineResultSink::new(client);

        sink.report_success("job-42", "Emptied 0 object(s)")
            .expect("success should be reported");
        sink.report_failure("job-43", FailureKind::ConfigurationError, "bad json")
            .expect("failure should be reported");

        assert_eq!(success.num_calls(), 1);
        assert_eq!(failure.num_calls(), 1);
    }
}
