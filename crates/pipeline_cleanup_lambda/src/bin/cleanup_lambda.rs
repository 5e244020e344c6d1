use lambda_runtime::{service_fn, Error, LambdaEvent};
use pipeline_cleanup_core::contract::JobResult;
use pipeline_cleanup_lambda::adapters::aws::{
    CloudFrontInvalidator, CodePipelineResultSink, S3BucketEmptier,
};
use pipeline_cleanup_lambda::handlers::cleanup::{handle_cleanup_event, CleanupCollaborators};
use pipeline_cleanup_lambda::telemetry::init_tracing;
use serde_json::Value;

struct RuntimeDependencies {
    storage: S3BucketEmptier,
    distribution: CloudFrontInvalidator,
    pipeline: CodePipelineResultSink,
}

async fn handle_request(
    deps: &RuntimeDependencies,
    event: LambdaEvent<Value>,
) -> Result<JobResult, Error> {
    let collaborators = CleanupCollaborators {
        storage: &deps.storage,
        distribution: &deps.distribution,
        pipeline: &deps.pipeline,
    };

    Ok(handle_cleanup_event(event.payload, &collaborators)?)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let deps = RuntimeDependencies {
        storage: S3BucketEmptier::new(aws_sdk_s3::Client::new(&aws_config)),
        distribution: CloudFrontInvalidator::new(aws_sdk_cloudfront::Client::new(&aws_config)),
        pipeline: CodePipelineResultSink::new(aws_sdk_codepipeline::Client::new(&aws_config)),
    };
    let deps = &deps;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle_request(deps, event).await
    }))
    .await
}
