use super::remote_error::RemoteCallError;

pub trait DistributionInvalidator {
    /// Requests invalidation of `/*`, returning the invalidation id.
    fn invalidate_all(
        &self,
        distribution_id: &str,
        caller_reference: &str,
    ) -> Result<String, RemoteCallError>;
}
