use super::remote_error::RemoteCallError;

pub trait BucketEmptier {
    /// Deletes every object in `bucket`, returning how many were removed.
    fn empty_bucket(&self, bucket: &str) -> Result<usize, RemoteCallError>;
}
