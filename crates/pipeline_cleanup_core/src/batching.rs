/// S3 `DeleteObjects` accepts at most this many keys per request.
pub const MAX_KEYS_PER_DELETE: usize = 1_000;

pub fn delete_batches(keys: &[String]) -> std::slice::Chunks<'_, String> {
    keys.chunks(MAX_KEYS_PER_DELETE)
}
