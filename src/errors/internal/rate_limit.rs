use thiserror::Error;

#[derive(Error, Debug)]
pub enum RateLimitError {
    #[error("Too many login attempts; retry in {retry_after_seconds}s")]
    Blocked { retry_after_seconds: u64 },
}
