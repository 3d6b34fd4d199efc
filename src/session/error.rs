use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to draw entropy for a session token")]
    Entropy(#[source] rand::rand_core::OsError),
}
