use thiserror::Error;

#[derive(Error, Debug)]
pub enum PostError {
    #[error("aws-creds: {0}")]
    Credentials(#[from] crate::creds::error::CredentialsError),
    #[error("invalid upload spec: {0}")]
    InvalidSpec(String),
    #[error("post policy: {0}")]
    PostPolicy(#[from] PostPolicyError),
    #[error("sha2 invalid length: {0}")]
    HmacInvalidLength(#[from] sha2::digest::InvalidLength),
    #[error("Time format error: {0}")]
    TimeFormatError(#[from] time::error::Format),
    #[error("serde json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum PostPolicyError {
    #[error("This value is not supported for this field")]
    MismatchedCondition,
    #[error("Range lower bound {0} is above upper bound {1}")]
    InvalidRange(u64, u64),
    #[error("Unsupported condition operator '{0}'")]
    UnsupportedOperator(String),
    #[error("Malformed condition: {0}")]
    MalformedCondition(String),
}
