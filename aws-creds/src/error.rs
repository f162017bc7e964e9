use thiserror::Error;

#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error("No credentials provided as arguments, in the environment or in the profile file")]
    ConfigNotFound,
    #[error("Missing aws_access_key_id section in config")]
    ConfigMissingAccessKeyId,
    #[error("Missing aws_secret_access_key section in config")]
    ConfigMissingSecretKey,
    #[error("Region {0:?} is not a valid region name")]
    InvalidRegion(String),
    #[error("Profile [{0}] not found in the credentials file")]
    MissingProfile(String),
    #[error("Neither {0}, nor {1} exists in the environment")]
    MissingEnvVar(String, String),
    #[error("ini: {0}")]
    Ini(#[from] ini::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("env var: {0}")]
    Env(#[from] std::env::VarError),
    #[error("Invalid home dir")]
    HomeDir,
}
