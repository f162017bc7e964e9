//! Implementation of [AWS V4 Signing][link] for browser based `POST` uploads
//!
//! Unlike request signing there is no canonical request, the string to sign is
//! the base64 encoded policy document itself.
//!
//! [link]: https://docs.aws.amazon.com/AmazonS3/latest/API/sigv4-authentication-HTTPPOST.html

use hmac::{Hmac, Mac};
use log::debug;
use sha2::Sha256;

use crate::creds::error::CredentialsError;
use crate::creds::Credentials;
use crate::error::PostError;
use crate::DEFAULT_REGION;

pub type HmacSha256 = Hmac<Sha256>;

/// Credentials as they enter the signing chain: keys present and non empty,
/// region resolved.
#[derive(Clone, Eq, PartialEq)]
pub struct SigningCredentials {
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub security_token: Option<String>,
}

impl std::fmt::Debug for SigningCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningCredentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("region", &self.region)
            .field("security_token", &self.security_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl TryFrom<Credentials> for SigningCredentials {
    type Error = CredentialsError;

    fn try_from(credentials: Credentials) -> Result<Self, Self::Error> {
        let access_key = non_empty(credentials.access_key.map(|k| k.replace('\n', "")))
            .ok_or(CredentialsError::ConfigMissingAccessKeyId)?;
        let secret_key = non_empty(credentials.secret_key.map(|k| k.replace('\n', "")))
            .ok_or(CredentialsError::ConfigMissingSecretKey)?;
        let region = non_empty(credentials.region).unwrap_or_else(|| {
            debug!("no region in credentials, using {}", DEFAULT_REGION);
            DEFAULT_REGION.to_string()
        });
        if !is_region_name(&region) {
            return Err(CredentialsError::InvalidRegion(region));
        }
        let security_token =
            non_empty(credentials.security_token).or_else(|| non_empty(credentials.session_token));

        Ok(SigningCredentials {
            access_key,
            secret_key,
            region,
            security_token,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Lowercase alphanumerics and inner hyphens, the region becomes a host label.
fn is_region_name(region: &str) -> bool {
    !region.starts_with('-')
        && !region.ends_with('-')
        && region
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// Generate an AWS scope string.
pub fn scope_string(date_short: &str, region: &str) -> String {
    format!(
        "{date}/{region}/{service}/aws4_request",
        date = date_short,
        region = region,
        service = crate::SERVICE
    )
}

/// Value of the `x-amz-credential` field, the access key followed by the scope.
pub fn credential_string(access_key: &str, date_short: &str, region: &str) -> String {
    format!("{}/{}", access_key, scope_string(date_short, region))
}

/// Generate the AWS signing key, derived from the secret key, date, region,
/// and service name.
pub fn signing_key(
    date_short: &str,
    secret_key: &str,
    region: &str,
    service: &str,
) -> Result<Vec<u8>, PostError> {
    let secret = format!("AWS4{}", secret_key);
    let mut date_hmac = HmacSha256::new_from_slice(secret.as_bytes())?;
    date_hmac.update(date_short.as_bytes());
    let mut region_hmac = HmacSha256::new_from_slice(&date_hmac.finalize().into_bytes())?;
    region_hmac.update(region.as_bytes());
    let mut service_hmac = HmacSha256::new_from_slice(&region_hmac.finalize().into_bytes())?;
    service_hmac.update(service.as_bytes());
    let mut signing_hmac = HmacSha256::new_from_slice(&service_hmac.finalize().into_bytes())?;
    signing_hmac.update(b"aws4_request");
    Ok(signing_hmac.finalize().into_bytes().to_vec())
}

/// Sign the base64 policy, lowercase hex.
pub fn sign_policy(signing_key: &[u8], policy: &str) -> Result<String, PostError> {
    let mut hmac = HmacSha256::new_from_slice(signing_key)?;
    hmac.update(policy.as_bytes());
    Ok(hex::encode(hmac.finalize().into_bytes()))
}
