use log::{debug, trace};
use url::Url;

use crate::creds::{CredentialsProvider, DEFAULT_SCOPE};
use crate::error::PostError;
use crate::post_policy::PostPolicy;
use crate::signing::{self, SigningCredentials};
use crate::upload_spec::UploadSpec;
use crate::utils::{AmzDateFormatter, Clock, DateFormatter, SystemClock};
use crate::{ALGORITHM, SERVICE};

/// Where to post and what to post along with the file.
///
/// Serializes as `{"url": .., "credentials": {..}}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PresignedPost {
    /// Form `action`.
    pub url: String,
    /// Hidden form fields.
    pub credentials: PostCredentials,
}

impl PresignedPost {
    pub fn to_json(&self) -> Result<String, PostError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Form fields of a presigned POST, in the order S3 documents them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PostCredentials {
    pub policy: String,
    #[serde(rename = "x-amz-algorithm")]
    pub algorithm: String,
    #[serde(rename = "x-amz-credential")]
    pub credential: String,
    #[serde(rename = "x-amz-date")]
    pub date: String,
    #[serde(rename = "x-amz-signature")]
    pub signature: String,
    pub acl: String,
    pub key: String,
    #[serde(
        rename = "x-amz-security-token",
        skip_serializing_if = "Option::is_none"
    )]
    pub security_token: Option<String>,
}

impl PostCredentials {
    /// `(name, value)` pairs, ready to render as hidden inputs.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields = vec![
            ("policy", self.policy.as_str()),
            ("x-amz-algorithm", self.algorithm.as_str()),
            ("x-amz-credential", self.credential.as_str()),
            ("x-amz-date", self.date.as_str()),
            ("x-amz-signature", self.signature.as_str()),
            ("acl", self.acl.as_str()),
            ("key", self.key.as_str()),
        ];
        if let Some(security_token) = &self.security_token {
            fields.push(("x-amz-security-token", security_token.as_str()));
        }
        fields
    }
}

/// Turns [`UploadSpec`]s into [`PresignedPost`]s.
///
/// Credentials are resolved and the clock is read once per call, nothing is
/// kept between calls, so a signer can be shared freely.
#[derive(Clone, Debug)]
pub struct PostSigner<P, C = SystemClock, F = AmzDateFormatter> {
    provider: P,
    clock: C,
    formatter: F,
    scope: String,
}

impl<P: CredentialsProvider> PostSigner<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            clock: SystemClock,
            formatter: AmzDateFormatter,
            scope: DEFAULT_SCOPE.to_string(),
        }
    }
}

impl<P, C, F> PostSigner<P, C, F>
where
    P: CredentialsProvider,
    C: Clock,
    F: DateFormatter,
{
    pub fn with_clock<T: Clock>(self, clock: T) -> PostSigner<P, T, F> {
        PostSigner {
            provider: self.provider,
            clock,
            formatter: self.formatter,
            scope: self.scope,
        }
    }

    pub fn with_formatter<T: DateFormatter>(self, formatter: T) -> PostSigner<P, C, T> {
        PostSigner {
            provider: self.provider,
            clock: self.clock,
            formatter,
            scope: self.scope,
        }
    }

    /// Scope handed to the credentials provider, `default` unless set.
    pub fn with_scope<S: Into<String>>(mut self, scope: S) -> Self {
        self.scope = scope.into();
        self
    }

    /// Builds the policy, signs it and assembles the form fields.
    pub fn build_envelope(&self, spec: &UploadSpec<'_>) -> Result<PresignedPost, PostError> {
        spec.validate()?;

        let credentials = SigningCredentials::try_from(self.provider.credentials(&self.scope)?)?;
        let url = post_url(spec.bucket(), &credentials.region)?;

        let now = self.clock.now();
        let amz_date = self.formatter.amz_date(&now)?;
        let date_short = self.formatter.amz_date_short(&now)?;

        let expires_at = spec.expiration().at(now);
        if expires_at <= now {
            return Err(PostError::InvalidSpec(format!(
                "expiration {} is not after signing time {}",
                expires_at, now
            )));
        }
        let expiration = self.formatter.expiration(&expires_at)?;

        let credential =
            signing::credential_string(&credentials.access_key, &date_short, &credentials.region);
        trace!("x-amz-credential {}, x-amz-date {}", credential, amz_date);

        let policy = PostPolicy::build(
            spec,
            expiration,
            credential.clone(),
            amz_date.clone(),
            credentials.security_token.as_deref(),
        )?;
        let policy_string = policy.policy_string()?;

        let signing_key = signing::signing_key(
            &date_short,
            &credentials.secret_key,
            &credentials.region,
            SERVICE,
        )?;
        let signature = signing::sign_policy(&signing_key, &policy_string)?;

        let key = spec.key();
        debug!(
            "presigned POST for s3://{}/{} expiring {}",
            spec.bucket(),
            key,
            policy.expiration()
        );

        Ok(PresignedPost {
            url,
            credentials: PostCredentials {
                policy: policy_string,
                algorithm: ALGORITHM.to_string(),
                credential,
                date: amz_date,
                signature,
                acl: spec.acl().to_string(),
                key,
                security_token: credentials.security_token.clone(),
            },
        })
    }

    /// [`build_envelope`](Self::build_envelope) serialized to JSON.
    pub fn build_envelope_json(&self, spec: &UploadSpec<'_>) -> Result<String, PostError> {
        self.build_envelope(spec)?.to_json()
    }
}

/// Virtual hosted style endpoint of `bucket`. The bucket must be made of
/// non empty labels and survive URL parsing unchanged as part of the host.
fn post_url(bucket: &str, region: &str) -> Result<String, PostError> {
    if bucket.split('.').any(str::is_empty) {
        return Err(PostError::InvalidSpec(format!(
            "bucket {:?} has an empty label",
            bucket
        )));
    }
    let host = format!("{}.s3.{}.amazonaws.com", bucket, region);
    let url = format!("https://{}", host);
    let parsed = Url::parse(&url)
        .map_err(|e| PostError::InvalidSpec(format!("bucket {:?}: {}", bucket, e)))?;
    if parsed.host_str() != Some(host.as_str()) {
        return Err(PostError::InvalidSpec(format!(
            "bucket {:?} is not a valid host name",
            bucket
        )));
    }
    Ok(url)
}
