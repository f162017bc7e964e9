use crate::error::{PostError, PostPolicyError};
use crate::upload_spec::UploadSpec;
use crate::{ALGORITHM, DEFAULT_EXPIRATION_SECS};

use serde::ser::{Serialize, SerializeMap, SerializeTuple, Serializer};
use serde_json::Value;
use std::borrow::Cow;
use time::{Duration, OffsetDateTime};

/// A POST policy document: an expiration and the conditions the upload form
/// must satisfy.
///
/// Serializes as `{"expiration": .., "conditions": [..]}`, always in that
/// order, so the same policy always produces the same bytes.
#[derive(Clone, Debug)]
pub struct PostPolicy<'a> {
    expiration: String,
    conditions: Vec<PostPolicyCondition<'a>>,
}

impl<'a> PostPolicy<'a> {
    pub fn new<T>(expiration: T) -> Self
    where
        T: Into<String>,
    {
        Self {
            expiration: expiration.into(),
            conditions: Vec::new(),
        }
    }

    /// Builds the policy for a single upload. Base conditions come first, then
    /// the security token, then the caller's conditions in their given order.
    pub(crate) fn build(
        spec: &'a UploadSpec<'a>,
        expiration: String,
        credential: String,
        amz_date: String,
        security_token: Option<&'a str>,
    ) -> Result<PostPolicy<'a>, PostError> {
        let mut post_policy = PostPolicy::new(expiration)
            .condition(
                PostPolicyField::Bucket,
                PostPolicyValue::Exact(Cow::from(spec.bucket())),
            )?
            .condition(
                PostPolicyField::Acl,
                PostPolicyValue::Exact(Cow::from(spec.acl())),
            )?
            .condition(
                PostPolicyField::AmzAlgorithm,
                PostPolicyValue::Exact(Cow::from(ALGORITHM)),
            )?
            .condition(
                PostPolicyField::AmzCredential,
                PostPolicyValue::Exact(Cow::from(credential)),
            )?
            .condition(
                PostPolicyField::AmzDate,
                PostPolicyValue::Exact(Cow::from(amz_date)),
            )?
            .condition(
                PostPolicyField::ContentType,
                PostPolicyValue::StartsWith(Cow::from(spec.mimetype())),
            )?
            .condition(
                PostPolicyField::Key,
                PostPolicyValue::StartsWith(Cow::from(spec.path())),
            )?;

        if let Some(security_token) = security_token {
            post_policy = post_policy.condition(
                PostPolicyField::AmzSecurityToken,
                PostPolicyValue::Exact(Cow::from(security_token)),
            )?;
        }

        Ok(post_policy.extend(spec.additional_conditions().iter().cloned()))
    }

    /// Adds another condition to the policy by consuming this object
    pub fn condition(
        self,
        field: PostPolicyField<'a>,
        value: PostPolicyValue<'a>,
    ) -> Result<Self, PostError> {
        Ok(self.push(PostPolicyCondition::new(field, value)?))
    }

    pub fn push(mut self, condition: PostPolicyCondition<'a>) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn extend<I>(mut self, conditions: I) -> Self
    where
        I: IntoIterator<Item = PostPolicyCondition<'a>>,
    {
        self.conditions.extend(conditions);
        self
    }

    pub fn expiration(&self) -> &str {
        &self.expiration
    }

    pub fn conditions(&self) -> &[PostPolicyCondition<'a>] {
        &self.conditions
    }

    /// Compact JSON of the document, base64 encoded. This is both the `policy`
    /// form field and the string to sign.
    pub fn policy_string(&self) -> Result<String, PostError> {
        use base64::engine::general_purpose;
        use base64::Engine;

        let data = serde_json::to_string(self)?;

        Ok(general_purpose::STANDARD.encode(data))
    }
}

impl Serialize for PostPolicy<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("expiration", &self.expiration)?;
        map.serialize_entry("conditions", &self.conditions)?;
        map.end()
    }
}

/// One entry of the policy `conditions` array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostPolicyCondition<'a> {
    field: PostPolicyField<'a>,
    value: PostPolicyValue<'a>,
}

impl<'a> PostPolicyCondition<'a> {
    /// `Range` values belong to `ContentLengthRange` and nothing else. Field
    /// names must not be empty.
    pub fn new(
        field: PostPolicyField<'a>,
        value: PostPolicyValue<'a>,
    ) -> Result<Self, PostPolicyError> {
        if field.name().is_empty() {
            return Err(PostPolicyError::MalformedCondition(
                "empty field name".to_string(),
            ));
        }
        if matches!(field, PostPolicyField::ContentLengthRange)
            != matches!(value, PostPolicyValue::Range(_, _))
        {
            return Err(PostPolicyError::MismatchedCondition);
        }
        if let PostPolicyValue::Range(min, max) = value {
            if min > max {
                return Err(PostPolicyError::InvalidRange(min, max));
            }
        }
        Ok(Self { field, value })
    }

    pub fn field(&self) -> &PostPolicyField<'a> {
        &self.field
    }

    pub fn value(&self) -> &PostPolicyValue<'a> {
        &self.value
    }
}

impl TryFrom<&Value> for PostPolicyCondition<'static> {
    type Error = PostPolicyError;

    /// Parses the JSON forms S3 documents for policy conditions:
    /// `{"field": "value"}`, `["starts-with" | "eq", "$field", "value"]` and
    /// `["content-length-range", min, max]`.
    fn try_from(condition: &Value) -> Result<Self, Self::Error> {
        let malformed = || PostPolicyError::MalformedCondition(condition.to_string());

        match condition {
            Value::Object(map) if map.len() == 1 => {
                let (field, value) = map.iter().next().ok_or_else(malformed)?;
                let value = value.as_str().ok_or_else(malformed)?;
                PostPolicyCondition::new(
                    PostPolicyField::Custom(Cow::Owned(field.clone())),
                    PostPolicyValue::Exact(Cow::Owned(value.to_string())),
                )
            }
            Value::Array(items) if items.len() == 3 => {
                let operator = items[0].as_str().ok_or_else(malformed)?;
                match operator {
                    "starts-with" | "eq" => {
                        let field = items[1]
                            .as_str()
                            .and_then(|f| f.strip_prefix('$'))
                            .filter(|f| !f.is_empty())
                            .ok_or_else(malformed)?;
                        let value = Cow::Owned(items[2].as_str().ok_or_else(malformed)?.to_string());
                        let value = if operator == "eq" {
                            PostPolicyValue::Eq(value)
                        } else {
                            PostPolicyValue::StartsWith(value)
                        };
                        PostPolicyCondition::new(
                            PostPolicyField::Custom(Cow::Owned(field.to_string())),
                            value,
                        )
                    }
                    "content-length-range" => {
                        let min = items[1].as_u64().ok_or_else(malformed)?;
                        let max = items[2].as_u64().ok_or_else(malformed)?;
                        PostPolicyCondition::new(
                            PostPolicyField::ContentLengthRange,
                            PostPolicyValue::Range(min, max),
                        )
                    }
                    other => Err(PostPolicyError::UnsupportedOperator(other.to_string())),
                }
            }
            _ => Err(malformed()),
        }
    }
}

impl Serialize for PostPolicyCondition<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let f = self.field.name();

        match &self.value {
            PostPolicyValue::Exact(e) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(&f, e)?;
                map.end()
            }
            PostPolicyValue::StartsWith(e) => operator_tuple(serializer, "starts-with", &f, e),
            PostPolicyValue::Anything => operator_tuple(serializer, "starts-with", &f, ""),
            PostPolicyValue::Eq(e) => operator_tuple(serializer, "eq", &f, e),
            PostPolicyValue::Range(b, e) => {
                let mut seq = serializer.serialize_tuple(3)?;
                seq.serialize_element("content-length-range")?;
                seq.serialize_element(b)?;
                seq.serialize_element(e)?;
                seq.end()
            }
        }
    }
}

fn operator_tuple<S>(serializer: S, operator: &str, field: &str, value: &str) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut seq = serializer.serialize_tuple(3)?;
    seq.serialize_element(operator)?;
    seq.serialize_element(&format!("${}", field))?;
    seq.serialize_element(value)?;
    seq.end()
}

/// Policy fields to add to the conditions of the policy
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum PostPolicyField<'a> {
    /// The destination path. Supports [`PostPolicyValue::StartsWith`]
    Key,
    /// The ACL policy. Supports [`PostPolicyValue::StartsWith`]
    Acl,
    /// Custom tag XML document
    Tagging,
    /// Successful redirect URL. Supports [`PostPolicyValue::StartsWith`]
    SuccessActionRedirect,
    /// Successful action status (e.g. 200, 201, or 204).
    SuccessActionStatus,

    /// The cache control  Supports [`PostPolicyValue::StartsWith`]
    CacheControl,
    /// The content length (must use the [`PostPolicyValue::Range`])
    ContentLengthRange,
    /// The content type. Supports [`PostPolicyValue::StartsWith`]
    ContentType,
    /// Content Disposition. Supports [`PostPolicyValue::StartsWith`]
    ContentDisposition,
    /// The content encoding. Supports [`PostPolicyValue::StartsWith`]
    ContentEncoding,
    /// The Expires header to respond when fetching. Supports [`PostPolicyValue::StartsWith`]
    Expires,

    /// The server-side encryption type
    AmzServerSideEncryption,
    /// The storage class to use
    AmzStorageClass,
    /// Any user-defined meta fields (AmzMeta("uuid".into()) creates an x-amz-meta-uuid)
    AmzMeta(Cow<'a, str>),

    /// The credential. Added by the signer
    AmzCredential,
    /// The signing algorithm. Added by the signer
    AmzAlgorithm,
    /// The signing date. Added by the signer
    AmzDate,
    /// The security token of temporary credentials. Added by the signer
    AmzSecurityToken,
    /// The Bucket. Added by the signer
    Bucket,

    /// Custom field. Any other string not enumerated above
    Custom(Cow<'a, str>),
}

impl PostPolicyField<'_> {
    /// Form field name as it appears in the policy (without the `$` prefix).
    pub fn name(&self) -> Cow<'_, str> {
        match self {
            PostPolicyField::Key => Cow::from("key"),
            PostPolicyField::Acl => Cow::from("acl"),
            PostPolicyField::Tagging => Cow::from("tagging"),
            PostPolicyField::SuccessActionRedirect => Cow::from("success_action_redirect"),
            PostPolicyField::SuccessActionStatus => Cow::from("success_action_status"),
            PostPolicyField::CacheControl => Cow::from("Cache-Control"),
            PostPolicyField::ContentLengthRange => Cow::from("content-length-range"),
            PostPolicyField::ContentType => Cow::from("Content-Type"),
            PostPolicyField::ContentDisposition => Cow::from("Content-Disposition"),
            PostPolicyField::ContentEncoding => Cow::from("Content-Encoding"),
            PostPolicyField::Expires => Cow::from("Expires"),
            PostPolicyField::AmzServerSideEncryption => Cow::from("x-amz-server-side-encryption"),
            PostPolicyField::AmzStorageClass => Cow::from("x-amz-storage-class"),
            PostPolicyField::AmzMeta(e) => Cow::from(format!("x-amz-meta-{}", e)),
            PostPolicyField::AmzCredential => Cow::from("x-amz-credential"),
            PostPolicyField::AmzAlgorithm => Cow::from("x-amz-algorithm"),
            PostPolicyField::AmzDate => Cow::from("x-amz-date"),
            PostPolicyField::AmzSecurityToken => Cow::from("x-amz-security-token"),
            PostPolicyField::Bucket => Cow::from("bucket"),
            PostPolicyField::Custom(e) => Cow::from(e.as_ref()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PostPolicyValue<'a> {
    /// Shortcut for StartsWith("".to_string())
    Anything,
    /// A string starting with a value
    StartsWith(Cow<'a, str>),
    /// `["eq", "$field", value]`, same check as `Exact` in tuple form
    Eq(Cow<'a, str>),
    /// An inclusive range of byte counts. Only valid for `ContentLengthRange`
    Range(u64, u64),
    /// An exact string value
    Exact(Cow<'a, str>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostPolicyExpiration {
    /// Expires in X seconds from the signing instant
    ExpiresIn(u32),
    /// Expires at exactly this time
    ExpiresAt(OffsetDateTime),
}

impl PostPolicyExpiration {
    /// Absolute expiration for a policy signed at `now`.
    pub fn at(&self, now: OffsetDateTime) -> OffsetDateTime {
        match *self {
            PostPolicyExpiration::ExpiresIn(d) => now.saturating_add(Duration::seconds(d as i64)),
            PostPolicyExpiration::ExpiresAt(t) => t,
        }
    }
}

impl Default for PostPolicyExpiration {
    fn default() -> Self {
        Self::ExpiresIn(DEFAULT_EXPIRATION_SECS)
    }
}

impl From<u32> for PostPolicyExpiration {
    fn from(value: u32) -> Self {
        Self::ExpiresIn(value)
    }
}

impl From<OffsetDateTime> for PostPolicyExpiration {
    fn from(value: OffsetDateTime) -> Self {
        Self::ExpiresAt(value)
    }
}
