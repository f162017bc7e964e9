use std::borrow::Cow;

use serde_json::Value;

use crate::error::PostError;
use crate::post_policy::{
    PostPolicyCondition, PostPolicyExpiration, PostPolicyField, PostPolicyValue,
};
use crate::DEFAULT_ACL;

/// What a single upload is allowed to be: one file, one bucket, one key.
///
/// Built once and read by the signer, the `with_*` methods consume the spec and
/// return the extended one.
///
/// # Example
///
/// ```
/// use s3post::{PostPolicyField, PostPolicyValue, UploadSpec};
/// use serde_json::json;
///
/// let spec = UploadSpec::new("avatar.png", "image/png", "users/42", "uploads")
///     .with_acl("private")
///     .with_expiration(600)
///     .with_condition(PostPolicyField::ContentLengthRange, PostPolicyValue::Range(1, 1_048_576))
///     .unwrap()
///     .with_raw_condition(&json!({"success_action_status": "201"}))
///     .unwrap();
///
/// assert_eq!(spec.key(), "users/42/avatar.png");
/// assert_eq!(spec.additional_conditions().len(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct UploadSpec<'a> {
    filename: Cow<'a, str>,
    mimetype: Cow<'a, str>,
    path: Cow<'a, str>,
    bucket: Cow<'a, str>,
    acl: Cow<'a, str>,
    expiration: PostPolicyExpiration,
    additional_conditions: Vec<PostPolicyCondition<'a>>,
}

impl<'a> UploadSpec<'a> {
    pub fn new<F, M, P, B>(filename: F, mimetype: M, path: P, bucket: B) -> Self
    where
        F: Into<Cow<'a, str>>,
        M: Into<Cow<'a, str>>,
        P: Into<Cow<'a, str>>,
        B: Into<Cow<'a, str>>,
    {
        Self {
            filename: filename.into(),
            mimetype: mimetype.into(),
            path: path.into(),
            bucket: bucket.into(),
            acl: Cow::from(DEFAULT_ACL),
            expiration: PostPolicyExpiration::default(),
            additional_conditions: Vec::new(),
        }
    }

    pub fn with_acl<T: Into<Cow<'a, str>>>(mut self, acl: T) -> Self {
        self.acl = acl.into();
        self
    }

    /// Seconds from signing (`u32`) or an absolute instant (`OffsetDateTime`).
    pub fn with_expiration<T: Into<PostPolicyExpiration>>(mut self, expiration: T) -> Self {
        self.expiration = expiration.into();
        self
    }

    pub fn with_condition(
        mut self,
        field: PostPolicyField<'a>,
        value: PostPolicyValue<'a>,
    ) -> Result<Self, PostError> {
        self.additional_conditions
            .push(PostPolicyCondition::new(field, value)?);
        Ok(self)
    }

    /// Appends a condition given in S3's JSON form, see
    /// [`PostPolicyCondition::try_from`].
    pub fn with_raw_condition(mut self, condition: &Value) -> Result<Self, PostError> {
        self.additional_conditions
            .push(PostPolicyCondition::try_from(condition)?);
        Ok(self)
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn mimetype(&self) -> &str {
        &self.mimetype
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn acl(&self) -> &str {
        &self.acl
    }

    pub fn expiration(&self) -> PostPolicyExpiration {
        self.expiration
    }

    pub fn additional_conditions(&self) -> &[PostPolicyCondition<'a>] {
        &self.additional_conditions
    }

    /// Object key of the upload, `path` and `filename` joined by a single
    /// slash. An empty path still yields a leading slash.
    pub fn key(&self) -> String {
        format!("{}/{}", self.path, self.filename)
    }

    pub(crate) fn validate(&self) -> Result<(), PostError> {
        if self.bucket.is_empty() {
            return Err(PostError::InvalidSpec("bucket must not be empty".to_string()));
        }
        if self.filename.is_empty() {
            return Err(PostError::InvalidSpec("filename must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::PostPolicyError;
    use serde_json::json;
    use time::macros::datetime;

    fn spec() -> UploadSpec<'static> {
        UploadSpec::new("file.jpg", "image/jpeg", "path/in/bucket", "s3-bucket")
    }

    #[test]
    fn defaults() {
        let spec = spec();

        assert_eq!(spec.acl(), "public-read");
        assert_eq!(spec.expiration(), PostPolicyExpiration::ExpiresIn(3600));
        assert!(spec.additional_conditions().is_empty());
        assert_eq!(spec.key(), "path/in/bucket/file.jpg");
    }

    #[test]
    fn key_with_empty_path_keeps_slash() {
        let spec = UploadSpec::new("file.jpg", "image/jpeg", "", "s3-bucket");

        assert_eq!(spec.key(), "/file.jpg");
    }

    #[test]
    fn builders_replace_values() {
        let at = datetime!(2017-02-01 0:00 UTC);
        let spec = spec()
            .with_acl(String::from("private"))
            .with_expiration(at);

        assert_eq!(spec.acl(), "private");
        assert_eq!(spec.expiration(), PostPolicyExpiration::ExpiresAt(at));
    }

    #[test]
    fn conditions_keep_order() {
        let spec = spec()
            .with_raw_condition(&json!(["starts-with", "$x-amz-meta-tag", ""]))
            .unwrap()
            .with_condition(
                PostPolicyField::ContentLengthRange,
                PostPolicyValue::Range(0, 1024),
            )
            .unwrap()
            .with_raw_condition(&json!({"success_action_status": "201"}))
            .unwrap();

        assert_eq!(
            serde_json::to_value(spec.additional_conditions()).unwrap(),
            json!([
                ["starts-with", "$x-amz-meta-tag", ""],
                ["content-length-range", 0, 1024],
                {"success_action_status": "201"}
            ])
        );
    }

    #[test]
    fn invalid_conditions_are_rejected() {
        let result = spec().with_raw_condition(&json!(["starts-with", "$key"]));
        assert!(matches!(
            result,
            Err(PostError::PostPolicy(PostPolicyError::MalformedCondition(_)))
        ));

        let result = spec().with_condition(PostPolicyField::Key, PostPolicyValue::Range(0, 1));
        assert!(matches!(
            result,
            Err(PostError::PostPolicy(PostPolicyError::MismatchedCondition))
        ));
    }

    #[test]
    fn validate_requires_bucket_and_filename() {
        assert!(spec().validate().is_ok());
        assert!(UploadSpec::new("file.jpg", "", "", "s3-bucket").validate().is_ok());

        assert!(matches!(
            UploadSpec::new("file.jpg", "image/jpeg", "path", "").validate(),
            Err(PostError::InvalidSpec(_))
        ));
        assert!(matches!(
            UploadSpec::new("", "image/jpeg", "path", "s3-bucket").validate(),
            Err(PostError::InvalidSpec(_))
        ));
    }
}
