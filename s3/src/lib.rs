//! Pre-signed credentials for browser based, direct to S3 `POST` uploads.
//!
//! A backend builds an [`UploadSpec`] describing a single file, hands it to a
//! [`PostSigner`] and forwards the resulting [`PresignedPost`] to a web or
//! mobile client. The client posts a multipart form to `url` with every entry
//! of `credentials` as a form field, followed by the file itself.
//!
//! ```
//! use s3post::creds::Credentials;
//! use s3post::{FixedClock, PostSigner, UploadSpec};
//! use time::macros::datetime;
//!
//! let credentials = Credentials::new(Some("123abc"), Some("abc123"), None, None, None)
//!     .unwrap()
//!     .with_region("us-east-1");
//! let signer = PostSigner::new(credentials)
//!     .with_clock(FixedClock::new(datetime!(2017-01-01 0:00 UTC)));
//!
//! let spec = UploadSpec::new("file.jpg", "image/jpeg", "path/in/bucket", "s3-bucket");
//! let post = signer.build_envelope(&spec).unwrap();
//!
//! assert_eq!(post.url, "https://s3-bucket.s3.us-east-1.amazonaws.com");
//! assert_eq!(post.credentials.key, "path/in/bucket/file.jpg");
//! ```
#![forbid(unsafe_code)]

#[macro_use]
extern crate serde_derive;

pub use awscreds as creds;

pub use error::{PostError, PostPolicyError};
pub use post_policy::{
    PostPolicy, PostPolicyCondition, PostPolicyExpiration, PostPolicyField, PostPolicyValue,
};
pub use presigned_post::{PostCredentials, PostSigner, PresignedPost};
pub use upload_spec::UploadSpec;
pub use utils::{AmzDateFormatter, Clock, DateFormatter, FixedClock, SystemClock};

pub mod error;
pub mod post_policy;
pub mod presigned_post;
pub mod signing;
pub mod upload_spec;
pub mod utils;

const LONG_DATETIME: &[time::format_description::FormatItem<'static>] =
    time::macros::format_description!("[year][month][day]T[hour][minute][second]Z");
const SHORT_DATE: &[time::format_description::FormatItem<'static>] =
    time::macros::format_description!("[year][month][day]");
const ISO8601_DATETIME: &[time::format_description::FormatItem<'static>] =
    time::macros::format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");

/// Value of the `x-amz-algorithm` form field and policy condition.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
/// Canned ACL applied when an [`UploadSpec`] does not set one.
pub const DEFAULT_ACL: &str = "public-read";
/// Region used when the resolved credentials carry none.
pub const DEFAULT_REGION: &str = "us-east-1";
/// Lifetime of a policy when an [`UploadSpec`] does not set an expiration.
pub const DEFAULT_EXPIRATION_SECS: u32 = 3600;

const SERVICE: &str = "s3";
