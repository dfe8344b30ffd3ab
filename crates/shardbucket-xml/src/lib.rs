//! S3 XML wire codec for Shardbucket.
//!
//! The proxy speaks the S3 RestXml conventions on both sides: it decodes
//! each backend's `ListBucketResult` into a [`ListFragment`], and encodes
//! the merged result back into the document shape clients expect.
//!
//! # S3 XML conventions
//!
//! - Namespace: `http://s3.amazonaws.com/doc/2006-03-01/`
//! - Booleans: lowercase `true`/`false`
//! - Timestamps: ISO 8601 with milliseconds (`2006-02-03T16:45:09.000Z`)
//! - XML declaration: `<?xml version="1.0" encoding="UTF-8"?>`
//!
//! [`ListFragment`]: shardbucket_model::ListFragment

pub mod deserialize;
pub mod error;
pub mod serialize;

pub use deserialize::parse_list_fragment;
pub use error::{XmlError, error_to_xml};
pub use serialize::{S3_NAMESPACE, list_result_to_xml};
