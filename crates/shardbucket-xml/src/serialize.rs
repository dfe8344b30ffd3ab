//! Encoding the merged `ListBucketResult` into S3 XML.

use std::io::{self, Write};

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesText, Event};
use shardbucket_model::{CommonPrefix, ListBucketResult, ObjectEntry, Owner};

use crate::error::XmlError;

/// The S3 document namespace.
pub const S3_NAMESPACE: &str = "http://s3.amazonaws.com/doc/2006-03-01/";

/// Serialize a merged list result as a complete `ListBucketResult` document
/// with XML declaration and namespace.
///
/// # Errors
///
/// Returns [`XmlError`] if writing fails.
pub fn list_result_to_xml(result: &ListBucketResult) -> Result<Vec<u8>, XmlError> {
    let mut buf = Vec::with_capacity(1024);
    let mut writer = Writer::new(&mut buf);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer
        .create_element("ListBucketResult")
        .with_attribute(("xmlns", S3_NAMESPACE))
        .write_inner_content(|w| write_list_result(w, result))?;

    Ok(buf)
}

fn write_list_result<W: Write>(w: &mut Writer<W>, result: &ListBucketResult) -> io::Result<()> {
    text_element(w, "Name", &result.name)?;
    optional_text(w, "Prefix", result.prefix.as_deref())?;
    text_element(w, "KeyCount", &result.key_count.to_string())?;
    text_element(w, "MaxKeys", &result.max_keys.to_string())?;
    optional_text(w, "Delimiter", result.delimiter.as_deref())?;
    text_element(w, "IsTruncated", bool_text(result.is_truncated))?;
    optional_text(
        w,
        "ContinuationToken",
        result.continuation_token.as_deref(),
    )?;
    optional_text(
        w,
        "NextContinuationToken",
        result.next_continuation_token.as_deref(),
    )?;
    optional_text(w, "StartAfter", result.start_after.as_deref())?;
    for entry in &result.contents {
        write_object_entry(w, entry)?;
    }
    for prefix in &result.common_prefixes {
        write_common_prefix(w, prefix)?;
    }
    Ok(())
}

fn write_object_entry<W: Write>(w: &mut Writer<W>, entry: &ObjectEntry) -> io::Result<()> {
    w.create_element("Contents").write_inner_content(|w| {
        text_element(w, "Key", &entry.key)?;
        if let Some(ref ts) = entry.last_modified {
            text_element(
                w,
                "LastModified",
                &ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            )?;
        }
        optional_text(w, "ETag", entry.e_tag.as_deref())?;
        if let Some(size) = entry.size {
            text_element(w, "Size", &size.to_string())?;
        }
        optional_text(w, "StorageClass", entry.storage_class.as_deref())?;
        if let Some(ref owner) = entry.owner {
            write_owner(w, owner)?;
        }
        Ok(())
    })?;
    Ok(())
}

fn write_owner<W: Write>(w: &mut Writer<W>, owner: &Owner) -> io::Result<()> {
    w.create_element("Owner").write_inner_content(|w| {
        optional_text(w, "ID", owner.id.as_deref())?;
        optional_text(w, "DisplayName", owner.display_name.as_deref())?;
        Ok(())
    })?;
    Ok(())
}

fn write_common_prefix<W: Write>(w: &mut Writer<W>, cp: &CommonPrefix) -> io::Result<()> {
    w.create_element("CommonPrefixes").write_inner_content(|w| {
        text_element(w, "Prefix", &cp.prefix)?;
        Ok(())
    })?;
    Ok(())
}

fn text_element<W: Write>(w: &mut Writer<W>, tag: &str, text: &str) -> io::Result<()> {
    w.create_element(tag)
        .write_text_content(BytesText::new(text))?;
    Ok(())
}

fn optional_text<W: Write>(w: &mut Writer<W>, tag: &str, value: Option<&str>) -> io::Result<()> {
    if let Some(v) = value {
        text_element(w, tag, v)?;
    }
    Ok(())
}

fn bool_text(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}
