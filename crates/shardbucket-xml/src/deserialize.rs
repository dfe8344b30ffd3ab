//! Decoding a backend's `ListBucketResult` into a [`ListFragment`].
//!
//! The proxy only needs the object entries and common prefixes out of each
//! backend response; pagination fields inside a fragment (the backend's own
//! truncation flag and token) are intentionally ignored because the
//! orchestrator paginates across the merged set itself.

use chrono::{DateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::Event;
use shardbucket_model::{CommonPrefix, ListFragment, ObjectEntry, Owner};

use crate::error::XmlError;

/// Parse one backend's `ListBucketResult` XML document.
///
/// # Errors
///
/// Returns [`XmlError`] if the document is malformed or a `<Contents>` entry
/// carries no `<Key>`.
pub fn parse_list_fragment(xml: &[u8]) -> Result<ListFragment, XmlError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    // Find the root element, skipping the declaration.
    loop {
        match reader.read_event()? {
            Event::Start(_) => break,
            Event::Eof => return Err(XmlError::MissingElement("ListBucketResult".to_owned())),
            _ => {}
        }
    }

    let mut fragment = ListFragment::default();

    loop {
        match reader.read_event()? {
            Event::Start(start) => match start.name().as_ref() {
                b"Contents" => fragment.contents.push(read_object_entry(&mut reader)?),
                b"CommonPrefixes" => {
                    if let Some(prefix) = read_common_prefix(&mut reader)? {
                        fragment.common_prefixes.push(prefix);
                    }
                }
                _ => skip_element(&mut reader)?,
            },
            Event::End(_) => return Ok(fragment),
            Event::Eof => return Err(XmlError::UnexpectedEof),
            _ => {}
        }
    }
}

fn read_object_entry(reader: &mut Reader<&[u8]>) -> Result<ObjectEntry, XmlError> {
    let mut key = None;
    let mut entry = ObjectEntry::default();

    loop {
        match reader.read_event()? {
            Event::Start(start) => match start.name().as_ref() {
                b"Key" => key = Some(read_text(reader)?),
                b"LastModified" => entry.last_modified = Some(parse_timestamp(&read_text(reader)?)?),
                b"ETag" => entry.e_tag = Some(read_text(reader)?),
                b"Size" => entry.size = Some(parse_i64(&read_text(reader)?)?),
                b"StorageClass" => entry.storage_class = Some(read_text(reader)?),
                b"Owner" => entry.owner = Some(read_owner(reader)?),
                _ => skip_element(reader)?,
            },
            Event::End(_) => {
                entry.key = key.ok_or_else(|| XmlError::MissingElement("Key".to_owned()))?;
                return Ok(entry);
            }
            Event::Eof => return Err(XmlError::UnexpectedEof),
            _ => {}
        }
    }
}

fn read_owner(reader: &mut Reader<&[u8]>) -> Result<Owner, XmlError> {
    let mut owner = Owner::default();
    loop {
        match reader.read_event()? {
            Event::Start(start) => match start.name().as_ref() {
                b"ID" => owner.id = Some(read_text(reader)?),
                b"DisplayName" => owner.display_name = Some(read_text(reader)?),
                _ => skip_element(reader)?,
            },
            Event::End(_) => return Ok(owner),
            Event::Eof => return Err(XmlError::UnexpectedEof),
            _ => {}
        }
    }
}

fn read_common_prefix(reader: &mut Reader<&[u8]>) -> Result<Option<CommonPrefix>, XmlError> {
    let mut prefix = None;
    loop {
        match reader.read_event()? {
            Event::Start(start) => match start.name().as_ref() {
                b"Prefix" => prefix = Some(read_text(reader)?),
                _ => skip_element(reader)?,
            },
            Event::End(_) => return Ok(prefix.map(CommonPrefix::new)),
            Event::Eof => return Err(XmlError::UnexpectedEof),
            _ => {}
        }
    }
}

/// Read the text content of the current element and consume its end tag.
fn read_text(reader: &mut Reader<&[u8]>) -> Result<String, XmlError> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(e) => {
                let decoded = e
                    .decode()
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                let unescaped = quick_xml::escape::unescape(&decoded)
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                text.push_str(&unescaped);
            }
            Event::End(_) => return Ok(text),
            Event::Eof => return Err(XmlError::UnexpectedEof),
            _ => {}
        }
    }
}

/// Skip the current element and all of its children.
fn skip_element(reader: &mut Reader<&[u8]>) -> Result<(), XmlError> {
    let mut depth: u32 = 1;
    loop {
        match reader.read_event()? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Event::Eof => return Err(XmlError::UnexpectedEof),
            _ => {}
        }
    }
}

fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, XmlError> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| XmlError::ParseError(format!("invalid timestamp {text:?}: {e}")))
}

fn parse_i64(text: &str) -> Result<i64, XmlError> {
    text.parse()
        .map_err(|_| XmlError::ParseError(format!("invalid integer: {text:?}")))
}
