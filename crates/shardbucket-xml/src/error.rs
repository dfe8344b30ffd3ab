//! XML error types and S3 error-document formatting.

use std::io;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesText, Event};

/// Errors that can occur during XML encoding or decoding.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// An I/O error during XML writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An error from the underlying quick-xml library.
    #[error("XML processing error: {0}")]
    QuickXml(#[from] quick_xml::Error),

    /// A required XML element was missing.
    #[error("missing required XML element: {0}")]
    MissingElement(String),

    /// The document ended unexpectedly.
    #[error("unexpected end of XML document")]
    UnexpectedEof,

    /// An error parsing a value from XML text content.
    #[error("failed to parse value: {0}")]
    ParseError(String),
}

/// Format an S3-style `<Error>` document.
///
/// S3 uses flat error documents without an outer wrapper:
///
/// ```xml
/// <?xml version="1.0" encoding="UTF-8"?>
/// <Error>
///   <Code>NotImplemented</Code>
///   <Message>ListObjects v1 is not supported</Message>
///   <RequestId>tx00000...</RequestId>
/// </Error>
/// ```
#[must_use]
pub fn error_to_xml(code: &str, message: &str, request_id: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256);
    // Writing into a Vec cannot fail; a failure here is a logic error.
    if let Err(e) = write_error_document(&mut buf, code, message, request_id) {
        tracing::error!(error = %e, "failed to serialize error XML");
        buf.clear();
    }
    buf
}

fn write_error_document(
    buf: &mut Vec<u8>,
    code: &str,
    message: &str,
    request_id: &str,
) -> io::Result<()> {
    let mut writer = Writer::new(buf);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.create_element("Error").write_inner_content(|w| {
        w.create_element("Code")
            .write_text_content(BytesText::new(code))?;
        w.create_element("Message")
            .write_text_content(BytesText::new(message))?;
        w.create_element("RequestId")
            .write_text_content(BytesText::new(request_id))?;
        Ok(())
    })?;
    Ok(())
}
