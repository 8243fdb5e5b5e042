//! AndroidManifest.xml editing.
//!
//! The manifest is streamed event by event and written back unchanged except
//! for the `<application>` start tag, so comments, whitespace and every other
//! element survive the edit.

use apkrebuild_common::{Error, Result};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::borrow::Cow;
use std::fs;
use std::path::Path;
use tracing::debug;

pub const APPLICATION_ELEMENT: &str = "application";

/// Attributes set on `<application>` to allow traffic inspection.
pub const TRAFFIC_INSPECTION_ATTRIBUTES: [(&str, &str); 3] = [
    (
        "android:networkSecurityConfig",
        "@xml/network_security_config",
    ),
    ("android:extractNativeLibs", "true"),
    ("android:usesCleartextTraffic", "true"),
];

/// Set the traffic inspection attributes on the manifest at `path`, in place.
///
/// Fails without touching the file unless the document has exactly one
/// `<application>` element.
pub fn patch_manifest(path: &Path) -> Result<()> {
    let original = fs::read_to_string(path)?;
    let patched = set_element_attributes(
        &original,
        path,
        APPLICATION_ELEMENT,
        &TRAFFIC_INSPECTION_ATTRIBUTES,
    )?;
    fs::write(path, patched)?;
    debug!("Patched <{}> in {:?}", APPLICATION_ELEMENT, path);
    Ok(())
}

/// Rewrite `xml` with `attributes` set on its single `element`.
///
/// Existing attributes with the same name are replaced where they stand;
/// missing ones are appended. `path` is only used in error messages.
pub fn set_element_attributes(
    xml: &str,
    path: &Path,
    element: &str,
    attributes: &[(&str, &str)],
) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len() + 256));
    let mut seen = 0usize;

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(start) if start.name().as_ref() == element.as_bytes() => {
                seen += 1;
                writer.write_event(Event::Start(with_attributes(start, attributes)?))?;
            }
            Event::Empty(start) if start.name().as_ref() == element.as_bytes() => {
                seen += 1;
                writer.write_event(Event::Empty(with_attributes(start, attributes)?))?;
            }
            event => writer.write_event(event)?,
        }
    }

    match seen {
        0 => Err(Error::ElementNotFound {
            element: element.to_string(),
            path: path.to_path_buf(),
        }),
        1 => Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned()),
        count => Err(Error::DuplicateElement {
            element: element.to_string(),
            path: path.to_path_buf(),
            count,
        }),
    }
}

fn with_attributes(
    start: BytesStart<'_>,
    attributes: &[(&str, &str)],
) -> Result<BytesStart<'static>> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut patched = BytesStart::new(name);
    let mut pending: Vec<(&str, &str)> = attributes.to_vec();

    for attr in start.attributes() {
        let attr = attr?;
        let key = attr.key.as_ref();
        match pending.iter().position(|(name, _)| name.as_bytes() == key) {
            Some(index) => {
                let replacement = pending.remove(index);
                patched.push_attribute(replacement);
            }
            None => {
                let value = double_quote_safe(&attr.value);
                patched.push_attribute(Attribute::from((key, &*value)));
            }
        }
    }

    for replacement in pending {
        patched.push_attribute(replacement);
    }

    Ok(patched)
}

/// Values are written back raw inside double quotes; a `"` that was legal
/// in a single-quoted value has to become an entity.
fn double_quote_safe(value: &[u8]) -> Cow<'_, [u8]> {
    if !value.contains(&b'"') {
        return Cow::Borrowed(value);
    }

    let mut escaped = Vec::with_capacity(value.len() + 8);
    for &byte in value {
        if byte == b'"' {
            escaped.extend_from_slice(b"&quot;");
        } else {
            escaped.push(byte);
        }
    }
    Cow::Owned(escaped)
}
