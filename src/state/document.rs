//! Session document
//!
//! ```xml
//! <?xml version="1.0"?>
//! <Session>
//! 	<version>0.1</version>
//! 	<width>800</width>
//! 	<height>600</height>
//! 	<state>1</state>
//! </Session>
//! ```

use std::fs;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{xml_error, KilnError, Result};

use super::{WindowGeometry, SESSION_VERSION};

const ROOT: &str = "Session";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Version,
    Width,
    Height,
    State,
}

impl Field {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"version" => Some(Field::Version),
            b"width" => Some(Field::Width),
            b"height" => Some(Field::Height),
            b"state" => Some(Field::State),
            _ => None,
        }
    }
}

/// Raw values of a session document, as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionDocument {
    pub version: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub state: Option<String>,
}

impl SessionDocument {
    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Version => &mut self.version,
            Field::Width => &mut self.width,
            Field::Height => &mut self.height,
            Field::State => &mut self.state,
        }
    }

    /// Parse a document. `None` when it is malformed, its root is not
    /// `Session`, or a child element is unknown, repeated or nested.
    pub fn parse(text: &str) -> Option<Self> {
        let mut reader = Reader::from_str(text);
        reader.trim_text(true);

        let mut doc = SessionDocument::default();
        let mut seen_root = false;
        let mut depth = 0usize;
        let mut current: Option<Field> = None;

        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(e) => {
                    tracing::debug!(error = %e, "malformed session document");
                    return None;
                }
            };

            match event {
                Event::Start(e) if depth == 0 => {
                    if seen_root || e.name().as_ref() != ROOT.as_bytes() {
                        return None;
                    }
                    seen_root = true;
                    depth = 1;
                }
                Event::Empty(e) if depth == 0 => {
                    if seen_root || e.name().as_ref() != ROOT.as_bytes() {
                        return None;
                    }
                    seen_root = true;
                }
                Event::Start(e) if depth == 1 => {
                    let field = Field::from_name(e.name().as_ref())?;
                    let slot = doc.slot(field);
                    if slot.is_some() {
                        return None;
                    }
                    *slot = Some(String::new());
                    current = Some(field);
                    depth = 2;
                }
                Event::Empty(e) if depth == 1 => {
                    let field = Field::from_name(e.name().as_ref())?;
                    let slot = doc.slot(field);
                    if slot.is_some() {
                        return None;
                    }
                    *slot = Some(String::new());
                }
                Event::Start(_) | Event::Empty(_) => return None,
                Event::Text(t) if depth == 2 => {
                    let value = t.unescape().ok()?;
                    if let Some(slot) = current.map(|f| doc.slot(f)) {
                        slot.get_or_insert_with(String::new).push_str(&value);
                    }
                }
                Event::CData(t) if depth == 2 => {
                    let value = String::from_utf8(t.into_inner().into_owned()).ok()?;
                    if let Some(slot) = current.map(|f| doc.slot(f)) {
                        slot.get_or_insert_with(String::new).push_str(&value);
                    }
                }
                // text between the children is ignored
                Event::Text(_) | Event::CData(_) if depth == 1 => {}
                Event::Text(_) | Event::CData(_) => return None,
                Event::End(_) => {
                    depth = depth.saturating_sub(1);
                    current = None;
                }
                Event::Eof if depth == 0 => break,
                Event::Eof => return None,
                Event::Decl(_) | Event::PI(_) | Event::Comment(_) | Event::DocType(_) => {}
            }
        }

        seen_root.then_some(doc)
    }

    /// Read and parse the document at `path`; `None` when absent or invalid.
    pub fn read(path: &Path) -> Option<Self> {
        let text = fs::read_to_string(path).ok()?;
        Self::parse(&text)
    }

    /// Geometry stored in the document, or `fallback` when the version does
    /// not match. Unparsable numbers keep the fallback value.
    pub fn geometry(&self, fallback: WindowGeometry) -> WindowGeometry {
        if self.version.as_deref().map(str::trim) != Some(SESSION_VERSION) {
            tracing::debug!(version = ?self.version, "session version mismatch");
            return fallback;
        }
        WindowGeometry {
            width: number(self.width.as_deref()).unwrap_or(fallback.width),
            height: number(self.height.as_deref()).unwrap_or(fallback.height),
            maximized: number(self.state.as_deref())
                .map(|state| state != 0)
                .unwrap_or(fallback.maximized),
        }
    }

    /// Serialize `geometry` as a session document.
    pub fn render(geometry: &WindowGeometry) -> Result<Vec<u8>> {
        let mut writer = Writer::new_with_indent(Vec::new(), b'\t', 1);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", None, None)))
            .map_err(xml_error)?;
        writer
            .write_event(Event::Start(BytesStart::new(ROOT)))
            .map_err(xml_error)?;

        let maximized = if geometry.maximized { "1" } else { "0" };
        let children = [
            ("version", SESSION_VERSION.to_string()),
            ("width", geometry.width.to_string()),
            ("height", geometry.height.to_string()),
            ("state", maximized.to_string()),
        ];
        for (name, value) in &children {
            writer
                .write_event(Event::Start(BytesStart::new(*name)))
                .map_err(xml_error)?;
            writer
                .write_event(Event::Text(BytesText::new(value)))
                .map_err(xml_error)?;
            writer
                .write_event(Event::End(BytesEnd::new(*name)))
                .map_err(xml_error)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new(ROOT)))
            .map_err(xml_error)?;

        let mut bytes = writer.into_inner();
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Write `geometry` to `path`, removing the partial file on failure.
    pub fn write(path: &Path, geometry: &WindowGeometry) -> Result<()> {
        let bytes = Self::render(geometry)?;
        fs::write(path, bytes).map_err(|e| {
            let _ = fs::remove_file(path);
            KilnError::FileWriteError {
                path: path.to_path_buf(),
                source: e,
            }
        })
    }
}

/// Integer part of the decimal number a value starts with, so `800px`
/// reads as 800. `None` when the value does not start with a number.
fn number(value: Option<&str>) -> Option<i32> {
    let text = value?.trim_start();
    let bytes = text.as_bytes();
    let digits = |from: usize| {
        bytes[from..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let whole = digits(end);
    end += whole;
    let mut fraction = 0;
    if bytes.get(end) == Some(&b'.') {
        fraction = digits(end + 1);
        if whole + fraction > 0 {
            end += 1 + fraction;
        }
    }
    if whole + fraction == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exponent = digits(end + 1 + sign);
        if exponent > 0 {
            end += 1 + sign + exponent;
        }
    }

    let value = text[..end].parse::<f64>().ok()?;
    value.is_finite().then(|| value as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FALLBACK: WindowGeometry = WindowGeometry {
        width: 850,
        height: 680,
        maximized: false,
    };

    fn doc(body: &str) -> String {
        format!("<?xml version=\"1.0\"?>\n<Session>\n{body}</Session>\n")
    }

    #[test]
    fn test_parse_current_document() {
        let text = doc("\t<version>0.1</version>\n\t<width>800</width>\n\t<height>600</height>\n\t<state>1</state>\n");
        let parsed = SessionDocument::parse(&text).unwrap();
        assert_eq!(
            parsed.geometry(FALLBACK),
            WindowGeometry {
                width: 800,
                height: 600,
                maximized: true
            }
        );
    }

    #[test]
    fn test_version_mismatch_uses_fallback() {
        let text = doc("<version>0.2</version><width>800</width><height>600</height><state>1</state>");
        let parsed = SessionDocument::parse(&text).unwrap();
        assert_eq!(parsed.geometry(FALLBACK), FALLBACK);

        let parsed = SessionDocument::parse(&doc("<width>800</width>")).unwrap();
        assert_eq!(parsed.geometry(FALLBACK), FALLBACK);
    }

    #[test]
    fn test_rejected_documents() {
        assert_eq!(SessionDocument::parse("<Other><version>0.1</version></Other>"), None);
        assert_eq!(
            SessionDocument::parse(&doc("<version>0.1</version><version>0.1</version>")),
            None
        );
        assert_eq!(
            SessionDocument::parse(&doc("<version>0.1</version><colour>red</colour>")),
            None
        );
        assert_eq!(
            SessionDocument::parse(&doc("<version><b>0.1</b></version>")),
            None
        );
        assert_eq!(SessionDocument::parse("<Session><version>0.1</version>"), None);
        assert_eq!(SessionDocument::parse(""), None);
    }

    #[test]
    fn test_partial_values() {
        let parsed = SessionDocument::parse(&doc("<version>0.1</version><width>1024.7</width><height>big</height>")).unwrap();
        assert_eq!(
            parsed.geometry(FALLBACK),
            WindowGeometry {
                width: 1024,
                height: 680,
                maximized: false
            }
        );
    }

    #[test]
    fn test_numbers_read_leading_prefix() {
        assert_eq!(number(Some("800")), Some(800));
        assert_eq!(number(Some(" 800px")), Some(800));
        assert_eq!(number(Some("1024.7")), Some(1024));
        assert_eq!(number(Some("-3.5e1x")), Some(-35));
        assert_eq!(number(Some("1e")), Some(1));
        assert_eq!(number(Some(".5")), Some(0));
        assert_eq!(number(Some("big")), None);
        assert_eq!(number(Some("-")), None);
        assert_eq!(number(Some(".")), None);
        assert_eq!(number(None), None);

        let parsed = SessionDocument::parse(&doc(
            "<version>0.1</version><width>800px</width><height>600</height><state>1</state>",
        ))
        .unwrap();
        assert_eq!(
            parsed.geometry(FALLBACK),
            WindowGeometry {
                width: 800,
                height: 600,
                maximized: true
            }
        );
    }

    #[test]
    fn test_render_layout() {
        let geometry = WindowGeometry {
            width: 800,
            height: 600,
            maximized: true,
        };
        let text = String::from_utf8(SessionDocument::render(&geometry).unwrap()).unwrap();
        assert_eq!(
            text,
            "<?xml version=\"1.0\"?>\n<Session>\n\t<version>0.1</version>\n\t<width>800</width>\n\t<height>600</height>\n\t<state>1</state>\n</Session>\n"
        );
        assert_eq!(
            SessionDocument::parse(&text).unwrap().geometry(FALLBACK),
            geometry
        );
    }
}
