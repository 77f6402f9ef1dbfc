//! Extraction of the stock value from a record's embedded XML payload.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::MarkupError;

const ROOT: &str = "AVAILABILITY";
const STOCK_VALUE: &str = "INSTOCKVALUE";

/// Returns the text of `<AVAILABILITY><INSTOCKVALUE>…</INSTOCKVALUE></AVAILABILITY>`.
///
/// `INSTOCKVALUE` must be a direct child of the root; siblings such as
/// `<CODE>` are ignored. Surrounding whitespace is trimmed and an empty
/// element yields an empty string. If the element appears twice, the first
/// one is used.
///
/// # Errors
///
/// - [`MarkupError::Xml`]: the payload is not well-formed XML.
/// - [`MarkupError::UnexpectedRoot`]: the document root is not `AVAILABILITY`.
/// - [`MarkupError::MissingElement`]: no root, or no `INSTOCKVALUE` under it.
/// - [`MarkupError::TrailingContent`]: elements or text follow the root.
pub fn extract_stock_value(xml: &str) -> Result<String, MarkupError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut depth = 0usize;
    let mut seen_root = false;
    let mut capturing = false;
    let mut value: Option<String> = None;

    loop {
        let event = reader.read_event()?;
        if seen_root
            && depth == 0
            && matches!(
                event,
                Event::Start(_) | Event::Empty(_) | Event::Text(_) | Event::CData(_)
            )
        {
            return Err(MarkupError::TrailingContent { root: ROOT });
        }
        match event {
            Event::Start(e) => {
                let name = e.name();
                if depth == 0 {
                    check_root(name.as_ref())?;
                    seen_root = true;
                } else if depth == 1 && value.is_none() && name.as_ref() == STOCK_VALUE.as_bytes()
                {
                    capturing = true;
                    value = Some(String::new());
                }
                depth += 1;
            }
            Event::Empty(e) => {
                let name = e.name();
                if depth == 0 {
                    check_root(name.as_ref())?;
                    seen_root = true;
                } else if depth == 1 && value.is_none() && name.as_ref() == STOCK_VALUE.as_bytes()
                {
                    value = Some(String::new());
                }
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if depth == 1 {
                    capturing = false;
                }
            }
            Event::Text(e) => {
                if capturing && depth == 2 {
                    if let Some(v) = value.as_mut() {
                        v.push_str(&e.unescape()?);
                    }
                }
            }
            Event::CData(e) => {
                if capturing && depth == 2 {
                    if let Some(v) = value.as_mut() {
                        v.push_str(&String::from_utf8_lossy(e.as_ref()));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(MarkupError::MissingElement { element: ROOT });
    }
    if depth != 0 {
        return Err(MarkupError::MissingElement { element: ROOT });
    }
    value.ok_or(MarkupError::MissingElement {
        element: STOCK_VALUE,
    })
}

fn check_root(name: &[u8]) -> Result<(), MarkupError> {
    if name == ROOT.as_bytes() {
        Ok(())
    } else {
        Err(MarkupError::UnexpectedRoot {
            found: String::from_utf8_lossy(name).into_owned(),
            expected: ROOT,
        })
    }
}
