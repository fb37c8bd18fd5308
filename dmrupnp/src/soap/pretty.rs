//! Mise en forme des réponses SOAP pour l'affichage

use xmltree::{Element, EmitterConfig};

/// Re-indente un document XML.
///
/// Returns `None` when `xml` is not a well-formed document, so callers can
/// fall back to showing the raw text.
pub fn pretty_print(xml: &str) -> Option<String> {
    let root = Element::parse(xml.trim().as_bytes()).ok()?;

    let mut buf = Vec::new();
    let config = EmitterConfig::new()
        .write_document_declaration(true)
        .perform_indent(true)
        .indent_string("  ");
    root.write_with_config(&mut buf, config).ok()?;

    String::from_utf8(buf).ok()
}
