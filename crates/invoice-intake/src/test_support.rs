//! PDF fixtures shared by unit and endpoint tests

use lopdf::dictionary;
use lopdf::{Dictionary, Document, Object, Stream};

/// Single-page PDF drawing `text` with a Helvetica text layer
pub fn make_test_pdf(text: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.4");
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let content = if text.is_empty() {
        Vec::new()
    } else {
        format!("BT /F1 12 Tf 100 700 Td ({text}) Tj ET").into_bytes()
    };
    let resources = dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    };
    single_page(doc, content, resources)
}

/// Single-page PDF whose content stream selects a font its resources never define.
///
/// pdf-extract panics on this; lopdf reads it without error.
pub fn missing_font_pdf() -> Vec<u8> {
    let content = b"BT /F9 12 Tf 100 700 Td (Invoice Total Due 1234.56 USD) Tj ET".to_vec();
    single_page(Document::with_version("1.4"), content, Dictionary::new())
}

fn single_page(mut doc: Document, content: Vec<u8>, resources: Dictionary) -> Vec<u8> {
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => content_id,
        "Resources" => resources,
    });
    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
    });
    if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(page_id) {
        dict.set("Parent", pages_id);
    }
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}
