use crate::{
    font::Font,
    image::Image,
    info::Info,
    page::Page,
    refs::{ObjectReferences, RefType},
    LetterError,
};
use id_arena::{Arena, Id};
use pdf_writer::{Pdf, Ref};
use std::io::Write;

#[derive(Default)]
/// A document is the main object that stores all the contents of the PDF
/// then renders it out with a call to [Document::write]
pub struct Document {
    pub info: Option<Info>,
    pub pages: Arena<Page>,
    pub page_order: Vec<Id<Page>>,
    pub fonts: Arena<Font>,
    pub images: Arena<Image>,
}

impl Document {
    /// Sets information about the document. If not provided, no information block will be
    /// written to the PDF
    pub fn set_info(&mut self, info: Info) {
        self.info = Some(info);
    }

    /// Add a page to the end of the document, returning its id
    pub fn add_page(&mut self, page: Page) -> Id<Page> {
        let id = self.pages.alloc(page);
        self.page_order.push(id);
        id
    }

    /// Add a font to the document. Fonts are stored "globally" within the document, so any
    /// page can use the font by referring to the returned id.
    pub fn add_font(&mut self, font: Font) -> Id<Font> {
        self.fonts.alloc(font)
    }

    /// Add an image to the document. Like fonts, images can be placed on any page (any
    /// number of times) by referring to the returned id.
    pub fn add_image(&mut self, image: Image) -> Id<Image> {
        self.images.alloc(image)
    }

    /// The page at `page_index` in document order
    pub fn page(&self, page_index: usize) -> Option<&Page> {
        self.page_order
            .get(page_index)
            .and_then(|id| self.pages.get(*id))
    }

    /// Write the entire document to the writer. The whole document is rendered in memory
    /// first, then written out in one go.
    pub fn write<W: Write>(self, mut w: W) -> Result<(), LetterError> {
        let bytes = self.finish()?;
        w.write_all(bytes.as_slice())?;
        w.flush().map_err(Into::into)
    }

    /// Render the document to the bytes of a complete PDF file
    pub fn finish(self) -> Result<Vec<u8>, LetterError> {
        let Document {
            info,
            pages,
            page_order,
            fonts,
            images,
        } = self;

        let mut refs = ObjectReferences::new();

        let catalog_id = refs.gen(RefType::Catalog);
        let page_tree_id = refs.gen(RefType::PageTree);

        let mut writer = Pdf::new();
        if let Some(info) = info {
            info.write(&mut refs, &mut writer);
        }

        let page_refs: Vec<Ref> = (0..page_order.len())
            .map(|i| refs.gen(RefType::Page(i)))
            .collect();

        writer
            .pages(page_tree_id)
            .count(page_refs.len() as i32)
            .kids(page_refs);

        for (id, font) in fonts.iter() {
            font.write(&mut refs, id, &mut writer);
        }

        for (id, image) in images.iter() {
            image.write(&mut refs, id, &mut writer)?;
        }

        for (page_index, id) in page_order.iter().enumerate() {
            let page = pages.get(*id).ok_or(LetterError::PageMissing)?;
            page.write(&mut refs, page_index, &fonts, &images, &mut writer)?;
        }

        writer.catalog(catalog_id).pages(page_tree_id);

        Ok(writer.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::BuiltinFont;
    use crate::page::{SpanFont, SpanLayout};
    use crate::{colours, pagesize, Pt};

    #[test]
    fn writes_a_complete_pdf() {
        let mut doc = Document::default();
        doc.set_info(Info::new().title("Test").clone());
        let helvetica = doc.add_font(Font::Builtin(BuiltinFont::Helvetica));
        let mut page = Page::new(pagesize::A4);
        page.add_span(SpanLayout {
            text: "Hello".into(),
            font: SpanFont {
                id: helvetica,
                size: Pt(12.0),
            },
            colour: colours::BLACK,
            coords: (Pt(50.0), Pt(700.0)),
        });
        doc.add_page(page);

        let bytes = doc.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/BaseFont /Helvetica"));
        assert!(text.contains("/Encoding /WinAnsiEncoding"));
        assert!(text.contains("/Count 1"));
        assert!(text.trim_end().ends_with("%%EOF"));
    }

    #[test]
    fn page_lookup_follows_document_order() {
        let mut doc = Document::default();
        assert!(doc.page(0).is_none());
        doc.add_page(Page::new(pagesize::A4));
        assert!(doc.page(0).is_some());
        assert!(doc.page(1).is_none());
    }
}
