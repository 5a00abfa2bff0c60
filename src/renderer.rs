use crate::colour::colours;
use crate::document::Document;
use crate::font::{BuiltinFont, Font, SignatureFont};
use crate::image::Image;
use crate::info::Info;
use crate::layout::{LayoutConfig, Letterhead, LineLayout, VerbatimLines};
use crate::letter::{LetterRequest, RenderResult, Signer};
use crate::page::{ImageLayout, Page, SpanFont, SpanLayout};
use crate::rect::Rect;
use crate::signature::resolve_signatures;
use crate::units::Pt;
use crate::LetterError;
use chrono::{Local, NaiveDate};
use id_arena::Id;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A letter that has been written to disk
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub output_path: PathBuf,
    /// Size of the written file in bytes, or 0 if it vanished after writing
    pub file_size: u64,
}

/// Fonts registered with a letter's document
struct LetterFonts {
    bold: Id<Font>,
    regular: Id<Font>,
    signature: Id<Font>,
}

/// Lays out and writes approved letters.
///
/// The renderer performs no error recovery of its own: any failure while building or writing
/// the letter is returned to the caller as-is.
pub struct LetterRenderer<L: LineLayout = VerbatimLines> {
    pub layout: LayoutConfig,
    pub letterhead: Letterhead,
    pub signature_font: SignatureFont,
    pub body_layout: L,
}

impl LetterRenderer<VerbatimLines> {
    pub fn new(signature_font: SignatureFont) -> Self {
        LetterRenderer {
            layout: LayoutConfig::default(),
            letterhead: Letterhead::default(),
            signature_font,
            body_layout: VerbatimLines,
        }
    }
}

impl<L: LineLayout> LetterRenderer<L> {
    /// Replace how the letter body is positioned
    pub fn with_body_layout<M: LineLayout>(self, body_layout: M) -> LetterRenderer<M> {
        LetterRenderer {
            layout: self.layout,
            letterhead: self.letterhead,
            signature_font: self.signature_font,
            body_layout,
        }
    }

    /// Render a letter dated today to `output_path`, overwriting anything already there
    pub fn render<P: AsRef<Path>>(
        &self,
        letter_text: &str,
        signers: &[Signer],
        output_path: P,
    ) -> Result<Rendered, LetterError> {
        self.render_on(Local::now().date_naive(), letter_text, signers, output_path)
    }

    /// Render a letter whose letterhead carries `date` to `output_path`
    pub fn render_on<P: AsRef<Path>>(
        &self,
        date: NaiveDate,
        letter_text: &str,
        signers: &[Signer],
        output_path: P,
    ) -> Result<Rendered, LetterError> {
        let output_path = output_path.as_ref();
        let document = self.build_document(date, letter_text, signers)?;

        let file = File::create(output_path)?;
        document.write(BufWriter::new(file))?;

        let file_size = std::fs::metadata(output_path)
            .map(|m| m.len())
            .unwrap_or(0);
        info!(path = %output_path.display(), bytes = file_size, "wrote letter");

        Ok(Rendered {
            output_path: output_path.to_owned(),
            file_size,
        })
    }

    /// Lay out the whole letter in memory without writing it anywhere
    pub fn build_document(
        &self,
        date: NaiveDate,
        letter_text: &str,
        signers: &[Signer],
    ) -> Result<Document, LetterError> {
        let mut doc = Document::default();
        doc.set_info(
            Info::new()
                .title("Approved Letter")
                .author(&self.letterhead.institution)
                .subject(format!("Approved letter, {}", self.letterhead.institution))
                .clone(),
        );

        let fonts = LetterFonts {
            bold: doc.add_font(Font::Builtin(BuiltinFont::HelveticaBold)),
            regular: doc.add_font(Font::Builtin(BuiltinFont::Helvetica)),
            signature: doc.add_font(self.signature_font.to_font()?),
        };

        let mut page = Page::new(self.layout.page_size);
        self.draw_letterhead(&mut page, &fonts, date);
        self.draw_body(&mut page, &fonts, letter_text);
        self.draw_signatures(&mut doc, &mut page, &fonts, signers)?;

        doc.add_page(page);
        Ok(doc)
    }

    fn draw_letterhead(&self, page: &mut Page, fonts: &LetterFonts, date: NaiveDate) {
        let layout = &self.layout;
        let bold = SpanFont {
            id: fonts.bold,
            size: layout.institution_font_size,
        };
        let regular = SpanFont {
            id: fonts.regular,
            size: layout.header_font_size,
        };

        let lines = [
            (&self.letterhead.institution, bold, layout.institution_offset),
            (&self.letterhead.department, regular, layout.department_offset),
            (&self.letterhead.location, regular, layout.location_offset),
        ];
        for (text, font, offset) in lines {
            draw_text(page, text, font, (layout.left, layout.from_top(offset)));
        }

        draw_text(
            page,
            &format_letter_date(date),
            regular,
            (layout.left, layout.from_top(layout.date_offset)),
        );
    }

    fn draw_body(&self, page: &mut Page, fonts: &LetterFonts, letter_text: &str) {
        let layout = &self.layout;
        let font = SpanFont {
            id: fonts.regular,
            size: layout.body_font_size,
        };
        let origin = (layout.left, layout.from_top(layout.body_offset));

        let lines = self
            .body_layout
            .layout_lines(letter_text, origin, layout.body_leading);
        debug!(lines = lines.len(), "laid out letter body");

        for line in lines {
            draw_text(page, &line.text, font, line.baseline);
        }
    }

    fn draw_signatures(
        &self,
        doc: &mut Document,
        page: &mut Page,
        fonts: &LetterFonts,
        signers: &[Signer],
    ) -> Result<(), LetterError> {
        let layout = &self.layout;
        let y = layout.signature_baseline;
        let script = SpanFont {
            id: fonts.signature,
            size: layout.script_font_size,
        };
        let caption = SpanFont {
            id: fonts.regular,
            size: layout.caption_font_size,
        };

        let origins = layout.signature_block_origins(signers.len());
        for (signer, x) in signers.iter().zip(origins) {
            match signer.existing_signature_image() {
                Some(path) => {
                    let image_id = doc.add_image(Image::new_from_disk(path)?);
                    page.add_image(ImageLayout {
                        image_id,
                        position: Rect::from_origin(x, y, layout.image_width, layout.image_height),
                    });
                    debug!(signer = %signer.name, path = %path.display(), "signed with image");
                }
                None => {
                    draw_text(page, &signer.name, script, (x, y + layout.script_rise));
                    debug!(
                        signer = %signer.name,
                        font = self.signature_font.name(),
                        "signed with signature font"
                    );
                }
            }

            draw_text(page, &signer.name, caption, (x, y - layout.name_drop));
            draw_text(page, &signer.role, caption, (x, y - layout.role_drop));
            draw_text(
                page,
                &format!("Date: {}", signer.date),
                caption,
                (x, y - layout.date_drop),
            );
        }

        Ok(())
    }
}

fn draw_text(page: &mut Page, text: &str, font: SpanFont, coords: (Pt, Pt)) {
    if text.is_empty() {
        return;
    }
    page.add_span(SpanLayout {
        text: text.to_string(),
        font,
        colour: colours::BLACK,
        coords,
    });
}

/// Format a date the way it appears on the letterhead, e.g. "January 05, 2024"
pub fn format_letter_date(date: NaiveDate) -> String {
    date.format("%B %d, %Y").to_string()
}

impl From<Result<Rendered, LetterError>> for RenderResult {
    fn from(result: Result<Rendered, LetterError>) -> Self {
        match result {
            Ok(rendered) => RenderResult::success(rendered.output_path, rendered.file_size),
            Err(e) => RenderResult::failure(e),
        }
    }
}

/// Parse a JSON letter request, resolve any raw signature data, render the letter, and fold
/// the outcome into the record reported to the caller.
pub fn run<L: LineLayout>(payload: &str, renderer: &LetterRenderer<L>) -> RenderResult {
    try_run(payload, renderer).into()
}

fn try_run<L: LineLayout>(
    payload: &str,
    renderer: &LetterRenderer<L>,
) -> Result<Rendered, LetterError> {
    let mut request = LetterRequest::from_json(payload)?;
    resolve_signatures(&mut request.signers);
    renderer.render(&request.letter_text, &request.signers, &request.output_path)
}
