//! Serialization of page contents into a PDF content stream.

use crate::colour::Colour;
use crate::font::Font;
use crate::page::{PageContents, SpanFont, SpanLayout};
use crate::LetterError;
use id_arena::Arena;
use std::io::Write;

/// Renders page contents to uncompressed content stream operators.
#[allow(clippy::write_with_newline)]
pub(crate) fn render_contents(
    contents: &[PageContents],
    fonts: &Arena<Font>,
) -> Result<Vec<u8>, LetterError> {
    let mut content: Vec<u8> = Vec::default();

    for page_content in contents.iter() {
        match page_content {
            PageContents::Text(spans) => {
                render_text_spans(&mut content, spans, fonts)?;
            }
            PageContents::Image(image) => {
                write!(&mut content, "q\n")?;
                write!(
                    &mut content,
                    "{} 0 0 {} {} {} cm\n",
                    *image.position.width(),
                    *image.position.height(),
                    *image.position.x1,
                    *image.position.y1
                )?;
                write!(&mut content, "/I{} Do\n", image.image_id.index())?;
                write!(&mut content, "Q\n")?;
            }
        }
    }

    Ok(content)
}

#[allow(clippy::write_with_newline)]
fn render_text_spans(
    content: &mut Vec<u8>,
    spans: &[SpanLayout],
    fonts: &Arena<Font>,
) -> Result<(), LetterError> {
    let Some(first) = spans.first() else {
        return Ok(());
    };

    write!(content, "q\n")?;

    let mut current_font: SpanFont = first.font;
    let mut current_colour: Colour = first.colour;

    write_font(content, current_font)?;
    write_colour(content, current_colour)?;

    for span in spans.iter() {
        if span.font != current_font {
            current_font = span.font;
            write_font(content, current_font)?;
        }
        if span.colour != current_colour {
            current_colour = span.colour;
            write_colour(content, current_colour)?;
        }

        let encoded = fonts
            .get(current_font.id)
            .map(|font| font.encode(&span.text))
            .unwrap_or_default();

        write!(content, "BT\n")?;
        write!(content, "{} {} Td\n", *span.coords.0, *span.coords.1)?;
        write!(content, "<")?;
        for byte in encoded {
            write!(content, "{byte:02x}")?;
        }
        write!(content, "> Tj\n")?;
        write!(content, "ET\n")?;
    }

    write!(content, "Q\n")?;
    Ok(())
}

#[allow(clippy::write_with_newline)]
fn write_font(content: &mut Vec<u8>, font: SpanFont) -> Result<(), std::io::Error> {
    write!(content, "/F{} {} Tf\n", font.id.index(), *font.size)
}

#[allow(clippy::write_with_newline)]
fn write_colour(content: &mut Vec<u8>, colour: Colour) -> Result<(), std::io::Error> {
    match colour {
        Colour::RGB { r, g, b } => write!(content, "{r} {g} {b} rg\n"),
        Colour::Grey { g } => write!(content, "{g} g\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colours;
    use crate::font::BuiltinFont;
    use crate::units::Pt;

    #[test]
    fn spans_become_positioned_hex_strings() {
        let mut fonts = Arena::new();
        let helvetica = fonts.alloc(Font::Builtin(BuiltinFont::Helvetica));
        let contents = vec![PageContents::Text(vec![SpanLayout {
            text: "Hi".into(),
            font: SpanFont {
                id: helvetica,
                size: Pt(12.0),
            },
            colour: colours::BLACK,
            coords: (Pt(50.0), Pt(691.5)),
        }])];

        let rendered = String::from_utf8(render_contents(&contents, &fonts).unwrap()).unwrap();
        assert_eq!(
            rendered,
            "q\n/F0 12 Tf\n0 g\nBT\n50 691.5 Td\n<4869> Tj\nET\nQ\n"
        );
    }

    #[test]
    fn nothing_to_draw_is_an_empty_stream() {
        let fonts: Arena<Font> = Arena::new();
        assert!(render_contents(&[], &fonts).unwrap().is_empty());
        assert!(render_contents(&[PageContents::Text(vec![])], &fonts)
            .unwrap()
            .is_empty());
    }
}
