use crate::{
    refs::{ObjectReferences, RefType},
    LetterError,
};
use id_arena::Id;
use owned_ttf_parser::{AsFaceRef, OwnedFace};
use pdf_writer::{
    types::{CidFontType, FontFlags, SystemInfo},
    Finish, Name, Pdf, Ref, Str,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One of the standard fonts every conforming PDF reader provides. These are never embedded
/// and only cover the WinAnsi character set.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BuiltinFont {
    Helvetica,
    HelveticaBold,
    TimesItalic,
}

impl BuiltinFont {
    /// The PostScript name used as the `BaseFont` of the font dictionary
    pub fn base_font(&self) -> &'static str {
        match self {
            BuiltinFont::Helvetica => "Helvetica",
            BuiltinFont::HelveticaBold => "Helvetica-Bold",
            BuiltinFont::TimesItalic => "Times-Italic",
        }
    }
}

/// A font that can be referenced by text spans on a page.
///
/// Builtin fonts cost nothing in the output file. Embedded fonts are TTF or OTF fonts that
/// are written into the PDF in their entirety, so large fonts will noticeably grow the
/// generated letter.
///
/// Fonts are referred to from page contents by their [Id] within the document.
pub enum Font {
    Builtin(BuiltinFont),
    Embedded(OwnedFace),
}

impl Font {
    /// Load a font from raw bytes, parsing the font and returning an error if the font
    /// could not be parsed
    pub fn load(bytes: Vec<u8>) -> Result<Font, LetterError> {
        let face = OwnedFace::from_vec(bytes, 0)?;
        Ok(Font::Embedded(face))
    }

    /// Obtain the full name of the font, if it has one
    pub fn name(&self) -> Option<String> {
        match self {
            Font::Builtin(builtin) => Some(builtin.base_font().to_string()),
            Font::Embedded(face) => face_name(face, owned_ttf_parser::name_id::FULL_NAME),
        }
    }

    /// Encode `text` into the byte string shown by the `Tj` operator for this font.
    ///
    /// Builtin fonts use WinAnsiEncoding and substitute `?` for anything outside of it.
    /// Embedded fonts use Identity-H, so every character becomes a big-endian glyph id.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Font::Builtin(_) => text.chars().map(winansi).collect(),
            Font::Embedded(face) => text
                .chars()
                .flat_map(|ch| glyph_or_replacement(face, ch).to_be_bytes())
                .collect(),
        }
    }

    pub(crate) fn write(&self, refs: &mut ObjectReferences, id: Id<Font>, writer: &mut Pdf) {
        let font_index = id.index();
        let font_id = refs.get_or_gen(RefType::Font(font_index));

        match self {
            Font::Builtin(builtin) => {
                writer
                    .type1_font(font_id)
                    .base_font(Name(builtin.base_font().as_bytes()))
                    .encoding_predefined(Name(b"WinAnsiEncoding"));
            }
            Font::Embedded(face) => {
                let cid_font_id = write_cid(face, refs, font_index, writer);
                let to_unicode_id = write_to_unicode(face, refs, font_index, writer);

                let mut font = writer.type0_font(font_id);
                font.base_font(Name(format!("F{font_index}").as_bytes()));
                font.encoding_predefined(Name(b"Identity-H"));
                font.descendant_font(cid_font_id);
                font.to_unicode(to_unicode_id);
            }
        }
    }
}

/// The typeface used to draw a signer's name when no signature image is available.
///
/// This is resolved once at startup and handed to the renderer, so the font that was actually
/// chosen can be inspected (see [SignatureFont::is_fallback]).
#[derive(Debug, Clone)]
pub enum SignatureFont {
    /// A script font loaded from disk, embedded into every letter
    Script {
        path: PathBuf,
        name: String,
        bytes: Vec<u8>,
    },
    /// The builtin italic used when no script font could be loaded
    Fallback(BuiltinFont),
}

impl SignatureFont {
    /// Load the script font at `path`, falling back to Times-Italic if the file is missing
    /// or is not a font that can be parsed
    pub fn resolve<P: AsRef<Path>>(path: P) -> SignatureFont {
        let path = path.as_ref();
        let loaded = std::fs::read(path)
            .map_err(LetterError::from)
            .and_then(|bytes| Font::load(bytes.clone()).map(|font| (font, bytes)));

        match loaded {
            Ok((font, bytes)) => {
                let name = font
                    .name()
                    .unwrap_or_else(|| path.display().to_string());
                debug!(font = %name, path = %path.display(), "loaded script font for signatures");
                SignatureFont::Script {
                    path: path.to_owned(),
                    name,
                    bytes,
                }
            }
            Err(e) => {
                info!(
                    path = %path.display(),
                    error = %e,
                    "script font unavailable, signatures will use Times-Italic"
                );
                SignatureFont::fallback()
            }
        }
    }

    pub fn fallback() -> SignatureFont {
        SignatureFont::Fallback(BuiltinFont::TimesItalic)
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, SignatureFont::Fallback(_))
    }

    pub fn name(&self) -> &str {
        match self {
            SignatureFont::Script { name, .. } => name.as_str(),
            SignatureFont::Fallback(builtin) => builtin.base_font(),
        }
    }

    /// Create a document font for this signature font
    pub fn to_font(&self) -> Result<Font, LetterError> {
        match self {
            SignatureFont::Script { bytes, .. } => Font::load(bytes.clone()),
            SignatureFont::Fallback(builtin) => Ok(Font::Builtin(*builtin)),
        }
    }
}

fn face_name(face: &OwnedFace, name_id: u16) -> Option<String> {
    face.as_face_ref()
        .names()
        .into_iter()
        .find(|name| name.name_id == name_id && name.is_unicode())
        .and_then(|name| name.to_string())
}

fn glyph_or_replacement(face: &OwnedFace, ch: char) -> u16 {
    let face = face.as_face_ref();
    face.glyph_index(ch)
        .or_else(|| face.glyph_index('\u{FFFD}'))
        .or_else(|| face.glyph_index('?'))
        .map(|gid| gid.0)
        .unwrap_or(0)
}

/// Map a character to its WinAnsiEncoding byte, or `?` if it has none
fn winansi(ch: char) -> u8 {
    match ch as u32 {
        0x20..=0x7E | 0xA0..=0xFF => ch as u8,
        _ => match ch {
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8A,
            '‹' => 0x8B,
            'Œ' => 0x8C,
            'Ž' => 0x8E,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9A,
            '›' => 0x9B,
            'œ' => 0x9C,
            'ž' => 0x9E,
            'Ÿ' => 0x9F,
            _ => b'?',
        },
    }
}

fn write_cid(
    face: &OwnedFace,
    refs: &mut ObjectReferences,
    font_index: usize,
    writer: &mut Pdf,
) -> Ref {
    let font_descriptor_id = write_descriptor(face, refs, font_index, writer);

    let id = refs.gen(RefType::CidFont(font_index));

    let mut cid_font = writer.cid_font(id);
    cid_font.subtype(CidFontType::Type2);
    cid_font.base_font(Name(format!("F{font_index}").as_bytes()));
    cid_font.system_info(SystemInfo {
        registry: Str(b"Adobe"),
        ordering: Str(b"Identity"),
        supplement: 0,
    });
    cid_font.font_descriptor(font_descriptor_id);

    let sizing = glyphs_sizing(face, &glyph_ids(face));
    let scaling = 1000.0 / face.as_face_ref().units_per_em() as f32;

    // the most popular width becomes the default
    let mut widths_counts: HashMap<u16, usize> = HashMap::new();
    for &(_, (width, _)) in sizing.values() {
        *widths_counts.entry(width).or_insert(0) += 1;
    }
    let most_common_width = widths_counts
        .iter()
        .max_by_key(|&(_, count)| *count)
        .map(|(&width, _)| width as f32 * scaling)
        .unwrap_or(1000.0);

    let mut id_widths: Vec<(u16, f32)> = sizing
        .iter()
        .map(|(&cid, &(_, (width, _)))| (cid, width as f32 * scaling))
        .collect();
    id_widths.sort_by_key(|(id, _)| *id);

    let mut widths = cid_font.widths();
    if let Some(&(first_cid, first_width)) = id_widths.first() {
        let mut start_cid: u16 = first_cid;
        let mut current_widths: Vec<f32> = vec![first_width];
        for (cid, width) in id_widths.into_iter().skip(1) {
            if (cid - start_cid) as usize > current_widths.len() {
                widths.consecutive(start_cid, current_widths.clone());
                start_cid = cid;
                current_widths.clear();
            }
            current_widths.push(width);
        }
        widths.consecutive(start_cid, current_widths);
    }
    widths.finish();

    cid_font.default_width(most_common_width);
    cid_font.cid_to_gid_map_predefined(Name(b"Identity"));

    id
}

fn write_font_data(
    face: &OwnedFace,
    refs: &mut ObjectReferences,
    font_index: usize,
    writer: &mut Pdf,
) -> Ref {
    let id = refs.gen(RefType::FontData(font_index));

    writer
        .stream(id, face.as_slice())
        .pair(Name(b"Length1"), face.as_slice().len() as i32);

    id
}

fn write_descriptor(
    face: &OwnedFace,
    refs: &mut ObjectReferences,
    font_index: usize,
    writer: &mut Pdf,
) -> Ref {
    let font_data_stream_id = write_font_data(face, refs, font_index, writer);
    let sizing = glyphs_sizing(face, &glyph_ids(face));

    let max_width = sizing
        .values()
        .map(|&(_, (w, _))| w)
        .max()
        .unwrap_or_default();
    let max_height = sizing
        .values()
        .map(|&(_, (_, h))| h)
        .max()
        .unwrap_or_default();
    let sum_width: usize = sizing.values().map(|&(_, (w, _))| w as usize).sum();
    let avg_width = sum_width as f32 / sizing.len().max(1) as f32;

    let name = face_name(face, owned_ttf_parser::name_id::FULL_NAME)
        .unwrap_or_else(|| format!("F{font_index}"));
    let family = face_name(face, owned_ttf_parser::name_id::FAMILY).unwrap_or_else(|| name.clone());

    let face = face.as_face_ref();
    let scaling = 1000.0 / face.units_per_em() as f32;

    let id = refs.gen(RefType::FontDescriptor(font_index));
    let mut descriptor = writer.font_descriptor(id);
    descriptor.name(Name(name.as_bytes()));
    descriptor.family(Str(family.as_bytes()));
    descriptor.weight(face.weight().to_number());

    let mut flags: FontFlags = FontFlags::SYMBOLIC;
    if face.is_monospaced() {
        flags.set(FontFlags::FIXED_PITCH, true);
    }
    if face.is_italic() {
        flags.set(FontFlags::ITALIC, true);
    }
    descriptor.flags(flags);

    descriptor.bbox(pdf_writer::Rect {
        x1: 0.0,
        y1: 0.0,
        x2: max_width as f32 * scaling,
        y2: max_height as f32 * scaling,
    });
    descriptor.italic_angle(face.italic_angle());
    descriptor.ascent(face.ascender() as f32 * scaling);
    descriptor.descent(face.descender() as f32 * scaling);
    descriptor.leading(face.line_gap() as f32 * scaling);
    descriptor.cap_height(
        face.capital_height()
            .map(|h| h as f32 * scaling)
            .unwrap_or(1000.0),
    );
    descriptor.x_height(
        face.x_height()
            .unwrap_or_else(|| face.capital_height().unwrap_or_default()) as f32
            * scaling,
    );
    descriptor.stem_v(80.0);
    descriptor.avg_width(avg_width * scaling);
    descriptor.max_width(max_width as f32 * scaling);
    descriptor.missing_width(max_width as f32 * scaling);

    descriptor.font_file2(font_data_stream_id);

    id
}

/// Every glyph reachable through a unicode cmap subtable, keyed by glyph id
fn glyph_ids(face: &OwnedFace) -> HashMap<u16, char> {
    let mut map: HashMap<u16, char> = HashMap::new();

    let Some(cmap) = face.as_face_ref().tables().cmap else {
        return map;
    };

    for subtable in cmap.subtables.into_iter().filter(|table| table.is_unicode()) {
        subtable.codepoints(|codepoint: u32| {
            if let Ok(ch) = char::try_from(codepoint) {
                if let Some(index) = subtable.glyph_index(codepoint).filter(|index| index.0 > 0) {
                    map.entry(index.0).or_insert(ch);
                }
            }
        });
    }

    map
}

fn glyphs_sizing(face: &OwnedFace, ids: &HashMap<u16, char>) -> HashMap<u16, (char, (u16, i16))> {
    let face = face.as_face_ref();
    let mut sizing: HashMap<u16, (char, (u16, i16))> = HashMap::new();
    for (&id, &ch) in ids.iter() {
        if let Some(gid) = face.glyph_index(ch) {
            if let Some(h_advance) = face.glyph_hor_advance(gid) {
                let height = face
                    .glyph_bounding_box(gid)
                    .map(|bbox| bbox.y_max - bbox.y_min - face.descender())
                    .unwrap_or(1000);
                sizing.insert(id, (ch, (h_advance, height)));
            }
        }
    }
    sizing
}

fn write_to_unicode(
    face: &OwnedFace,
    refs: &mut ObjectReferences,
    font_index: usize,
    writer: &mut Pdf,
) -> Ref {
    let id = refs.gen(RefType::ToUnicode(font_index));

    let mut map: String = r#"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo
<< /Registry (Adobe)
/Ordering (UCS) /Supplement 0 >> def
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
"#
    .replace("\r\n", "\n");

    let mut ids: Vec<(u16, char)> = glyph_ids(face).into_iter().collect();
    ids.sort_by_key(|&(id, _)| id);

    // bfchar blocks hold at most 100 entries
    for block in ids.chunks(100) {
        map.push_str(&format!("{} beginbfchar\n", block.len()));
        for &(id, ch) in block {
            let mut buf = [0u16; 2];
            let units: String = ch
                .encode_utf16(&mut buf)
                .iter()
                .map(|unit| format!("{unit:04x}"))
                .collect();
            map.push_str(&format!("<{id:04x}> <{units}>\n"));
        }
        map.push_str("endbfchar\n");
    }

    map.push_str("endcmap CMapName currentdict /CMap defineresource pop end end\n");

    let compressed = miniz_oxide::deflate::compress_to_vec_zlib(
        map.as_bytes(),
        miniz_oxide::deflate::CompressionLevel::DefaultLevel as u8,
    );
    let mut stream = writer.stream(id, compressed.as_slice());
    stream.filter(pdf_writer::Filter::FlateDecode);

    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::page::{Page, SpanFont, SpanLayout};
    use crate::{colours, pagesize, Pt};

    fn dejavu_mono() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSansMono.ttf")
    }

    #[test]
    fn winansi_covers_latin_text() {
        let font = Font::Builtin(BuiltinFont::Helvetica);
        assert_eq!(font.encode("Dear Sir,"), b"Dear Sir,".to_vec());
        assert_eq!(font.encode("café"), vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(font.encode("\u{2019}—€"), vec![0x92, 0x97, 0x80]);
    }

    #[test]
    fn unsupported_characters_become_question_marks() {
        let font = Font::Builtin(BuiltinFont::TimesItalic);
        assert_eq!(font.encode("日本"), b"??".to_vec());
    }

    #[test]
    fn missing_script_font_falls_back_to_times_italic() {
        let font = SignatureFont::resolve("/definitely/not/a/font.ttf");
        assert!(font.is_fallback());
        assert_eq!(font.name(), "Times-Italic");
        assert!(matches!(
            font.to_font(),
            Ok(Font::Builtin(BuiltinFont::TimesItalic))
        ));
    }

    #[test]
    fn unparsable_script_font_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"this is not a font").unwrap();
        let font = SignatureFont::resolve(&path);
        assert!(font.is_fallback());
    }

    #[test]
    fn builtin_fonts_keep_their_postscript_names() {
        assert_eq!(BuiltinFont::HelveticaBold.base_font(), "Helvetica-Bold");
        assert_eq!(
            Font::Builtin(BuiltinFont::Helvetica).name().as_deref(),
            Some("Helvetica")
        );
    }

    #[test]
    fn script_font_is_loaded_from_disk() {
        let font = SignatureFont::resolve(dejavu_mono());
        assert!(!font.is_fallback());
        assert!(font.name().contains("DejaVu"));
        assert!(matches!(font.to_font(), Ok(Font::Embedded(_))));
    }

    #[test]
    fn embedded_fonts_encode_glyph_ids() {
        let font = SignatureFont::resolve(dejavu_mono()).to_font().unwrap();
        let encoded = font.encode("Dr. A");
        assert_eq!(encoded.len(), 10);

        let glyphs: Vec<u16> = encoded
            .chunks(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        assert!(glyphs.iter().all(|&gid| gid != 0));
        assert_ne!(glyphs[0], glyphs[1]);
        assert_ne!(glyphs[3], glyphs[4]);
    }

    #[test]
    fn embedded_fonts_are_written_as_cid_fonts() {
        let mut doc = Document::default();
        let script = doc.add_font(SignatureFont::resolve(dejavu_mono()).to_font().unwrap());
        let mut page = Page::new(pagesize::A4);
        page.add_span(SpanLayout {
            text: "Dr. A".into(),
            font: SpanFont {
                id: script,
                size: Pt(20.0),
            },
            colour: colours::BLACK,
            coords: (Pt(100.0), Pt(120.0)),
        });
        doc.add_page(page);

        let bytes = doc.finish().unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Subtype /Type0"));
        assert!(text.contains("/Subtype /CIDFontType2"));
        assert!(text.contains("/Encoding /Identity-H"));
        assert!(text.contains("/ToUnicode"));
        assert!(text.contains("/FontFile2"));
    }
}
