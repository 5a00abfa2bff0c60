//! Renders approved letters into single-page PDF documents: a letterhead, the body exactly as
//! submitted, and a centred row of signature blocks.
//!
//! ```no_run
//! use letter_pdf::{LetterRenderer, SignatureFont, Signer};
//!
//! let renderer = LetterRenderer::new(SignatureFont::resolve("BrushScriptStd.ttf"));
//! let signers = vec![Signer::new("Dr. A", "HOD", "2024-01-01")];
//! let rendered = renderer
//!     .render("Dear Sir,\nRequest approved.", &signers, "letter.pdf")
//!     .expect("can write letter");
//! println!("{} bytes", rendered.file_size);
//! ```

mod colour;
pub use colour::*;

mod config;
pub use config::*;

mod content;

mod document;
pub use document::*;

mod font;
pub use font::*;

mod image;
pub use self::image::*;

mod info;
pub use info::*;

/// Letter layout constants and body line layout
pub mod layout;

mod letter;
pub use letter::*;

mod page;
pub use page::*;

/// Page dimensions for common paper formats
pub mod pagesize;

mod rect;
pub use rect::*;

pub(crate) mod refs;

mod renderer;
pub use renderer::*;

mod signature;
pub use signature::*;

mod units;
pub use units::*;

mod error;
pub use error::*;

/// Re-export PDF-writer functionality
pub use pdf_writer;
