//! Letter layout: where everything on the page goes.
//!
//! The letter is laid out at fixed absolute coordinates. Every constant lives in
//! [LayoutConfig](crate::layout::LayoutConfig) so that a letter can be reproduced point for
//! point, and so that stationery can be adjusted through configuration rather than code.
//!
//! Body text is positioned by a [LineLayout](crate::layout::LineLayout). The only provided
//! implementation, [VerbatimLines](crate::layout::VerbatimLines), keeps the caller's line
//! breaks exactly and never wraps or paginates: long lines run off the right edge and long
//! letters run off the bottom of the page.
//!
//! # Example
//!
//! ```
//! use letter_pdf::layout::LayoutConfig;
//! use letter_pdf::Pt;
//!
//! let layout = LayoutConfig::default();
//! // three signers share a row centred on the page
//! let origins = layout.signature_block_origins(3);
//! assert_eq!(origins.len(), 3);
//! assert_eq!(origins[1] - origins[0], Pt(210.0));
//! ```

mod config;
mod lines;

pub use config::*;
pub use lines::*;
