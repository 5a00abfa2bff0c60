use crate::pagesize::{self, PageSize};
use crate::units::Pt;
use serde::{Deserialize, Serialize};

/// The static text at the top of every letter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Letterhead {
    pub institution: String,
    pub department: String,
    pub location: String,
}

impl Default for Letterhead {
    fn default() -> Self {
        Letterhead {
            institution: "Veltech University".to_string(),
            department: "Department of Computer Science".to_string(),
            location: "Chennai, Tamil Nadu".to_string(),
        }
    }
}

/// Every position and size used to lay out a letter.
///
/// Header and body offsets are measured down from the top edge of the page. Signature
/// caption offsets are measured down from the signature baseline, which is itself measured up
/// from the bottom edge of the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub page_size: PageSize,
    /// Left edge of the letterhead and the body
    pub left: Pt,

    pub institution_offset: Pt,
    pub institution_font_size: Pt,
    pub department_offset: Pt,
    pub location_offset: Pt,
    pub date_offset: Pt,
    pub header_font_size: Pt,

    pub body_offset: Pt,
    pub body_font_size: Pt,
    /// Distance between consecutive body baselines
    pub body_leading: Pt,

    pub signature_baseline: Pt,
    pub block_width: Pt,
    pub block_spacing: Pt,
    pub image_width: Pt,
    pub image_height: Pt,
    pub script_font_size: Pt,
    /// How far above the signature baseline a name-as-signature is drawn
    pub script_rise: Pt,
    pub caption_font_size: Pt,
    pub name_drop: Pt,
    pub role_drop: Pt,
    pub date_drop: Pt,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            page_size: pagesize::A4,
            left: Pt(50.0),

            institution_offset: Pt(50.0),
            institution_font_size: Pt(14.0),
            department_offset: Pt(70.0),
            location_offset: Pt(90.0),
            date_offset: Pt(110.0),
            header_font_size: Pt(12.0),

            body_offset: Pt(150.0),
            body_font_size: Pt(12.0),
            body_leading: Pt(14.4),

            signature_baseline: Pt(100.0),
            block_width: Pt(150.0),
            block_spacing: Pt(60.0),
            image_width: Pt(120.0),
            image_height: Pt(50.0),
            script_font_size: Pt(20.0),
            script_rise: Pt(20.0),
            caption_font_size: Pt(10.0),
            name_drop: Pt(10.0),
            role_drop: Pt(25.0),
            date_drop: Pt(40.0),
        }
    }
}

impl LayoutConfig {
    pub fn page_width(&self) -> Pt {
        self.page_size.0
    }

    pub fn page_height(&self) -> Pt {
        self.page_size.1
    }

    /// Convert an offset measured down from the top edge into a page y-coordinate
    pub fn from_top(&self, offset: Pt) -> Pt {
        self.page_height() - offset
    }

    /// Total width of a row of `signers` signature blocks, including the gaps between them
    pub fn signature_row_width(&self, signers: usize) -> Pt {
        if signers == 0 {
            return Pt(0.0);
        }
        self.block_width * signers as f32 + self.block_spacing * (signers - 1) as f32
    }

    /// The x-coordinate of the left edge of the first block in a centred row
    pub fn signature_row_start(&self, signers: usize) -> Pt {
        (self.page_width() - self.signature_row_width(signers)) / 2.0
    }

    /// Left edges of each block in a centred row of `signers` blocks, left to right
    pub fn signature_block_origins(&self, signers: usize) -> Vec<Pt> {
        let start = self.signature_row_start(signers);
        let stride = self.block_width + self.block_spacing;
        (0..signers).map(|i| start + stride * i as f32).collect()
    }
}
