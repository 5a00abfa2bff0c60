use crate::units::Pt;

/// A line of text and the baseline position it starts at
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedLine {
    pub text: String,
    pub baseline: (Pt, Pt),
}

/// Decides where each line of the letter body is drawn.
pub trait LineLayout {
    /// Lay out `text` with the first baseline at `origin`, successive baselines `leading`
    /// apart
    fn layout_lines(&self, text: &str, origin: (Pt, Pt), leading: Pt) -> Vec<PositionedLine>;
}

/// One output line per input line, each trimmed of surrounding whitespace. Nothing is
/// wrapped, merged, or moved to another page.
#[derive(Debug, Default, Clone, Copy)]
pub struct VerbatimLines;

impl LineLayout for VerbatimLines {
    fn layout_lines(&self, text: &str, origin: (Pt, Pt), leading: Pt) -> Vec<PositionedLine> {
        let (x, y) = origin;
        text.split('\n')
            .enumerate()
            .map(|(i, line)| PositionedLine {
                text: line.trim().to_string(),
                baseline: (x, y - leading * i as f32),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_line_breaks_and_trims() {
        let lines = VerbatimLines.layout_lines(
            "  Dear Sir,\r\n\nRequest approved.  ",
            (Pt(50.0), Pt(700.0)),
            Pt(10.0),
        );
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["Dear Sir,", "", "Request approved."]);
        assert_eq!(lines[0].baseline, (Pt(50.0), Pt(700.0)));
        assert_eq!(lines[2].baseline, (Pt(50.0), Pt(680.0)));
    }

    #[test]
    fn long_lines_are_not_wrapped() {
        let long = "word ".repeat(200);
        let lines = VerbatimLines.layout_lines(&long, (Pt(0.0), Pt(0.0)), Pt(12.0));
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, long.trim());
    }

    #[test]
    fn overflowing_bodies_run_below_the_page() {
        let text = vec!["line"; 100].join("\n");
        let lines = VerbatimLines.layout_lines(&text, (Pt(50.0), Pt(100.0)), Pt(14.4));
        assert_eq!(lines.len(), 100);
        assert!(lines[99].baseline.1 < Pt(0.0));
    }
}
