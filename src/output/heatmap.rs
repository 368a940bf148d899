// SVG heatmap of a similarity matrix.
//
// One square cell per language pair, coloured on a fixed diverging
// blue-grey-red scale and annotated with the value. The scale does not adapt
// to the data, so heatmaps from different providers are directly comparable.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};

use crate::similarity::SimilarityMatrix;

const CELL: f64 = 64.0;
const MARGIN_LEFT: f64 = 80.0;
const MARGIN_TOP: f64 = 70.0;
const LEGEND_WIDTH: f64 = 90.0;

/// Fixed colour scale bounds. Values outside are clamped to the end colours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    pub min: f64,
    pub max: f64,
}

impl Default for ColorScale {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

/// Coolwarm anchor colours: low, midpoint, high.
const COOL: (f64, f64, f64) = (59.0, 76.0, 192.0);
const NEUTRAL: (f64, f64, f64) = (221.0, 221.0, 221.0);
const WARM: (f64, f64, f64) = (180.0, 4.0, 38.0);

impl ColorScale {
    /// Position of `v` on the scale in [0, 1].
    fn position(&self, v: f64) -> f64 {
        if self.max <= self.min {
            return 0.5;
        }
        ((v - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }

    /// Fill colour for `v` as `#rrggbb`.
    pub fn color(&self, v: f64) -> String {
        let t = self.position(v);
        let (from, to, f) = if t < 0.5 {
            (COOL, NEUTRAL, t * 2.0)
        } else {
            (NEUTRAL, WARM, (t - 0.5) * 2.0)
        };
        let lerp = |a: f64, b: f64| (a + (b - a) * f).round() as u8;
        format!(
            "#{:02x}{:02x}{:02x}",
            lerp(from.0, to.0),
            lerp(from.1, to.1),
            lerp(from.2, to.2)
        )
    }

    /// Dark cells get white annotation text.
    fn text_color(&self, v: f64) -> &'static str {
        let t = self.position(v);
        if !(0.2..=0.8).contains(&t) {
            "#ffffff"
        } else {
            "#000000"
        }
    }
}

/// Render the matrix as a standalone SVG document.
pub fn render_svg(matrix: &SimilarityMatrix, title: &str, scale: ColorScale) -> String {
    let n = matrix.dimension();
    let grid = CELL * n as f64;
    let width = MARGIN_LEFT + grid + LEGEND_WIDTH;
    let height = MARGIN_TOP + grid + 30.0;

    let mut svg = String::new();
    // Writing into a String is infallible
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" font-family="sans-serif">"#
    );
    let _ = writeln!(svg, r##"<rect width="100%" height="100%" fill="#ffffff"/>"##);
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="28" font-size="16" text-anchor="middle">{}</text>"#,
        width / 2.0,
        escape_xml(title)
    );

    for (i, lang) in matrix.languages().iter().enumerate() {
        let offset = i as f64 * CELL + CELL / 2.0;
        // Column label above the grid, row label to its left
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" font-size="13" text-anchor="middle">{}</text>"#,
            MARGIN_LEFT + offset,
            MARGIN_TOP - 10.0,
            escape_xml(lang)
        );
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" font-size="13" text-anchor="end" dominant-baseline="middle">{}</text>"#,
            MARGIN_LEFT - 10.0,
            MARGIN_TOP + offset,
            escape_xml(lang)
        );
    }

    for (i, row) in matrix.rows().iter().enumerate() {
        for (j, &v) in row.iter().enumerate() {
            let x = MARGIN_LEFT + j as f64 * CELL;
            let y = MARGIN_TOP + i as f64 * CELL;
            let _ = writeln!(
                svg,
                r##"<rect x="{x}" y="{y}" width="{CELL}" height="{CELL}" fill="{}" stroke="#ffffff"/>"##,
                scale.color(v)
            );
            let _ = writeln!(
                svg,
                r#"<text x="{}" y="{}" font-size="13" text-anchor="middle" dominant-baseline="middle" fill="{}">{:.2}</text>"#,
                x + CELL / 2.0,
                y + CELL / 2.0,
                scale.text_color(v),
                v
            );
        }
    }

    write_legend(&mut svg, scale, MARGIN_LEFT + grid + 30.0, grid.max(CELL));

    svg.push_str("</svg>\n");
    svg
}

/// Vertical colour bar with min/max labels.
fn write_legend(svg: &mut String, scale: ColorScale, x: f64, height: f64) {
    const STEPS: usize = 20;
    let step = height / STEPS as f64;
    for k in 0..STEPS {
        // Top of the bar is the high end
        let v = scale.max - (scale.max - scale.min) * (k as f64 + 0.5) / STEPS as f64;
        let _ = writeln!(
            svg,
            r#"<rect x="{x}" y="{}" width="16" height="{}" fill="{}"/>"#,
            MARGIN_TOP + k as f64 * step,
            step,
            scale.color(v)
        );
    }
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" font-size="11">{:.2}</text>"#,
        x + 20.0,
        MARGIN_TOP + 10.0,
        scale.max
    );
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" font-size="11">{:.2}</text>"#,
        x + 20.0,
        MARGIN_TOP + height,
        scale.min
    );
}

/// Render and save the heatmap.
pub fn write_heatmap(
    matrix: &SimilarityMatrix,
    title: &str,
    scale: ColorScale,
    path: &Path,
) -> Result<()> {
    let svg = render_svg(matrix, title, scale);
    std::fs::write(path, svg).with_context(|| format!("Failed to write {}", path.display()))
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
