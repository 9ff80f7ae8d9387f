//! Minimal SVG canvas and linear axes with "nice number" ticks.

use std::fmt::{self, Write as _};

use num_traits::ToPrimitive;

use crate::utils::usize_to_f64;

const MAX_TICKS: usize = 64;

pub const PALETTE: [&str; 8] = [
    "#1f77b4", "#d62728", "#2ca02c", "#ff7f0e", "#9467bd", "#8c564b", "#e377c2", "#17becf",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
            Self::End => "end",
        }
    }
}

/// Text-accumulating SVG document.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: f64,
    height: f64,
    body: String,
}

impl Canvas {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            body: String::with_capacity(16 * 1024),
        }
    }

    pub fn line(
        &mut self,
        (x1, y1): (f64, f64),
        (x2, y2): (f64, f64),
        color: &str,
        width: f64,
    ) -> fmt::Result {
        writeln!(
            self.body,
            r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}" stroke="{color}" stroke-width="{width:.2}" />"#
        )
    }

    pub fn polyline(&mut self, points: &[(f64, f64)], color: &str, width: f64) -> fmt::Result {
        if points.len() < 2 {
            return Ok(());
        }
        self.body.push_str(r#"<polyline points=""#);
        for (idx, (x, y)) in points.iter().enumerate() {
            if idx > 0 {
                self.body.push(' ');
            }
            write!(self.body, "{x:.2},{y:.2}")?;
        }
        writeln!(
            self.body,
            r#"" fill="none" stroke="{color}" stroke-width="{width:.2}" />"#
        )
    }

    pub fn circle(&mut self, (cx, cy): (f64, f64), r: f64, color: &str, opacity: f64) -> fmt::Result {
        writeln!(
            self.body,
            r#"<circle cx="{cx:.2}" cy="{cy:.2}" r="{r:.2}" fill="{color}" fill-opacity="{opacity:.2}" />"#
        )
    }

    pub fn frame(&mut self, (x, y): (f64, f64), w: f64, h: f64) -> fmt::Result {
        writeln!(
            self.body,
            r##"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" fill="none" stroke="#333333" stroke-width="1" />"##
        )
    }

    pub fn text(
        &mut self,
        (x, y): (f64, f64),
        content: &str,
        size: f64,
        anchor: Anchor,
        rotate: Option<f64>,
    ) -> fmt::Result {
        write!(
            self.body,
            r##"<text x="{x:.2}" y="{y:.2}" font-family="sans-serif" font-size="{size:.1}" fill="#222222" text-anchor="{}""##,
            anchor.as_str()
        )?;
        if let Some(angle) = rotate {
            write!(self.body, r#" transform="rotate({angle:.1},{x:.2},{y:.2})""#)?;
        }
        self.body.push('>');
        push_escaped(&mut self.body, content);
        self.body.push_str("</text>\n");
        Ok(())
    }

    #[must_use]
    pub fn finish(self) -> String {
        let mut out = String::with_capacity(self.body.len() + 256);
        out.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height,
        ));
        out.push('\n');
        out.push_str(&format!(
            r#"<rect width="{}" height="{}" fill="white" />"#,
            self.width, self.height
        ));
        out.push('\n');
        out.push_str(&self.body);
        out.push_str("</svg>\n");
        out
    }
}

fn push_escaped(out: &mut String, content: &str) {
    for ch in content.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

/// Linear axis spanning rounded data limits.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub min: f64,
    pub max: f64,
    pub ticks: Vec<(f64, String)>,
}

impl Axis {
    #[must_use]
    pub fn auto(data_min: f64, data_max: f64, target_ticks: usize) -> Self {
        let (min, max, step) = nice_range(data_min, data_max, target_ticks);
        let intervals = ((max - min) / step)
            .round()
            .to_usize()
            .map_or(0, |n| n.min(MAX_TICKS - 1));
        let ticks = (0..=intervals)
            .map(|i| {
                let value = step.mul_add(usize_to_f64(i), min);
                (value, format_tick(value, step))
            })
            .collect();
        Self { min, max, ticks }
    }

    /// Map a data value onto `[px_min, px_max]`.
    #[must_use]
    pub fn to_pixel(&self, value: f64, px_min: f64, px_max: f64) -> f64 {
        let frac = (value - self.min) / (self.max - self.min);
        frac.mul_add(px_max - px_min, px_min)
    }
}

/// Ranges this narrow relative to their magnitude are drawn as a point.
fn is_degenerate(data_min: f64, data_max: f64) -> bool {
    let scale = data_min.abs().max(data_max.abs()).max(1.0);
    (data_max - data_min).abs() < 1e-12 * scale
}

fn nice_range(data_min: f64, data_max: f64, target_ticks: usize) -> (f64, f64, f64) {
    if is_degenerate(data_min, data_max) {
        return (data_min - 1.0, data_max + 1.0, 0.5);
    }
    let intervals = target_ticks.max(2) - 1;
    let rough = (data_max - data_min) / usize_to_f64(intervals);
    let step = nice_step(rough);
    (
        (data_min / step).floor() * step,
        (data_max / step).ceil() * step,
        step,
    )
}

fn nice_step(rough: f64) -> f64 {
    let magnitude = 10.0_f64.powf(rough.abs().log10().floor());
    let frac = rough / magnitude;
    let nice = if frac <= 1.5 {
        1.0
    } else if frac <= 3.5 {
        2.0
    } else if frac <= 7.5 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

fn format_tick(value: f64, step: f64) -> String {
    let decimals = if step >= 1.0 {
        0
    } else {
        (-step.log10().floor()).to_usize().unwrap_or(0)
    };
    // avoid "-0"
    let value = if value.abs() < step * 0.01 { 0.0 } else { value };
    format!("{value:.decimals$}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn axis_covers_data() {
        let axis = Axis::auto(-0.3, 3.7, 6);
        assert!(axis.min <= -0.3);
        assert!(axis.max >= 3.7);
        assert!(axis.ticks.len() >= 3);
        assert!(axis.ticks.iter().any(|(_, label)| label == "0"));
    }

    #[test]
    fn degenerate_range_is_widened() {
        let axis = Axis::auto(2.0, 2.0, 5);
        assert_relative_eq!(axis.min, 1.0);
        assert_relative_eq!(axis.max, 3.0);
    }

    #[test]
    fn narrow_range_at_large_magnitude_terminates() {
        let axis = Axis::auto(10_000.0, 10_000.0 + 2e-12, 6);
        assert!(axis.min < axis.max);
        assert!((2..=MAX_TICKS).contains(&axis.ticks.len()));
        assert!(axis.ticks.windows(2).all(|pair| pair[0].0 < pair[1].0));
    }

    #[test]
    fn tick_count_is_bounded() {
        let axis = Axis::auto(-1e6, 1e6, 500);
        assert!(axis.ticks.len() <= MAX_TICKS);
        let (first, _) = axis.ticks[0];
        assert_relative_eq!(first, axis.min);
    }

    #[test]
    fn pixel_mapping_is_linear() {
        let axis = Axis::auto(0.0, 10.0, 6);
        assert_relative_eq!(axis.to_pixel(axis.min, 50.0, 450.0), 50.0);
        assert_relative_eq!(axis.to_pixel(axis.max, 50.0, 450.0), 450.0);
    }

    #[test]
    fn fractional_ticks_keep_precision() {
        assert_eq!(format_tick(0.25, 0.05), "0.25");
        assert_eq!(format_tick(-1e-9, 0.5), "0.0");
    }

    #[test]
    fn text_is_escaped() {
        let mut canvas = Canvas::new(10.0, 10.0);
        canvas
            .text((1.0, 1.0), "a < b & c", 10.0, Anchor::Start, None)
            .expect("writing to a string");
        assert!(canvas.finish().contains("a &lt; b &amp; c"));
    }
}
