//! # Plots
//!
//! SVG figures for the tutorials. A [`Figure`] holds scatter, line and
//! interval series in data coordinates; axes are scaled to the finite data
//! when rendered. A [`FigureGrid`] lays several figures out as panels.
//!
//! Rendering reads posterior summaries and never writes back into a model.

pub mod figures;
pub mod svg;

use std::fmt;
use std::path::Path;

use log::info;
use thiserror::Error;

use crate::inference::SamplerError;
use crate::models::ModelError;
use crate::utils::usize_to_f64;
pub use figures::{
    FittedLine, county_estimates_plot, county_fits_plot, regression_plot, trace_plot,
};
use svg::{Anchor, Axis, Canvas, PALETTE};

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("figure `{title}` has no finite data to draw")]
    EmptyFigure { title: String },
    #[error("figure size must be positive and larger than its margins")]
    InvalidSize,
    #[error("expected {expected} {what}; found {found}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("county code {county} is outside 0..{n_counties}")]
    UnknownCounty { county: usize, n_counties: usize },
    #[error("fit has no component named `{name}`")]
    UnknownComponent { name: String },
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Sampler(#[from] SamplerError),
    #[error("failed to format SVG: {0}")]
    Format(#[from] fmt::Error),
    #[error("failed to write figure: {0}")]
    Io(#[from] std::io::Error),
}

/// Pixel geometry of a single panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FigureConfig {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
    pub point_radius: f64,
    pub target_ticks: usize,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 420.0,
            margin: 56.0,
            point_radius: 2.5,
            target_ticks: 6,
        }
    }
}

impl FigureConfig {
    /// # Errors
    ///
    /// Returns `PlotError::InvalidSize` if the margins leave no plot area.
    pub fn validate(&self) -> Result<(), PlotError> {
        let finite = [self.width, self.height, self.margin, self.point_radius]
            .iter()
            .all(|value| value.is_finite() && *value >= 0.0);
        if !finite || self.width <= 2.0 * self.margin || self.height <= 2.0 * self.margin {
            return Err(PlotError::InvalidSize);
        }
        Ok(())
    }
}

/// Vertical interval around a point estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalPoint {
    pub x: f64,
    pub y: f64,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SeriesKind {
    Scatter(Vec<(f64, f64)>),
    Line(Vec<(f64, f64)>),
    Interval(Vec<IntervalPoint>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub color: &'static str,
    pub kind: SeriesKind,
}

impl Series {
    fn finite_points(&self) -> Vec<(f64, f64)> {
        let points: Vec<(f64, f64)> = match &self.kind {
            SeriesKind::Scatter(points) | SeriesKind::Line(points) => points.clone(),
            SeriesKind::Interval(points) => points
                .iter()
                .flat_map(|p| [(p.x, p.lower), (p.x, p.upper), (p.x, p.y)])
                .collect(),
        };
        points
            .into_iter()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .collect()
    }
}

/// A single panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Figure {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
}

impl Figure {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_labels(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = x_label.into();
        self.y_label = y_label.into();
        self
    }

    fn push(&mut self, label: impl Into<String>, kind: SeriesKind) -> &mut Self {
        let color = PALETTE[self.series.len() % PALETTE.len()];
        self.series.push(Series {
            label: label.into(),
            color,
            kind,
        });
        self
    }

    pub fn scatter(&mut self, label: impl Into<String>, points: Vec<(f64, f64)>) -> &mut Self {
        self.push(label, SeriesKind::Scatter(points))
    }

    pub fn line(&mut self, label: impl Into<String>, points: Vec<(f64, f64)>) -> &mut Self {
        self.push(label, SeriesKind::Line(points))
    }

    pub fn interval(&mut self, label: impl Into<String>, points: Vec<IntervalPoint>) -> &mut Self {
        self.push(label, SeriesKind::Interval(points))
    }

    /// `(x_min, x_max, y_min, y_max)` over finite data.
    #[must_use]
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        self.series
            .iter()
            .flat_map(Series::finite_points)
            .fold(None, |acc, (x, y)| match acc {
                None => Some((x, x, y, y)),
                Some((x0, x1, y0, y1)) => Some((x0.min(x), x1.max(x), y0.min(y), y1.max(y))),
            })
    }

    /// # Errors
    ///
    /// Returns `PlotError::EmptyFigure` if no series has finite data.
    pub fn to_svg(&self) -> Result<String, PlotError> {
        self.to_svg_with(&FigureConfig::default())
    }

    /// # Errors
    ///
    /// Returns `PlotError` if the configuration is invalid or the figure is
    /// empty.
    pub fn to_svg_with(&self, config: &FigureConfig) -> Result<String, PlotError> {
        config.validate()?;
        let mut canvas = Canvas::new(config.width, config.height);
        self.render(&mut canvas, (0.0, 0.0), config)?;
        Ok(canvas.finish())
    }

    /// # Errors
    ///
    /// Returns `PlotError` if rendering or writing fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PlotError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_svg()?)?;
        info!("wrote figure `{}` to {}", self.title, path.display());
        Ok(())
    }

    fn render(
        &self,
        canvas: &mut Canvas,
        (left, top): (f64, f64),
        config: &FigureConfig,
    ) -> Result<(), PlotError> {
        let (x_min, x_max, y_min, y_max) = self.bounds().ok_or_else(|| PlotError::EmptyFigure {
            title: self.title.clone(),
        })?;
        let x_axis = Axis::auto(x_min, x_max, config.target_ticks);
        let y_axis = Axis::auto(y_min, y_max, config.target_ticks);

        let x0 = left + config.margin;
        let x1 = left + config.width - config.margin * 0.5;
        let y0 = top + config.height - config.margin;
        let y1 = top + config.margin * 0.6;
        let to_px = |(x, y): (f64, f64)| (x_axis.to_pixel(x, x0, x1), y_axis.to_pixel(y, y0, y1));

        canvas.frame((x0, y1), x1 - x0, y0 - y1)?;
        for (value, label) in &x_axis.ticks {
            let px = x_axis.to_pixel(*value, x0, x1);
            canvas.line((px, y0), (px, y0 + 4.0), "#333333", 1.0)?;
            canvas.text((px, y0 + 16.0), label, 10.0, Anchor::Middle, None)?;
        }
        for (value, label) in &y_axis.ticks {
            let py = y_axis.to_pixel(*value, y0, y1);
            canvas.line((x0 - 4.0, py), (x0, py), "#333333", 1.0)?;
            canvas.text((x0 - 7.0, py + 3.5), label, 10.0, Anchor::End, None)?;
        }
        canvas.text(((x0 + x1) / 2.0, top + config.margin * 0.4), &self.title, 13.0, Anchor::Middle, None)?;
        canvas.text(((x0 + x1) / 2.0, y0 + 36.0), &self.x_label, 11.0, Anchor::Middle, None)?;
        let y_mid = (y0 + y1) / 2.0;
        canvas.text((left + 14.0, y_mid), &self.y_label, 11.0, Anchor::Middle, Some(-90.0))?;

        for series in &self.series {
            match &series.kind {
                SeriesKind::Scatter(points) => {
                    for point in points.iter().filter(|(x, y)| x.is_finite() && y.is_finite()) {
                        canvas.circle(to_px(*point), config.point_radius, series.color, 0.6)?;
                    }
                }
                SeriesKind::Line(points) => {
                    let pixels: Vec<(f64, f64)> = points
                        .iter()
                        .filter(|(x, y)| x.is_finite() && y.is_finite())
                        .map(|point| to_px(*point))
                        .collect();
                    canvas.polyline(&pixels, series.color, 1.5)?;
                }
                SeriesKind::Interval(points) => {
                    for point in points {
                        if !(point.lower.is_finite() && point.upper.is_finite()) {
                            continue;
                        }
                        canvas.line(
                            to_px((point.x, point.lower)),
                            to_px((point.x, point.upper)),
                            series.color,
                            1.0,
                        )?;
                        if point.y.is_finite() {
                            canvas.circle(to_px((point.x, point.y)), config.point_radius, series.color, 1.0)?;
                        }
                    }
                }
            }
        }

        let mut legend_y = y1 + 14.0;
        for series in self.series.iter().filter(|series| !series.label.is_empty()) {
            canvas.line((x1 - 110.0, legend_y - 4.0), (x1 - 94.0, legend_y - 4.0), series.color, 3.0)?;
            canvas.text((x1 - 90.0, legend_y), &series.label, 10.0, Anchor::Start, None)?;
            legend_y += 14.0;
        }
        Ok(())
    }
}

/// Panels laid out row-major in a fixed number of columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FigureGrid {
    pub panels: Vec<Figure>,
    pub columns: usize,
}

impl FigureGrid {
    #[must_use]
    pub fn new(panels: Vec<Figure>, columns: usize) -> Self {
        Self {
            panels,
            columns: columns.max(1),
        }
    }

    /// # Errors
    ///
    /// Returns `PlotError` if the grid is empty or a panel cannot be drawn.
    pub fn to_svg_with(&self, config: &FigureConfig) -> Result<String, PlotError> {
        config.validate()?;
        if self.panels.is_empty() {
            return Err(PlotError::EmptyFigure {
                title: "grid".to_string(),
            });
        }
        let columns = self.columns.min(self.panels.len());
        let rows = self.panels.len().div_ceil(columns);
        let mut canvas = Canvas::new(
            config.width * usize_to_f64(columns),
            config.height * usize_to_f64(rows),
        );
        for (idx, panel) in self.panels.iter().enumerate() {
            let origin = (
                config.width * usize_to_f64(idx % columns),
                config.height * usize_to_f64(idx / columns),
            );
            panel.render(&mut canvas, origin, config)?;
        }
        Ok(canvas.finish())
    }

    /// # Errors
    ///
    /// Returns `PlotError` if rendering or writing fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PlotError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_svg_with(&FigureConfig::default())?)?;
        info!("wrote {} panels to {}", self.panels.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_every_series_kind() {
        let mut figure = Figure::new("demo").with_labels("floor", "log radon");
        figure
            .scatter("obs", vec![(0.0, 1.0), (1.0, 0.5)])
            .line("fit", vec![(0.0, 1.1), (1.0, 0.4)])
            .interval(
                "",
                vec![IntervalPoint {
                    x: 0.5,
                    y: 0.8,
                    lower: 0.6,
                    upper: 1.0,
                }],
            );
        let svg = figure.to_svg().expect("figure has data");
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("<polyline"));
        assert!(svg.contains("log radon"));
    }

    #[test]
    fn empty_figure_is_an_error() {
        assert!(matches!(
            Figure::new("nothing").to_svg(),
            Err(PlotError::EmptyFigure { .. })
        ));
        let mut figure = Figure::new("nan");
        figure.scatter("", vec![(f64::NAN, 1.0)]);
        assert!(figure.bounds().is_none());
    }

    #[test]
    fn nearly_constant_values_still_render() {
        let mut figure = Figure::new("flat");
        figure.scatter("", vec![(0.0, 10_000.0), (1.0, 10_000.0 + 2e-12)]);
        let svg = figure.to_svg().expect("points are finite");
        assert!(svg.contains("<circle"));
    }

    #[test]
    fn series_colors_cycle() {
        let mut figure = Figure::new("colors");
        for idx in 0..=PALETTE.len() {
            figure.line(format!("s{idx}"), vec![(0.0, 0.0), (1.0, 1.0)]);
        }
        assert_eq!(figure.series[0].color, figure.series[PALETTE.len()].color);
    }

    #[test]
    fn config_rejects_oversized_margins() {
        let config = FigureConfig {
            margin: 400.0,
            ..FigureConfig::default()
        };
        assert!(matches!(config.validate(), Err(PlotError::InvalidSize)));
    }

    #[test]
    fn grid_scales_canvas_to_panels() {
        let mut panel = Figure::new("p");
        panel.scatter("", vec![(0.0, 0.0), (1.0, 1.0)]);
        let grid = FigureGrid::new(vec![panel.clone(), panel.clone(), panel], 2);
        let svg = grid
            .to_svg_with(&FigureConfig::default())
            .expect("panels have data");
        assert!(svg.contains(r#"width="1280""#));
        assert!(svg.contains(r#"height="840""#));
    }

    #[test]
    fn save_writes_file() {
        let mut figure = Figure::new("saved");
        figure.scatter("", vec![(0.0, 0.0), (1.0, 2.0)]);
        let path = std::env::temp_dir().join("radon_multilevel_plot_save.svg");
        figure.save(&path).expect("temp dir is writable");
        let written = std::fs::read_to_string(&path).expect("file exists");
        assert!(written.contains("saved"));
        let _ = std::fs::remove_file(path);
    }
}
