//! The figures drawn in the radon tutorials.

use faer::Mat;

use super::{Figure, FigureGrid, IntervalPoint, PlotError};
use crate::inference::Fit;
use crate::input::RadonData;
use crate::models::RadonModel;
use crate::models::predict::expected_log_radon;
use crate::posterior::summarize_columns;
use crate::utils::{mean, usize_to_f64};

/// A regression line `intercept + slope * floor`.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedLine {
    pub label: String,
    pub intercept: f64,
    pub slope: f64,
}

impl FittedLine {
    #[must_use]
    pub fn new(label: impl Into<String>, intercept: f64, slope: f64) -> Self {
        Self {
            label: label.into(),
            intercept,
            slope,
        }
    }

    /// Line through the posterior mean expectations at floor 0 and 1.
    ///
    /// # Errors
    ///
    /// Returns `PlotError::Model` if `county` is not in the fit.
    pub fn from_posterior(
        label: impl Into<String>,
        model: RadonModel,
        fit: &Fit,
        county: usize,
    ) -> Result<Self, PlotError> {
        let basement = mean(&expected_log_radon(model, fit, county, 0.0)?);
        let first_floor = mean(&expected_log_radon(model, fit, county, 1.0)?);
        Ok(Self::new(label, basement, first_floor - basement))
    }

    fn points(&self) -> Vec<(f64, f64)> {
        [0.0, 1.0]
            .into_iter()
            .map(|floor| (floor, self.slope.mul_add(floor, self.intercept)))
            .collect()
    }
}

/// Floor against log radon for every house, with fitted lines on top.
#[must_use]
pub fn regression_plot(data: &RadonData, lines: &[FittedLine]) -> Figure {
    let mut figure = Figure::new("log radon by floor").with_labels("floor", "log radon");
    figure.scatter(
        "",
        data.floor
            .iter()
            .copied()
            .zip(data.log_radon.iter().copied())
            .collect(),
    );
    for line in lines {
        figure.line(line.label.clone(), line.points());
    }
    figure
}

/// Posterior mean of each county column with a one-sd bar, ordered by mean.
///
/// # Errors
///
/// Returns `PlotError::ShapeMismatch` if `names` and the draw columns
/// disagree, or `PlotError::EmptyFigure` for an empty draw matrix.
pub fn county_estimates_plot(
    title: &str,
    names: &[String],
    draws: &Mat<f64>,
) -> Result<Figure, PlotError> {
    if names.len() != draws.ncols() {
        return Err(PlotError::ShapeMismatch {
            what: "county columns",
            expected: names.len(),
            found: draws.ncols(),
        });
    }
    if draws.nrows() == 0 || draws.ncols() == 0 {
        return Err(PlotError::EmptyFigure {
            title: title.to_string(),
        });
    }

    let mut summaries = summarize_columns(draws);
    summaries.sort_by(|left, right| left.mean.total_cmp(&right.mean));
    let points = summaries
        .iter()
        .enumerate()
        .map(|(rank, summary)| IntervalPoint {
            x: usize_to_f64(rank + 1),
            y: summary.mean,
            lower: summary.mean - summary.std_dev,
            upper: summary.mean + summary.std_dev,
        })
        .collect();

    let mut figure = Figure::new(title).with_labels("county rank", "estimate");
    figure.interval("mean ± 1 sd", points);
    Ok(figure)
}

/// Per-chain draws of one component, e.g. `mu_a` or `a[3]`.
///
/// # Errors
///
/// Returns `PlotError::UnknownComponent` if `component` is not in the fit.
pub fn trace_plot(fit: &Fit, component: &str) -> Result<Figure, PlotError> {
    let index = fit
        .component_names()
        .iter()
        .position(|name| name == component)
        .ok_or_else(|| PlotError::UnknownComponent {
            name: component.to_string(),
        })?;

    let mut figure = Figure::new(format!("trace of {component}")).with_labels("draw", component);
    for (chain, draws) in fit.component_per_chain(index).into_iter().enumerate() {
        figure.line(
            format!("chain {}", chain + 1),
            draws
                .into_iter()
                .enumerate()
                .map(|(draw, value)| (usize_to_f64(draw + 1), value))
                .collect(),
        );
    }
    Ok(figure)
}

/// One panel per selected county: its houses, the pooled line, and the
/// county-specific line.
///
/// `county_lines` holds one line per county code.
///
/// # Errors
///
/// Returns `PlotError` if a county code is unknown or `county_lines` has
/// the wrong length.
pub fn county_fits_plot(
    data: &RadonData,
    counties: &[usize],
    pooled: &FittedLine,
    county_lines: &[FittedLine],
    columns: usize,
) -> Result<FigureGrid, PlotError> {
    let n_counties = data.n_counties();
    if county_lines.len() != n_counties {
        return Err(PlotError::ShapeMismatch {
            what: "county lines",
            expected: n_counties,
            found: county_lines.len(),
        });
    }

    let panels = counties
        .iter()
        .map(|&county| {
            if county >= n_counties {
                return Err(PlotError::UnknownCounty { county, n_counties });
            }
            let mut panel = Figure::new(data.county_names[county].clone())
                .with_labels("floor", "log radon");
            panel
                .scatter(
                    "",
                    data.rows_for_county(county)
                        .into_iter()
                        .map(|row| (data.floor[row], data.log_radon[row]))
                        .collect(),
                )
                .line(pooled.label.clone(), pooled.points())
                .line(county_lines[county].label.clone(), county_lines[county].points());
            Ok(panel)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FigureGrid::new(panels, columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{Bijector, ChainDraws, ParameterLayout, SamplerConfig};
    use crate::plot::{FigureConfig, SeriesKind};

    fn data() -> RadonData {
        RadonData::new(
            vec![1.2, 0.7, 1.9, 1.1, 0.2],
            vec![0.0, 1.0, 0.0, 1.0, 0.0],
            vec![0, 0, 1, 1, 1],
            vec!["AITKIN".into(), "ANOKA".into()],
        )
    }

    #[test]
    fn regression_plot_renders_lines() {
        let figure = regression_plot(
            &data(),
            &[
                FittedLine::new("pooled", 1.3, -0.6),
                FittedLine::new("least squares", 1.2, -0.5),
            ],
        );
        assert_eq!(figure.series.len(), 3);
        let svg = figure.to_svg().expect("figure has data");
        assert!(svg.contains("least squares"));
    }

    #[test]
    fn county_estimates_are_sorted_by_mean() {
        let draws = Mat::from_fn(4, 3, |row, col| {
            [2.0, -1.0, 0.5][col] + 0.1 * usize_to_f64(row)
        });
        let names = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let figure = county_estimates_plot("intercepts", &names, &draws).expect("shapes agree");
        let SeriesKind::Interval(points) = &figure.series[0].kind else {
            panic!("interval series expected");
        };
        assert!(points.windows(2).all(|pair| pair[0].y <= pair[1].y));
        assert!(points.iter().all(|p| p.lower <= p.y && p.y <= p.upper));
        assert!(figure.to_svg().is_ok());
    }

    #[test]
    fn county_estimates_require_matching_names() {
        let draws = Mat::from_fn(3, 2, |_, _| 0.0);
        assert!(matches!(
            county_estimates_plot("x", &["A".to_string()], &draws),
            Err(PlotError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn county_fits_build_one_panel_per_county() {
        let lines = vec![
            FittedLine::new("AITKIN", 1.0, -0.3),
            FittedLine::new("ANOKA", 1.4, -0.7),
        ];
        let grid = county_fits_plot(&data(), &[1, 0], &FittedLine::new("pooled", 1.2, -0.5), &lines, 2)
            .expect("counties exist");
        assert_eq!(grid.panels.len(), 2);
        assert_eq!(grid.panels[0].title, "ANOKA");
        assert!(grid.to_svg_with(&FigureConfig::default()).is_ok());
    }

    #[test]
    fn county_fits_reject_unknown_county() {
        let lines = vec![FittedLine::new("a", 0.0, 0.0), FittedLine::new("b", 0.0, 0.0)];
        assert!(matches!(
            county_fits_plot(&data(), &[5], &FittedLine::new("pooled", 0.0, 0.0), &lines, 1),
            Err(PlotError::UnknownCounty { county: 5, .. })
        ));
    }

    #[test]
    fn trace_plot_draws_one_line_per_chain() {
        let chain = |offset: f64| ChainDraws {
            draws: vec![vec![offset], vec![offset + 0.2], vec![offset - 0.1]],
            divergent: vec![false; 3],
            tree_depth: vec![1; 3],
            accept_prob: vec![0.9; 3],
            step_size: 0.5,
            inv_mass: vec![1.0],
        };
        let fit = Fit::new(
            vec![ParameterLayout {
                name: "mu_a".to_string(),
                offset: 0,
                len: 1,
                is_scalar: true,
                bijector: Bijector::Identity,
            }],
            vec![chain(0.0), chain(1.0)],
            SamplerConfig::default(),
        );
        let figure = trace_plot(&fit, "mu_a").expect("mu_a is sampled");
        assert_eq!(figure.series.len(), 2);
        assert_eq!(figure.series[1].label, "chain 2");
        assert!(matches!(
            trace_plot(&fit, "tau"),
            Err(PlotError::UnknownComponent { .. })
        ));
    }
}
