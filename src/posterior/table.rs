//! Console tables for fit summaries.

use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ContentArrangement, Table,
    presets::UTF8_FULL_CONDENSED,
};

use super::{FitSummary, RHAT_WARNING_THRESHOLD};
use crate::inference::ChainDiagnostics;

fn make_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.iter().map(|h| Cell::new(*h)).collect::<Vec<_>>());
    table
}

fn number_cell(value: f64, precision: usize) -> Cell {
    Cell::new(format!("{value:.precision$}")).set_alignment(CellAlignment::Right)
}

fn missing_cell() -> Cell {
    Cell::new("-").set_alignment(CellAlignment::Right)
}

fn rhat_cell(rhat: Option<f64>) -> Cell {
    match rhat {
        Some(value) if value > RHAT_WARNING_THRESHOLD => number_cell(value, 3)
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        Some(value) => number_cell(value, 3),
        None => missing_cell(),
    }
}

/// One row per scalar component: mean, sd, quantiles, ESS and split-R-hat.
#[must_use]
pub fn render_summary_table(summary: &FitSummary) -> Table {
    let mut table = make_table(&[
        "parameter", "mean", "sd", "2.5%", "50%", "97.5%", "n_eff", "Rhat",
    ]);
    for row in &summary.rows {
        let stats = &row.summary;
        table.add_row(vec![
            Cell::new(&row.name),
            number_cell(stats.mean, 3),
            number_cell(stats.std_dev, 3),
            number_cell(stats.q025, 3),
            number_cell(stats.q50, 3),
            number_cell(stats.q975, 3),
            row.ess.map_or_else(missing_cell, |ess| number_cell(ess, 0)),
            rhat_cell(row.rhat),
        ]);
    }
    table
}

/// One row per chain with step size, acceptance and divergence counts.
#[must_use]
pub fn render_chain_table(diagnostics: &[ChainDiagnostics]) -> Table {
    let mut table = make_table(&[
        "chain",
        "step size",
        "accept",
        "tree depth",
        "divergent",
        "max depth hits",
    ]);
    for chain in diagnostics {
        let divergent = Cell::new(chain.divergences).set_alignment(CellAlignment::Right);
        let divergent = if chain.divergences > 0 {
            divergent.fg(Color::Red).add_attribute(Attribute::Bold)
        } else {
            divergent
        };
        table.add_row(vec![
            Cell::new(chain.chain),
            number_cell(chain.step_size, 4),
            number_cell(chain.mean_accept_prob, 3),
            number_cell(chain.mean_tree_depth, 2),
            divergent,
            Cell::new(chain.max_treedepth_hits).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posterior::{ParameterSummary, SummaryRow};

    fn summary() -> FitSummary {
        FitSummary {
            rows: vec![
                SummaryRow {
                    name: "mu_a".to_string(),
                    summary: ParameterSummary {
                        mean: 1.4567,
                        std_dev: 0.05,
                        q025: 1.36,
                        q50: 1.45,
                        q975: 1.55,
                    },
                    ess: Some(812.4),
                    rhat: Some(1.002),
                },
                SummaryRow {
                    name: "sigma_a".to_string(),
                    summary: ParameterSummary::default(),
                    ess: None,
                    rhat: None,
                },
            ],
            chain_count: 2,
            draw_count: 1_000,
        }
    }

    #[test]
    fn summary_table_lists_every_component() {
        let rendered = render_summary_table(&summary()).to_string();
        assert!(rendered.contains("mu_a"));
        assert!(rendered.contains("sigma_a"));
        assert!(rendered.contains("1.457"));
        assert!(rendered.contains("812"));
        assert!(rendered.contains("Rhat"));
    }

    #[test]
    fn chain_table_renders_each_chain() {
        let rows = [ChainDiagnostics {
            chain: 0,
            step_size: 0.41,
            divergences: 2,
            mean_accept_prob: 0.83,
            mean_tree_depth: 3.0,
            max_treedepth_hits: 0,
        }];
        let rendered = render_chain_table(&rows).to_string();
        assert!(rendered.contains("0.4100"));
        assert!(rendered.contains("divergent"));
    }
}
