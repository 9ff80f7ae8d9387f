use std::path::Path;

use radon_multilevel::{
    FittedLine, RadonData, RadonModel, SamplerConfig, SimulationConfig, load_radon, ols_pooled,
    regression_plot, render_summary_table, simulate_radon,
};

fn load() -> RadonData {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first() {
        Some(srrs) => load_radon(srrs, args.get(1).map(Path::new), "MN").expect("load radon"),
        None => simulate_radon(&SimulationConfig::default()).expect("simulate"),
    }
}

fn main() {
    env_logger::init();
    let data = load();
    println!("{} houses in {} counties", data.n_obs(), data.n_counties());

    let model = RadonModel::Pooled;
    println!("{}", model.spec());
    let fit = model
        .fit(&data, SamplerConfig::with_iterations_and_chains(1000, 2))
        .expect("sample");
    println!("{}", render_summary_table(&fit.summary()));

    let beta = fit.summary();
    let intercept = beta.row("beta[1]").expect("beta[1]").summary.mean;
    let slope = beta.row("beta[2]").expect("beta[2]").summary.mean;
    let ols = ols_pooled(&data).expect("least squares");
    println!(
        "least squares: {:.3} + {:.3} * floor (sd {:.3})",
        ols.intercept, ols.slope, ols.residual_sd
    );

    regression_plot(
        &data,
        &[
            FittedLine::new("pooled posterior mean", intercept, slope),
            FittedLine::new("least squares", ols.intercept, ols.slope),
        ],
    )
    .save("pooled.svg")
    .expect("write figure");
}
