use std::path::Path;

use radon_multilevel::{
    RadonData, RadonModel, SamplerConfig, SimulationConfig, county_estimates_plot,
    county_intercepts, load_radon, render_chain_table, simulate_radon,
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
    let model = RadonModel::Unpooled;
    let fit = model
        .fit(&data, SamplerConfig::with_iterations_and_chains(1000, 2))
        .expect("sample");
    println!("{}", render_chain_table(&fit.chain_diagnostics()));

    let summary = fit.summary();
    for name in ["beta", "sigma"] {
        let row = summary.row(name).expect("scalar row");
        println!(
            "{name}: {:.3} [{:.3}, {:.3}]",
            row.summary.mean, row.summary.q025, row.summary.q975
        );
    }

    let intercepts = county_intercepts(model, &fit).expect("county intercepts");
    county_estimates_plot("unpooled county intercepts", &data.county_names, &intercepts)
        .expect("figure")
        .save("unpooled_estimates.svg")
        .expect("write figure");
}
