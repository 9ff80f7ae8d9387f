use std::path::Path;

use radon_multilevel::{
    RadonData, RadonModel, SamplerConfig, SimulationConfig, county_estimates_plot,
    county_intercepts, load_radon, render_summary_table, simulate_radon,
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
    let model = RadonModel::GroupPredictor;
    let fit = model
        .fit(&data, SamplerConfig::with_iterations_and_chains(1000, 4))
        .expect("sample");
    let summary = fit.summary();
    println!("{}", render_summary_table(&summary));

    for name in ["g0", "g1", "b", "sigma_a", "sigma_y"] {
        let row = summary.row(name).expect("scalar row");
        println!("{name}: {:.3} ({:.3})", row.summary.mean, row.summary.std_dev);
    }

    let intercepts = county_intercepts(model, &fit).expect("county intercepts");
    county_estimates_plot("intercepts given uranium", &data.county_names, &intercepts)
        .expect("figure")
        .save("group_predictor_intercepts.svg")
        .expect("write figure");
}
