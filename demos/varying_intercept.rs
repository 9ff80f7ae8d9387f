use std::path::Path;

use radon_multilevel::{
    FittedLine, RadonData, RadonModel, SamplerConfig, SimulationConfig, county_fits_plot,
    load_radon, posterior_predictive, render_summary_table, simulate_radon, summarize, trace_plot,
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

    let partial = RadonModel::PartialPooling
        .fit(&data, SamplerConfig::with_iterations_and_chains(1000, 2))
        .expect("sample partial pooling");
    println!("{}", render_summary_table(&partial.summary()));

    let model = RadonModel::VaryingIntercept;
    let fit = model
        .fit(&data, SamplerConfig::with_iterations_and_chains(1000, 4))
        .expect("sample varying intercept");
    println!("{}", render_summary_table(&fit.summary()));

    let pooled_fit = RadonModel::Pooled
        .fit(&data, SamplerConfig::with_iterations_and_chains(1000, 2))
        .expect("sample pooled");
    let pooled = FittedLine::from_posterior("pooled", RadonModel::Pooled, &pooled_fit, 0)
        .expect("pooled line");
    let lines = (0..data.n_counties())
        .map(|county| FittedLine::from_posterior("varying intercept", model, &fit, county))
        .collect::<Result<Vec<_>, _>>()
        .expect("county lines");
    let shown: Vec<usize> = (0..data.n_counties().min(8)).collect();
    county_fits_plot(&data, &shown, &pooled, &lines, 4)
        .expect("figure")
        .save("varying_intercept_counties.svg")
        .expect("write figure");

    trace_plot(&fit, "sigma_a")
        .expect("trace")
        .save("varying_intercept_sigma_a.svg")
        .expect("write figure");

    let basement = posterior_predictive(model, &fit, 0, 0.0, 17).expect("predict");
    let stats = summarize(&basement);
    println!(
        "new basement house in {}: {:.2} [{:.2}, {:.2}]",
        data.county_names[0], stats.mean, stats.q025, stats.q975
    );
}
