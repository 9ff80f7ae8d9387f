use std::path::Path;

use radon_multilevel::{
    RadonData, RadonModel, SamplerConfig, SimulationConfig, county_estimates_plot, county_slopes,
    load_radon, render_summary_table, simulate_radon,
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
    for model in [RadonModel::VaryingSlope, RadonModel::VaryingInterceptSlope] {
        let fit = model
            .fit(&data, SamplerConfig::with_iterations_and_chains(1000, 2))
            .expect("sample");
        println!("{model}\n{}", render_summary_table(&fit.summary()));

        let slopes = county_slopes(model, &fit).expect("county slopes");
        county_estimates_plot(&format!("{model} floor effects"), &data.county_names, &slopes)
            .expect("figure")
            .save(format!("{model}_slopes.svg"))
            .expect("write figure");
    }
}
