#![forbid(unsafe_code)]

//! # `radon_multilevel`
//!
//! Bayesian multilevel linear models for household radon measurements:
//! complete pooling, no pooling, and partial pooling with varying
//! intercepts, varying slopes, and a county-level uranium predictor.
//!
//! Models are written as declarative specifications (data, parameters,
//! sampling statements), bound to an observation table, compiled to a
//! differentiable log density, and sampled with a multi-chain No-U-Turn
//! sampler. Posterior draws are summarized into tables and SVG figures.

pub mod inference;
pub mod input;
pub mod models;
pub mod plot;
pub mod posterior;
pub mod preprocess;
pub mod spec;
pub mod utils;

pub use inference::{
    ChainDiagnostics, Fit, InferenceError, LogDensity, SamplerConfig, SamplerError, sample,
};
pub use input::{
    InputError, LoadError, RadonData, SimulationConfig, SimulationError, load_radon,
    load_radon_from_readers, simulate_radon,
};
pub use models::{ModelError, RadonModel};
pub use models::ols::{OlsFit, ols_pooled};
pub use models::predict::{
    county_intercepts, county_slopes, expected_log_radon, posterior_predictive,
};
pub use plot::{
    Figure, FigureConfig, FigureGrid, FittedLine, PlotError, county_estimates_plot,
    county_fits_plot, regression_plot, trace_plot,
};
pub use posterior::{
    FitSummary, ParameterSummary, SummaryRow, render_chain_table, render_summary_table,
    summarize, summarize_fit,
};
pub use preprocess::{
    RADON_LOG_OFFSET, ResponseDiagnostics, county_counts, county_means, log_transform,
    response_diagnostics,
};
pub use spec::{
    BindingError, DataBinding, DataDecl, DataValue, Distribution, Expr, ModelSpec, ParamDecl,
    SpecError, Statement,
};
