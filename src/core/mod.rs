mod engine;
mod solver;
mod types;

pub use engine::{
    PROJECTION_CEILING_AGE, project_assets, readiness_score, required_retirement_capital,
    run_forecast, validate, withdrawal_rate,
};
pub use solver::{AgeSearchResult, solve_earliest_retirement_age};
pub use types::{
    FinancialPlan, ForecastDetail, ForecastError, ForecastOutcome, ForecastSummary,
};
