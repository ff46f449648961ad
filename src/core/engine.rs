use super::solver::solve_earliest_retirement_age;
use super::types::{FinancialPlan, ForecastDetail, ForecastError, ForecastOutcome, ForecastSummary};

/// Projection never runs past this age, regardless of asset state.
pub const PROJECTION_CEILING_AGE: u32 = 100;

/// The readiness score always projects at this rate so that two plans with
/// different return assumptions stay comparable on the same 0-100 scale.
const READINESS_RETURN_RATE: f64 = 0.07;

/// Safe annual withdrawal rate for a 1-10 risk tolerance. Three buckets,
/// no interpolation: <=3 conservative, >=8 aggressive, 0.04 otherwise.
pub fn withdrawal_rate(risk_tolerance: u8) -> f64 {
    if risk_tolerance <= 3 {
        0.03
    } else if risk_tolerance >= 8 {
        0.05
    } else {
        0.04
    }
}

/// The "nx rule": capital needed so that one year of retirement expenses
/// is a single withdrawal at the safe rate.
pub fn required_retirement_capital(annual_expenses: f64, withdrawal_rate: f64) -> f64 {
    annual_expenses / withdrawal_rate
}

/// Compound `current_assets` forward one year at a time. The year's return
/// is applied before the year's contribution, every year.
pub fn project_assets(
    current_assets: f64,
    annual_savings: f64,
    years: u32,
    annual_return_rate: f64,
) -> f64 {
    let mut assets = current_assets;
    for _ in 0..years {
        assets = assets * (1.0 + annual_return_rate) + annual_savings;
    }
    assets
}

/// 0-100 readiness heuristic. A score of 100 is only reachable through the
/// early return; the projected path is clamped to 99 so "fully funded
/// today" stays distinguishable from "projected to get there."
pub fn readiness_score(
    required_assets: f64,
    current_assets: f64,
    years_to_retirement: u32,
    annual_savings: f64,
) -> u8 {
    if current_assets >= required_assets {
        return 100;
    }
    let projected = project_assets(
        current_assets,
        annual_savings,
        years_to_retirement,
        READINESS_RETURN_RATE,
    );
    (projected / required_assets * 100.0).round().clamp(0.0, 99.0) as u8
}

fn savings_rate_percent(annual_savings: f64, annual_income: f64) -> f64 {
    if annual_income <= 0.0 {
        return 0.0;
    }
    (annual_savings / annual_income * 100.0).round()
}

/// One row per simulated year from the current age to age 100 inclusive.
/// Expenses inflate every simulated year, working or retired. The first
/// retirement-phase year that leaves assets at or below zero is recorded
/// and then ends the sequence.
fn annual_projection(
    plan: &FinancialPlan,
    retirement_age: u32,
    current_assets: f64,
    annual_savings: f64,
    start_year: i32,
) -> Vec<ForecastDetail> {
    let mut details = Vec::new();
    let mut assets = current_assets;
    let mut yearly_expenses = plan.annual_expenses;

    for age in plan.current_age..=PROJECTION_CEILING_AGE {
        let year = start_year.saturating_add((age - plan.current_age) as i32);
        yearly_expenses *= 1.0 + plan.inflation_rate;

        if age < retirement_age {
            assets = assets * (1.0 + plan.expected_return_rate) + annual_savings;
            details.push(ForecastDetail {
                year,
                age,
                total_assets: assets,
                annual_income: plan.annual_income,
                annual_expenses: yearly_expenses,
                savings_rate: savings_rate_percent(annual_savings, plan.annual_income),
            });
        } else {
            assets = assets * (1.0 + plan.expected_return_rate) - yearly_expenses;
            details.push(ForecastDetail {
                year,
                age,
                total_assets: assets,
                annual_income: 0.0,
                annual_expenses: yearly_expenses,
                savings_rate: 0.0,
            });
            if assets <= 0.0 {
                break;
            }
        }
    }

    details
}

/// All input rejection happens here, before any projection loop runs.
pub fn validate(plan: &FinancialPlan, current_assets: f64) -> Result<(), ForecastError> {
    if plan.current_age > PROJECTION_CEILING_AGE {
        return Err(ForecastError::CurrentAgeOutOfRange(plan.current_age));
    }
    // The age search and score projection both loop once per year, so an
    // unbounded target would be an unbounded amount of work.
    if plan.target_retirement_age > PROJECTION_CEILING_AGE {
        return Err(ForecastError::TargetRetirementAgeOutOfRange(
            plan.target_retirement_age,
        ));
    }
    if !(1..=10).contains(&plan.risk_tolerance) {
        return Err(ForecastError::RiskToleranceOutOfRange(plan.risk_tolerance));
    }
    if !plan.annual_income.is_finite() || plan.annual_income < 0.0 {
        return Err(ForecastError::InvalidAnnualIncome);
    }
    if !plan.annual_expenses.is_finite() || plan.annual_expenses <= 0.0 {
        return Err(ForecastError::InvalidAnnualExpenses);
    }
    if !plan.expected_return_rate.is_finite() || plan.expected_return_rate <= -1.0 {
        return Err(ForecastError::InvalidReturnRate);
    }
    if !plan.inflation_rate.is_finite() || plan.inflation_rate <= -1.0 {
        return Err(ForecastError::InvalidInflationRate);
    }
    if !current_assets.is_finite() || current_assets < 0.0 {
        return Err(ForecastError::InvalidCurrentAssets);
    }
    Ok(())
}

/// Full forecast: withdrawal policy, required capital, earliest feasible
/// retirement age, readiness score, and the year-by-year detail sequence.
/// Pure and deterministic; `start_year` only labels the detail rows.
pub fn run_forecast(
    plan: &FinancialPlan,
    current_assets: f64,
    start_year: i32,
) -> Result<ForecastOutcome, ForecastError> {
    validate(plan, current_assets)?;

    let withdrawal_rate = withdrawal_rate(plan.risk_tolerance);
    let required_assets = required_retirement_capital(plan.annual_expenses, withdrawal_rate);
    if !required_assets.is_finite() {
        return Err(ForecastError::DegenerateRequiredCapital);
    }

    let annual_savings = plan.annual_savings();
    let search = solve_earliest_retirement_age(plan, current_assets, annual_savings, required_assets);

    // The score is anchored to the plan's own target age, not the solved
    // age, so it reflects the user's stated goal.
    let years_to_target = plan.target_retirement_age.saturating_sub(plan.current_age);
    let score = readiness_score(required_assets, current_assets, years_to_target, annual_savings);

    let details = annual_projection(
        plan,
        search.retirement_age,
        current_assets,
        annual_savings,
        start_year,
    );

    Ok(ForecastOutcome {
        forecast: ForecastSummary {
            retirement_age: search.retirement_age,
            retirement_assets: search.projected_assets,
            monthly_income: search.projected_assets * withdrawal_rate / 12.0,
            readiness_score: score,
        },
        details,
    })
}
