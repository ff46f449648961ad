use super::engine::project_assets;
use super::types::FinancialPlan;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgeSearchResult {
    pub retirement_age: u32,
    /// Projected assets at the chosen retirement age.
    pub projected_assets: f64,
    /// False when no age up to the target meets the capital requirement
    /// and the target age was returned as the fallback.
    pub feasible: bool,
}

/// Scan candidate retirement ages from the current age up to the target,
/// earliest feasible age wins. Each candidate is projected with the plan's
/// own return assumption. A target at or below the current age degenerates
/// to immediate retirement on today's assets.
pub fn solve_earliest_retirement_age(
    plan: &FinancialPlan,
    current_assets: f64,
    annual_savings: f64,
    required_assets: f64,
) -> AgeSearchResult {
    if plan.target_retirement_age <= plan.current_age {
        return AgeSearchResult {
            retirement_age: plan.current_age,
            projected_assets: current_assets,
            feasible: current_assets >= required_assets,
        };
    }

    for test_age in plan.current_age..=plan.target_retirement_age {
        let years = test_age - plan.current_age;
        let projected = project_assets(
            current_assets,
            annual_savings,
            years,
            plan.expected_return_rate,
        );
        if projected >= required_assets {
            return AgeSearchResult {
                retirement_age: test_age,
                projected_assets: projected,
                feasible: true,
            };
        }
    }

    let years = plan.target_retirement_age - plan.current_age;
    AgeSearchResult {
        retirement_age: plan.target_retirement_age,
        projected_assets: project_assets(
            current_assets,
            annual_savings,
            years,
            plan.expected_return_rate,
        ),
        feasible: false,
    }
}
