use serde::Serialize;
use thiserror::Error;

/// Canonical plan schema: annual income and annual expenses are explicit
/// fields, and all monthly figures are derived from them. Rates are
/// fractions (0.07 = 7%), risk tolerance is 1 (most conservative) to 10
/// (most aggressive).
#[derive(Debug, Clone, PartialEq)]
pub struct FinancialPlan {
    pub current_age: u32,
    pub target_retirement_age: u32,
    pub annual_income: f64,
    pub annual_expenses: f64,
    pub expected_return_rate: f64,
    pub inflation_rate: f64,
    pub risk_tolerance: u8,
}

impl FinancialPlan {
    pub fn annual_savings(&self) -> f64 {
        (self.annual_income - self.annual_expenses).max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastSummary {
    pub retirement_age: u32,
    pub retirement_assets: f64,
    pub monthly_income: f64,
    pub readiness_score: u8,
}

/// One simulated year. `total_assets` may be negative in the final
/// retirement-phase row; the sequence stops right after recording it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDetail {
    pub year: i32,
    pub age: u32,
    pub total_assets: f64,
    pub annual_income: f64,
    pub annual_expenses: f64,
    pub savings_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastOutcome {
    pub forecast: ForecastSummary,
    pub details: Vec<ForecastDetail>,
}

/// Every failure is a rejected input; the engine itself has nothing to
/// retry and never returns a partial result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    #[error("current_age must be at most 100, got {0}")]
    CurrentAgeOutOfRange(u32),
    #[error("target_retirement_age must be at most 100, got {0}")]
    TargetRetirementAgeOutOfRange(u32),
    #[error("risk_tolerance must be between 1 and 10, got {0}")]
    RiskToleranceOutOfRange(u8),
    #[error("annual_income must be a finite amount >= 0")]
    InvalidAnnualIncome,
    #[error("annual_expenses must be a finite amount > 0")]
    InvalidAnnualExpenses,
    #[error("expected_return_rate must be a finite fraction > -1")]
    InvalidReturnRate,
    #[error("inflation_rate must be a finite fraction > -1")]
    InvalidInflationRate,
    #[error("current assets must be a finite amount >= 0")]
    InvalidCurrentAssets,
    #[error("required retirement capital is not a finite amount")]
    DegenerateRequiredCapital,
}
