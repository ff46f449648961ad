use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Datelike;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{FinancialPlan, ForecastDetail, ForecastSummary, run_forecast};

#[derive(Parser, Debug)]
#[command(
    name = "nestegg",
    about = "Deterministic retirement forecast: readiness score, earliest feasible retirement age, year-by-year projection"
)]
pub struct Cli {
    #[arg(long, default_value_t = 30)]
    current_age: u32,
    #[arg(long, default_value_t = 65)]
    target_retirement_age: u32,
    #[arg(long, default_value_t = 90_000.0)]
    annual_income: f64,
    #[arg(long, default_value_t = 60_000.0)]
    annual_expenses: f64,
    #[arg(
        long,
        default_value_t = 7.0,
        help = "Expected annual investment return in percent, e.g. 7"
    )]
    expected_return_rate: f64,
    #[arg(
        long,
        default_value_t = 2.5,
        help = "Expected annual inflation in percent, e.g. 2.5"
    )]
    inflation_rate: f64,
    #[arg(
        long,
        default_value_t = 5,
        help = "Risk tolerance from 1 (conservative) to 10 (aggressive)"
    )]
    risk_tolerance: u8,
    #[arg(long, default_value_t = 50_000.0)]
    current_assets: f64,
    #[arg(
        long,
        help = "Calendar year of the first projected row; defaults to the current year"
    )]
    start_year: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ForecastPayload {
    current_age: Option<u32>,
    target_retirement_age: Option<u32>,
    annual_income: Option<f64>,
    annual_expenses: Option<f64>,
    monthly_income: Option<f64>,
    monthly_expenses: Option<f64>,
    expected_return_rate: Option<f64>,
    inflation_rate: Option<f64>,
    risk_tolerance: Option<u8>,
    current_assets: Option<f64>,
    start_year: Option<i32>,
}

#[derive(Debug)]
pub struct ForecastRequest {
    pub plan: FinancialPlan,
    pub current_assets: f64,
    pub start_year: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ForecastResponse {
    start_year: i32,
    forecast: ForecastSummary,
    details: Vec<ForecastDetail>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn current_calendar_year() -> i32 {
    chrono::Local::now().year()
}

fn build_request(cli: Cli) -> Result<ForecastRequest, String> {
    if cli.current_age > 100 {
        return Err("--current-age must be at most 100".to_string());
    }

    if cli.target_retirement_age > 100 {
        return Err("--target-retirement-age must be at most 100".to_string());
    }

    if !(1..=10).contains(&cli.risk_tolerance) {
        return Err("--risk-tolerance must be between 1 and 10".to_string());
    }

    if !cli.annual_income.is_finite() || cli.annual_income < 0.0 {
        return Err("--annual-income must be >= 0".to_string());
    }

    if !cli.annual_expenses.is_finite() || cli.annual_expenses <= 0.0 {
        return Err("--annual-expenses must be > 0".to_string());
    }

    if !(-99.0..=100.0).contains(&cli.expected_return_rate) {
        return Err("--expected-return-rate must be between -99 and 100".to_string());
    }

    if !(-99.0..=100.0).contains(&cli.inflation_rate) {
        return Err("--inflation-rate must be between -99 and 100".to_string());
    }

    if !cli.current_assets.is_finite() || cli.current_assets < 0.0 {
        return Err("--current-assets must be >= 0".to_string());
    }

    if let Some(year) = cli.start_year {
        if !(1900..=3000).contains(&year) {
            return Err("--start-year must be between 1900 and 3000".to_string());
        }
    }

    Ok(ForecastRequest {
        plan: FinancialPlan {
            current_age: cli.current_age,
            target_retirement_age: cli.target_retirement_age,
            annual_income: cli.annual_income,
            annual_expenses: cli.annual_expenses,
            expected_return_rate: cli.expected_return_rate / 100.0,
            inflation_rate: cli.inflation_rate / 100.0,
            risk_tolerance: cli.risk_tolerance,
        },
        current_assets: cli.current_assets,
        start_year: cli.start_year.unwrap_or_else(current_calendar_year),
    })
}

fn default_cli_for_api() -> Cli {
    Cli {
        current_age: 30,
        target_retirement_age: 65,
        annual_income: 90_000.0,
        annual_expenses: 60_000.0,
        expected_return_rate: 7.0,
        inflation_rate: 2.5,
        risk_tolerance: 5,
        current_assets: 50_000.0,
        start_year: None,
    }
}

fn forecast_request_from_payload(payload: ForecastPayload) -> Result<ForecastRequest, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.current_age {
        cli.current_age = v;
    }
    if let Some(v) = payload.target_retirement_age {
        cli.target_retirement_age = v;
    }
    // Annual figures are canonical; monthly ones are an accepted alias and
    // are scaled up, with the annual field winning when both are present.
    if let Some(v) = payload.monthly_income {
        cli.annual_income = v * 12.0;
    }
    if let Some(v) = payload.annual_income {
        cli.annual_income = v;
    }
    if let Some(v) = payload.monthly_expenses {
        cli.annual_expenses = v * 12.0;
    }
    if let Some(v) = payload.annual_expenses {
        cli.annual_expenses = v;
    }
    if let Some(v) = payload.expected_return_rate {
        cli.expected_return_rate = v;
    }
    if let Some(v) = payload.inflation_rate {
        cli.inflation_rate = v;
    }
    if let Some(v) = payload.risk_tolerance {
        cli.risk_tolerance = v;
    }
    if let Some(v) = payload.current_assets {
        cli.current_assets = v;
    }
    if let Some(v) = payload.start_year {
        cli.start_year = Some(v);
    }

    build_request(cli)
}

#[cfg(test)]
fn forecast_request_from_json(json: &str) -> Result<ForecastRequest, String> {
    let payload = serde_json::from_str::<ForecastPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    forecast_request_from_payload(payload)
}

/// One-shot CLI mode: validate the flags, run the forecast, return the
/// response as pretty-printed JSON.
pub fn run_forecast_cli(cli: Cli) -> Result<String, String> {
    let request = build_request(cli)?;
    let outcome =
        run_forecast(&request.plan, request.current_assets, request.start_year)
            .map_err(|e| e.to_string())?;
    let response = ForecastResponse {
        start_year: request.start_year,
        forecast: outcome.forecast,
        details: outcome.details,
    };
    serde_json::to_string_pretty(&response).map_err(|e| e.to_string())
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/forecast",
            get(forecast_get_handler).post(forecast_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    log::info!("forecast HTTP API listening on http://{addr}");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn forecast_get_handler(Query(payload): Query<ForecastPayload>) -> Response {
    forecast_handler_impl(payload).await
}

async fn forecast_post_handler(Json(payload): Json<ForecastPayload>) -> Response {
    forecast_handler_impl(payload).await
}

async fn forecast_handler_impl(payload: ForecastPayload) -> Response {
    let request = match forecast_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => {
            log::warn!("rejected forecast request: {msg}");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };

    match run_forecast(&request.plan, request.current_assets, request.start_year) {
        Ok(outcome) => json_response(
            StatusCode::OK,
            ForecastResponse {
                start_year: request.start_year,
                forecast: outcome.forecast,
                details: outcome.details,
            },
        ),
        Err(e) => {
            log::warn!("rejected forecast request: {e}");
            error_response(StatusCode::BAD_REQUEST, &e.to_string())
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn build_request_converts_percent_rates_to_fractions() {
        let mut cli = default_cli_for_api();
        cli.expected_return_rate = 7.0;
        cli.inflation_rate = 2.5;
        cli.start_year = Some(2025);

        let request = build_request(cli).expect("valid request");
        assert_approx(request.plan.expected_return_rate, 0.07);
        assert_approx(request.plan.inflation_rate, 0.025);
        assert_eq!(request.start_year, 2025);
    }

    #[test]
    fn build_request_rejects_out_of_range_flags() {
        let mut cli = default_cli_for_api();
        cli.risk_tolerance = 0;
        assert_eq!(
            build_request(cli).unwrap_err(),
            "--risk-tolerance must be between 1 and 10"
        );

        let mut cli = default_cli_for_api();
        cli.current_assets = -5.0;
        assert_eq!(
            build_request(cli).unwrap_err(),
            "--current-assets must be >= 0"
        );

        let mut cli = default_cli_for_api();
        cli.annual_expenses = 0.0;
        assert_eq!(
            build_request(cli).unwrap_err(),
            "--annual-expenses must be > 0"
        );

        let mut cli = default_cli_for_api();
        cli.target_retirement_age = 4_000_000_000;
        assert_eq!(
            build_request(cli).unwrap_err(),
            "--target-retirement-age must be at most 100"
        );
    }

    #[test]
    fn empty_payload_falls_back_to_api_defaults() {
        let request = forecast_request_from_json(r#"{"startYear": 2025}"#).expect("valid");
        assert_eq!(request.plan.current_age, 30);
        assert_eq!(request.plan.target_retirement_age, 65);
        assert_approx(request.plan.annual_income, 90_000.0);
        assert_approx(request.plan.annual_expenses, 60_000.0);
        assert_eq!(request.plan.risk_tolerance, 5);
        assert_approx(request.current_assets, 50_000.0);
    }

    #[test]
    fn payload_fields_override_defaults() {
        let request = forecast_request_from_json(
            r#"{
                "currentAge": 42,
                "targetRetirementAge": 58,
                "annualIncome": 120000,
                "annualExpenses": 72000,
                "expectedReturnRate": 5.5,
                "inflationRate": 3.0,
                "riskTolerance": 8,
                "currentAssets": 400000,
                "startYear": 2025
            }"#,
        )
        .expect("valid");

        assert_eq!(request.plan.current_age, 42);
        assert_eq!(request.plan.target_retirement_age, 58);
        assert_approx(request.plan.annual_income, 120_000.0);
        assert_approx(request.plan.annual_expenses, 72_000.0);
        assert_approx(request.plan.expected_return_rate, 0.055);
        assert_approx(request.plan.inflation_rate, 0.03);
        assert_eq!(request.plan.risk_tolerance, 8);
        assert_approx(request.current_assets, 400_000.0);
    }

    #[test]
    fn monthly_aliases_scale_to_annual_and_annual_wins() {
        let request = forecast_request_from_json(
            r#"{"monthlyIncome": 10000, "monthlyExpenses": 6000, "startYear": 2025}"#,
        )
        .expect("valid");
        assert_approx(request.plan.annual_income, 120_000.0);
        assert_approx(request.plan.annual_expenses, 72_000.0);

        let request = forecast_request_from_json(
            r#"{"monthlyExpenses": 6000, "annualExpenses": 50000, "startYear": 2025}"#,
        )
        .expect("valid");
        assert_approx(request.plan.annual_expenses, 50_000.0);
    }

    #[test]
    fn invalid_payload_values_are_rejected_with_flag_messages() {
        let err = forecast_request_from_json(r#"{"riskTolerance": 11}"#).unwrap_err();
        assert_eq!(err, "--risk-tolerance must be between 1 and 10");

        let err = forecast_request_from_json(r#"{"currentAge": "thirty"}"#).unwrap_err();
        assert!(err.starts_with("Invalid API JSON payload:"));
    }

    #[test]
    fn forecast_response_uses_camel_case_field_names() {
        let request = forecast_request_from_json(r#"{"startYear": 2025}"#).expect("valid");
        let outcome = run_forecast(&request.plan, request.current_assets, request.start_year)
            .expect("forecast");
        let response = ForecastResponse {
            start_year: request.start_year,
            forecast: outcome.forecast,
            details: outcome.details,
        };

        let json = serde_json::to_string(&response).expect("serializable");
        for key in [
            "\"startYear\"",
            "\"forecast\"",
            "\"retirementAge\"",
            "\"retirementAssets\"",
            "\"monthlyIncome\"",
            "\"readinessScore\"",
            "\"details\"",
            "\"totalAssets\"",
            "\"annualIncome\"",
            "\"annualExpenses\"",
            "\"savingsRate\"",
        ] {
            assert!(json.contains(key), "missing {key} in {json}");
        }
    }
}
