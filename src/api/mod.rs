use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::advisor::AdvisorClient;
use crate::core::{ChartSeries, Granularity, PlanInputs, ProjectionRow, run_plan};

const MAX_SWP_TENURE_YEARS: u32 = 100;
const MAX_SIP_TENURE_MONTHS: u32 = 1200;

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
enum ApiGranularity {
    Yearly,
    Monthly,
}

impl From<ApiGranularity> for Granularity {
    fn from(value: ApiGranularity) -> Self {
        match value {
            ApiGranularity::Yearly => Granularity::Yearly,
            ApiGranularity::Monthly => Granularity::Monthly,
        }
    }
}

impl From<Granularity> for ApiGranularity {
    fn from(value: Granularity) -> Self {
        match value {
            Granularity::Yearly => ApiGranularity::Yearly,
            Granularity::Monthly => ApiGranularity::Monthly,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    current_market_value: Option<f64>,
    #[serde(alias = "monthlySIP")]
    monthly_sip: Option<f64>,
    sip_tenure_months: Option<u32>,
    market_return_rate: Option<f64>,
    inflation_rate: Option<f64>,
    #[serde(alias = "swpTenureYears")]
    swp_tenure: Option<u32>,
    granularity: Option<ApiGranularity>,
}

#[derive(Parser, Debug)]
#[command(
    name = "swp",
    about = "SIP accumulation and systematic withdrawal plan simulator"
)]
struct Cli {
    #[arg(long, default_value_t = 5_000_000.0, help = "Current portfolio market value")]
    current_market_value: f64,
    #[arg(long, default_value_t = 50_000.0, help = "Monthly SIP contribution")]
    monthly_sip: f64,
    #[arg(long, default_value_t = 120, help = "Remaining SIP tenure in months")]
    sip_tenure_months: u32,
    #[arg(
        long,
        default_value_t = 12.0,
        help = "Expected annual market return in percent, e.g. 12"
    )]
    market_return_rate: f64,
    #[arg(
        long,
        default_value_t = 6.0,
        help = "Expected annual inflation in percent"
    )]
    inflation_rate: f64,
    #[arg(long, default_value_t = 25, help = "Desired withdrawal period in years")]
    swp_tenure: u32,
}

#[derive(Debug)]
struct ApiRequest {
    inputs: PlanInputs,
    granularity: Granularity,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    granularity: ApiGranularity,
    projected_corpus: f64,
    initial_monthly_withdrawal: f64,
    requested_periods: u32,
    depleted: bool,
    rows: Vec<ProjectionRow>,
    chart: ChartSeries,
}

#[derive(Debug, Serialize)]
struct AdviceResponse {
    advice: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_inputs(cli: Cli) -> Result<PlanInputs, String> {
    for (name, value) in [
        ("--current-market-value", cli.current_market_value),
        ("--monthly-sip", cli.monthly_sip),
        ("--market-return-rate", cli.market_return_rate),
        ("--inflation-rate", cli.inflation_rate),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(format!("{name} must be a non-negative number"));
        }
    }

    if cli.swp_tenure == 0 {
        return Err("--swp-tenure must be > 0".to_string());
    }

    if cli.swp_tenure > MAX_SWP_TENURE_YEARS {
        return Err(format!(
            "--swp-tenure must be <= {MAX_SWP_TENURE_YEARS} years"
        ));
    }

    if cli.sip_tenure_months > MAX_SIP_TENURE_MONTHS {
        return Err(format!(
            "--sip-tenure-months must be <= {MAX_SIP_TENURE_MONTHS} months"
        ));
    }

    if cli.market_return_rate <= cli.inflation_rate {
        return Err(
            "--market-return-rate must be greater than --inflation-rate for a sustainable \
             withdrawal"
                .to_string(),
        );
    }

    Ok(PlanInputs {
        current_market_value: cli.current_market_value,
        monthly_sip: cli.monthly_sip,
        sip_tenure_months: cli.sip_tenure_months,
        market_return_rate: cli.market_return_rate / 100.0,
        inflation_rate: cli.inflation_rate / 100.0,
        swp_tenure_years: cli.swp_tenure,
    })
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route("/api/advice", post(advice_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    println!("SWP simulator listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    simulate_handler_impl(payload)
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    simulate_handler_impl(payload)
}

fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let outcome = match run_plan(&request.inputs, request.granularity) {
        Ok(outcome) => outcome,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let response = SimulateResponse {
        granularity: request.granularity.into(),
        projected_corpus: outcome.projected_corpus,
        initial_monthly_withdrawal: outcome.initial_monthly_withdrawal,
        requested_periods: request
            .granularity
            .total_periods(request.inputs.swp_tenure_years),
        depleted: outcome.projection.depleted,
        rows: outcome.projection.rows,
        chart: outcome.projection.chart,
    };
    json_response(StatusCode::OK, response)
}

async fn advice_handler(Json(payload): Json<SimulatePayload>) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    // The advisor consumes the computed figures, so the plan must be run
    // before the upstream request is constructed.
    let outcome = match run_plan(&request.inputs, Granularity::Yearly) {
        Ok(outcome) => outcome,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let client = match AdvisorClient::from_env() {
        Ok(client) => client,
        Err(msg) => return error_response(StatusCode::SERVICE_UNAVAILABLE, &msg),
    };

    match client.financial_health_check(&request.inputs, &outcome).await {
        Ok(advice) => json_response(StatusCode::OK, AdviceResponse { advice }),
        Err(msg) => error_response(StatusCode::BAD_GATEWAY, &msg),
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
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
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: SimulatePayload) -> Result<ApiRequest, String> {
    let mut cli = default_cli_for_api();
    let mut granularity = Granularity::Yearly;

    if let Some(v) = payload.current_market_value {
        cli.current_market_value = v;
    }
    if let Some(v) = payload.monthly_sip {
        cli.monthly_sip = v;
    }
    if let Some(v) = payload.sip_tenure_months {
        cli.sip_tenure_months = v;
    }
    if let Some(v) = payload.market_return_rate {
        cli.market_return_rate = v;
    }
    if let Some(v) = payload.inflation_rate {
        cli.inflation_rate = v;
    }
    if let Some(v) = payload.swp_tenure {
        cli.swp_tenure = v;
    }
    if let Some(v) = payload.granularity {
        granularity = v.into();
    }

    let inputs = build_inputs(cli)?;
    Ok(ApiRequest {
        inputs,
        granularity,
    })
}

fn default_cli_for_api() -> Cli {
    Cli {
        current_market_value: 5_000_000.0,
        monthly_sip: 50_000.0,
        sip_tenure_months: 120,
        market_return_rate: 12.0,
        inflation_rate: 6.0,
        swp_tenure: 25,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_cli() -> Cli {
        default_cli_for_api()
    }

    #[test]
    fn build_inputs_normalizes_percent_rates() {
        let inputs = build_inputs(sample_cli()).expect("valid inputs");
        assert_approx(inputs.market_return_rate, 0.12);
        assert_approx(inputs.inflation_rate, 0.06);
        assert_approx(inputs.current_market_value, 5_000_000.0);
        assert_eq!(inputs.sip_tenure_months, 120);
        assert_eq!(inputs.swp_tenure_years, 25);
    }

    #[test]
    fn build_inputs_rejects_negative_amounts() {
        let mut cli = sample_cli();
        cli.monthly_sip = -1.0;
        let err = build_inputs(cli).expect_err("must reject negative SIP");
        assert!(err.contains("--monthly-sip"));

        let mut cli = sample_cli();
        cli.current_market_value = f64::NAN;
        let err = build_inputs(cli).expect_err("must reject NaN");
        assert!(err.contains("--current-market-value"));
    }

    #[test]
    fn build_inputs_rejects_zero_withdrawal_tenure() {
        let mut cli = sample_cli();
        cli.swp_tenure = 0;
        let err = build_inputs(cli).expect_err("must reject zero tenure");
        assert!(err.contains("--swp-tenure"));
    }

    #[test]
    fn build_inputs_caps_tenures() {
        let mut cli = sample_cli();
        cli.swp_tenure = 400_000_000;
        let err = build_inputs(cli).expect_err("must reject an absurd withdrawal tenure");
        assert!(err.contains("--swp-tenure must be <= 100 years"));

        let mut cli = sample_cli();
        cli.sip_tenure_months = 10_000;
        let err = build_inputs(cli).expect_err("must reject an absurd SIP tenure");
        assert!(err.contains("--sip-tenure-months must be <= 1200 months"));

        let mut cli = sample_cli();
        cli.swp_tenure = MAX_SWP_TENURE_YEARS;
        cli.sip_tenure_months = MAX_SIP_TENURE_MONTHS;
        assert!(build_inputs(cli).is_ok());
    }

    #[test]
    fn api_request_rejects_oversized_tenure_payload() {
        let err = api_request_from_json(r#"{"swpTenure": 400000000}"#)
            .expect_err("must reject an oversized tenure");
        assert!(err.contains("--swp-tenure must be <= 100 years"));
    }

    #[test]
    fn build_inputs_rejects_return_not_exceeding_inflation() {
        let mut cli = sample_cli();
        cli.market_return_rate = 6.0;
        cli.inflation_rate = 6.0;
        let err = build_inputs(cli).expect_err("must reject equal rates");
        assert!(err.contains("--market-return-rate"));

        let mut cli = sample_cli();
        cli.market_return_rate = 4.0;
        cli.inflation_rate = 6.0;
        assert!(build_inputs(cli).is_err());
    }

    #[test]
    fn api_request_from_json_parses_web_keys() {
        let json = r#"{
          "currentMarketValue": 2500000,
          "monthlySIP": 25000,
          "sipTenureMonths": 60,
          "marketReturnRate": 11,
          "inflationRate": 5,
          "swpTenure": 20,
          "granularity": "monthly"
        }"#;
        let request = api_request_from_json(json).expect("json should parse");

        assert_eq!(request.granularity, Granularity::Monthly);
        assert_approx(request.inputs.current_market_value, 2_500_000.0);
        assert_approx(request.inputs.monthly_sip, 25_000.0);
        assert_eq!(request.inputs.sip_tenure_months, 60);
        assert_approx(request.inputs.market_return_rate, 0.11);
        assert_approx(request.inputs.inflation_rate, 0.05);
        assert_eq!(request.inputs.swp_tenure_years, 20);
    }

    #[test]
    fn api_request_defaults_missing_fields() {
        let request = api_request_from_json("{}").expect("empty payload uses defaults");
        assert_eq!(request.granularity, Granularity::Yearly);
        assert_approx(request.inputs.current_market_value, 5_000_000.0);
        assert_eq!(request.inputs.swp_tenure_years, 25);
    }

    #[test]
    fn api_request_accepts_snake_free_aliases() {
        let request = api_request_from_json(r#"{"swpTenureYears": 15, "monthlySip": 10000}"#)
            .expect("aliases should parse");
        assert_eq!(request.inputs.swp_tenure_years, 15);
        assert_approx(request.inputs.monthly_sip, 10_000.0);
    }

    #[test]
    fn api_request_rejects_invalid_plan() {
        let err = api_request_from_json(r#"{"marketReturnRate": 3, "inflationRate": 6}"#)
            .expect_err("must reject unsustainable plan");
        assert!(err.contains("--market-return-rate"));
    }

    #[test]
    fn simulate_response_serialization_contains_expected_fields() {
        let request = api_request_from_json(r#"{"granularity": "yearly"}"#).expect("valid");
        let outcome = run_plan(&request.inputs, request.granularity).expect("valid plan");
        let response = SimulateResponse {
            granularity: request.granularity.into(),
            projected_corpus: outcome.projected_corpus,
            initial_monthly_withdrawal: outcome.initial_monthly_withdrawal,
            requested_periods: request
                .granularity
                .total_periods(request.inputs.swp_tenure_years),
            depleted: outcome.projection.depleted,
            rows: outcome.projection.rows,
            chart: outcome.projection.chart,
        };

        let json = serde_json::to_string(&response).expect("response should serialize");
        assert!(json.contains("\"projectedCorpus\""));
        assert!(json.contains("\"initialMonthlyWithdrawal\""));
        assert!(json.contains("\"requestedPeriods\":25"));
        assert!(json.contains("\"granularity\":\"yearly\""));
        assert!(json.contains("\"openingBalance\""));
        assert!(json.contains("\"closingBalance\""));
        assert!(json.contains("\"labels\":[\"Start\""));
        assert!(json.contains("\"depleted\":true"));
    }
}
