use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    AmortizationResult, AmortizationRow, CalcError, Compounding, GrowthResult,
    amortization_schedule, project_growth, project_growth_with_contributions,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliCompounding {
    Annually,
    SemiAnnually,
    Quarterly,
    Monthly,
    BiWeekly,
    Weekly,
    Daily,
    Continuously,
}

impl CliCompounding {
    fn to_compounding(self) -> Compounding {
        match self {
            CliCompounding::Annually => Compounding::Periodic(1),
            CliCompounding::SemiAnnually => Compounding::Periodic(2),
            CliCompounding::Quarterly => Compounding::Periodic(4),
            CliCompounding::Monthly => Compounding::Periodic(12),
            CliCompounding::BiWeekly => Compounding::Periodic(26),
            CliCompounding::Weekly => Compounding::Periodic(52),
            CliCompounding::Daily => Compounding::Periodic(365),
            CliCompounding::Continuously => Compounding::Continuous,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliContributionFrequency {
    MatchesCompounding,
    Monthly,
    Quarterly,
    SemiAnnually,
    Annually,
    BiWeekly,
    Weekly,
}

impl CliContributionFrequency {
    fn periods_per_year(self) -> Option<u32> {
        match self {
            CliContributionFrequency::MatchesCompounding => None,
            CliContributionFrequency::Monthly => Some(12),
            CliContributionFrequency::Quarterly => Some(4),
            CliContributionFrequency::SemiAnnually => Some(2),
            CliContributionFrequency::Annually => Some(1),
            CliContributionFrequency::BiWeekly => Some(26),
            CliContributionFrequency::Weekly => Some(52),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliPaymentFrequency {
    Monthly,
    BiWeekly,
    Weekly,
    Quarterly,
    SemiAnnually,
    Annually,
}

impl CliPaymentFrequency {
    fn periods_per_year(self) -> u32 {
        match self {
            CliPaymentFrequency::Monthly => 12,
            CliPaymentFrequency::BiWeekly => 26,
            CliPaymentFrequency::Weekly => 52,
            CliPaymentFrequency::Quarterly => 4,
            CliPaymentFrequency::SemiAnnually => 2,
            CliPaymentFrequency::Annually => 1,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiCompounding {
    #[serde(alias = "1")]
    Annually,
    #[serde(alias = "2", alias = "semiAnnually", alias = "semi_annually")]
    SemiAnnually,
    #[serde(alias = "4")]
    Quarterly,
    #[serde(alias = "12")]
    Monthly,
    #[serde(alias = "26", alias = "biWeekly", alias = "bi_weekly")]
    BiWeekly,
    #[serde(alias = "52")]
    Weekly,
    #[serde(alias = "365")]
    Daily,
    #[serde(alias = "continuously")]
    Continuous,
}

impl From<ApiCompounding> for CliCompounding {
    fn from(value: ApiCompounding) -> Self {
        match value {
            ApiCompounding::Annually => CliCompounding::Annually,
            ApiCompounding::SemiAnnually => CliCompounding::SemiAnnually,
            ApiCompounding::Quarterly => CliCompounding::Quarterly,
            ApiCompounding::Monthly => CliCompounding::Monthly,
            ApiCompounding::BiWeekly => CliCompounding::BiWeekly,
            ApiCompounding::Weekly => CliCompounding::Weekly,
            ApiCompounding::Daily => CliCompounding::Daily,
            ApiCompounding::Continuous => CliCompounding::Continuously,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiContributionFrequency {
    #[serde(alias = "match", alias = "matchesCompounding", alias = "matches_compounding")]
    MatchesCompounding,
    #[serde(alias = "12")]
    Monthly,
    #[serde(alias = "4")]
    Quarterly,
    #[serde(alias = "2", alias = "semiAnnually", alias = "semi_annually")]
    SemiAnnually,
    #[serde(alias = "1")]
    Annually,
    #[serde(alias = "26", alias = "biWeekly", alias = "bi_weekly")]
    BiWeekly,
    #[serde(alias = "52")]
    Weekly,
}

impl From<ApiContributionFrequency> for CliContributionFrequency {
    fn from(value: ApiContributionFrequency) -> Self {
        match value {
            ApiContributionFrequency::MatchesCompounding => {
                CliContributionFrequency::MatchesCompounding
            }
            ApiContributionFrequency::Monthly => CliContributionFrequency::Monthly,
            ApiContributionFrequency::Quarterly => CliContributionFrequency::Quarterly,
            ApiContributionFrequency::SemiAnnually => CliContributionFrequency::SemiAnnually,
            ApiContributionFrequency::Annually => CliContributionFrequency::Annually,
            ApiContributionFrequency::BiWeekly => CliContributionFrequency::BiWeekly,
            ApiContributionFrequency::Weekly => CliContributionFrequency::Weekly,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiPaymentFrequency {
    #[serde(alias = "12")]
    Monthly,
    #[serde(alias = "26", alias = "biWeekly", alias = "bi_weekly")]
    BiWeekly,
    #[serde(alias = "52")]
    Weekly,
    #[serde(alias = "4")]
    Quarterly,
    #[serde(alias = "2", alias = "semiAnnually", alias = "semi_annually")]
    SemiAnnually,
    #[serde(alias = "1")]
    Annually,
}

impl From<ApiPaymentFrequency> for CliPaymentFrequency {
    fn from(value: ApiPaymentFrequency) -> Self {
        match value {
            ApiPaymentFrequency::Monthly => CliPaymentFrequency::Monthly,
            ApiPaymentFrequency::BiWeekly => CliPaymentFrequency::BiWeekly,
            ApiPaymentFrequency::Weekly => CliPaymentFrequency::Weekly,
            ApiPaymentFrequency::Quarterly => CliPaymentFrequency::Quarterly,
            ApiPaymentFrequency::SemiAnnually => CliPaymentFrequency::SemiAnnually,
            ApiPaymentFrequency::Annually => CliPaymentFrequency::Annually,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "fincalc-growth",
    about = "Compound interest and savings projection"
)]
struct GrowthParams {
    #[arg(long, default_value_t = 1000.0, help = "Initial principal amount")]
    principal: f64,
    #[arg(
        long,
        default_value_t = 5.0,
        help = "Nominal annual interest rate in percent, e.g. 5 for 5%"
    )]
    annual_rate: f64,
    #[arg(long, default_value_t = 10.0, help = "Investment horizon in years")]
    years: f64,
    #[arg(
        long,
        value_enum,
        default_value_t = CliCompounding::Monthly,
        help = "How often interest is credited"
    )]
    compounding: CliCompounding,
    #[arg(
        long,
        default_value_t = 100.0,
        help = "Amount contributed each contribution period"
    )]
    contribution_amount: f64,
    #[arg(
        long,
        value_enum,
        default_value_t = CliContributionFrequency::MatchesCompounding,
        help = "How often contributions are made"
    )]
    contribution_frequency: CliContributionFrequency,
}

#[derive(Parser, Debug)]
#[command(name = "fincalc-loan", about = "Loan payment and amortization analysis")]
struct LoanParams {
    #[arg(long, default_value_t = 25000.0, help = "Total amount of the loan")]
    principal: f64,
    #[arg(
        long,
        default_value_t = 6.5,
        help = "Annual interest rate in percent, e.g. 6.5 for 6.5%"
    )]
    annual_rate: f64,
    #[arg(long, default_value_t = 5.0, help = "Loan term in years")]
    term_years: f64,
    #[arg(
        long,
        value_enum,
        default_value_t = CliPaymentFrequency::Monthly,
        help = "How often payments are made"
    )]
    payment_frequency: CliPaymentFrequency,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Extra amount paid with each regular payment"
    )]
    extra_payment: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GrowthPayload {
    principal: Option<f64>,
    annual_rate: Option<f64>,
    years: Option<f64>,
    compounding: Option<ApiCompounding>,
    contribution_amount: Option<f64>,
    contribution_frequency: Option<ApiContributionFrequency>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LoanPayload {
    principal: Option<f64>,
    annual_rate: Option<f64>,
    term_years: Option<f64>,
    #[serde(alias = "paymentFrequency")]
    payments_per_year: Option<ApiPaymentFrequency>,
    extra_payment: Option<f64>,
    include_schedule: Option<bool>,
}

#[derive(Debug, Clone, Copy)]
struct GrowthRequest {
    principal: f64,
    rate: f64,
    years: f64,
    compounding: Compounding,
    contribution_amount: f64,
    contribution_frequency: u32,
    annual_rate_percent: f64,
}

#[derive(Debug, Clone, Copy)]
struct LoanRequest {
    principal: f64,
    rate: f64,
    term_years: f64,
    payments_per_year: u32,
    extra_payment: f64,
    include_schedule: bool,
    annual_rate_percent: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GrowthResponse {
    principal: f64,
    annual_rate_percent: f64,
    years: f64,
    /// None means continuous compounding.
    compounds_per_year: Option<u32>,
    contribution_amount: f64,
    contribution_frequency: u32,
    result: GrowthResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoanScenario {
    regular_payment: f64,
    total_paid: f64,
    total_interest_paid: f64,
    payment_count: u32,
    years_to_payoff: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoanSavings {
    payments_saved: u32,
    years_saved: f64,
    interest_saved: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoanResponse {
    principal: f64,
    annual_rate_percent: f64,
    term_years: f64,
    payments_per_year: u32,
    extra_payment: f64,
    base: LoanScenario,
    with_extra: Option<LoanScenario>,
    savings: Option<LoanSavings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schedule: Option<Vec<AmortizationRow>>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_growth_request(params: GrowthParams) -> Result<GrowthRequest, String> {
    if !params.principal.is_finite() || params.principal < 0.0 {
        return Err("--principal must be >= 0".to_string());
    }
    if !params.annual_rate.is_finite() || params.annual_rate < 0.0 {
        return Err("--annual-rate must be >= 0".to_string());
    }
    if !params.years.is_finite() || params.years < 0.0 {
        return Err("--years must be >= 0".to_string());
    }
    if params.years > 1000.0 {
        return Err("--years must be <= 1000".to_string());
    }
    if !params.contribution_amount.is_finite() || params.contribution_amount < 0.0 {
        return Err("--contribution-amount must be >= 0".to_string());
    }

    let compounding = params.compounding.to_compounding();
    let contribution_frequency = match params.contribution_frequency.periods_per_year() {
        Some(n) => n,
        None => match compounding {
            Compounding::Periodic(n) => n,
            // The continuous annuity formula needs a finite stream;
            // "matches compounding" falls back to monthly in that case.
            Compounding::Continuous => 12,
        },
    };

    Ok(GrowthRequest {
        principal: params.principal,
        rate: params.annual_rate / 100.0,
        years: params.years,
        compounding,
        contribution_amount: params.contribution_amount,
        contribution_frequency,
        annual_rate_percent: params.annual_rate,
    })
}

fn build_loan_request(params: LoanParams, include_schedule: bool) -> Result<LoanRequest, String> {
    if !params.principal.is_finite() {
        return Err("--principal must be a finite number".to_string());
    }
    if !params.annual_rate.is_finite() || params.annual_rate < 0.0 {
        return Err("--annual-rate must be >= 0".to_string());
    }
    if params.principal > 0.0 && (!params.term_years.is_finite() || params.term_years <= 0.0) {
        return Err("--term-years must be > 0".to_string());
    }
    if params.term_years > 200.0 {
        return Err("--term-years must be <= 200".to_string());
    }
    if !params.extra_payment.is_finite() || params.extra_payment < 0.0 {
        return Err("--extra-payment must be >= 0".to_string());
    }

    Ok(LoanRequest {
        principal: params.principal,
        rate: params.annual_rate / 100.0,
        term_years: params.term_years,
        payments_per_year: params.payment_frequency.periods_per_year(),
        extra_payment: params.extra_payment,
        include_schedule,
        annual_rate_percent: params.annual_rate,
    })
}

fn growth_request_from_payload(payload: GrowthPayload) -> Result<GrowthRequest, String> {
    let mut params = default_growth_params();

    if let Some(v) = payload.principal {
        params.principal = v;
    }
    if let Some(v) = payload.annual_rate {
        params.annual_rate = v;
    }
    if let Some(v) = payload.years {
        params.years = v;
    }
    if let Some(v) = payload.compounding {
        params.compounding = v.into();
    }
    if let Some(v) = payload.contribution_amount {
        params.contribution_amount = v;
    }
    if let Some(v) = payload.contribution_frequency {
        params.contribution_frequency = v.into();
    }

    build_growth_request(params)
}

fn loan_request_from_payload(payload: LoanPayload) -> Result<LoanRequest, String> {
    let mut params = default_loan_params();

    if let Some(v) = payload.principal {
        params.principal = v;
    }
    if let Some(v) = payload.annual_rate {
        params.annual_rate = v;
    }
    if let Some(v) = payload.term_years {
        params.term_years = v;
    }
    if let Some(v) = payload.payments_per_year {
        params.payment_frequency = v.into();
    }
    if let Some(v) = payload.extra_payment {
        params.extra_payment = v;
    }

    build_loan_request(params, payload.include_schedule.unwrap_or(true))
}

fn default_growth_params() -> GrowthParams {
    GrowthParams {
        principal: 1000.0,
        annual_rate: 5.0,
        years: 10.0,
        compounding: CliCompounding::Monthly,
        contribution_amount: 100.0,
        contribution_frequency: CliContributionFrequency::MatchesCompounding,
    }
}

fn default_loan_params() -> LoanParams {
    LoanParams {
        principal: 25_000.0,
        annual_rate: 6.5,
        term_years: 5.0,
        payment_frequency: CliPaymentFrequency::Monthly,
        extra_payment: 0.0,
    }
}

fn compute_growth_response(request: &GrowthRequest) -> Result<GrowthResponse, CalcError> {
    let result = if request.contribution_amount > 0.0 {
        project_growth_with_contributions(
            request.principal,
            request.rate,
            request.years,
            request.compounding,
            request.contribution_amount,
            request.contribution_frequency,
        )?
    } else {
        project_growth(request.principal, request.rate, request.years, request.compounding)?
    };

    Ok(GrowthResponse {
        principal: request.principal,
        annual_rate_percent: request.annual_rate_percent,
        years: request.years,
        compounds_per_year: request.compounding.periods_per_year(),
        contribution_amount: request.contribution_amount,
        contribution_frequency: request.contribution_frequency,
        result,
    })
}

fn compute_loan_response(request: &LoanRequest) -> Result<LoanResponse, CalcError> {
    let base = amortization_schedule(
        request.principal,
        request.rate,
        request.term_years,
        request.payments_per_year,
        0.0,
    )?;

    let with_extra = if request.extra_payment > 0.0 {
        Some(amortization_schedule(
            request.principal,
            request.rate,
            request.term_years,
            request.payments_per_year,
            request.extra_payment,
        )?)
    } else {
        None
    };

    let savings = with_extra.as_ref().map(|extra| LoanSavings {
        payments_saved: base.payment_count - extra.payment_count,
        years_saved: (base.payment_count - extra.payment_count) as f64
            / request.payments_per_year as f64,
        interest_saved: (base.total_interest_paid - extra.total_interest_paid).max(0.0),
    });

    // The table shows the scenario the user is actually considering.
    let schedule = if request.include_schedule {
        Some(
            with_extra
                .as_ref()
                .unwrap_or(&base)
                .rows
                .clone(),
        )
    } else {
        None
    };

    Ok(LoanResponse {
        principal: request.principal.max(0.0),
        annual_rate_percent: request.annual_rate_percent,
        term_years: request.term_years,
        payments_per_year: request.payments_per_year,
        extra_payment: request.extra_payment,
        base: scenario_summary(&base, request.payments_per_year),
        with_extra: with_extra
            .as_ref()
            .map(|r| scenario_summary(r, request.payments_per_year)),
        savings,
        schedule,
    })
}

fn scenario_summary(result: &AmortizationResult, payments_per_year: u32) -> LoanScenario {
    LoanScenario {
        regular_payment: result.regular_payment,
        total_paid: result.total_paid,
        total_interest_paid: result.total_interest_paid,
        payment_count: result.payment_count,
        years_to_payoff: result.payment_count as f64 / payments_per_year as f64,
    }
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/growth",
            get(growth_get_handler).post(growth_post_handler),
        )
        .route("/api/loan", get(loan_get_handler).post(loan_post_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    log::info!("fincalc HTTP API listening on http://{addr}");
    log::info!("Local access: http://127.0.0.1:{port}/");

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

async fn growth_get_handler(Query(payload): Query<GrowthPayload>) -> Response {
    growth_handler_impl(payload)
}

async fn growth_post_handler(Json(payload): Json<GrowthPayload>) -> Response {
    growth_handler_impl(payload)
}

async fn loan_get_handler(Query(payload): Query<LoanPayload>) -> Response {
    loan_handler_impl(payload)
}

async fn loan_post_handler(Json(payload): Json<LoanPayload>) -> Response {
    loan_handler_impl(payload)
}

fn growth_handler_impl(payload: GrowthPayload) -> Response {
    let request = match growth_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    match compute_growth_response(&request) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => calc_error_response(err),
    }
}

fn loan_handler_impl(payload: LoanPayload) -> Response {
    let request = match loan_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    match compute_loan_response(&request) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => calc_error_response(err),
    }
}

fn calc_error_response(err: CalcError) -> Response {
    let status = match err {
        CalcError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
        CalcError::NonConvergence { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    };
    log::warn!("calculation rejected: {err}");
    error_response(status, &err.to_string())
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
