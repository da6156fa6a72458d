use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Granularity {
    Yearly,
    Monthly,
}

impl Granularity {
    pub fn periods_per_year(self) -> u32 {
        match self {
            Granularity::Yearly => 1,
            Granularity::Monthly => 12,
        }
    }

    pub fn total_periods(self, swp_tenure_years: u32) -> u32 {
        swp_tenure_years * self.periods_per_year()
    }
}

// Rates are stored as fractions; percent inputs are normalized at the
// API/CLI boundary.
#[derive(Debug, Clone)]
pub struct PlanInputs {
    pub current_market_value: f64,
    pub monthly_sip: f64,
    pub sip_tenure_months: u32,
    pub market_return_rate: f64,
    pub inflation_rate: f64,
    pub swp_tenure_years: u32,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionRow {
    pub period: u32,
    pub opening_balance: f64,
    pub withdrawal: f64,
    pub growth: f64,
    pub closing_balance: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub rows: Vec<ProjectionRow>,
    pub chart: ChartSeries,
    pub depleted: bool,
}

#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub projected_corpus: f64,
    pub initial_monthly_withdrawal: f64,
    pub projection: Projection,
}
