use super::types::{ChartSeries, Granularity, PlanInputs, PlanOutcome, Projection, ProjectionRow};

pub fn accumulate(
    current_market_value: f64,
    monthly_sip: f64,
    sip_tenure_months: u32,
    market_return_rate: f64,
) -> f64 {
    let monthly_rate = market_return_rate / 12.0;
    let sip_years = sip_tenure_months as f64 / 12.0;
    let fv_of_current = current_market_value * (1.0 + market_return_rate).powf(sip_years);
    // Annuity-due future value; degenerates to a plain sum at zero rate.
    let fv_of_sip = if monthly_rate == 0.0 {
        monthly_sip * sip_tenure_months as f64
    } else {
        monthly_sip * (((1.0 + monthly_rate).powi(sip_tenure_months as i32) - 1.0) / monthly_rate)
            * (1.0 + monthly_rate)
    };
    fv_of_current + fv_of_sip
}

pub fn solve_initial_withdrawal(
    projected_corpus: f64,
    market_return_rate: f64,
    inflation_rate: f64,
    swp_tenure_years: u32,
) -> Result<f64, String> {
    if swp_tenure_years == 0 {
        return Err("withdrawal tenure must be at least one year".to_string());
    }

    let real_annual_rate = (1.0 + market_return_rate) / (1.0 + inflation_rate) - 1.0;
    let real_monthly_rate = (1.0 + real_annual_rate).powf(1.0 / 12.0) - 1.0;
    if real_monthly_rate <= 0.0 {
        return Err(
            "market return rate must exceed the inflation rate for a sustainable withdrawal"
                .to_string(),
        );
    }

    let total_months = (swp_tenure_years * 12) as i32;
    Ok(projected_corpus * real_monthly_rate / (1.0 - (1.0 + real_monthly_rate).powi(-total_months)))
}

pub fn simulate(
    projected_corpus: f64,
    initial_monthly_withdrawal: f64,
    market_return_rate: f64,
    inflation_rate: f64,
    swp_tenure_years: u32,
    granularity: Granularity,
) -> Projection {
    let periods_per_year = granularity.periods_per_year();
    let total_periods = granularity.total_periods(swp_tenure_years);
    let (period_rate, withdrawal_scale) = match granularity {
        Granularity::Yearly => (market_return_rate, 12.0),
        Granularity::Monthly => (market_return_rate / 12.0, 1.0),
    };

    let mut rows = Vec::with_capacity(total_periods as usize);
    let mut opening_balance = projected_corpus;
    let mut monthly_withdrawal = initial_monthly_withdrawal;
    let mut depleted = false;

    for period in 1..=total_periods {
        let withdrawal = monthly_withdrawal * withdrawal_scale;
        // Period 1 is emitted even when the balance already cannot cover the
        // withdrawal, so the table and chart always have at least one point
        // after "Start".
        if opening_balance < withdrawal && period > 1 {
            depleted = true;
            break;
        }
        let growth = (opening_balance - withdrawal) * period_rate;
        let closing_balance = opening_balance - withdrawal + growth;
        rows.push(ProjectionRow {
            period,
            opening_balance,
            withdrawal,
            growth,
            closing_balance,
        });
        opening_balance = closing_balance;
        // The withdrawal inflates once per simulated year.
        if period % periods_per_year == 0 {
            monthly_withdrawal *= 1.0 + inflation_rate;
        }
    }

    let chart = chart_from_rows(projected_corpus, &rows, granularity);
    Projection {
        rows,
        chart,
        depleted,
    }
}

// Annual sampling over the full row sequence: every row for yearly runs,
// every 12th row for monthly runs. The table stays fully granular.
fn chart_from_rows(
    projected_corpus: f64,
    rows: &[ProjectionRow],
    granularity: Granularity,
) -> ChartSeries {
    let stride = granularity.periods_per_year();
    let mut labels = vec!["Start".to_string()];
    let mut values = vec![projected_corpus];
    for row in rows {
        if row.period % stride == 0 {
            labels.push(format!("Year {}", row.period / stride));
            values.push(row.closing_balance);
        }
    }
    ChartSeries { labels, values }
}

pub fn run_plan(inputs: &PlanInputs, granularity: Granularity) -> Result<PlanOutcome, String> {
    let projected_corpus = accumulate(
        inputs.current_market_value,
        inputs.monthly_sip,
        inputs.sip_tenure_months,
        inputs.market_return_rate,
    );
    let initial_monthly_withdrawal = solve_initial_withdrawal(
        projected_corpus,
        inputs.market_return_rate,
        inputs.inflation_rate,
        inputs.swp_tenure_years,
    )?;
    let projection = simulate(
        projected_corpus,
        initial_monthly_withdrawal,
        inputs.market_return_rate,
        inputs.inflation_rate,
        inputs.swp_tenure_years,
        granularity,
    );

    Ok(PlanOutcome {
        projected_corpus,
        initial_monthly_withdrawal,
        projection,
    })
}
