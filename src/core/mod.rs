mod engine;
mod types;

pub use engine::{accumulate, run_plan, simulate, solve_initial_withdrawal};
pub use types::{
    ChartSeries, Granularity, PlanInputs, PlanOutcome, Projection, ProjectionRow,
};
