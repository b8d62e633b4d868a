use thiserror::Error;

/// Reasons a configuration is rejected before a run starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("periodsPerDay must be at least 1")]
    NoPeriods,
    #[error("lunchBreakAt ({lunch_break_at}) must not exceed periodsPerDay ({periods_per_day})")]
    LunchOutOfRange {
        lunch_break_at: u32,
        periods_per_day: u32,
    },
    #[error("periodDuration must be at least 1 minute")]
    ZeroPeriodDuration,
    #[error("the last period ends at minute {end_minutes}, past midnight")]
    PastMidnight { end_minutes: u64 },
}
