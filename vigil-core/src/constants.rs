/// Prefix shared by every reminder identifier vigil owns in a gateway.
pub const REMINDER_NAMESPACE: &str = "vigil.rule.";

/// Seconds a read consumer waits before refreshing when nothing is scheduled.
pub const FALLBACK_REFRESH_SECS: i64 = 60 * 60;

/// Upper bound on candidate dates tried per rule before giving up.
pub const MAX_CANDIDATES: u32 = 1024;

pub const SCHEDULE_FILE: &str = "schedule.json";
pub const REMINDERS_FILE: &str = "reminders.json";
