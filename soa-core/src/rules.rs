//! The SOA rule engine: 48-hour cooldown after the latest SOA.
//!
//! Given prior SOA instants and a proposed date, decide whether the cooldown
//! applies and, when it does, compute the earliest allowed date and the
//! adjusted selection:
//!
//! - cooldown end = latest SOA + 48h, moved off weekends, at civil midnight
//! - same civil month as the selection: min = later of cooldown end and now,
//!   selection = later of cooldown end and selection
//! - different month: a selection before the cooldown end snaps to it,
//!   otherwise min = now and the selection stands
//!
//! Post-enrollment, inbound and IFP exceptions each waive the rule.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::{add_48_hours, get_max_date, is_same_month_year};
use crate::clock::{Clock, InboundSignal, NoInboundSignal, SystemClock};
use crate::eligibility::is_inbound_exception;
use crate::time::{reparse_stripped, strip_utc_offset, to_timezone, TARGET_TIMEZONE};

/// Days after the minimum date that remain bookable.
pub const SCHEDULING_WINDOW_DAYS: i64 = 30;

/// How the minimum date leaves the engine once the rule has fired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MinDateResolution {
    /// Return the computed instant unchanged.
    #[default]
    Instant,
    /// Render in the target zone, drop a negative offset and read the civil
    /// text back in the calendar zone. Shifts the instant whenever the two
    /// zones differ; kept for parity with older consumers.
    LegacyLocalReparse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RulePolicy {
    /// Zone the cooldown boundary is rendered in.
    pub target_timezone: Tz,
    /// Zone whose calendar decides weekends, midnights and months.
    pub calendar_timezone: Tz,
    pub min_date_resolution: MinDateResolution,
}

impl Default for RulePolicy {
    fn default() -> Self {
        Self {
            target_timezone: TARGET_TIMEZONE,
            calendar_timezone: chrono_tz::UTC,
            min_date_resolution: MinDateResolution::Instant,
        }
    }
}

/// Input to one evaluation. Serializes with the simulator's payload keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoaRequest {
    #[serde(rename = "soaListUTC")]
    pub soa_history: Vec<DateTime<Utc>>,
    #[serde(rename = "selectedDate")]
    pub selected_date: DateTime<Utc>,
    #[serde(rename = "isPostEnrollException", default)]
    pub is_post_enroll_exception: bool,
    #[serde(rename = "isIFPException", default)]
    pub is_ifp_exception: bool,
    /// Accepted but not consulted by the cooldown rule.
    #[serde(rename = "isOnChangeMonthEvent", default)]
    pub is_on_change_month_event: bool,
    /// Stand-in for "now". `None` reads the engine's clock.
    #[serde(rename = "mockToday", default, skip_serializing_if = "Option::is_none")]
    pub mock_today: Option<DateTime<Utc>>,
}

impl SoaRequest {
    pub fn new(soa_history: Vec<DateTime<Utc>>, selected_date: DateTime<Utc>) -> Self {
        Self {
            soa_history,
            selected_date,
            is_post_enroll_exception: false,
            is_ifp_exception: false,
            is_on_change_month_event: false,
            mock_today: None,
        }
    }

    pub fn with_post_enroll_exception(mut self, on: bool) -> Self {
        self.is_post_enroll_exception = on;
        self
    }

    pub fn with_ifp_exception(mut self, on: bool) -> Self {
        self.is_ifp_exception = on;
        self
    }

    pub fn with_on_change_month_event(mut self, on: bool) -> Self {
        self.is_on_change_month_event = on;
        self
    }

    pub fn with_mock_today(mut self, today: DateTime<Utc>) -> Self {
        self.mock_today = Some(today);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoaResult {
    #[serde(rename = "minDate")]
    pub min_date: DateTime<Utc>,
    #[serde(rename = "selectedDate")]
    pub selected_date: DateTime<Utc>,
    #[serde(rename = "rule48applied")]
    pub rule48_applied: bool,
}

impl SoaResult {
    /// Last bookable instant: the minimum date plus the scheduling window.
    pub fn window_end(&self) -> DateTime<Utc> {
        self.min_date + Duration::days(SCHEDULING_WINDOW_DAYS)
    }
}

/// Rule engine with its clock, call-context signal and policy.
#[derive(Debug, Clone)]
pub struct SoaRuleEngine<C = SystemClock, I = NoInboundSignal> {
    clock: C,
    inbound: I,
    policy: RulePolicy,
}

impl SoaRuleEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for SoaRuleEngine {
    fn default() -> Self {
        Self {
            clock: SystemClock,
            inbound: NoInboundSignal,
            policy: RulePolicy::default(),
        }
    }
}

impl<C: Clock, I: InboundSignal> SoaRuleEngine<C, I> {
    pub fn with_parts(clock: C, inbound: I, policy: RulePolicy) -> Self {
        Self { clock, inbound, policy }
    }

    pub fn with_clock<C2: Clock>(self, clock: C2) -> SoaRuleEngine<C2, I> {
        SoaRuleEngine {
            clock,
            inbound: self.inbound,
            policy: self.policy,
        }
    }

    pub fn with_inbound<I2: InboundSignal>(self, inbound: I2) -> SoaRuleEngine<C, I2> {
        SoaRuleEngine {
            clock: self.clock,
            inbound,
            policy: self.policy,
        }
    }

    pub fn with_policy(mut self, policy: RulePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RulePolicy {
        &self.policy
    }

    /// Evaluate the cooldown rule for one request.
    ///
    /// Only [`MinDateResolution::LegacyLocalReparse`] goes through string
    /// handling. Repeated or skipped local times in the calendar zone still
    /// resolve to an instant.
    pub fn evaluate(&self, req: &SoaRequest) -> Result<SoaResult> {
        let now = req.mock_today.unwrap_or_else(|| self.clock.now());
        let selected = req.selected_date;

        let unchanged = SoaResult {
            min_date: now,
            selected_date: selected,
            rule48_applied: false,
        };

        let Some(max_soa) = get_max_date(&req.soa_history) else {
            debug!("no prior SOA; cooldown not applicable");
            return Ok(unchanged);
        };

        let inbound = is_inbound_exception(&self.inbound);
        if req.is_post_enroll_exception || inbound || req.is_ifp_exception {
            debug!(
                post_enroll = req.is_post_enroll_exception,
                inbound,
                ifp = req.is_ifp_exception,
                "cooldown waived by exception"
            );
            return Ok(unchanged);
        }

        let calendar = self.policy.calendar_timezone;
        let cooldown_end = add_48_hours(&max_soa.with_timezone(&calendar)).with_timezone(&Utc);

        debug!(
            latest_soa = %max_soa,
            cooldown_end = %to_timezone(cooldown_end, self.policy.target_timezone),
            on_change_month = req.is_on_change_month_event,
            "48-hour rule applies"
        );

        let same_month = is_same_month_year(
            &cooldown_end.with_timezone(&calendar),
            &selected.with_timezone(&calendar),
        );

        let (min_date, selected_date) = if same_month {
            let min = if cooldown_end > now { cooldown_end } else { now };
            (min, cooldown_end.max(selected))
        } else if selected < cooldown_end {
            (cooldown_end, cooldown_end)
        } else {
            (now, selected)
        };

        debug!(same_month, %min_date, %selected_date, "cooldown resolved");

        Ok(SoaResult {
            min_date: self.resolve_min_date(min_date)?,
            selected_date,
            rule48_applied: true,
        })
    }

    fn resolve_min_date(&self, min_date: DateTime<Utc>) -> Result<DateTime<Utc>> {
        match self.policy.min_date_resolution {
            MinDateResolution::Instant => Ok(min_date),
            MinDateResolution::LegacyLocalReparse => {
                let rendered = to_timezone(min_date, self.policy.target_timezone);
                let stripped = strip_utc_offset(&rendered)?;
                reparse_stripped(stripped, self.policy.calendar_timezone)
            }
        }
    }
}

/// Evaluate with the system clock and default policy.
///
/// `mock_today = None` means "now".
pub fn get_soa_rules(
    soa_history: &[DateTime<Utc>],
    selected_date: DateTime<Utc>,
    is_post_enroll_exception: bool,
    is_ifp_exception: bool,
    is_on_change_month_event: bool,
    mock_today: Option<DateTime<Utc>>,
) -> Result<SoaResult> {
    let req = SoaRequest {
        soa_history: soa_history.to_vec(),
        selected_date,
        is_post_enroll_exception,
        is_ifp_exception,
        is_on_change_month_event,
        mock_today,
    };
    SoaRuleEngine::new().evaluate(&req)
}
