//! `soa evaluate`, `soa simulate` and `soa members`.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use clap::Args;
use serde::Serialize;
use soa_core::{
    has_post_enrollment_date_exception, is_ifp_exception, member_soa_history, parse_instant,
    to_timezone, Clock, FixedClock, Member, RulePolicy, SoaRequest, SoaResult, SoaRuleEngine,
    StaticInbound, SystemClock,
};
use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::state::read_history;

#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Proposed date (RFC 3339, `YYYY-MM-DD HH:MM[:SS]`, or `YYYY-MM-DD`)
    #[arg(long)]
    pub selected: String,

    /// Simulated "today" (defaults to now)
    #[arg(long)]
    pub today: Option<String>,

    /// Prior SOA instant; repeatable. Defaults to the saved session history
    #[arg(long = "soa")]
    pub soa: Vec<String>,

    #[arg(long, default_value_t = false)]
    pub post_enroll_exception: bool,

    #[arg(long, default_value_t = false)]
    pub ifp_exception: bool,

    /// Product code; `IFP` waives the cooldown
    #[arg(long)]
    pub product: Option<String>,

    /// Treat the call as inbound (waives the cooldown)
    #[arg(long, default_value_t = false)]
    pub inbound: bool,

    #[arg(long, default_value_t = false)]
    pub on_change_month: bool,

    /// Render-strip-reparse the minimum date like older consumers expect
    #[arg(long, default_value_t = false)]
    pub legacy_min_date: bool,
}

#[derive(Debug, Serialize)]
struct Rendered {
    #[serde(rename = "minDate")]
    min_date: String,
    #[serde(rename = "selectedDate")]
    selected_date: String,
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    payload: &'a SoaRequest,
    result: &'a SoaResult,
    /// Result dates in the target zone.
    local: Rendered,
    #[serde(rename = "windowEnd", skip_serializing_if = "Option::is_none")]
    window_end: Option<DateTime<Utc>>,
}

impl<'a> Report<'a> {
    fn new(payload: &'a SoaRequest, result: &'a SoaResult, target: Tz) -> Self {
        Self {
            payload,
            result,
            local: Rendered {
                min_date: to_timezone(result.min_date, target),
                selected_date: to_timezone(result.selected_date, target),
            },
            window_end: None,
        }
    }
}

fn policy_for(args: &RequestArgs, cfg: &Config) -> Result<RulePolicy> {
    let mut policy = cfg.rules.to_policy()?;
    if args.legacy_min_date {
        policy.min_date_resolution = soa_core::MinDateResolution::LegacyLocalReparse;
    }
    Ok(policy)
}

fn parse_arg(label: &str, value: &str, calendar: Tz) -> Result<DateTime<Utc>> {
    parse_instant(value, calendar).with_context(|| format!("--{label} {value}"))
}

fn resolve_history(args: &RequestArgs, calendar: Tz) -> Result<Vec<DateTime<Utc>>> {
    if args.soa.is_empty() {
        tracing::debug!("no --soa given; using session history");
        return Ok(read_history(calendar)?.entries);
    }
    args.soa
        .iter()
        .map(|s| parse_arg("soa", s, calendar))
        .collect()
}

/// Build the request from CLI input. `history` overrides `--soa` when given.
fn build_request(
    args: &RequestArgs,
    policy: &RulePolicy,
    history: Option<Vec<DateTime<Utc>>>,
) -> Result<SoaRequest> {
    let calendar = policy.calendar_timezone;
    let history = match history {
        Some(h) => h,
        None => resolve_history(args, calendar)?,
    };
    let selected = parse_arg("selected", &args.selected, calendar)?;
    let today = match &args.today {
        Some(t) => parse_arg("today", t, calendar)?,
        None => SystemClock.now(),
    };
    let ifp = args.ifp_exception || is_ifp_exception(args.product.as_deref());

    Ok(SoaRequest::new(history, selected)
        .with_post_enroll_exception(args.post_enroll_exception)
        .with_ifp_exception(ifp)
        .with_on_change_month_event(args.on_change_month)
        .with_mock_today(today))
}

fn engine_for(args: &RequestArgs, policy: RulePolicy) -> SoaRuleEngine<SystemClock, StaticInbound> {
    SoaRuleEngine::new()
        .with_inbound(StaticInbound(args.inbound))
        .with_policy(policy)
}

pub fn evaluate(args: RequestArgs, cfg: &Config) -> Result<()> {
    let policy = policy_for(&args, cfg)?;
    let req = build_request(&args, &policy, None)?;
    let out = engine_for(&args, policy).evaluate(&req)?;

    tracing::info!(rule48_applied = out.rule48_applied, min_date = %out.min_date, "evaluated");

    let report = Report::new(&req, &out, policy.target_timezone);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[derive(Debug, Serialize)]
struct Step<'a> {
    step: usize,
    #[serde(flatten)]
    report: Report<'a>,
}

/// Run the rule repeatedly, feeding each minimum date back in as "today".
pub fn simulate(args: RequestArgs, steps: Option<usize>, cfg: &Config) -> Result<()> {
    let steps = steps.unwrap_or(cfg.simulation.default_steps);
    if steps == 0 {
        bail!("simulation needs at least one step (--steps or [simulation].default_steps)");
    }
    let policy = policy_for(&args, cfg)?;
    let engine = engine_for(&args, policy);

    let mut req = build_request(&args, &policy, None)?;
    let mut runs: Vec<(SoaRequest, SoaResult)> = Vec::with_capacity(steps);

    for step in 1..=steps {
        let out = engine.evaluate(&req)?;
        tracing::debug!(step, min_date = %out.min_date, "simulation step");
        let next = req.clone().with_mock_today(out.min_date);
        runs.push((req, out));
        req = next;
    }

    let report: Vec<Step<'_>> = runs
        .iter()
        .enumerate()
        .map(|(i, (req, out))| Step {
            step: i + 1,
            report: Report::new(req, out, policy.target_timezone),
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn read_members(path: &Path) -> Result<Vec<Member>> {
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

/// Evaluate against member records: their SOAs form the history and their
/// campaigns decide the post-enrollment exception.
pub fn members(file: &Path, args: RequestArgs, cfg: &Config) -> Result<()> {
    let policy = policy_for(&args, cfg)?;
    let members = read_members(file)?;
    let history = member_soa_history(&members);

    let mut req = build_request(&args, &policy, Some(history))?;
    let today = req.mock_today.unwrap_or_else(|| SystemClock.now());
    let clock = FixedClock(today);
    if has_post_enrollment_date_exception(&members, &clock, policy.calendar_timezone) {
        tracing::info!("post-enrollment start within lookahead; cooldown waived");
        req.is_post_enroll_exception = true;
    }

    let out = engine_for(&args, policy).evaluate(&req)?;

    tracing::info!(
        members = members.len(),
        rule48_applied = out.rule48_applied,
        "evaluated member selection"
    );

    let mut report = Report::new(&req, &out, policy.target_timezone);
    report.window_end = Some(out.window_end());
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn args(selected: &str) -> RequestArgs {
        RequestArgs {
            selected: selected.to_string(),
            today: Some("2024-09-09T00:00:00Z".to_string()),
            soa: vec!["2024-09-09T12:29:30Z".to_string()],
            post_enroll_exception: false,
            ifp_exception: false,
            product: None,
            inbound: false,
            on_change_month: false,
            legacy_min_date: false,
        }
    }

    #[test]
    fn product_code_sets_ifp_flag() {
        let mut a = args("2024-09-10");
        a.product = Some("IFP".to_string());
        let policy = RulePolicy::default();
        let req = build_request(&a, &policy, None).unwrap();
        assert!(req.is_ifp_exception);
    }

    #[test]
    fn explicit_history_overrides_soa_flags() {
        let a = args("2024-09-10");
        let policy = RulePolicy::default();
        let req = build_request(&a, &policy, Some(vec![])).unwrap();
        assert!(req.soa_history.is_empty());
        assert_eq!(req.selected_date, Utc.with_ymd_and_hms(2024, 9, 10, 0, 0, 0).unwrap());
    }

    #[test]
    fn legacy_flag_switches_resolution() {
        let mut a = args("2024-09-10");
        a.legacy_min_date = true;
        let policy = policy_for(&a, &Config::default()).unwrap();
        assert_eq!(
            policy.min_date_resolution,
            soa_core::MinDateResolution::LegacyLocalReparse
        );
    }

    #[test]
    fn report_renders_target_zone() {
        let req = build_request(&args("2024-09-10"), &RulePolicy::default(), None).unwrap();
        let out = SoaRuleEngine::new().evaluate(&req).unwrap();
        let report = Report::new(&req, &out, soa_core::TARGET_TIMEZONE);
        assert_eq!(report.local.min_date, "2024-09-10 18:00:00-06:00");
    }
}
