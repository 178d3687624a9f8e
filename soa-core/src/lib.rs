//! soa-core: Statement of Availability cooldown rules and their date helpers

pub mod calendar;
pub mod clock;
pub mod eligibility;
pub mod members;
pub mod rules;
pub mod time;

pub use calendar::{adjust_to_weekday, add_48_hours, get_max_date, is_same_month_year, COOLDOWN_HOURS};
pub use clock::{Clock, FixedClock, InboundSignal, NoInboundSignal, StaticInbound, SystemClock};
pub use eligibility::{
    has_post_enrollment_date_exception, is_enrollment_ending_within_next_4_days,
    is_ifp_exception, is_inbound_exception, IFP_PRODUCT,
};
pub use members::{member_soa_history, Campaign, Member};
pub use rules::{
    get_soa_rules, MinDateResolution, RulePolicy, SoaRequest, SoaResult, SoaRuleEngine,
    SCHEDULING_WINDOW_DAYS,
};
pub use time::{parse_instant, parse_timezone, to_timezone, TARGET_TIMEZONE};
