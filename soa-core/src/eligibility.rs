//! Exception predicates that exempt a request from the cooldown rule.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::clock::{Clock, InboundSignal};
use crate::members::Member;

/// Product code exempt from the cooldown.
pub const IFP_PRODUCT: &str = "IFP";

/// Upper bound (inclusive) of the post-enrollment lookahead.
pub const ENROLLMENT_LOOKAHEAD_DAYS: i64 = 4;

/// True when `end_date` falls on a civil day after today and no more than
/// four days out. Both sides are truncated to their day in `calendar`.
pub fn is_enrollment_ending_within_next_4_days(
    end_date: DateTime<Utc>,
    clock: &impl Clock,
    calendar: Tz,
) -> bool {
    let today = clock.now().with_timezone(&calendar).date_naive();
    let end_day = end_date.with_timezone(&calendar).date_naive();
    let days_out = (end_day - today).num_days();
    days_out > 0 && days_out <= ENROLLMENT_LOOKAHEAD_DAYS
}

/// Any member with a campaign whose post-enrollment start lands in the lookahead.
pub fn has_post_enrollment_date_exception(
    members: &[Member],
    clock: &impl Clock,
    calendar: Tz,
) -> bool {
    members.iter().any(|member| {
        member.campaigns.iter().any(|campaign| {
            campaign
                .post_enrollment_start_date
                .is_some_and(|start| is_enrollment_ending_within_next_4_days(start, clock, calendar))
        })
    })
}

pub fn is_inbound_exception(signal: &impl InboundSignal) -> bool {
    signal.is_inbound()
}

pub fn is_ifp_exception(product_type: Option<&str>) -> bool {
    product_type == Some(IFP_PRODUCT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{FixedClock, NoInboundSignal, StaticInbound};
    use crate::members::Campaign;
    use chrono::TimeZone;

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2024, 9, 9, 15, 0, 0).unwrap())
    }

    fn day(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, d, h, 0, 0).unwrap()
    }

    #[test]
    fn lookahead_bounds() {
        let c = clock();
        assert!(!is_enrollment_ending_within_next_4_days(day(9, 23), &c, chrono_tz::UTC));
        assert!(is_enrollment_ending_within_next_4_days(day(10, 0), &c, chrono_tz::UTC));
        assert!(is_enrollment_ending_within_next_4_days(day(13, 23), &c, chrono_tz::UTC));
        assert!(!is_enrollment_ending_within_next_4_days(day(14, 0), &c, chrono_tz::UTC));
        assert!(!is_enrollment_ending_within_next_4_days(day(1, 0), &c, chrono_tz::UTC));
    }

    #[test]
    fn lookahead_days_follow_calendar_zone() {
        // 2024-09-14 03:00Z is still the 13th in Denver: four days out, not five.
        let c = clock();
        assert!(!is_enrollment_ending_within_next_4_days(day(14, 3), &c, chrono_tz::UTC));
        assert!(is_enrollment_ending_within_next_4_days(
            day(14, 3),
            &c,
            chrono_tz::America::Denver
        ));
    }

    #[test]
    fn post_enrollment_exception_needs_one_match() {
        let c = clock();
        let far = Member::new("far").with_campaign(Campaign {
            name: None,
            post_enrollment_start_date: Some(day(25, 0)),
        });
        let none = Member::new("none").with_campaign(Campaign::default());
        assert!(!has_post_enrollment_date_exception(&[far.clone(), none.clone()], &c, chrono_tz::UTC));

        let near = Member::new("near").with_campaign(Campaign {
            name: Some("SEP".to_string()),
            post_enrollment_start_date: Some(day(11, 0)),
        });
        assert!(has_post_enrollment_date_exception(&[far, none, near], &c, chrono_tz::UTC));
        assert!(!has_post_enrollment_date_exception(&[], &c, chrono_tz::UTC));
    }

    #[test]
    fn ifp_requires_exact_code() {
        assert!(is_ifp_exception(Some("IFP")));
        assert!(!is_ifp_exception(Some("ifp")));
        assert!(!is_ifp_exception(Some("MAPD")));
        assert!(!is_ifp_exception(None));
    }

    #[test]
    fn inbound_delegates_to_signal() {
        assert!(!is_inbound_exception(&NoInboundSignal));
        assert!(is_inbound_exception(&StaticInbound(true)));
    }
}
