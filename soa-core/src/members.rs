//! Member and campaign records as supplied by the enrollment side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::time::parse_instant;

/// Accept any timestamp `parse_instant` does; offset-free text is UTC.
fn deserialize_utc_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|s| parse_instant(&s, chrono_tz::UTC).map_err(serde::de::Error::custom))
        .transpose()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_utc_opt")]
    pub post_enrollment_start_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    #[serde(default)]
    pub id: Option<String>,
    /// When this member's last SOA was recorded.
    #[serde(default, deserialize_with = "deserialize_utc_opt")]
    pub recorded_at_time_utc: Option<DateTime<Utc>>,
    #[serde(default)]
    pub campaigns: Vec<Campaign>,
}

impl Member {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn with_soa(mut self, recorded_at: DateTime<Utc>) -> Self {
        self.recorded_at_time_utc = Some(recorded_at);
        self
    }

    pub fn with_campaign(mut self, campaign: Campaign) -> Self {
        self.campaigns.push(campaign);
        self
    }
}

/// SOA history across the selected members. Members without a record are skipped.
pub fn member_soa_history(members: &[Member]) -> Vec<DateTime<Utc>> {
    members
        .iter()
        .filter_map(|m| m.recorded_at_time_utc)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn history_skips_members_without_soa() {
        let t = Utc.with_ymd_and_hms(2024, 9, 9, 12, 29, 30).unwrap();
        let members = vec![Member::new("a").with_soa(t), Member::new("b")];
        assert_eq!(member_soa_history(&members), vec![t]);
    }

    #[test]
    fn deserializes_upstream_shape() {
        let json = r#"[
            {
                "id": "m-1",
                "recordedAtTimeUtc": "2024-09-09T12:29:30Z",
                "campaigns": [
                    { "name": "AEP", "postEnrollmentStartDate": null },
                    { "postEnrollmentStartDate": "2024-09-12T00:00:00Z" }
                ]
            },
            { "id": "m-2" }
        ]"#;
        let members: Vec<Member> = serde_json::from_str(json).unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].campaigns.len(), 2);
        assert!(members[0].campaigns[0].post_enrollment_start_date.is_none());
        assert!(members[1].campaigns.is_empty());
        assert_eq!(member_soa_history(&members).len(), 1);
    }

    #[test]
    fn accepts_offset_free_timestamps_as_utc() {
        let json = r#"[
            {
                "recordedAtTimeUtc": "2024-09-09 12:29:30.2960503",
                "campaigns": [ { "postEnrollmentStartDate": "2024-09-12" } ]
            }
        ]"#;
        let members: Vec<Member> = serde_json::from_str(json).unwrap();
        assert_eq!(
            members[0].recorded_at_time_utc.unwrap().to_rfc3339(),
            "2024-09-09T12:29:30.296050300+00:00"
        );
        assert_eq!(
            members[0].campaigns[0].post_enrollment_start_date,
            Some(Utc.with_ymd_and_hms(2024, 9, 12, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn rejects_unparseable_timestamp() {
        let json = r#"[{ "recordedAtTimeUtc": "last week" }]"#;
        assert!(serde_json::from_str::<Vec<Member>>(json).is_err());
    }
}
