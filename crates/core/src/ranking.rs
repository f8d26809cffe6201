//! Group selection ranking policy.
//!
//! Two modes, chosen by whether the caller has the user's location:
//! distance mode (top 5 by great-circle distance, online groups carry
//! no distance and sort last) and day-proximity mode (every group
//! meeting on the nearest upcoming day, plus up to 5 online groups so
//! remote options are always represented).

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::geo::{haversine_meters, Coordinates};
use crate::types::Id;
use crate::weekday::days_until;

/// Maximum number of groups returned by distance ranking, and the cap
/// on blended-in online groups in day-proximity ranking.
pub const MAX_RANKED_GROUPS: usize = 5;

/// Meeting format of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupFormat {
    InPerson,
    Online,
}

impl GroupFormat {
    /// Parse a format string from the database.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s.to_ascii_lowercase().as_str() {
            "in-person" | "in person" => Ok(Self::InPerson),
            "online" => Ok(Self::Online),
            _ => Err(CoreError::Validation(format!(
                "Invalid group format '{s}'. Must be one of: in-person, online"
            ))),
        }
    }

    /// Convert to a database-compatible string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InPerson => "in-person",
            Self::Online => "online",
        }
    }
}

/// The slice of a group record the ranking policy needs.
#[derive(Debug, Clone)]
pub struct GroupCandidate {
    pub id: Id,
    pub format: GroupFormat,
    /// Normalized meeting weekday, 1=Monday..7=Sunday.
    pub meeting_day: Option<u8>,
    pub meeting_time: Option<chrono::NaiveTime>,
    pub coordinates: Option<Coordinates>,
}

/// One ranked entry: the group id plus whichever proximity metric the
/// active mode computed.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedGroup {
    pub id: Id,
    pub distance_meters: Option<f64>,
    pub days_until: Option<u8>,
}

/// Distance mode: sort ascending by great-circle distance from the
/// user, groups without a computable distance (online, or in-person
/// with no coordinates) last, and return at most
/// [`MAX_RANKED_GROUPS`] entries.
pub fn rank_by_distance(groups: &[GroupCandidate], user: Coordinates) -> Vec<RankedGroup> {
    let mut ranked: Vec<RankedGroup> = groups
        .iter()
        .map(|g| {
            let distance = match (g.format, g.coordinates) {
                (GroupFormat::InPerson, Some(site)) => Some(haversine_meters(user, site)),
                _ => None,
            };
            RankedGroup {
                id: g.id,
                distance_meters: distance,
                days_until: None,
            }
        })
        .collect();

    // Nulls-last ascending sort, made explicit rather than left to a
    // backend convention.
    ranked.sort_by(|a, b| match (a.distance_meters, b.distance_meters) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    ranked.truncate(MAX_RANKED_GROUPS);
    ranked
}

/// Day-proximity mode: the "nearest upcoming day" set, blended with the
/// first [`MAX_RANKED_GROUPS`] online groups by the same metric, deduped
/// by id and sorted by (days-until, meeting time) for display.
///
/// `today` is the current weekday in the 1=Monday..7=Sunday domain.
/// Groups with a missing or out-of-domain meeting day rank as 7 days
/// away rather than failing.
pub fn rank_by_day(groups: &[GroupCandidate], today: u8) -> Vec<RankedGroup> {
    if groups.is_empty() {
        return Vec::new();
    }

    let min_days = groups
        .iter()
        .map(|g| days_until(g.meeting_day, today))
        .min()
        .unwrap_or_default();

    let mut union: Vec<&GroupCandidate> = groups
        .iter()
        .filter(|g| days_until(g.meeting_day, today) == min_days)
        .collect();

    let mut online: Vec<&GroupCandidate> = groups
        .iter()
        .filter(|g| g.format == GroupFormat::Online)
        .collect();
    online.sort_by_key(|g| days_until(g.meeting_day, today));

    for candidate in online.into_iter().take(MAX_RANKED_GROUPS) {
        if !union.iter().any(|g| g.id == candidate.id) {
            union.push(candidate);
        }
    }

    union.sort_by(|a, b| {
        let day_ord = days_until(a.meeting_day, today).cmp(&days_until(b.meeting_day, today));
        day_ord.then_with(|| match (a.meeting_time, b.meeting_time) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        })
    });

    union
        .into_iter()
        .map(|g| RankedGroup {
            id: g.id,
            distance_meters: None,
            days_until: Some(days_until(g.meeting_day, today)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use uuid::Uuid;

    fn in_person(lat: f64, lon: f64, day: u8, time: &str) -> GroupCandidate {
        GroupCandidate {
            id: Uuid::new_v4(),
            format: GroupFormat::InPerson,
            meeting_day: Some(day),
            meeting_time: NaiveTime::parse_from_str(time, "%H:%M").ok(),
            coordinates: Some(Coordinates {
                latitude: lat,
                longitude: lon,
            }),
        }
    }

    fn online(day: u8, time: &str) -> GroupCandidate {
        GroupCandidate {
            id: Uuid::new_v4(),
            format: GroupFormat::Online,
            meeting_day: Some(day),
            meeting_time: NaiveTime::parse_from_str(time, "%H:%M").ok(),
            coordinates: None,
        }
    }

    const USER: Coordinates = Coordinates {
        latitude: -33.9249,
        longitude: 18.4241,
    };

    // -- rank_by_distance --

    #[test]
    fn distance_mode_returns_at_most_five() {
        let groups: Vec<_> = (0..8)
            .map(|i| in_person(-33.9249 + f64::from(i) * 0.01, 18.4241, 4, "19:00"))
            .collect();
        let ranked = rank_by_distance(&groups, USER);
        assert_eq!(ranked.len(), 5);
    }

    #[test]
    fn distance_mode_sorts_ascending() {
        let far = in_person(-34.5, 18.4241, 4, "19:00");
        let near = in_person(-33.9250, 18.4241, 4, "19:00");
        let mid = in_person(-34.0, 18.4241, 4, "19:00");
        let ranked = rank_by_distance(&[far.clone(), near.clone(), mid.clone()], USER);

        assert_eq!(ranked[0].id, near.id);
        assert_eq!(ranked[1].id, mid.id);
        assert_eq!(ranked[2].id, far.id);
        let distances: Vec<f64> = ranked.iter().filter_map(|r| r.distance_meters).collect();
        assert!(distances.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn distance_mode_puts_online_groups_last() {
        let remote = online(2, "18:00");
        let venue = in_person(-33.93, 18.43, 4, "19:00");
        let ranked = rank_by_distance(&[remote.clone(), venue.clone()], USER);

        assert_eq!(ranked[0].id, venue.id);
        assert!(ranked[0].distance_meters.is_some());
        assert_eq!(ranked[1].id, remote.id);
        assert!(ranked[1].distance_meters.is_none());
    }

    #[test]
    fn distance_mode_empty_input_is_empty_output() {
        assert!(rank_by_distance(&[], USER).is_empty());
    }

    // -- rank_by_day --

    #[test]
    fn day_mode_empty_input_is_empty_output() {
        assert!(rank_by_day(&[], 4).is_empty());
    }

    #[test]
    fn day_mode_nonempty_input_is_nonempty_output() {
        let groups = vec![in_person(-33.9, 18.4, 2, "19:00")];
        assert!(!rank_by_day(&groups, 4).is_empty());
    }

    #[test]
    fn day_mode_contains_every_nearest_day_group() {
        // Today is Thursday (4); two Thursday groups and one Friday group.
        let thu_a = in_person(-33.9, 18.4, 4, "18:00");
        let thu_b = in_person(-33.8, 18.3, 4, "19:00");
        let fri = in_person(-33.7, 18.2, 5, "19:00");
        let ranked = rank_by_day(&[fri.clone(), thu_a.clone(), thu_b.clone()], 4);

        let ids: Vec<Id> = ranked.iter().map(|r| r.id).collect();
        assert!(ids.contains(&thu_a.id));
        assert!(ids.contains(&thu_b.id));
        assert!(!ids.contains(&fri.id));
    }

    #[test]
    fn day_mode_blends_in_at_most_five_online_groups() {
        let today_group = in_person(-33.9, 18.4, 4, "18:00");
        let online_groups: Vec<_> = (0..7).map(|i| online(1 + (i % 7), "20:00")).collect();

        let mut groups = vec![today_group.clone()];
        groups.extend(online_groups.clone());
        let ranked = rank_by_day(&groups, 4);

        let online_count = ranked
            .iter()
            .filter(|r| online_groups.iter().any(|o| o.id == r.id))
            .count();
        assert!(online_count <= 5);
        assert!(ranked.iter().any(|r| r.id == today_group.id));
    }

    #[test]
    fn day_mode_dedups_online_groups_already_in_nearest_set() {
        // An online group meeting today belongs to both sets.
        let online_today = online(4, "19:00");
        let ranked = rank_by_day(&[online_today.clone()], 4);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, online_today.id);
    }

    #[test]
    fn day_mode_sorts_by_day_then_time() {
        let thu_late = online(4, "20:00");
        let thu_early = online(4, "10:00");
        let sat = online(6, "09:00");
        let ranked = rank_by_day(&[sat.clone(), thu_late.clone(), thu_early.clone()], 4);

        assert_eq!(ranked[0].id, thu_early.id);
        assert_eq!(ranked[1].id, thu_late.id);
        assert_eq!(ranked[2].id, sat.id);
        assert_eq!(ranked[0].days_until, Some(0));
        assert_eq!(ranked[2].days_until, Some(2));
    }

    #[test]
    fn day_mode_is_idempotent() {
        let groups = vec![
            in_person(-33.9, 18.4, 4, "18:00"),
            online(5, "19:00"),
            online(4, "20:00"),
        ];
        let first = rank_by_day(&groups, 3);
        let second = rank_by_day(&groups, 3);
        assert_eq!(first, second);
    }

    #[test]
    fn day_mode_pushes_unparseable_day_to_the_end() {
        let no_day = GroupCandidate {
            meeting_day: None,
            ..in_person(-33.9, 18.4, 4, "18:00")
        };
        let tomorrow = in_person(-33.8, 18.3, 5, "19:00");
        let ranked = rank_by_day(&[no_day.clone(), tomorrow.clone()], 4);

        // The unknown-day group is 7 days away, so tomorrow's group is
        // the nearest-day set; the unknown one is excluded entirely
        // (it is neither nearest-day nor online).
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, tomorrow.id);
    }

    // -- GroupFormat --

    #[test]
    fn format_parses_db_strings() {
        assert_eq!(
            GroupFormat::from_str_db("in-person").unwrap(),
            GroupFormat::InPerson
        );
        assert_eq!(
            GroupFormat::from_str_db("Online").unwrap(),
            GroupFormat::Online
        );
        assert!(GroupFormat::from_str_db("hybrid").is_err());
    }

    #[test]
    fn format_as_str_roundtrip() {
        for format in [GroupFormat::InPerson, GroupFormat::Online] {
            assert_eq!(GroupFormat::from_str_db(format.as_str()).unwrap(), format);
        }
    }
}
