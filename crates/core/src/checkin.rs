//! Check-in validation policy hooks.
//!
//! The workflow consults two independently pluggable policies before
//! admitting a check-in: a location check (rejects with
//! `OUTSIDE_RADIUS`) and a meeting-day check (rejects with
//! `WRONG_DAY`). Each ships with a permissive implementation matching
//! the historical behavior and an enforcing implementation; the API
//! layer picks per configuration and injects them as trait objects.

use crate::error::{codes, CoreError};
use crate::geo::{haversine_meters, Coordinates};
use crate::ranking::GroupFormat;

/// An in-person check-in is rejected when the user is farther than this
/// from the venue. Enforced at selection-confirmation time, not at
/// listing time.
pub const MAX_CHECKIN_RADIUS_METERS: f64 = 200.0;

/// The slice of a group record the policies need.
#[derive(Debug, Clone, Copy)]
pub struct GroupSite {
    pub format: GroupFormat,
    pub coordinates: Option<Coordinates>,
    /// Normalized meeting weekday, 1=Monday..7=Sunday.
    pub meeting_day: Option<u8>,
}

/// Validates the user's reported location against the group venue.
pub trait LocationPolicy: Send + Sync {
    fn validate(&self, user: Option<Coordinates>, group: &GroupSite) -> Result<(), CoreError>;
}

/// Validates that the group meets on the check-in day.
pub trait DayPolicy: Send + Sync {
    /// `today` is the current weekday in the 1=Monday..7=Sunday domain.
    fn validate(&self, group: &GroupSite, today: u8) -> Result<(), CoreError>;
}

/// Accepts every location. Matches the historical server behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissiveLocationPolicy;

impl LocationPolicy for PermissiveLocationPolicy {
    fn validate(&self, _user: Option<Coordinates>, _group: &GroupSite) -> Result<(), CoreError> {
        Ok(())
    }
}

/// Rejects in-person check-ins farther than `max_meters` from the venue.
///
/// Online groups always pass. When either side lacks coordinates no
/// distance can be computed and the check-in is admitted, matching the
/// listing contract (distance gating only applies where a distance
/// exists).
#[derive(Debug, Clone, Copy)]
pub struct RadiusLocationPolicy {
    pub max_meters: f64,
}

impl Default for RadiusLocationPolicy {
    fn default() -> Self {
        Self {
            max_meters: MAX_CHECKIN_RADIUS_METERS,
        }
    }
}

impl LocationPolicy for RadiusLocationPolicy {
    fn validate(&self, user: Option<Coordinates>, group: &GroupSite) -> Result<(), CoreError> {
        if group.format != GroupFormat::InPerson {
            return Ok(());
        }
        let (user, site) = match (user, group.coordinates) {
            (Some(u), Some(s)) => (u, s),
            _ => return Ok(()),
        };

        let distance = haversine_meters(user, site);
        if distance > self.max_meters {
            return Err(CoreError::Forbidden {
                code: codes::OUTSIDE_RADIUS,
                message: format!(
                    "You are too far away ({distance:.0}m) to sign in. \
                     You must be within {:.0}m.",
                    self.max_meters
                ),
            });
        }
        Ok(())
    }
}

/// Accepts every day. Matches the historical server behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissiveDayPolicy;

impl DayPolicy for PermissiveDayPolicy {
    fn validate(&self, _group: &GroupSite, _today: u8) -> Result<(), CoreError> {
        Ok(())
    }
}

/// Rejects check-ins on days the group does not meet. Groups with no
/// recorded meeting day are admitted.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeetingDayPolicy;

impl DayPolicy for MeetingDayPolicy {
    fn validate(&self, group: &GroupSite, today: u8) -> Result<(), CoreError> {
        match group.meeting_day {
            Some(day) if day != today => Err(CoreError::Forbidden {
                code: codes::WRONG_DAY,
                message: "Group does not meet today".to_string(),
            }),
            _ => Ok(()),
        }
    }
}
