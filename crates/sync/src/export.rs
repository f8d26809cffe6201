//! Export DTOs handed to the external mirror.

use register_core::orientation::Consents;
use register_core::types::Date;

/// One attendance row for the external meeting register.
#[derive(Debug, Clone, Default)]
pub struct AttendanceExport {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<Date>,
    pub ethnicity: Option<String>,
    pub reason_for_attending: Option<String>,
    pub email: Option<String>,
    /// Member reference: the member's external row id when known,
    /// otherwise its local id.
    pub member_ref: String,
    /// Group reference, same convention.
    pub group_ref: String,
    pub attendance_date: Date,
}

/// A completed orientation bundle for the external mirror.
#[derive(Debug, Clone, Default)]
pub struct OrientationExport {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<Date>,
    pub gender: Option<String>,
    pub ethnicity: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub emergency_contact_email: Option<String>,
    pub reason_for_attending: Option<String>,
    pub source_of_discovery: Option<String>,
    pub problematic_substances: Option<String>,
    pub problematic_substances_other: Option<String>,
    pub currently_in_treatment: Option<String>,
    pub current_treatment_programme: Option<String>,
    pub previous_treatment: Option<String>,
    pub previous_treatment_programmes: Option<String>,
    pub previous_recovery_groups: Option<String>,
    pub previous_recovery_groups_names: Option<String>,
    pub goals_for_attending: Option<String>,
    pub goals_for_attending_other: Option<String>,
    pub anything_else_important: Option<String>,
    pub how_else_help: Option<String>,
    pub consents: Consents,
    /// Group reference: external row id when known, local id otherwise.
    pub group_ref: String,
    pub attendance_date: Date,
}

impl OrientationExport {
    /// "First Last" with missing halves dropped.
    pub fn full_name(&self) -> String {
        join_name(self.first_name.as_deref(), self.last_name.as_deref())
    }

    /// Substances answer with the free-text "Other" detail folded in.
    pub fn substances_combined(&self) -> String {
        join_comma(
            self.problematic_substances.as_deref(),
            self.problematic_substances_other.as_deref(),
        )
    }

    /// Goals answer with the free-text "Other" detail folded in.
    pub fn goals_combined(&self) -> String {
        join_comma(
            self.goals_for_attending.as_deref(),
            self.goals_for_attending_other.as_deref(),
        )
    }
}

impl AttendanceExport {
    pub fn full_name(&self) -> String {
        join_name(self.first_name.as_deref(), self.last_name.as_deref())
    }
}

fn join_name(first: Option<&str>, last: Option<&str>) -> String {
    format!("{} {}", first.unwrap_or(""), last.unwrap_or(""))
        .trim()
        .to_string()
}

fn join_comma(a: Option<&str>, b: Option<&str>) -> String {
    [a, b]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_trims_missing_halves() {
        let export = AttendanceExport {
            first_name: Some("Thando".to_string()),
            ..Default::default()
        };
        assert_eq!(export.full_name(), "Thando");
    }

    #[test]
    fn substances_fold_in_other_detail() {
        let export = OrientationExport {
            problematic_substances: Some("Other".to_string()),
            problematic_substances_other: Some("Gambling".to_string()),
            ..Default::default()
        };
        assert_eq!(export.substances_combined(), "Other, Gambling");
    }

    #[test]
    fn combined_answer_skips_empty_parts() {
        let export = OrientationExport {
            goals_for_attending: Some("Sobriety".to_string()),
            ..Default::default()
        };
        assert_eq!(export.goals_combined(), "Sobriety");
    }
}
