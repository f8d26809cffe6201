//! Orientation questionnaire entity model.

use serde::Serialize;
use sqlx::FromRow;

use register_core::orientation::{Consents, VisibilityAnswers};
use register_core::types::{Date, Id, Timestamp};

/// A row from the `orientation_details` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrientationDetails {
    pub id: Id,
    pub member_id: Id,
    pub phone: Option<String>,
    pub date_of_birth: Option<Date>,
    pub gender: Option<String>,
    pub ethnicity: Option<String>,
    pub reason_for_attending: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub emergency_contact_email: Option<String>,
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
    pub consent_whatsapp: bool,
    pub consent_confidentiality: bool,
    pub consent_anonymity: bool,
    pub consent_liability: bool,
    pub consent_voluntary: bool,
    pub row_id: Option<String>,
    pub member_row_id: Option<String>,
    pub group_row_id: Option<String>,
    pub created_at: Timestamp,
}

impl OrientationDetails {
    /// The answers controlling conditional step visibility.
    pub fn visibility_answers(&self) -> VisibilityAnswers {
        VisibilityAnswers {
            problematic_substances: self.problematic_substances.clone(),
            currently_in_treatment: self.currently_in_treatment.clone(),
            previous_treatment: self.previous_treatment.clone(),
            previous_recovery_groups: self.previous_recovery_groups.clone(),
            goals_for_attending: self.goals_for_attending.clone(),
        }
    }

    pub fn consents(&self) -> Consents {
        Consents {
            consent_whatsapp: self.consent_whatsapp,
            consent_confidentiality: self.consent_confidentiality,
            consent_anonymity: self.consent_anonymity,
            consent_liability: self.consent_liability,
            consent_voluntary: self.consent_voluntary,
        }
    }
}
