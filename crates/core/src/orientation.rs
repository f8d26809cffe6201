//! Orientation questionnaire step machine.
//!
//! A linear chain of named steps with skip-branches: five steps are
//! only visible when a controlling earlier answer enables them. Each
//! step persists immediately (progressive save) according to a static
//! routing table mapping the step to its target tables, so an unknown
//! step is unrepresentable rather than a runtime branch miss. The
//! single terminal step is `consents`.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// Every step in the orientation flow, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Step {
    FirstName,
    LastName,
    Phone,
    DateOfBirth,
    Gender,
    Ethnicity,
    ReasonForAttending,
    EmergencyContactName,
    EmergencyContactPhone,
    EmergencyContactEmail,
    SourceOfDiscovery,
    ProblematicSubstances,
    ProblematicSubstancesOther,
    CurrentlyInTreatment,
    CurrentTreatmentProgramme,
    PreviousTreatment,
    PreviousTreatmentProgrammes,
    PreviousRecoveryGroups,
    PreviousRecoveryGroupsNames,
    GoalsForAttending,
    GoalsForAttendingOther,
    AnythingElseImportant,
    HowElseHelp,
    Consents,
}

/// Canonical step order, including conditionally-visible steps.
pub const ALL_STEPS: [Step; 24] = [
    Step::FirstName,
    Step::LastName,
    Step::Phone,
    Step::DateOfBirth,
    Step::Gender,
    Step::Ethnicity,
    Step::ReasonForAttending,
    Step::EmergencyContactName,
    Step::EmergencyContactPhone,
    Step::EmergencyContactEmail,
    Step::SourceOfDiscovery,
    Step::ProblematicSubstances,
    Step::ProblematicSubstancesOther,
    Step::CurrentlyInTreatment,
    Step::CurrentTreatmentProgramme,
    Step::PreviousTreatment,
    Step::PreviousTreatmentProgrammes,
    Step::PreviousRecoveryGroups,
    Step::PreviousRecoveryGroupsNames,
    Step::GoalsForAttending,
    Step::GoalsForAttendingOther,
    Step::AnythingElseImportant,
    Step::HowElseHelp,
    Step::Consents,
];

impl Step {
    /// Parse the wire name (camelCase, as submitted by the client).
    pub fn from_wire(s: &str) -> Result<Self, CoreError> {
        serde_json::from_value(serde_json::Value::String(s.to_string()))
            .map_err(|_| CoreError::Validation(format!("Unknown step: {s}")))
    }

    /// The wire name (camelCase).
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::Phone => "phone",
            Self::DateOfBirth => "dateOfBirth",
            Self::Gender => "gender",
            Self::Ethnicity => "ethnicity",
            Self::ReasonForAttending => "reasonForAttending",
            Self::EmergencyContactName => "emergencyContactName",
            Self::EmergencyContactPhone => "emergencyContactPhone",
            Self::EmergencyContactEmail => "emergencyContactEmail",
            Self::SourceOfDiscovery => "sourceOfDiscovery",
            Self::ProblematicSubstances => "problematicSubstances",
            Self::ProblematicSubstancesOther => "problematicSubstancesOther",
            Self::CurrentlyInTreatment => "currentlyInTreatment",
            Self::CurrentTreatmentProgramme => "currentTreatmentProgramme",
            Self::PreviousTreatment => "previousTreatment",
            Self::PreviousTreatmentProgrammes => "previousTreatmentProgrammes",
            Self::PreviousRecoveryGroups => "previousRecoveryGroups",
            Self::PreviousRecoveryGroupsNames => "previousRecoveryGroupsNames",
            Self::GoalsForAttending => "goalsForAttending",
            Self::GoalsForAttendingOther => "goalsForAttendingOther",
            Self::AnythingElseImportant => "anythingElseImportant",
            Self::HowElseHelp => "howElseHelp",
            Self::Consents => "consents",
        }
    }

    /// The snake_case column this step's answer lands in. Every target
    /// table that mirrors the field uses the same column name.
    ///
    /// `consents` fans out to five columns and is handled separately.
    pub fn column(&self) -> &'static str {
        match self {
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::Phone => "phone",
            Self::DateOfBirth => "date_of_birth",
            Self::Gender => "gender",
            Self::Ethnicity => "ethnicity",
            Self::ReasonForAttending => "reason_for_attending",
            Self::EmergencyContactName => "emergency_contact_name",
            Self::EmergencyContactPhone => "emergency_contact_phone",
            Self::EmergencyContactEmail => "emergency_contact_email",
            Self::SourceOfDiscovery => "source_of_discovery",
            Self::ProblematicSubstances => "problematic_substances",
            Self::ProblematicSubstancesOther => "problematic_substances_other",
            Self::CurrentlyInTreatment => "currently_in_treatment",
            Self::CurrentTreatmentProgramme => "current_treatment_programme",
            Self::PreviousTreatment => "previous_treatment",
            Self::PreviousTreatmentProgrammes => "previous_treatment_programmes",
            Self::PreviousRecoveryGroups => "previous_recovery_groups",
            Self::PreviousRecoveryGroupsNames => "previous_recovery_groups_names",
            Self::GoalsForAttending => "goals_for_attending",
            Self::GoalsForAttendingOther => "goals_for_attending_other",
            Self::AnythingElseImportant => "anything_else_important",
            Self::HowElseHelp => "how_else_help",
            Self::Consents => "consents",
        }
    }
}

// ---------------------------------------------------------------------------
// Field -> table routing
// ---------------------------------------------------------------------------

/// A table an orientation step writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Member,
    OrientationDetails,
    Attendance,
}

impl Step {
    /// Static routing table: which tables this step's fields land in.
    ///
    /// The first target is the required write -- its failure aborts the
    /// step. The remaining targets are best-effort mirrors whose
    /// failures are logged and swallowed.
    pub fn targets(&self) -> &'static [Target] {
        use Target::*;
        match self {
            Self::FirstName | Self::LastName => &[Member, Attendance],
            Self::Phone => &[Member, OrientationDetails, Attendance],
            Self::DateOfBirth | Self::Gender | Self::Ethnicity | Self::ReasonForAttending => {
                &[Member, OrientationDetails, Attendance]
            }
            Self::EmergencyContactName
            | Self::EmergencyContactPhone
            | Self::EmergencyContactEmail
            | Self::SourceOfDiscovery
            | Self::ProblematicSubstances
            | Self::ProblematicSubstancesOther
            | Self::CurrentlyInTreatment
            | Self::CurrentTreatmentProgramme
            | Self::PreviousTreatment
            | Self::PreviousTreatmentProgrammes
            | Self::PreviousRecoveryGroups
            | Self::PreviousRecoveryGroupsNames
            | Self::GoalsForAttending
            | Self::GoalsForAttendingOther
            | Self::AnythingElseImportant
            | Self::HowElseHelp => &[OrientationDetails],
            // Consents write orientation details, then flip the
            // member's orientation_complete flag; both are required.
            Self::Consents => &[OrientationDetails, Member],
        }
    }

    /// The write whose failure aborts the step.
    pub fn required_target(&self) -> Target {
        self.targets()[0]
    }
}

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

/// The answers that control conditional step visibility.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityAnswers {
    pub problematic_substances: Option<String>,
    pub currently_in_treatment: Option<String>,
    pub previous_treatment: Option<String>,
    pub previous_recovery_groups: Option<String>,
    pub goals_for_attending: Option<String>,
}

fn answered(answer: &Option<String>, value: &str) -> bool {
    answer.as_deref() == Some(value)
}

impl Step {
    /// Whether this step is shown given the current answers.
    pub fn is_visible(&self, answers: &VisibilityAnswers) -> bool {
        match self {
            Self::ProblematicSubstancesOther => {
                answered(&answers.problematic_substances, "Other")
            }
            Self::CurrentTreatmentProgramme => answered(&answers.currently_in_treatment, "Yes"),
            Self::PreviousTreatmentProgrammes => answered(&answers.previous_treatment, "Yes"),
            Self::PreviousRecoveryGroupsNames => {
                answered(&answers.previous_recovery_groups, "Yes")
            }
            Self::GoalsForAttendingOther => answered(&answers.goals_for_attending, "Other"),
            _ => true,
        }
    }
}

/// The ordered list of steps visible under the given answers.
pub fn visible_steps(answers: &VisibilityAnswers) -> Vec<Step> {
    ALL_STEPS
        .iter()
        .copied()
        .filter(|s| s.is_visible(answers))
        .collect()
}

/// The next visible step after `current`, skipping steps whose
/// predicate is false. `None` once `current` is the terminal step.
pub fn next_step(current: Step, answers: &VisibilityAnswers) -> Option<Step> {
    let position = ALL_STEPS.iter().position(|s| *s == current)?;
    ALL_STEPS[position + 1..]
        .iter()
        .copied()
        .find(|s| s.is_visible(answers))
}

/// The previous visible step before `current`, symmetric with
/// [`next_step`]. `None` at the first step.
pub fn previous_step(current: Step, answers: &VisibilityAnswers) -> Option<Step> {
    let position = ALL_STEPS.iter().position(|s| *s == current)?;
    ALL_STEPS[..position]
        .iter()
        .copied()
        .rev()
        .find(|s| s.is_visible(answers))
}

// ---------------------------------------------------------------------------
// Consents
// ---------------------------------------------------------------------------

/// The five mandatory consent flags collected at the terminal step.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consents {
    #[serde(default)]
    pub consent_whatsapp: bool,
    #[serde(default)]
    pub consent_confidentiality: bool,
    #[serde(default)]
    pub consent_anonymity: bool,
    #[serde(default)]
    pub consent_liability: bool,
    #[serde(default)]
    pub consent_voluntary: bool,
}

impl Consents {
    /// Orientation can only complete once every consent is accepted.
    pub fn validate_all_accepted(&self) -> Result<(), CoreError> {
        let missing: Vec<&str> = [
            ("consentWhatsapp", self.consent_whatsapp),
            ("consentConfidentiality", self.consent_confidentiality),
            ("consentAnonymity", self.consent_anonymity),
            ("consentLiability", self.consent_liability),
            ("consentVoluntary", self.consent_voluntary),
        ]
        .iter()
        .filter(|(_, accepted)| !accepted)
        .map(|(name, _)| *name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation(format!(
                "All consents must be accepted; missing: {}",
                missing.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers() -> VisibilityAnswers {
        VisibilityAnswers::default()
    }

    // -- wire names --

    #[test]
    fn wire_name_roundtrip() {
        for step in ALL_STEPS {
            assert_eq!(Step::from_wire(step.as_wire()).unwrap(), step);
        }
    }

    #[test]
    fn unknown_wire_name_is_rejected() {
        assert!(Step::from_wire("favouriteColour").is_err());
        assert!(Step::from_wire("").is_err());
    }

    // -- routing table --

    #[test]
    fn every_step_has_at_least_one_target() {
        for step in ALL_STEPS {
            assert!(!step.targets().is_empty(), "{step:?} routes nowhere");
        }
    }

    #[test]
    fn profile_steps_fan_out_to_member_first() {
        assert_eq!(Step::FirstName.required_target(), Target::Member);
        assert_eq!(Step::Phone.required_target(), Target::Member);
        assert!(Step::Phone.targets().contains(&Target::OrientationDetails));
        assert!(Step::Phone.targets().contains(&Target::Attendance));
    }

    #[test]
    fn questionnaire_steps_write_orientation_details_only() {
        assert_eq!(
            Step::SourceOfDiscovery.targets(),
            &[Target::OrientationDetails]
        );
        assert_eq!(
            Step::AnythingElseImportant.required_target(),
            Target::OrientationDetails
        );
    }

    // -- visibility --

    #[test]
    fn default_answers_hide_all_conditional_steps() {
        let steps = visible_steps(&answers());
        assert_eq!(steps.len(), 19);
        assert!(!steps.contains(&Step::ProblematicSubstancesOther));
        assert!(!steps.contains(&Step::CurrentTreatmentProgramme));
        assert!(!steps.contains(&Step::PreviousTreatmentProgrammes));
        assert!(!steps.contains(&Step::PreviousRecoveryGroupsNames));
        assert!(!steps.contains(&Step::GoalsForAttendingOther));
    }

    #[test]
    fn other_substances_reveals_followup() {
        let mut a = answers();
        a.problematic_substances = Some("Other".to_string());
        assert!(visible_steps(&a).contains(&Step::ProblematicSubstancesOther));
    }

    #[test]
    fn non_other_substances_skips_followup_forward() {
        let mut a = answers();
        a.problematic_substances = Some("Alcohol".to_string());
        assert_eq!(
            next_step(Step::ProblematicSubstances, &a),
            Some(Step::CurrentlyInTreatment)
        );
    }

    #[test]
    fn other_substances_enters_followup_forward() {
        let mut a = answers();
        a.problematic_substances = Some("Other".to_string());
        assert_eq!(
            next_step(Step::ProblematicSubstances, &a),
            Some(Step::ProblematicSubstancesOther)
        );
        assert_eq!(
            next_step(Step::ProblematicSubstancesOther, &a),
            Some(Step::CurrentlyInTreatment)
        );
    }

    #[test]
    fn skip_is_symmetric_backwards() {
        let mut a = answers();
        a.problematic_substances = Some("Alcohol".to_string());
        assert_eq!(
            previous_step(Step::CurrentlyInTreatment, &a),
            Some(Step::ProblematicSubstances)
        );

        a.problematic_substances = Some("Other".to_string());
        assert_eq!(
            previous_step(Step::CurrentlyInTreatment, &a),
            Some(Step::ProblematicSubstancesOther)
        );
    }

    #[test]
    fn treatment_yes_reveals_programme_step() {
        let mut a = answers();
        a.currently_in_treatment = Some("Yes".to_string());
        assert_eq!(
            next_step(Step::CurrentlyInTreatment, &a),
            Some(Step::CurrentTreatmentProgramme)
        );

        a.currently_in_treatment = Some("No".to_string());
        assert_eq!(
            next_step(Step::CurrentlyInTreatment, &a),
            Some(Step::PreviousTreatment)
        );
    }

    #[test]
    fn consents_is_terminal() {
        assert_eq!(next_step(Step::Consents, &answers()), None);
    }

    #[test]
    fn first_step_has_no_predecessor() {
        assert_eq!(previous_step(Step::FirstName, &answers()), None);
    }

    #[test]
    fn full_walk_visits_every_visible_step_once() {
        let mut a = answers();
        a.previous_treatment = Some("Yes".to_string());

        let expected = visible_steps(&a);
        let mut walked = vec![Step::FirstName];
        while let Some(next) = next_step(*walked.last().unwrap(), &a) {
            walked.push(next);
        }
        assert_eq!(walked, expected);
    }

    // -- consents --

    #[test]
    fn all_consents_accepted_validates() {
        let consents = Consents {
            consent_whatsapp: true,
            consent_confidentiality: true,
            consent_anonymity: true,
            consent_liability: true,
            consent_voluntary: true,
        };
        assert!(consents.validate_all_accepted().is_ok());
    }

    #[test]
    fn missing_consent_names_the_field() {
        let consents = Consents {
            consent_whatsapp: true,
            consent_confidentiality: true,
            consent_anonymity: true,
            consent_liability: false,
            consent_voluntary: true,
        };
        let err = consents.validate_all_accepted().unwrap_err();
        assert!(err.to_string().contains("consentLiability"));
    }

    #[test]
    fn default_consents_fail_validation() {
        assert!(Consents::default().validate_all_accepted().is_err());
    }
}
