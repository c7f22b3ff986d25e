use serde::{Deserialize, Serialize};
use std::{
    fmt::{self, Display},
    str::FromStr,
};

use crate::error::Error;

/// A step of the new-student onboarding journey.
///
/// Every step is tracked under its own event name, see
/// [`OnboardingStep::event_name`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    AccountCreated,
    ProfileCompleted,
    ProgramSelected,
    FirstLogin,
    MycampusLogin,
    CourseEnrollment,
    CourseSelection,
    ProfileSetup,
}

impl OnboardingStep {
    /// All steps in journey order.
    pub const ALL: [OnboardingStep; 8] = [
        OnboardingStep::AccountCreated,
        OnboardingStep::ProfileCompleted,
        OnboardingStep::ProgramSelected,
        OnboardingStep::FirstLogin,
        OnboardingStep::MycampusLogin,
        OnboardingStep::CourseEnrollment,
        OnboardingStep::CourseSelection,
        OnboardingStep::ProfileSetup,
    ];

    /// Returns the step identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            OnboardingStep::AccountCreated => "account_created",
            OnboardingStep::ProfileCompleted => "profile_completed",
            OnboardingStep::ProgramSelected => "program_selected",
            OnboardingStep::FirstLogin => "first_login",
            OnboardingStep::MycampusLogin => "mycampus_login",
            OnboardingStep::CourseEnrollment => "course_enrollment",
            OnboardingStep::CourseSelection => "course_selection",
            OnboardingStep::ProfileSetup => "profile_setup",
        }
    }

    /// Returns the name the step is tracked under.
    pub fn event_name(&self) -> &'static str {
        match self {
            OnboardingStep::AccountCreated => "Account Created",
            OnboardingStep::ProfileCompleted => "Profile Completed",
            OnboardingStep::ProgramSelected => "Program Selected",
            OnboardingStep::FirstLogin => "First Login",
            OnboardingStep::MycampusLogin => "MyCampus Login",
            OnboardingStep::CourseEnrollment => "Course Enrolled",
            OnboardingStep::CourseSelection => "Course Selected",
            OnboardingStep::ProfileSetup => "Profile Setup",
        }
    }
}

impl Display for OnboardingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OnboardingStep {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OnboardingStep::ALL
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| Error::UnknownOnboardingStep(s.to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(OnboardingStep::MycampusLogin.event_name(), "MyCampus Login");
        assert_eq!(OnboardingStep::CourseEnrollment.event_name(), "Course Enrolled");
        assert_eq!(OnboardingStep::CourseSelection.event_name(), "Course Selected");
    }

    #[test]
    fn test_parse_matches_serde() {
        for step in OnboardingStep::ALL {
            let parsed: OnboardingStep = step.as_str().parse().unwrap();
            assert_eq!(parsed, step);
            assert_eq!(
                serde_json::to_value(step).unwrap(),
                serde_json::Value::String(step.as_str().to_string())
            );
        }
    }

    #[test]
    fn test_unknown_step_is_rejected() {
        match "graduation_party".parse::<OnboardingStep>() {
            Err(Error::UnknownOnboardingStep(step)) => assert_eq!(step, "graduation_party"),
            res => panic!("Expected unknown step error, got {:?}", res),
        }
    }
}
