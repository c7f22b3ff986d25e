//! The canonical events of the student journey.
//!
//! You're probably looking for [`Emitter::track`](crate::Emitter::track).
//!
//! # Examples
//! ```
//! use campus_analytics::{events::*, sink::Recorder, Emitter};
//!
//! let recorder = Recorder::default();
//! let mut emitter = Emitter::new(recorder.clone());
//!
//! emitter.track(&ProgramViewed::new("cs_data", "Master of Data Science").with_category("tech"));
//! emitter.track(&OnboardingStepCompleted::new(OnboardingStep::FirstLogin, true));
//!
//! let names: Vec<_> = recorder.calls().iter().filter_map(|call| call.event_name().map(str::to_string)).collect();
//! assert_eq!(names, ["Program Viewed", "First Login"]);
//! ```
mod model;
mod onboarding;

pub use model::*;
pub use onboarding::OnboardingStep;
