//! Lifecycle of the unsaved optimized route.
//!
//! ```text
//! Empty -> Computing -> Ready -> CheckingDuplicate -> Unique | Duplicate
//!                                 (any of Ready..Duplicate) -> Saving -> Empty
//! ```
//!
//! Every recompute bumps the [`Generation`]. Asynchronous outcomes carry the
//! generation they were issued under and are dropped when it no longer
//! matches.

use chrono::{DateTime, Utc};
use shared::{DraftRoute, RouteStatus};

use crate::{
    duplicate::DuplicateCheckResult,
    error::{PlannerError, Result},
    provider::RouteResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    fn next(self) -> Self {
        Generation(self.0 + 1)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DraftPhase {
    #[default]
    Empty,
    Computing,
    Ready,
    CheckingDuplicate,
    Unique,
    Duplicate,
    Saving,
}

/// Outcome of feeding an asynchronous result into the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Accepted,
    /// Issued under an older generation; ignored.
    Stale,
    /// Current generation, but the phase does not expect this event.
    Unexpected,
}

#[derive(Debug, Default)]
pub struct DraftRouteState {
    generation: Generation,
    phase: DraftPhase,
    draft: Option<DraftRoute>,
    duplicate: DuplicateCheckResult,
    // phase to return to if the in-flight save fails
    resume: Option<DraftPhase>,
}

impl DraftRouteState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn phase(&self) -> DraftPhase {
        self.phase
    }

    pub fn draft(&self) -> Option<&DraftRoute> {
        self.draft.as_ref()
    }

    pub fn duplicate(&self) -> DuplicateCheckResult {
        self.duplicate
    }

    pub fn has_optimized_route(&self) -> bool {
        self.phase != DraftPhase::Empty
    }

    /// Drop the current draft and open a new generation. Rejected while a
    /// save is in flight.
    pub fn begin_recompute(&mut self) -> Result<Generation> {
        if self.phase == DraftPhase::Saving {
            return Err(PlannerError::SaveInFlight);
        }
        if self.draft.is_some() {
            tracing::debug!(generation = self.generation.0, "draft discarded by recompute");
        }
        self.reset();
        Ok(self.generation)
    }

    pub fn start_computing(&mut self, generation: Generation) -> Applied {
        self.transition(generation, |phase| (phase == DraftPhase::Empty).then_some(DraftPhase::Computing))
    }

    pub fn route_computed(&mut self, generation: Generation, draft: DraftRoute) -> Applied {
        let applied = self.transition(generation, |phase| {
            (phase == DraftPhase::Computing).then_some(DraftPhase::Ready)
        });
        if applied == Applied::Accepted {
            self.draft = Some(draft);
            self.duplicate = DuplicateCheckResult::Unknown;
        }
        applied
    }

    pub fn route_failed(&mut self, generation: Generation) -> Applied {
        self.transition(generation, |phase| (phase == DraftPhase::Computing).then_some(DraftPhase::Empty))
    }

    /// Returns the ids to check when the draft is ready for a verdict.
    pub fn begin_duplicate_check(&mut self, generation: Generation) -> Option<Vec<String>> {
        let applied = self.transition(generation, |phase| {
            (phase == DraftPhase::Ready).then_some(DraftPhase::CheckingDuplicate)
        });
        if applied != Applied::Accepted {
            return None;
        }
        self.draft.as_ref().map(|draft| draft.pick_up_point_ids.clone())
    }

    /// A verdict that lands while saving updates the phase the save would
    /// return to on failure.
    pub fn duplicate_checked(&mut self, generation: Generation, result: DuplicateCheckResult) -> Applied {
        if generation != self.generation {
            return Applied::Stale;
        }
        let verdict_phase = match result {
            DuplicateCheckResult::Unique => DraftPhase::Unique,
            DuplicateCheckResult::Duplicate => DraftPhase::Duplicate,
            DuplicateCheckResult::Unknown => DraftPhase::Ready,
        };
        match self.phase {
            DraftPhase::CheckingDuplicate => self.phase = verdict_phase,
            DraftPhase::Saving if self.resume == Some(DraftPhase::CheckingDuplicate) => {
                self.resume = Some(verdict_phase);
            }
            _ => return Applied::Unexpected,
        }
        self.duplicate = result;
        Applied::Accepted
    }

    /// Hand out the draft to persist. Allowed once a route is ready,
    /// whatever the duplicate verdict.
    pub fn begin_save(&mut self) -> Result<(Generation, DraftRoute)> {
        match self.phase {
            DraftPhase::Saving => return Err(PlannerError::SaveInFlight),
            DraftPhase::Computing => return Err(PlannerError::RecomputeInFlight),
            _ => {}
        }
        let draft = self.draft.clone().ok_or(PlannerError::NoDraft)?;
        self.resume = Some(self.phase);
        self.phase = DraftPhase::Saving;
        Ok((self.generation, draft))
    }

    pub fn save_succeeded(&mut self, generation: Generation) -> Applied {
        if generation != self.generation {
            return Applied::Stale;
        }
        if self.phase != DraftPhase::Saving {
            return Applied::Unexpected;
        }
        self.reset();
        Applied::Accepted
    }

    /// Restore the pre-save phase with the draft intact.
    pub fn save_failed(&mut self, generation: Generation) -> Applied {
        if generation != self.generation {
            return Applied::Stale;
        }
        if self.phase != DraftPhase::Saving {
            return Applied::Unexpected;
        }
        self.phase = self.resume.take().unwrap_or(DraftPhase::Ready);
        Applied::Accepted
    }

    pub fn discard(&mut self) -> Result<()> {
        if self.phase == DraftPhase::Saving {
            return Err(PlannerError::SaveInFlight);
        }
        self.reset();
        Ok(())
    }

    fn reset(&mut self) {
        self.generation = self.generation.next();
        self.phase = DraftPhase::Empty;
        self.draft = None;
        self.duplicate = DuplicateCheckResult::Unknown;
        self.resume = None;
    }

    fn transition(
        &mut self,
        generation: Generation,
        next: impl FnOnce(DraftPhase) -> Option<DraftPhase>,
    ) -> Applied {
        if generation != self.generation {
            return Applied::Stale;
        }
        match next(self.phase) {
            Some(phase) => {
                self.phase = phase;
                Applied::Accepted
            }
            None => Applied::Unexpected,
        }
    }
}

/// Build the draft persisted on save from a provider result.
pub fn draft_from_result(
    result: &RouteResult,
    pick_up_point_ids: Vec<String>,
    route_date: DateTime<Utc>,
) -> DraftRoute {
    DraftRoute {
        route_date,
        total_distance: result.distance_meters,
        total_time: result.time_millis,
        encoded_polyline: result.encoded_polyline.clone(),
        pick_up_point_ids,
        instructions: result.instructions.clone(),
        status: RouteStatus::Planned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_draft() -> DraftRoute {
        let result = RouteResult {
            distance_meters: 4200.0,
            time_millis: 600_000,
            encoded_polyline: "_p~iF~ps|U_ulLnnqC".into(),
            instructions: Vec::new(),
            waypoint_order: None,
        };
        draft_from_result(&result, vec!["p1".into(), "p2".into()], Utc::now())
    }

    fn ready_state() -> (DraftRouteState, Generation) {
        let mut state = DraftRouteState::new();
        let generation = state.begin_recompute().unwrap();
        assert_eq!(state.start_computing(generation), Applied::Accepted);
        assert_eq!(state.route_computed(generation, sample_draft()), Applied::Accepted);
        (state, generation)
    }

    #[test]
    fn starts_empty() {
        let state = DraftRouteState::new();
        assert_eq!(state.phase(), DraftPhase::Empty);
        assert!(!state.has_optimized_route());
        assert!(state.draft().is_none());
    }

    #[test]
    fn full_lifecycle_to_saved() {
        let (mut state, generation) = ready_state();
        assert!(state.has_optimized_route());
        assert_eq!(state.duplicate(), DuplicateCheckResult::Unknown);

        let ids = state.begin_duplicate_check(generation).unwrap();
        assert_eq!(ids, vec!["p1".to_string(), "p2".to_string()]);
        assert_eq!(state.phase(), DraftPhase::CheckingDuplicate);

        assert_eq!(
            state.duplicate_checked(generation, DuplicateCheckResult::Unique),
            Applied::Accepted
        );
        assert_eq!(state.phase(), DraftPhase::Unique);

        let (save_generation, draft) = state.begin_save().unwrap();
        assert_eq!(draft.status, RouteStatus::Planned);
        assert_eq!(state.phase(), DraftPhase::Saving);
        assert_eq!(state.save_succeeded(save_generation), Applied::Accepted);

        assert_eq!(state.phase(), DraftPhase::Empty);
        assert!(state.draft().is_none());
        assert!(state.generation() > generation);
    }

    #[test]
    fn duplicate_verdict_still_allows_save() {
        let (mut state, generation) = ready_state();
        state.begin_duplicate_check(generation);
        state.duplicate_checked(generation, DuplicateCheckResult::Duplicate);
        assert_eq!(state.phase(), DraftPhase::Duplicate);

        let (save_generation, _) = state.begin_save().unwrap();
        assert_eq!(state.save_succeeded(save_generation), Applied::Accepted);
        assert!(!state.has_optimized_route());
    }

    #[test]
    fn unknown_verdict_returns_to_ready() {
        let (mut state, generation) = ready_state();
        state.begin_duplicate_check(generation);
        state.duplicate_checked(generation, DuplicateCheckResult::Unknown);
        assert_eq!(state.phase(), DraftPhase::Ready);
        assert!(state.begin_save().is_ok());
    }

    #[test]
    fn stale_verdict_after_recompute_is_ignored() {
        let (mut state, old) = ready_state();
        state.begin_duplicate_check(old);

        let fresh = state.begin_recompute().unwrap();
        assert_eq!(state.phase(), DraftPhase::Empty);
        assert_eq!(
            state.duplicate_checked(old, DuplicateCheckResult::Duplicate),
            Applied::Stale
        );
        assert_eq!(state.duplicate(), DuplicateCheckResult::Unknown);
        assert_eq!(state.start_computing(fresh), Applied::Accepted);
    }

    #[test]
    fn stale_route_result_is_ignored() {
        let mut state = DraftRouteState::new();
        let old = state.begin_recompute().unwrap();
        state.start_computing(old);
        let fresh = state.begin_recompute().unwrap();
        state.start_computing(fresh);

        assert_eq!(state.route_computed(old, sample_draft()), Applied::Stale);
        assert_eq!(state.phase(), DraftPhase::Computing);
        assert!(state.draft().is_none());
    }

    #[test]
    fn route_failure_returns_to_empty() {
        let mut state = DraftRouteState::new();
        let generation = state.begin_recompute().unwrap();
        state.start_computing(generation);
        assert_eq!(state.route_failed(generation), Applied::Accepted);
        assert_eq!(state.phase(), DraftPhase::Empty);
    }

    #[test]
    fn recompute_during_save_is_rejected() {
        let (mut state, _) = ready_state();
        state.begin_save().unwrap();
        assert!(matches!(state.begin_recompute(), Err(PlannerError::SaveInFlight)));
        assert!(matches!(state.discard(), Err(PlannerError::SaveInFlight)));
        assert!(matches!(state.begin_save(), Err(PlannerError::SaveInFlight)));
        assert!(state.draft().is_some());
    }

    #[test]
    fn save_during_compute_is_rejected() {
        let mut state = DraftRouteState::new();
        let generation = state.begin_recompute().unwrap();
        state.start_computing(generation);
        assert!(matches!(state.begin_save(), Err(PlannerError::RecomputeInFlight)));
        assert_eq!(state.phase(), DraftPhase::Computing);
    }

    #[test]
    fn save_without_draft_is_rejected() {
        let mut state = DraftRouteState::new();
        assert!(matches!(state.begin_save(), Err(PlannerError::NoDraft)));
    }

    #[test]
    fn failed_save_restores_previous_phase() {
        let (mut state, generation) = ready_state();
        state.begin_duplicate_check(generation);
        state.duplicate_checked(generation, DuplicateCheckResult::Duplicate);

        let (save_generation, _) = state.begin_save().unwrap();
        assert_eq!(state.save_failed(save_generation), Applied::Accepted);
        assert_eq!(state.phase(), DraftPhase::Duplicate);
        assert!(state.draft().is_some());
        assert_eq!(state.generation(), generation);
    }

    #[test]
    fn verdict_during_save_updates_resume_phase() {
        let (mut state, generation) = ready_state();
        state.begin_duplicate_check(generation);
        let (save_generation, _) = state.begin_save().unwrap();

        assert_eq!(
            state.duplicate_checked(generation, DuplicateCheckResult::Unique),
            Applied::Accepted
        );
        assert_eq!(state.phase(), DraftPhase::Saving);
        state.save_failed(save_generation);
        assert_eq!(state.phase(), DraftPhase::Unique);
        assert_eq!(state.duplicate(), DuplicateCheckResult::Unique);
    }

    #[test]
    fn out_of_order_events_are_unexpected() {
        let mut state = DraftRouteState::new();
        let generation = state.begin_recompute().unwrap();
        assert_eq!(state.route_computed(generation, sample_draft()), Applied::Unexpected);
        assert!(state.begin_duplicate_check(generation).is_none());
        assert_eq!(state.save_succeeded(generation), Applied::Unexpected);
    }

    #[test]
    fn discard_clears_draft() {
        let (mut state, generation) = ready_state();
        state.discard().unwrap();
        assert!(!state.has_optimized_route());
        assert_eq!(state.route_failed(generation), Applied::Stale);
    }
}
