//! Gate composition: safety overrides first, then the registry.
//!
//! Precedence (first match wins):
//!
//! 1. a [`Bypass`] from the domain classifier (not a target, urgent,
//!    excluded category, busy) → full update, registry untouched;
//! 2. missing clock or registry → full update (fail open);
//! 3. emergency hunger → full update;
//! 4. a protected actor nearby → full update, plus a short fixed deferral
//!    so the entity catches up quickly once the actor moves away;
//! 5. otherwise the registry decides, using the configured interval clamped
//!    to the domain's safe range (or its minimum when food is low).

use crate::constants::{prisoner, wildlife};
use crate::policy::{self, Bypass, Hunger, PawnFacts};
use crate::registry::ThrottleRegistry;
use crate::settings::{PrisonerSettings, WildlifeSettings};
use crate::{EntityId, Tick};

/// Interval rules for one throttled population.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatePolicy {
    pub interval: Tick,
    pub min_interval: Tick,
    pub max_interval: Tick,
    /// Deferral written when a protected actor is nearby.
    pub near_deferral: Tick,
    /// Whether food grading participates in this domain.
    pub hunger_guard: bool,
}

impl GatePolicy {
    pub fn wildlife(settings: &WildlifeSettings) -> Self {
        Self {
            interval: settings.interval_ticks,
            min_interval: wildlife::MIN_INTERVAL,
            max_interval: wildlife::MAX_INTERVAL,
            near_deferral: wildlife::NEAR_COLONIST_DEFERRAL,
            hunger_guard: true,
        }
    }

    pub fn prisoners(settings: &PrisonerSettings) -> Self {
        Self {
            interval: settings.interval_ticks,
            min_interval: prisoner::MIN_INTERVAL,
            max_interval: prisoner::MAX_INTERVAL,
            near_deferral: prisoner::NEAR_COLONIST_DEFERRAL,
            hunger_guard: false,
        }
    }

    /// Configured interval clamped to the safe range, or the minimum when
    /// food is low.
    pub fn effective_interval(&self, hunger: Hunger) -> Tick {
        if self.hunger_guard && hunger == Hunger::Low {
            return self.min_interval;
        }
        self.interval.clamp(self.min_interval, self.max_interval)
    }
}

/// Outcome of one gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Run the full update.
    Proceed(ProceedReason),
    /// Skip the full update this tick.
    Skip,
}

/// Why the full update runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProceedReason {
    Disabled,
    Override(Bypass),
    /// No clock or no registry; fail open.
    MissingCollaborator,
    Starving,
    NearProtected,
    /// The registry allowed it; a full-interval deferral was recorded.
    Eligible,
}

impl GateDecision {
    pub fn runs_full_update(self) -> bool {
        matches!(self, Self::Proceed(_))
    }

    /// True when the decision came from the registry rather than an
    /// override, i.e. the entity is currently being throttled.
    pub fn is_throttled(self) -> bool {
        matches!(
            self,
            Self::Skip | Self::Proceed(ProceedReason::Eligible | ProceedReason::NearProtected)
        )
    }
}

/// Compose overrides and registry for one entity on one tick.
///
/// `near_protected` is only evaluated once every cheaper check has passed.
pub fn gate<F>(
    registry: Option<&mut ThrottleRegistry>,
    now: Option<Tick>,
    id: EntityId,
    bypass: Option<Bypass>,
    hunger: Hunger,
    policy: &GatePolicy,
    near_protected: F,
) -> GateDecision
where
    F: FnOnce() -> bool,
{
    if let Some(reason) = bypass {
        return GateDecision::Proceed(ProceedReason::Override(reason));
    }

    let (Some(registry), Some(now)) = (registry, now) else {
        return GateDecision::Proceed(ProceedReason::MissingCollaborator);
    };

    if policy.hunger_guard && hunger == Hunger::Emergency {
        return GateDecision::Proceed(ProceedReason::Starving);
    }

    let interval = policy.effective_interval(hunger);

    if near_protected() {
        registry.record_deferral(id, now, policy.near_deferral);
        return GateDecision::Proceed(ProceedReason::NearProtected);
    }

    let _ = registry.maintain(now);
    if !registry.can_proceed(id, now) {
        return GateDecision::Skip;
    }
    registry.record_deferral(id, now, interval);
    GateDecision::Proceed(ProceedReason::Eligible)
}

/// Wildlife gate: decides whether a factionless animal runs `Pawn.Tick`.
///
/// `near_colonists` receives the configured radius and is only called when
/// the proximity exclusion is enabled.
pub fn gate_wildlife<F>(
    registry: Option<&mut ThrottleRegistry>,
    now: Option<Tick>,
    pawn: &PawnFacts,
    settings: &WildlifeSettings,
    near_colonists: F,
) -> GateDecision
where
    F: FnOnce(i32) -> bool,
{
    if !settings.enabled {
        return GateDecision::Proceed(ProceedReason::Disabled);
    }
    let bypass = policy::wildlife_bypass(pawn, settings);
    let hunger = Hunger::from_food_level(pawn.food);
    let policy = GatePolicy::wildlife(settings);
    let radius = settings.near_colonist_radius;
    let check_near = settings.exclude_near_colonists && radius > 0;

    gate(registry, now, pawn.id, bypass, hunger, &policy, || {
        check_near && near_colonists(radius)
    })
}

/// Prisoner gate, same shape as [`gate_wildlife`].
pub fn gate_prisoner<F>(
    registry: Option<&mut ThrottleRegistry>,
    now: Option<Tick>,
    pawn: &PawnFacts,
    settings: &PrisonerSettings,
    near_colonists: F,
) -> GateDecision
where
    F: FnOnce(i32) -> bool,
{
    if !settings.enabled {
        return GateDecision::Proceed(ProceedReason::Disabled);
    }
    let bypass = policy::prisoner_bypass(pawn, settings);
    let policy = GatePolicy::prisoners(settings);
    let radius = settings.near_colonist_radius;
    let check_near = settings.exclude_near_colonists && radius > 0;

    let decision = gate(registry, now, pawn.id, bypass, Hunger::Fed, &policy, || {
        check_near && near_colonists(radius)
    });
    if settings.verbose_logging && decision == GateDecision::Skip {
        log::debug!("prisoner {} tick skipped (throttled)", pawn.id);
    }
    decision
}
