//! Natural random quest selection.
//!
//! The host's own chooser validates every root quest on every selection.
//! [`QuestChooser::choose`] instead filters roots by layer, weights them,
//! and validates at most a configured number of weighted draws through
//! [`sampler::try_choose`](crate::sampler::try_choose). When that fails it
//! retries with the other population pool, then tries a small set of
//! ancient-complex quests, and finally hands control back to the host
//! ([`QuestChoice::Vanilla`]).
//!
//! Selection also repairs missing threat points and memoises them in a
//! [`RecentValueCache`], so a generation request that follows within a
//! couple of seconds can reuse them
//! ([`QuestChooser::normalize_generation_points`]).

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::quest::{
    MAX_CHECKS_CEILING, MIN_POINTS, POINTS_FRESH_TICKS, SLOW_SELECTION_MS,
};
use crate::measure::Measure;
use crate::recent::RecentValueCache;
use crate::sampler::{self, ListPool, Validation};
use crate::settings::QuestSettings;
use crate::Tick;

/// Quest definitions tried, in order, before the marker scan.
pub const ANCIENT_COMPLEX_NAMES: [&str; 4] = [
    "OpportunitySite_AncientComplex",
    "OpportunitySite_AncientComplex_Giver",
    "OpportunitySite_AncientComplex_Mechanitor",
    "AncientComplex_Standard",
];

/// Lowercase substring identifying ancient-complex quests by name.
const ANCIENT_COMPLEX_MARKER: &str = "ancientcomplex";

/// A quest script definition as the host describes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestDef {
    pub name: String,
    /// Eligible for natural random selection.
    pub root_random_selected: bool,
    pub increases_population: bool,
    pub can_occur_on_all_layers: bool,
    /// Layer names this quest is explicitly allowed on.
    #[serde(default)]
    pub layer_whitelist: Vec<String>,
}

/// The spatial layer a selection targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerDef {
    pub name: String,
    pub only_whitelisted_quests: bool,
    pub only_whitelisted_incidents: bool,
}

/// Structural layer eligibility. With no layer information a quest passes.
pub fn passes_layer_gate(quest: &QuestDef, layer: Option<&LayerDef>) -> bool {
    let Some(layer) = layer else {
        return true;
    };
    let whitelisted = quest.layer_whitelist.iter().any(|l| *l == layer.name);
    if layer.only_whitelisted_quests && !whitelisted {
        return false;
    }
    if !quest.can_occur_on_all_layers && layer.only_whitelisted_incidents && !whitelisted {
        return false;
    }
    true
}

/// Everything selection needs from the host.
pub trait QuestHost {
    /// All known quest definitions; indices into this slice identify quests.
    fn quest_defs(&self) -> &[QuestDef];

    fn layer(&self) -> Option<&LayerDef>;

    fn now(&self) -> Tick;

    fn selection_weight(&self, quest: &QuestDef, points: f32) -> f32;

    /// The expensive eligibility check.
    fn can_run(&self, quest: &QuestDef, points: f32) -> Validation;

    /// Current default threat points, or `None` if they cannot be computed.
    fn threat_points(&self) -> Option<f32>;

    fn population_increasing_chance(&self) -> f32;
}

/// Root quest indices split by population effect.
///
/// Rebuilt whenever the number of known definitions changes.
#[derive(Debug, Clone, Default)]
pub struct QuestRootCache {
    increasing: Vec<usize>,
    other: Vec<usize>,
    built_for: Option<usize>,
}

impl QuestRootCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn roots(&mut self, defs: &[QuestDef], increases_population: bool) -> &[usize] {
        if self.built_for != Some(defs.len()) {
            self.rebuild(defs);
        }
        if increases_population {
            &self.increasing
        } else {
            &self.other
        }
    }

    fn rebuild(&mut self, defs: &[QuestDef]) {
        self.increasing.clear();
        self.other.clear();
        for (i, q) in defs.iter().enumerate() {
            if !q.root_random_selected {
                continue;
            }
            if q.increases_population {
                self.increasing.push(i);
            } else {
                self.other.push(i);
            }
        }
        self.built_for = Some(defs.len());
    }
}

/// Outcome of a natural random selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuestChoice {
    /// Index into [`QuestHost::quest_defs`], with the points used.
    Chosen { index: usize, points: f32 },
    /// The host should run its own chooser with these (possibly repaired)
    /// points.
    Vanilla { points: f32 },
}

impl QuestChoice {
    pub fn points(&self) -> f32 {
        match *self {
            Self::Chosen { points, .. } | Self::Vanilla { points } => points,
        }
    }
}

/// Selection state owned by the session.
#[derive(Debug, Default)]
pub struct QuestChooser {
    roots: QuestRootCache,
    candidates: ListPool<usize>,
    weights: ListPool<f32>,
    points: RecentValueCache,
}

impl QuestChooser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recent_points(&self) -> &RecentValueCache {
        &self.points
    }

    /// Forget remembered threat points. The session calls this when its
    /// clock is replaced by a load.
    pub fn reset(&mut self) {
        self.points.clear();
    }

    /// Pick a natural random quest, or defer to the host's chooser.
    pub fn choose<H, R>(
        &mut self,
        host: &H,
        points: f32,
        settings: &QuestSettings,
        rng: &mut R,
    ) -> QuestChoice
    where
        H: QuestHost + ?Sized,
        R: Rng + ?Sized,
    {
        if !settings.enabled || !settings.use_fast_chooser {
            return QuestChoice::Vanilla { points };
        }
        let verbose = settings.verbose_logging;
        let _measure = Measure::start("natural random quest selection", SLOW_SELECTION_MS, verbose);

        let points = self.repair_selection_points(host, points, verbose);
        let chance = host.population_increasing_chance();
        let increasing = rng.gen::<f32>() < chance;
        let max_checks = settings.max_checks_per_selection.clamp(1, MAX_CHECKS_CEILING);

        let mut chosen = self.try_fast(host, increasing, points, max_checks, verbose, rng);
        if chosen.is_none() && increasing {
            chosen = self.try_fast(host, false, points, max_checks, verbose, rng);
        }
        if chosen.is_none() && settings.use_ancient_complex_fallback {
            chosen = ancient_complex_fallback(host, points);
        }

        match chosen {
            Some(index) => QuestChoice::Chosen { index, points },
            None => {
                if verbose {
                    log::debug!("fast quest chooser found nothing, deferring to host chooser");
                }
                QuestChoice::Vanilla { points }
            }
        }
    }

    /// Replacement points for a quest generation request, or `None` to leave
    /// the request as it is.
    ///
    /// Only requests with missing or negligible points are touched. A value
    /// remembered from a selection in the last couple of seconds is reused;
    /// otherwise threat points are computed and remembered.
    pub fn normalize_generation_points<H>(
        &mut self,
        host: &H,
        points: Option<f32>,
        settings: &QuestSettings,
    ) -> Option<f32>
    where
        H: QuestHost + ?Sized,
    {
        if !settings.enabled || !settings.normalize_zero_points {
            return None;
        }
        if points.is_some_and(|p| p > MIN_POINTS) {
            return None;
        }
        let now = host.now();
        if let Some(recent) = self.points.try_get(now, POINTS_FRESH_TICKS) {
            return Some(recent);
        }
        let computed = host.threat_points().filter(|p| *p > MIN_POINTS)?;
        self.points.record(computed, now);
        if settings.verbose_logging {
            log::debug!("normalized quest generation points to {computed:.1}");
        }
        Some(computed)
    }

    fn repair_selection_points<H>(&mut self, host: &H, points: f32, verbose: bool) -> f32
    where
        H: QuestHost + ?Sized,
    {
        if points > MIN_POINTS {
            return points;
        }
        match host.threat_points() {
            Some(auto) if auto > MIN_POINTS => {
                self.points.record(auto, host.now());
                if verbose {
                    log::debug!("auto points for selection: {auto:.1}");
                }
                auto
            }
            _ => points,
        }
    }

    fn try_fast<H, R>(
        &mut self,
        host: &H,
        increasing: bool,
        points: f32,
        max_checks: usize,
        verbose: bool,
        rng: &mut R,
    ) -> Option<usize>
    where
        H: QuestHost + ?Sized,
        R: Rng + ?Sized,
    {
        let defs = host.quest_defs();
        let roots = self.roots.roots(defs, increasing);
        if roots.is_empty() {
            return None;
        }

        let layer = host.layer();
        let mut candidates = self.candidates.get();
        let mut weights = self.weights.get();
        for &i in roots {
            let quest = &defs[i];
            if !passes_layer_gate(quest, layer) {
                continue;
            }
            let w = host.selection_weight(quest, points);
            if w > 0.0 {
                candidates.push(i);
                weights.push(w);
            }
        }

        let outcome = sampler::try_choose(&mut candidates, &mut weights, max_checks, rng, |&i| {
            let verdict = host.can_run(&defs[i], points);
            if verbose {
                if let Validation::Error(reason) = &verdict {
                    log::debug!("can-run check for '{}' failed: {}", defs[i].name, reason);
                }
            }
            verdict
        });
        self.candidates.put(candidates);
        self.weights.put(weights);

        if verbose && outcome.chosen.is_none() && outcome.validations > 0 {
            log::debug!(
                "no {} quest accepted after {} checks",
                if increasing { "population-increasing" } else { "regular" },
                outcome.validations
            );
        }
        outcome.chosen
    }
}

/// Last-resort choice: well-known ancient-complex quests, then any quest
/// whose name contains the marker. Unbounded; only runs after the fast
/// paths give up.
pub fn ancient_complex_fallback<H>(host: &H, points: f32) -> Option<usize>
where
    H: QuestHost + ?Sized,
{
    let defs = host.quest_defs();
    let runnable = |i: usize| host.can_run(&defs[i], points).is_valid();

    for name in ANCIENT_COMPLEX_NAMES {
        if let Some(i) = defs.iter().position(|q| q.name == name) {
            if runnable(i) {
                return Some(i);
            }
        }
    }
    (0..defs.len()).find(|&i| {
        let name = defs[i].name.to_ascii_lowercase();
        !name.is_empty() && name.contains(ANCIENT_COMPLEX_MARKER) && runnable(i)
    })
}
