//! World-pawn cleanup.
//!
//! Long sessions accumulate off-map pawns that nothing references any more.
//! [`can_safely_clean`] names the first reason a pawn must be kept;
//! [`clean_world_pawns`] removes everything without one through a host
//! callback.

use thiserror::Error;

use crate::EntityId;

/// What the host knows about a pawn stored off-map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorldPawnFacts {
    pub id: EntityId,
    pub label: String,
    pub of_player_faction: bool,
    /// Slave or prisoner of the colony.
    pub colony_property: bool,
    /// Reserved by a quest or by a quest being generated.
    pub quest_reserved: bool,
    pub faction_leader: bool,
    pub for_sale: bool,
    /// Blood relative of a current colonist.
    pub colonist_family: bool,
    /// Has a spawned or sarcophagus-buried corpse.
    pub corpse_exists: bool,
    /// Held by a container, caravan, or other parent.
    pub inside_something: bool,
    /// Set by an extension that reserves the pawn; holds its name.
    pub reserved_by_extension: Option<String>,
}

/// First reason a pawn must not be removed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CleanBlocker {
    #[error("of player")]
    OfPlayer,
    #[error("colony property")]
    ColonyProperty,
    #[error("quest")]
    Quest,
    #[error("faction leader")]
    FactionLeader,
    #[error("for sale")]
    ForSale,
    #[error("colonist family")]
    ColonistFamily,
    #[error("corpse exists")]
    CorpseExists,
    #[error("inside something")]
    InsideSomething,
    #[error("{0}")]
    Extension(String),
}

/// The host failed to remove a pawn.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct RemovalError(pub String);

pub fn can_safely_clean(p: &WorldPawnFacts) -> Result<(), CleanBlocker> {
    if p.of_player_faction {
        return Err(CleanBlocker::OfPlayer);
    }
    if p.colony_property {
        return Err(CleanBlocker::ColonyProperty);
    }
    if p.quest_reserved {
        return Err(CleanBlocker::Quest);
    }
    if p.faction_leader {
        return Err(CleanBlocker::FactionLeader);
    }
    if p.for_sale {
        return Err(CleanBlocker::ForSale);
    }
    if p.colonist_family {
        return Err(CleanBlocker::ColonistFamily);
    }
    if p.corpse_exists {
        return Err(CleanBlocker::CorpseExists);
    }
    if p.inside_something {
        return Err(CleanBlocker::InsideSomething);
    }
    if let Some(name) = &p.reserved_by_extension {
        return Err(CleanBlocker::Extension(name.clone()));
    }
    Ok(())
}

/// Display label with the blocking reason appended, e.g. `"Mira [quest]"`.
pub fn annotated_label(p: &WorldPawnFacts) -> String {
    match can_safely_clean(p) {
        Ok(()) => p.label.clone(),
        Err(reason) => format!("{} [{}]", p.label, reason),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub selected: usize,
    pub removed: usize,
    pub failed: usize,
}

/// Remove every cleanable pawn. With `include_family`, pawns whose only
/// blocker is colonist family are removed too.
///
/// Selection happens before any removal. A failed removal is logged and
/// the batch continues.
pub fn clean_world_pawns<F>(
    pawns: &[WorldPawnFacts],
    include_family: bool,
    mut remove: F,
) -> CleanupReport
where
    F: FnMut(&WorldPawnFacts) -> Result<(), RemovalError>,
{
    let selected: Vec<&WorldPawnFacts> = pawns
        .iter()
        .filter(|p| match can_safely_clean(p) {
            Ok(()) => true,
            Err(CleanBlocker::ColonistFamily) => include_family,
            Err(_) => false,
        })
        .collect();

    log::info!("world pawn cleanup: removing {} of {} pawns", selected.len(), pawns.len());

    let mut report = CleanupReport {
        selected: selected.len(),
        ..CleanupReport::default()
    };
    for p in selected {
        match remove(p) {
            Ok(()) => report.removed += 1,
            Err(e) => {
                log::warn!("failed to remove world pawn '{}': {}", p.label, e);
                report.failed += 1;
            }
        }
    }
    report
}
