//! Fog-of-war commit policy
//!
//! Sight polygons feed a fog compositor that accumulates explored area. Two
//! settings shape that hand-off:
//! - `fow-only-player-visible`: a source nobody but administrators can observe
//!   does not contribute exploration
//! - `fix-fow-memory-leak`: pending fog geometry is committed once it grows
//!   past `fog-commit-threshold` vertices
//!
//! The source currently being recomputed is tracked by a `RecomputeMarker`
//! owned by the caller. While a `RecomputeGuard` holds it, the guard lends the
//! marker out read-only and `update_fog` consults it for suppression.

use std::collections::HashSet;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::settings::{SettingKey, SettingsProvider};
use crate::sight::SightPolygons;

/// Identity of a vision source's owner (a token id)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub String);

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        SourceId(s.to_string())
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait PermissionOracle {
    /// Whether at least one non-administrative viewer can observe `owner`
    fn has_observer(&self, owner: &SourceId) -> bool;
}

/// Oracle backed by a fixed set of player-observable sources
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObserverTable {
    observed: HashSet<SourceId>,
}

impl ObserverTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&mut self, owner: SourceId) {
        self.observed.insert(owner);
    }

    pub fn revoke(&mut self, owner: &SourceId) {
        self.observed.remove(owner);
    }
}

impl PermissionOracle for ObserverTable {
    fn has_observer(&self, owner: &SourceId) -> bool {
        self.observed.contains(owner)
    }
}

/// Single-writer record of the source whose sight is being recomputed
#[derive(Debug, Default)]
pub struct RecomputeMarker {
    current: Option<SourceId>,
}

impl RecomputeMarker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&SourceId> {
        self.current.as_ref()
    }

    /// Mark `source` as being recomputed until the guard drops
    pub fn enter(&mut self, source: SourceId) -> RecomputeGuard<'_> {
        if let Some(stale) = self.current.replace(source.clone()) {
            log::warn!("Recompute marker still held by {}; replacing", stale);
        }
        RecomputeGuard { marker: self, source }
    }

    /// Run `f` with `source` marked, clearing the mark however `f` exits.
    /// `f` sees the marker with `source` current.
    pub fn scoped<T>(&mut self, source: SourceId, f: impl FnOnce(&RecomputeMarker) -> Result<T>) -> Result<T> {
        let guard = self.enter(source);
        f(guard.marker())
    }
}

/// Clears the marker on drop, including on error and unwind
#[derive(Debug)]
pub struct RecomputeGuard<'a> {
    marker: &'a mut RecomputeMarker,
    source: SourceId,
}

impl RecomputeGuard<'_> {
    pub fn source(&self) -> &SourceId {
        &self.source
    }

    /// Read-only view of the held marker
    pub fn marker(&self) -> &RecomputeMarker {
        &*self.marker
    }
}

impl Drop for RecomputeGuard<'_> {
    fn drop(&mut self) {
        self.marker.current = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FogPolicy {
    pub only_player_visible: bool,
    pub memory_leak_fix: bool,
    /// Pending vertex count that forces a commit when `memory_leak_fix` is on
    pub commit_threshold: usize,
}

impl FogPolicy {
    pub fn from_provider<P: SettingsProvider + ?Sized>(provider: &P) -> Self {
        let threshold = provider.number(SettingKey::FogCommitThreshold);
        let commit_threshold = if threshold >= 1.0 {
            threshold as usize
        } else {
            log::warn!("Fog commit threshold {} is not usable; using default", threshold);
            crate::consts::DEFAULT_FOG_COMMIT_THRESHOLD
        };
        Self {
            only_player_visible: provider.flag(SettingKey::FowOnlyPlayerVisible),
            memory_leak_fix: provider.flag(SettingKey::FixFowMemoryLeak),
            commit_threshold,
        }
    }
}

/// Accumulates explored area from sight polygons
pub trait FogCompositor {
    fn contribute(&mut self, polygons: &SightPolygons);
    /// Vertices contributed since the last commit
    fn pending_len(&self) -> usize;
    fn commit(&mut self);
}

/// In-memory compositor keeping pending fov outlines until committed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExplorationBuffer {
    pending: Vec<Vec<DVec2>>,
    pending_vertices: usize,
    /// Outlines already committed to explored area
    pub explored: Vec<Vec<DVec2>>,
    pub commits: usize,
}

impl ExplorationBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &[Vec<DVec2>] {
        &self.pending
    }
}

impl FogCompositor for ExplorationBuffer {
    fn contribute(&mut self, polygons: &SightPolygons) {
        if polygons.fov.is_empty() {
            return;
        }
        self.pending_vertices += polygons.fov.len();
        self.pending.push(polygons.fov.clone());
    }

    fn pending_len(&self) -> usize {
        self.pending_vertices
    }

    fn commit(&mut self) {
        self.explored.append(&mut self.pending);
        self.pending_vertices = 0;
        self.commits += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FogOutcome {
    /// Policy kept this source out of the explored area
    Suppressed,
    Contributed,
    /// Contributed, and the pending buffer crossed the commit threshold
    ContributedAndCommitted,
}

/// Hand one source's sight polygons to the fog compositor.
///
/// The suppression check reads the source `marker` holds; refreshes made
/// while no source is marked are never suppressed.
pub fn update_fog<C, O>(
    compositor: &mut C,
    policy: &FogPolicy,
    oracle: &O,
    marker: &RecomputeMarker,
    polygons: &SightPolygons,
) -> FogOutcome
where
    C: FogCompositor + ?Sized,
    O: PermissionOracle + ?Sized,
{
    if policy.only_player_visible {
        if let Some(source) = marker.current() {
            if !oracle.has_observer(source) {
                log::debug!("Fog update for {} suppressed: no player observer", source);
                return FogOutcome::Suppressed;
            }
        }
    }

    compositor.contribute(polygons);

    if policy.memory_leak_fix && compositor.pending_len() > policy.commit_threshold {
        log::info!(
            "Pending fog geometry {} over {}; committing",
            compositor.pending_len(),
            policy.commit_threshold
        );
        compositor.commit();
        return FogOutcome::ContributedAndCommitted;
    }
    FogOutcome::Contributed
}
