use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::debug;
use once_cell::sync::OnceCell;

use crate::error::{FplError, Result};
use crate::fixtures::GameweekWindow;
use crate::models::{
    Bootstrap, Club, Fixture, GameweekRecord, LivePoints, ManagerEntry, ManagerHistory,
    ManagerPicks, Player, PlayerId, TransferRecord,
};
use crate::source::DataSource;

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|p| p.into_inner());
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock().unwrap_or_else(|p| p.into_inner())
    }
}

struct Slot<V> {
    cell: OnceCell<(Instant, Arc<V>)>,
}

impl<V> Slot<V> {
    fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Empty slots count as usable: either a fetch is in flight or the last one failed.
    fn usable(&self, now: Instant, ttl: Duration) -> bool {
        match self.cell.get() {
            Some((fetched_at, _)) => now.saturating_duration_since(*fetched_at) <= ttl,
            None => true,
        }
    }
}

/// Keyed TTL cache with one fetch in flight per key.
///
/// Concurrent callers for the same key block on the same slot and share its
/// result. Failures are not cached: the next caller fetches again.
pub struct TtlCache<K, V> {
    ttl: Duration,
    slots: Mutex<HashMap<K, Arc<Slot<V>>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn get_or_fetch<F>(&self, key: K, clock: &dyn Clock, fetch: F) -> anyhow::Result<Arc<V>>
    where
        F: FnOnce() -> anyhow::Result<V>,
    {
        let slot = {
            let mut slots = self.lock();
            let now = clock.now();
            let reusable = slots
                .get(&key)
                .filter(|slot| slot.usable(now, self.ttl))
                .cloned();
            match reusable {
                Some(slot) => slot,
                None => {
                    let fresh = Arc::new(Slot::new());
                    slots.insert(key, Arc::clone(&fresh));
                    fresh
                }
            }
        };

        let (_, value) = slot
            .cell
            .get_or_try_init(|| fetch().map(|v| (clock.now(), Arc::new(v))))?;
        Ok(Arc::clone(value))
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, Arc<Slot<V>>>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Time-bounded view of the league dataset. Every read goes through here.
pub struct Snapshot {
    source: Arc<dyn DataSource>,
    clock: Arc<dyn Clock>,
    bootstrap: TtlCache<(), Bootstrap>,
    fixtures: TtlCache<(), Vec<Fixture>>,
    history: TtlCache<PlayerId, Vec<GameweekRecord>>,
    picks: TtlCache<(u32, u32), ManagerPicks>,
    live: TtlCache<u32, Vec<LivePoints>>,
    entries: TtlCache<u32, ManagerEntry>,
    manager_history: TtlCache<u32, ManagerHistory>,
    transfers: TtlCache<u32, Vec<TransferRecord>>,
}

impl Snapshot {
    pub fn new(source: Arc<dyn DataSource>, ttl: Duration) -> Self {
        Self::with_clock(source, Arc::new(SystemClock), ttl)
    }

    pub fn with_clock(source: Arc<dyn DataSource>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            source,
            clock,
            bootstrap: TtlCache::new(ttl),
            fixtures: TtlCache::new(ttl),
            history: TtlCache::new(ttl),
            picks: TtlCache::new(ttl),
            live: TtlCache::new(ttl),
            entries: TtlCache::new(ttl),
            manager_history: TtlCache::new(ttl),
            transfers: TtlCache::new(ttl),
        }
    }

    /// Players, clubs and gameweek metadata in one payload.
    pub fn bootstrap(&self) -> Result<Arc<Bootstrap>> {
        self.bootstrap
            .get_or_fetch((), self.clock.as_ref(), || {
                debug!("snapshot: fetching bootstrap");
                self.source.bootstrap()
            })
            .map_err(FplError::unavailable)
    }

    pub fn players(&self) -> Result<Vec<Player>> {
        Ok(self.bootstrap()?.players.clone())
    }

    pub fn clubs(&self) -> Result<Vec<Club>> {
        Ok(self.bootstrap()?.clubs.clone())
    }

    /// All fixtures, or only those scheduled inside `window`.
    pub fn fixtures(&self, window: Option<GameweekWindow>) -> Result<Vec<Fixture>> {
        let all = self
            .fixtures
            .get_or_fetch((), self.clock.as_ref(), || {
                debug!("snapshot: fetching fixtures");
                self.source.fixtures()
            })
            .map_err(FplError::unavailable)?;
        Ok(match window {
            None => all.as_ref().clone(),
            Some(w) => all
                .iter()
                .filter(|f| f.gameweek.is_some_and(|gw| w.contains(gw)))
                .cloned()
                .collect(),
        })
    }

    pub fn gameweek_history(&self, player_id: PlayerId) -> Result<Arc<Vec<GameweekRecord>>> {
        self.history
            .get_or_fetch(player_id, self.clock.as_ref(), || {
                debug!("snapshot: fetching history for player {player_id}");
                self.source.player_history(player_id)
            })
            .map_err(FplError::unavailable)
    }

    pub fn manager_picks(&self, entry_id: u32, gameweek: u32) -> Result<Arc<ManagerPicks>> {
        self.picks
            .get_or_fetch((entry_id, gameweek), self.clock.as_ref(), || {
                debug!("snapshot: fetching picks for entry {entry_id} GW{gameweek}");
                self.source.manager_picks(entry_id, gameweek)
            })
            .map_err(FplError::unavailable)
    }

    pub fn live_points(&self, gameweek: u32) -> Result<Arc<Vec<LivePoints>>> {
        self.live
            .get_or_fetch(gameweek, self.clock.as_ref(), || {
                debug!("snapshot: fetching live points for GW{gameweek}");
                self.source.live_points(gameweek)
            })
            .map_err(FplError::unavailable)
    }

    pub fn manager_entry(&self, entry_id: u32) -> Result<Arc<ManagerEntry>> {
        self.entries
            .get_or_fetch(entry_id, self.clock.as_ref(), || {
                debug!("snapshot: fetching entry {entry_id}");
                self.source.manager_entry(entry_id)
            })
            .map_err(FplError::unavailable)
    }

    pub fn manager_history(&self, entry_id: u32) -> Result<Arc<ManagerHistory>> {
        self.manager_history
            .get_or_fetch(entry_id, self.clock.as_ref(), || {
                debug!("snapshot: fetching season history for entry {entry_id}");
                self.source.manager_history(entry_id)
            })
            .map_err(FplError::unavailable)
    }

    pub fn manager_transfers(&self, entry_id: u32) -> Result<Arc<Vec<TransferRecord>>> {
        self.transfers
            .get_or_fetch(entry_id, self.clock.as_ref(), || {
                debug!("snapshot: fetching transfers for entry {entry_id}");
                self.source.manager_transfers(entry_id)
            })
            .map_err(FplError::unavailable)
    }

    pub fn current_gameweek(&self) -> Result<Option<u32>> {
        Ok(self.bootstrap()?.current_gameweek())
    }

    pub fn next_gameweek(&self) -> Result<Option<u32>> {
        Ok(self.bootstrap()?.next_gameweek())
    }

    /// Drops every cached payload; the next read of each kind refetches.
    pub fn invalidate(&self) {
        self.bootstrap.clear();
        self.fixtures.clear();
        self.history.clear();
        self.picks.clear();
        self.live.clear();
        self.entries.clear();
        self.manager_history.clear();
        self.transfers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn ttl_cache_refetches_only_after_expiry() {
        let clock = ManualClock::new();
        let cache: TtlCache<u32, u32> = TtlCache::new(Duration::from_secs(300));
        let calls = AtomicUsize::new(0);
        let fetch = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(42)
        };

        assert_eq!(*cache.get_or_fetch(1, &clock, fetch).unwrap(), 42);
        clock.advance(Duration::from_secs(300));
        assert_eq!(*cache.get_or_fetch(1, &clock, fetch).unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::from_secs(1));
        cache.get_or_fetch(1, &clock, fetch).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn ttl_cache_does_not_remember_failures() {
        let clock = ManualClock::new();
        let cache: TtlCache<(), u32> = TtlCache::new(Duration::from_secs(60));
        let err = cache.get_or_fetch((), &clock, || Err(anyhow::anyhow!("boom")));
        assert!(err.is_err());
        let ok = cache.get_or_fetch((), &clock, || Ok(7)).unwrap();
        assert_eq!(*ok, 7);
    }

    #[test]
    fn keys_are_cached_independently() {
        let clock = ManualClock::new();
        let cache: TtlCache<u32, u32> = TtlCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);
        for key in [1, 2, 1, 2] {
            cache
                .get_or_fetch(key, &clock, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(key * 10)
                })
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
