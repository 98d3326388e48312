//! Scroll synchronization between independently scrollable columns.
//!
//! Columns register a `ScrollTarget` under a string key and declare which
//! keys follow them. `sync_from(key)` copies the source's scroll top to
//! every related target.
//!
//! Re-entrancy: writing a scroll position makes the written element report
//! a scroll of its own, which would call `sync_from` again and bounce
//! between columns forever. While a propagation is in flight further
//! `sync_from` calls are ignored; the guard is released by `next_frame()`,
//! which the host calls once per frame, never synchronously.
//!
//! Targets are held weakly: a column that unmounts without unregistering is
//! treated as absent.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use indexmap::IndexSet;
use log::{debug, trace};

/// A scrollable element: something with a vertical scroll offset.
pub trait ScrollElement: Send + Sync {
    fn scroll_top(&self) -> f32;
    fn scroll_to(&self, top: f32);
}

/// Registered under a key; may or may not currently have an element.
pub trait ScrollTarget: Send + Sync {
    fn scroll_element(&self) -> Option<Arc<dyn ScrollElement>>;
}

type ScrollListener = Arc<dyn Fn(f32) + Send + Sync>;

/// In-memory scroll element with a clamped offset.
///
/// The listener fires on every change of the offset, user or programmatic,
/// as a browser's scroll event would.
pub struct ScrollRegion {
    geometry: Mutex<RegionGeometry>,
    listener: RwLock<Option<ScrollListener>>,
}

#[derive(Debug, Clone, Copy)]
struct RegionGeometry {
    viewport_height: f32,
    content_height: f32,
    scroll_top: f32,
}

impl std::fmt::Debug for ScrollRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let g = *self.geometry.lock().unwrap_or_else(|e| e.into_inner());
        f.debug_struct("ScrollRegion")
            .field("viewport_height", &g.viewport_height)
            .field("content_height", &g.content_height)
            .field("scroll_top", &g.scroll_top)
            .finish()
    }
}

impl ScrollRegion {
    pub fn new(viewport_height: f32, content_height: f32) -> Self {
        Self {
            geometry: Mutex::new(RegionGeometry {
                viewport_height,
                content_height,
                scroll_top: 0.0,
            }),
            listener: RwLock::new(None),
        }
    }

    pub fn max_scroll(&self) -> f32 {
        let g = self.geometry.lock().unwrap_or_else(|e| e.into_inner());
        (g.content_height - g.viewport_height).max(0.0)
    }

    pub fn viewport_height(&self) -> f32 {
        self.geometry.lock().unwrap_or_else(|e| e.into_inner()).viewport_height
    }

    pub fn set_viewport_height(&self, height: f32) {
        let top = {
            let mut g = self.geometry.lock().unwrap_or_else(|e| e.into_inner());
            g.viewport_height = height.max(0.0);
            g.scroll_top
        };
        // Re-clamp
        self.scroll_to(top);
    }

    /// Install the scroll listener, replacing any previous one.
    pub fn on_scroll(&self, listener: impl Fn(f32) + Send + Sync + 'static) {
        *self.listener.write().unwrap_or_else(|e| e.into_inner()) = Some(Arc::new(listener));
    }

    pub fn clear_listener(&self) {
        *self.listener.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn scroll_by(&self, delta: f32) {
        let top = self.scroll_top();
        self.scroll_to(top + delta);
    }
}

impl ScrollElement for ScrollRegion {
    fn scroll_top(&self) -> f32 {
        self.geometry.lock().unwrap_or_else(|e| e.into_inner()).scroll_top
    }

    fn scroll_to(&self, top: f32) {
        let changed = {
            let mut g = self.geometry.lock().unwrap_or_else(|e| e.into_inner());
            let max = (g.content_height - g.viewport_height).max(0.0);
            let top = top.clamp(0.0, max);
            let changed = (g.scroll_top - top).abs() > f32::EPSILON;
            g.scroll_top = top;
            changed.then_some(top)
        };
        if let Some(top) = changed {
            let listener = self.listener.read().unwrap_or_else(|e| e.into_inner()).clone();
            if let Some(listener) = listener {
                listener(top);
            }
        }
    }
}

/// A mount point for a scroll element: columns attach their region when
/// mounted and detach it when torn down.
#[derive(Default)]
pub struct ScrollMount {
    element: RwLock<Option<Arc<dyn ScrollElement>>>,
}

impl std::fmt::Debug for ScrollMount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrollMount").field("attached", &self.is_attached()).finish()
    }
}

impl ScrollMount {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_element(element: Arc<dyn ScrollElement>) -> Self {
        Self {
            element: RwLock::new(Some(element)),
        }
    }

    pub fn attach(&self, element: Arc<dyn ScrollElement>) {
        *self.element.write().unwrap_or_else(|e| e.into_inner()) = Some(element);
    }

    pub fn detach(&self) {
        *self.element.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn is_attached(&self) -> bool {
        self.element.read().unwrap_or_else(|e| e.into_inner()).is_some()
    }
}

impl ScrollTarget for ScrollMount {
    fn scroll_element(&self) -> Option<Arc<dyn ScrollElement>> {
        self.element.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[derive(Default)]
struct SyncState {
    targets: HashMap<String, Weak<dyn ScrollTarget>>,
    relations: HashMap<String, IndexSet<String>>,
}

impl SyncState {
    fn element(&self, key: &str) -> Option<Arc<dyn ScrollElement>> {
        self.targets.get(key)?.upgrade()?.scroll_element()
    }
}

/// Key-based registry of scroll targets plus a directed relation graph.
#[derive(Default)]
pub struct ScrollSyncManager {
    state: RwLock<SyncState>,
    syncing: AtomicBool,
}

impl std::fmt::Debug for ScrollSyncManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        f.debug_struct("ScrollSyncManager")
            .field("targets", &state.targets.len())
            .field("relations", &state.relations.len())
            .field("syncing", &self.is_syncing())
            .finish()
    }
}

impl ScrollSyncManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `key` with `target`, replacing any previous association.
    pub fn register<T: ScrollTarget + 'static>(&self, key: impl Into<String>, target: &Arc<T>) {
        let weak: Weak<dyn ScrollTarget> = Arc::downgrade(target) as Weak<dyn ScrollTarget>;
        let key = key.into();
        trace!("Scroll target registered: {key}");
        self.state
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .targets
            .insert(key, weak);
    }

    /// Remove the target and every relation touching `key`, in both directions.
    pub fn unregister(&self, key: &str) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.targets.remove(key);
        state.relations.remove(key);
        for related in state.relations.values_mut() {
            related.shift_remove(key);
        }
        state.relations.retain(|_, related| !related.is_empty());
    }

    /// Add `related` keys to `key`'s outgoing set. Never replaces.
    pub fn relate<I, S>(&self, key: &str, related: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let set = state.relations.entry(key.to_string()).or_default();
        for r in related {
            let r = r.into();
            if r != key {
                set.insert(r);
            }
        }
    }

    pub fn remove_relation(&self, key: &str, related: &str) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if let Some(set) = state.relations.get_mut(key) {
            set.shift_remove(related);
            if set.is_empty() {
                state.relations.remove(key);
            }
        }
    }

    /// Remove every outgoing relation of `key`.
    pub fn clear_relations(&self, key: &str) {
        self.state
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .relations
            .remove(key);
    }

    pub fn related(&self, key: &str) -> Vec<String> {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .relations
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn ScrollTarget>> {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .targets
            .get(key)?
            .upgrade()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Current scroll top of `key`'s element, if it has one.
    pub fn scroll_top(&self, key: &str) -> Option<f32> {
        let element = self.state.read().unwrap_or_else(|e| e.into_inner()).element(key)?;
        Some(element.scroll_top())
    }

    /// Copy `key`'s scroll top to its related targets.
    ///
    /// Returns false when ignored: guard held or source absent.
    pub fn sync_from(&self, key: &str) -> bool {
        if self.syncing.load(Ordering::Acquire) {
            trace!("sync_from({key}) ignored, propagation in flight");
            return false;
        }

        // Resolve everything under the lock, write positions after releasing it
        let (top, followers) = {
            let state = self.state.read().unwrap_or_else(|e| e.into_inner());
            let Some(source) = state.element(key) else {
                return false;
            };
            let followers: Vec<Arc<dyn ScrollElement>> = state
                .relations
                .get(key)
                .map(|set| set.iter().filter_map(|k| state.element(k)).collect())
                .unwrap_or_default();
            (source.scroll_top(), followers)
        };
        if followers.is_empty() {
            return false;
        }

        if self
            .syncing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        for follower in &followers {
            follower.scroll_to(top);
        }
        trace!("Synced {} follower(s) of {key} to {top}", followers.len());
        true
    }

    /// Frame boundary: release the propagation guard.
    pub fn next_frame(&self) {
        self.syncing.store(false, Ordering::Release);
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }

    /// Drop all targets and relations and reset the guard.
    pub fn clear(&self) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.targets.clear();
        state.relations.clear();
        self.syncing.store(false, Ordering::Release);
        debug!("Scroll sync cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn mounted(content: f32) -> (Arc<ScrollRegion>, Arc<ScrollMount>) {
        let region = Arc::new(ScrollRegion::new(600.0, content));
        let mount = Arc::new(ScrollMount::with_element(region.clone()));
        (region, mount)
    }

    /// Wire the region's listener to `sync_from(key)`, as a column does.
    fn follow(manager: &Arc<ScrollSyncManager>, region: &ScrollRegion, key: &'static str) {
        let weak = Arc::downgrade(manager);
        region.on_scroll(move |_| {
            if let Some(m) = weak.upgrade() {
                m.sync_from(key);
            }
        });
    }

    #[test]
    fn test_region_clamps() {
        let region = ScrollRegion::new(600.0, 2400.0);
        region.scroll_to(5000.0);
        assert_eq!(region.scroll_top(), 1800.0);
        region.scroll_to(-10.0);
        assert_eq!(region.scroll_top(), 0.0);
    }

    #[test]
    fn test_one_way_propagation() {
        let manager = ScrollSyncManager::new();
        let (a, ma) = mounted(2400.0);
        let (b, mb) = mounted(2400.0);
        manager.register("a", &ma);
        manager.register("b", &mb);
        manager.relate("a", ["b"]);

        a.scroll_to(300.0);
        assert!(manager.sync_from("a"));
        assert_eq!(b.scroll_top(), 300.0);

        manager.next_frame();
        b.scroll_to(50.0);
        manager.sync_from("b");
        // No edge b -> a
        assert_eq!(a.scroll_top(), 300.0);
    }

    #[test]
    fn test_mutual_relation_no_feedback() {
        let manager = Arc::new(ScrollSyncManager::new());
        let (a, ma) = mounted(2400.0);
        let (b, mb) = mounted(2400.0);
        manager.register("a", &ma);
        manager.register("b", &mb);
        manager.relate("a", ["b"]);
        manager.relate("b", ["a"]);

        let writes = Arc::new(AtomicUsize::new(0));
        let w = Arc::clone(&writes);
        let weak = Arc::downgrade(&manager);
        a.on_scroll(move |_| {
            w.fetch_add(1, Ordering::SeqCst);
            if let Some(m) = weak.upgrade() {
                m.sync_from("a");
            }
        });
        let b_writes = Arc::new(AtomicUsize::new(0));
        let w = Arc::clone(&b_writes);
        let weak = Arc::downgrade(&manager);
        b.on_scroll(move |_| {
            w.fetch_add(1, Ordering::SeqCst);
            if let Some(m) = weak.upgrade() {
                m.sync_from("b");
            }
        });

        // User scroll on A
        a.scroll_to(400.0);
        assert_eq!(b.scroll_top(), 400.0);
        assert_eq!(a.scroll_top(), 400.0);
        assert_eq!(writes.load(Ordering::SeqCst), 1);
        assert_eq!(b_writes.load(Ordering::SeqCst), 1);
        assert!(manager.is_syncing());

        // B's echo during the same frame was ignored
        manager.next_frame();
        assert!(!manager.is_syncing());

        b.scroll_to(100.0);
        assert_eq!(a.scroll_top(), 100.0);
    }

    #[test]
    fn test_relate_is_additive() {
        let manager = ScrollSyncManager::new();
        manager.relate("a", ["b"]);
        manager.relate("a", ["c", "b"]);
        assert_eq!(manager.related("a"), vec!["b", "c"]);

        manager.remove_relation("a", "b");
        assert_eq!(manager.related("a"), vec!["c"]);
        manager.clear_relations("a");
        assert!(manager.related("a").is_empty());
    }

    #[test]
    fn test_unregister_is_symmetric() {
        let manager = ScrollSyncManager::new();
        let (_, ma) = mounted(2400.0);
        manager.register("a", &ma);
        manager.relate("a", ["b", "c"]);
        manager.relate("b", ["a"]);

        manager.unregister("a");
        assert!(manager.get("a").is_none());
        assert!(manager.related("a").is_empty());
        assert!(manager.related("b").is_empty());
    }

    #[test]
    fn test_missing_targets_are_noops() {
        let manager = ScrollSyncManager::new();
        assert!(!manager.sync_from("nope"));
        assert!(!manager.is_syncing());

        // Dropped without unregistering
        let (a, ma) = mounted(2400.0);
        manager.register("a", &ma);
        manager.relate("a", ["gone"]);
        {
            let (_, mg) = mounted(2400.0);
            manager.register("gone", &mg);
        }
        a.scroll_to(200.0);
        // No live follower: nothing written, guard untouched
        assert!(!manager.sync_from("a"));
        assert!(!manager.is_syncing());
        assert_eq!(manager.scroll_top("gone"), None);

        // Detached element
        let (_, mb) = mounted(2400.0);
        manager.register("b", &mb);
        manager.relate("a", ["b"]);
        ma.detach();
        assert!(!manager.sync_from("a"));
    }

    #[test]
    fn test_clear_resets_guard() {
        let manager = ScrollSyncManager::new();
        let (_, ma) = mounted(2400.0);
        let (_, mb) = mounted(2400.0);
        manager.register("a", &ma);
        manager.register("b", &mb);
        manager.relate("a", ["b"]);
        assert!(manager.sync_from("a"));
        assert!(manager.is_syncing());
        manager.clear();
        assert!(!manager.is_syncing());
        assert!(manager.get("a").is_none());
    }
}
