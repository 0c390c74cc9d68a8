use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use slotmap::SlotMap;
use tracing::trace;

use super::ContourPolygon;

slotmap::new_key_type! {
    /// Handle returned by [`ContoursPerSlice::subscribe`].
    pub struct ListenerId;
}

/// A structural change to a [`ContoursPerSlice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContoursChange {
    Inserted { slice: usize },
    Replaced { slice: usize },
    Removed { slice: usize },
    Cleared,
}

type Listener = Box<dyn Fn(&ContoursChange) + Send + Sync>;

/// Contour polygons keyed by slice index.
///
/// All mutation goes through one mutex, so writers are serialized. Readers
/// receive shared `Arc` handles to a slice's polygon list, which stay valid
/// after later mutations; [`ContoursPerSlice::snapshot`] copies the whole
/// mapping for lock-free iteration. Listeners run while the mutation still
/// holds the map lock, so they observe changes in mutation order. A listener
/// must not call back into the store it is subscribed to.
#[derive(Default)]
pub struct ContoursPerSlice {
    slices: Mutex<BTreeMap<usize, Arc<[ContourPolygon]>>>,
    listeners: Mutex<SlotMap<ListenerId, Listener>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ContoursPerSlice {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the polygons of `slice`, replacing any previous list.
    pub fn insert(&self, slice: usize, polygons: Vec<ContourPolygon>) {
        let mut slices = lock(&self.slices);
        let previous = slices.insert(slice, Arc::from(polygons));
        let change = if previous.is_some() {
            ContoursChange::Replaced { slice }
        } else {
            ContoursChange::Inserted { slice }
        };
        self.notify(&change);
    }

    /// Removes the polygons of `slice`. Returns them if the slice was present.
    pub fn remove(&self, slice: usize) -> Option<Arc<[ContourPolygon]>> {
        let mut slices = lock(&self.slices);
        let removed = slices.remove(&slice);
        if removed.is_some() {
            self.notify(&ContoursChange::Removed { slice });
        }
        removed
    }

    /// Removes every slice.
    pub fn clear(&self) {
        let mut slices = lock(&self.slices);
        slices.clear();
        self.notify(&ContoursChange::Cleared);
    }

    /// Polygons of `slice`, if any were stored.
    #[must_use]
    pub fn get(&self, slice: usize) -> Option<Arc<[ContourPolygon]>> {
        lock(&self.slices).get(&slice).cloned()
    }

    #[must_use]
    pub fn contains_slice(&self, slice: usize) -> bool {
        lock(&self.slices).contains_key(&slice)
    }

    /// Slice indices in ascending order.
    #[must_use]
    pub fn slice_indices(&self) -> Vec<usize> {
        lock(&self.slices).keys().copied().collect()
    }

    /// Number of slices with a stored entry.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.slices).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.slices).is_empty()
    }

    /// Total number of polygons over all slices.
    #[must_use]
    pub fn polygon_count(&self) -> usize {
        lock(&self.slices).values().map(|p| p.len()).sum()
    }

    /// Point-in-time copy of the mapping.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<usize, Arc<[ContourPolygon]>> {
        lock(&self.slices).clone()
    }

    /// Registers a callback invoked on every mutation.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&ContoursChange) + Send + Sync + 'static,
    {
        lock(&self.listeners).insert(Box::new(listener))
    }

    /// Removes a callback. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        lock(&self.listeners).remove(id).is_some()
    }

    fn notify(&self, change: &ContoursChange) {
        trace!(?change, "contours changed");
        for listener in lock(&self.listeners).values() {
            listener(change);
        }
    }
}

impl fmt::Debug for ContoursPerSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContoursPerSlice")
            .field("slices", &self.slice_indices())
            .field("listeners", &lock(&self.listeners).len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point2;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn square() -> ContourPolygon {
        ContourPolygon::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ])
    }

    #[test]
    fn insert_replace_remove_notify() {
        let contours = ContoursPerSlice::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        contours.subscribe(move |c| sink.lock().unwrap().push(*c));

        contours.insert(3, vec![square()]);
        contours.insert(3, vec![square(), square()]);
        contours.insert(1, Vec::new());
        assert!(contours.remove(3).is_some());
        assert!(contours.remove(3).is_none());

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                ContoursChange::Inserted { slice: 3 },
                ContoursChange::Replaced { slice: 3 },
                ContoursChange::Inserted { slice: 1 },
                ContoursChange::Removed { slice: 3 },
            ]
        );
        assert_eq!(contours.slice_indices(), vec![1]);
    }

    #[test]
    fn handles_survive_mutation() {
        let contours = ContoursPerSlice::new();
        contours.insert(0, vec![square()]);
        let held = contours.get(0).unwrap();
        contours.clear();
        assert_eq!(held.len(), 1);
        assert!(contours.is_empty());
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let contours = ContoursPerSlice::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let id = contours.subscribe(move |_| {
            c.fetch_add(1, Ordering::Relaxed);
        });
        contours.insert(0, vec![square()]);
        assert!(contours.unsubscribe(id));
        contours.insert(1, vec![square()]);
        assert_eq!(count.load(Ordering::Relaxed), 1);
        assert!(!contours.unsubscribe(id));
    }

    #[test]
    fn concurrent_readers_after_population() {
        let contours = ContoursPerSlice::new();
        for z in 0..8 {
            contours.insert(z, vec![square(); z]);
        }
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    let snap = contours.snapshot();
                    let total: usize = snap.values().map(|p| p.len()).sum();
                    assert_eq!(total, 28);
                });
            }
        });
        assert_eq!(contours.polygon_count(), 28);
    }

    #[test]
    fn concurrent_writers_notify_in_mutation_order() {
        let contours = ContoursPerSlice::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        contours.subscribe(move |c| sink.lock().unwrap().push(*c));

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..50 {
                        contours.insert(0, vec![square()]);
                        contours.remove(0);
                    }
                });
            }
        });

        let mut present = false;
        for change in events.lock().unwrap().iter() {
            match change {
                ContoursChange::Inserted { .. } => assert!(!present),
                ContoursChange::Replaced { .. } | ContoursChange::Removed { .. } => {
                    assert!(present);
                }
                ContoursChange::Cleared => {}
            }
            present = !matches!(change, ContoursChange::Removed { .. });
        }
        assert_eq!(present, contours.contains_slice(0));
    }
}
