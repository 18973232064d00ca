//! Temporary variable allocation for emitted C bodies.
//!
//! Temporaries released by one statement are reused by the next, so a
//! function with many short-lived intermediates declares only as many
//! C locals as are ever live at once. Reuse is keyed on the C type and
//! the cleanup class together: a slot that needs release-on-scope-exit
//! is never handed to a value that does not.

use std::collections::HashMap;

/// Cleanup requirement of a temporary's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cleanup {
    /// Plain value, nothing to run on scope exit.
    None,
    /// Reference-counted value that must be released.
    Release,
}

/// A live temporary. The name is the emitted C identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Temp {
    pub name: String,
    pub c_type: &'static str,
    pub cleanup: Cleanup,
}

/// Per-function allocator with a free list per (type, cleanup) class.
#[derive(Default)]
pub struct TempAllocator {
    next_id: usize,
    free: HashMap<(&'static str, Cleanup), Vec<String>>,
    live: HashMap<String, (&'static str, Cleanup)>,
    /// Every temporary ever allocated, for the declaration block.
    all: Vec<Temp>,
}

impl TempAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a temporary of the given type and cleanup class,
    /// reusing a released slot of the same class when one exists.
    pub fn allocate(&mut self, c_type: &'static str, cleanup: Cleanup) -> Temp {
        let name = match self.free.get_mut(&(c_type, cleanup)).and_then(Vec::pop) {
            Some(name) => name,
            None => {
                let name = format!("__t{}", self.next_id);
                self.next_id += 1;
                self.all.push(Temp {
                    name: name.clone(),
                    c_type,
                    cleanup,
                });
                name
            }
        };
        self.live.insert(name.clone(), (c_type, cleanup));
        Temp {
            name,
            c_type,
            cleanup,
        }
    }

    /// Return a temporary to its free list.
    ///
    /// # Panics
    ///
    /// Panics if the temporary is not currently live; releasing twice
    /// is a bug in the emitter, not a recoverable condition.
    pub fn release(&mut self, temp: &Temp) {
        let Some(key) = self.live.remove(&temp.name) else {
            panic!("released temporary {} that is not live", temp.name);
        };
        self.free.entry(key).or_default().push(temp.name.clone());
    }

    /// All temporaries ever allocated, in allocation order. The emitter
    /// writes their declarations into the function's declaration slot.
    pub fn declarations(&self) -> &[Temp] {
        &self.all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn released_slot_is_reused() {
        let mut temps = TempAllocator::new();
        let a = temps.allocate("CyValue", Cleanup::None);
        assert_eq!(a.name, "__t0");
        temps.release(&a);
        let b = temps.allocate("CyValue", Cleanup::None);
        assert_eq!(b.name, "__t0");
        assert_eq!(temps.declarations().len(), 1);
    }

    #[test]
    fn cleanup_classes_do_not_share_slots() {
        let mut temps = TempAllocator::new();
        let a = temps.allocate("CyValue", Cleanup::Release);
        temps.release(&a);
        let b = temps.allocate("CyValue", Cleanup::None);
        assert_ne!(b.name, a.name);
    }

    #[test]
    fn types_do_not_share_slots() {
        let mut temps = TempAllocator::new();
        let a = temps.allocate("CyIter", Cleanup::None);
        temps.release(&a);
        let b = temps.allocate("CyValue", Cleanup::None);
        assert_ne!(b.name, a.name);
    }

    #[test]
    fn live_temporaries_get_distinct_names() {
        let mut temps = TempAllocator::new();
        let a = temps.allocate("CyValue", Cleanup::None);
        let b = temps.allocate("CyValue", Cleanup::None);
        assert_ne!(a.name, b.name);
    }

    #[test]
    #[should_panic(expected = "not live")]
    fn double_release_panics() {
        let mut temps = TempAllocator::new();
        let a = temps.allocate("CyValue", Cleanup::None);
        temps.release(&a);
        temps.release(&a);
    }
}
