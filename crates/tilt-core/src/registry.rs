use crate::controller::TiltController;
use crate::error::TiltError;
use crate::host::Host;
use crate::settings::TiltOptions;

/// Maps target identity to its controller. At most one controller per target.
///
/// Keys only need equality (DOM elements compare by identity), so lookups are
/// a linear scan; pages rarely carry more than a handful of tilted elements.
/// A controller destroyed outside the registry no longer counts as a binding.
pub struct TiltRegistry<K> {
    entries: Vec<(K, TiltController)>,
}

impl<K> Default for TiltRegistry<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K: PartialEq> TiltRegistry<K> {
    pub fn new() -> Self {
        Self::default()
    }

    fn live(&self) -> impl Iterator<Item = &(K, TiltController)> {
        self.entries.iter().filter(|(_, c)| !c.is_destroyed())
    }

    fn prune(&mut self) {
        self.entries.retain(|(_, c)| !c.is_destroyed());
    }

    pub fn len(&self) -> usize {
        self.live().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &K) -> bool {
        self.live().any(|(k, _)| k == key)
    }

    pub fn get(&self, key: &K) -> Option<&TiltController> {
        self.live().find(|(k, _)| k == key).map(|(_, c)| c)
    }

    /// Constructs a controller for every target that has none yet and returns
    /// how many were created. Already bound targets are skipped silently.
    pub fn init<I, F>(
        &mut self,
        targets: I,
        options: &TiltOptions,
        mut host_for: F,
    ) -> Result<usize, TiltError>
    where
        I: IntoIterator<Item = K>,
        F: FnMut(&K) -> Result<Host, TiltError>,
    {
        self.prune();
        let mut created = 0;
        for key in targets {
            if self.contains(&key) {
                log::debug!("[tilt] target already bound; skipping");
                continue;
            }
            let controller = TiltController::new(host_for(&key)?, options)?;
            self.entries.push((key, controller));
            created += 1;
        }
        Ok(created)
    }

    /// Registers an existing controller. Returns false, leaving the registry
    /// untouched, when the target already has one.
    pub fn insert(&mut self, key: K, controller: TiltController) -> bool {
        self.prune();
        if self.contains(&key) {
            return false;
        }
        self.entries.push((key, controller));
        true
    }

    /// Tears down and forgets the target's controller.
    pub fn destroy(&mut self, key: &K) -> bool {
        self.prune();
        match self.entries.iter().position(|(k, _)| k == key) {
            Some(pos) => {
                let (_, controller) = self.entries.swap_remove(pos);
                controller.destroy();
                true
            }
            None => false,
        }
    }

    /// Tears down `controller` and forgets the target only while it is still
    /// the controller registered for it. Returns whether an entry was removed.
    pub fn destroy_if(&mut self, key: &K, controller: &TiltController) -> bool {
        let pos = self
            .entries
            .iter()
            .position(|(k, c)| k == key && c.ptr_eq(controller));
        controller.destroy();
        match pos {
            Some(pos) => {
                self.entries.swap_remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn destroy_all(&mut self) {
        for (_, controller) in self.entries.drain(..) {
            controller.destroy();
        }
    }
}
