//! Change and access notification from collections up to their document.
//!
//! Collections never point back at the `Document` itself. They share a small
//! block of flags with it instead: the document reads `changed` and sets the
//! switches, collections read the switches and set `changed`. A collection
//! that is not part of a document holds no state and reports nothing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Flags shared between a document and everything it owns.
#[derive(Debug)]
pub(crate) struct DocumentState {
    changed: AtomicBool,
    read_only: AtomicBool,
    track_access: AtomicBool,
    track_modify: AtomicBool,
}

impl DocumentState {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            changed: AtomicBool::new(false),
            read_only: AtomicBool::new(false),
            track_access: AtomicBool::new(true),
            track_modify: AtomicBool::new(true),
        })
    }

    pub(crate) fn has_changed(&self) -> bool {
        self.changed.load(Ordering::Relaxed)
    }

    pub(crate) fn set_changed(&self, changed: bool) {
        self.changed.store(changed, Ordering::Relaxed);
    }

    pub(crate) fn is_read_only(&self) -> bool {
        self.read_only.load(Ordering::Relaxed)
    }

    pub(crate) fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::Relaxed);
    }

    pub(crate) fn track_access(&self) -> bool {
        self.track_access.load(Ordering::Relaxed)
    }

    pub(crate) fn set_track_access(&self, track: bool) {
        self.track_access.store(track, Ordering::Relaxed);
    }

    pub(crate) fn track_modify(&self) -> bool {
        self.track_modify.load(Ordering::Relaxed)
    }

    pub(crate) fn set_track_modify(&self, track: bool) {
        self.track_modify.store(track, Ordering::Relaxed);
    }
}

/// Link from a collection to the document that holds it, if any.
#[derive(Debug, Clone, Default)]
pub(crate) struct Owner(Option<Arc<DocumentState>>);

impl Owner {
    pub(crate) fn attached(state: &Arc<DocumentState>) -> Self {
        Self(Some(Arc::clone(state)))
    }

    pub(crate) fn detached() -> Self {
        Self(None)
    }

    pub(crate) fn is_read_only(&self) -> bool {
        self.0.as_ref().is_some_and(|state| state.is_read_only())
    }

    pub(crate) fn tracks_access(&self) -> bool {
        self.0.as_ref().is_some_and(|state| state.track_access())
    }

    pub(crate) fn tracks_modify(&self) -> bool {
        self.0.as_ref().is_some_and(|state| state.track_modify())
    }

    pub(crate) fn mark_changed(&self) {
        if let Some(state) = &self.0 {
            state.set_changed(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detached_owner_is_inert() {
        let owner = Owner::detached();
        assert!(!owner.is_read_only());
        assert!(!owner.tracks_access());
        assert!(!owner.tracks_modify());
        owner.mark_changed();
    }

    #[test]
    fn test_attached_owner_shares_flags() {
        let state = DocumentState::new();
        let owner = Owner::attached(&state);
        assert!(owner.tracks_modify());

        owner.mark_changed();
        assert!(state.has_changed());

        state.set_read_only(true);
        assert!(owner.is_read_only());
    }
}
