//! Resolution stack used to detect re-entry into a binding under resolution.

use parking_lot::Mutex;

use crate::error::{DiError, DiResult};
use crate::registration::BindingId;

pub(crate) const MAX_DEPTH: usize = 1024;

#[derive(Clone, Copy)]
struct Frame {
    id: BindingId,
    name: &'static str,
}

/// Bindings currently being resolved, innermost last.
///
/// All operations of a container run under its re-entrant operation lock, so
/// the stack only ever belongs to one thread at a time. Nested resolves from
/// `on_ready` hooks push onto the same stack.
pub(crate) struct ResolutionStack {
    frames: Mutex<Vec<Frame>>,
    max_depth: usize,
}

impl ResolutionStack {
    pub(crate) fn new(max_depth: usize) -> Self {
        Self {
            frames: Mutex::new(Vec::new()),
            max_depth,
        }
    }

    pub(crate) fn contains(&self, id: BindingId) -> bool {
        self.frames.lock().iter().any(|f| f.id == id)
    }

    /// Path from the first occurrence of `id` to the top of the stack, closed
    /// with `name`. Empty when `id` is not on the stack.
    pub(crate) fn cycle_path(&self, id: BindingId, name: &'static str) -> Vec<&'static str> {
        let frames = self.frames.lock();
        match frames.iter().position(|f| f.id == id) {
            Some(start) => {
                let mut path: Vec<_> = frames[start..].iter().map(|f| f.name).collect();
                path.push(name);
                path
            }
            None => Vec::new(),
        }
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.lock().len()
    }

    /// Pushes `id`; the returned guard pops it again.
    pub(crate) fn enter(&self, id: BindingId, name: &'static str) -> DiResult<StackGuard<'_>> {
        let mut frames = self.frames.lock();

        // Circular detection BEFORE pushing
        if let Some(start) = frames.iter().position(|f| f.id == id) {
            let mut path: Vec<_> = frames[start..].iter().map(|f| f.name).collect();
            path.push(name);
            return Err(DiError::Circular(path));
        }

        if frames.len() >= self.max_depth {
            return Err(DiError::DepthExceeded(frames.len()));
        }

        frames.push(Frame { id, name });
        Ok(StackGuard { stack: self, id })
    }
}

impl Default for ResolutionStack {
    fn default() -> Self {
        Self::new(MAX_DEPTH)
    }
}

/// Pops its frame when dropped, on success and error paths alike.
pub(crate) struct StackGuard<'a> {
    stack: &'a ResolutionStack,
    id: BindingId,
}

impl Drop for StackGuard<'_> {
    fn drop(&mut self) {
        let mut frames = self.stack.frames.lock();
        if let Some(last) = frames.pop() {
            debug_assert_eq!(last.id, self.id);
        }
    }
}
