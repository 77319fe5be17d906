//! Capture boundaries record every widget created while a builder runs.
//!
//! Boundaries nest. A widget is recorded in the innermost open boundary
//! only. A boundary that is dropped without [`CaptureBoundary::finish`]
//! still pops itself, so the stack stays balanced when a builder fails.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tessera_common::WidgetHandle;

#[derive(Debug, Default)]
struct Frame {
    created: Vec<WidgetHandle>,
    adopted: HashSet<WidgetHandle>,
}

/// Widgets recorded by one boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captured {
    /// Every widget created, in creation order.
    pub created: Vec<WidgetHandle>,
    /// Created widgets that were never added to a container.
    pub roots: Vec<WidgetHandle>,
}

impl Captured {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct CaptureStack {
    frames: Mutex<Vec<Frame>>,
}

impl CaptureStack {
    pub fn new() -> Self {
        Self::default()
    }

    fn frames(&self) -> MutexGuard<'_, Vec<Frame>> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn depth(&self) -> usize {
        self.frames().len()
    }

    pub fn begin(&self) -> CaptureBoundary<'_> {
        let mut frames = self.frames();
        frames.push(Frame::default());
        CaptureBoundary {
            stack: self,
            depth: frames.len(),
            open: true,
        }
    }

    pub fn record(&self, handle: &WidgetHandle) {
        if let Some(frame) = self.frames().last_mut() {
            frame.created.push(handle.clone());
        }
    }

    /// `handle` now has a parent and is no longer a root.
    pub fn adopt(&self, handle: &WidgetHandle) {
        if let Some(frame) = self.frames().last_mut() {
            frame.adopted.insert(handle.clone());
        }
    }

    fn pop_to(&self, depth: usize) -> Option<Frame> {
        let mut frames = self.frames();
        if frames.len() < depth {
            return None;
        }
        // Inner boundaries leaked past this one are discarded with it.
        frames.truncate(depth);
        frames.pop()
    }
}

/// One open boundary on a [`CaptureStack`].
#[must_use = "a boundary captures only while it is held"]
pub struct CaptureBoundary<'a> {
    stack: &'a CaptureStack,
    depth: usize,
    open: bool,
}

impl CaptureBoundary<'_> {
    pub fn finish(mut self) -> Captured {
        self.open = false;
        let frame = self.stack.pop_to(self.depth).unwrap_or_default();
        let roots = frame
            .created
            .iter()
            .filter(|h| !frame.adopted.contains(*h))
            .cloned()
            .collect();
        Captured {
            created: frame.created,
            roots,
        }
    }
}

impl Drop for CaptureBoundary<'_> {
    fn drop(&mut self) {
        if self.open {
            self.stack.pop_to(self.depth);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(s: &str) -> WidgetHandle {
        WidgetHandle::new(s)
    }

    #[test]
    fn records_only_inside_a_boundary() {
        let stack = CaptureStack::new();
        stack.record(&h("label_1"));
        let boundary = stack.begin();
        stack.record(&h("label_2"));
        let captured = boundary.finish();
        assert_eq!(captured.created, vec![h("label_2")]);
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn adopted_widgets_are_not_roots() {
        let stack = CaptureStack::new();
        let boundary = stack.begin();
        stack.record(&h("vbox_1"));
        stack.record(&h("label_2"));
        stack.adopt(&h("label_2"));
        let captured = boundary.finish();
        assert_eq!(captured.roots, vec![h("vbox_1")]);
        assert_eq!(captured.created.len(), 2);
    }

    #[test]
    fn nested_boundaries_capture_innermost() {
        let stack = CaptureStack::new();
        let outer = stack.begin();
        stack.record(&h("a_1"));
        let inner = stack.begin();
        stack.record(&h("b_2"));
        assert_eq!(inner.finish().created, vec![h("b_2")]);
        stack.record(&h("c_3"));
        assert_eq!(outer.finish().created, vec![h("a_1"), h("c_3")]);
    }

    #[test]
    fn dropped_boundary_keeps_stack_balanced() {
        let stack = CaptureStack::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _boundary = stack.begin();
            stack.record(&h("label_1"));
            panic!("builder failed");
        }));
        assert!(result.is_err());
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn finishing_outer_discards_leaked_inner() {
        let stack = CaptureStack::new();
        let outer = stack.begin();
        std::mem::forget(stack.begin());
        stack.record(&h("x_1"));
        let captured = outer.finish();
        assert!(captured.is_empty());
        assert_eq!(stack.depth(), 0);
    }
}
