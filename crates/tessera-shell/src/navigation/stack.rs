use super::FrameId;

/// Ordered frame ids with the home frame pinned at the bottom. Only the
/// top frame is shown; the rest stay alive, hidden.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameStack {
    frames: Vec<FrameId>,
}

impl FrameStack {
    pub fn new(home: FrameId) -> Self {
        Self { frames: vec![home] }
    }

    pub fn home(&self) -> FrameId {
        self.frames[0]
    }

    pub fn top(&self) -> FrameId {
        self.frames[self.frames.len() - 1]
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn ids(&self) -> &[FrameId] {
        &self.frames
    }

    pub fn contains(&self, id: FrameId) -> bool {
        self.frames.contains(&id)
    }

    pub fn index_of(&self, id: FrameId) -> Option<usize> {
        self.frames.iter().position(|f| *f == id)
    }

    /// Returns false if `id` is already stacked.
    pub fn push(&mut self, id: FrameId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.frames.push(id);
        true
    }

    /// Pops the top frame unless only home remains.
    pub fn pop(&mut self) -> Option<FrameId> {
        if self.frames.len() == 1 {
            return None;
        }
        self.frames.pop()
    }

    /// Keep frames `0..=index`. Returns the removed ids, top first.
    pub fn truncate_to(&mut self, index: usize) -> Vec<FrameId> {
        if index + 1 >= self.frames.len() {
            return Vec::new();
        }
        let mut removed = self.frames.split_off(index + 1);
        removed.reverse();
        removed
    }

    /// Drop `id` from anywhere above home.
    pub fn remove(&mut self, id: FrameId) -> bool {
        match self.index_of(id) {
            Some(0) | None => false,
            Some(index) => {
                self.frames.remove(index);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(n: u64) -> FrameId {
        FrameId(n)
    }

    #[test]
    fn new_stack_is_just_home() {
        let stack = FrameStack::new(f(0));
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.top(), f(0));
        assert_eq!(stack.home(), f(0));
    }

    #[test]
    fn pop_never_removes_home() {
        let mut stack = FrameStack::new(f(0));
        stack.push(f(1));
        assert_eq!(stack.pop(), Some(f(1)));
        assert_eq!(stack.pop(), None);
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn push_rejects_duplicates() {
        let mut stack = FrameStack::new(f(0));
        assert!(stack.push(f(1)));
        assert!(!stack.push(f(1)));
        assert!(!stack.push(f(0)));
        assert_eq!(stack.ids(), &[f(0), f(1)]);
    }

    #[test]
    fn truncate_returns_removed_top_first() {
        let mut stack = FrameStack::new(f(0));
        stack.push(f(1));
        stack.push(f(2));
        stack.push(f(3));
        assert_eq!(stack.truncate_to(1), vec![f(3), f(2)]);
        assert_eq!(stack.top(), f(1));
        assert!(stack.truncate_to(5).is_empty());
    }

    #[test]
    fn remove_middle_frame() {
        let mut stack = FrameStack::new(f(0));
        stack.push(f(1));
        stack.push(f(2));
        assert!(stack.remove(f(1)));
        assert!(!stack.remove(f(0)));
        assert!(!stack.remove(f(9)));
        assert_eq!(stack.ids(), &[f(0), f(2)]);
    }
}
