//! RotateLayoutsUseCase: cycles through layouts in configuration order.

use pixmux_core::LayoutId;

/// Round-robin cursor over a fixed list of layouts.
#[derive(Debug, Clone)]
pub struct LayoutRotation {
    order: Vec<LayoutId>,
    position: usize,
}

impl LayoutRotation {
    /// Starts at `start`, or at the first layout if `start` is not in `order`.
    pub fn new(order: Vec<LayoutId>, start: LayoutId) -> Self {
        let position = order.iter().position(|id| *id == start).unwrap_or(0);
        Self { order, position }
    }

    pub fn current(&self) -> Option<LayoutId> {
        self.order.get(self.position).copied()
    }

    /// Moves to the following layout, wrapping around.
    ///
    /// Returns `None` when there is nothing to rotate to (fewer than two layouts).
    pub fn advance(&mut self) -> Option<LayoutId> {
        if self.order.len() < 2 {
            return None;
        }
        self.position = (self.position + 1) % self.order.len();
        self.current()
    }

    /// Re-syncs the cursor after a switch made outside the rotation.
    pub fn follow(&mut self, current: LayoutId) {
        if let Some(position) = self.order.iter().position(|id| *id == current) {
            self.position = position;
        }
    }
}
