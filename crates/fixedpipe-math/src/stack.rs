use crate::Mat4;

/// Matrix stack for hierarchical transforms.
///
/// The stack always holds at least one entry; it starts as a single identity
/// matrix and [`pop`](Self::pop) never removes the last entry.
#[derive(Debug, Clone)]
pub struct MatrixStack {
    stack: Vec<Mat4>,
}

impl MatrixStack {
    pub fn new() -> Self {
        Self {
            stack: vec![Mat4::IDENTITY],
        }
    }

    /// Duplicates the top entry.
    pub fn push(&mut self) {
        let top = *self.top();
        self.stack.push(top);
    }

    /// Removes the top entry unless it is the only one.
    pub fn pop(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    pub fn load_identity(&mut self) {
        *self.top_mut() = Mat4::IDENTITY;
    }

    pub fn load(&mut self, m: Mat4) {
        *self.top_mut() = m;
    }

    /// Post-multiplies the top: `top = top * m` (applies `m` after the
    /// current transform in the row-vector convention).
    pub fn mult(&mut self, m: Mat4) {
        let top = self.top_mut();
        *top = *top * m;
    }

    /// Pre-multiplies the top: `top = m * top` (applies `m` before the
    /// current transform).
    pub fn mult_local(&mut self, m: Mat4) {
        let top = self.top_mut();
        *top = m * *top;
    }

    pub fn top(&self) -> &Mat4 {
        self.stack.last().expect("stack is never empty")
    }

    pub fn top_mut(&mut self) -> &mut Mat4 {
        self.stack.last_mut().expect("stack is never empty")
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

impl Default for MatrixStack {
    fn default() -> Self {
        Self::new()
    }
}
