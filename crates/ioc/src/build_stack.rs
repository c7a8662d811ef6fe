//! Build-stack guard: the chain of frames currently under construction.
//!
//! One stack belongs to one call tree. It lives next to the registry under
//! the container lock, so a factory body that calls back into the same
//! container extends the running chain instead of starting a fresh one.
//! Entering a frame yields a [`BuildFrame`] guard that pops the frame when
//! dropped, so early returns and `?` never leave stale frames behind.

use std::cell::RefCell;

use crate::errors::IocError;
use crate::types::Frame;

#[derive(Debug)]
pub struct BuildStack {
    frames: Vec<Frame>,
    /// `None` means unbounded; cycles still end every chain
    max_depth: Option<usize>,
    /// Deepest point reached since the last reset, for metrics
    high_water: usize,
}

impl BuildStack {
    pub fn new(max_depth: Option<usize>) -> Self {
        Self {
            frames: Vec::new(),
            max_depth,
            high_water: 0,
        }
    }

    /// Push `frame`, rejecting it when it is already under construction or
    /// the depth limit is reached.
    pub fn push(&mut self, frame: Frame) -> Result<(), IocError> {
        if self.contains(&frame) {
            let mut chain = self.frames.clone();
            chain.push(frame);
            return Err(IocError::DependencyCycle { chain });
        }

        if let Some(limit) = self.max_depth {
            if self.frames.len() >= limit {
                let mut chain = self.frames.clone();
                chain.push(frame);
                return Err(IocError::DepthLimitExceeded { limit, chain });
            }
        }

        self.frames.push(frame);
        self.high_water = self.high_water.max(self.frames.len());
        Ok(())
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    pub fn contains(&self, frame: &Frame) -> bool {
        self.frames.contains(frame)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn high_water(&self) -> usize {
        self.high_water
    }

    /// Start a new call tree. Only valid on an empty stack.
    pub fn reset_high_water(&mut self) {
        debug_assert!(self.frames.is_empty());
        self.high_water = 0;
    }
}

/// Scoped ownership of the top frame of a shared stack.
#[derive(Debug)]
pub struct BuildFrame<'a> {
    stack: &'a RefCell<BuildStack>,
}

impl<'a> BuildFrame<'a> {
    pub fn enter(stack: &'a RefCell<BuildStack>, frame: Frame) -> Result<Self, IocError> {
        stack.borrow_mut().push(frame)?;
        Ok(Self { stack })
    }

    pub fn depth(&self) -> usize {
        self.stack.borrow().depth()
    }
}

impl Drop for BuildFrame<'_> {
    fn drop(&mut self) {
        self.stack.borrow_mut().pop();
    }
}
