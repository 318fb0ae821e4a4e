//! Operand stack.
//!
//! Operands are pushed in the order they are written, so handlers pop an
//! operator's parameters last to first. Typed pops remove the operand before
//! checking its type: a wrong-typed operand is consumed, not left behind.

use crate::content::Matrix;
use crate::error::{Error, Result};
use crate::object::Object;
use std::collections::VecDeque;

/// LIFO stack of operands waiting for the next operator.
#[derive(Debug, Clone)]
pub struct OperandStack {
    items: VecDeque<Object>,
    max: usize,
    /// Operands dropped since the stack last had room.
    dropped: usize,
}

impl OperandStack {
    /// Stack holding at most `max` operands (0 = unbounded).
    pub fn new(max: usize) -> Self {
        Self {
            items: VecDeque::new(),
            max,
            dropped: 0,
        }
    }

    /// Push an operand, dropping the oldest one when full.
    ///
    /// One warning is logged per overflow; it ends once an operand is
    /// popped or the stack is cleared.
    pub fn push(&mut self, obj: Object) {
        if self.max > 0 && self.items.len() >= self.max {
            if self.dropped == 0 {
                log::warn!("Operand stack full ({} entries), dropping oldest operands", self.max);
            }
            self.dropped += 1;
            self.items.pop_front();
        }
        self.items.push_back(obj);
    }

    /// Pop the top operand.
    pub fn pop(&mut self) -> Result<Object> {
        self.end_overflow();
        self.items.pop_back().ok_or(Error::Underflow)
    }

    /// Top operand without removing it.
    pub fn peek(&self) -> Option<&Object> {
        self.items.back()
    }

    /// Operands dropped in the current overflow, 0 when there is none.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    fn end_overflow(&mut self) {
        if self.dropped > 0 {
            log::debug!("Operand stack overflow dropped {} operands", self.dropped);
            self.dropped = 0;
        }
    }

    /// Pop an integer or real.
    pub fn pop_number(&mut self) -> Result<f64> {
        let obj = self.pop()?;
        obj.as_number()
            .ok_or_else(|| Error::wrong_type("Number", obj.type_name()))
    }

    /// Pop a number and truncate it to an integer.
    pub fn pop_integer(&mut self) -> Result<i64> {
        Ok(self.pop_number()? as i64)
    }

    /// Pop a name.
    pub fn pop_name(&mut self) -> Result<String> {
        match self.pop()? {
            Object::Name(name) => Ok(name),
            other => Err(Error::wrong_type("Name", other.type_name())),
        }
    }

    /// Pop a literal or hex string.
    pub fn pop_string(&mut self) -> Result<Vec<u8>> {
        match self.pop()? {
            Object::String(s) => Ok(s),
            other => Err(Error::wrong_type("String", other.type_name())),
        }
    }

    /// Pop an array.
    pub fn pop_array(&mut self) -> Result<Vec<Object>> {
        match self.pop()? {
            Object::Array(items) => Ok(items),
            other => Err(Error::wrong_type("Array", other.type_name())),
        }
    }

    /// Pop the six operands `a b c d e f` of a matrix.
    pub fn pop_matrix(&mut self) -> Result<Matrix> {
        let mut values = [0.0f32; 6];
        for slot in values.iter_mut().rev() {
            *slot = self.pop_number()? as f32;
        }
        let [a, b, c, d, e, f] = values;
        Ok(Matrix::new(a, b, c, d, e, f))
    }

    /// Number of operands.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when no operand is waiting.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop every operand.
    pub fn clear(&mut self) {
        self.end_overflow();
        self.items.clear();
    }
}

impl Default for OperandStack {
    fn default() -> Self {
        Self::new(0)
    }
}
