use crate::error::{Error, Result, StackError};

/// Return addresses used to call subroutines and return from them.
/// The classic machine can go 16 subroutines deep before the stack overflows, here the
/// capacity is chosen when the stack is created.
#[derive(Debug, Clone)]
pub struct Stack {
    values: Vec<u16>,
    capacity: usize,
}

impl Stack {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidConfig("stack capacity must be > 0".to_string()));
        }

        Ok(Self {
            values: Vec::with_capacity(capacity),
            capacity,
        })
    }

    pub fn push(&mut self, addr: u16) -> std::result::Result<(), StackError> {
        if self.values.len() == self.capacity {
            return Err(StackError::Full {
                capacity: self.capacity,
            });
        }
        self.values.push(addr);
        Ok(())
    }

    pub fn pop(&mut self) -> std::result::Result<u16, StackError> {
        self.values.pop().ok_or(StackError::Empty)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_capacity() {
        assert!(matches!(Stack::new(0), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn pushes_until_full() {
        let mut stack = Stack::new(2).unwrap();
        stack.push(1).unwrap();
        stack.push(2).unwrap();
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.push(3), Err(StackError::Full { capacity: 2 }));
        // a failed push leaves the stack as it was
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn pops_in_reverse_order() {
        let mut stack = Stack::new(2).unwrap();
        stack.push(0x111).unwrap();
        stack.push(0x222).unwrap();
        assert_eq!(stack.pop(), Ok(0x222));
        assert_eq!(stack.pop(), Ok(0x111));
        assert_eq!(stack.pop(), Err(StackError::Empty));
    }

    #[test]
    fn clear_empties_the_stack() {
        let mut stack = Stack::new(4).unwrap();
        stack.push(5).unwrap();
        stack.clear();
        assert!(stack.is_empty());
        assert_eq!(stack.capacity(), 4);
    }
}
