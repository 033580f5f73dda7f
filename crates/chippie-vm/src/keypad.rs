use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded};
use tracing::debug;

use crate::constants::NUM_KEYS;
use crate::error::BoundsError;

/// The hexadecimal keypad as the cpu sees it.
///
/// Implementations are shared between the thread that produces key events and the thread
/// that cycles the cpu, so every method takes `&self`.
pub trait KeyInput: Send + Sync {
    /// Is `key` currently held down
    fn get(&self, key: usize) -> Result<bool, BoundsError>;

    /// Records a key going down or up. A key going down resolves the outstanding wait, if any.
    fn set(&self, key: usize, pressed: bool) -> Result<(), BoundsError>;

    /// Registers interest in the next key going down. Only one wait can be outstanding,
    /// registering a new one abandons the previous one.
    fn wait_for_keypress(&self) -> KeyWait;

    /// Abandons the outstanding wait, if any
    fn cancel_wait(&self);
}

/// Where a [`KeyWait`] is at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyWaitStatus {
    Pending,
    Pressed(u8),
    /// The key source dropped the wait, no key will ever arrive
    Abandoned,
}

/// The receiving end of a single keypress handoff
#[derive(Debug)]
pub struct KeyWait {
    receiver: Receiver<u8>,
}

impl KeyWait {
    /// Creates a connected pair, for key sources implementing [`KeyInput::wait_for_keypress`]
    pub fn channel() -> (Sender<u8>, KeyWait) {
        let (sender, receiver) = bounded(1);
        (sender, KeyWait { receiver })
    }

    /// Checks for a key without blocking
    pub fn poll(&self) -> KeyWaitStatus {
        match self.receiver.try_recv() {
            Ok(key) => KeyWaitStatus::Pressed(key),
            Err(TryRecvError::Empty) => KeyWaitStatus::Pending,
            Err(TryRecvError::Disconnected) => KeyWaitStatus::Abandoned,
        }
    }

    /// Blocks for at most `timeout` waiting for a key
    pub fn wait_timeout(&self, timeout: Duration) -> KeyWaitStatus {
        match self.receiver.recv_timeout(timeout) {
            Ok(key) => KeyWaitStatus::Pressed(key),
            Err(RecvTimeoutError::Timeout) => KeyWaitStatus::Pending,
            Err(RecvTimeoutError::Disconnected) => KeyWaitStatus::Abandoned,
        }
    }
}

#[derive(Debug, Default)]
struct KeypadState {
    /// A list of "buttons", set to true when pressed, false otherwise
    keys: [bool; NUM_KEYS as usize],
    waiter: Option<Sender<u8>>,
    /// Set once the producer is gone, every wait is abandoned from then on
    closed: bool,
}

/// A [`KeyInput`] guarded by a mutex, with the waiter kept as a single slot channel
#[derive(Debug, Default)]
pub struct Keypad {
    state: Mutex<KeypadState>,
}

impl Keypad {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a wait is registered and not yet resolved
    pub fn has_waiter(&self) -> bool {
        self.lock().waiter.is_some()
    }

    /// Marks the producer as gone. The outstanding wait and every later one report
    /// [`KeyWaitStatus::Abandoned`], key levels are still stored.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        if state.waiter.take().is_some() {
            debug!("closed keypad abandoned the outstanding key wait");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, KeypadState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn check_key(key: usize) -> Result<(), BoundsError> {
    if key >= usize::from(NUM_KEYS) {
        return Err(BoundsError::Key {
            key,
            count: usize::from(NUM_KEYS),
        });
    }
    Ok(())
}

impl KeyInput for Keypad {
    fn get(&self, key: usize) -> Result<bool, BoundsError> {
        check_key(key)?;
        Ok(self.lock().keys[key])
    }

    fn set(&self, key: usize, pressed: bool) -> Result<(), BoundsError> {
        check_key(key)?;
        let mut state = self.lock();
        state.keys[key] = pressed;

        if pressed {
            if let Some(waiter) = state.waiter.take() {
                // the slot is fresh so it can only fail if the cpu let go of the wait
                match waiter.try_send(key as u8) {
                    Ok(()) => debug!(key, "resolved key wait"),
                    Err(_) => debug!(key, "key wait was dropped before it resolved"),
                }
            }
        }
        Ok(())
    }

    fn wait_for_keypress(&self) -> KeyWait {
        let (sender, wait) = KeyWait::channel();
        let mut state = self.lock();
        if state.closed {
            // the sender drops here, nothing will ever press the key
            debug!("keypad is closed, key wait abandoned");
            return wait;
        }
        if state.waiter.replace(sender).is_some() {
            debug!("replaced an outstanding key wait");
        }
        wait
    }

    fn cancel_wait(&self) {
        if self.lock().waiter.take().is_some() {
            debug!("cancelled key wait");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn stores_key_levels() {
        let keypad = Keypad::new();
        keypad.set(0xE, true).unwrap();
        assert_eq!(keypad.get(0xE), Ok(true));
        keypad.set(0xE, false).unwrap();
        assert_eq!(keypad.get(0xE), Ok(false));
    }

    #[test]
    fn keys_are_bounds_checked() {
        let keypad = Keypad::new();
        assert_eq!(
            keypad.get(16),
            Err(BoundsError::Key { key: 16, count: 16 })
        );
        assert!(keypad.set(16, true).is_err());
    }

    #[test]
    fn a_press_resolves_the_wait_once() {
        let keypad = Keypad::new();
        let wait = keypad.wait_for_keypress();
        assert_eq!(wait.poll(), KeyWaitStatus::Pending);

        keypad.set(0x7, true).unwrap();
        assert!(!keypad.has_waiter());
        assert_eq!(wait.poll(), KeyWaitStatus::Pressed(0x7));

        // the registration is gone, later presses only change the level
        keypad.set(0x8, true).unwrap();
        assert_eq!(keypad.get(0x8), Ok(true));
        assert_eq!(wait.poll(), KeyWaitStatus::Abandoned);
    }

    #[test]
    fn releases_do_not_resolve_the_wait() {
        let keypad = Keypad::new();
        let wait = keypad.wait_for_keypress();
        keypad.set(0x3, false).unwrap();
        assert_eq!(wait.poll(), KeyWaitStatus::Pending);
        assert!(keypad.has_waiter());
    }

    #[test]
    fn cancelling_abandons_the_wait() {
        let keypad = Keypad::new();
        let wait = keypad.wait_for_keypress();
        keypad.cancel_wait();
        assert!(!keypad.has_waiter());
        assert_eq!(wait.poll(), KeyWaitStatus::Abandoned);
    }

    #[test]
    fn a_new_wait_replaces_the_old_one() {
        let keypad = Keypad::new();
        let old = keypad.wait_for_keypress();
        let new = keypad.wait_for_keypress();
        assert_eq!(old.poll(), KeyWaitStatus::Abandoned);
        keypad.set(0x1, true).unwrap();
        assert_eq!(new.poll(), KeyWaitStatus::Pressed(0x1));
    }

    #[test]
    fn dropping_the_wait_leaves_no_waiter_behind_after_a_press() {
        let keypad = Keypad::new();
        drop(keypad.wait_for_keypress());
        keypad.set(0x2, true).unwrap();
        assert!(!keypad.has_waiter());
    }

    #[test]
    fn closing_abandons_current_and_later_waits() {
        let keypad = Keypad::new();
        let before = keypad.wait_for_keypress();
        keypad.close();
        assert!(keypad.is_closed());
        assert_eq!(before.poll(), KeyWaitStatus::Abandoned);

        let after = keypad.wait_for_keypress();
        assert_eq!(after.poll(), KeyWaitStatus::Abandoned);
        assert!(!keypad.has_waiter());

        // levels still go through
        keypad.set(0x4, true).unwrap();
        assert_eq!(keypad.get(0x4), Ok(true));
    }

    #[test]
    fn presses_cross_threads() {
        let keypad = Arc::new(Keypad::new());
        let wait = keypad.wait_for_keypress();

        let producer = Arc::clone(&keypad);
        let handle = thread::spawn(move || producer.set(0xA, true));

        assert_eq!(
            wait.wait_timeout(Duration::from_secs(5)),
            KeyWaitStatus::Pressed(0xA)
        );
        handle.join().unwrap().unwrap();
    }
}
