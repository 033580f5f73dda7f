use std::time::Instant;

use crate::constants::TIMER_PERIOD;

/// The delay and sound timers.
///
/// Both count down towards zero at 60hz. The countdown is driven by wall clock time rather
/// than by how often the cpu cycles, so ticking fast does not drain them any quicker, and a
/// driver that stalls catches up by however many periods went by.
#[derive(Debug, Clone, Copy)]
pub struct Timers {
    /// 0 by default, unless it's set to a number then it will just start decrementing by one
    /// 60 times per second
    delay: u8,
    /// Same as the delay timer, except the sound timer causes a beep when it's not zero
    sound: u8,
    last_decrement: Instant,
}

impl Timers {
    pub fn new(now: Instant) -> Self {
        Self {
            delay: 0,
            sound: 0,
            last_decrement: now,
        }
    }

    pub fn delay(&self) -> u8 {
        self.delay
    }
    pub fn set_delay(&mut self, value: u8) {
        self.delay = value;
    }
    pub fn sound(&self) -> u8 {
        self.sound
    }
    pub fn set_sound(&mut self, value: u8) {
        self.sound = value;
    }

    /// Decrements both timers once for every full period since the last decrement.
    /// Leftover time carries over to the next call.
    pub fn update(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_decrement);
        let periods = elapsed.as_nanos() / TIMER_PERIOD.as_nanos();
        if periods == 0 {
            return;
        }

        let steps = u8::try_from(periods).unwrap_or(u8::MAX);
        self.delay = self.delay.saturating_sub(steps);
        self.sound = self.sound.saturating_sub(steps);

        // u32 is plenty for the periods we can observe, anything bigger drained the timers
        match u32::try_from(periods) {
            Ok(periods) => self.last_decrement += TIMER_PERIOD * periods,
            Err(_) => self.last_decrement = now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn does_not_decrement_within_a_period() {
        let start = Instant::now();
        let mut timers = Timers::new(start);
        timers.set_delay(10);
        timers.set_sound(10);
        for ms in 0..16 {
            timers.update(start + Duration::from_millis(ms));
        }
        assert_eq!(timers.delay(), 10);
        assert_eq!(timers.sound(), 10);
    }

    #[test]
    fn decrements_once_per_period() {
        let start = Instant::now();
        let mut timers = Timers::new(start);
        timers.set_delay(10);
        timers.update(start + TIMER_PERIOD);
        assert_eq!(timers.delay(), 9);
        // many fast updates inside the next period do nothing
        timers.update(start + TIMER_PERIOD + Duration::from_millis(1));
        timers.update(start + TIMER_PERIOD + Duration::from_millis(2));
        assert_eq!(timers.delay(), 9);
        timers.update(start + TIMER_PERIOD * 2);
        assert_eq!(timers.delay(), 8);
    }

    #[test]
    fn catches_up_after_a_stall() {
        let start = Instant::now();
        let mut timers = Timers::new(start);
        timers.set_delay(10);
        timers.set_sound(3);
        timers.update(start + TIMER_PERIOD * 4 + Duration::from_millis(5));
        assert_eq!(timers.delay(), 6);
        // clamped at zero
        assert_eq!(timers.sound(), 0);
        // the 5ms left over count towards the next period
        timers.update(start + TIMER_PERIOD * 5);
        assert_eq!(timers.delay(), 5);
    }

    #[test]
    fn long_stalls_clamp_at_zero() {
        let start = Instant::now();
        let mut timers = Timers::new(start);
        timers.set_delay(255);
        timers.update(start + Duration::from_secs(3600));
        assert_eq!(timers.delay(), 0);
    }

    #[test]
    fn time_going_backwards_is_ignored() {
        let start = Instant::now() + Duration::from_secs(1);
        let mut timers = Timers::new(start);
        timers.set_delay(1);
        timers.update(start - Duration::from_millis(500));
        assert_eq!(timers.delay(), 1);
    }
}
