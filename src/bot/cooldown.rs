// src/bot/cooldown.rs
//! Light per-user command throttling. Process-local by design: the map
//! resets on restart, which is fine for abuse prevention.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub struct CooldownGate {
    window: Duration,
    last_call: Mutex<HashMap<(i64, &'static str), Instant>>,
}

impl CooldownGate {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_call: Mutex::new(HashMap::new()),
        }
    }

    /// Record the call if allowed; otherwise return the whole seconds
    /// remaining (at least 1).
    pub fn check(&self, user_id: i64, command: &'static str) -> Result<(), u64> {
        let mut map = self.last_call.lock().expect("cooldown mutex poisoned");
        let now = Instant::now();
        if let Some(last) = map.get(&(user_id, command)) {
            let elapsed = now.duration_since(*last);
            if elapsed < self.window {
                let remaining = (self.window - elapsed).as_secs().max(1);
                return Err(remaining);
            }
        }
        map.insert((user_id, command), now);
        Ok(())
    }
}
