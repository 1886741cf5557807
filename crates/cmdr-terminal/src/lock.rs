//! Passphrase lock in front of the dispatcher.
//!
//! A soft lock blocks registered and fallback commands but still lets the
//! internal administrative commands run (so `help` and `?` keep working).
//! A hard lock blocks everything except an unlock attempt.

use cmdr_types::config::LockConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockGate {
    locked: bool,
    hard: bool,
    passphrase: Option<String>,
}

impl LockGate {
    pub fn from_config(config: &LockConfig) -> Self {
        Self {
            locked: config.locked,
            hard: config.hard,
            passphrase: config.passphrase.clone(),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Hard mode is configured (whether or not currently locked).
    pub fn is_hard(&self) -> bool {
        self.hard
    }

    /// Only an unlock attempt may be evaluated.
    pub fn blocks_all(&self) -> bool {
        self.locked && self.hard
    }

    /// Registered and fallback commands may run.
    pub fn permits_dispatch(&self) -> bool {
        !self.locked
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    pub fn set_hard(&mut self, hard: bool) {
        self.hard = hard;
    }

    pub fn set_passphrase(&mut self, passphrase: Option<String>) {
        self.passphrase = passphrase;
    }

    /// `line` is `U` followed by the passphrase as its first token. With no
    /// passphrase configured any `U` line qualifies.
    pub fn accepts(&self, line: &[u8]) -> bool {
        let Some(rest) = line.strip_prefix(b"U") else {
            return false;
        };
        let Some(pass) = &self.passphrase else {
            return true;
        };
        rest.split(|b| b.is_ascii_whitespace())
            .find(|token| !token.is_empty())
            .is_some_and(|token| token == pass.as_bytes())
    }

    /// Unlock if `line` is an accepted unlock attempt.
    pub fn try_unlock(&mut self, line: &[u8]) -> bool {
        if self.accepts(line) {
            self.unlock();
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(locked: bool, hard: bool, pass: Option<&str>) -> LockGate {
        LockGate::from_config(&LockConfig {
            locked,
            hard,
            passphrase: pass.map(str::to_string),
        })
    }

    #[test]
    fn default_is_open() {
        let g = LockGate::default();
        assert!(!g.is_locked());
        assert!(g.permits_dispatch());
        assert!(!g.blocks_all());
    }

    #[test]
    fn hard_lock_blocks_all() {
        let g = gate(true, true, None);
        assert!(g.blocks_all());
        assert!(!g.permits_dispatch());
    }

    #[test]
    fn soft_lock_blocks_dispatch_only() {
        let g = gate(true, false, None);
        assert!(!g.blocks_all());
        assert!(!g.permits_dispatch());
    }

    #[test]
    fn unlock_without_passphrase() {
        let mut g = gate(true, true, None);
        assert!(!g.try_unlock(b"help\n"));
        assert!(g.is_locked());
        assert!(g.try_unlock(b"U\n"));
        assert!(!g.is_locked());
    }

    #[test]
    fn unlock_checks_passphrase() {
        let mut g = gate(true, true, Some("open"));
        assert!(!g.try_unlock(b"U\n"));
        assert!(!g.try_unlock(b"U wrong\n"));
        assert!(!g.try_unlock(b"U opener\n"));
        assert!(!g.try_unlock(b"X open\n"));
        assert!(g.is_locked());
        assert!(g.try_unlock(b"U open\r\n"));
        assert!(!g.is_locked());
    }

    #[test]
    fn passphrase_token_may_follow_extra_spaces() {
        let g = gate(true, false, Some("open"));
        assert!(g.accepts(b"U   open\n"));
        assert!(g.accepts(b"Uopen\n"));
    }

    #[test]
    fn lock_and_mode_changes() {
        let mut g = LockGate::default();
        g.set_hard(true);
        assert!(g.is_hard());
        assert!(!g.blocks_all());
        g.lock();
        assert!(g.blocks_all());
        g.set_passphrase(Some("k".into()));
        assert!(!g.accepts(b"U"));
        g.unlock();
        assert!(g.permits_dispatch());
    }
}
