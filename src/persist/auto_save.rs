//! Debounced save scheduling.
//!
//! Each save channel owns a single pending deadline. A new mutation replaces
//! the deadline instead of stacking another one, so a burst of edits collapses
//! into one write after the channel goes quiet.
//!
//! Timers are polled: the host calls [`AutoSaveManager::due_at`] from its
//! event loop (or [`AutoSaveManager::due`] with the wall clock) and performs
//! the writes for whatever channels are due.

use std::time::Duration;
use web_time::Instant;

use crate::constants::debounce;

/// Independent save channels. Both currently write the `meta` record; they
/// are kept apart so note edits and structural edits debounce separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveChannel {
    /// Page list, cursor, mode, memos.
    Meta,
    /// Note geometry, style and markup.
    Notes,
}

impl SaveChannel {
    pub const ALL: [SaveChannel; 2] = [SaveChannel::Meta, SaveChannel::Notes];
}

/// A single replace-don't-stack timer.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    /// When the pending work becomes due; `None` when nothing is pending.
    deadline: Option<Instant>,
}

impl Debouncer {
    /// Idle debouncer with the given delay.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Delay between the last trigger and firing.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Whether a trigger is waiting to fire.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// When the pending trigger fires.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Arm (or re-arm) the timer relative to `now`.
    pub fn trigger_at(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Restart the delay from now.
    pub fn trigger(&mut self) {
        self.trigger_at(Instant::now());
    }

    /// Whether the delay has elapsed at `now`.
    pub fn is_due_at(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|d| now >= d)
    }

    /// Consume the timer if it has fired.
    pub fn fire_at(&mut self, now: Instant) -> bool {
        if self.is_due_at(now) {
            self.deadline = None;
            true
        } else {
            false
        }
    }

    /// Drop the pending trigger.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

/// Manages debounced saves for every [`SaveChannel`].
#[derive(Debug, Clone)]
pub struct AutoSaveManager {
    meta: Debouncer,
    notes: Debouncer,

    /// Time of last successful save.
    last_save: Option<Instant>,

    /// Number of consecutive failed saves.
    failures: u32,

    enabled: bool,
}

impl AutoSaveManager {
    /// Default debounce for structural edits.
    pub const DEFAULT_META_DELAY: Duration = Duration::from_millis(debounce::META_MS);

    /// Default debounce for note edits.
    pub const DEFAULT_NOTES_DELAY: Duration = Duration::from_millis(debounce::NOTES_MS);

    /// Manager with the default delays.
    pub fn new() -> Self {
        Self::with_delays(Self::DEFAULT_META_DELAY, Self::DEFAULT_NOTES_DELAY)
    }

    /// Manager with explicit per-channel delays.
    pub fn with_delays(meta: Duration, notes: Duration) -> Self {
        Self {
            meta: Debouncer::new(meta),
            notes: Debouncer::new(notes),
            last_save: None,
            failures: 0,
            enabled: true,
        }
    }

    /// Create a disabled manager; marks are recorded but never come due.
    pub fn disabled() -> Self {
        let mut manager = Self::new();
        manager.enabled = false;
        manager
    }

    fn timer(&self, channel: SaveChannel) -> &Debouncer {
        match channel {
            SaveChannel::Meta => &self.meta,
            SaveChannel::Notes => &self.notes,
        }
    }

    fn timer_mut(&mut self, channel: SaveChannel) -> &mut Debouncer {
        match channel {
            SaveChannel::Meta => &mut self.meta,
            SaveChannel::Notes => &mut self.notes,
        }
    }

    /// Record a mutation on `channel`, replacing any pending deadline.
    pub fn mark_dirty_at(&mut self, channel: SaveChannel, now: Instant) {
        self.timer_mut(channel).trigger_at(now);
        log::trace!("Auto-save: {:?} marked dirty", channel);
    }

    /// Schedule a save of `channel`.
    pub fn mark_dirty(&mut self, channel: SaveChannel) {
        self.mark_dirty_at(channel, Instant::now());
    }

    /// Whether any channel waits for a save.
    pub fn is_dirty(&self) -> bool {
        self.meta.is_pending() || self.notes.is_pending()
    }

    /// Whether `channel` waits for a save.
    pub fn is_channel_dirty(&self, channel: SaveChannel) -> bool {
        self.timer(channel).is_pending()
    }

    /// Channels whose debounce has elapsed.
    pub fn due_at(&self, now: Instant) -> Vec<SaveChannel> {
        if !self.enabled {
            return Vec::new();
        }
        SaveChannel::ALL
            .into_iter()
            .filter(|c| self.timer(*c).is_due_at(now))
            .collect()
    }

    /// Channels due now.
    pub fn due(&self) -> Vec<SaveChannel> {
        self.due_at(Instant::now())
    }

    /// Channels with pending work regardless of their deadline (for flush).
    pub fn pending(&self) -> Vec<SaveChannel> {
        SaveChannel::ALL
            .into_iter()
            .filter(|c| self.timer(*c).is_pending())
            .collect()
    }

    /// Mark that a save covering `channels` completed.
    pub fn mark_saved_at(&mut self, channels: &[SaveChannel], now: Instant) {
        for channel in channels {
            self.timer_mut(*channel).cancel();
        }
        self.last_save = Some(now);
        self.failures = 0;
        log::trace!("Auto-save: {:?} saved", channels);
    }

    /// Record a successful save of `channels` now.
    pub fn mark_saved(&mut self, channels: &[SaveChannel]) {
        self.mark_saved_at(channels, Instant::now());
    }

    /// Mark that a save covering `channels` failed.
    ///
    /// The channels stay dirty and are re-armed so the next debounce retries.
    pub fn mark_save_failed_at(&mut self, channels: &[SaveChannel], now: Instant) {
        for channel in channels {
            self.timer_mut(*channel).trigger_at(now);
        }
        self.failures = self.failures.saturating_add(1);
        log::trace!("Auto-save: {:?} failed ({} in a row)", channels, self.failures);
    }

    /// Record a failed save of `channels` now.
    pub fn mark_save_failed(&mut self, channels: &[SaveChannel]) {
        self.mark_save_failed_at(channels, Instant::now());
    }

    /// Failed saves since the last success.
    pub fn consecutive_failures(&self) -> u32 {
        self.failures
    }

    /// Enable or disable automatic saves.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        log::debug!("Auto-save: enabled = {}", enabled);
    }

    /// Whether automatic saves are on.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// When the last successful save finished.
    pub fn last_save(&self) -> Option<Instant> {
        self.last_save
    }

    /// Drop all pending work, e.g. after a full document replacement.
    pub fn reset(&mut self) {
        self.meta.cancel();
        self.notes.cancel();
        self.failures = 0;
    }
}

impl Default for AutoSaveManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_initial_state() {
        let manager = AutoSaveManager::new();
        assert!(!manager.is_dirty());
        assert!(manager.due_at(Instant::now()).is_empty());
        assert!(manager.is_enabled());
    }

    #[test]
    fn test_debounce_not_due_before_delay() {
        let t0 = Instant::now();
        let mut manager = AutoSaveManager::new();
        manager.mark_dirty_at(SaveChannel::Notes, t0);
        assert!(manager.due_at(t0 + ms(149)).is_empty());
        assert_eq!(manager.due_at(t0 + ms(150)), vec![SaveChannel::Notes]);
    }

    #[test]
    fn test_burst_collapses_into_one_deadline() {
        let t0 = Instant::now();
        let mut manager = AutoSaveManager::new();
        for i in 0..10 {
            manager.mark_dirty_at(SaveChannel::Meta, t0 + ms(i * 50));
        }
        // Last mark at 450ms, so due at 650ms and not before.
        assert!(manager.due_at(t0 + ms(640)).is_empty());
        assert_eq!(manager.due_at(t0 + ms(650)), vec![SaveChannel::Meta]);
    }

    #[test]
    fn test_channels_are_independent() {
        let t0 = Instant::now();
        let mut manager = AutoSaveManager::new();
        manager.mark_dirty_at(SaveChannel::Meta, t0);
        manager.mark_dirty_at(SaveChannel::Notes, t0);
        assert_eq!(manager.due_at(t0 + ms(160)), vec![SaveChannel::Notes]);
        assert_eq!(
            manager.due_at(t0 + ms(200)),
            vec![SaveChannel::Meta, SaveChannel::Notes]
        );

        manager.mark_saved_at(&[SaveChannel::Notes], t0 + ms(160));
        assert!(manager.is_channel_dirty(SaveChannel::Meta));
        assert!(!manager.is_channel_dirty(SaveChannel::Notes));
    }

    #[test]
    fn test_failed_save_rearms() {
        let t0 = Instant::now();
        let mut manager = AutoSaveManager::new();
        manager.mark_dirty_at(SaveChannel::Notes, t0);
        let fail_at = t0 + ms(150);
        manager.mark_save_failed_at(&[SaveChannel::Notes], fail_at);
        assert!(manager.is_dirty());
        assert_eq!(manager.consecutive_failures(), 1);
        assert!(manager.due_at(fail_at + ms(10)).is_empty());
        assert_eq!(manager.due_at(fail_at + ms(150)), vec![SaveChannel::Notes]);

        manager.mark_saved_at(&[SaveChannel::Notes], fail_at + ms(150));
        assert!(!manager.is_dirty());
        assert_eq!(manager.consecutive_failures(), 0);
        assert!(manager.last_save().is_some());
    }

    #[test]
    fn test_disabled_never_due() {
        let t0 = Instant::now();
        let mut manager = AutoSaveManager::disabled();
        manager.mark_dirty_at(SaveChannel::Meta, t0);
        assert!(manager.due_at(t0 + ms(10_000)).is_empty());
        assert_eq!(manager.pending(), vec![SaveChannel::Meta]);
    }

    #[test]
    fn test_reset() {
        let mut manager = AutoSaveManager::new();
        manager.mark_dirty(SaveChannel::Meta);
        manager.mark_dirty(SaveChannel::Notes);
        manager.reset();
        assert!(!manager.is_dirty());
    }

    #[test]
    fn test_debouncer_fire_consumes() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(ms(60));
        d.trigger_at(t0);
        assert!(!d.fire_at(t0 + ms(59)));
        assert!(d.fire_at(t0 + ms(60)));
        assert!(!d.is_pending());
        assert!(!d.fire_at(t0 + ms(120)));
    }
}
