//! Auto-save timer.
//!
//! The periodic timer is armed exactly while auto-save is enabled, the
//! document has a location, is writable and the tab is in `Normal` or
//! `ShowingPrintPreview`. A fire that finds the tab busy leaves a one-shot
//! retry timer that survives busy states.

use std::time::{Duration, Instant};

use quire_core::{Lockdown, SaveFlags};
use quire_document::DocumentIo;

use crate::tab::{PendingSave, SaveKind, Tab};

/// Delay before an auto-save that found the tab busy tries again.
pub const AUTO_SAVE_RETRY_DELAY: Duration = Duration::from_secs(30);

/// When the auto-save callback should run next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoSaveTimer {
    pub due: Instant,
    /// One-shot retry after the tab was busy.
    pub retry: bool,
}

impl Tab {
    pub fn auto_save_enabled(&self) -> bool {
        self.auto_save_enabled
    }

    /// Interval in minutes.
    pub fn auto_save_interval(&self) -> u32 {
        self.auto_save_interval
    }

    pub fn auto_save_timer(&self) -> Option<AutoSaveTimer> {
        self.auto_save_timer
    }

    /// Enable or disable auto-save. The save-to-disk lockdown keeps it off.
    pub fn set_auto_save_enabled(&mut self, enabled: bool, lockdown: Lockdown) {
        let enabled = enabled && !lockdown.contains(Lockdown::SAVE_TO_DISK);
        if self.auto_save_enabled == enabled {
            return;
        }
        log::debug!("{}: auto-save {}", self.id, if enabled { "on" } else { "off" });
        self.auto_save_enabled = enabled;
        self.sync_auto_save();
    }

    /// Change the period; an armed periodic timer restarts with it.
    pub fn set_auto_save_interval(&mut self, minutes: u32) {
        let minutes = minutes.max(1);
        if self.auto_save_interval == minutes {
            return;
        }
        self.auto_save_interval = minutes;
        if matches!(self.auto_save_timer, Some(timer) if !timer.retry) {
            self.arm_periodic(Instant::now());
        }
    }

    /// Run the auto-save callback if its timer is due.
    pub fn poll_timers(&mut self, io: &mut dyn DocumentIo, now: Instant) {
        if matches!(self.auto_save_timer, Some(timer) if timer.due <= now) {
            self.auto_save_timeout(io, now);
        }
    }

    /// The auto-save callback. Returns whether a save was started.
    pub fn auto_save_timeout(&mut self, io: &mut dyn DocumentIo, now: Instant) -> bool {
        self.auto_save_timer = None;

        if !self.auto_save_applies() {
            log::debug!("{}: auto-save no longer applies", self.id);
            return false;
        }

        if !self.state.permits_auto_save() {
            log::debug!(
                "{}: busy in state {}, auto-save retries in {}s",
                self.id,
                self.state,
                AUTO_SAVE_RETRY_DELAY.as_secs()
            );
            self.auto_save_timer = Some(AutoSaveTimer {
                due: now + AUTO_SAVE_RETRY_DELAY,
                retry: true,
            });
            return false;
        }

        if !self.document.is_modified() {
            self.arm_periodic(now);
            return false;
        }

        let Some(location) = self.document.location().cloned() else {
            return false;
        };
        log::info!("{}: auto-saving {}", self.id, location);
        self.begin_save(
            io,
            PendingSave {
                location,
                encoding: self.document.encoding(),
                flags: self.save_flags | SaveFlags::PRESERVE_BACKUP,
                kind: SaveKind::Save,
            },
        );
        true
    }

    /// Document-level conditions for auto-saving, independent of state.
    fn auto_save_applies(&self) -> bool {
        self.auto_save_enabled && !self.document.is_untitled() && !self.document.is_readonly()
    }

    /// Bring the timer in line with the current state and document.
    pub(crate) fn sync_auto_save(&mut self) {
        if self.state == quire_core::TabState::Closing || !self.auto_save_applies() {
            self.auto_save_timer = None;
            return;
        }
        match self.auto_save_timer {
            Some(timer) if timer.retry => {}
            Some(_) if !self.state.permits_auto_save() => self.auto_save_timer = None,
            None if self.state.permits_auto_save() => self.arm_periodic(Instant::now()),
            _ => {}
        }
    }

    fn arm_periodic(&mut self, now: Instant) {
        let period = Duration::from_secs(u64::from(self.auto_save_interval) * 60);
        self.auto_save_timer = Some(AutoSaveTimer {
            due: now + period,
            retry: false,
        });
    }
}
