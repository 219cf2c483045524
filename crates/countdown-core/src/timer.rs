/// What the one-second tick currently drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerMode {
    #[default]
    Idle,
    CountingDown,
    Clocking,
}

impl TimerMode {
    pub fn is_running(self) -> bool {
        self != TimerMode::Idle
    }
}

/// Result of pressing Start/Pause or Clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Started(TimerMode),
    Stopped(TimerMode),
    /// One mode was stopped and the other started in the same press.
    Switched { from: TimerMode, to: TimerMode },
    /// Countdown refused because no goal time is set; a running clock is still stopped.
    NeedsGoal { stopped: Option<TimerMode> },
}

impl ToggleOutcome {
    /// The running session must be written out.
    pub fn ends_session(self) -> bool {
        matches!(
            self,
            ToggleOutcome::Stopped(_)
                | ToggleOutcome::Switched { .. }
                | ToggleOutcome::NeedsGoal { stopped: Some(_) }
        )
    }

    /// A fresh session begins.
    pub fn starts_session(self) -> bool {
        matches!(
            self,
            ToggleOutcome::Started(_) | ToggleOutcome::Switched { .. }
        )
    }

    pub fn status_text(self) -> &'static str {
        match self {
            ToggleOutcome::Started(TimerMode::Clocking)
            | ToggleOutcome::Switched {
                to: TimerMode::Clocking,
                ..
            } => "Clocking",
            ToggleOutcome::Started(_) | ToggleOutcome::Switched { .. } => "Counting down",
            ToggleOutcome::Stopped(TimerMode::Clocking) => "Clock off",
            ToggleOutcome::Stopped(_) => "Paused",
            ToggleOutcome::NeedsGoal { .. } => "Set a goal time first",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutcome {
    /// Seconds of work to credit to today.
    pub progressed: i64,
    /// The countdown just reached zero and the timer went idle.
    pub time_up: bool,
}

/// Countdown and clock state. Logged time is kept by the tracker; this only
/// decides what each second means.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Countdown {
    remaining_seconds: i64,
    mode: TimerMode,
    clock_offset_seconds: i64,
    show_clock: bool,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn remaining_seconds(&self) -> i64 {
        self.remaining_seconds
    }

    pub fn clock_offset_seconds(&self) -> i64 {
        self.clock_offset_seconds
    }

    pub fn set_goal(&mut self, seconds: i64) {
        self.remaining_seconds = seconds.max(0);
        if self.mode != TimerMode::Clocking {
            self.show_clock = false;
        }
    }

    pub fn toggle_countdown(&mut self) -> ToggleOutcome {
        let stopped_clock = self.mode == TimerMode::Clocking;
        match self.mode {
            TimerMode::CountingDown => {
                self.mode = TimerMode::Idle;
                ToggleOutcome::Stopped(TimerMode::CountingDown)
            }
            _ if self.remaining_seconds <= 0 => {
                self.mode = TimerMode::Idle;
                ToggleOutcome::NeedsGoal {
                    stopped: stopped_clock.then_some(TimerMode::Clocking),
                }
            }
            _ => {
                self.mode = TimerMode::CountingDown;
                self.show_clock = false;
                if stopped_clock {
                    ToggleOutcome::Switched {
                        from: TimerMode::Clocking,
                        to: TimerMode::CountingDown,
                    }
                } else {
                    ToggleOutcome::Started(TimerMode::CountingDown)
                }
            }
        }
    }

    pub fn toggle_clock(&mut self) -> ToggleOutcome {
        match self.mode {
            TimerMode::Clocking => {
                self.mode = TimerMode::Idle;
                ToggleOutcome::Stopped(TimerMode::Clocking)
            }
            TimerMode::CountingDown => {
                self.mode = TimerMode::Clocking;
                self.show_clock = true;
                ToggleOutcome::Switched {
                    from: TimerMode::CountingDown,
                    to: TimerMode::Clocking,
                }
            }
            TimerMode::Idle => {
                self.mode = TimerMode::Clocking;
                self.show_clock = true;
                ToggleOutcome::Started(TimerMode::Clocking)
            }
        }
    }

    /// Runs `seconds` whole ticks at once. A countdown never credits more than it
    /// had left.
    pub fn advance(&mut self, seconds: i64) -> TickOutcome {
        if seconds <= 0 {
            return TickOutcome::default();
        }
        match self.mode {
            TimerMode::Idle => TickOutcome::default(),
            TimerMode::Clocking => TickOutcome {
                progressed: seconds,
                time_up: false,
            },
            TimerMode::CountingDown => {
                if self.remaining_seconds <= 0 {
                    self.mode = TimerMode::Idle;
                    return TickOutcome {
                        progressed: 0,
                        time_up: true,
                    };
                }
                let progressed = seconds.min(self.remaining_seconds);
                self.remaining_seconds -= progressed;
                let time_up = self.remaining_seconds <= 0;
                if time_up {
                    self.mode = TimerMode::Idle;
                }
                TickOutcome {
                    progressed,
                    time_up,
                }
            }
        }
    }

    /// Stops everything. Returns the mode that was running.
    pub fn reset(&mut self) -> TimerMode {
        let previous = self.mode;
        *self = Self::default();
        previous
    }

    /// Restarts the clock display at zero without touching logged time.
    pub fn reset_clock(&mut self, today_total: i64) {
        self.clock_offset_seconds = today_total.max(0);
        if self.mode != TimerMode::CountingDown {
            self.show_clock = true;
        }
    }

    /// A new day starts counting from its own total.
    pub fn clear_clock_offset(&mut self) {
        self.clock_offset_seconds = 0;
    }

    pub fn clock_display(&self, today_total: i64) -> i64 {
        (today_total - self.clock_offset_seconds).max(0)
    }

    /// Seconds shown on the big timer label.
    pub fn display_seconds(&self, today_total: i64) -> i64 {
        if self.show_clock {
            self.clock_display(today_total)
        } else {
            self.remaining_seconds.max(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_needs_a_goal() {
        let mut timer = Countdown::new();
        assert_eq!(
            timer.toggle_countdown(),
            ToggleOutcome::NeedsGoal { stopped: None }
        );
        assert_eq!(timer.mode(), TimerMode::Idle);

        timer.set_goal(3);
        let started = timer.toggle_countdown();
        assert_eq!(started, ToggleOutcome::Started(TimerMode::CountingDown));
        assert!(started.starts_session());
        assert!(!started.ends_session());
        let paused = timer.toggle_countdown();
        assert_eq!(paused, ToggleOutcome::Stopped(TimerMode::CountingDown));
        assert_eq!(paused.status_text(), "Paused");
    }

    #[test]
    fn countdown_reaches_time_up() {
        let mut timer = Countdown::new();
        timer.set_goal(2);
        timer.toggle_countdown();
        assert_eq!(
            timer.advance(1),
            TickOutcome {
                progressed: 1,
                time_up: false
            }
        );
        assert_eq!(
            timer.advance(1),
            TickOutcome {
                progressed: 1,
                time_up: true
            }
        );
        assert_eq!(timer.mode(), TimerMode::Idle);
        assert_eq!(timer.advance(1), TickOutcome::default());
    }

    #[test]
    fn late_ticks_are_credited_together() {
        let mut timer = Countdown::new();
        timer.toggle_clock();
        assert_eq!(timer.advance(31).progressed, 31);
        assert_eq!(timer.advance(0), TickOutcome::default());

        timer.set_goal(10);
        timer.toggle_countdown();
        assert_eq!(
            timer.advance(4),
            TickOutcome {
                progressed: 4,
                time_up: false
            }
        );
        assert_eq!(
            timer.advance(30),
            TickOutcome {
                progressed: 6,
                time_up: true
            }
        );
        assert_eq!(timer.mode(), TimerMode::Idle);
        assert_eq!(timer.remaining_seconds(), 0);
    }

    #[test]
    fn clock_and_countdown_exclude_each_other() {
        let mut timer = Countdown::new();
        timer.set_goal(60);
        timer.toggle_countdown();
        let switched = timer.toggle_clock();
        assert_eq!(
            switched,
            ToggleOutcome::Switched {
                from: TimerMode::CountingDown,
                to: TimerMode::Clocking
            }
        );
        assert!(switched.ends_session() && switched.starts_session());
        assert_eq!(switched.status_text(), "Clocking");
        assert_eq!(timer.advance(1).progressed, 1);
        assert_eq!(timer.remaining_seconds(), 60);

        timer.set_goal(0);
        let refused = timer.toggle_countdown();
        assert_eq!(
            refused,
            ToggleOutcome::NeedsGoal {
                stopped: Some(TimerMode::Clocking)
            }
        );
        assert!(refused.ends_session());
        assert_eq!(timer.mode(), TimerMode::Idle);
    }

    #[test]
    fn clock_display_uses_offset() {
        let mut timer = Countdown::new();
        timer.toggle_clock();
        assert_eq!(timer.display_seconds(500), 500);
        timer.reset_clock(500);
        assert_eq!(timer.display_seconds(530), 30);
        assert_eq!(timer.clock_display(100), 0);
        timer.clear_clock_offset();
        assert_eq!(timer.clock_display(100), 100);
    }

    #[test]
    fn reset_stops_everything() {
        let mut timer = Countdown::new();
        timer.set_goal(90);
        timer.toggle_countdown();
        timer.reset_clock(40);
        assert_eq!(timer.reset(), TimerMode::CountingDown);
        assert_eq!(timer, Countdown::default());
        assert_eq!(timer.display_seconds(1_000), 0);
    }
}
