//! Big-digit clock driver
//!
//! One thread owns the link and the `ClockFace`. Each tick samples the wall
//! clock once, renders, sends the changed regions as one write, then sleeps
//! to the next second boundary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDateTime, Timelike, Utc};
use chrono_tz::Tz;
use embedded_hal::delay::DelayNs;
use log::{debug, info};
use lospanel_display::{colon_visible, ClockFace, ClockFields, BIG_DIGIT_GLYPHS};
use lospanel_hal::UartTx;
use lospanel_protocol::{Command, StreamingMode};

use crate::staging::{pause, Stager, StagingPolicy};

/// Source of wall-clock time
///
/// The offset travels with the instant so that tick arithmetic stays
/// absolute across DST changes; only the displayed fields are local.
pub trait WallClock {
    fn now(&mut self) -> DateTime<FixedOffset>;
}

/// The system clock, in local time or a named zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemClock {
    Local,
    Zoned(Tz),
}

impl WallClock for SystemClock {
    fn now(&mut self) -> DateTime<FixedOffset> {
        match self {
            SystemClock::Local => Local::now().fixed_offset(),
            SystemClock::Zoned(tz) => Utc::now().with_timezone(tz).fixed_offset(),
        }
    }
}

/// English ordinal suffix for a day of the month
pub fn ordinal_suffix(day: u32) -> &'static str {
    if (11..=13).contains(&(day % 100)) {
        return "th";
    }
    match day % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

/// Row-0 date text, e.g. "January 8th"
pub fn format_date(now: &NaiveDateTime) -> String {
    let day = now.day();
    format!("{} {}{}", now.format("%B"), day, ordinal_suffix(day))
}

/// Sleep until `next_tick`, but never less than `floor`
pub fn tick_sleep(
    next_tick: DateTime<FixedOffset>,
    now: DateTime<FixedOffset>,
    floor: Duration,
) -> Duration {
    (next_tick - now)
        .to_std()
        .unwrap_or(Duration::ZERO)
        .max(floor)
}

/// Clock-specific settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockOptions {
    pub streaming: Option<StreamingMode>,
    pub backlight: u8,
    /// Shortest sleep between ticks
    pub min_sleep: Duration,
}

impl Default for ClockOptions {
    fn default() -> Self {
        Self {
            streaming: None,
            backlight: u8::MAX,
            min_sleep: Duration::from_millis(10),
        }
    }
}

/// Drives a `ClockFace` over a link, once per second
pub struct ClockDriver<T, D, C> {
    link: T,
    delay: D,
    clock: C,
    face: ClockFace,
    policy: StagingPolicy,
    options: ClockOptions,
}

impl<T: UartTx, D: DelayNs, C: WallClock> ClockDriver<T, D, C> {
    pub fn new(
        link: T,
        delay: D,
        clock: C,
        face: ClockFace,
        policy: StagingPolicy,
        options: ClockOptions,
    ) -> Self {
        Self {
            link,
            delay,
            clock,
            face,
            policy,
            options,
        }
    }

    fn stager(&mut self) -> Stager<'_, T, D> {
        Stager::new(&mut self.link, &mut self.delay, &self.policy)
    }

    /// Settle, clear the panel, program the big-digit glyphs
    ///
    /// Ends with the DDRAM address at 0 so the controller has left CGRAM
    /// mode before the first frame.
    pub fn start(&mut self) -> Result<(), T::Error> {
        let streaming = self.options.streaming;
        let backlight = self.options.backlight;

        let mut stager = self.stager();
        stager.settle();
        stager.prepare_screen(streaming, Some(backlight))?;
        stager.upload_glyphs(&BIG_DIGIT_GLYPHS)?;
        stager.send(&[Command::SetDdramAddress(0)])?;

        self.face.invalidate();
        info!("clock started");
        Ok(())
    }

    /// Render the current second and send whatever changed
    ///
    /// Returns the start of the next second.
    pub fn tick(&mut self) -> Result<DateTime<FixedOffset>, T::Error> {
        let instant = self.clock.now();
        let floor = instant.with_nanosecond(0).unwrap_or(instant);
        let next_tick = floor + chrono::Duration::seconds(1);

        let now = instant.naive_local();
        let date = format_date(&now);
        let fields = ClockFields {
            date: &date,
            year: now.year(),
            hour: now.hour() as u8,
            minute: now.minute() as u8,
            colon_visible: colon_visible(now.second()),
        };

        let frame = self.face.render(&fields);
        if !frame.is_empty() {
            let mut bytes = Vec::new();
            for write in &frame {
                for command in write.commands() {
                    command.encode_into(&mut bytes);
                }
            }
            debug!("{}: {} regions, {} bytes", floor, frame.len(), bytes.len());
            self.stager().send_bytes(&bytes)?;
        }

        Ok(next_tick)
    }

    /// Start, then tick until `stop` is set or `max_ticks` have run
    ///
    /// Returns the number of ticks run.
    pub fn run(&mut self, stop: Option<&AtomicBool>, max_ticks: Option<u64>) -> Result<u64, T::Error> {
        self.start()?;

        let mut ticks = 0;
        loop {
            if stop.is_some_and(|s| s.load(Ordering::Acquire)) {
                info!("clock stopped after {} ticks", ticks);
                break;
            }
            if max_ticks.is_some_and(|max| ticks >= max) {
                break;
            }

            let next_tick = self.tick()?;
            ticks += 1;

            let sleep = tick_sleep(next_tick, self.clock.now(), self.options.min_sleep);
            pause(&mut self.delay, sleep);
        }
        Ok(ticks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Event, Journal, MockLink, RecordingDelay};
    use chrono::{NaiveDate, TimeZone};
    use lospanel_protocol::DisplayGeometry;
    use std::collections::VecDeque;

    /// Replays a fixed list of instants; the last one repeats
    struct ScriptedClock(VecDeque<DateTime<FixedOffset>>);

    impl WallClock for ScriptedClock {
        fn now(&mut self) -> DateTime<FixedOffset> {
            if self.0.len() > 1 {
                self.0.pop_front().unwrap()
            } else {
                *self.0.front().unwrap()
            }
        }
    }

    fn at(h: u32, m: u32, s: u32, ms: u32) -> DateTime<FixedOffset> {
        at_offset(0, h, m, s, ms)
    }

    /// Local time `h:m:s.ms` at UTC+`offset_hours`
    fn at_offset(offset_hours: i32, h: u32, m: u32, s: u32, ms: u32) -> DateTime<FixedOffset> {
        let naive = NaiveDate::from_ymd_opt(2026, 1, 8)
            .unwrap()
            .and_hms_milli_opt(h, m, s, ms)
            .unwrap();
        FixedOffset::east_opt(offset_hours * 3600)
            .unwrap()
            .from_local_datetime(&naive)
            .unwrap()
    }

    fn driver(
        journal: &Journal,
        times: &[DateTime<FixedOffset>],
        options: ClockOptions,
    ) -> ClockDriver<MockLink, RecordingDelay, ScriptedClock> {
        ClockDriver::new(
            MockLink::new(journal.clone()),
            RecordingDelay::new(journal.clone()),
            ScriptedClock(times.iter().copied().collect()),
            ClockFace::new(DisplayGeometry::LCD_20X4).unwrap(),
            StagingPolicy::default(),
            options,
        )
    }

    #[test]
    fn test_ordinal_suffix() {
        let cases = [
            (1, "st"),
            (2, "nd"),
            (3, "rd"),
            (4, "th"),
            (11, "th"),
            (12, "th"),
            (13, "th"),
            (21, "st"),
            (22, "nd"),
            (23, "rd"),
            (30, "th"),
            (31, "st"),
        ];
        for (day, suffix) in cases {
            assert_eq!(ordinal_suffix(day), suffix, "day {}", day);
        }
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(&at(14, 7, 0, 0).naive_local()), "January 8th");
        let sept = NaiveDate::from_ymd_opt(2026, 9, 23)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(format_date(&sept), "September 23rd");
    }

    #[test]
    fn test_tick_sleep_compensates() {
        let floor = Duration::from_millis(10);
        let next = at(12, 0, 1, 0);
        assert_eq!(tick_sleep(next, at(12, 0, 0, 300), floor), Duration::from_millis(700));
        assert_eq!(tick_sleep(next, at(12, 0, 0, 995), floor), floor);
        assert_eq!(tick_sleep(next, at(12, 0, 1, 200), floor), floor);
    }

    #[test]
    fn test_tick_sleep_across_fall_back() {
        let floor = Duration::from_millis(10);
        // 01:59:59 BST ticks to 02:00:00 BST, which is 01:00:00 GMT
        let next = at_offset(1, 1, 59, 59, 0) + chrono::Duration::seconds(1);
        assert_eq!(tick_sleep(next, at_offset(0, 1, 0, 0, 0), floor), floor);
        assert_eq!(
            tick_sleep(next, at_offset(0, 0, 59, 59, 600), floor),
            Duration::from_millis(400)
        );
    }

    #[test]
    fn test_run_keeps_cadence_when_clocks_go_back() {
        let journal = Journal::new();
        let times = [
            at_offset(1, 1, 59, 59, 100),
            at_offset(0, 1, 0, 0, 20),
            at_offset(0, 1, 0, 0, 40),
            at_offset(0, 1, 0, 0, 60),
        ];
        let mut clock = driver(&journal, &times, ClockOptions::default());
        assert_eq!(clock.run(None, Some(2)).unwrap(), 2);

        let delays = journal.delays();
        let tick_delays = &delays[delays.len() - 2..];
        assert_eq!(
            tick_delays,
            [Duration::from_millis(10), Duration::from_millis(940)]
        );
        assert!(tick_delays.iter().all(|d| *d <= Duration::from_secs(1)));

        // Both ticks render: 01:59 before the change, 01:00 after
        let writes = journal.writes();
        assert_eq!(writes.len(), 10 + 2);
    }

    #[test]
    fn test_start_sequence() {
        let journal = Journal::new();
        let options = ClockOptions {
            streaming: Some(StreamingMode::Safe),
            backlight: 200,
            ..ClockOptions::default()
        };
        let mut clock = driver(&journal, &[at(14, 7, 0, 0)], options);
        clock.start().unwrap();

        let events = journal.events();
        assert_eq!(events[0], Event::Delay(Duration::from_secs(3)));
        assert_eq!(
            events[1],
            Event::Write(vec![0xFC, 0x10, 0x01, 0xFD, 200, 0xFE, 0x01, 0xFE, 0x02])
        );
        assert_eq!(events[3], Event::Delay(Duration::from_millis(10)));

        let writes = journal.writes();
        assert_eq!(writes.len(), 1 + 8 + 1);
        assert_eq!(writes[1][..2], [0xFE, 0x40]);
        assert_eq!(writes[8][..2], [0xFE, 0x40 | 56]);
        assert_eq!(writes[9], [0xFE, 0x80]);
    }

    #[test]
    fn test_run_sends_only_changes() {
        let journal = Journal::new();
        let times = [
            at(14, 7, 0, 200),
            at(14, 7, 0, 250),
            at(14, 7, 1, 100),
            at(14, 7, 1, 150),
            at(14, 7, 2, 5),
            at(14, 7, 2, 10),
        ];
        let mut clock = driver(&journal, &times, ClockOptions::default());
        let ticks = clock.run(None, Some(3)).unwrap();
        assert_eq!(ticks, 3);

        let writes = journal.writes();
        // Init, eight glyph slots, DDRAM home, then three frames
        assert_eq!(writes.len(), 10 + 3);

        let first = &writes[10];
        let tokens = lospanel_protocol::CommandParser::decode_all(first).unwrap();
        let addresses = tokens
            .iter()
            .filter(|t| matches!(t, lospanel_protocol::Token::SetDdramAddress(_)))
            .count();
        assert_eq!(addresses, 4);

        // Colon toggled: only the two glyph rows
        let second = &writes[11];
        assert_eq!(second.len(), 2 * (2 + 17));
        assert_eq!(second[..2], [0xFE, 0x80 | 0x41]);
        assert_eq!(second[2 + 8], b' ');
        assert_eq!(writes[12][2 + 8], 0);

        let delays = journal.delays();
        let tick_delays = &delays[delays.len() - 3..];
        assert_eq!(
            tick_delays,
            [
                Duration::from_millis(750),
                Duration::from_millis(850),
                Duration::from_millis(990),
            ]
        );
    }

    #[test]
    fn test_run_honours_stop_flag() {
        let journal = Journal::new();
        let stop = AtomicBool::new(true);
        let mut clock = driver(&journal, &[at(14, 7, 0, 0)], ClockOptions::default());
        assert_eq!(clock.run(Some(&stop), None).unwrap(), 0);
        // Initialisation still happened
        assert_eq!(journal.writes().len(), 10);
    }

    #[test]
    fn test_run_aborts_on_write_error() {
        let journal = Journal::new();
        let mut clock = ClockDriver::new(
            MockLink::new(journal.clone()).failing(),
            RecordingDelay::new(journal.clone()),
            ScriptedClock([at(14, 7, 0, 0)].into_iter().collect()),
            ClockFace::new(DisplayGeometry::LCD_20X4).unwrap(),
            StagingPolicy::default(),
            ClockOptions::default(),
        );
        assert!(clock.run(None, Some(5)).is_err());
    }
}
