/// Replay driver: reads the club configuration and the event log, feeds each event
/// through the state machine in order and produces the final report
use std::io::{BufRead, Lines};

use thiserror::Error;

use crate::logger::Logger;
use crate::model::config::{ClubConfig, ConfigError, ConfigLine};
use crate::model::event::{Event, EventKind, EventParseError};
use crate::model::report::Report;
use crate::model::state::ClubState;
use crate::model::time::ClockTime;

/// A problem that stops the whole replay
#[derive(Debug, Error)]
pub enum ClubError {
    #[error("unexpected end of input: missing {0}")]
    MissingLine(&'static str),
    #[error("invalid configuration: {source}")]
    Config { line: String, source: ConfigError },
    #[error("malformed event: {source}")]
    Event { line: String, source: EventParseError },
    #[error("event is earlier than the previous one at {previous}")]
    OutOfOrder { line: String, previous: ClockTime },
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

impl ClubError {
    /// The raw input line that caused the failure, if there is one
    pub fn offending_line(&self) -> Option<&str> {
        match self {
            ClubError::Config { line, .. }
            | ClubError::Event { line, .. }
            | ClubError::OutOfOrder { line, .. } => Some(line.as_str()),
            ClubError::MissingLine(_) | ClubError::Io(_) => None,
        }
    }
}

pub struct App<'a, R> {
    input: Lines<R>,
    logger: &'a Logger,
}

impl<'a, R: BufRead> App<'a, R> {
    pub fn new(input: R, logger: &'a Logger) -> Self {
        App {
            input: input.lines(),
            logger,
        }
    }

    /// Run the whole log and return the report
    ///
    /// Stops at the first malformed or out-of-order line.
    pub fn process(mut self) -> Result<Report, ClubError> {
        let config = self.read_club_config()?;
        self.logger.info(&format!(
            "Club has {} tables, open {}-{}, {} per hour",
            config.table_count, config.opening, config.closing, config.hourly_price
        ));

        let mut state = ClubState::new(config);
        let mut previous = ClockTime::MIDNIGHT;

        while let Some(line) = self.input.next() {
            let line = line?;
            if line.is_empty() {
                continue;
            }

            let event = Event::parse(&line, state.config()).map_err(|source| ClubError::Event {
                line: line.clone(),
                source,
            })?;

            // the first event past closing time evicts everyone before it is handled
            if state.config().closing < event.time() && !state.is_closed() {
                self.close(&mut state);
            }

            if !previous.less_or_equal(event.time()) {
                return Err(ClubError::OutOfOrder { line, previous });
            }
            previous = event.time();

            self.apply(&mut state, event);
        }

        if !state.is_closed() {
            self.close(&mut state);
        }

        Ok(Report::from_state(&state))
    }

    fn apply(&self, state: &mut ClubState, event: Event) {
        debug_assert!(event.is_input(), "only input events are replayed");
        self.logger.debug(&format!(
            "Processing {} ({} waiting)",
            event,
            state.waiting_count()
        ));
        let logged = state.events().len() + 1;

        state.advance_to(event.time());
        state.record(event.clone());
        event.translate(state);

        for produced in &state.events()[logged..] {
            if produced.kind() == EventKind::Error {
                self.logger.warning(&format!(
                    "Rejected {} for {}: {}",
                    event.kind().code(),
                    event.client().unwrap_or("-"),
                    produced
                ));
            } else {
                self.logger.debug(&format!("Club produced {}", produced));
            }
        }
    }

    fn close(&self, state: &mut ClubState) {
        let before = state.events().len();
        state.close();
        self.logger.info(&format!(
            "Club closed at {}, {} client(s) sent home",
            state.config().closing,
            state.events().len() - before
        ));
    }

    fn next_config_line(&mut self, what: &'static str) -> Result<String, ClubError> {
        match self.input.next() {
            Some(line) => Ok(line?),
            None => Err(ClubError::MissingLine(what)),
        }
    }

    fn read_club_config(&mut self) -> Result<ClubConfig, ClubError> {
        let tables = self.next_config_line("table count")?;
        let hours = self.next_config_line("working hours")?;
        let price = self.next_config_line("hourly price")?;

        ClubConfig::from_lines(&tables, &hours, &price).map_err(|source| {
            let line = match source.line() {
                ConfigLine::TableCount => tables,
                ConfigLine::WorkingHours => hours,
                ConfigLine::HourlyPrice => price,
            };
            ClubError::Config { line, source }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::LogLevel;

    fn run(input: &str) -> Result<Report, ClubError> {
        let logger = Logger::new(LogLevel::Error);
        App::new(input.as_bytes(), &logger).process()
    }

    fn lines(report: &Report) -> Vec<String> {
        report.to_string().lines().map(str::to_string).collect()
    }

    #[test]
    fn test_replays_reference_log() {
        let input = "\
3
09:00 19:00
10
08:48 1 client1
09:41 1 client1
09:48 1 client2
09:52 3 client1
09:54 2 client1 1
10:25 2 client2 2
10:58 1 client3
10:59 2 client3 3
11:30 1 client4
11:35 2 client4 2
11:45 3 client4
12:33 4 client1
12:43 4 client2
15:52 4 client4
";
        let report = run(input).unwrap();
        assert_eq!(
            lines(&report),
            vec![
                "09:00",
                "08:48 1 client1",
                "08:48 13 NotOpenYet",
                "09:41 1 client1",
                "09:48 1 client2",
                "09:52 3 client1",
                "09:52 13 ICanWaitNoLonger!",
                "09:54 2 client1 1",
                "10:25 2 client2 2",
                "10:58 1 client3",
                "10:59 2 client3 3",
                "11:30 1 client4",
                "11:35 2 client4 2",
                "11:35 13 PlaceIsBusy",
                "11:45 3 client4",
                "12:33 4 client1",
                "12:33 12 client4 1",
                "12:43 4 client2",
                "15:52 4 client4",
                "19:00 11 client3",
                "19:00",
                "1 70 05:58",
                "2 30 02:18",
                "3 90 08:01",
            ]
        );
    }

    #[test]
    fn test_bills_started_hours_for_a_short_visit() {
        let report = run("1\n09:00 20:00\n10\n08:59 1 client1\n09:00 1 client1\n09:00 2 client1 1\n10:30 4 client1\n").unwrap();
        assert_eq!(
            lines(&report),
            vec![
                "09:00",
                "08:59 1 client1",
                "08:59 13 NotOpenYet",
                "09:00 1 client1",
                "09:00 2 client1 1",
                "10:30 4 client1",
                "20:00",
                "1 20 01:30",
            ]
        );
    }

    #[test]
    fn test_seats_waiting_client_right_after_departure() {
        let report = run("1\n09:00 20:00\n10\n09:00 1 a\n09:00 2 a 1\n09:10 1 b\n09:11 3 b\n10:00 4 a\n").unwrap();
        let lines = lines(&report);
        let left = lines.iter().position(|l| l == "10:00 4 a").unwrap();
        assert_eq!(lines[left + 1], "10:00 12 b 1");
        assert!(!lines.iter().any(|l| l.contains(" 13 ")));
        assert_eq!(lines[left + 2], "20:00 11 b");
        assert_eq!(lines.last().unwrap(), "1 110 11:00");
    }

    #[test]
    fn test_closes_once_when_an_event_comes_after_hours() {
        let report = run("2\n09:00 20:00\n10\n09:00 1 bob\n09:00 1 al\n09:00 2 bob 1\n09:00 2 al 2\n21:00 1 carl\n21:30 4 bob\n").unwrap();
        assert_eq!(
            lines(&report),
            vec![
                "09:00",
                "09:00 1 bob",
                "09:00 1 al",
                "09:00 2 bob 1",
                "09:00 2 al 2",
                "20:00 11 al",
                "20:00 11 bob",
                "21:00 1 carl",
                "21:00 13 NotOpenYet",
                "21:30 4 bob",
                "21:30 13 ClientUnknown",
                "20:00",
                "1 110 11:00",
                "2 110 11:00",
            ]
        );
    }

    #[test]
    fn test_departure_exactly_at_closing_is_ordinary() {
        let report = run("1\n09:00 20:00\n10\n19:00 1 a\n19:00 2 a 1\n20:00 4 a\n").unwrap();
        let lines = lines(&report);
        assert_eq!(lines[3], "20:00 4 a");
        assert_eq!(lines[4], "20:00");
    }

    #[test]
    fn test_rejects_out_of_order_events() {
        let err = run("1\n09:00 20:00\n10\n10:00 1 a\n09:59 1 b\n11:00 1 c\n").unwrap_err();
        assert!(matches!(err, ClubError::OutOfOrder { .. }));
        assert_eq!(err.offending_line(), Some("09:59 1 b"));
    }

    #[test]
    fn test_rejects_malformed_event_line() {
        let err = run("1\n09:00 20:00\n10\n10:00 7 a\n").unwrap_err();
        assert!(matches!(
            err,
            ClubError::Event { source: EventParseError::UnknownKind(7), .. }
        ));
        assert_eq!(err.offending_line(), Some("10:00 7 a"));

        let err = run("1\n09:00 20:00\n10\n10:00 2 a 2\n").unwrap_err();
        assert_eq!(err.offending_line(), Some("10:00 2 a 2"));
    }

    #[test]
    fn test_rejects_bad_configuration() {
        let err = run("zero\n09:00 20:00\n10\n").unwrap_err();
        assert_eq!(err.offending_line(), Some("zero"));

        let err = run("1\n09:00-20:00\n10\n").unwrap_err();
        assert_eq!(err.offending_line(), Some("09:00-20:00"));

        let err = run("1\n20:00 09:00\n10\n").unwrap_err();
        assert!(matches!(
            err,
            ClubError::Config { source: ConfigError::ClosesBeforeOpening { .. }, .. }
        ));
        assert_eq!(err.offending_line(), Some("20:00 09:00"));

        let err = run("1\n09:00 20:00\nfree\n").unwrap_err();
        assert_eq!(err.offending_line(), Some("free"));
    }

    #[test]
    fn test_rejects_truncated_configuration() {
        assert!(matches!(run(""), Err(ClubError::MissingLine("table count"))));
        assert!(matches!(run("1\n09:00 20:00\n"), Err(ClubError::MissingLine("hourly price"))));
        assert_eq!(run("1\n").unwrap_err().offending_line(), None);
    }

    #[test]
    fn test_skips_blank_lines_and_closes_empty_club() {
        let report = run("2\n09:00 20:00\n10\n\n").unwrap();
        assert_eq!(lines(&report), vec!["09:00", "20:00", "1 0 00:00", "2 0 00:00"]);
    }

    #[test]
    fn test_rejects_price_that_cannot_be_billed() {
        let err = run("1\n09:00 20:00\n18446744073709551615\n09:00 1 a\n09:00 2 a 1\n11:00 4 a\n")
            .unwrap_err();
        assert!(matches!(
            err,
            ClubError::Config { source: ConfigError::PriceTooHigh { .. }, .. }
        ));
        assert_eq!(err.offending_line(), Some("18446744073709551615"));
    }

    #[test]
    fn test_bills_highest_accepted_price() {
        let price = u64::MAX / (24 * 60);
        let input = format!("1\n09:00 20:00\n{}\n09:00 1 a\n09:00 2 a 1\n11:00 4 a\n", price);
        let report = run(&input).unwrap();
        assert_eq!(report.total_profit(), 2 * price);
    }

    #[test]
    fn test_rejects_oversized_table_count() {
        let err = run("100000000000\n09:00 20:00\n10\n").unwrap_err();
        assert!(matches!(
            err,
            ClubError::Config { source: ConfigError::InvalidTableCount(_), .. }
        ));
        assert_eq!(err.offending_line(), Some("100000000000"));
    }
}
