/// Events of the club log
///
/// Input events come from the log and drive the state machine. Output events are
/// produced by the club itself (errors, forced departures, automatic seating) and are
/// only ever rendered.
///
/// Every event renders as one line: `HH:MM <kind> <client> [table]`, or
/// `HH:MM 13 <reason>` for errors.

use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

use super::config::ClubConfig;
use super::state::{ClientId, ClubState};
use super::time::{ClockTime, TimeError};

/// Numeric discriminator written in the second column of every line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ClientArrived = 1,
    ClientSeated = 2,
    ClientWaiting = 3,
    ClientLeft = 4,
    ClientLeftByClub = 11,
    ClientSeatedByClub = 12,
    Error = 13,
}

impl EventKind {
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Kinds that may appear in an input log
    pub fn from_input_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(EventKind::ClientArrived),
            2 => Some(EventKind::ClientSeated),
            3 => Some(EventKind::ClientWaiting),
            4 => Some(EventKind::ClientLeft),
            _ => None,
        }
    }
}

/// Why the club turned a request down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorReason {
    /// The client is already inside
    YouShallNotPass,
    /// Arrival outside working hours
    NotOpenYet,
    PlaceIsBusy,
    ClientUnknown,
    /// Waiting although a table is free
    ICanWaitNoLonger,
}

impl ErrorReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorReason::YouShallNotPass => "YouShallNotPass",
            ErrorReason::NotOpenYet => "NotOpenYet",
            ErrorReason::PlaceIsBusy => "PlaceIsBusy",
            ErrorReason::ClientUnknown => "ClientUnknown",
            ErrorReason::ICanWaitNoLonger => "ICanWaitNoLonger!",
        }
    }
}

impl fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventParseError {
    #[error("expected at least 3 fields, got {0}")]
    TooFewFields(usize),
    #[error("bad event time: {0}")]
    Time(#[from] TimeError),
    #[error("event kind must be an integer, got '{0}'")]
    InvalidKind(String),
    #[error("unknown event kind {0}")]
    UnknownKind(i64),
    #[error("client name '{0}' may only contain a-z, 0-9 and '_'")]
    InvalidClient(String),
    #[error("seat event takes exactly one table number, got {0}")]
    TableFieldCount(usize),
    #[error("table number must be an integer, got '{0}'")]
    InvalidTable(String),
    #[error("table {table} does not exist (club has {table_count})")]
    TableOutOfRange { table: usize, table_count: usize },
}

/// One line of the club log
///
/// Table numbers are 1-based, as written in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ClientArrived { time: ClockTime, client: ClientId },
    ClientSeated { time: ClockTime, client: ClientId, table: usize },
    ClientWaiting { time: ClockTime, client: ClientId },
    ClientLeft { time: ClockTime, client: ClientId },
    ClientLeftByClub { time: ClockTime, client: ClientId },
    ClientSeatedByClub { time: ClockTime, client: ClientId, table: usize },
    Error { time: ClockTime, reason: ErrorReason },
}

impl Event {
    /// Parse one input line
    ///
    /// Only kinds 1-4 are accepted. Kinds other than 2 ignore anything after the
    /// client name; a seat event must carry exactly one table number within the club.
    pub fn parse(line: &str, config: &ClubConfig) -> Result<Event, EventParseError> {
        let fields: Vec<&str> = line.split(' ').collect();
        let [time, kind, client, rest @ ..] = fields.as_slice() else {
            return Err(EventParseError::TooFewFields(fields.len()));
        };

        let time = ClockTime::parse(time)?;
        let code: i64 = kind
            .parse()
            .map_err(|_| EventParseError::InvalidKind(kind.to_string()))?;
        let kind = EventKind::from_input_code(code).ok_or(EventParseError::UnknownKind(code))?;
        let client = parse_client(client)?;

        Ok(match kind {
            EventKind::ClientArrived => Event::ClientArrived { time, client },
            EventKind::ClientSeated => Event::ClientSeated {
                time,
                client,
                table: parse_table(rest, config.table_count)?,
            },
            EventKind::ClientWaiting => Event::ClientWaiting { time, client },
            EventKind::ClientLeft => Event::ClientLeft { time, client },
            other => return Err(EventParseError::UnknownKind(other.code().into())),
        })
    }

    pub fn time(&self) -> ClockTime {
        match self {
            Event::ClientArrived { time, .. }
            | Event::ClientSeated { time, .. }
            | Event::ClientWaiting { time, .. }
            | Event::ClientLeft { time, .. }
            | Event::ClientLeftByClub { time, .. }
            | Event::ClientSeatedByClub { time, .. }
            | Event::Error { time, .. } => *time,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Event::ClientArrived { .. } => EventKind::ClientArrived,
            Event::ClientSeated { .. } => EventKind::ClientSeated,
            Event::ClientWaiting { .. } => EventKind::ClientWaiting,
            Event::ClientLeft { .. } => EventKind::ClientLeft,
            Event::ClientLeftByClub { .. } => EventKind::ClientLeftByClub,
            Event::ClientSeatedByClub { .. } => EventKind::ClientSeatedByClub,
            Event::Error { .. } => EventKind::Error,
        }
    }

    pub fn client(&self) -> Option<&str> {
        match self {
            Event::ClientArrived { client, .. }
            | Event::ClientSeated { client, .. }
            | Event::ClientWaiting { client, .. }
            | Event::ClientLeft { client, .. }
            | Event::ClientLeftByClub { client, .. }
            | Event::ClientSeatedByClub { client, .. } => Some(client),
            Event::Error { .. } => None,
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(
            self,
            Event::ClientArrived { .. }
                | Event::ClientSeated { .. }
                | Event::ClientWaiting { .. }
                | Event::ClientLeft { .. }
        )
    }

    /// Apply this event to the club, logging whatever it causes
    ///
    /// The caller advances the clock and records the event itself first, so anything
    /// appended here follows it in the log.
    pub fn translate(&self, state: &mut ClubState) {
        let now = state.current_time();
        let reject = |state: &mut ClubState, reason| state.record(Event::Error { time: now, reason });

        match self {
            Event::ClientArrived { client, time } => {
                if state.is_known(client) {
                    reject(state, ErrorReason::YouShallNotPass);
                } else if !time.is_within(state.config().opening, state.config().closing) {
                    reject(state, ErrorReason::NotOpenYet);
                } else {
                    state.admit(client);
                }
            }
            Event::ClientSeated { client, table, .. } => {
                let index = table - 1;
                if !state.is_table_free(index) {
                    reject(state, ErrorReason::PlaceIsBusy);
                } else if !state.is_known(client) {
                    reject(state, ErrorReason::ClientUnknown);
                } else {
                    state.seat(client, index);
                }
            }
            Event::ClientWaiting { client, .. } => {
                if state.has_free_table() {
                    reject(state, ErrorReason::ICanWaitNoLonger);
                } else if !state.is_known(client) {
                    reject(state, ErrorReason::ClientUnknown);
                } else if state.table_of(client).is_some() {
                    // already holds one of the busy tables
                    reject(state, ErrorReason::ICanWaitNoLonger);
                } else if state.is_waiting(client) {
                    // already in line
                } else if state.enqueue(client).is_err() {
                    // more waiters than tables: the client gives up
                    state.depart(client);
                    state.record(Event::ClientLeftByClub {
                        time: now,
                        client: client.clone(),
                    });
                }
            }
            Event::ClientLeft { client, .. } => {
                if !state.is_known(client) {
                    reject(state, ErrorReason::ClientUnknown);
                } else if let Some(freed) = state.depart(client) {
                    if let Some(next) = state.seat_next_waiting(freed) {
                        state.record(Event::ClientSeatedByClub {
                            time: now,
                            client: next,
                            table: freed + 1,
                        });
                    }
                }
            }
            // output events carry no transition
            Event::ClientLeftByClub { .. }
            | Event::ClientSeatedByClub { .. }
            | Event::Error { .. } => {}
        }
    }
}

fn parse_client(field: &str) -> Result<ClientId, EventParseError> {
    let valid = !field.is_empty()
        && field
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_');
    if !valid {
        return Err(EventParseError::InvalidClient(field.to_string()));
    }
    Ok(field.to_string())
}

fn parse_table(fields: &[&str], table_count: usize) -> Result<usize, EventParseError> {
    let [field] = fields else {
        return Err(EventParseError::TableFieldCount(fields.len()));
    };
    let table: usize = field
        .parse()
        .map_err(|_| EventParseError::InvalidTable(field.to_string()))?;
    if table == 0 || table > table_count {
        return Err(EventParseError::TableOutOfRange { table, table_count });
    }
    Ok(table)
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self.kind().code();
        match self {
            Event::ClientArrived { time, client }
            | Event::ClientWaiting { time, client }
            | Event::ClientLeft { time, client }
            | Event::ClientLeftByClub { time, client } => {
                write!(f, "{} {} {}", time, code, client)
            }
            Event::ClientSeated { time, client, table }
            | Event::ClientSeatedByClub { time, client, table } => {
                write!(f, "{} {} {} {}", time, code, client, table)
            }
            Event::Error { time, reason } => write!(f, "{} {} {}", time, code, reason),
        }
    }
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
