/// Live state of the club while an event log is replayed
///
/// This module holds the bookkeeping only: who is inside, who sits where, who waits,
/// and what every table has earned. The rules deciding *when* to change it live with
/// the events in `event.rs`.

use std::collections::{HashMap, HashSet};

use super::config::ClubConfig;
use super::event::Event;
use super::queue::{QueueError, WaitingQueue};
use super::time::ClockTime;

pub type ClientId = String;

/// One table with its billing ledger
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableState {
    pub occupant: Option<ClientId>,
    /// Start of the current session; meaningless while the table is free
    pub occupied_since: ClockTime,
    /// Total earned by this table so far
    pub profit: u64,
    /// Total time this table was in use
    pub usage: ClockTime,
}

impl TableState {
    pub fn is_free(&self) -> bool {
        self.occupant.is_none()
    }
}

/// The club during a replay
///
/// Invariants:
/// - a client is in `table_of_client` iff that table's `occupant` is the client
/// - a known client is seated, waiting, or neither; never seated and waiting at once
/// - `current_time` never decreases
#[derive(Debug, Clone)]
pub struct ClubState {
    config: ClubConfig,
    current_time: ClockTime,
    known_clients: HashSet<ClientId>,
    table_of_client: HashMap<ClientId, usize>,
    tables: Vec<TableState>,
    waiting_queue: WaitingQueue<ClientId>,
    events: Vec<Event>,
    closed: bool,
}

impl ClubState {
    pub fn new(config: ClubConfig) -> Self {
        ClubState {
            current_time: ClockTime::MIDNIGHT,
            known_clients: HashSet::new(),
            table_of_client: HashMap::new(),
            tables: vec![TableState::default(); config.table_count],
            waiting_queue: WaitingQueue::new(config.table_count),
            events: Vec::new(),
            closed: false,
            config,
        }
    }

    pub fn config(&self) -> &ClubConfig {
        &self.config
    }

    pub fn current_time(&self) -> ClockTime {
        self.current_time
    }

    /// Move the clock forward to `time`
    pub fn advance_to(&mut self, time: ClockTime) {
        assert!(
            self.current_time <= time,
            "clock moved backwards from {} to {}",
            self.current_time,
            time
        );
        self.current_time = time;
    }

    /// Every event so far, in the order it happened
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn record(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn tables(&self) -> &[TableState] {
        &self.tables
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_known(&self, client: &str) -> bool {
        self.known_clients.contains(client)
    }

    pub fn admit(&mut self, client: &str) {
        self.known_clients.insert(client.to_string());
    }

    /// Index of the table `client` sits at
    pub fn table_of(&self, client: &str) -> Option<usize> {
        self.table_of_client.get(client).copied()
    }

    pub fn is_table_free(&self, table: usize) -> bool {
        self.tables[table].is_free()
    }

    pub fn has_free_table(&self) -> bool {
        self.tables.iter().any(TableState::is_free)
    }

    pub fn is_waiting(&self, client: &str) -> bool {
        self.waiting_queue.iter().any(|waiting| waiting == client)
    }

    pub fn waiting_count(&self) -> usize {
        self.waiting_queue.len()
    }

    /// Put `client` in line for a table
    pub fn enqueue(&mut self, client: &str) -> Result<(), QueueError> {
        self.waiting_queue.push(client.to_string())
    }

    /// Seat `client` at a free table, moving them off any table they already hold
    ///
    /// The caller checks that the table is free; seating onto a busy table is a bug.
    pub fn seat(&mut self, client: &str, table: usize) {
        assert!(
            self.tables[table].is_free(),
            "table {} is already taken",
            table + 1
        );

        if let Some(previous) = self.table_of(client) {
            self.release_table(previous);
        }
        self.waiting_queue.retain(|waiting| waiting != client);

        let now = self.current_time;
        let slot = &mut self.tables[table];
        slot.occupant = Some(client.to_string());
        slot.occupied_since = now;
        self.table_of_client.insert(client.to_string(), table);
    }

    /// Remove `client` from the club
    ///
    /// Returns the table they freed, if they were seated.
    pub fn depart(&mut self, client: &str) -> Option<usize> {
        self.known_clients.remove(client);
        self.waiting_queue.retain(|waiting| waiting != client);
        let table = self.table_of(client)?;
        self.release_table(table);
        Some(table)
    }

    /// Give a freed table to whoever has waited longest
    pub fn seat_next_waiting(&mut self, table: usize) -> Option<ClientId> {
        let next = self.waiting_queue.pop().ok()?;
        self.seat(&next, table);
        Some(next)
    }

    /// Evict everyone still inside at closing time
    ///
    /// Clients leave in ascending id order so the log is deterministic. Runs at most once.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let closing = self.config.closing;
        self.advance_to(closing);

        let mut remaining: Vec<ClientId> = self.known_clients.drain().collect();
        remaining.sort();
        for client in remaining {
            if let Some(table) = self.table_of(&client) {
                self.release_table(table);
            }
            self.events.push(Event::ClientLeftByClub {
                time: closing,
                client,
            });
        }
        self.waiting_queue.clear();
    }

    /// Free a table and settle its bill at the current time
    fn release_table(&mut self, table: usize) -> ClientId {
        let now = self.current_time;
        let price = self.config.hourly_price;
        let slot = &mut self.tables[table];
        let Some(client) = slot.occupant.take() else {
            unreachable!("table {} released while free", table + 1);
        };

        let elapsed = now.since(slot.occupied_since);
        // ClubConfig caps the price so a full day on every table fits in u64
        slot.profit += u64::from(elapsed.ceil_hours()) * price;
        slot.usage = slot.usage.add(elapsed);
        self.table_of_client.remove(&client);
        client
    }
}
