/// Final output of a replay: the derived log framed by the working hours, followed by
/// one revenue line per table
use std::fmt;

use serde::Serialize;

use super::event::Event;
use super::state::ClubState;
use super::time::ClockTime;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    /// 1-based table number
    pub table: usize,
    pub profit: u64,
    pub usage: ClockTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub opening: ClockTime,
    pub closing: ClockTime,
    pub events: Vec<Event>,
    pub tables: Vec<TableSummary>,
}

impl Report {
    pub fn from_state(state: &ClubState) -> Self {
        let tables = state
            .tables()
            .iter()
            .enumerate()
            .map(|(index, table)| TableSummary {
                table: index + 1,
                profit: table.profit,
                usage: table.usage,
            })
            .collect();

        Report {
            opening: state.config().opening,
            closing: state.config().closing,
            events: state.events().to_vec(),
            tables,
        }
    }

    pub fn total_profit(&self) -> u64 {
        self.tables.iter().map(|table| table.profit).sum()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.opening)?;
        for event in &self.events {
            writeln!(f, "{}", event)?;
        }
        writeln!(f, "{}", self.closing)?;
        for table in &self.tables {
            writeln!(f, "{} {} {}", table.table, table.profit, table.usage)?;
        }
        Ok(())
    }
}
