/// The model module contains the club simulation: time, the waiting line,
/// events and the state they drive
pub mod config;
pub mod event;
pub mod queue;
pub mod report;
pub mod state;
pub mod time;
