mod controller;
mod engine;

pub use controller::ClockController;
pub use engine::{
    format_clock, ClockEngine, Phase, SessionSnapshot, Transition, WARNING_LEAD_SECS,
};
