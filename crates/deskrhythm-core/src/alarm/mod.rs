mod controller;
mod playback;
mod prompt;

pub use controller::{AlarmController, AlarmObserver};
pub use playback::{AlarmSink, AlarmSound, ChimeTone, RodioSink};
pub use prompt::PromptContent;
