mod clock;
mod engine;
mod observer;
mod session;

pub use clock::{
    clamp_resolution, Clock, SystemClock, Task, VirtualClock, DEFAULT_SLEEP_RESOLUTION,
    MAX_SLEEP_RESOLUTION, MIN_SLEEP_RESOLUTION,
};
pub use engine::{BrewEngine, BrewSnapshot, BrewState};
pub use observer::{ChannelObserver, LogObserver, SessionObserver};
pub use session::{BrewSession, SessionId};
