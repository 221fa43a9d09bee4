pub mod acquisition;
pub mod cancel;
pub mod clock;
pub mod controller;
pub mod countdown;
pub mod readiness;
pub mod recording;
pub mod sequencer;
