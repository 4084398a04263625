pub mod clock;
pub mod games;
pub mod session;
pub mod timers;
