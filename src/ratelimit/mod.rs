//! Rate limiting logic and state management.

mod client;
mod clock;
mod decision;
pub mod eviction;
mod limiter;
mod policy;
mod report;
mod sweeper;
mod window;

pub use client::{client_identifier, FORWARDED_FOR_HEADER, REAL_IP_HEADER, UNKNOWN_CLIENT};
pub use clock::{Clock, ManualClock, SystemClock};
pub use decision::Decision;
pub use eviction::{EvictionStrategy, IntervalSweep, NoInlineSweep, ProbabilisticSweep};
pub use limiter::RateLimiter;
pub use policy::RateLimitPolicy;
pub use report::{ClientLoad, LoadReport, PolicyReport};
pub use sweeper::spawn_sweeper;
pub use window::ClientWindow;
