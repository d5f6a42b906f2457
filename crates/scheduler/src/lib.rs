//! Weekly trigger scheduling for the spread cycle.
//!
//! [`compute_next_trigger`] turns a weekday, market-open time and offset into
//! the next absolute instant; [`TriggerScheduler`] owns the polling loop that
//! fires the cycle at each trigger until stopped.

pub mod clock;
pub mod scheduler;
pub mod trigger;

pub use clock::{Clock, SystemClock};
pub use scheduler::{ScheduleState, SchedulerHandle, TriggerScheduler};
pub use trigger::{compute_next_trigger, TriggerRule};
