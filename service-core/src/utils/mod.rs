pub mod clock;
pub mod id;

pub use clock::{Clock, FixedClock, SystemClock};
pub use id::{IdGenerator, UuidV4Generator};
