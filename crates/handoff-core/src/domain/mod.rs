//! Domain model (tasks, states, outcomes, events, errors).

pub mod errors;
pub mod events;
pub mod ids;
pub mod outcome;
pub mod state;
pub mod task;

pub use self::errors::{ConfigError, ErrorKind, HandoffError, StoreError};
pub use self::events::{EventKind, WorkerEvent};
pub use self::ids::WorkerId;
pub use self::outcome::Outcome;
pub use self::state::TaskState;
pub use self::task::{DEFAULT_DELIMITER, Task, TaskParseError};
