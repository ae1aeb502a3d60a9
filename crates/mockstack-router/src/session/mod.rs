//! Session lifecycle: isolated engine instances and the registry that owns them.

mod record;
mod registry;

pub use record::{SessionRecord, SessionSnapshot};
pub use registry::{ResetPolicy, SessionRegistry};
