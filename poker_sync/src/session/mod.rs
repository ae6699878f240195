//! Session-scoped state and the table session facade.

pub mod context;
mod guard;
pub mod status;
pub mod table_session;

pub use context::{SessionContext, SessionContextBuilder};
pub(crate) use guard::InFlightGuard;
pub use status::{StatusBoard, StatusLevel, StatusMessage};
pub use table_session::{NO_TABLE_MESSAGE, SessionPhase, TableSession};
