//! Room lifecycle and broadcast engine
//!
//! - `room`: one chat's attached streams and outbound queue
//! - `registry`: the process-wide table of live rooms
//! - `driver`: the per-room task that fans out messages and evicts idle rooms

pub mod driver;
pub mod registry;
pub mod room;

pub use driver::{DriverSettings, MAX_GARBAGE_CYCLE};
pub use registry::{RegistryError, RoomRegistry};
pub use room::Room;
