pub mod charging_state;
pub mod fault;
pub mod fixed;
pub mod frame;
pub mod registers;
pub mod snapshot;
pub mod status;
