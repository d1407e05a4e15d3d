pub use anyhow::{anyhow, bail, Context, Result};
pub use log::{debug, error, info, trace, warn};

pub use crate::config::Config;
pub use crate::error::CodecError;
pub use crate::file_error;
pub use crate::options::Options;
pub use crate::renogy::charging_state::ChargingState;
pub use crate::renogy::fault::ControllerFault;
pub use crate::renogy::fixed::Fixed2;
pub use crate::renogy::snapshot::Snapshot;
