//! Application-level orchestration.
//!
//! [`Workflow`] owns the analyze-and-record cycle and history state. The run
//! loop in `controller` drives it from UI commands and the periodic
//! connectivity probe. UI/CLI layers only see the [`View`] seam.

mod controller;
mod view;
mod workflow;

pub(crate) use controller::{run_controller, UiCommand};
pub use view::{ChannelView, Clock, SystemClock, View};
pub use workflow::{Confirmation, Workflow};
