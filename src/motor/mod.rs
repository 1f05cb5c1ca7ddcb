//! Motor control: axis controllers, limit handling, and the motor bank.

mod axis;
mod bank;
mod limits;

pub use axis::AxisController;
pub use bank::{MotorBank, RetractCompleted};
pub use limits::{LimitEnd, LimitLatch, LimitLine, LimitSwitch};
