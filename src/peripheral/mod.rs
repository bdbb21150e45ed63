//! Reference node factories.
//!
//! - [`i2c`]: I2C master transfers with chunking and sequential frames
//! - [`register`]: plain register writes and memory to register streams
//!
//! Both describe symbolic register models. They show how a factory maps
//! [`TransferStep`](crate::TransferStep) flags onto control words; porting to a
//! real part means swapping the register layout, not the logic.

pub mod i2c;
pub mod register;

pub use i2c::{ControlFlags, I2cMasterConfig, I2cMasterFactory, I2cMode, I2cOp};
pub use register::{RegisterOp, RegisterWriter};
