//! Test support for the chassis provisioning driver.
//!
//! Provides [`MockChassisClient`], an in-memory device client that records
//! every call it receives and can be scripted to fail specific operations,
//! so driver tests can assert exactly which device mutations happened, in
//! which order, and what happens when one of them fails.

mod mock_client;

pub use mock_client::{DeviceCall, DeviceOp, MockChassisClient};
