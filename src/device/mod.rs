pub mod replay;
pub mod traits;

pub use replay::{DeviceRecording, ReplayDevice};
pub use traits::Device;

#[cfg(test)]
pub mod testing;
