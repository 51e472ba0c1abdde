pub mod camera;
pub mod still_image_device;

pub use camera::{CameraResource, CaptureDevice, DeviceError, Facing, PreviewStream, StreamHandle};
pub use still_image_device::StillImageDevice;
