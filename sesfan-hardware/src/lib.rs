//! sesfan-hardware
//!
//! Hardware access crate: device node discovery, the `sg_ses` transport, and
//! the high-level enclosure controller used by the CLI.
//!
//! Public API:
//! - `enclosure_controller::EnclosureController`: identify, read and set fans
//! - `transport::SgSesDriver`: `sg_ses` process driver
//! - `discovery::enumerate_devices`: deduplicated character device nodes

pub mod discovery;
pub mod enclosure_controller;
pub mod transport;

pub use discovery::{enumerate_devices, select_device, DEFAULT_DEVICE_GLOBS};
pub use enclosure_controller::EnclosureController;
pub use transport::{ElementIndex, SesTransport, SgSesDriver, DEFAULT_SG_SES};
