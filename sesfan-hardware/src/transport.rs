//! Transport to the enclosure
//!
//! SCSI Generic plumbing is delegated to the `sg_ses` utility from sg3_utils.
//! Each call spawns one `sg_ses` process against one device and waits for it.

use async_trait::async_trait;
use sesfan_core::{DefaultEnclosure, EnclosureModel, Result, SesFanError};
use std::marker::PhantomData;
use std::path::Path;
use std::process::{Output, Stdio};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Default name of the transport binary, resolved through `PATH`
pub const DEFAULT_SG_SES: &str = "sg_ses";

/// Field selector for a cooling element's actual speed: byte 1, bit 2, 11 bits
pub const FAN_SPEED_FIELD: &str = "1:2:11";

/// Element address within the enclosure's element list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementIndex {
    pub element_type: &'static str,
    pub position: u8,
}

impl ElementIndex {
    /// Cooling element (fan) at `position`
    pub fn cooling(position: u8) -> Self {
        Self {
            element_type: "coo",
            position,
        }
    }

    /// Selector in `sg_ses --index` syntax
    pub fn selector(&self) -> String {
        format!("{},{}", self.element_type, self.position)
    }
}

/// Trait for enclosure transport abstraction
///
/// This trait enables testing of `EnclosureController` without real
/// hardware by allowing mock implementations.
#[async_trait]
pub trait SesTransport: Send {
    /// Standard enclosure query; returns everything the device reported
    async fn inquiry(&mut self, device: &Path) -> Result<Vec<u8>>;

    /// Read one status field of one element
    async fn read_element(&mut self, device: &Path, element: ElementIndex) -> Result<String>;

    /// Read a whole diagnostic page as a hex byte dump
    async fn read_page_raw(&mut self, device: &Path, page: u8) -> Result<String>;

    /// Submit a hex byte dump as a diagnostic page
    async fn write_page(&mut self, device: &Path, page: u8, payload: &str) -> Result<String>;
}

/// `sg_ses` process driver
pub struct SgSesDriver<M: EnclosureModel = DefaultEnclosure> {
    program: String,
    _model: PhantomData<M>,
}

impl<M: EnclosureModel> SgSesDriver<M> {
    /// Create a driver invoking `program`
    ///
    /// # Arguments
    /// * `program` - Path or name of the `sg_ses` binary
    pub fn new(program: impl Into<String>) -> Self {
        let program = program.into();
        debug!("Using transport binary: {}", program);

        Self {
            program,
            _model: PhantomData,
        }
    }

    fn maxlen_arg() -> String {
        format!("--maxlen={}", M::MAX_RESPONSE_LEN)
    }

    fn page_arg(page: u8) -> String {
        format!("0x{:x}", page)
    }

    pub(crate) fn inquiry_args(device: &Path) -> Vec<String> {
        vec![Self::maxlen_arg(), device.display().to_string()]
    }

    pub(crate) fn element_args(device: &Path, element: ElementIndex) -> Vec<String> {
        vec![
            Self::maxlen_arg(),
            format!("--index={}", element.selector()),
            format!("--get={}", FAN_SPEED_FIELD),
            device.display().to_string(),
        ]
    }

    pub(crate) fn page_read_args(device: &Path, page: u8) -> Vec<String> {
        vec![
            Self::maxlen_arg(),
            "-p".to_string(),
            Self::page_arg(page),
            device.display().to_string(),
            "--raw".to_string(),
        ]
    }

    pub(crate) fn page_write_args(device: &Path, page: u8) -> Vec<String> {
        vec![
            Self::maxlen_arg(),
            "-p".to_string(),
            Self::page_arg(page),
            device.display().to_string(),
            "--control".to_string(),
            "--data".to_string(),
            "-".to_string(),
        ]
    }

    /// Run the binary to completion, feeding `input` on stdin if given
    async fn run(&self, args: &[String], input: Option<&str>) -> Result<Output> {
        debug!("Running: {} {}", self.program, args.join(" "));

        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                warn!("Failed to start {}: {}", self.program, e);
                SesFanError::Transport(format!("Failed to start {}: {}", self.program, e))
            })?;

        if let Some(data) = input {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(data.as_bytes()).await.map_err(|e| {
                    SesFanError::Transport(format!("Failed to write page data: {}", e))
                })?;
                // closing stdin signals end of data
                drop(stdin);
            }
        }

        let output = child.wait_with_output().await.map_err(|e| {
            SesFanError::Transport(format!("Failed to wait for {}: {}", self.program, e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            debug!("{} exited with {}: {}", self.program, output.status, stderr);
            return Err(SesFanError::CommandFailed {
                status: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        Ok(output)
    }
}

impl Default for SgSesDriver<DefaultEnclosure> {
    fn default() -> Self {
        Self::new(DEFAULT_SG_SES)
    }
}

#[async_trait]
impl<M: EnclosureModel> SesTransport for SgSesDriver<M> {
    async fn inquiry(&mut self, device: &Path) -> Result<Vec<u8>> {
        let output = self.run(&Self::inquiry_args(device), None).await?;

        // the model string may land on either stream
        let mut response = output.stdout;
        response.extend_from_slice(&output.stderr);
        Ok(response)
    }

    async fn read_element(&mut self, device: &Path, element: ElementIndex) -> Result<String> {
        let output = self.run(&Self::element_args(device, element), None).await?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn read_page_raw(&mut self, device: &Path, page: u8) -> Result<String> {
        let output = self.run(&Self::page_read_args(device, page), None).await?;
        let dump = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(
            "Page 0x{:02x} from {}: {} bytes of dump",
            page,
            device.display(),
            dump.len()
        );
        Ok(dump)
    }

    async fn write_page(&mut self, device: &Path, page: u8, payload: &str) -> Result<String> {
        let output = self
            .run(&Self::page_write_args(device, page), Some(payload))
            .await?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
