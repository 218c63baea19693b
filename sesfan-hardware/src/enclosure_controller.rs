//! Enclosure Controller - High-level interface for enclosure fan control
//!
//! Identifies enclosures, reads fan telemetry and writes fan-speed setpoints
//! through a `SesTransport`.

use crate::transport::{ElementIndex, SesTransport, SgSesDriver};
use sesfan_core::telemetry::parse_rpm;
use sesfan_core::{
    ControlPage, DefaultEnclosure, DeviceCandidate, Enclosure, EnclosureModel, FanReading,
    FanSpeedReport, Identification, MatchedEnclosure, Result, SpeedLevel,
};
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Enclosure controller interface
///
/// Generic over the transport type, allowing the real `sg_ses` driver or
/// mock transports for testing. All transport access goes through one lock,
/// so a control-page read and the write that patches it are never
/// interleaved with another call on the same controller.
pub struct EnclosureController<
    T: SesTransport + ?Sized = dyn SesTransport,
    M: EnclosureModel = DefaultEnclosure,
> {
    transport: Arc<Mutex<Box<T>>>,
    _model: PhantomData<M>,
}

impl<M: EnclosureModel> EnclosureController<SgSesDriver<M>, M> {
    /// Create a new EnclosureController with the given `sg_ses` driver
    pub fn new(driver: SgSesDriver<M>) -> Self {
        Self::with_transport(Box::new(driver))
    }
}

impl<T: SesTransport + ?Sized, M: EnclosureModel> EnclosureController<T, M> {
    /// Create a new EnclosureController with a boxed transport
    ///
    /// This is primarily useful for testing with mock transports.
    pub fn with_transport(transport: Box<T>) -> Self {
        Self {
            transport: Arc::new(Mutex::new(transport)),
            _model: PhantomData,
        }
    }

    /// Query one device for the enclosure signature
    pub async fn identify(&self, candidate: &DeviceCandidate) -> Identification {
        let mut transport = self.transport.lock().await;

        match transport.inquiry(&candidate.path).await {
            Ok(response) if Enclosure::<M>::new().matches(&response) => {
                debug!("Enclosure found on {}", candidate.path.display());
                Identification::Matched(candidate.clone().into())
            }
            Ok(_) => {
                info!("Enclosure not found on {}", candidate.path.display());
                Identification::NotMatched
            }
            Err(e) => {
                info!("Enclosure not found on {}: {}", candidate.path.display(), e);
                Identification::AccessError(e.to_string())
            }
        }
    }

    /// Identify every candidate and keep the matching enclosures, in order
    pub async fn discover(&self, candidates: &[DeviceCandidate]) -> Vec<MatchedEnclosure> {
        let mut enclosures = Vec::new();

        for candidate in candidates {
            if let Identification::Matched(enclosure) = self.identify(candidate).await {
                enclosures.push(enclosure);
            }
        }

        debug!("Discovered {} {} enclosure(s)", enclosures.len(), M::NAME);
        enclosures
    }

    /// Read the speed of one fan; unreadable or non-numeric values read as 0
    pub async fn read_fan_speed(
        &self,
        enclosure: &MatchedEnclosure,
        index: u8,
    ) -> Result<FanReading> {
        Enclosure::<M>::new().validate_fan_index(index as usize)?;

        let mut transport = self.transport.lock().await;
        let rpm = match transport
            .read_element(enclosure.path(), ElementIndex::cooling(index))
            .await
        {
            Ok(output) => parse_rpm(&output),
            Err(e) => {
                warn!(
                    "Failed to read fan {} on {}: {}",
                    index,
                    enclosure.path().display(),
                    e
                );
                0
            }
        };

        debug!(
            "Device {}, fan {}: {} rpm",
            enclosure.path().display(),
            index,
            rpm
        );
        Ok(FanReading::new(index, rpm))
    }

    /// Read every fan and classify the aggregate speed
    pub async fn read_fan_speeds(&self, enclosure: &MatchedEnclosure) -> Result<FanSpeedReport> {
        let mut readings = Vec::with_capacity(M::FAN_COUNT);

        for index in 0..M::FAN_COUNT as u8 {
            readings.push(self.read_fan_speed(enclosure, index).await?);
        }

        Ok(FanSpeedReport::new::<M>(enclosure.path(), readings))
    }

    /// Command every fan to a speed code
    ///
    /// Reads the current control page, patches only the fan slots, and
    /// writes it back. Only the low three bits of `speed` reach the device.
    /// Returns the transport's output for the write.
    pub async fn set_fan_speed_code(
        &self,
        enclosure: &MatchedEnclosure,
        speed: u8,
    ) -> Result<String> {
        let mut transport = self.transport.lock().await;

        let dump = transport
            .read_page_raw(enclosure.path(), M::CONTROL_PAGE)
            .await?;
        let mut page = ControlPage::<M>::parse(&dump)?;

        info!("Setting {} fans to {}", M::FAN_COUNT, speed);
        page.apply_speed(speed);

        transport
            .write_page(enclosure.path(), M::CONTROL_PAGE, &page.to_hex_dump())
            .await
    }

    /// Command every fan to a speed level
    pub async fn set_fan_speeds(
        &self,
        enclosure: &MatchedEnclosure,
        level: SpeedLevel,
    ) -> Result<String> {
        self.set_fan_speed_code(enclosure, level.get()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sesfan_core::control_page::format_hex_dump;
    use sesfan_core::{DeviceId, SesFanError, SpeedEstimate};
    use std::collections::{HashMap, VecDeque};
    use std::path::{Path, PathBuf};

    /// Mock transport for testing EnclosureController without hardware
    #[derive(Default)]
    struct MockTransport {
        /// Inquiry response per device; missing devices fail
        inquiries: HashMap<PathBuf, Vec<u8>>,
        /// Queued element-status responses
        elements: std::sync::Mutex<VecDeque<Result<String>>>,
        /// Control page dump returned by page reads
        page: Option<String>,
        /// Record of calls made
        calls: Arc<std::sync::Mutex<Vec<String>>>,
        /// Payloads submitted through write_page
        writes: Arc<std::sync::Mutex<Vec<String>>>,
    }

    impl MockTransport {
        fn new() -> Self {
            Self::default()
        }

        fn with_inquiry(mut self, device: &str, response: &[u8]) -> Self {
            self.inquiries.insert(PathBuf::from(device), response.to_vec());
            self
        }

        fn with_page(mut self, dump: String) -> Self {
            self.page = Some(dump);
            self
        }

        fn queue_element(&self, response: Result<String>) {
            self.elements.lock().unwrap().push_back(response);
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl SesTransport for MockTransport {
        async fn inquiry(&mut self, device: &Path) -> Result<Vec<u8>> {
            self.record(format!("inquiry {}", device.display()));
            self.inquiries
                .get(device)
                .cloned()
                .ok_or_else(|| SesFanError::CommandFailed {
                    status: 1,
                    stderr: "open error".to_string(),
                })
        }

        async fn read_element(&mut self, device: &Path, element: ElementIndex) -> Result<String> {
            let selector = element.selector();
            self.record(format!("element {} {}", device.display(), selector));
            self.elements
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(String::new()))
        }

        async fn read_page_raw(&mut self, device: &Path, page: u8) -> Result<String> {
            self.record(format!("read_page {} 0x{:x}", device.display(), page));
            self.page
                .clone()
                .ok_or_else(|| SesFanError::Transport("No page queued".to_string()))
        }

        async fn write_page(&mut self, device: &Path, page: u8, payload: &str) -> Result<String> {
            self.record(format!("write_page {} 0x{:x}", device.display(), page));
            self.writes.lock().unwrap().push(payload.to_string());
            Ok("ok".to_string())
        }
    }

    fn create_mock_controller(mock: MockTransport) -> EnclosureController<MockTransport> {
        EnclosureController::with_transport(Box::new(mock))
    }

    fn enclosure(path: &str) -> MatchedEnclosure {
        MatchedEnclosure {
            path: PathBuf::from(path),
            id: DeviceId::new(21, 0),
        }
    }

    fn candidate(path: &str, minor: u32) -> DeviceCandidate {
        DeviceCandidate::new(path, DeviceId::new(21, minor))
    }

    /// A 272-byte control page with every byte set to its offset
    fn sample_dump() -> String {
        let bytes: Vec<u8> = (0..272).map(|i| i as u8).collect();
        format_hex_dump(&bytes)
    }

    #[tokio::test]
    async fn test_identify_matched() {
        let mock = MockTransport::new().with_inquiry("/dev/sg0", b"LENOVO ThinkServerSA120 1007");
        let controller = create_mock_controller(mock);

        let result = controller.identify(&candidate("/dev/sg0", 0)).await;
        assert_eq!(result, Identification::Matched(enclosure("/dev/sg0")));
    }

    #[tokio::test]
    async fn test_identify_not_matched() {
        let mock = MockTransport::new().with_inquiry("/dev/sg1", b"SEAGATE ST4000NM0023");
        let controller = create_mock_controller(mock);

        let result = controller.identify(&candidate("/dev/sg1", 1)).await;
        assert_eq!(result, Identification::NotMatched);
    }

    #[tokio::test]
    async fn test_identify_access_error() {
        let controller = create_mock_controller(MockTransport::new());

        match controller.identify(&candidate("/dev/sg2", 2)).await {
            Identification::AccessError(msg) => assert!(msg.contains("open error")),
            other => panic!("Expected AccessError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_discover_continues_past_failures() {
        let mock = MockTransport::new()
            .with_inquiry("/dev/sg0", b"ThinkServerSA120")
            .with_inquiry("/dev/sg2", b"other enclosure")
            .with_inquiry("/dev/sg3", b"ThinkServerSA120");
        let controller = create_mock_controller(mock);

        let candidates = vec![
            candidate("/dev/sg0", 0),
            candidate("/dev/sg1", 1),
            candidate("/dev/sg2", 2),
            candidate("/dev/sg3", 3),
        ];
        let found = controller.discover(&candidates).await;

        let paths: Vec<&Path> = found.iter().map(|e| e.path()).collect();
        assert_eq!(paths, vec![Path::new("/dev/sg0"), Path::new("/dev/sg3")]);
    }

    #[tokio::test]
    async fn test_discover_empty() {
        let controller = create_mock_controller(MockTransport::new());
        assert!(controller.discover(&[]).await.is_empty());
    }

    #[tokio::test]
    async fn test_read_fan_speeds() {
        let mock = MockTransport::new();
        for response in ["1200\n", "1210\n", "1190\n", "0\n", "\n", "garbage\n"] {
            mock.queue_element(Ok(response.to_string()));
        }
        let calls = mock.calls.clone();
        let controller = create_mock_controller(mock);

        let report = controller
            .read_fan_speeds(&enclosure("/dev/sg0"))
            .await
            .unwrap();

        let rpms: Vec<u32> = report.readings.iter().map(|r| r.rpm).collect();
        assert_eq!(rpms, vec![1200, 1210, 1190, 0, 0, 0]);
        assert_eq!(
            report.estimate,
            SpeedEstimate::Level {
                level: 4,
                midpoint: 1250,
                mean: 1200,
            }
        );

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 6);
        assert_eq!(calls[0], "element /dev/sg0 coo,0");
        assert_eq!(calls[5], "element /dev/sg0 coo,5");
    }

    #[tokio::test]
    async fn test_read_fan_speeds_transport_failure_reads_zero() {
        let mock = MockTransport::new();
        mock.queue_element(Ok("1400".to_string()));
        mock.queue_element(Err(SesFanError::CommandFailed {
            status: 9,
            stderr: "element not found".to_string(),
        }));
        mock.queue_element(Ok("1400".to_string()));
        let controller = create_mock_controller(mock);

        let report = controller
            .read_fan_speeds(&enclosure("/dev/sg0"))
            .await
            .unwrap();

        assert_eq!(report.readings.len(), 6);
        assert_eq!(report.readings[1], FanReading::new(1, 0));
        match report.estimate {
            SpeedEstimate::Level { level, .. } => assert_eq!(level, 5),
            other => panic!("Expected level 5, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_read_fan_speeds_all_idle() {
        let controller = create_mock_controller(MockTransport::new());

        let report = controller
            .read_fan_speeds(&enclosure("/dev/sg0"))
            .await
            .unwrap();

        assert!(report.readings.iter().all(|r| r.rpm == 0));
        assert_eq!(report.estimate, SpeedEstimate::NoActiveFans);
    }

    #[tokio::test]
    async fn test_read_fan_speed_invalid_index() {
        let controller = create_mock_controller(MockTransport::new());

        let result = controller.read_fan_speed(&enclosure("/dev/sg0"), 6).await;
        assert!(matches!(
            result,
            Err(SesFanError::InvalidFanIndex {
                index: 6,
                fan_count: 6,
            })
        ));
    }

    #[tokio::test]
    async fn test_set_fan_speeds_read_modify_write() {
        let mock = MockTransport::new().with_page(sample_dump());
        let calls = mock.calls.clone();
        let writes = mock.writes.clone();
        let controller = create_mock_controller(mock);

        let output = controller
            .set_fan_speeds(&enclosure("/dev/sg0"), SpeedLevel::new(3).unwrap())
            .await
            .unwrap();
        assert_eq!(output, "ok");

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["read_page /dev/sg0 0x2", "write_page /dev/sg0 0x2"]
        );

        let writes = writes.lock().unwrap();
        assert_eq!(writes.len(), 1);

        let mut expected: Vec<u8> = (0..272).map(|i| i as u8).collect();
        for offset in [88, 92, 96, 100, 104, 108] {
            expected[offset..offset + 4].copy_from_slice(&[0x80, 0x00, 0x00, 0x23]);
        }
        assert_eq!(writes[0], format_hex_dump(&expected));
    }

    #[tokio::test]
    async fn test_set_fan_speed_code_masks_speed() {
        for speed in 0u8..=15 {
            let mock = MockTransport::new().with_page(sample_dump());
            let writes = mock.writes.clone();
            let controller = create_mock_controller(mock);

            controller
                .set_fan_speed_code(&enclosure("/dev/sg0"), speed)
                .await
                .unwrap();

            let written = writes.lock().unwrap()[0].clone();
            let page = ControlPage::<DefaultEnclosure>::parse(&written).unwrap();
            for index in 0..6 {
                assert_eq!(
                    page.fan_slot(index).unwrap(),
                    [0x80, 0x00, 0x00, 0x20 | (speed & 7)]
                );
            }
        }
    }

    #[tokio::test]
    async fn test_set_fan_speeds_short_page_not_written() {
        let mock = MockTransport::new().with_page("00 01 02 03\n".to_string());
        let writes = mock.writes.clone();
        let controller = create_mock_controller(mock);

        let result = controller
            .set_fan_speeds(&enclosure("/dev/sg0"), SpeedLevel::new(5).unwrap())
            .await;

        assert!(matches!(
            result,
            Err(SesFanError::ControlPageTooShort { len: 4, .. })
        ));
        assert!(writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_fan_speeds_read_failure() {
        let controller = create_mock_controller(MockTransport::new());

        let result = controller
            .set_fan_speeds(&enclosure("/dev/sg0"), SpeedLevel::new(1).unwrap())
            .await;

        assert!(matches!(result, Err(SesFanError::Transport(_))));
    }

    #[tokio::test]
    async fn test_dyn_transport_controller() {
        let mock = MockTransport::new().with_inquiry("/dev/sg0", b"ThinkServerSA120");
        let controller: EnclosureController =
            EnclosureController::with_transport(Box::new(mock) as Box<dyn SesTransport>);

        let found = controller.discover(&[candidate("/dev/sg0", 0)]).await;
        assert_eq!(found.len(), 1);
    }
}
