//! Test data builders for wiring a pipeline against a mock device

use serialvis_rs::backend::{MockDevice, MockPortOpener, SerialBackend, Transport};
use serialvis_rs::config::{CollectionConfig, PlotConfiguration};
use serialvis_rs::pipeline::{LineReceiver, SharedPlotState, UpdateCycle};
use serialvis_rs::ReaderHandle;
use std::sync::Arc;
use std::time::Duration;

/// Name the builder registers its device under
pub const TEST_PORT: &str = "mock://test";

/// A running pipeline connected to a mock device
pub struct TestPipeline {
    pub device: MockDevice,
    pub transport: Arc<Transport>,
    pub plot: SharedPlotState,
    pub reader: ReaderHandle,
    pub cycle: UpdateCycle,
}

/// Builder for [`TestPipeline`]
pub struct PipelineBuilder {
    config: PlotConfiguration,
    poll_interval_ms: u64,
    connect: bool,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            config: PlotConfiguration::default(),
            poll_interval_ms: 1,
            connect: true,
        }
    }

    pub fn columns(mut self, x_column: Option<usize>, y_columns: &[usize]) -> Self {
        self.config = PlotConfiguration::new(x_column, y_columns.to_vec());
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    pub fn disconnected(mut self) -> Self {
        self.connect = false;
        self
    }

    pub fn build(self) -> TestPipeline {
        let device = MockDevice::new();
        let transport = mock_transport(device.clone());
        if self.connect {
            transport.connect(TEST_PORT, 115_200).unwrap();
        }

        let collection = CollectionConfig {
            reader_poll_interval_ms: self.poll_interval_ms,
            drain_interval_ms: 1,
        };
        let (backend, lines) = SerialBackend::new(Arc::clone(&transport), &collection);
        let reader = backend.start().unwrap();

        let plot = SharedPlotState::new(self.config);
        let cycle = UpdateCycle::new(lines, plot.clone(), collection.drain_interval());

        TestPipeline {
            device,
            transport,
            plot,
            reader,
            cycle,
        }
    }
}

/// Transport over a single mock device at [`TEST_PORT`] with no settle delay
pub fn mock_transport(device: MockDevice) -> Arc<Transport> {
    let opener = MockPortOpener::empty().with_device(TEST_PORT, device);
    Arc::new(Transport::with_timing(
        Arc::new(opener),
        Duration::from_millis(10),
        Duration::ZERO,
    ))
}

/// A bare queue receiver, for feeding the cycle by hand
pub fn queue() -> (serialvis_rs::pipeline::LineSender, LineReceiver) {
    serialvis_rs::pipeline::data_queue()
}
