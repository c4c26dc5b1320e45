use crate::address::Address;
use crate::driver::{Command, Driver, Response};
use std::io::{Read, Write};
use std::time::Duration;
use tracing::{debug, info};

const PREAMBULE_LENGTH: usize = 2;
const FRAME_LENGTH: usize = 2;

/// Synchronization byte 1.
const SYNC_BYTE_1: u8 = 0x21; // !
/// Sync byte 2 for a forward (to the bus) frame.
const SYNC_BYTE_2_FORWARD: u8 = 0x44; // D
/// Sync byte 2 for a backward (from the bus) frame.
const SYNC_BYTE_2_BACKWARD: u8 = 0x52; // R

/// Backward frame status: device answered.
const STATUS_ANSWER: u8 = 0x00;
/// Backward frame status: nobody answered within the DALI settling time.
const STATUS_NO_ANSWER: u8 = 0x01;

/// How long to wait for the adapter to report a query answer.
const READ_TIMEOUT: Duration = Duration::from_millis(200);

/// Byte stream to the adapter that can drop unread input.
pub trait Port: Read + Write {
    /// Discard anything received but not read yet.
    fn clear_input(&mut self) -> anyhow::Result<()>;
}

impl Port for Box<dyn tokio_serial::SerialPort> {
    fn clear_input(&mut self) -> anyhow::Result<()> {
        self.clear(tokio_serial::ClearBuffer::Input)?;
        Ok(())
    }
}

/// DALI bus accessed through a USB serial adapter.
///
/// Each call writes one forward frame and, for queries, blocks until the
/// adapter reports the backward frame (or its absence).
pub struct SerialDriver<P = Box<dyn tokio_serial::SerialPort>> {
    port: P,
}

impl SerialDriver {
    #[tracing::instrument]
    pub fn open(port_name: &str, baud_rate: u32) -> anyhow::Result<Self> {
        let port = tokio_serial::new(port_name, baud_rate)
            .timeout(READ_TIMEOUT)
            .open()?;
        info!("Opened DALI adapter at {}", port_name);
        Ok(Self::with_port(port))
    }
}

impl<P: Port> SerialDriver<P> {
    pub fn with_port(port: P) -> Self {
        Self { port }
    }

    fn write_frame(&mut self, frame: [u8; FRAME_LENGTH]) -> anyhow::Result<()> {
        let mut buf = [0u8; PREAMBULE_LENGTH + FRAME_LENGTH];
        buf[0] = SYNC_BYTE_1;
        buf[1] = SYNC_BYTE_2_FORWARD;
        buf[2..].copy_from_slice(&frame);

        // A late answer to a timed out query would be taken for ours.
        self.port.clear_input()?;
        self.port.write_all(&buf)?;
        self.port.flush()?;
        debug!("TX->USB: {} bytes: {:02x?}", buf.len(), buf);
        Ok(())
    }

    fn read_answer(&mut self) -> anyhow::Result<u8> {
        let mut buf = [0u8; PREAMBULE_LENGTH + 2];
        self.port.read_exact(&mut buf)?;
        debug!("USB->RX: {} bytes: {:02x?}", buf.len(), buf);

        if buf[0] != SYNC_BYTE_1 || buf[1] != SYNC_BYTE_2_BACKWARD {
            anyhow::bail!("Synchronization failed - preambule error: {:02x?}", buf);
        }

        match buf[2] {
            STATUS_ANSWER => Ok(buf[3]),
            STATUS_NO_ANSWER => anyhow::bail!("No answer from the bus"),
            status => anyhow::bail!("Unknown adapter status {:#04x}", status),
        }
    }
}

impl<P: Port> Driver for SerialDriver<P> {
    fn send(&mut self, address: Address, command: Command) -> anyhow::Result<Response> {
        self.write_frame(command.to_frame(address))?;
        if command.is_query() {
            let value = self.read_answer()?;
            Ok(Response::with_value(value))
        } else {
            Ok(Response::empty())
        }
    }

    fn name(&self) -> &str {
        "SerialDriver"
    }
}
