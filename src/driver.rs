use crate::address::Address;

/// DALI standard command opcodes (second byte of a forward frame).
mod opcode {
    pub const OFF: u8 = 0x00;
    pub const QUERY_PHYSICAL_MINIMUM: u8 = 0x9A;
    pub const QUERY_ACTUAL_LEVEL: u8 = 0xA0;
    pub const QUERY_MAX_LEVEL: u8 = 0xA1;
    pub const QUERY_MIN_LEVEL: u8 = 0xA2;
}

/// Commands the lamps issue over the bus.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Command {
    QueryPhysicalMinimum,
    QueryMinLevel,
    QueryMaxLevel,
    QueryActualLevel,
    /// Direct Arc Power Control - set level right away.
    Dapc(u8),
    Off,
}

impl Command {
    /// Queries expect a backward frame from the device.
    pub fn is_query(&self) -> bool {
        matches!(
            self,
            Self::QueryPhysicalMinimum
                | Self::QueryMinLevel
                | Self::QueryMaxLevel
                | Self::QueryActualLevel
        )
    }

    /// Encode as a 16 bit forward frame: address byte and opcode/level.
    pub fn to_frame(&self, address: Address) -> [u8; 2] {
        let addr = address.to_frame_byte();
        match self {
            Self::Dapc(level) => [addr, *level],
            Self::Off => [addr | 1, opcode::OFF],
            Self::QueryPhysicalMinimum => [addr | 1, opcode::QUERY_PHYSICAL_MINIMUM],
            Self::QueryMinLevel => [addr | 1, opcode::QUERY_MIN_LEVEL],
            Self::QueryMaxLevel => [addr | 1, opcode::QUERY_MAX_LEVEL],
            Self::QueryActualLevel => [addr | 1, opcode::QUERY_ACTUAL_LEVEL],
        }
    }
}

/// Result of a sent command. Only queries carry a value.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct Response {
    pub value: Option<u8>,
}

impl Response {
    pub fn empty() -> Self {
        Self { value: None }
    }

    pub fn with_value(value: u8) -> Self {
        Self { value: Some(value) }
    }

    /// Value of a query answer; an answer without one is an error.
    pub fn require_value(&self) -> anyhow::Result<u8> {
        self.value
            .ok_or_else(|| anyhow::anyhow!("Bus returned no value for a query"))
    }
}

/// Blocking access to a DALI bus. Implementations own the physical channel,
/// so holding `&mut` to a driver serializes all traffic.
pub trait Driver {
    /// Send a command and wait for its result.
    fn send(&mut self, address: Address, command: Command) -> anyhow::Result<Response>;

    /// Driver kind, published as the device model.
    fn name(&self) -> &str;
}
