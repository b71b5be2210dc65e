//! The host side of the machine.
//!
//! A [`Frontend`] receives diagnostics, answers device-busy polls and
//! carries out the transfers that IN, OUT and IOC start. Only the device
//! callbacks are mandatory; the rest default to logging.

use crate::cpu::io::{CharTransfer, ControlOp, Device, Direction, WordTransfer};
use thiserror::Error;

/// A non-fatal fault. Execution always continues after one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Warning {
    #[error("invalid field specification {field} at {address}, using (0:5)")]
    InvalidField { field: u8, address: usize },

    #[error("invalid index register {index} at {address}, using 6")]
    InvalidIndex { index: u8, address: usize },

    #[error("address {value} out of range at {address}, using 3999")]
    AddressOutOfRange { value: i64, address: usize },

    #[error("invalid device {device} at {address}")]
    InvalidDevice { device: u8, address: usize },

    #[error("unsupported operation C={opcode} F={field} at {address}")]
    UnsupportedOperation { opcode: u8, field: u8, address: usize },

    #[error("negative shift count {count} at {address}")]
    NegativeShift { count: i64, address: usize },

    #[error("negative MOVE destination {target} at {address}, using its magnitude")]
    NegativeMoveTarget { target: i64, address: usize },

    #[error("MOVE destination {target} out of range at {address}, using 3999")]
    MoveTargetOutOfRange { target: i64, address: usize },

    #[error("unsupported line printer control M={count} at {address}")]
    UnsupportedPrinterControl { count: i64, address: usize },

    #[error("{device} has no control operations (IOC at {address})")]
    NoControl { device: Device, address: usize },
}

/// Host callbacks used by the machine.
///
/// Device callbacks receive a copy of the descriptor just installed; the
/// backend later moves data with the machine's stream adapters and polls
/// are answered through [`Frontend::device_busy`].
pub trait Frontend {
    /// Report a non-fatal fault.
    fn warning(&mut self, warning: &Warning) {
        log::warn!("{}", warning);
    }

    /// Poll for an external stop request. Checked once per `step` call.
    fn check_signals(&mut self) -> bool {
        false
    }

    /// A character-mode transfer has started.
    fn begin_char_io(&mut self, device: Device, transfer: &CharTransfer, direction: Direction);

    /// A word-mode transfer has started.
    fn begin_word_io(&mut self, device: Device, transfer: &WordTransfer, direction: Direction);

    /// True while `device` is still working on its last request.
    fn device_busy(&mut self, device: Device) -> bool;

    /// Carry out an IOC positioning request.
    fn device_control(&mut self, op: ControlOp);

    /// The machine started (`true`) or stopped (`false`) waiting on `device`.
    fn notify_waiting(&mut self, device: Device, waiting: bool) {
        log::debug!(
            "{} {}",
            if waiting { "waiting for" } else { "done waiting for" },
            device
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_messages() {
        let w = Warning::InvalidField { field: 7, address: 12 };
        assert_eq!(w.to_string(), "invalid field specification 7 at 12, using (0:5)");

        let w = Warning::NoControl { device: Device::CardPunch, address: 3 };
        assert_eq!(w.to_string(), "card punch has no control operations (IOC at 3)");
    }
}
