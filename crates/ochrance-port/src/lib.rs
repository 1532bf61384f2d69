//! Block I/O port: the external interface the repair engine and filesystem
//! reader use to touch real storage. The thin block-I/O shim that issues
//! NVMe ioctls is out of scope here — this crate defines the trait a real
//! block layer implements, not an implementation of it. The boundary runs
//! the opposite direction from a typical FFI shim: we define the interface
//! the real layer must satisfy, rather than exposing an `extern "C"`
//! surface ourselves, since there is no FFI/ioctl surface in scope for
//! this workspace.
#![forbid(unsafe_code)]

use thiserror::Error;

/// NVMe-style device health telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceHealth {
    pub critical_warning: u8,
    pub composite_temperature_kelvin: u16,
    pub available_spare_percent: u8,
    pub usage_percent: u8,
    pub data_units_read: u64,
    pub data_units_written: u64,
    pub power_on_hours: u64,
    pub unsafe_shutdown_count: u64,
    pub media_error_count: u64,
}

/// Errors a [`BlockIoPort`] operation can return. Anything not in this set
/// is surfaced verbatim as `Unknown(code)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PortError {
    #[error("bad descriptor")]
    BadDescriptor,
    #[error("I/O failure")]
    IoFailure,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("permission denied")]
    PermissionDenied,
    #[error("read-only device")]
    ReadOnlyDevice,
    #[error("access fault")]
    AccessFault,
    #[error("unknown error code {0}")]
    Unknown(i32),
}

impl PortError {
    /// Map a raw negative error code (the underlying convention returns
    /// zero on success and a negative error code on failure) to a typed
    /// [`PortError`]. `code` is expected to already be the caller's
    /// interpreted errno-style
    /// value, not the raw negative return — callers normalise the sign
    /// before calling this.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            9 => Self::BadDescriptor,   // EBADF
            5 => Self::IoFailure,       // EIO
            22 => Self::InvalidArgument, // EINVAL
            13 => Self::PermissionDenied, // EACCES
            30 => Self::ReadOnlyDevice, // EROFS
            14 => Self::AccessFault,    // EFAULT
            other => Self::Unknown(other),
        }
    }
}

/// The external interface to logical block storage. All three operations
/// return `Ok(())` on success and a [`PortError`] on failure, matching the
/// "zero on success / negative error code on failure" convention of the
/// underlying NVMe ioctl surface this trait abstracts over.
pub trait BlockIoPort {
    /// Read device health telemetry for `device_path`.
    fn read_health(&self, device_path: &str) -> Result<DeviceHealth, PortError>;

    /// Read one logical block at `lba` into `buf`. `buf.len()` is the
    /// caller-declared block size.
    fn read_block(&self, lba: u64, buf: &mut [u8]) -> Result<(), PortError>;

    /// Write one logical block at `lba` from `buf`.
    fn write_block(&self, lba: u64, buf: &[u8]) -> Result<(), PortError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_mapping_matches_posix_errno() {
        assert_eq!(PortError::from_code(9), PortError::BadDescriptor);
        assert_eq!(PortError::from_code(5), PortError::IoFailure);
        assert_eq!(PortError::from_code(22), PortError::InvalidArgument);
        assert_eq!(PortError::from_code(13), PortError::PermissionDenied);
        assert_eq!(PortError::from_code(30), PortError::ReadOnlyDevice);
        assert_eq!(PortError::from_code(14), PortError::AccessFault);
        assert_eq!(PortError::from_code(999), PortError::Unknown(999));
    }

    struct MemoryPort {
        blocks: std::sync::Mutex<Vec<Vec<u8>>>,
    }

    impl BlockIoPort for MemoryPort {
        fn read_health(&self, _device_path: &str) -> Result<DeviceHealth, PortError> {
            Ok(DeviceHealth::default())
        }

        fn read_block(&self, lba: u64, buf: &mut [u8]) -> Result<(), PortError> {
            let blocks = self.blocks.lock().unwrap();
            let block = blocks.get(lba as usize).ok_or(PortError::InvalidArgument)?;
            buf.copy_from_slice(block);
            Ok(())
        }

        fn write_block(&self, lba: u64, buf: &[u8]) -> Result<(), PortError> {
            let mut blocks = self.blocks.lock().unwrap();
            let block = blocks.get_mut(lba as usize).ok_or(PortError::InvalidArgument)?;
            block.copy_from_slice(buf);
            Ok(())
        }
    }

    #[test]
    fn trait_object_round_trips_through_read_write() {
        let port: Box<dyn BlockIoPort> = Box::new(MemoryPort {
            blocks: std::sync::Mutex::new(vec![vec![0u8; 4096]]),
        });
        let mut buf = [0u8; 4096];
        buf[0] = 7;
        port.write_block(0, &buf).unwrap();
        let mut out = [0u8; 4096];
        port.read_block(0, &mut out).unwrap();
        assert_eq!(out[0], 7);
    }

    #[test]
    fn out_of_range_lba_is_invalid_argument() {
        let port = MemoryPort {
            blocks: std::sync::Mutex::new(vec![vec![0u8; 4096]]),
        };
        let mut buf = [0u8; 4096];
        assert_eq!(port.read_block(5, &mut buf), Err(PortError::InvalidArgument));
    }
}
