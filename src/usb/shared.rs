//! Sharing the device between the USB interrupt and the key-scan interrupt.
//!
//! Both handlers reach the device through a critical section, so the scan
//! interrupt can never run while the USB interrupt is halfway through an
//! event (and vice versa).

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use super::UsbDevice;

/// A [`UsbDevice`] that can live in a `static`.
///
/// ```ignore
/// static USB: SharedDevice = SharedDevice::new();
///
/// // USB interrupt
/// USB.with(|dev| dev.advance(event, &mut link));
/// // key-scan interrupt
/// USB.with(|dev| dev.emit_keyboard(&mut link, report));
/// ```
pub struct SharedDevice {
    inner: Mutex<CriticalSectionRawMutex, RefCell<UsbDevice>>,
}

impl Default for SharedDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedDevice {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(UsbDevice::new())),
        }
    }

    /// Run `f` with exclusive access to the device, interrupts masked.
    pub fn with<R>(&self, f: impl FnOnce(&mut UsbDevice) -> R) -> R {
        self.inner.lock(|cell| f(&mut *cell.borrow_mut()))
    }
}
