//! Known busylight models.

use std::sync::Arc;

use hidapi::HidApi;
use log::debug;

use crate::busylight_lync::BusylightLync;
use crate::busylight_uc::BusylightUc;
use crate::controller::{HidController, SharedController};
use crate::error::{Error, Result};
use crate::session::{DeviceSession, SessionConfig};

/// Controllers indexed by their HID vendor and product ID.
#[derive(Default)]
pub struct Registry {
    controllers: Vec<SharedController>,
}

impl Registry {
    /// Create a registry without any controllers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with all supported busylight models.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(BusylightUc);
        registry.register(BusylightLync);
        registry
    }

    /// Add a controller.
    ///
    /// Later registrations take precedence for the same vendor and product ID.
    pub fn register<C>(&mut self, controller: C)
    where
        C: HidController + Send + Sync + 'static,
    {
        self.controllers.push(Arc::new(controller));
    }

    /// All registered controllers.
    pub fn controllers(&self) -> &[SharedController] {
        &self.controllers
    }

    /// Find the controller for a HID device.
    pub fn find(&self, vendor_id: u16, product_id: u16) -> Option<&SharedController> {
        self.controllers.iter().rev().find(|controller| {
            controller.vendor_id() == vendor_id && controller.product_id() == product_id
        })
    }

    /// Open a HID device and start its session.
    pub fn open(&self, api: &HidApi, vendor_id: u16, product_id: u16) -> Result<DeviceSession> {
        self.open_with_config(api, vendor_id, product_id, SessionConfig::default())
    }

    /// Open a HID device and start its session with a custom configuration.
    pub fn open_with_config(
        &self,
        api: &HidApi,
        vendor_id: u16,
        product_id: u16,
        config: SessionConfig,
    ) -> Result<DeviceSession> {
        let controller = self
            .find(vendor_id, product_id)
            .ok_or(Error::UnknownDevice { vendor_id, product_id })?;

        let device = api.open(vendor_id, product_id).map_err(|err| {
            Error::OpenFailed(format!("{}: {} (root permissions required)", controller.name(), err))
        })?;

        debug!("opened {} ({vendor_id:04x}:{product_id:04x})", controller.name());

        DeviceSession::with_config(device, controller.clone(), config)
    }
}
