//! Interface and bundle power transitions.
//!
//! Every transition runs [`power::gate`] first; only on
//! [`Gate::Proceed`] is a control request sent, and local state is
//! committed only after the request succeeds.  Bundle transitions need the
//! owning interface (for the control channel and the upward cascade), so
//! they are addressed by bundle id on [`Interface`].
//!
//! Lowering a bundle ends with a courtesy attempt to lower its interface
//! the same way.  That attempt is logged and otherwise ignored: the
//! interface stays up while sibling bundles still need it.

use log::{debug, error, warn};

use crate::app::ports::FabricController;
use crate::error::Result;
use crate::power::{self, Gate, Outcome, PowerState};
use crate::rpc::transport::RpcChannel;

use super::Interface;

/// Raising a state never consults children.
const NO_CHILDREN: [PowerState; 0] = [];

impl Interface {
    // ── Interface ─────────────────────────────────────────────

    /// Request ON from the module.  No fabric controller calls are made.
    pub fn power_on(&mut self, rpc: &mut impl RpcChannel) -> Result<Outcome> {
        if let Gate::Skip(outcome) = power::gate(self.power_state, PowerState::On, NO_CHILDREN)? {
            return Ok(outcome);
        }

        self.control
            .set_interface_power_state(rpc, PowerState::On)
            .inspect_err(|e| error!("interface {}: failed to set ON: {}", self.id, e))?;

        self.commit(PowerState::On);
        Ok(Outcome::Performed)
    }

    /// Suspend the interface, then gate its reference clock.
    pub fn power_suspend(
        &mut self,
        bus: &mut (impl RpcChannel + FabricController),
    ) -> Result<Outcome> {
        if let Gate::Skip(outcome) =
            power::gate(self.power_state, PowerState::Suspend, self.bundle_states())?
        {
            return Ok(outcome);
        }

        self.control
            .set_interface_power_state(bus, PowerState::Suspend)
            .inspect_err(|e| error!("interface {}: failed to set SUSPEND: {}", self.id, e))?;

        if let Err(e) = bus.refclk_state_set(self.id, false) {
            warn!("interface {}: refclk disable failed: {}", self.id, e);
        }

        self.commit(PowerState::Suspend);
        Ok(Outcome::Performed)
    }

    /// Power the interface off, then gate its clock and slot power.
    pub fn power_off(&mut self, bus: &mut (impl RpcChannel + FabricController)) -> Result<Outcome> {
        if let Gate::Skip(outcome) =
            power::gate(self.power_state, PowerState::Off, self.bundle_states())?
        {
            return Ok(outcome);
        }

        self.control
            .set_interface_power_state(bus, PowerState::Off)
            .inspect_err(|e| error!("interface {}: failed to set OFF: {}", self.id, e))?;

        if let Err(e) = bus.refclk_state_set(self.id, false) {
            warn!("interface {}: refclk disable failed: {}", self.id, e);
        }
        if let Err(e) = bus.power_state_set(self.id, false) {
            warn!("interface {}: slot power disable failed: {}", self.id, e);
        }

        self.commit(PowerState::Off);
        Ok(Outcome::Performed)
    }

    fn commit(&mut self, state: PowerState) {
        debug!("interface {}: {} -> {}", self.id, self.power_state, state);
        self.power_state = state;
    }

    // ── Bundles ───────────────────────────────────────────────

    /// Power a bundle on, powering its interface on first.
    pub fn bundle_power_on(&mut self, rpc: &mut impl RpcChannel, bundle_id: u8) -> Result<Outcome> {
        let current = self.bundle_mut(bundle_id)?.power_state();
        if let Gate::Skip(outcome) = power::gate(current, PowerState::On, NO_CHILDREN)? {
            return Ok(outcome);
        }

        self.power_on(rpc).inspect_err(|e| {
            error!(
                "bundle {}.{}: parent interface failed to power on: {}",
                self.id, bundle_id, e
            );
        })?;

        self.set_bundle_state(rpc, bundle_id, PowerState::On)?;
        Ok(Outcome::Performed)
    }

    pub fn bundle_power_suspend(
        &mut self,
        bus: &mut (impl RpcChannel + FabricController),
        bundle_id: u8,
    ) -> Result<Outcome> {
        let bundle = self.bundle_mut(bundle_id)?;
        if let Gate::Skip(outcome) = power::gate(
            bundle.power_state(),
            PowerState::Suspend,
            bundle.connection_states(),
        )? {
            return Ok(outcome);
        }

        self.set_bundle_state(bus, bundle_id, PowerState::Suspend)?;

        if let Err(e) = self.power_suspend(bus) {
            debug!("interface {}: stays up after bundle suspend: {}", self.id, e);
        }
        Ok(Outcome::Performed)
    }

    pub fn bundle_power_off(
        &mut self,
        bus: &mut (impl RpcChannel + FabricController),
        bundle_id: u8,
    ) -> Result<Outcome> {
        let bundle = self.bundle_mut(bundle_id)?;
        if let Gate::Skip(outcome) = power::gate(
            bundle.power_state(),
            PowerState::Off,
            bundle.connection_states(),
        )? {
            return Ok(outcome);
        }

        self.set_bundle_state(bus, bundle_id, PowerState::Off)?;

        if let Err(e) = self.power_off(bus) {
            debug!("interface {}: stays up after bundle off: {}", self.id, e);
        }
        Ok(Outcome::Performed)
    }

    /// System-suspend path for one bundle: let every connection quiesce,
    /// wake the bundle if it is suspended, then power it off.
    ///
    /// The first callback failure aborts; connections already notified are
    /// not rolled back.
    pub fn bundle_runtime_suspend(
        &mut self,
        bus: &mut (impl RpcChannel + FabricController),
        bundle_id: u8,
    ) -> Result<Outcome> {
        let bundle = self.bundle_mut(bundle_id)?;
        bundle.notify_suspend().inspect_err(|e| {
            error!("bundle {}: suspend notification failed: {}", bundle_id, e);
        })?;

        if bundle.power_state() == PowerState::Suspend {
            self.bundle_power_on(bus, bundle_id)?;
        }

        self.bundle_power_off(bus, bundle_id)
    }

    /// Remote request, then local commit.
    fn set_bundle_state(
        &mut self,
        rpc: &mut impl RpcChannel,
        bundle_id: u8,
        state: PowerState,
    ) -> Result<()> {
        self.control
            .set_bundle_power_state(rpc, bundle_id, state)
            .inspect_err(|e| {
                error!(
                    "bundle {}.{}: failed to set {}: {}",
                    self.id, bundle_id, state, e
                );
            })?;

        let bundle = self.bundle_mut(bundle_id)?;
        debug!(
            "bundle {}.{}: {} -> {}",
            bundle.interface_id(),
            bundle_id,
            bundle.power_state(),
            state
        );
        bundle.set_power_state(state);
        Ok(())
    }
}
