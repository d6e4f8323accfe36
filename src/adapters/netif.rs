//! Network interface adapter.
//!
//! Implements [`NetworkPort`] over the IP stack's interface table.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: raw `esp_netif_*` calls against the default
//!   interfaces ESP-IDF registers (`ETH_DEF`, `WIFI_STA_DEF`, `WIFI_AP_DEF`).
//!   The Ethernet driver itself is brought up before this adapter is used.
//! - **all other targets**: a simulated stack with one Ethernet interface
//!   whose DHCP client hands out a fixed lease.

use std::net::Ipv4Addr;

#[cfg(not(target_os = "espidf"))]
use log::info;

use crate::app::ports::{InterfaceInfo, InterfaceKind, MAX_INTERFACES, NetError, NetworkPort};

#[cfg(target_os = "espidf")]
const KNOWN_IFKEYS: [(&core::ffi::CStr, InterfaceKind); 3] = [
    (c"ETH_DEF", InterfaceKind::Ethernet),
    (c"WIFI_STA_DEF", InterfaceKind::Wireless),
    (c"WIFI_AP_DEF", InterfaceKind::Wireless),
];

/// Lease handed out by the simulated DHCP server.
#[cfg(not(target_os = "espidf"))]
pub const SIM_LEASE: (Ipv4Addr, Ipv4Addr) = (Ipv4Addr::new(192, 168, 1, 50), Ipv4Addr::new(255, 255, 255, 0));

pub struct NetifAdapter {
    #[cfg(not(target_os = "espidf"))]
    sim_ifaces: heapless::Vec<InterfaceInfo, MAX_INTERFACES>,
}

impl Default for NetifAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl NetifAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            sim_ifaces: {
                let mut v = heapless::Vec::new();
                let _ = v.push(InterfaceInfo {
                    index: 0,
                    kind: InterfaceKind::Ethernet,
                    dhcp_enabled: false,
                    address: Ipv4Addr::UNSPECIFIED,
                    netmask: Ipv4Addr::UNSPECIFIED,
                });
                v
            },
        }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn handle(index: usize) -> Result<*mut esp_idf_svc::sys::esp_netif_t, NetError> {
        let (key, _) = KNOWN_IFKEYS.get(index).ok_or(NetError::UnknownInterface(index))?;
        // SAFETY: key is a NUL-terminated literal; lookup only reads it.
        let h = unsafe { esp_idf_svc::sys::esp_netif_get_handle_from_ifkey(key.as_ptr()) };
        if h.is_null() {
            return Err(NetError::UnknownInterface(index));
        }
        Ok(h)
    }

    #[cfg(target_os = "espidf")]
    fn query(index: usize, kind: InterfaceKind) -> Result<Option<InterfaceInfo>, NetError> {
        use esp_idf_svc::sys::*;

        let Ok(h) = Self::handle(index) else {
            return Ok(None);
        };

        let mut status: esp_netif_dhcp_status_t = 0;
        // SAFETY: h is a live netif handle; status is a valid out-pointer.
        let ret = unsafe { esp_netif_dhcpc_get_status(h, &mut status) };
        if ret != ESP_OK as i32 {
            return Err(NetError::QueryFailed(ret));
        }

        let mut ip: esp_netif_ip_info_t = Default::default();
        // SAFETY: as above.
        let ret = unsafe { esp_netif_get_ip_info(h, &mut ip) };
        if ret != ESP_OK as i32 {
            return Err(NetError::QueryFailed(ret));
        }

        Ok(Some(InterfaceInfo {
            index,
            kind,
            dhcp_enabled: status == esp_netif_dhcp_status_t_ESP_NETIF_DHCP_STARTED,
            address: Ipv4Addr::from(ip.ip.addr.to_ne_bytes()),
            netmask: Ipv4Addr::from(ip.netmask.addr.to_ne_bytes()),
        }))
    }

    #[cfg(target_os = "espidf")]
    fn platform_interfaces(&self) -> Result<heapless::Vec<InterfaceInfo, MAX_INTERFACES>, NetError> {
        let mut out = heapless::Vec::new();
        for (index, (_, kind)) in KNOWN_IFKEYS.iter().enumerate() {
            if let Some(info) = Self::query(index, *kind)? {
                let _ = out.push(info);
            }
        }
        Ok(out)
    }

    #[cfg(target_os = "espidf")]
    fn platform_start_dhcp(&mut self, index: usize) -> Result<(), NetError> {
        use esp_idf_svc::sys::*;
        let h = Self::handle(index)?;
        // SAFETY: h is a live netif handle.
        let ret = unsafe { esp_netif_dhcpc_start(h) };
        if ret != ESP_OK as i32 && ret != ESP_ERR_ESP_NETIF_DHCP_ALREADY_STARTED as i32 {
            return Err(NetError::DhcpFailed(ret));
        }
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_renew(&mut self, index: usize) -> Result<(), NetError> {
        use esp_idf_svc::sys::*;
        let h = Self::handle(index)?;
        // Restarting the client sends a fresh DISCOVER.
        // SAFETY: h is a live netif handle.
        let ret = unsafe { esp_netif_dhcpc_stop(h) };
        if ret != ESP_OK as i32 && ret != ESP_ERR_ESP_NETIF_DHCP_ALREADY_STOPPED as i32 {
            return Err(NetError::DhcpFailed(ret));
        }
        self.platform_start_dhcp(index)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_interfaces(&self) -> Result<heapless::Vec<InterfaceInfo, MAX_INTERFACES>, NetError> {
        Ok(self.sim_ifaces.clone())
    }

    #[cfg(not(target_os = "espidf"))]
    fn sim_iface(&mut self, index: usize) -> Result<&mut InterfaceInfo, NetError> {
        self.sim_ifaces
            .iter_mut()
            .find(|i| i.index == index)
            .ok_or(NetError::UnknownInterface(index))
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start_dhcp(&mut self, index: usize) -> Result<(), NetError> {
        self.sim_iface(index)?.dhcp_enabled = true;
        info!("Netif(sim): DHCP client started on #{}", index);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_renew(&mut self, index: usize) -> Result<(), NetError> {
        let iface = self.sim_iface(index)?;
        if !iface.dhcp_enabled {
            return Err(NetError::DhcpFailed(-1));
        }
        (iface.address, iface.netmask) = SIM_LEASE;
        Ok(())
    }
}

impl NetworkPort for NetifAdapter {
    fn interfaces(&self) -> Result<heapless::Vec<InterfaceInfo, MAX_INTERFACES>, NetError> {
        self.platform_interfaces()
    }

    fn enable_dhcp(&mut self, index: usize) -> Result<(), NetError> {
        self.platform_start_dhcp(index)
    }

    fn renew_lease(&mut self, index: usize) -> Result<(), NetError> {
        self.platform_renew(index)
    }
}
