//! Interface enumeration via `getifaddrs(3)`
//!
//! One `ifaddrs` entry exists per (interface, address) pair; entries are
//! folded into one `Interface` per index. Only interfaces that are up are
//! reported.

use super::InterfaceMap;
use crate::Error;

#[cfg(unix)]
pub fn list_interfaces() -> Result<InterfaceMap, Error> {
    imp::list_interfaces()
}

/// Interface listing needs `getifaddrs`; other targets report `Unsupported`.
#[cfg(not(unix))]
pub fn list_interfaces() -> Result<InterfaceMap, Error> {
    Err(Error::Unsupported)
}

#[cfg(unix)]
mod imp {
    use std::collections::HashMap;
    use std::fmt::Write;
    use std::net::IpAddr;

    use nix::ifaddrs::{getifaddrs, InterfaceAddress};
    use nix::net::if_::{if_nametoindex, InterfaceFlags};
    use nix::sys::socket::SockaddrStorage;

    use crate::interfaces::{Interface, InterfaceMap, IpRecord};
    use crate::Error;

    pub(super) fn list_interfaces() -> Result<InterfaceMap, Error> {
        let addrs = getifaddrs().map_err(|errno| Error::Getifaddrs(errno.to_string()))?;

        let mut interfaces: InterfaceMap = HashMap::new();
        for entry in addrs {
            if !entry.flags.contains(InterfaceFlags::IFF_UP) {
                continue;
            }
            let index = match if_nametoindex(entry.interface_name.as_str()) {
                Ok(index) if index != 0 => index,
                _ => {
                    // Interface vanished between getifaddrs and the lookup
                    tracing::debug!("{}", Error::InterfaceName(entry.interface_name.clone()));
                    continue;
                }
            };

            let interface = interfaces.entry(index).or_insert_with(|| Interface {
                index,
                name: entry.interface_name.clone(),
                hw_addr: String::new(),
                ips: Vec::new(),
            });
            record_address(interface, &entry);
        }

        Ok(interfaces)
    }

    fn record_address(interface: &mut Interface, entry: &InterfaceAddress) {
        let Some(addr) = entry.address.as_ref() else {
            return;
        };
        let mask = entry.netmask.as_ref();

        if let Some(v4) = addr.as_sockaddr_in() {
            let prefix_len = mask.map_or(0, netmask_v4);
            interface.ips.push(IpRecord::new(IpAddr::V4(v4.ip()), prefix_len));
        } else if let Some(v6) = addr.as_sockaddr_in6() {
            let prefix_len = mask.map_or(0, netmask_v6);
            interface.ips.push(IpRecord::new(IpAddr::V6(v6.ip()), prefix_len));
        } else if let Some(mac) = addr.as_link_addr().and_then(|link| link.addr()) {
            interface.hw_addr = format_mac(&mac);
        }
    }

    fn netmask_v4(mask: &SockaddrStorage) -> u8 {
        mask.as_sockaddr_in()
            .map_or(0, |m| u32::from(m.ip()).leading_ones() as u8)
    }

    fn netmask_v6(mask: &SockaddrStorage) -> u8 {
        mask.as_sockaddr_in6()
            .map_or(0, |m| u128::from(m.ip()).leading_ones() as u8)
    }

    /// Upper-case, colon-separated hex
    pub(super) fn format_mac(bytes: &[u8]) -> String {
        let mut mac = String::with_capacity(bytes.len() * 3);
        for (i, byte) in bytes.iter().enumerate() {
            if i != 0 {
                mac.push(':');
            }
            // Writing into a String cannot fail
            let _ = write!(mac, "{:02X}", byte);
        }
        mac
    }

}
