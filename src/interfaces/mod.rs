//! Network interface snapshots and the diff between two of them

use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

mod list;

pub use list::list_interfaces;

/// Kernel interface index
pub type IfIndex = u32;

/// All interfaces at one point in time, keyed by index
pub type InterfaceMap = HashMap<IfIndex, Interface>;

/// An IP address paired with its prefix length (network mask).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IpRecord {
    pub ip: IpAddr,
    pub prefix_len: u8,
}

impl IpRecord {
    pub fn new(ip: impl Into<IpAddr>, prefix_len: u8) -> Self {
        Self {
            ip: ip.into(),
            prefix_len,
        }
    }
}

/// Information about one network interface at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    pub index: IfIndex,
    pub name: String,
    /// Hardware address, empty when the platform does not report one.
    /// Android may hand out a placeholder for privacy reasons.
    pub hw_addr: String,
    pub ips: Vec<IpRecord>,
}

impl Interface {
    pub fn ipv4_ips(&self) -> impl Iterator<Item = &Ipv4Addr> {
        self.ips.iter().filter_map(|record| match record.ip {
            IpAddr::V4(ref v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
    }

    pub fn ipv6_ips(&self) -> impl Iterator<Item = &Ipv6Addr> {
        self.ips.iter().filter_map(|record| match record.ip {
            IpAddr::V4(_) => None,
            IpAddr::V6(ref v6) => Some(v6),
        })
    }
}

/// Delivered to watchers whenever a change is signalled.
///
/// Carries the full current snapshot plus what changed since the previous
/// delivery; use whichever is convenient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub interfaces: InterfaceMap,
    pub diff: UpdateDiff,
}

/// What changed between one `Update` and the next.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateDiff {
    pub added: Vec<IfIndex>,
    pub removed: Vec<IfIndex>,
    pub modified: HashMap<IfIndex, InterfaceDiff>,
}

impl UpdateDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

/// Changes within an interface present in both snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InterfaceDiff {
    pub hw_addr_changed: bool,
    pub addrs_added: Vec<IpRecord>,
    pub addrs_removed: Vec<IpRecord>,
}

/// Compute the changes that turn `prev` into `curr`
///
/// All vectors in the result are sorted.
pub fn diff(prev: &InterfaceMap, curr: &InterfaceMap) -> UpdateDiff {
    let mut added: Vec<IfIndex> = curr.keys().filter(|i| !prev.contains_key(i)).copied().collect();
    let mut removed: Vec<IfIndex> = prev.keys().filter(|i| !curr.contains_key(i)).copied().collect();
    added.sort_unstable();
    removed.sort_unstable();

    let modified = curr
        .iter()
        .filter_map(|(index, now)| {
            let before = prev.get(index)?;
            (before != now).then(|| (*index, interface_diff(before, now)))
        })
        .collect();

    UpdateDiff {
        added,
        removed,
        modified,
    }
}

fn interface_diff(before: &Interface, now: &Interface) -> InterfaceDiff {
    let old: HashSet<&IpRecord> = before.ips.iter().collect();
    let new: HashSet<&IpRecord> = now.ips.iter().collect();

    let mut addrs_added: Vec<IpRecord> = new.difference(&old).map(|r| (*r).clone()).collect();
    let mut addrs_removed: Vec<IpRecord> = old.difference(&new).map(|r| (*r).clone()).collect();
    addrs_added.sort();
    addrs_removed.sort();

    InterfaceDiff {
        hw_addr_changed: before.hw_addr != now.hw_addr,
        addrs_added,
        addrs_removed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iface(index: IfIndex, name: &str, hw: &str, ips: &[(&str, u8)]) -> Interface {
        Interface {
            index,
            name: name.to_string(),
            hw_addr: hw.to_string(),
            ips: ips
                .iter()
                .map(|(ip, len)| IpRecord::new(ip.parse::<IpAddr>().unwrap(), *len))
                .collect(),
        }
    }

    fn map(ifaces: Vec<Interface>) -> InterfaceMap {
        ifaces.into_iter().map(|i| (i.index, i)).collect()
    }

    #[test]
    fn test_diff_from_empty() {
        let curr = map(vec![
            iface(2, "wlan0", "AA:BB:CC:DD:EE:FF", &[("192.168.1.5", 24)]),
            iface(1, "lo", "00:00:00:00:00:00", &[("127.0.0.1", 8)]),
        ]);
        let diff = diff(&InterfaceMap::new(), &curr);
        assert_eq!(diff.added, vec![1, 2]);
        assert!(diff.removed.is_empty());
        assert!(diff.modified.is_empty());
    }

    #[test]
    fn test_diff_unchanged_is_empty() {
        let curr = map(vec![iface(1, "lo", "", &[("127.0.0.1", 8)])]);
        assert!(diff(&curr, &curr).is_empty());
    }

    #[test]
    fn test_diff_address_changes() {
        let prev = map(vec![
            iface(1, "lo", "", &[("127.0.0.1", 8)]),
            iface(3, "rmnet0", "", &[("10.0.0.2", 30)]),
        ]);
        let curr = map(vec![
            iface(1, "lo", "", &[("127.0.0.1", 8), ("127.0.0.10", 8)]),
            iface(4, "wlan0", "", &[]),
        ]);

        let diff = diff(&prev, &curr);
        assert_eq!(diff.added, vec![4]);
        assert_eq!(diff.removed, vec![3]);
        assert_eq!(diff.modified.len(), 1);

        let lo = &diff.modified[&1];
        assert!(!lo.hw_addr_changed);
        assert_eq!(lo.addrs_added, vec![IpRecord::new(Ipv4Addr::new(127, 0, 0, 10), 8)]);
        assert!(lo.addrs_removed.is_empty());
    }

    #[test]
    fn test_diff_hw_addr_and_prefix() {
        let prev = map(vec![iface(2, "eth0", "02:00:00:00:00:01", &[("10.1.1.1", 16)])]);
        let curr = map(vec![iface(2, "eth0", "02:00:00:00:00:02", &[("10.1.1.1", 24)])]);

        let eth0 = &diff(&prev, &curr).modified[&2];
        assert!(eth0.hw_addr_changed);
        assert_eq!(eth0.addrs_added, vec![IpRecord::new(Ipv4Addr::new(10, 1, 1, 1), 24)]);
        assert_eq!(eth0.addrs_removed, vec![IpRecord::new(Ipv4Addr::new(10, 1, 1, 1), 16)]);
    }

    #[test]
    fn test_family_helpers() {
        let i = iface(1, "wlan0", "", &[("192.168.0.2", 24), ("fe80::1", 64)]);
        assert_eq!(i.ipv4_ips().count(), 1);
        assert_eq!(i.ipv6_ips().next(), Some(&"fe80::1".parse::<Ipv6Addr>().unwrap()));
    }
}
