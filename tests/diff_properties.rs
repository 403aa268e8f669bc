use netwatcher_android::interfaces::diff;
use netwatcher_android::{Interface, InterfaceMap, IpRecord};
use proptest::prelude::*;
use std::net::{IpAddr, Ipv4Addr};

fn arb_record() -> impl Strategy<Value = IpRecord> {
    (any::<u32>(), 0u8..=32).prop_map(|(ip, len)| IpRecord::new(IpAddr::V4(Ipv4Addr::from(ip)), len))
}

fn arb_map() -> impl Strategy<Value = InterfaceMap> {
    prop::collection::hash_map(
        1u32..16,
        (prop::collection::vec(arb_record(), 0..4), prop::bool::ANY),
        0..6,
    )
    .prop_map(|entries| {
        entries
            .into_iter()
            .map(|(index, (ips, wired))| {
                let hw_addr = if wired { "02:00:00:00:00:01" } else { "" };
                (
                    index,
                    Interface {
                        index,
                        name: format!("if{}", index),
                        hw_addr: hw_addr.to_string(),
                        ips,
                    },
                )
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn self_diff_is_empty(map in arb_map()) {
        prop_assert!(diff(&map, &map).is_empty());
    }

    #[test]
    fn diff_from_empty_adds_everything(map in arb_map()) {
        let result = diff(&InterfaceMap::new(), &map);
        let mut keys: Vec<u32> = map.keys().copied().collect();
        keys.sort_unstable();
        prop_assert_eq!(result.added, keys);
        prop_assert!(result.removed.is_empty());
        prop_assert!(result.modified.is_empty());
    }

    #[test]
    fn added_and_removed_are_disjoint(prev in arb_map(), curr in arb_map()) {
        let result = diff(&prev, &curr);
        for index in &result.added {
            prop_assert!(!prev.contains_key(index) && curr.contains_key(index));
        }
        for index in &result.removed {
            prop_assert!(prev.contains_key(index) && !curr.contains_key(index));
        }
        for index in result.modified.keys() {
            prop_assert!(prev.contains_key(index) && curr.contains_key(index));
            prop_assert_ne!(&prev[index], &curr[index]);
        }
    }
}
