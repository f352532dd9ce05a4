use crate::{
    apply_overrides, encode, find_matches, DeviceIdentity, FieldOverride, PciAddress, QuirkError,
    QuirkMatch, QuirkRule, QuirkSink, Result, WILDCARD_ID,
};
use proptest::prelude::*;

fn address_strategy() -> impl Strategy<Value = PciAddress> {
    (
        any::<u16>(),
        any::<u8>(),
        0u8..=PciAddress::MAX_DEVICE,
        0u8..=PciAddress::MAX_FUNCTION,
    )
        .prop_map(|(domain, bus, device, function)| {
            PciAddress::new(domain, bus, device, function).unwrap()
        })
}

fn identity(address: PciAddress, ids: [u16; 4]) -> DeviceIdentity {
    DeviceIdentity {
        address,
        vendor_id: ids[0],
        device_id: ids[1],
        subsystem_vendor_id: ids[2],
        subsystem_device_id: ids[3],
    }
}

/// A pattern for `value`: the wildcard, the value itself, or some arbitrary ID (which may still
/// collide with `value`).
fn pattern_for(value: u16) -> impl Strategy<Value = u16> {
    prop_oneof![Just(WILDCARD_ID), Just(value), any::<u16>()]
}

fn invalid_size() -> impl Strategy<Value = u8> {
    prop_oneof![Just(0u8), 5u8..=u8::MAX]
}

#[derive(Default)]
struct CountingSink {
    attempts: usize,
}

impl QuirkSink for CountingSink {
    fn write_override(&mut self, _encoded: &str) -> Result<()> {
        self.attempts += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "counter".to_string()
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 512,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_encode_is_fixed_width_and_parses_back(
        address in address_strategy(),
        register in any::<u32>(),
        size in 1u8..=4,
        mask in any::<u32>(),
    ) {
        let field = FieldOverride { register, size, mask };
        let s = encode(&identity(address, [0; 4]), &field).unwrap();

        prop_assert_eq!(s.len(), 32);
        prop_assert!(!s.bytes().any(|b| b.is_ascii_uppercase()), "{}", s);
        for (pos, sep) in [(4, b':'), (7, b':'), (10, b'.'), (12, b'-'), (21, b':'), (23, b':')] {
            prop_assert_eq!(s.as_bytes()[pos], sep, "separator at {} in {}", pos, s);
        }

        let parsed: PciAddress = s[..12].parse().unwrap();
        prop_assert_eq!(parsed.domain(), address.domain());
        prop_assert_eq!(parsed.bus(), address.bus());
        prop_assert_eq!(parsed.device(), address.device());
        prop_assert_eq!(parsed.function(), address.function());
        prop_assert_eq!(u32::from_str_radix(&s[13..21], 16).unwrap(), register);
        prop_assert_eq!(s[22..23].parse::<u8>().unwrap(), size);
        prop_assert_eq!(u32::from_str_radix(&s[24..32], 16).unwrap(), mask);
    }

    #[test]
    fn prop_invalid_size_is_never_written(
        address in address_strategy(),
        register in any::<u32>(),
        size in invalid_size(),
        mask in any::<u32>(),
    ) {
        let device = identity(address, [0; 4]);
        let field = FieldOverride { register, size, mask };

        let err = encode(&device, &field).unwrap_err();
        prop_assert!(matches!(err, QuirkError::InvalidFieldSize(s) if s == size));

        let mut sink = CountingSink::default();
        let report = apply_overrides(&[QuirkMatch { device, field }], &mut sink);
        prop_assert_eq!(sink.attempts, 0);
        prop_assert_eq!(report.applied, 0);
        prop_assert_eq!(report.rejected, 1);
    }

    #[test]
    fn prop_find_matches_is_wildcard_or_equal(
        (values, patterns) in any::<[u16; 4]>().prop_flat_map(|values| {
            let patterns = (
                pattern_for(values[0]),
                pattern_for(values[1]),
                pattern_for(values[2]),
                pattern_for(values[3]),
            );
            (Just(values), patterns)
        }),
        address in address_strategy(),
    ) {
        let patterns = [patterns.0, patterns.1, patterns.2, patterns.3];
        let rule = QuirkRule {
            vendor: patterns[0].into(),
            device: patterns[1].into(),
            subvendor: patterns[2].into(),
            subdevice: patterns[3].into(),
            fields: Vec::new(),
        };
        let expected = patterns
            .iter()
            .zip(values)
            .all(|(&p, v)| p == WILDCARD_ID || p == v);

        prop_assert_eq!(find_matches(&rule, &identity(address, values)), expected);
    }
}
