//! Property tests: `at_least` behaves as a total order over semver.

use proptest::prelude::*;
use theseus_gate::{ToolVersion, at_least, check_client_server_pair, parse_version};

fn arb_prerelease() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        3 => Just(None),
        1 => prop::sample::select(vec!["alpha", "alpha.1", "beta", "beta.2", "rc.1", "rc.10", "1", "gke.1"])
            .prop_map(|s| Some(s.to_string())),
    ]
}

fn arb_version() -> impl Strategy<Value = ToolVersion> {
    (0u64..4, 0u64..12, 0u64..12, arb_prerelease()).prop_map(|(major, minor, patch, pre)| {
        let text = match pre {
            Some(pre) => format!("{major}.{minor}.{patch}-{pre}"),
            None => format!("{major}.{minor}.{patch}"),
        };
        parse_version(&text).unwrap()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn reflexive(a in arb_version()) {
        prop_assert!(at_least(&a, &a));
    }

    #[test]
    fn antisymmetric(a in arb_version(), b in arb_version()) {
        if at_least(&a, &b) && at_least(&b, &a) {
            prop_assert_eq!(&a, &b);
        }
        if a != b {
            prop_assert!(at_least(&a, &b) != at_least(&b, &a), "strict inequality must decide one way");
        }
    }

    #[test]
    fn transitive(a in arb_version(), b in arb_version(), c in arb_version()) {
        if at_least(&a, &b) && at_least(&b, &c) {
            prop_assert!(at_least(&a, &c));
        }
    }

    #[test]
    fn total(a in arb_version(), b in arb_version()) {
        prop_assert!(at_least(&a, &b) || at_least(&b, &a));
    }

    #[test]
    fn release_beats_its_prerelease(major in 0u64..4, minor in 0u64..12, patch in 0u64..12) {
        let release = parse_version(&format!("{major}.{minor}.{patch}")).unwrap();
        let pre = parse_version(&format!("{major}.{minor}.{patch}-rc.1")).unwrap();
        prop_assert!(at_least(&release, &pre));
        prop_assert!(!at_least(&pre, &release));
    }

    #[test]
    fn pair_is_conjunction(c in arb_version(), s in arb_version(), r in arb_version()) {
        prop_assert_eq!(
            check_client_server_pair(&c, &s, &r),
            at_least(&c, &r) && at_least(&s, &r)
        );
    }
}

#[test]
fn boundary_examples() {
    let v = |s: &str| parse_version(s).unwrap();
    assert!(check_client_server_pair(&v("1.7.4"), &v("1.8.1"), &v("1.7.0")));
    assert!(!check_client_server_pair(&v("1.6.0"), &v("1.7.0"), &v("1.7.0")));
    assert!(at_least(&v("0.2.4"), &v("0.2.4")));
}
