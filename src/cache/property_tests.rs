//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check entry registration, the record round-trip and
//! section splicing over generated inputs.

use proptest::prelude::*;

use crate::cache::testing::TestCollaborators;
use crate::cache::{wrap_section, HookArg, HookArgs, PageCacheEntry, TokenProtection};

// == Strategies ==
/// Generates scalar hook arguments
fn scalar_arg_strategy() -> impl Strategy<Value = HookArg> {
    prop_oneof![
        Just(HookArg::Null),
        any::<bool>().prop_map(HookArg::Bool),
        (i64::MAX as u64 + 1..=u64::MAX).prop_map(HookArg::UInt),
        any::<i64>().prop_map(HookArg::Int),
        // quarters print and parse back exactly
        (-1_000_000i32..1_000_000).prop_map(|n| HookArg::Float(f64::from(n) / 4.0)),
        "[a-zA-Z0-9 $<>\"'-]{0,24}".prop_map(HookArg::Str),
    ]
}

/// Generates hook argument maps with scalar values only
fn scalar_args_strategy() -> impl Strategy<Value = HookArgs> {
    prop::collection::vec(("[a-z_]{1,10}", scalar_arg_strategy()), 0..5)
        .prop_map(|pairs| pairs.into_iter().collect())
}

/// Generates a registration: module id, hook name, arguments
fn hook_strategy() -> impl Strategy<Value = (u64, String, HookArgs)> {
    (1..500u64, "display[A-Z][a-zA-Z]{2,12}", scalar_args_strategy())
}

/// Generates static page text that contains no markers
fn static_html_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 <>/=\"\n]{0,64}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Entries whose parameters are all scalars survive serialize + load
    // with identical content and hooks.
    #[test]
    fn prop_roundtrip_constant_entries(
        hooks in prop::collection::vec(hook_strategy(), 0..6),
        content in "(?s).{0,200}"
    ) {
        let mut entry = PageCacheEntry::new();
        for (i, (module_id, hook_name, params)) in hooks.iter().enumerate() {
            entry.register(*module_id, i as u64, hook_name, params);
        }
        entry.set_content(content);
        prop_assert!(entry.is_valid());

        let loaded = PageCacheEntry::from_serialized(Some(&entry.serialize().unwrap()));

        prop_assert!(loaded.exists());
        prop_assert!(loaded.is_valid());
        prop_assert_eq!(loaded.content(), entry.content());
        prop_assert_eq!(loaded.hooks(), entry.hooks());
    }

    // Successive registrations on a fresh entry get hook:1, hook:2, ...
    #[test]
    fn prop_section_ids_are_sequential(count in 1..40usize) {
        let mut entry = PageCacheEntry::new();
        for i in 1..=count {
            let id = entry.register(1, i as u64, "displayNav", &HookArgs::new());
            prop_assert_eq!(id, format!("hook:{}", i));
        }
    }

    // One undescribable parameter anywhere invalidates the whole entry.
    #[test]
    fn prop_invalidity_propagates(
        hooks in prop::collection::vec(hook_strategy(), 1..6),
        bad_hook in any::<prop::sample::Index>()
    ) {
        let bad = bad_hook.index(hooks.len());
        let mut entry = PageCacheEntry::new();
        for (i, (module_id, hook_name, params)) in hooks.iter().enumerate() {
            let mut params = params.clone();
            if i == bad {
                params.insert(
                    "resource".to_string(),
                    HookArg::Opaque { type_name: "stream".to_string() },
                );
            }
            entry.register(*module_id, i as u64, hook_name, &params);
        }

        prop_assert!(!entry.is_valid());
        prop_assert_eq!(entry.hooks().len(), hooks.len());
    }

    // The rendered fragment replaces the whole marked block verbatim.
    #[test]
    fn prop_splice_is_literal(
        before in static_html_strategy(),
        stale in static_html_strategy(),
        after in static_html_strategy(),
        fragment in "[a-zA-Z0-9 $\\\\{}<>]{0,40}"
    ) {
        let fakes = TestCollaborators::new(1).with_fragment("displayWidget", &fragment);
        let mut entry = PageCacheEntry::new();
        let id = entry.register(1, 1, "displayWidget", &HookArgs::new());
        let frozen = format!("{}{}{}", before, wrap_section(&id, &stale), after);
        entry.set_content(frozen.clone());

        let fresh = entry
            .get_fresh_content(&fakes.reconstruction(), &fakes.executor, TokenProtection::Disabled)
            .unwrap();

        prop_assert_eq!(fresh, format!("{}{}{}", before, fragment, after));
        prop_assert_eq!(entry.content(), frozen.as_str());
    }
}
