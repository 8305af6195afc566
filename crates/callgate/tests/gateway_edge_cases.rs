#![forbid(unsafe_code)]
//! Cross-module edge cases not covered by the inline tests, including:
//! - adaptive global ceiling lowered below the live count mid-unit
//! - trusted-role bypass combined with a missing approval
//! - cached payloads served to a revoked caller until an admin purge
//! - stale cache entries surviving target-state changes (write-once, no
//!   invalidation) and the purge recovery path
//! - batch admission accounting against the per-caller limit
//! - argument-length sensitivity of cache keys end to end
//! - empty payloads retained but never served from the cache
//! - a custom admin identity gating every mutating surface

use callgate::{
    AuditKind, BatchOptions, CallDescriptor, CallerId, FixedClock, FunctionSelector, Gateway,
    GatewayConfig, GatewayError, InMemoryInvoker, InvokeOutcome, StaticRoleStore, TargetAddress,
    ROLE_TRUSTED_CALLER,
};

fn admin() -> CallerId {
    CallerId::new("admin")
}

fn user() -> CallerId {
    CallerId::new("u1")
}

/// Backend with a read-only balance getter and an argument echo.
fn echo_backend() -> InMemoryInvoker {
    let mut invoker = InMemoryInvoker::new();
    invoker.bind(
        FunctionSelector::new("get_balance"),
        Box::new(|state, _| {
            InvokeOutcome::success(vec![state.get("balance").copied().unwrap_or(0)], 700)
        }),
    );
    invoker.bind(
        FunctionSelector::new("echo"),
        Box::new(|_, args| InvokeOutcome::success(args.to_vec(), 50)),
    );
    invoker
}

fn vault_gateway(config: GatewayConfig, clock: FixedClock) -> Gateway<InMemoryInvoker> {
    let mut roles = StaticRoleStore::new();
    roles.grant(CallerId::new("ops"), ROLE_TRUSTED_CALLER);
    let admin = config.admin.clone();
    let mut gw = Gateway::new(config, echo_backend(), roles, clock);
    gw.register(&admin, "Vault", TargetAddress::from_low_u64(0xA))
        .expect("register");
    gw.approve(&admin, "Vault", &user()).expect("approve");
    gw
}

fn get_balance() -> CallDescriptor {
    CallDescriptor::new("Vault", "get_balance", vec![])
}

fn echo(args: Vec<u64>) -> CallDescriptor {
    CallDescriptor::new("Vault", "echo", args)
}

#[test]
fn lowering_the_ceiling_mid_unit_denies_immediately() {
    let clock = FixedClock::new(1);
    let mut gw = vault_gateway(GatewayConfig::default(), clock.clone());
    let ops = CallerId::new("ops");
    gw.approve(&admin(), "Vault", &ops).expect("approve");

    for _ in 0..3 {
        gw.call(&get_balance(), &user()).expect("under both limits");
    }

    // Three admissions are already on the global bucket; a ceiling of three
    // leaves no headroom for the rest of this unit.
    gw.set_global_limit(&admin(), 3).expect("adjust");
    let err = gw.call(&get_balance(), &user()).expect_err("ceiling reached");
    assert!(matches!(err, GatewayError::RateLimitExceeded { .. }));

    let hit = gw
        .audit_events()
        .iter()
        .rev()
        .find(|e| e.kind == AuditKind::RateLimitHit)
        .expect("hit event");
    assert_eq!(hit.fields["scope"], "global");
    assert_eq!(hit.fields["unit"], "1");

    // The trusted caller is unaffected, and the next unit starts fresh.
    gw.call(&get_balance(), &ops).expect("trusted bypass");
    clock.advance(1);
    gw.call(&get_balance(), &user()).expect("fresh unit");
}

#[test]
fn trusted_role_bypasses_rate_limits_but_not_approval() {
    let mut gw = vault_gateway(GatewayConfig::default(), FixedClock::new(1));
    let ops = CallerId::new("ops");

    // ops holds the trusted role but was never approved for the target.
    let err = gw.call(&get_balance(), &ops).expect_err("unapproved");
    assert!(matches!(err, GatewayError::Authorization { .. }));

    // The gate did admit: the bypass event precedes the approval denial.
    assert_eq!(
        gw.audit_events()
            .iter()
            .filter(|e| e.kind == AuditKind::RateLimitBypass)
            .count(),
        1
    );
}

#[test]
fn cache_serves_a_revoked_caller_until_the_admin_purges() {
    let mut gw = vault_gateway(GatewayConfig::default(), FixedClock::new(1));

    let results = gw
        .run_batch(&[get_balance()], &user(), BatchOptions::default())
        .expect("first batch");
    assert!(results[0].success && !results[0].served_from_cache);

    gw.revoke(&admin(), "Vault", &user()).expect("revoke");

    // The cached payload short-circuits before the approval check runs.
    let results = gw
        .run_batch(&[get_balance()], &user(), BatchOptions::default())
        .expect("second batch");
    assert!(results[0].served_from_cache);

    // An admin purge is the recovery path: the next attempt hits the
    // approval check again.
    assert_eq!(gw.purge_target(&admin(), "Vault").expect("purge"), 1);
    let results = gw
        .run_batch(&[get_balance()], &user(), BatchOptions::default())
        .expect("third batch");
    assert!(!results[0].success);
    assert!(results[0].error.as_deref().unwrap().starts_with("CG-GW-0002"));
    assert_eq!(
        gw.backend()
            .invocation_count(&FunctionSelector::new("get_balance")),
        1,
        "only the first batch reached the target"
    );
}

#[test]
fn stale_cache_outlives_state_changes_until_purged() {
    let mut gw = vault_gateway(GatewayConfig::default(), FixedClock::new(1));
    gw.set_target_state("Vault", "balance", 7).expect("seed");

    let results = gw
        .run_batch(&[get_balance()], &user(), BatchOptions::default())
        .expect("batch");
    assert_eq!(results[0].payload, vec![7]);

    // Entries are write-once with no invalidation: a later state change is
    // invisible through the cache.
    gw.set_target_state("Vault", "balance", 99).expect("update");
    let results = gw
        .run_batch(&[get_balance()], &user(), BatchOptions::default())
        .expect("batch");
    assert!(results[0].served_from_cache);
    assert_eq!(results[0].payload, vec![7], "stale payload served verbatim");

    gw.purge_target(&admin(), "Vault").expect("purge");
    let results = gw
        .run_batch(&[get_balance()], &user(), BatchOptions::default())
        .expect("batch");
    assert!(!results[0].served_from_cache);
    assert_eq!(results[0].payload, vec![99]);
}

#[test]
fn each_batch_costs_one_admission_regardless_of_size() {
    let mut gw = vault_gateway(
        GatewayConfig {
            per_caller_limit: 2,
            ..GatewayConfig::default()
        },
        FixedClock::new(1),
    );

    let five_steps: Vec<CallDescriptor> = (0..5).map(|_| get_balance()).collect();
    for _ in 0..2 {
        let results = gw
            .run_batch(&five_steps, &user(), BatchOptions::uncached())
            .expect("batch within admission budget");
        assert_eq!(results.len(), 5);
    }

    let err = gw
        .run_batch(&five_steps, &user(), BatchOptions::uncached())
        .expect_err("third admission");
    assert!(matches!(err, GatewayError::RateLimitExceeded { .. }));
}

#[test]
fn argument_length_separates_cache_keys_end_to_end() {
    let mut gw = vault_gateway(GatewayConfig::default(), FixedClock::new(1));

    // [5] and [5, 0] trim to the same wire body but must not share a key.
    let results = gw
        .run_batch(
            &[echo(vec![5]), echo(vec![5, 0]), echo(vec![5])],
            &user(),
            BatchOptions::default(),
        )
        .expect("batch");

    assert_eq!(results[0].payload, vec![5]);
    assert_eq!(results[1].payload, vec![5, 0]);
    assert!(!results[1].served_from_cache, "padded variant is a distinct key");
    assert!(results[2].served_from_cache);
    assert_eq!(
        gw.backend().invocation_count(&FunctionSelector::new("echo")),
        2
    );
}

#[test]
fn empty_payloads_are_never_served_from_the_cache() {
    let mut gw = vault_gateway(GatewayConfig::default(), FixedClock::new(1));

    // echo([]) succeeds with an empty payload; the entry is retained but a
    // later identical step invokes the target again.
    let results = gw
        .run_batch(&[echo(vec![]), echo(vec![])], &user(), BatchOptions::default())
        .expect("batch");
    assert!(results.iter().all(|r| r.success));
    assert!(results.iter().all(|r| !r.served_from_cache));
    assert_eq!(
        gw.backend().invocation_count(&FunctionSelector::new("echo")),
        2
    );
}

#[test]
fn custom_admin_identity_gates_every_mutating_surface() {
    let root = CallerId::new("root");
    let mut gw = Gateway::new(
        GatewayConfig {
            admin: root.clone(),
            ..GatewayConfig::default()
        },
        echo_backend(),
        StaticRoleStore::new(),
        FixedClock::new(1),
    );

    // The conventional name holds no power under a custom admin.
    let pretender = CallerId::new("admin");
    assert!(matches!(
        gw.register(&pretender, "Vault", TargetAddress::from_low_u64(1)),
        Err(GatewayError::Authorization { .. })
    ));
    assert!(matches!(
        gw.set_global_limit(&pretender, 50),
        Err(GatewayError::Authorization { .. })
    ));
    assert!(matches!(
        gw.purge_target(&pretender, "Vault"),
        Err(GatewayError::Authorization { .. })
    ));

    gw.register(&root, "Vault", TargetAddress::from_low_u64(1))
        .expect("register");
    gw.approve(&root, "Vault", &user()).expect("approve");
    gw.set_global_limit(&root, 50).expect("adjust");
    assert_eq!(gw.global_limit(), 50);
}
