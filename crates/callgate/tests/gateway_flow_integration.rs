#![forbid(unsafe_code)]
//! End-to-end flows against the in-memory collaborators: setup-time
//! configuration, admission, batching, and scenario validation working
//! together on one gateway.

use callgate::{
    AuditKind, BatchOptions, CallDescriptor, CallHooks, CallerId, FixedClock, FunctionSelector,
    Gateway, GatewayConfig, GatewayError, InMemoryInvoker, InvokeOutcome, StaticRoleStore,
    TargetAddress, ROLE_TRUSTED_CALLER,
};

fn admin() -> CallerId {
    CallerId::new("admin")
}

fn vault_backend() -> InMemoryInvoker {
    let mut invoker = InMemoryInvoker::new();
    invoker.bind(
        FunctionSelector::new("deposit"),
        Box::new(|state, args| {
            let balance = state.entry("balance".to_string()).or_insert(0);
            *balance += args.first().copied().unwrap_or(0);
            InvokeOutcome::success(vec![*balance], 3_000)
        }),
    );
    invoker.bind(
        FunctionSelector::new("get_balance"),
        Box::new(|state, _| {
            InvokeOutcome::success(vec![state.get("balance").copied().unwrap_or(0)], 900)
        }),
    );
    invoker
}

/// The documented admission example: register "Vault", approve U, issue ten
/// calls at unit T, watch the eleventh fail, and the first call at T+1
/// succeed again.
#[test]
fn worked_rate_limit_example() {
    let clock = FixedClock::new(100);
    let mut gw = Gateway::new(
        GatewayConfig::default(),
        vault_backend(),
        StaticRoleStore::new(),
        clock.clone(),
    );

    gw.register(&admin(), "Vault", TargetAddress::from_low_u64(0xA))
        .expect("register");
    let u = CallerId::new("U");
    gw.approve(&admin(), "Vault", &u).expect("approve");

    let descriptor = CallDescriptor::new("Vault", "deposit", vec![1]);
    for i in 0..10 {
        gw.call(&descriptor, &u)
            .unwrap_or_else(|e| panic!("call {i} at unit T should pass: {e}"));
    }

    let err = gw.call(&descriptor, &u).expect_err("11th call at unit T");
    assert!(matches!(err, GatewayError::RateLimitExceeded { .. }));
    assert_eq!(err.code(), "CG-GW-0003");

    clock.advance(1);
    let payload = gw.call(&descriptor, &u).expect("first call at T+1");
    assert_eq!(payload, vec![11], "ten deposits landed plus this one");
}

#[test]
fn trusted_caller_rides_past_both_tiers() {
    let mut roles = StaticRoleStore::new();
    let ops = CallerId::new("ops");
    roles.grant(ops.clone(), ROLE_TRUSTED_CALLER);

    let mut gw = Gateway::new(
        GatewayConfig {
            per_caller_limit: 2,
            initial_global_limit: 2,
            ..GatewayConfig::default()
        },
        vault_backend(),
        roles,
        FixedClock::new(1),
    );
    gw.register(&admin(), "Vault", TargetAddress::from_low_u64(0xA))
        .expect("register");
    gw.approve(&admin(), "Vault", &ops).expect("approve");

    let descriptor = CallDescriptor::new("Vault", "deposit", vec![1]);
    for _ in 0..40 {
        gw.call(&descriptor, &ops).expect("trusted caller");
    }
    assert_eq!(gw.audit_events().iter().filter(|e| e.kind == AuditKind::RateLimitBypass).count(), 40);
}

#[test]
fn setup_then_traffic_then_revocation() {
    let mut gw = Gateway::new(
        GatewayConfig::default(),
        vault_backend(),
        StaticRoleStore::new(),
        FixedClock::new(1),
    );

    // Setup-time configuration through the public registry surface.
    gw.register(&admin(), "Vault", TargetAddress::from_low_u64(0xA))
        .expect("register");
    let u = CallerId::new("u1");
    gw.approve(&admin(), "Vault", &u).expect("approve");

    let deposit = CallDescriptor::new("Vault", "deposit", vec![50]);
    assert_eq!(gw.call(&deposit, &u).expect("approved"), vec![50]);

    gw.revoke(&admin(), "Vault", &u).expect("revoke");
    let err = gw.call(&deposit, &u).expect_err("revoked");
    assert!(matches!(err, GatewayError::Authorization { .. }));
}

#[test]
fn batch_caches_across_a_mixed_sequence() {
    let clock = FixedClock::new(1);
    let mut gw = Gateway::new(
        GatewayConfig::default(),
        vault_backend(),
        StaticRoleStore::new(),
        clock,
    );
    gw.register(&admin(), "Vault", TargetAddress::from_low_u64(0xA))
        .expect("register");
    let u = CallerId::new("u1");
    gw.approve(&admin(), "Vault", &u).expect("approve");

    let calls = vec![
        CallDescriptor::new("Vault", "deposit", vec![10]),
        CallDescriptor::new("Vault", "get_balance", vec![]),
        CallDescriptor::new("Vault", "get_balance", vec![]),
    ];
    let results = gw
        .run_batch(&calls, &u, BatchOptions::default())
        .expect("batch");

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.success));
    assert!(results[2].served_from_cache);
    assert_eq!(results[1].payload, results[2].payload);
    assert_eq!(
        gw.backend()
            .invocation_count(&FunctionSelector::new("get_balance")),
        1,
        "shared shape invokes the target at most once"
    );
}

#[test]
fn scenario_validates_a_sequence_without_committing_it() {
    let mut gw = Gateway::new(
        GatewayConfig::default(),
        vault_backend(),
        StaticRoleStore::new(),
        FixedClock::new(1),
    );
    gw.register(&admin(), "Vault", TargetAddress::from_low_u64(0xA))
        .expect("register");
    let u = CallerId::new("u1");
    gw.approve(&admin(), "Vault", &u).expect("approve");
    gw.set_target_state("Vault", "balance", 500).expect("seed");

    let entry_state = gw.snapshot_target("Vault").expect("snapshot");

    let mut costs: Vec<u64> = Vec::new();
    let mut post = |payload: &[u64]| {
        costs.push(payload.first().copied().unwrap_or(0));
    };
    let mut hooks = CallHooks::with_post(&mut post);

    let steps = vec![
        CallDescriptor::new("Vault", "deposit", vec![100]),
        CallDescriptor::new("Vault", "get_balance", vec![]),
    ];
    let result = gw.run_scenario(&steps, &u, &mut hooks);
    drop(hooks);

    assert!(result.success);
    assert_eq!(result.reports[1].result.payload, vec![600]);
    assert_eq!(costs, vec![600, 600], "post hook saw each step's payload");

    // Entry state restored bit for bit.
    assert_eq!(gw.snapshot_target("Vault").expect("snapshot"), entry_state);

    // And a follow-up real call starts from the untouched balance.
    let payload = gw
        .call(&CallDescriptor::new("Vault", "get_balance", vec![]), &u)
        .expect("real call");
    assert_eq!(payload, vec![500]);
}

#[test]
fn audit_stream_tells_the_whole_story_in_order() {
    let mut gw = Gateway::new(
        GatewayConfig::default(),
        vault_backend(),
        StaticRoleStore::new(),
        FixedClock::new(1),
    );
    gw.register(&admin(), "Vault", TargetAddress::from_low_u64(0xA))
        .expect("register");
    let u = CallerId::new("u1");
    gw.approve(&admin(), "Vault", &u).expect("approve");
    gw.call(&CallDescriptor::new("Vault", "deposit", vec![1]), &u)
        .expect("call");
    gw.set_global_limit(&admin(), 250).expect("adjust");

    let kinds: Vec<AuditKind> = gw.audit_events().iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            AuditKind::TargetRegistered,
            AuditKind::CallerApproved,
            AuditKind::CallCompleted,
            AuditKind::RateLimitAdjusted,
        ]
    );
    let seqs: Vec<u64> = gw.audit_events().iter().map(|e| e.seq).collect();
    assert_eq!(seqs, vec![0, 1, 2, 3]);
}
