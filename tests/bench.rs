use schedbench::{Scenario, Simulator, Workload};

mod common;

/// End-to-end: the small workload must land on the exact expected
/// counters. Any drift means the dispatch core is not faithful.
#[test]
fn test_small_workload_counters() {
    common::setup_test();
    let result = Simulator::new(Scenario::benchmark(Workload::Small)).run();

    assert_eq!(result.queued_packets, 23_246, "queued-packet count drifted");
    assert_eq!(result.holds, 9_297, "hold count drifted");
    result.verify(Workload::Small).unwrap();
}

/// End-to-end: the 100x workload, with its own pair of constants.
#[test]
fn test_large_workload_counters() {
    common::setup_test();
    let result = Simulator::new(Scenario::benchmark(Workload::Large)).run();

    assert_eq!(result.queued_packets, 2_326_410);
    assert_eq!(result.holds, 930_563);
    result.verify(Workload::Large).unwrap();
}

/// Determinism: two identical runs produce identical counters and an
/// identical full trace-character sequence.
#[test]
fn test_determinism() {
    common::setup_test();
    let run = || {
        Simulator::new(Scenario::benchmark(Workload::Small))
            .with_trace()
            .run()
    };

    let first = run();
    let second = run();

    assert_eq!(first.queued_packets, second.queued_packets);
    assert_eq!(first.holds, second.holds);

    let t1 = first.trace.expect("trace was requested");
    let t2 = second.trace.expect("trace was requested");
    assert!(!t1.is_empty(), "traced run recorded nothing");
    assert_eq!(t1.chars(), t2.chars(), "trace sequences diverged");
}

/// The trace alphabet is closed: dispatcher digits for the six tasks,
/// plus device data characters drawn from the work buffers.
#[test]
fn test_trace_alphabet() {
    common::setup_test();
    let result = Simulator::new(Scenario::benchmark(Workload::Small))
        .with_trace()
        .run();

    let trace = result.trace.unwrap();
    assert!(trace
        .chars()
        .chars()
        .all(|c| ('1'..='6').contains(&c) || c.is_ascii_uppercase()));
}

/// Tracing is opt-in and never affects the counters.
#[test]
fn test_trace_does_not_affect_counters() {
    common::setup_test();
    let plain = Simulator::new(Scenario::benchmark(Workload::Small)).run();
    let traced = Simulator::new(Scenario::benchmark(Workload::Small))
        .with_trace()
        .run();

    assert!(plain.trace.is_none());
    assert_eq!(plain.queued_packets, traced.queued_packets);
    assert_eq!(plain.holds, traced.holds);
}

/// Verifying against the wrong workload's constants is a hard error.
#[test]
fn test_verify_rejects_mismatched_workload() {
    common::setup_test();
    let result = Simulator::new(Scenario::benchmark(Workload::Small)).run();

    let err = result.verify(Workload::Large).unwrap_err();
    assert!(err.to_string().contains("results incorrect"));
}
