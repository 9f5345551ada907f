//! Dispatch scheduling tests
//!
//! Uses a counting handler to observe concurrency, ordering, timeouts and
//! fault containment independent of any programming logic.

use ncagent_core::{ReconciliationEngine, ReturnCode, SchedulerConfig};
use ncagent_test::fixtures::{dhcp_fixtures, mac, port_fixtures, router_fixtures, subnet_fixtures, vpc_fixtures};
use ncagent_test::{CountingHandler, GoalStateBuilder, ReplyVerifier};
use ncagent_types::{GoalStateOperationReply, OperationStatus, OperationType, ResourceType};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

fn ports(count: usize) -> GoalStateBuilder {
    (0..count).fold(GoalStateBuilder::new(), |builder, i| {
        builder.port(
            OperationType::Create,
            port_fixtures::port(&format!("p{}", i), "s1", "10.0.0.5", &mac((i % 250) as u8)),
        )
    })
}

/// Test concurrency ceiling
///
/// With ten times more ports than the ceiling, every port is handled once
/// and no more than `ceiling` calls ever run together.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_never_exceeds_ceiling() {
    let ceiling = 8;
    let handler = Arc::new(CountingHandler::new().with_delay(Duration::from_millis(5)));
    let engine = ReconciliationEngine::new(
        Arc::clone(&handler),
        SchedulerConfig::default().with_concurrency_ceiling(ceiling),
    );
    let batch = ports(ceiling * 10).build_shared();

    let mut reply = GoalStateOperationReply::new();
    let code = engine.update_goal_state(batch, &mut reply).await;

    assert_eq!(code, ReturnCode::SUCCESS);
    assert_eq!(reply.len(), ceiling * 10);
    assert_eq!(handler.total_calls(), ceiling * 10);
    assert!(
        handler.peak_concurrency() <= ceiling,
        "peak concurrency {} exceeded ceiling {}",
        handler.peak_concurrency(),
        ceiling
    );
    assert!(handler.peak_concurrency() > 1);
    for i in 0..ceiling * 10 {
        assert_eq!(handler.calls_for(&format!("p{}", i)), 1);
    }

    let stats = engine.last_stats();
    assert_eq!(stats.resources, ceiling * 10);
    assert_eq!(stats.failed, 0);
}

#[tokio::test]
async fn test_kinds_run_in_fixed_order() {
    let handler = Arc::new(CountingHandler::new());
    let engine = ReconciliationEngine::new(Arc::clone(&handler), SchedulerConfig::default());
    // Added in an order unlike the dispatch order.
    let batch = GoalStateBuilder::new()
        .dhcp(OperationType::Create, dhcp_fixtures::dhcp("d1", &mac(1), "10.0.0.5"))
        .port(OperationType::Create, port_fixtures::port("p1", "s1", "10.0.0.5", &mac(1)))
        .router(OperationType::Create, router_fixtures::router("r1", &mac(2), &["s1"]))
        .subnet(OperationType::Info, subnet_fixtures::subnet("s1", "v1", "10.0.0.0/24", 20))
        .vpc(OperationType::Info, vpc_fixtures::vpc("v1", 20))
        .build_shared();

    let mut reply = GoalStateOperationReply::new();
    engine.update_goal_state(batch, &mut reply).await;

    assert_eq!(
        handler.kind_order(),
        vec![
            ResourceType::Vpc,
            ResourceType::Subnet,
            ResourceType::Router,
            ResourceType::Port,
            ResourceType::Dhcp,
        ]
    );
    let kinds: Vec<_> = engine
        .last_stats()
        .kinds
        .iter()
        .filter(|k| k.dispatched > 0)
        .map(|k| k.kind)
        .collect();
    assert_eq!(kinds, handler.kind_order());
}

#[tokio::test]
async fn test_last_failure_in_dispatch_order_wins() {
    let handler = Arc::new(
        CountingHandler::new()
            .with_code("p1", ReturnCode::INVALID_ARGUMENT)
            .with_code("p3", ReturnCode::FAILURE)
            .with_code("d0", ReturnCode::INVALID_ARGUMENT),
    );
    let engine = ReconciliationEngine::new(Arc::clone(&handler), SchedulerConfig::default());
    let builder = ports(5);

    let mut reply = GoalStateOperationReply::new();
    let code = engine.update_goal_state(builder.clone().build_shared(), &mut reply).await;
    assert_eq!(code, ReturnCode::FAILURE);
    assert_eq!(reply.count_status(OperationStatus::InvalidArg), 1);
    assert_eq!(reply.count_status(OperationStatus::Failure), 1);

    // A later kind's failure replaces the port result.
    let batch = builder
        .dhcp(OperationType::Create, dhcp_fixtures::dhcp("d0", &mac(1), "10.0.0.5"))
        .build_shared();
    let mut reply = GoalStateOperationReply::new();
    let code = engine.update_goal_state(batch, &mut reply).await;
    assert_eq!(code, ReturnCode::INVALID_ARGUMENT);
}

#[tokio::test]
async fn test_timed_out_handler_is_recorded_once() {
    let handler = Arc::new(CountingHandler::new().hanging_on("p1"));
    let engine = ReconciliationEngine::new(
        Arc::clone(&handler),
        SchedulerConfig::default().with_handler_timeout(Some(Duration::from_millis(50))),
    );

    let mut reply = GoalStateOperationReply::new();
    let code = engine.update_goal_state(ports(3).build_shared(), &mut reply).await;

    assert_eq!(code, ReturnCode::TIMED_OUT);
    let verifier = ReplyVerifier::new(&reply);
    verifier.assert_total(3).unwrap();
    verifier
        .assert_record("p1", ResourceType::Port, OperationType::Create, OperationStatus::Failure)
        .unwrap();
    verifier.assert_status("p0", OperationStatus::Success).unwrap();
    verifier.assert_status("p2", OperationStatus::Success).unwrap();
    assert_eq!(handler.in_flight(), 0);
}

#[tokio::test]
async fn test_panicking_handler_is_contained() {
    let handler = Arc::new(CountingHandler::new().panicking_on("p0"));
    let engine = ReconciliationEngine::new(Arc::clone(&handler), SchedulerConfig::default());

    let mut reply = GoalStateOperationReply::new();
    let code = engine.update_goal_state(ports(4).build_shared(), &mut reply).await;

    assert_eq!(code, ReturnCode::FAULT);
    let verifier = ReplyVerifier::new(&reply);
    verifier.assert_total(4).unwrap();
    verifier.assert_status("p0", OperationStatus::Failure).unwrap();
    for id in ["p1", "p2", "p3"] {
        verifier.assert_status(id, OperationStatus::Success).unwrap();
    }
    assert_eq!(handler.in_flight(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_each_resource_recorded_exactly_once_across_sub_batches() {
    let handler = Arc::new(
        CountingHandler::new()
            .with_delay(Duration::from_millis(1))
            .with_code("p7", ReturnCode::FAILURE)
            .panicking_on("p13"),
    );
    let engine = ReconciliationEngine::new(
        Arc::clone(&handler),
        SchedulerConfig::default().with_concurrency_ceiling(4),
    );

    let mut reply = GoalStateOperationReply::new();
    engine.update_goal_state(ports(30).build_shared(), &mut reply).await;

    let verifier = ReplyVerifier::new(&reply);
    verifier.assert_total(30).unwrap();
    for i in 0..30 {
        let id = format!("p{}", i);
        verifier.single_record(&id).unwrap();
        assert_eq!(handler.calls_for(&id), 1);
    }
    assert_eq!(reply.count_status(OperationStatus::Failure), 2);
    assert_eq!(engine.last_stats().failed, 2);
}

#[tokio::test]
async fn test_empty_batch_records_nothing() {
    let handler = Arc::new(CountingHandler::new());
    let engine = ReconciliationEngine::new(Arc::clone(&handler), SchedulerConfig::default());

    let mut reply = GoalStateOperationReply::new();
    let code = engine
        .update_goal_state(GoalStateBuilder::new().build_shared(), &mut reply)
        .await;

    assert_eq!(code, ReturnCode::SUCCESS);
    assert!(reply.is_empty());
    assert_eq!(handler.total_calls(), 0);
}
