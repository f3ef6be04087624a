//! Integration tests for the request admission scheduler
//!
//! These tests drive the scheduler the way the browser does: lifecycle
//! events from the UI-authority side, request-level calls from the
//! transport side, and randomized interleavings of both.

use std::collections::HashSet;

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use loadgate::{
    lifecycle_channel, ClientId, Priority, RequestId, ResourceScheduler, SchedulerConfig,
};

fn config(outstanding: Option<usize>, delayable: Option<usize>) -> SchedulerConfig {
    init_logging();
    SchedulerConfig {
        outstanding_request_limit: outstanding,
        max_num_delayable_requests: delayable,
    }
}

/// Route scheduler tracing through the test harness (RUST_LOG=debug)
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A full page load: document, stylesheet, script, then images
#[test]
fn test_page_load_sequence() {
    let mut scheduler = ResourceScheduler::with_config(config(None, Some(2)));
    let tab = ClientId::new(1, 1);

    scheduler.on_client_created(tab);
    scheduler.on_navigate(tab);

    // Render-blocking resources start immediately
    let document = scheduler.schedule_request(tab, false, RequestId(1), Priority::VeryHigh, 0);
    let stylesheet = scheduler.schedule_request(tab, true, RequestId(2), Priority::VeryHigh, 0);
    let script = scheduler.schedule_request(tab, true, RequestId(3), Priority::High, 0);
    assert!(!document.is_deferred());
    assert!(!stylesheet.is_deferred());
    assert!(!script.is_deferred());

    // Images wait for the body
    let hero = scheduler.schedule_request(tab, true, RequestId(4), Priority::Low, 0);
    let thumb_1 = scheduler.schedule_request(tab, true, RequestId(5), Priority::Low, 0);
    let thumb_2 = scheduler.schedule_request(tab, true, RequestId(6), Priority::Low, 0);
    assert!(hero.is_deferred());
    assert!(thumb_1.is_deferred());
    assert!(thumb_2.is_deferred());

    scheduler.on_will_insert_body(tab);
    assert!(!hero.is_deferred());
    assert!(!thumb_1.is_deferred());
    assert!(thumb_2.is_deferred()); // over the delayable cap

    scheduler.on_request_finished(RequestId(4));
    assert!(!thumb_2.is_deferred());

    for id in [1, 2, 3, 5, 6] {
        scheduler.on_request_finished(RequestId(id));
    }
    scheduler.on_loading_state_changed(tab, true);
    assert!(!scheduler.has_loading_clients());

    let stats = scheduler.stats();
    assert_eq!(stats.in_flight, 0);
    assert_eq!(stats.deferred, 0);
}

/// Closing a tab mid-load leaves its fetches running to completion
#[test]
fn test_tab_close_mid_load() {
    let mut scheduler = ResourceScheduler::with_config(config(None, Some(10)));
    let tab = ClientId::new(1, 1);

    scheduler.on_client_created(tab);
    scheduler.on_will_insert_body(tab);
    let page = scheduler.schedule_request(tab, true, RequestId(1), Priority::High, 0);
    let prefetch = scheduler.schedule_request(tab, true, RequestId(2), Priority::Idle, 0);
    assert!(!page.is_deferred());
    assert!(!prefetch.is_deferred());

    scheduler.on_client_deleted(tab);

    assert!(!page.is_deferred());
    assert!(!prefetch.is_deferred());
    assert_eq!(scheduler.stats().unowned, 2);

    scheduler.on_request_finished(RequestId(1));
    scheduler.on_request_finished(RequestId(2));
    assert_eq!(scheduler.stats().unowned, 0);
}

/// Lifecycle signals produced on another task apply in order
#[tokio::test]
async fn test_lifecycle_signals_cross_task() {
    let (proxy, mut rx) = lifecycle_channel();
    let tab = ClientId::new(1, 1);

    let ui_side = tokio::spawn(async move {
        proxy.client_created(tab).unwrap();
        proxy.navigate(tab).unwrap();
        proxy.will_insert_body(tab).unwrap();
    });
    ui_side.await.unwrap();

    let mut scheduler = ResourceScheduler::with_config(config(None, Some(10)));
    scheduler.drain_signals(&mut rx);

    let image = scheduler.schedule_request(tab, true, RequestId(1), Priority::Low, 0);
    assert!(!image.is_deferred());
}

#[derive(Debug, Clone)]
enum Op {
    CreateClient(u8),
    DeleteClient(u8),
    Schedule { client: u8, priority: u8, intra: i8 },
    Finish { index: u8 },
    InsertBody(u8),
    Reprioritize { index: u8, priority: u8 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..3u8).prop_map(Op::CreateClient),
        (0..3u8).prop_map(Op::DeleteClient),
        (0..3u8, 1..6u8, any::<i8>()).prop_map(|(client, priority, intra)| Op::Schedule {
            client,
            priority,
            intra
        }),
        any::<u8>().prop_map(|index| Op::Finish { index }),
        (0..3u8).prop_map(Op::InsertBody),
        (any::<u8>(), 1..6u8).prop_map(|(index, priority)| Op::Reprioritize { index, priority }),
    ]
}

// Bypass-exempt priorities are excluded; the cap property is about
// requests the scheduler is actually allowed to hold back.
fn priority_from(n: u8) -> Priority {
    match n {
        1 => Priority::High,
        2 => Priority::Medium,
        3 => Priority::Low,
        4 => Priority::VeryLow,
        _ => Priority::Idle,
    }
}

/// Interprets generated ops against a scheduler, tracking live clients
/// and still-outstanding request ids
struct Harness {
    scheduler: ResourceScheduler,
    live_clients: HashSet<ClientId>,
    issued: Vec<RequestId>,
    next_id: u64,
}

impl Harness {
    fn new(config: SchedulerConfig) -> Self {
        Self {
            scheduler: ResourceScheduler::with_config(config),
            live_clients: HashSet::new(),
            issued: Vec::new(),
            next_id: 0,
        }
    }

    fn ensure_client(&mut self, c: u8) -> ClientId {
        let id = ClientId::new(c as u32, 0);
        if self.live_clients.insert(id) {
            self.scheduler.on_client_created(id);
        }
        id
    }

    fn step(&mut self, op: Op) {
        match op {
            Op::CreateClient(c) => {
                self.ensure_client(c);
            }
            Op::DeleteClient(c) => {
                let id = ClientId::new(c as u32, 0);
                if self.live_clients.remove(&id) {
                    self.scheduler.on_client_deleted(id);
                }
            }
            Op::Schedule {
                client,
                priority,
                intra,
            } => {
                let id = self.ensure_client(client);
                self.next_id += 1;
                let request = RequestId(self.next_id);
                self.issued.push(request);
                self.scheduler.schedule_request(
                    id,
                    true,
                    request,
                    priority_from(priority),
                    intra as i32,
                );
            }
            Op::Finish { index } => {
                if !self.issued.is_empty() {
                    let request = self.issued.remove(index as usize % self.issued.len());
                    self.scheduler.on_request_finished(request);
                }
            }
            Op::InsertBody(c) => {
                self.scheduler.on_will_insert_body(ClientId::new(c as u32, 0));
            }
            Op::Reprioritize { index, priority } => {
                if !self.issued.is_empty() {
                    let request = self.issued[index as usize % self.issued.len()];
                    self.scheduler
                        .reprioritize_request(request, priority_from(priority), 0);
                }
            }
        }
    }
}

proptest! {
    /// Neither cap is ever exceeded, whatever the interleaving
    #[test]
    fn test_caps_hold_under_interleavings(
        ops in proptest::collection::vec(op_strategy(), 1..100)
    ) {
        const LIMIT: usize = 4;
        const CAP: usize = 2;

        let mut harness = Harness::new(config(Some(LIMIT), Some(CAP)));
        for op in ops {
            harness.step(op);

            let stats = harness.scheduler.stats();
            prop_assert!(stats.in_flight <= LIMIT);
            prop_assert!(stats.in_flight_delayable <= CAP);
        }
    }

    /// Destroying every request, in any order, drains all state
    #[test]
    fn test_teardown_leaves_no_residue(
        ops in proptest::collection::vec(op_strategy(), 1..60)
    ) {
        let mut harness = Harness::new(config(Some(3), Some(1)));
        for op in ops {
            harness.step(op);
        }

        for request in harness.issued.drain(..) {
            harness.scheduler.on_request_finished(request);
        }
        for id in harness.live_clients.drain() {
            harness.scheduler.on_client_deleted(id);
        }

        let stats = harness.scheduler.stats();
        prop_assert_eq!(stats.in_flight, 0);
        prop_assert_eq!(stats.deferred, 0);
        prop_assert_eq!(stats.unowned, 0);
        prop_assert_eq!(stats.clients, 0);
    }
}
