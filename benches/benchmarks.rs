use criterion::{black_box, criterion_group, criterion_main, Criterion};

use loadgate::{ClientId, Priority, RequestId, ResourceScheduler, SchedulerConfig};

fn scheduler_with_cap(cap: usize) -> ResourceScheduler {
    ResourceScheduler::with_config(SchedulerConfig {
        outstanding_request_limit: None,
        max_num_delayable_requests: Some(cap),
    })
}

/// Schedule/finish churn on a single loading page
fn benchmark_schedule_finish(c: &mut Criterion) {
    c.bench_function("schedule_finish_churn", |b| {
        let tab = ClientId::new(1, 1);
        b.iter(|| {
            let mut scheduler = scheduler_with_cap(6);
            scheduler.on_client_created(tab);
            scheduler.on_will_insert_body(tab);
            for i in 0..64u64 {
                scheduler.schedule_request(
                    tab,
                    true,
                    RequestId(i),
                    Priority::Low,
                    black_box(0),
                );
            }
            for i in 0..64u64 {
                scheduler.on_request_finished(RequestId(i));
            }
            black_box(scheduler.stats())
        })
    });
}

/// Re-scan cost with a deep backlog of deferred requests
fn benchmark_rescan(c: &mut Criterion) {
    let mut group = c.benchmark_group("rescan");

    for backlog in [32usize, 256] {
        group.bench_function(format!("backlog_{}", backlog), |b| {
            let tab = ClientId::new(1, 1);
            b.iter(|| {
                let mut scheduler = scheduler_with_cap(1);
                scheduler.on_client_created(tab);
                for i in 0..backlog as u64 {
                    scheduler.schedule_request(tab, true, RequestId(i), Priority::Low, 0);
                }
                // Opens the gate and scans the whole backlog
                scheduler.on_will_insert_body(tab);
                black_box(scheduler.stats())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_schedule_finish, benchmark_rescan);
criterion_main!(benches);
