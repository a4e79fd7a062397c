// benches/bench_phase_queue.rs
use criterion::{
    black_box, criterion_group, criterion_main, AxisScale, Criterion, PlotConfiguration,
};
use intersection_sim::{Phase, PhaseQueue};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn bench_phase_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("phase_queue");

    group.sample_size(100);
    group.measurement_time(Duration::from_secs(5));
    group.warm_up_time(Duration::from_secs(2));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Linear));

    // Backlog sizes of 50, 100 and 200 queued phase changes.
    for &size in [50, 100, 200].iter() {
        group.bench_function(format!("send_then_receive_{}", size), |b| {
            let queue = PhaseQueue::new();
            b.iter(|| {
                let mut phase = Phase::Red;
                for _ in 0..size {
                    phase = phase.toggled();
                    queue.send(phase);
                }
                for _ in 0..size {
                    black_box(queue.receive());
                }
            });
        });
    }

    // One producer thread and the bench thread as consumer.
    group.bench_function("cross_thread_handoff_100", |b| {
        b.iter(|| {
            let queue = Arc::new(PhaseQueue::new());
            let producer = {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    let mut phase = Phase::Red;
                    for _ in 0..100 {
                        phase = phase.toggled();
                        queue.send(phase);
                    }
                })
            };
            for _ in 0..100 {
                black_box(queue.receive());
            }
            producer.join().unwrap();
        });
    });
    group.finish();
}

criterion_group!(benches, bench_phase_queue);
criterion_main!(benches);
