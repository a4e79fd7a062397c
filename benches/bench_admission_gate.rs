// benches/bench_admission_gate.rs
use criterion::{
    black_box, criterion_group, criterion_main, AxisScale, Criterion, PlotConfiguration,
};
use intersection_sim::{AdmissionGate, VehicleId};
use std::time::Duration;
use tokio::sync::oneshot;

fn bench_admission_gate(c: &mut Criterion) {
    let mut group = c.benchmark_group("admission_gate");

    group.sample_size(100);
    group.measurement_time(Duration::from_secs(5));
    group.warm_up_time(Duration::from_secs(2));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Linear));

    // Fill the line with 50, 100 and 200 vehicles, then release them all.
    for &size in [50, 100, 200].iter() {
        group.bench_function(format!("push_then_release_{}", size), |b| {
            let gate = AdmissionGate::new();
            b.iter(|| {
                let mut entries = Vec::with_capacity(size);
                for id in 0..size as u64 {
                    let (permit, entry) = oneshot::channel();
                    gate.push_back(VehicleId(id), permit);
                    entries.push(entry);
                }
                while gate.size() > 0 {
                    black_box(gate.permit_entry_to_first_in_queue().unwrap());
                }
                black_box(entries);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_admission_gate);
criterion_main!(benches);
