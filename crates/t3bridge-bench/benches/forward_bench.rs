//! Forwarding hot-path benchmarks.

use std::ffi::{c_char, c_int};

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use t3bridge_abi::Forwarder;
use t3bridge_core::diagnostic::{DiagnosticDocument, write_document};
use t3bridge_core::target::AuxiliaryExports;
use t3bridge_core::trail::NullTrail;
use t3bridge_core::{ModuleSlot, ResolutionCell, Target, TargetFn, TargetResolver};

unsafe extern "C" fn noop_bridge(_: *const c_char, out: *mut c_char, _: c_int, _: c_int) -> c_int {
    unsafe { *out = 0 };
    0
}

struct Fixed(Option<Target>);

impl TargetResolver for Fixed {
    fn resolve(&self) -> Option<Target> {
        self.0.clone()
    }
}

fn bridge_target() -> Target {
    Target {
        entry: TargetFn::Bridge(noop_bridge),
        symbol: "T3000_HandleWebViewMsgBridge",
        module: ModuleSlot::Main,
        module_label: "T3000.exe".to_string(),
        auxiliary: AuxiliaryExports::default(),
    }
}

fn bench_invoke(c: &mut Criterion) {
    let mut group = c.benchmark_group("invoke");

    for (label, resolver) in [
        ("resolved", Fixed(Some(bridge_target()))),
        ("unavailable", Fixed(None)),
    ] {
        let cell = ResolutionCell::new();
        let trail = NullTrail;
        let fwd = Forwarder::new(&cell, &resolver, &trail);
        let _ = fwd.target();
        let mut buf = vec![0u8; 1024];

        group.bench_function(label, |b| {
            b.iter(|| {
                let rc = unsafe { fwd.invoke(7, buf.as_mut_ptr().cast(), 1024) };
                criterion::black_box(rc);
            });
        });
    }
    group.finish();
}

fn bench_diagnostic_write(c: &mut Criterion) {
    let doc = DiagnosticDocument::unavailable(7).to_json();
    let mut group = c.benchmark_group("diagnostic_write");

    for capacity in [2usize, 16, 256] {
        group.bench_with_input(BenchmarkId::new("capacity", capacity), &capacity, |b, &cap| {
            let mut buf = vec![0u8; cap];
            b.iter(|| criterion::black_box(write_document(&mut buf, &doc)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_invoke, bench_diagnostic_write);
criterion_main!(benches);
