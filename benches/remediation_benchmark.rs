//! Parse + remediation hot path benchmark.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use confdiff::driver;
use confdiff::prelude::*;

fn synthetic_config(interfaces: usize, shutdown: bool) -> String {
    let mut text = String::from("hostname bench\n");
    for i in 0..interfaces {
        text.push_str(&format!("interface GigabitEthernet0/{i}\n"));
        text.push_str(&format!("  description port {i}\n"));
        text.push_str(&format!("  ip address 10.0.{}.1 255.255.255.0\n", i % 250));
        if shutdown {
            text.push_str("  shutdown\n");
        } else {
            text.push_str("  no shutdown\n");
        }
    }
    text
}

fn bench_parse(c: &mut Criterion) {
    let text = synthetic_config(200, true);
    let mut group = c.benchmark_group("parse");
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.bench_function("cisco_ios_200_interfaces", |b| {
        b.iter(|| {
            ConfigTree::parse(driver::for_platform(Platform::CiscoIos), black_box(&text)).unwrap()
        })
    });
    group.finish();
}

fn bench_remediation(c: &mut Criterion) {
    let running =
        ConfigTree::parse(driver::for_platform(Platform::CiscoIos), &synthetic_config(200, true))
            .unwrap();
    let generated =
        ConfigTree::parse(driver::for_platform(Platform::CiscoIos), &synthetic_config(200, false))
            .unwrap();

    c.bench_function("remediation_200_interfaces", |b| {
        b.iter(|| {
            black_box(&running)
                .config_to_get_to(black_box(&generated))
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_parse, bench_remediation);
criterion_main!(benches);
