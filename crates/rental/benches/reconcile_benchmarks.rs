use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use rentdesk_core::{ItemCode, Quantity};
use rentdesk_rental::{ReturnLine, TimeLog, reconcile};

fn time_logs(items: usize) -> Vec<TimeLog> {
    (0..items)
        .map(|i| TimeLog {
            idx: i as u32 + 1,
            item_code: ItemCode::new(format!("ITEM-{i:04}")).unwrap(),
            item_name: format!("Item {i}"),
            qty: Quantity::new(10.0).unwrap(),
            rate: 100,
            uom: None,
        })
        .collect()
}

/// One line per item per invoice, each returning a fraction of the rented quantity.
fn invoice_lines(items: usize, invoices: usize) -> Vec<ReturnLine> {
    (0..invoices)
        .flat_map(|_| {
            (0..items).map(|i| {
                ReturnLine::new(
                    ItemCode::new(format!("ITEM-{i:04}")).unwrap(),
                    Quantity::new(1.0).unwrap(),
                )
            })
        })
        .collect()
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");

    for &(items, invoices) in &[(5usize, 2usize), (50, 10), (200, 50)] {
        let logs = time_logs(items);
        let prior = invoice_lines(items, invoices);
        let current = invoice_lines(items, 1);

        group.throughput(Throughput::Elements((prior.len() + current.len()) as u64));
        group.bench_with_input(
            BenchmarkId::new("items_x_invoices", format!("{items}x{invoices}")),
            &(logs, prior, current),
            |b, (logs, prior, current)| {
                b.iter(|| reconcile(black_box(logs), black_box(prior), black_box(current)))
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_reconcile);
criterion_main!(benches);
