//! Benchmarks for the deal analytics reports and the chat room
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use safar::analytics::{self, Dataset, Deal, DealStatus, Report, SeasonFilter, Shark};
use safar::chat::ChatRoom;
use safar::store::ChatMessage;

const INDUSTRIES: [&str; 6] = [
    "Food & Beverage",
    "Technology",
    "Fashion",
    "Health",
    "Education",
    "Consumer Goods",
];

fn create_dataset(count: usize) -> Dataset {
    let deals = (0..count)
        .map(|i| {
            let funded = i % 3 != 0;
            Deal {
                startup_name: format!("Startup {}", i),
                industry: INDUSTRIES[i % INDUSTRIES.len()].to_string(),
                season: (i % 4) as u32 + 1,
                valuation: 10_000_000.0 + (i as f64) * 250_000.0,
                deal_amount: funded.then(|| 5_000_000.0 + (i % 7) as f64 * 1_000_000.0),
                amount_invested_lakhs: funded.then(|| 50.0 + (i % 7) as f64 * 10.0),
                status: if funded {
                    DealStatus::Funded
                } else {
                    DealStatus::NotFunded
                },
                sharks: vec!["Aman Gupta".to_string(), "Namita Thapar".to_string()],
            }
        })
        .collect();

    let sharks = vec![
        Shark {
            name: "Aman Gupta".to_string(),
            company: "boAt".to_string(),
        },
        Shark {
            name: "Namita Thapar".to_string(),
            company: "Emcure Pharmaceuticals".to_string(),
        },
    ];

    Dataset::new(deals, sharks)
}

fn bench_reports(c: &mut Criterion) {
    let mut group = c.benchmark_group("reports");

    for size in [100, 1000, 10000] {
        let dataset = create_dataset(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("industries_{}", size), |b| {
            b.iter(|| analytics::industries(black_box(&dataset), SeasonFilter::all()))
        });

        group.bench_function(format!("insights_{}", size), |b| {
            b.iter(|| analytics::insights(black_box(&dataset), SeasonFilter::all()))
        });

        group.bench_function(format!("trends_{}", size), |b| {
            b.iter(|| analytics::trends(black_box(&dataset), SeasonFilter::all()))
        });

        group.bench_function(format!("overview_season_{}", size), |b| {
            b.iter(|| analytics::overview(black_box(&dataset), SeasonFilter::season(2)))
        });
    }

    group.finish();
}

fn bench_report_json(c: &mut Criterion) {
    let dataset = create_dataset(1000);

    c.bench_function("report_json_all_1000", |b| {
        b.iter(|| {
            for report in Report::all() {
                report
                    .run(black_box(&dataset), SeasonFilter::all())
                    .unwrap();
            }
        })
    });
}

fn create_messages(count: usize) -> Vec<ChatMessage> {
    let base = chrono::Utc::now();
    (0..count)
        .map(|i| ChatMessage {
            id: format!("m{}", i),
            user_id: format!("u{}", i % 10),
            user_name: format!("User {}", i % 10),
            message: "Bhai, ye deal toh pakki hai".to_string(),
            created_at: base + chrono::Duration::milliseconds(i as i64),
        })
        .collect()
}

fn bench_chat_room(c: &mut Criterion) {
    let mut group = c.benchmark_group("chat_room");

    for size in [100, 1000] {
        let messages = create_messages(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("insert_in_order_{}", size), |b| {
            b.iter(|| {
                let room = ChatRoom::new();
                for message in &messages {
                    room.insert(black_box(message.clone()));
                }
                room
            })
        });

        group.bench_function(format!("merge_with_duplicates_{}", size), |b| {
            let room = ChatRoom::new();
            room.replace(messages[..size / 2].to_vec());

            b.iter(|| room.merge(black_box(messages.clone())))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_reports, bench_report_json, bench_chat_room);
criterion_main!(benches);
