// Criterion benchmarks for Hero Match

use criterion::{black_box, criterion_group, criterion_main, Criterion, BenchmarkId};
use hero_match::core::{aggregate, distance_km, DistanceTiers, MatchResult, ProximityMatcher, Tier};
use hero_match::models::{Coordinate, Facility, FacilityCategory};
use hero_match::reference::CoordinateTable;
use hero_match::services::InMemoryStore;
use std::sync::Arc;

const LEIPZIG: (f64, f64) = (51.3318815, 12.3953362);

fn create_facility(id: usize, lat: f64, lon: f64) -> Facility {
    Facility {
        id: format!("facility-{}", id),
        category: FacilityCategory::Plasma,
        coordinate: Coordinate::new(lat, lon).ok(),
        title: None,
        address: None,
    }
}

fn create_facilities(count: usize) -> Vec<Facility> {
    (0..count)
        .map(|i| {
            let lat_offset = (i as f64 * 0.001) % 0.5;
            let lon_offset = (i as f64 * 0.0007) % 0.5;
            create_facility(i, LEIPZIG.0 + lat_offset, LEIPZIG.1 + lon_offset)
        })
        .collect()
}

fn bench_distance_km(c: &mut Criterion) {
    let origin = Coordinate::new(LEIPZIG.0, LEIPZIG.1).unwrap();
    let target = Coordinate::new(51.3460671, 12.3989616).unwrap();

    c.bench_function("distance_km", |b| {
        b.iter(|| distance_km(black_box(origin), black_box(target)));
    });
}

fn bench_scan(c: &mut Criterion) {
    let origin = Coordinate::new(LEIPZIG.0, LEIPZIG.1).unwrap();
    let table = CoordinateTable::from_entries([("04103", origin)]);
    let matcher = ProximityMatcher::new(Arc::new(table));
    let tiers = DistanceTiers::new(&[5, 15, 50]).unwrap();

    let mut group = c.benchmark_group("scan");

    for facility_count in [100, 1_000, 10_000].iter() {
        let facilities = create_facilities(*facility_count);

        group.bench_with_input(
            BenchmarkId::new("scan", facility_count),
            facility_count,
            |b, _| {
                b.iter(|| {
                    let mut result = MatchResult::new();
                    matcher.scan(black_box(origin), black_box(&facilities), &tiers, &mut result);
                    black_box(result)
                });
            },
        );
    }

    group.finish();
}

fn bench_scan_and_aggregate(c: &mut Criterion) {
    let origin = Coordinate::new(LEIPZIG.0, LEIPZIG.1).unwrap();
    let table = CoordinateTable::from_entries([("04103", origin)]);
    let matcher = ProximityMatcher::new(Arc::new(table));
    let tiers = DistanceTiers::new(&[5, 15]).unwrap();
    let facilities = create_facilities(1_000);

    c.bench_function("scan_and_aggregate_1000_facilities", |b| {
        b.iter(|| {
            let mut result = MatchResult::new();
            matcher.scan(origin, &facilities, &tiers, &mut result);
            black_box(aggregate(&result, Tier::new(5), Tier::new(15)))
        });
    });
}

fn bench_find_nearby(c: &mut Criterion) {
    let origin = Coordinate::new(LEIPZIG.0, LEIPZIG.1).unwrap();
    let table = CoordinateTable::from_entries([("04103", origin)]);
    let matcher = ProximityMatcher::new(Arc::new(table));
    let tiers = DistanceTiers::new(&[5, 15]).unwrap();
    let store = InMemoryStore::with_facilities(create_facilities(1_000));

    c.bench_function("find_nearby_1000_facilities", |b| {
        b.iter(|| {
            tokio_test::block_on(matcher.find_nearby(
                black_box("04103"),
                &[FacilityCategory::Plasma],
                &tiers,
                &store,
            ))
        });
    });
}

criterion_group!(
    benches,
    bench_distance_km,
    bench_scan,
    bench_scan_and_aggregate,
    bench_find_nearby
);

criterion_main!(benches);
