use finisher::Limiter;
use proptest::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Runs `tasks` holders through a gate of `capacity` and returns the peak
/// number admitted at once.
fn peak_holders(capacity: usize, tasks: usize, hold_us: u64) -> (usize, usize) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_time()
        .build()
        .unwrap();

    rt.block_on(async {
        let limiter = Limiter::new(capacity);
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let done = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::with_capacity(tasks);
        for _ in 0..tasks {
            let limiter = limiter.clone();
            let current = Arc::clone(&current);
            let peak = Arc::clone(&peak);
            let done = Arc::clone(&done);
            handles.push(tokio::spawn(async move {
                let permit = limiter.acquire().await.unwrap();
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_micros(hold_us)).await;
                current.fetch_sub(1, Ordering::SeqCst);
                permit.release();
                done.fetch_add(1, Ordering::SeqCst);
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(limiter.available(), limiter.capacity());
        (peak.load(Ordering::SeqCst), done.load(Ordering::SeqCst))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn never_admits_more_than_capacity(capacity in 1usize..8, tasks in 1usize..40, hold_us in 0u64..500) {
        let (peak, done) = peak_holders(capacity, tasks, hold_us);
        prop_assert!(peak <= capacity, "peak {} > capacity {}", peak, capacity);
        prop_assert!(peak >= 1);
        prop_assert_eq!(done, tasks);
    }
}

#[test]
fn saturates_under_load() {
    let (peak, done) = peak_holders(4, 64, 2_000);
    assert_eq!(peak, 4);
    assert_eq!(done, 64);
}
