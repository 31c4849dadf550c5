use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[tokio::test]
async fn test_results_keep_input_order() {
    let pool = WorkerPool::current(4).unwrap();

    let tasks = (0..10u64).map(|i| async move {
        // Later tasks finish first
        tokio::time::sleep(Duration::from_millis(20 - i * 2)).await;
        Ok(i)
    });

    let results: Vec<u64> = pool
        .run_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(results, (0..10).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_permits_bound_concurrency() {
    let pool = WorkerPool::current(2).unwrap();
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let tasks = (0..8).map(|_| {
        let pool = pool.clone();
        let running = running.clone();
        let peak = peak.clone();
        async move {
            let _permit = pool.permit().await?;
            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            running.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    });

    let results = pool.run_all(tasks).await;

    assert_eq!(results.len(), 8);
    assert!(results.iter().all(|r| r.is_ok()));
    assert!(peak.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn test_spawned_tasks_do_not_hold_permits() {
    let pool = WorkerPool::current(1).unwrap();

    // Each task takes the single permit itself; a permit per task would deadlock.
    let tasks = (0..3).map(|i| {
        let pool = pool.clone();
        async move {
            let _permit = pool.permit().await?;
            Ok(i)
        }
    });
    let results = tokio::time::timeout(Duration::from_secs(5), pool.run_all(tasks))
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.is_ok()));
}

#[test]
fn test_spawn_runs_on_the_pool_runtime() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("cantus-pool")
        .enable_all()
        .build()
        .unwrap();
    let pool = WorkerPool::new(runtime.handle().clone(), 1);

    let caller = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let name = caller
        .block_on(pool.spawn(async {
            Ok(std::thread::current().name().map(str::to_string))
        }))
        .unwrap();

    assert_eq!(name.as_deref(), Some("cantus-pool"));
}

#[tokio::test]
async fn test_failures_do_not_affect_siblings() {
    let pool = WorkerPool::current(2).unwrap();

    let tasks = (0..4).map(|i| async move {
        if i == 1 {
            Err(CantusError::not_found("manifest", "x"))
        } else {
            Ok(i)
        }
    });

    let results = pool.run_all(tasks).await;

    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(CantusError::NotFound { .. })));
    assert!(results[2].is_ok());
    assert!(results[3].is_ok());
}

#[tokio::test]
async fn test_panicking_task_becomes_unexpected() {
    let pool = WorkerPool::current(2).unwrap();

    let tasks = (0..2).map(|i| async move {
        if i == 0 {
            panic!("boom");
        }
        Ok(i)
    });

    let results = pool.run_all(tasks).await;

    assert!(matches!(results[0], Err(CantusError::Unexpected { .. })));
    assert_eq!(*results[1].as_ref().unwrap(), 1);
}

#[test]
fn test_current_outside_runtime_fails() {
    assert!(WorkerPool::current(1).is_err());
}

#[tokio::test]
async fn test_zero_size_is_one() {
    let pool = WorkerPool::current(0).unwrap();
    assert_eq!(pool.size(), 1);
}
