// File: dispatcher.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Bounded-concurrency fan-out shared by every scan module: runs each item
/// exactly once with at most `concurrency` workers in flight, and returns
/// only after all of them finished. Completion order is unspecified and
/// there is no per-item cancellation.
pub struct Dispatcher {
    permits: Arc<Semaphore>,
}

impl Dispatcher {
    pub fn new(concurrency: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    pub async fn run<T, F, Fut>(&self, items: Vec<T>, worker: F)
    where
        T: Send + 'static,
        F: Fn(T) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut handles = Vec::with_capacity(items.len());
        for item in items {
            let permit = self
                .permits
                .clone()
                .acquire_owned()
                .await
                .expect("dispatcher semaphore closed");
            let fut = worker(item);
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                fut.await;
            }));
        }
        for handle in handles {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_runs_each_item_exactly_once() {
        let dispatcher = Dispatcher::new(4);
        let counter = Arc::new(AtomicUsize::new(0));

        let items: Vec<usize> = (0..100).collect();
        let c = counter.clone();
        dispatcher
            .run(items, move |_| {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                }
            })
            .await;

        assert_eq!(counter.load(Ordering::SeqCst), 100);
    }

    #[tokio::test]
    async fn test_concurrency_is_capped() {
        let cap = 3;
        let dispatcher = Dispatcher::new(cap);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let items: Vec<usize> = (0..30).collect();
        let inf = in_flight.clone();
        let max = max_seen.clone();
        dispatcher
            .run(items, move |_| {
                let inf = inf.clone();
                let max = max.clone();
                async move {
                    let now = inf.fetch_add(1, Ordering::SeqCst) + 1;
                    max.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    inf.fetch_sub(1, Ordering::SeqCst);
                }
            })
            .await;

        assert!(max_seen.load(Ordering::SeqCst) <= cap);
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_concurrency_of_one_serializes() {
        let dispatcher = Dispatcher::new(1);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let inf = in_flight.clone();
        let max = max_seen.clone();
        dispatcher
            .run(vec![1, 2, 3, 4, 5], move |_| {
                let inf = inf.clone();
                let max = max.clone();
                async move {
                    let now = inf.fetch_add(1, Ordering::SeqCst) + 1;
                    max.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    inf.fetch_sub(1, Ordering::SeqCst);
                }
            })
            .await;

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }
}
