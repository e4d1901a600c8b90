//! Tests for async task runtime primitives.

use futures::StreamExt;
use repo_insights::runtime::{AsyncStream, AsyncTask, TaskAborted};
use tokio::sync::oneshot;

#[tokio::test]
async fn test_async_task_spawn() {
    let task = AsyncTask::spawn(|| 42);
    let result = task.await.unwrap();
    assert_eq!(result, 42);
}

#[tokio::test]
async fn test_async_task_spawn_async() {
    let task = AsyncTask::spawn_async(async { 42 });
    let result = task.await.unwrap();
    assert_eq!(result, 42);
}

#[tokio::test]
async fn test_async_task_ready() {
    let task = AsyncTask::ready("done");
    assert_eq!(task.await.unwrap(), "done");
}

#[derive(Debug, PartialEq)]
enum JobError {
    Lost,
}

impl From<TaskAborted> for JobError {
    fn from(_: TaskAborted) -> Self {
        JobError::Lost
    }
}

#[tokio::test]
async fn test_join_maps_dropped_producer_to_error() {
    let (tx, rx) = oneshot::channel::<Result<u32, JobError>>();
    drop(tx);
    let task = AsyncTask::new(rx);
    assert_eq!(task.join().await, Err(JobError::Lost));
}

#[tokio::test]
async fn test_join_passes_result_through() {
    let task: AsyncTask<Result<u32, JobError>> = AsyncTask::spawn_async(async { Ok(7) });
    assert_eq!(task.join().await, Ok(7));
}

#[tokio::test]
async fn test_async_stream_from_vec() {
    let mut stream = AsyncStream::from_vec(vec![1, 2, 3]);

    assert_eq!(stream.next().await, Some(1));
    assert_eq!(stream.next().await, Some(2));
    assert_eq!(stream.next().await, Some(3));
    assert_eq!(stream.next().await, None);
}

#[tokio::test]
async fn test_async_stream_spawn_preserves_order() {
    let stream = AsyncStream::spawn(|tx| async move {
        for i in 0..50 {
            if !tx.send(i) {
                return;
            }
            tokio::task::yield_now().await;
        }
    });
    let items: Vec<i32> = stream.collect().await;
    assert_eq!(items, (0..50).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_sender_sees_dropped_consumer() {
    let (tx, stream) = AsyncStream::<u8>::channel();
    assert!(!tx.is_closed());
    drop(stream);
    assert!(tx.is_closed());
    assert!(!tx.send(1));
}
