use log::{info, warn};
use std::sync::LazyLock;
use tokio::spawn;
use tokio_util::task::TaskTracker;

/// Tracks the OCR requests running in the background.
pub static TASK_TRACKER: LazyLock<TaskTracker> = LazyLock::new(TaskTracker::new);

pub fn running_ocr_tasks() -> usize {
    TASK_TRACKER.len()
}

/// Stops accepting OCR requests. Returns how many were still running; their
/// results are dropped once the window is gone.
pub fn shutdown_tasks() -> usize {
    close_tracker(&TASK_TRACKER)
}

fn close_tracker(tracker: &TaskTracker) -> usize {
    let running = tracker.len();
    tracker.close();

    if running == 0 {
        info!("No OCR requests running at shutdown");
        return running;
    }

    warn!("Shutting down with {running} OCR request(s) still running");
    let tracker = tracker.clone();
    spawn(async move {
        tracker.wait().await;
        info!("Remaining OCR requests finished");
    });
    running
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn close_reports_running_requests() {
        let tracker = TaskTracker::new();
        let (release, wait) = oneshot::channel::<()>();
        tracker.spawn(async move {
            let _ = wait.await;
        });

        assert_eq!(close_tracker(&tracker), 1);
        assert!(tracker.is_closed());

        release.send(()).unwrap();
        tracker.wait().await;
        assert!(tracker.is_empty());
    }

    #[tokio::test]
    async fn close_without_requests_reports_none() {
        let tracker = TaskTracker::new();

        assert_eq!(close_tracker(&tracker), 0);
        assert!(tracker.is_closed());
    }
}
