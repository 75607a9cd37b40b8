use super::*;

#[tokio::test]
async fn start_with_no_snapshot_is_empty() {
    let (manager, _storage, _temp_dir) = create_test_manager();

    let requeued = manager.start().await.unwrap();

    assert_eq!(requeued, 0);
    assert!(manager.list_tasks().await.is_empty());
    manager.shutdown().await.unwrap();
}

#[tokio::test]
async fn start_with_corrupt_snapshot_fails() {
    let (manager, _storage, temp_dir) = create_test_manager();
    std::fs::write(temp_dir.path().join("tasks.json"), "{{{ not json").unwrap();

    let err = manager.start().await.unwrap_err();

    assert!(matches!(err, Error::Persistence(_)));
}

#[tokio::test]
async fn shutdown_writes_snapshot_and_emits_event() {
    // Workers never started: the task stays queued until shutdown
    let (manager, _storage, temp_dir) = create_test_manager();
    let mut events = manager.subscribe();

    let task = manager
        .create_task(vec!["http://x/a.txt".to_string()])
        .await
        .unwrap();
    manager.shutdown().await.unwrap();

    let raw = std::fs::read_to_string(temp_dir.path().join("tasks.json")).unwrap();
    let records: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(records[0]["id"], task.id.as_str());

    let mut saw_shutdown = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event, Event::Shutdown) {
            saw_shutdown = true;
        }
    }
    assert!(saw_shutdown);
}

#[tokio::test]
async fn shutdown_mid_download_saves_task_as_pending() {
    let server = MockServer::start().await;
    serve_slowly(&server, "slow.bin", Duration::from_secs(30)).await;

    let (manager, storage, temp_dir) = create_test_manager();
    manager.start().await.unwrap();

    let task = manager
        .create_task(vec![url(&server, "slow.bin")])
        .await
        .unwrap();
    wait_for_status(&manager, &task.id, Status::Running).await;

    let started = std::time::Instant::now();
    manager.shutdown().await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));

    // Memory still says Running; the snapshot says Pending
    assert_eq!(
        manager.get_task(&task.id).await.unwrap().status,
        Status::Running
    );
    let raw = std::fs::read_to_string(temp_dir.path().join("tasks.json")).unwrap();
    let records: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(records[0]["status"], "pending");
    assert!(records[0].get("error").is_none());
    assert!(storage.names().is_empty());
}

#[tokio::test]
async fn restart_reruns_interrupted_task_from_first_url() {
    let server = MockServer::start().await;
    serve(&server, "first.txt", "first").await;
    serve_slowly(&server, "second.txt", Duration::from_secs(30)).await;

    let temp_dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(RecordingStorage::default());
    let manager = TaskManager::with_storage(test_config(temp_dir.path()), storage.clone());
    manager.start().await.unwrap();

    let task = manager
        .create_task(vec![url(&server, "first.txt"), url(&server, "second.txt")])
        .await
        .unwrap();

    // Wait until the first URL is stored and the second is in flight
    tokio::time::timeout(Duration::from_secs(5), async {
        while storage.names().is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    manager.shutdown().await.unwrap();

    // Second process: the slow URL now answers quickly
    server.reset().await;
    serve(&server, "first.txt", "first").await;
    serve(&server, "second.txt", "second").await;

    let restored_storage = Arc::new(RecordingStorage::default());
    let restarted =
        TaskManager::with_storage(test_config(temp_dir.path()), restored_storage.clone());
    let requeued = restarted.start().await.unwrap();
    assert_eq!(requeued, 1);

    let done = restarted.wait_for_task(&task.id).await.unwrap();
    assert_eq!(done.status, Status::Completed);
    assert_eq!(
        restored_storage.names(),
        vec!["first.txt".to_string(), "second.txt".to_string()]
    );

    restarted.shutdown().await.unwrap();
}

#[tokio::test]
async fn restart_keeps_terminal_tasks_untouched() {
    let server = MockServer::start().await;
    serve(&server, "ok.txt", "ok").await;

    let temp_dir = tempfile::tempdir().unwrap();
    let manager = TaskManager::with_storage(
        test_config(temp_dir.path()),
        Arc::new(RecordingStorage::default()),
    );
    manager.start().await.unwrap();
    let task = manager
        .create_task(vec![url(&server, "ok.txt")])
        .await
        .unwrap();
    let completed = manager.wait_for_task(&task.id).await.unwrap();
    manager.shutdown().await.unwrap();

    let restarted = TaskManager::with_storage(
        test_config(temp_dir.path()),
        Arc::new(RecordingStorage::default()),
    );
    assert_eq!(restarted.start().await.unwrap(), 0);

    assert_eq!(restarted.get_task(&task.id).await.unwrap(), completed);
    // Completion of a restored terminal task is already fired
    let again = tokio::time::timeout(Duration::from_secs(1), restarted.wait_for_task(&task.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(again, completed);

    restarted.shutdown().await.unwrap();
}

#[tokio::test]
async fn shutdown_reports_snapshot_write_failure() {
    let temp_dir = tempfile::tempdir().unwrap();
    let blocker = temp_dir.path().join("blocker");
    std::fs::write(&blocker, "file").unwrap();

    let mut config = test_config(temp_dir.path());
    config.tasks.file = blocker.join("tasks.json");
    let manager = TaskManager::with_storage(config, Arc::new(RecordingStorage::default()));
    manager
        .create_task(vec!["http://x/a.txt".to_string()])
        .await
        .unwrap();

    let err = manager.shutdown().await.unwrap_err();
    assert!(matches!(err, Error::Persistence(_)));
}

#[test]
fn new_rejects_invalid_config() {
    let mut config = crate::config::Config::default();
    config.worker_pool.num_workers = 0;

    assert!(matches!(TaskManager::new(config), Err(Error::Config { .. })));
}

#[tokio::test]
async fn second_start_leaves_running_tasks_alone() {
    let server = MockServer::start().await;
    serve_slowly(&server, "slow.bin", Duration::from_secs(30)).await;

    let (manager, _storage, temp_dir) = create_test_manager();
    manager.start().await.unwrap();

    let task = manager
        .create_task(vec![url(&server, "slow.bin")])
        .await
        .unwrap();
    wait_for_status(&manager, &task.id, Status::Running).await;

    // A snapshot on disk that no longer matches memory
    std::fs::write(temp_dir.path().join("tasks.json"), "[]").unwrap();
    let completion = manager.store.completion(&task.id).await.unwrap();

    assert_eq!(manager.start().await.unwrap(), 0);

    let tasks = manager.list_tasks().await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].status, Status::Running);
    assert!(!completion.is_complete());

    manager.shutdown().await.unwrap();
    assert!(completion.is_complete());
}

#[tokio::test]
async fn start_can_retry_after_corrupt_snapshot() {
    let (manager, _storage, temp_dir) = create_test_manager();
    let snapshot = temp_dir.path().join("tasks.json");
    std::fs::write(&snapshot, "{{{ not json").unwrap();

    assert!(matches!(manager.start().await, Err(Error::Persistence(_))));

    std::fs::remove_file(&snapshot).unwrap();
    assert_eq!(manager.start().await.unwrap(), 0);

    manager.shutdown().await.unwrap();
}
