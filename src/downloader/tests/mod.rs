use super::*;
use crate::downloader::test_helpers::{RecordingStorage, create_test_manager, test_config};
use crate::error::Error;
use crate::types::{Status, Task, TaskId};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod lifecycle;

/// Mount a 200 response with `body` at `/name`
async fn serve(server: &MockServer, name: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/{name}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Mount a response that takes `delay` before answering at `/name`
async fn serve_slowly(server: &MockServer, name: &str, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(format!("/{name}")))
        .respond_with(ResponseTemplate::new(200).set_delay(delay))
        .mount(server)
        .await;
}

fn url(server: &MockServer, name: &str) -> String {
    format!("{}/{name}", server.uri())
}

async fn wait_for_status(manager: &TaskManager, id: &TaskId, status: Status) -> Task {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let task = manager.get_task(id).await.unwrap();
            if task.status == status {
                return task;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("task {id} never reached {status}"))
}
