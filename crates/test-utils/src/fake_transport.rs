use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use airflow_runner::errors::RunnerError;
use airflow_runner::remote::transport::TransportFuture;
use airflow_runner::remote::{HttpRequest, HttpResponse, Transport};

/// A `Transport` that replays queued responses and records every request.
///
/// Cloning shares the queue and the request log, so a test can keep a
/// handle after moving the transport into a client.
#[derive(Debug, Clone, Default)]
pub struct FakeTransport {
    responses: Arc<Mutex<VecDeque<Result<HttpResponse, String>>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with the given status and body.
    pub fn respond(&self, status: u16, body: &str) -> &Self {
        self.responses.lock().unwrap().push_back(Ok(HttpResponse {
            status,
            body: body.to_string(),
        }));
        self
    }

    /// Queue a 200 response carrying a DAG run in `state`.
    pub fn respond_run(&self, job: &str, run_id: &str, state: &str) -> &Self {
        let body = format!(
            r#"{{"dag_id":"{job}","dag_run_id":"{run_id}","state":"{state}","conf":{{}},"external_trigger":true}}"#
        );
        self.respond(200, &body)
    }

    /// Queue a transport failure.
    pub fn fail(&self, msg: &str) -> &Self {
        self.responses.lock().unwrap().push_back(Err(msg.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for FakeTransport {
    fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
        Box::pin(async move {
            self.requests.lock().unwrap().push(request);
            let next = self.responses.lock().unwrap().pop_front();
            match next {
                Some(Ok(response)) => Ok(response),
                Some(Err(msg)) => Err(RunnerError::TransportError(msg)),
                None => Err(RunnerError::TransportError(
                    "no response queued".to_string(),
                )),
            }
        })
    }
}
