use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use proto::{BackendError, CallbackRequest, CallbackResponse, LoginResponse, StatusResponse};

use crate::backend::Backend;

/// Scripted in-memory backend. Each call pops the next queued outcome;
/// an empty queue answers with a transport error.
#[derive(Default)]
pub(crate) struct FakeBackend {
    status: Mutex<VecDeque<Result<StatusResponse, BackendError>>>,
    callback: Mutex<VecDeque<Result<CallbackResponse, BackendError>>>,
    login: Mutex<Option<Result<LoginResponse, BackendError>>>,
    query: Mutex<VecDeque<Result<String, BackendError>>>,
    status_calls: Mutex<usize>,
    callback_bodies: Mutex<Vec<CallbackRequest>>,
    queries: Mutex<Vec<String>>,
}

fn unscripted() -> BackendError {
    BackendError::Transport("no scripted response".to_string())
}

impl FakeBackend {
    pub(crate) fn push_status(&self, outcome: Result<StatusResponse, BackendError>) {
        self.status.lock().unwrap().push_back(outcome);
    }

    pub(crate) fn push_callback(&self, outcome: Result<CallbackResponse, BackendError>) {
        self.callback.lock().unwrap().push_back(outcome);
    }

    pub(crate) fn set_login(&self, outcome: Result<LoginResponse, BackendError>) {
        *self.login.lock().unwrap() = Some(outcome);
    }

    pub(crate) fn push_query(&self, outcome: Result<String, BackendError>) {
        self.query.lock().unwrap().push_back(outcome);
    }

    pub(crate) fn status_calls(&self) -> usize {
        *self.status_calls.lock().unwrap()
    }

    pub(crate) fn callback_bodies(&self) -> Vec<CallbackRequest> {
        self.callback_bodies.lock().unwrap().clone()
    }

    pub(crate) fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn auth_status(&self) -> Result<StatusResponse, BackendError> {
        *self.status_calls.lock().unwrap() += 1;
        self.status
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(unscripted()))
    }

    async fn auth_callback(&self, body: &CallbackRequest) -> Result<CallbackResponse, BackendError> {
        self.callback_bodies.lock().unwrap().push(body.clone());
        self.callback
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(unscripted()))
    }

    async fn auth_login(&self) -> Result<LoginResponse, BackendError> {
        self.login
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(unscripted()))
    }

    async fn general_query(&self, query: &str) -> Result<String, BackendError> {
        self.queries.lock().unwrap().push(query.to_string());
        self.query
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(unscripted()))
    }
}
