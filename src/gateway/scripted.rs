//! In-process gateway with scripted answers, used by the test suites and
//! by local development when no processor key is configured

use super::{ChargeOutcome, ChargeRequest, GatewayError, PaymentGateway};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted answer
#[derive(Debug, Clone)]
pub enum Script {
    Approve,
    Decline(Option<String>),
    Timeout,
    Transport(String),
}

#[derive(Default)]
struct Inner {
    scripts: VecDeque<Script>,
    requests: Vec<ChargeRequest>,
    issued: u64,
}

/// Answers charges from a queue; approves once the queue is empty
#[derive(Clone, Default)]
pub struct ScriptedGateway {
    inner: Arc<Mutex<Inner>>,
    fallback: Option<Script>,
    delay: Option<Duration>,
}

impl ScriptedGateway {
    /// Gateway that approves everything
    pub fn approving() -> Self {
        Self::default()
    }

    /// Gateway answering every charge with `script`
    pub fn always(script: Script) -> Self {
        Self {
            fallback: Some(script),
            ..Self::default()
        }
    }

    /// Wait `delay` before answering each charge
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue an answer for the next charge
    pub fn then(self, script: Script) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            inner.scripts.push_back(script);
        }
        self
    }

    /// Every charge received so far
    pub fn requests(&self) -> Vec<ChargeRequest> {
        self.inner
            .lock()
            .map(|inner| inner.requests.clone())
            .unwrap_or_default()
    }

    fn next(&self, request: &ChargeRequest) -> Result<(Script, u64), GatewayError> {
        let mut inner = self.inner.lock().map_err(|e| GatewayError::Transport {
            message: format!("scripted gateway poisoned: {e}"),
            raw: Value::Null,
        })?;
        inner.requests.push(request.clone());
        inner.issued += 1;
        let script = inner
            .scripts
            .pop_front()
            .or_else(|| self.fallback.clone())
            .unwrap_or(Script::Approve);
        Ok((script, inner.issued))
    }
}

fn answer(script: Script, serial: u64, request: &ChargeRequest) -> Result<ChargeOutcome, GatewayError> {
    match script {
        Script::Approve => {
            let transaction_id = format!("chr_test_{serial:06}");
            Ok(ChargeOutcome::Approved {
                raw: json!({
                    "object": "charge",
                    "id": transaction_id,
                    "amount": request.amount_minor,
                    "currency_code": request.currency,
                    "status": "successful",
                }),
                transaction_id,
            })
        }
        Script::Decline(message) => Ok(ChargeOutcome::Declined {
            transaction_id: None,
            raw: json!({
                "object": "error",
                "type": "card_error",
                "user_message": message,
            }),
            message,
        }),
        Script::Timeout => Err(GatewayError::Timeout(0)),
        Script::Transport(message) => Err(GatewayError::Transport {
            message,
            raw: Value::Null,
        }),
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn charge(&self, request: ChargeRequest) -> Result<ChargeOutcome, GatewayError> {
        let (script, serial) = self.next(&request)?;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        answer(script, serial, &request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ChargeRequest {
        ChargeRequest {
            amount_minor: 3550,
            currency: "PEN".into(),
            token: "tkn_test".into(),
            email: "rosa@example.pe".into(),
            description: "Pedido PED-1".into(),
            metadata: json!({}),
        }
    }

    #[tokio::test]
    async fn test_queue_then_fallback() {
        let gateway = ScriptedGateway::approving().then(Script::Decline(Some("no".into())));
        assert!(matches!(
            gateway.charge(request()).await,
            Ok(ChargeOutcome::Declined { .. })
        ));
        assert!(matches!(
            gateway.charge(request()).await,
            Ok(ChargeOutcome::Approved { .. })
        ));
        assert_eq!(gateway.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_always_timeout() {
        let gateway = ScriptedGateway::always(Script::Timeout);
        assert!(matches!(
            gateway.charge(request()).await,
            Err(GatewayError::Timeout(_))
        ));
    }
}
