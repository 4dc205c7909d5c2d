#![allow(missing_docs)]

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use futures::{StreamExt, TryStreamExt, channel::mpsc};
use mergescope::{
    MSResult,
    MergescopeError,
    TokenId,
    Vocabulary,
    inference::{
        CancellationToken,
        InferenceAction,
        InferenceConfig,
        InferenceRequest,
        InferenceResponse,
        InferenceSession,
        MessageSink,
        MessageTransport,
        SessionState,
        TransportConnector,
    },
    vocab::TokenizeOptions,
};

/// Requests are forwarded to a server task over a channel.
struct LoopbackTransport {
    requests: mpsc::UnboundedSender<String>,
    closes: Arc<AtomicUsize>,
}

impl MessageTransport for LoopbackTransport {
    fn send(
        &mut self,
        text: String,
    ) -> MSResult<()> {
        self.requests
            .unbounded_send(text)
            .map_err(|e| MergescopeError::Protocol(e.to_string()))
    }

    fn close(&mut self) {
        self.requests.close_channel();
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// A fake backend which "generates" by cycling the prompt,
/// two tokens per response, with a delay before each response.
#[derive(Clone, Default)]
struct CyclingServer {
    delay: Duration,
    closes: Arc<AtomicUsize>,
}

impl CyclingServer {
    fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl TransportConnector for CyclingServer {
    type Transport = LoopbackTransport;

    fn connect(
        &self,
        sink: MessageSink,
    ) -> MSResult<LoopbackTransport> {
        let (requests, mut inbound) = mpsc::unbounded::<String>();
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            sink.opened();

            while let Some(text) = inbound.next().await {
                let request: InferenceRequest = serde_json::from_str(&text).unwrap();
                let InferenceAction::AutoregressiveInference {
                    token_input,
                    config,
                    ..
                } = request.action;

                let count = config.num_tokens.unwrap_or(0) as usize;
                let generated: Vec<TokenId> =
                    token_input.iter().copied().cycle().take(count).collect();

                for chunk in generated.chunks(2) {
                    tokio::time::sleep(delay).await;
                    sink.message(
                        InferenceResponse::new(&request.request_id, chunk.to_vec(), false)
                            .encode()
                            .unwrap(),
                    );
                }
                sink.message(
                    InferenceResponse::new(&request.request_id, vec![], true)
                        .encode()
                        .unwrap(),
                );
            }
        });

        Ok(LoopbackTransport {
            requests,
            closes: self.closes.clone(),
        })
    }
}

#[tokio::test]
async fn test_prompt_to_text() {
    let vocab = Vocabulary::from_base64("AGEAYgEAAGM=").unwrap();
    let prompt = vocab.tokenize_ids(b"abcab", &TokenizeOptions::default());
    assert_eq!(prompt, vec![257, 256]);

    let server = CyclingServer::with_delay(Duration::from_millis(2));
    let session = InferenceSession::start(
        server.clone(),
        "causal1",
        prompt,
        InferenceConfig::default().with_num_tokens(5),
        CancellationToken::new(),
    );

    let batches: Vec<Vec<TokenId>> = session.try_collect().await.unwrap();
    assert_eq!(
        batches,
        vec![vec![257, 256], vec![257, 256], vec![257], vec![]]
    );

    let text = vocab.decode(&batches.concat()).unwrap();
    assert_eq!(text, b"abcababcababc");
    assert_eq!(server.closes(), 1);
}

#[tokio::test]
async fn test_cancel_while_streaming() {
    let server = CyclingServer::with_delay(Duration::from_millis(2));
    let cancel = CancellationToken::new();
    let mut session = InferenceSession::start(
        server.clone(),
        "causal1",
        vec![1, 2, 3],
        InferenceConfig::default().with_num_tokens(1000),
        cancel.clone(),
    );

    assert_eq!(session.next().await.unwrap().unwrap(), vec![1, 2]);
    assert_eq!(session.state(), SessionState::StreamingTokens);

    cancel.cancel();
    assert!(session.next().await.is_none());
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(server.closes(), 1);
}

#[tokio::test]
async fn test_drop_while_parked() {
    let server = CyclingServer::with_delay(Duration::from_millis(50));
    let mut session = InferenceSession::start(
        server.clone(),
        "causal1",
        vec![7],
        InferenceConfig::default().with_num_tokens(10),
        CancellationToken::new(),
    );

    // Park the session on its inbox, then abandon it.
    assert!(
        tokio::time::timeout(Duration::from_millis(5), session.next())
            .await
            .is_err()
    );
    drop(session);

    assert_eq!(server.closes(), 1);
}
