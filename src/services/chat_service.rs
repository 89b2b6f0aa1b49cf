// src/services/chat_service.rs

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::{
    sync::{broadcast, mpsc, watch},
    task::JoinHandle,
};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use crate::{
    common::error::{AppError, AppResult},
    models::chat::ChatMessage,
    session::SessionContext,
};

// Mensagens recentes para quem assina o canal depois de conectado
const BROADCAST_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Reconnecting,
    Closed,
}

#[derive(Debug, Clone)]
pub struct ChatService {
    ws_base: Url,
    session: SessionContext,
    reconnect_delay: Duration,
}

impl ChatService {
    pub fn new(ws_base: Url, session: SessionContext, reconnect_delay: Duration) -> Self {
        Self { ws_base, session, reconnect_delay }
    }

    /// URL de conexão: `{base}/ws/chat/{room}/?token=...`
    pub fn room_url(&self, room: &str, token: &str) -> AppResult<Url> {
        let base = format!("{}/", self.ws_base.as_str().trim_end_matches('/'));
        let mut url = Url::parse(&base)?.join(&format!("ws/chat/{}/", room))?;
        url.query_pairs_mut().append_pair("token", token);
        Ok(url)
    }

    /// Abre o canal da sala. A conexão roda numa task própria e se refaz
    /// sozinha até `close()`.
    pub async fn open(&self, room: &str) -> AppResult<ChatChannel> {
        let session = self.session.get().await.ok_or(AppError::Unauthorized)?;
        let url = self.room_url(room, &session.token)?;
        let author = session
            .user
            .as_ref()
            .map(|u| u.display_name().to_string())
            .unwrap_or_else(|| "anônimo".to_string());

        tracing::info!("Abrindo chat da sala '{}'", room);
        Ok(ChatChannel::spawn(url, author, self.reconnect_delay))
    }
}

/// Canal de chat aberto. O histórico só cresce, na ordem de chegada.
pub struct ChatChannel {
    author: String,
    log: Arc<RwLock<Vec<ChatMessage>>>,
    events: broadcast::Sender<ChatMessage>,
    outgoing: mpsc::UnboundedSender<ChatMessage>,
    state: watch::Receiver<ConnectionState>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ChatChannel {
    fn spawn(url: Url, author: String, reconnect_delay: Duration) -> Self {
        let log = Arc::new(RwLock::new(Vec::new()));
        let (events, _) = broadcast::channel(BROADCAST_CAPACITY);
        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(ConnectionState::Connecting);
        let (shutdown, shutdown_rx) = watch::channel(false);

        let worker = ConnectionWorker {
            url,
            reconnect_delay,
            log: Arc::clone(&log),
            events: events.clone(),
            outgoing: outgoing_rx,
            state: state_tx,
            shutdown: shutdown_rx,
        };
        let task = tokio::spawn(worker.run());

        Self { author, log, events, outgoing, state, shutdown, task }
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    /// Envia em nome do usuário logado. A mensagem só entra no histórico
    /// quando o servidor a devolve para a sala.
    pub fn send(&self, text: impl Into<String>) -> AppResult<()> {
        let message = ChatMessage::new(self.author.clone(), text);
        self.outgoing.send(message).map_err(|_| AppError::ChannelClosed)
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.log.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatMessage> {
        self.events.subscribe()
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Encerra a conexão e espera a task terminar.
    pub async fn close(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!("Task do chat terminou com erro: {}", e);
        }
    }
}

struct ConnectionWorker {
    url: Url,
    reconnect_delay: Duration,
    log: Arc<RwLock<Vec<ChatMessage>>>,
    events: broadcast::Sender<ChatMessage>,
    outgoing: mpsc::UnboundedReceiver<ChatMessage>,
    state: watch::Sender<ConnectionState>,
    shutdown: watch::Receiver<bool>,
}

enum SessionEnd {
    Dropped,
    Shutdown,
}

impl ConnectionWorker {
    async fn run(mut self) {
        let mut attempt: u32 = 0;

        while !*self.shutdown.borrow() {
            attempt += 1;
            let _ = self.state.send(if attempt == 1 {
                ConnectionState::Connecting
            } else {
                ConnectionState::Reconnecting
            });

            match connect_async(self.url.as_str()).await {
                Ok((socket, _)) => {
                    tracing::info!("✅ Chat conectado ({}ª tentativa)", attempt);
                    let _ = self.state.send(ConnectionState::Connected);
                    if let SessionEnd::Shutdown = self.pump(socket).await {
                        break;
                    }
                    tracing::warn!("Conexão do chat caiu, reconectando em {:?}", self.reconnect_delay);
                }
                Err(e) => {
                    tracing::warn!("Falha ao conectar no chat: {}", e);
                }
            }

            let _ = self.state.send(ConnectionState::Reconnecting);
            tokio::select! {
                _ = tokio::time::sleep(self.reconnect_delay) => {}
                _ = self.shutdown.changed() => break,
            }
        }

        let _ = self.state.send(ConnectionState::Closed);
        tracing::info!("Chat encerrado");
    }

    async fn pump<S>(&mut self, socket: S) -> SessionEnd
    where
        S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
            + futures::Sink<Message, Error = tokio_tungstenite::tungstenite::Error>
            + Unpin,
    {
        let (mut sink, mut stream) = socket.split();

        loop {
            tokio::select! {
                _ = self.shutdown.changed() => {
                    let _ = sink.send(Message::Close(None)).await;
                    return SessionEnd::Shutdown;
                }
                Some(message) = self.outgoing.recv() => {
                    let text = match serde_json::to_string(&message) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::error!("🔥 Mensagem de chat não serializável: {}", e);
                            continue;
                        }
                    };
                    if let Err(e) = sink.send(Message::text(text)).await {
                        tracing::warn!("Falha ao enviar mensagem no chat: {}", e);
                        return SessionEnd::Dropped;
                    }
                }
                incoming = stream.next() => match incoming {
                    Some(Ok(Message::Text(text))) => self.record(text.as_str()),
                    Some(Ok(Message::Close(_))) | None => return SessionEnd::Dropped,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!("Erro na conexão do chat: {}", e);
                        return SessionEnd::Dropped;
                    }
                },
            }
        }
    }

    fn record(&self, raw: &str) {
        match serde_json::from_str::<ChatMessage>(raw) {
            Ok(message) => {
                self.log
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(message.clone());
                // Sem assinantes não é erro
                let _ = self.events.send(message);
            }
            Err(e) => tracing::warn!("Mensagem de chat ignorada ({}): {}", e, raw),
        }
    }
}
