//! Twitch IRC transport.
//!
//! [`TwitchTransport::connect`] spawns one task per connection. The task
//! logs in, joins the channel and then multiplexes two inputs:
//!
//! - **Inbound**: lines from the server, turned into lifecycle and message
//!   events for the engine
//! - **Outbound**: `say` and `disconnect` requests from the engine
//!
//! When the task ends for any reason it reports `Disconnected`. There is
//! no automatic reconnect.

use queuebot_core::chat::{
    ChatCredentials, ChatError, ChatEventSender, ChatTransport, IncomingMessage,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::TwitchError;
use crate::message::IrcMessage;

/// Capabilities requested after login.
const CAPABILITIES: &str = "twitch.tv/tags twitch.tv/commands";

/// Requests from the engine to the connection task.
#[derive(Debug)]
enum Outbound {
    Say { channel: String, text: String },
    Quit,
}

/// What the read loop should do after a server line.
enum Flow {
    Continue,
    Stop,
}

/// [`ChatTransport`] over Twitch IRC.
#[derive(Debug)]
pub struct TwitchTransport {
    addr: String,
    outbound: Option<mpsc::UnboundedSender<Outbound>>,
    task: Option<JoinHandle<()>>,
}

impl TwitchTransport {
    /// Create a transport for the chat server at `host:port`.
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            addr: format!("{host}:{port}"),
            outbound: None,
            task: None,
        }
    }
}

impl ChatTransport for TwitchTransport {
    fn connect(
        &mut self,
        credentials: &ChatCredentials,
        channel: &str,
        events: ChatEventSender,
    ) -> Result<(), ChatError> {
        if self.outbound.as_ref().is_some_and(|tx| !tx.is_closed()) {
            return Err(ChatError::Connect(String::from("already connected")));
        }
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| ChatError::Connect(e.to_string()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let connection = Connection {
            addr: self.addr.clone(),
            credentials: credentials.clone(),
            channel: channel.to_owned(),
            events,
        };
        self.task = Some(handle.spawn(connection.run(rx)));
        self.outbound = Some(tx);
        Ok(())
    }

    fn say(&mut self, channel: &str, text: &str) -> Result<(), ChatError> {
        let tx = self.outbound.as_ref().ok_or(ChatError::NotConnected)?;
        tx.send(Outbound::Say {
            channel: channel.to_owned(),
            text: text.to_owned(),
        })
        .map_err(|_closed| ChatError::Closed)
    }

    fn disconnect(&mut self) {
        if let Some(tx) = self.outbound.take() {
            // The task may already be gone; nothing to do then.
            let _ = tx.send(Outbound::Quit);
        }
        // Detach: the task writes QUIT and exits on its own.
        self.task = None;
    }
}

/// One connection attempt and its read/write loop.
struct Connection {
    addr: String,
    credentials: ChatCredentials,
    channel: String,
    events: ChatEventSender,
}

impl Connection {
    async fn run(self, outbound: mpsc::UnboundedReceiver<Outbound>) {
        let session = self.events.session();
        match self.serve(outbound).await {
            Ok(()) => info!(session, channel = %self.channel, "Chat connection closed"),
            Err(e) => warn!(session, channel = %self.channel, error = %e, "Chat connection ended"),
        }
        self.events.disconnected().await;
    }

    async fn serve(
        &self,
        mut outbound: mpsc::UnboundedReceiver<Outbound>,
    ) -> Result<(), TwitchError> {
        debug!(addr = %self.addr, "Opening chat connection");
        let stream = TcpStream::connect(&self.addr).await?;
        let (read_half, write_half) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();
        let mut writer = BufWriter::new(write_half);

        let username = self.credentials.username.to_lowercase();
        send_line(&mut writer, &format!("PASS {}", oauth_token(&self.credentials.token))).await?;
        send_line(&mut writer, &format!("NICK {username}")).await?;
        send_line(&mut writer, &format!("CAP REQ :{CAPABILITIES}")).await?;
        send_line(&mut writer, &format!("JOIN #{}", self.channel)).await?;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        debug!("Chat server closed the connection");
                        return Ok(());
                    };
                    if let Flow::Stop = self.on_line(&line, &mut writer).await? {
                        return Ok(());
                    }
                }
                request = outbound.recv() => match request {
                    Some(Outbound::Say { channel, text }) => {
                        let text = sanitize(&text);
                        send_line(&mut writer, &format!("PRIVMSG #{channel} :{text}")).await?;
                    }
                    Some(Outbound::Quit) | None => {
                        // Best effort: the socket is dropped right after.
                        let _ = send_line(&mut writer, "QUIT").await;
                        return Ok(());
                    }
                },
            }
        }
    }

    async fn on_line(
        &self,
        line: &str,
        writer: &mut BufWriter<OwnedWriteHalf>,
    ) -> Result<Flow, TwitchError> {
        let message = match IrcMessage::parse(line) {
            Ok(message) => message,
            Err(e) => {
                debug!(error = %e, "Skipping unparseable chat line");
                return Ok(Flow::Continue);
            }
        };

        match message.command.as_str() {
            "PING" => {
                let token = message.trailing().unwrap_or("tmi.twitch.tv");
                send_line(writer, &format!("PONG :{token}")).await?;
            }
            "001" => {
                if !self.events.connected().await {
                    return Ok(Flow::Stop);
                }
            }
            "PRIVMSG" => {
                if let Some(incoming) = incoming_message(&message, &self.credentials.username) {
                    if !self.events.message(incoming).await {
                        return Ok(Flow::Stop);
                    }
                }
            }
            "NOTICE" => {
                let text = message.trailing().unwrap_or_default();
                if text.contains("authentication failed") || text.contains("Improperly formatted auth") {
                    return Err(TwitchError::Auth(text.to_owned()));
                }
                info!(notice = text, "Chat notice");
            }
            "RECONNECT" => return Err(TwitchError::ReconnectRequested),
            other => debug!(command = other, "Ignoring chat line"),
        }
        Ok(Flow::Continue)
    }
}

/// Build an [`IncomingMessage`] from a PRIVMSG.
///
/// The sender is the `display-name` tag, falling back to the prefix nick.
/// Moderators (`mod=1`) and the broadcaster (`broadcaster/` badge) are
/// elevated. Lines from the bot's own login are flagged as self messages.
pub fn incoming_message(message: &IrcMessage, bot_username: &str) -> Option<IncomingMessage> {
    let nick = message.nick()?;
    let text = message.trailing()?;
    let sender = message
        .tag("display-name")
        .filter(|name| !name.is_empty())
        .unwrap_or(nick);
    let elevated = message.tag("mod") == Some("1")
        || message
            .tag("badges")
            .is_some_and(|badges| badges.split(',').any(|b| b.starts_with("broadcaster/")));
    Some(IncomingMessage {
        sender: sender.to_owned(),
        text: text.to_owned(),
        elevated,
        self_message: nick.eq_ignore_ascii_case(bot_username),
    })
}

/// Token as sent in `PASS`, with the `oauth:` prefix added when absent.
pub fn oauth_token(token: &str) -> String {
    let token = token.trim();
    if token.starts_with("oauth:") {
        token.to_owned()
    } else {
        format!("oauth:{token}")
    }
}

/// Replace CR and LF so a reply cannot inject extra IRC lines.
fn sanitize(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

async fn send_line(writer: &mut BufWriter<OwnedWriteHalf>, line: &str) -> std::io::Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\r\n").await?;
    writer.flush().await
}
