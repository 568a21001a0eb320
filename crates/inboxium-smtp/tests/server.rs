//! Integration tests for the SMTP listener.
//!
//! These tests bind a real socket on 127.0.0.1 and speak SMTP over TCP.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use inboxium_smtp::parser::{is_last_reply_line, parse_reply};
use inboxium_smtp::{Envelope, Extension, Reply, ReplyCode, Server, ServerConfig, SessionHandler};

const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Stores every delivered envelope.
#[derive(Default)]
struct Mailbox {
    messages: Mutex<Vec<Envelope>>,
}

impl SessionHandler for Mailbox {
    async fn on_data(&self, envelope: &Envelope) -> Reply {
        self.messages.lock().unwrap().push(envelope.clone());
        Reply::single(ReplyCode::OK, "Message accepted for delivery")
    }
}

struct Running {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<inboxium_smtp::Result<()>>,
}

async fn start_server(handler: Arc<Mailbox>) -> Running {
    let config = ServerConfig::builder("127.0.0.1")
        .hostname("mx.integration.test")
        .port(0)
        .build();
    let server = Server::bind(config).await.unwrap();
    let addr = server.local_addr().unwrap();
    let (shutdown, signal) = oneshot::channel::<()>();

    let task = tokio::spawn(server.serve_with_shutdown(handler, async {
        let _ = signal.await;
    }));

    Running {
        addr,
        shutdown,
        task,
    }
}

struct Client {
    reader: BufReader<TcpStream>,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        Self {
            reader: BufReader::new(stream),
        }
    }

    async fn reply(&mut self) -> Reply {
        let mut lines = Vec::new();
        loop {
            let mut line = String::new();
            self.reader.read_line(&mut line).await.unwrap();
            let line = line.trim_end().to_string();
            let last = is_last_reply_line(&line);
            lines.push(line);
            if last {
                return parse_reply(&lines).unwrap();
            }
        }
    }

    async fn command(&mut self, line: &str) -> Reply {
        self.reader
            .get_mut()
            .write_all(format!("{line}\r\n").as_bytes())
            .await
            .unwrap();
        self.reply().await
    }
}

#[tokio::test]
async fn delivers_message_over_tcp() {
    timeout(TEST_TIMEOUT, async {
        let mailbox = Arc::new(Mailbox::default());
        let running = start_server(Arc::clone(&mailbox)).await;
        let mut client = Client::connect(running.addr).await;

        let greeting = client.reply().await;
        assert_eq!(greeting.code, ReplyCode::SERVICE_READY);
        assert_eq!(greeting.message_text(), "mx.integration.test ESMTP Inboxium");

        let ehlo = client.command("EHLO client.test").await;
        assert!(ehlo.is_success());
        let extensions: Vec<Extension> = ehlo.message[1..]
            .iter()
            .map(String::as_str)
            .map(Extension::parse)
            .collect();
        assert!(extensions.contains(&Extension::EightBitMime));
        assert!(extensions.contains(&Extension::Pipelining));
        assert!(extensions.contains(&Extension::SmtpUtf8));
        assert!(extensions.contains(&Extension::Size(Some(32 * 1024 * 1024))));

        assert!(client.command("MAIL FROM:<bob@example.com>").await.is_success());
        assert!(client.command("RCPT TO:<alice@example.com>").await.is_success());
        assert_eq!(client.command("DATA").await.code, ReplyCode::START_DATA);
        let done = client
            .command("From: bob@example.com\r\nSubject: hello\r\n\r\nhi\r\n.")
            .await;
        assert_eq!(done.message_text(), "Message accepted for delivery");
        assert_eq!(client.command("QUIT").await.code, ReplyCode::CLOSING);

        let messages = mailbox.messages.lock().unwrap().clone();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].mail_from, "bob@example.com");
        assert_eq!(messages[0].rcpt_tos, vec!["alice@example.com"]);
        assert_eq!(
            &messages[0].content[..],
            b"From: bob@example.com\r\nSubject: hello\r\n\r\nhi\r\n"
        );

        running.shutdown.send(()).unwrap();
        running.task.await.unwrap().unwrap();
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn serves_sessions_concurrently() {
    timeout(TEST_TIMEOUT, async {
        let mailbox = Arc::new(Mailbox::default());
        let running = start_server(Arc::clone(&mailbox)).await;

        let mut first = Client::connect(running.addr).await;
        let mut second = Client::connect(running.addr).await;
        first.reply().await;
        second.reply().await;

        for (client, sender) in [(&mut first, "one@example.com"), (&mut second, "two@example.com")] {
            client.command("HELO client.test").await;
            client.command(&format!("MAIL FROM:<{sender}>")).await;
            client.command("RCPT TO:<alice@example.com>").await;
            client.command("DATA").await;
        }

        // Finish in the opposite order
        assert!(second.command("Subject: two\r\n\r\n2\r\n.").await.is_success());
        assert!(first.command("Subject: one\r\n\r\n1\r\n.").await.is_success());

        let senders: Vec<String> = mailbox
            .messages
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.mail_from.clone())
            .collect();
        assert_eq!(senders, vec!["two@example.com", "one@example.com"]);

        running.shutdown.send(()).unwrap();
        running.task.await.unwrap().unwrap();
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn stops_accepting_after_shutdown() {
    timeout(TEST_TIMEOUT, async {
        let running = start_server(Arc::new(Mailbox::default())).await;
        let addr = running.addr;

        running.shutdown.send(()).unwrap();
        running.task.await.unwrap().unwrap();

        assert!(TcpStream::connect(addr).await.is_err());
    })
    .await
    .unwrap();
}
