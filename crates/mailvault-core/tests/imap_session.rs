//! `ImapSession` retry and reconnect against a scripted IMAP server.
//!
//! The server runs on a loopback socket so that reconnects open real new
//! connections; each connection is numbered from 1.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mailvault_core::{DateRange, Error, FetchResult, ImapSession, MailSession, RetryPolicy};
use mailvault_imap::{Config, Credentials, Flag, Security};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// What the server does with one command.
enum Reply {
    /// Untagged lines, then a tagged OK.
    Ok(Vec<String>),
    /// A tagged NO with this text.
    No(&'static str),
    /// Close the connection without answering.
    HangUp,
}

type Script = Arc<dyn Fn(usize, &str) -> Reply + Send + Sync>;

const BODY: &str = "Subject: hi\r\n\r\nhello\r\n";

struct Server {
    port: u16,
    connections: Arc<AtomicUsize>,
    commands: Arc<Mutex<Vec<(usize, String)>>>,
}

impl Server {
    /// Serves every connection with `script(connection, command)`. The
    /// greeting is asked for as the command `GREETING`.
    async fn start(script: impl Fn(usize, &str) -> Reply + Send + Sync + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let connections = Arc::new(AtomicUsize::new(0));
        let commands = Arc::new(Mutex::new(Vec::new()));
        let script: Script = Arc::new(script);

        let counter = Arc::clone(&connections);
        let log = Arc::clone(&commands);
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                tokio::spawn(converse(socket, n, Arc::clone(&script), Arc::clone(&log)));
            }
        });

        Self {
            port,
            connections,
            commands,
        }
    }

    fn session(&self, max_attempts: u32) -> ImapSession {
        let config = Config::builder("127.0.0.1")
            .security(Security::None)
            .port(self.port)
            .connect_timeout(Duration::from_secs(5))
            .command_timeout(Duration::from_secs(5))
            .build();
        let retry = RetryPolicy {
            max_attempts,
            base_delay_ms: 0,
            max_delay_ms: 0,
        };
        ImapSession::new(config, retry)
    }

    fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    fn commands_on(&self, connection: usize) -> Vec<String> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .filter(|(n, _)| *n == connection)
            .map(|(_, c)| c.clone())
            .collect()
    }
}

async fn converse(
    socket: TcpStream,
    n: usize,
    script: Script,
    log: Arc<Mutex<Vec<(usize, String)>>>,
) {
    let (read, mut write) = socket.into_split();
    if matches!(script(n, "GREETING"), Reply::HangUp) {
        return;
    }
    if write
        .write_all(b"* OK [CAPABILITY IMAP4rev1] ready\r\n")
        .await
        .is_err()
    {
        return;
    }

    let mut lines = BufReader::new(read).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let Some((tag, command)) = line.split_once(' ') else {
            return;
        };
        log.lock().unwrap().push((n, command.to_string()));

        let mut out = String::new();
        match script(n, command) {
            Reply::Ok(untagged) => {
                for response in untagged {
                    out.push_str(&response);
                    out.push_str("\r\n");
                }
                out.push_str(&format!("{tag} OK done\r\n"));
            }
            Reply::No(text) => out.push_str(&format!("{tag} NO {text}\r\n")),
            Reply::HangUp => return,
        }
        if write.write_all(out.as_bytes()).await.is_err() {
            return;
        }
    }
}

/// A well-behaved server holding UID 5 in INBOX.
fn mailbox(command: &str) -> Reply {
    if command.starts_with("EXAMINE") || command.starts_with("SELECT") {
        Reply::Ok(vec![
            "* 1 EXISTS".to_string(),
            "* OK [UIDVALIDITY 7] UIDs valid".to_string(),
        ])
    } else if command.starts_with("UID SEARCH") {
        Reply::Ok(vec!["* SEARCH 5".to_string()])
    } else if command.starts_with("UID FETCH") {
        Reply::Ok(vec![format!(
            "* 1 FETCH (UID 5 FLAGS (\\Seen) INTERNALDATE \"05-Mar-2024 10:00:00 +0000\" \
             RFC822.SIZE {len} BODY[] {{{len}}}\r\n{BODY})",
            len = BODY.len()
        )])
    } else {
        Reply::Ok(Vec::new())
    }
}

async fn logged_in(server: &Server, max_attempts: u32) -> ImapSession {
    let mut session = server.session(max_attempts);
    session.connect().await.unwrap();
    session
        .login(&Credentials::password("me@example.com", "secret"))
        .await
        .unwrap();
    session.select_read_only("INBOX").await.unwrap();
    session
}

#[tokio::test]
async fn dropped_fetch_reconnects_and_fetches_the_same_uid() {
    let server = Server::start(|n, command| {
        if n == 1 && command.starts_with("UID FETCH") {
            Reply::HangUp
        } else {
            mailbox(command)
        }
    })
    .await;
    let mut session = logged_in(&server, 3).await;

    let FetchResult::Fetched(message) = session.fetch(5).await.unwrap() else {
        panic!("expected the message after reconnecting");
    };
    assert_eq!(message.uid, 5);
    assert_eq!(message.flags, vec![Flag::Seen]);
    assert_eq!(message.content, BODY.as_bytes());

    assert_eq!(server.connections(), 2);
    let second = server.commands_on(2);
    assert!(second[0].starts_with("LOGIN"), "{second:?}");
    assert_eq!(second[1], "EXAMINE INBOX");
    assert!(second[2].starts_with("UID FETCH 5 "), "{second:?}");
}

#[tokio::test]
async fn exhausted_retries_skip_the_message_and_keep_the_session() {
    let server = Server::start(|_, command| {
        if command.starts_with("UID FETCH") {
            Reply::HangUp
        } else {
            mailbox(command)
        }
    })
    .await;
    let mut session = logged_in(&server, 2).await;

    let result = session.fetch(5).await.unwrap();
    assert!(
        matches!(&result, FetchResult::Skipped(reason) if reason.contains("2 attempts")),
        "{result:?}"
    );
    // One retry, plus a fresh connection left for the next message.
    assert_eq!(server.connections(), 3);

    assert_eq!(session.search(&DateRange::all()).await.unwrap(), vec![5]);
    assert_eq!(server.commands_on(3).last().unwrap(), "UID SEARCH ALL");
}

#[tokio::test]
async fn refused_login_on_reconnect_is_fatal() {
    let server = Server::start(|n, command| {
        if n > 1 && command.starts_with("LOGIN") {
            Reply::No("[AUTHENTICATIONFAILED] Invalid credentials")
        } else if command.starts_with("UID FETCH") {
            Reply::HangUp
        } else {
            mailbox(command)
        }
    })
    .await;
    let mut session = logged_in(&server, 4).await;

    let err = session.fetch(5).await.unwrap_err();
    assert!(matches!(err, Error::Auth(_)), "{err:?}");
    assert!(err.is_fatal());
    assert_eq!(server.connections(), 2);
}

#[tokio::test]
async fn unreachable_server_on_reconnect_is_fatal() {
    let server = Server::start(|n, command| {
        if n > 1 || command.starts_with("UID FETCH") {
            Reply::HangUp
        } else {
            mailbox(command)
        }
    })
    .await;
    let mut session = logged_in(&server, 2).await;

    let err = session.fetch(5).await.unwrap_err();
    assert!(matches!(err, Error::Connection(_)), "{err:?}");
    assert!(err.is_fatal());
    assert_eq!(server.connections(), 3);
}
