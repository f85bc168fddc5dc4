//! Integration tests for the IMAP client.
//!
//! These tests use a mock stream to simulate IMAP server responses
//! without requiring a real server connection.

use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use mailvault_imap::{
    Client, Credentials, Error, FetchItem, FetchItems, Flag, SearchCriteria, Selection, Uid,
    UidSet,
};

/// Mock stream that returns predefined responses.
struct MockStream {
    /// Responses to return (in order).
    responses: Cursor<Vec<u8>>,
    /// Captured commands sent by the client.
    sent: Arc<Mutex<Vec<u8>>>,
}

impl MockStream {
    fn new(responses: &[u8]) -> (Self, Arc<Mutex<Vec<u8>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let stream = Self {
            responses: Cursor::new(responses.to_vec()),
            sent: Arc::clone(&sent),
        };
        (stream, sent)
    }
}

impl AsyncRead for MockStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let data = self.responses.get_ref();
        let pos = self.responses.position() as usize;

        if pos >= data.len() {
            return Poll::Ready(Ok(()));
        }

        let remaining = &data[pos..];
        let to_read = remaining.len().min(buf.remaining());
        buf.put_slice(&remaining[..to_read]);
        self.responses.set_position((pos + to_read) as u64);

        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.sent.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

fn sent_text(sent: &Arc<Mutex<Vec<u8>>>) -> String {
    String::from_utf8_lossy(&sent.lock().unwrap()).into_owned()
}

#[tokio::test]
async fn test_backup_conversation() {
    let script = b"* OK [CAPABILITY IMAP4rev1 UIDPLUS AUTH=XOAUTH2] Ready\r\n\
        A0000 OK [CAPABILITY IMAP4rev1 UIDPLUS SPECIAL-USE] Logged in\r\n\
        * FLAGS (\\Answered \\Flagged \\Deleted \\Seen \\Draft)\r\n\
        * 2 EXISTS\r\n\
        * 0 RECENT\r\n\
        * OK [UIDVALIDITY 1700000000] UIDs valid\r\n\
        * OK [UIDNEXT 43] Predicted next UID\r\n\
        A0001 OK [READ-ONLY] Examine completed\r\n\
        * SEARCH 42 7\r\n\
        A0002 OK Search completed\r\n\
        * 1 FETCH (UID 7 FLAGS (\\Seen) INTERNALDATE \"05-Mar-2024 10:00:00 +0000\" RFC822.SIZE 11 BODY[] {11}\r\n\
        Hello world)\r\n\
        A0003 OK Fetch completed\r\n";

    let (stream, sent) = MockStream::new(script);
    let client = Client::from_stream(stream).await.unwrap();
    assert!(client.supports_auth("xoauth2"));

    let client = client
        .authenticate(&Credentials::password("user@example.com", "hunter2"))
        .await
        .unwrap();
    assert!(
        client
            .capabilities()
            .contains(&mailvault_imap::Capability::SpecialUse)
    );

    let Selection::Selected(mut client) = client.examine("INBOX").await.unwrap() else {
        panic!("examine rejected");
    };
    let status = client.selected().status();
    assert_eq!(status.exists, 2);
    assert!(status.read_only);
    assert_eq!(status.uid_validity.map(|v| v.get()), Some(1_700_000_000));
    assert_eq!(status.uid_next.map(Uid::get), Some(43));
    assert_eq!(client.selected().mailbox().as_str(), "INBOX");

    let uids = client.uid_search(&SearchCriteria::All).await.unwrap();
    assert_eq!(uids.iter().map(|u| u.get()).collect::<Vec<_>>(), vec![7, 42]);

    let set = UidSet::single(uids[0]);
    let fetched = client
        .uid_fetch(&set, FetchItems::full_message())
        .await
        .unwrap();
    assert_eq!(fetched.len(), 1);
    let body = fetched[0].1.iter().find_map(|item| match item {
        FetchItem::Body { data, .. } => data.clone(),
        _ => None,
    });
    assert_eq!(body.as_deref(), Some(&b"Hello world"[..]));

    let wire = sent_text(&sent);
    assert!(wire.contains("A0000 LOGIN user@example.com hunter2\r\n"));
    assert!(wire.contains("A0001 EXAMINE INBOX\r\n"));
    assert!(wire.contains("A0002 UID SEARCH ALL\r\n"));
    assert!(wire.contains("A0003 UID FETCH 7 (UID FLAGS INTERNALDATE RFC822.SIZE BODY.PEEK[])\r\n"));
}

#[tokio::test]
async fn test_rejected_examine_keeps_connection() {
    let script = b"* OK Ready\r\n\
        A0000 OK Logged in\r\n\
        A0001 NO [NONEXISTENT] Unknown Mailbox: Gone\r\n\
        * LIST (\\HasNoChildren) \"/\" \"INBOX\"\r\n\
        A0002 OK List completed\r\n";

    let (stream, _sent) = MockStream::new(script);
    let client = Client::from_stream(stream)
        .await
        .unwrap()
        .login("user", "pass")
        .await
        .unwrap();

    let Selection::Rejected(mut client, err) = client.examine("Gone").await.unwrap() else {
        panic!("expected rejection");
    };
    assert!(matches!(err, Error::NonExistent(_)));

    let folders = client.list("", "*").await.unwrap();
    assert_eq!(folders.len(), 1);
    assert!(folders[0].mailbox.is_inbox());
}

#[tokio::test]
async fn test_append_waits_for_continuation() {
    let message = b"Subject: hi\r\n\r\nbody\r\n";
    let script = b"* OK Ready\r\n\
        A0000 OK Logged in\r\n\
        + Ready for literal data\r\n\
        A0001 OK [APPENDUID 1700000000 99] Append completed\r\n";

    let (stream, sent) = MockStream::new(script);
    let mut client = Client::from_stream(stream)
        .await
        .unwrap()
        .login("user", "pass")
        .await
        .unwrap();

    let uid = client
        .append("Archive", &[Flag::Seen, Flag::Recent], None, message)
        .await
        .unwrap();
    assert_eq!(uid.map(Uid::get), Some(99));

    let wire = sent_text(&sent);
    let expected = format!(
        "A0001 APPEND Archive (\\Seen) {{{}}}\r\nSubject: hi\r\n\r\nbody\r\n\r\n",
        message.len()
    );
    assert!(wire.ends_with(&expected), "wire was {wire:?}");
}

#[tokio::test]
async fn test_append_refused_before_literal() {
    let script = b"* OK Ready\r\n\
        A0000 OK Logged in\r\n\
        A0001 NO [TRYCREATE] No such mailbox\r\n";

    let (stream, sent) = MockStream::new(script);
    let mut client = Client::from_stream(stream)
        .await
        .unwrap()
        .login("user", "pass")
        .await
        .unwrap();

    let result = client.append("Missing", &[], None, b"x").await;
    assert!(matches!(result, Err(Error::No(_))));
    assert!(!sent_text(&sent).ends_with("x\r\n"));
}

#[tokio::test]
async fn test_xoauth2_failure_answers_challenge() {
    let script = b"* OK [CAPABILITY IMAP4rev1 AUTH=XOAUTH2] Ready\r\n\
        + eyJzdGF0dXMiOiI0MDAifQ==\r\n\
        A0000 NO [AUTHENTICATIONFAILED] Invalid credentials\r\n";

    let (stream, sent) = MockStream::new(script);
    let client = Client::from_stream(stream).await.unwrap();
    let result = client
        .authenticate(&Credentials::oauth2("user@example.com", "expired"))
        .await;

    assert!(matches!(result, Err(Error::Auth(_))));
    let wire = sent_text(&sent);
    assert!(wire.starts_with("A0000 AUTHENTICATE XOAUTH2 "));
    assert!(wire.ends_with("\r\n\r\n"));
}

#[tokio::test]
async fn test_login_rejected_is_auth_error() {
    let script = b"* OK Ready\r\nA0000 NO Invalid credentials\r\n";
    let (stream, _sent) = MockStream::new(script);
    let result = Client::from_stream(stream)
        .await
        .unwrap()
        .login("user", "wrong")
        .await;
    assert!(matches!(result, Err(Error::Auth(_))));
}

#[tokio::test]
async fn test_bye_greeting_is_an_error() {
    let (stream, _sent) = MockStream::new(b"* BYE Too many connections\r\n");
    let result = Client::from_stream(stream).await;
    assert!(matches!(result, Err(Error::Bye(_))));
}

#[tokio::test]
async fn test_connection_closed_mid_command() {
    let script = b"* OK Ready\r\nA0000 OK Logged in\r\n* 3 EXISTS\r\n";
    let (stream, _sent) = MockStream::new(script);
    let mut client = Client::from_stream(stream)
        .await
        .unwrap()
        .login("user", "pass")
        .await
        .unwrap();

    let err = client.list("", "*").await.unwrap_err();
    assert!(err.is_transient());
}
