//! Terminal output and the confirmation prompt.

use std::io::{self, BufRead, Write};

use mailvault_core::{Error, Notifier};

/// Writes progress and skipped items to stderr.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn on_progress(&self, folder: &str, index: usize, total: usize) {
        let mut err = io::stderr().lock();
        let _ = write!(err, "\r{folder}: {index}/{total}");
        if index >= total {
            let _ = writeln!(err);
        }
        let _ = err.flush();
    }

    fn on_error(&self, context: &str, error: &Error) {
        eprintln!("\n{context}: {error}");
    }

    fn on_new_version_available(&self, version: &str) {
        eprintln!("mailvault {version} is available");
    }
}

/// Asks the user to type `user` back before a destructive operation.
///
/// # Errors
///
/// Only I/O errors on the terminal.
pub fn confirm_clear(user: &str, input: &mut impl BufRead, output: &mut impl Write) -> io::Result<bool> {
    writeln!(output, "This deletes every message and folder of {user}.")?;
    write!(output, "Type the account name to continue: ")?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim() == user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_echoes_the_account() {
        let mut output = Vec::new();
        let confirmed =
            confirm_clear("me@example.com", &mut &b"me@example.com\n"[..], &mut output).unwrap();
        assert!(confirmed);
        assert!(String::from_utf8(output).unwrap().contains("me@example.com"));
    }

    #[test]
    fn anything_else_declines() {
        let mut output = Vec::new();
        assert!(!confirm_clear("me@example.com", &mut &b"yes\n"[..], &mut output).unwrap());
        assert!(!confirm_clear("me@example.com", &mut &b""[..], &mut output).unwrap());
    }
}
