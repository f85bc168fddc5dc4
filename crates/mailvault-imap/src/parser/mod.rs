//! Sans-I/O parser for server responses.
//!
//! [`Lexer`] splits one response into tokens and [`ResponseParser`] builds a
//! [`Response`] from them. The caller is responsible for handing over a
//! complete response including every literal it announces; see
//! [`crate::connection::FramedStream`].
//!
//! ```
//! use mailvault_imap::parser::{Response, ResponseParser, UntaggedResponse};
//!
//! let response = ResponseParser::parse(b"* 3 EXISTS\r\n").unwrap();
//! assert_eq!(response, Response::Untagged(UntaggedResponse::Exists(3)));
//! ```

pub mod lexer;
pub mod response;

pub use lexer::{Lexer, Token};
pub use response::{FetchItem, Response, ResponseParser, StatusItem, UntaggedResponse};
