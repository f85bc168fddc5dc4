//! Commands that need an open mailbox.

use tokio::io::{AsyncRead, AsyncWrite};

use super::Client;
use super::states::{Authenticated, Selected};
use crate::Result;
use crate::command::{Command, FetchItems, SearchCriteria, StoreAction};
use crate::parser::{FetchItem, UntaggedResponse};
use crate::types::{SeqNum, Uid, UidSet};

impl<S> Client<S, Selected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// The open mailbox and its status.
    #[must_use]
    pub const fn selected(&self) -> &Selected {
        &self.state
    }

    /// `UID SEARCH`; UIDs come back ascending and without duplicates.
    pub async fn uid_search(&mut self, criteria: &SearchCriteria) -> Result<Vec<Uid>> {
        let reply = self
            .execute(&Command::Search {
                criteria: criteria.clone(),
                uid: true,
            })
            .await?;

        let mut uids: Vec<Uid> = reply
            .untagged
            .into_iter()
            .flat_map(|u| match u {
                UntaggedResponse::Search(nums) => nums,
                _ => Vec::new(),
            })
            .filter_map(Uid::new)
            .collect();
        uids.sort_unstable();
        uids.dedup();
        Ok(uids)
    }

    /// `UID FETCH`. Messages the server no longer has are simply absent.
    pub async fn uid_fetch(
        &mut self,
        uids: &UidSet,
        items: FetchItems,
    ) -> Result<Vec<(SeqNum, Vec<FetchItem>)>> {
        let reply = self
            .execute(&Command::Fetch {
                sequence: uids.as_sequence_set(),
                items,
                uid: true,
            })
            .await?;

        Ok(reply
            .untagged
            .into_iter()
            .filter_map(|u| match u {
                UntaggedResponse::Fetch { seq, items } => Some((seq, items)),
                _ => None,
            })
            .collect())
    }

    /// `UID STORE`.
    pub async fn uid_store(&mut self, uids: &UidSet, action: StoreAction, silent: bool) -> Result<()> {
        self.execute(&Command::Store {
            sequence: uids.as_sequence_set(),
            action,
            uid: true,
            silent,
        })
        .await
        .map(drop)
    }

    /// EXPUNGE; returns the sequence numbers reported removed.
    pub async fn expunge(&mut self) -> Result<Vec<SeqNum>> {
        let reply = self.execute(&Command::Expunge).await?;
        Ok(reply
            .untagged
            .into_iter()
            .filter_map(|u| match u {
                UntaggedResponse::Expunge(seq) => Some(seq),
                _ => None,
            })
            .collect())
    }

    /// CLOSE, back to the authenticated state.
    pub async fn close(mut self) -> Result<Client<S, Authenticated>> {
        self.execute(&Command::Close).await?;
        Ok(self.into_state(Authenticated))
    }
}
