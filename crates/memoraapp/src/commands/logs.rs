//! Writing and classical log commands.
//!
//! Both log collections behave the same way, so the commands are generic
//! over the record type.

use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::Record;
use crate::repo::Repository;

pub async fn add<R: Record>(repo: &Repository<R>, entry: R) -> Result<CmdResult<R>> {
    let mut result = CmdResult::default();
    repo.add(entry.clone()).await?;
    result.add_message(CmdMessage::success(format!(
        "Logged {} entry {}",
        R::KIND,
        entry.key()
    )));
    Ok(result.with_affected(vec![entry]))
}

pub async fn remove<R: Record, I: AsRef<str>>(
    repo: &Repository<R>,
    ids: &[I],
) -> Result<CmdResult<R>> {
    let mut result = CmdResult::default();
    let mut removed = Vec::new();
    for id in ids {
        let id = id.as_ref();
        let Some(entry) = repo.get(id).await? else {
            result.add_message(CmdMessage::info(format!(
                "No {} entry with id {}",
                R::KIND,
                id
            )));
            continue;
        };
        repo.remove(id).await?;
        result.add_message(CmdMessage::success(format!(
            "Removed {} entry {}",
            R::KIND,
            id
        )));
        removed.push(entry);
    }
    Ok(result.with_affected(removed))
}
