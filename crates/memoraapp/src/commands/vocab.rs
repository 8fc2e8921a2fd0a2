use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::VocabularyCard;
use crate::repo::VocabularyRepo;

pub async fn add(repo: &VocabularyRepo, card: VocabularyCard) -> Result<CmdResult<VocabularyCard>> {
    let mut result = CmdResult::default();
    let word = card.word().to_string();
    if repo.add(card.clone()).await? {
        result.add_message(CmdMessage::success(format!("Added '{}'", word)));
        Ok(result.with_affected(vec![card]))
    } else {
        result.add_message(CmdMessage::warning(format!(
            "'{}' is already in your vocabulary; kept the existing card",
            word
        )));
        Ok(result)
    }
}

pub async fn remove<I: AsRef<str>>(
    repo: &VocabularyRepo,
    words: &[I],
) -> Result<CmdResult<VocabularyCard>> {
    let mut result = CmdResult::default();
    let mut removed = Vec::new();
    for word in words {
        let word = word.as_ref();
        let Some(card) = repo.get(word).await? else {
            result.add_message(CmdMessage::info(format!("'{}' was not stored", word)));
            continue;
        };
        repo.remove(word).await?;
        result.add_message(CmdMessage::success(format!("Removed '{}'", word)));
        removed.push(card);
    }
    Ok(result.with_affected(removed))
}

/// Add and remove tags on one card. Additions are applied first.
pub async fn tag<S: AsRef<str>>(
    repo: &VocabularyRepo,
    word: &str,
    add: &[S],
    remove: &[S],
) -> Result<CmdResult<VocabularyCard>> {
    let mut result = CmdResult::default();
    let edited = repo
        .edit(word, |card| {
            card.add_tags(add);
            card.remove_tags(remove);
        })
        .await?;
    match edited {
        Some(card) => {
            let tags: Vec<&str> = card.tags().iter().map(String::as_str).collect();
            let summary = if tags.is_empty() {
                "no tags".to_string()
            } else {
                tags.join(", ")
            };
            result.add_message(CmdMessage::success(format!("'{}': {}", word, summary)));
            Ok(result.with_affected(vec![card]))
        }
        None => {
            result.add_message(CmdMessage::warning(format!("'{}' was not stored", word)));
            Ok(result)
        }
    }
}

/// Attach an image, or detach it when `image` is `None`.
pub async fn attach_image(
    repo: &VocabularyRepo,
    word: &str,
    image: Option<(&str, &[u8])>,
) -> Result<CmdResult<VocabularyCard>> {
    let mut result = CmdResult::default();
    let Some(card) = repo.get(word).await? else {
        result.add_message(CmdMessage::warning(format!("'{}' was not stored", word)));
        return Ok(result);
    };

    let card = match image {
        Some((mime, bytes)) => card.with_image_bytes(mime, bytes),
        None => {
            let mut card = card;
            card.clear_image();
            card
        }
    };
    repo.update(card.clone()).await?;

    let message = match image {
        Some((_, bytes)) => format!("Attached a {} byte image to '{}'", bytes.len(), word),
        None => format!("Removed the image from '{}'", word),
    };
    result.add_message(CmdMessage::success(message));
    Ok(result.with_affected(vec![card]))
}
