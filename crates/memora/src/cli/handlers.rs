//! Per-command handlers. Each one calls the API and prints the rendered
//! result; errors bubble up to `main` as `anyhow::Error`.

use anyhow::{bail, Context, Result};
use memoraapp::api::MemoraApi;
use memoraapp::backup::{RestoreOutcome, RESTORE_POLICY_NOTICE};
use memoraapp::commands::CmdResult;
use memoraapp::config::MemoraConfig;
use memoraapp::model::{ClassicalDraft, VocabularyDraft, WritingDraft};
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::render;
use super::setup::{ClassicalCommands, VocabCommands, WritingCommands};

pub struct AppState {
    pub api: MemoraApi,
    pub config: MemoraConfig,
    pub data_dir: PathBuf,
}

fn print_messages<T>(result: &CmdResult<T>) {
    print!("{}", render::messages(&result.messages));
}

fn print_json<T: Serialize + ?Sized>(records: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(records)?);
    Ok(())
}

pub async fn vocab(state: &AppState, command: VocabCommands) -> Result<()> {
    let api = &state.api;
    match command {
        VocabCommands::List { tag, args } => {
            let mut cards = api.vocabulary().list().await?;
            if let Some(tag) = tag {
                cards.retain(|c| c.tags().contains(tag.trim()));
            }
            if args.json {
                print_json(&cards)?;
            } else {
                print!("{}", render::cards(&cards));
            }
        }
        VocabCommands::Add {
            word,
            definition,
            translation,
            example,
            phonetic,
            mnemonic,
            context,
            tags,
        } => {
            let result = api
                .add_card(VocabularyDraft {
                    word,
                    phonetic,
                    definition,
                    translation: translation.unwrap_or_default(),
                    example: example.unwrap_or_default(),
                    mnemonic: mnemonic.unwrap_or_default(),
                    context: context.unwrap_or_default(),
                    tags,
                    image: None,
                })
                .await?;
            print_messages(&result);
        }
        VocabCommands::Remove { words } => {
            print_messages(&api.remove_card(words.as_slice()).await?);
        }
        VocabCommands::Tag { word, add, remove } => {
            if add.is_empty() && remove.is_empty() {
                bail!("nothing to do: pass --add or --remove");
            }
            print_messages(&api.tag_card(&word, add.as_slice(), remove.as_slice()).await?);
        }
        VocabCommands::Image { word, file, clear } => {
            let result = match file {
                Some(path) if !clear => {
                    let bytes = std::fs::read(&path)
                        .with_context(|| format!("reading image {}", path.display()))?;
                    api.attach_image(&word, Some((mime_for(&path), bytes.as_slice())))
                        .await?
                }
                _ => api.attach_image(&word, None).await?,
            };
            print_messages(&result);
        }
    }
    Ok(())
}

pub async fn writing(state: &AppState, command: WritingCommands) -> Result<()> {
    let api = &state.api;
    match command {
        WritingCommands::List { args } => {
            let entries = api.writing().list().await?;
            if args.json {
                print_json(&entries)?;
            } else {
                print!("{}", render::writing_logs(&entries));
            }
        }
        WritingCommands::Add {
            original,
            corrected,
            improved,
            feedback,
            context,
        } => {
            let result = api
                .add_writing_log(WritingDraft {
                    original,
                    corrected: corrected.unwrap_or_default(),
                    improved: improved.unwrap_or_default(),
                    feedback: feedback.unwrap_or_default(),
                    context: context.unwrap_or_default(),
                    ..Default::default()
                })
                .await?;
            print_messages(&result);
        }
        WritingCommands::Remove { ids } => {
            print_messages(&api.remove_writing_log(ids.as_slice()).await?);
        }
    }
    Ok(())
}

pub async fn classical(state: &AppState, command: ClassicalCommands) -> Result<()> {
    let api = &state.api;
    match command {
        ClassicalCommands::List { args } => {
            let entries = api.classical().list().await?;
            if args.json {
                print_json(&entries)?;
            } else {
                print!("{}", render::classical_logs(&entries));
            }
        }
        ClassicalCommands::Add {
            original,
            translation,
            origin,
            usage,
        } => {
            let result = api
                .add_classical_log(ClassicalDraft {
                    original,
                    translation,
                    origin: origin.unwrap_or_default(),
                    usage: usage.unwrap_or_default(),
                    ..Default::default()
                })
                .await?;
            print_messages(&result);
        }
        ClassicalCommands::Remove { ids } => {
            print_messages(&api.remove_classical_log(ids.as_slice()).await?);
        }
    }
    Ok(())
}

pub async fn export(state: &AppState, out: &Path) -> Result<()> {
    let path = state.api.export_to_dir(out).await?;
    print!("{}", render::exported(&path));
    Ok(())
}

pub async fn import(state: &AppState, file: &Path, yes: bool) -> Result<()> {
    if !yes {
        println!("{}", RESTORE_POLICY_NOTICE);
        println!("Nothing was imported. Re-run with --yes to merge {}.", file.display());
        return Ok(());
    }

    let payload = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("reading backup {}", file.display()))?;
    let report = state.api.import_snapshot(&payload).await?;
    print!("{}", render::restore_report(&report));

    if report.outcome() != RestoreOutcome::Complete {
        for line in render::restore_failures(&report) {
            eprintln!("{}", console::style(line).yellow());
        }
        report.into_result()?;
    }
    Ok(())
}

pub fn config(state: &AppState) -> Result<()> {
    print!(
        "{}",
        render::config(
            &state.config,
            &state.data_dir,
            state.api.backend_name(),
            state.api.ceiling()
        )
    );
    Ok(())
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_for_known_extensions() {
        assert_eq!(mime_for(Path::new("a.PNG")), "image/png");
        assert_eq!(mime_for(Path::new("dir/b.jpeg")), "image/jpeg");
        assert_eq!(mime_for(Path::new("noext")), "application/octet-stream");
    }
}
