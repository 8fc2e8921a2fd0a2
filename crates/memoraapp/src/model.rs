//! # Domain Model: Collections and Records
//!
//! Three record collections are persisted: vocabulary cards, writing-analysis
//! logs and classical-text logs. Each record type is only ever built through its
//! draft:
//!
//! ```text
//! VocabularyDraft  ──new()──▶ VocabularyCard          (key: word)
//! WritingDraft     ──new()──▶ WritingLogEntry         (key: id)
//! ClassicalDraft   ──new()──▶ ClassicalTextLogEntry   (key: id)
//! ```
//!
//! Drafts are the plain shapes that generators (and old backup files) hand us:
//! every optional field defaults to empty and unknown fields are ignored. The
//! `new` factory trims text, rejects missing required fields with
//! [`MemoraError::InvalidRecord`] and stamps ids and dates for log entries.
//!
//! Records deserialize through the same factory (`#[serde(try_from = ...)]`),
//! so a record read back from storage or from a snapshot is validated exactly
//! like one created in-process.
//!
//! ## Tags
//!
//! Card tags are a set: insertion order is irrelevant, blanks are dropped and
//! duplicates collapse. They serialize as a sorted JSON array.
//!
//! ## Images
//!
//! An attached image is kept inline as text, normally a
//! `data:<mime>;base64,<payload>` URL. See [`VocabularyCard::with_image_bytes`].

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

use crate::error::{MemoraError, Result};

/// The three persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    Vocabulary,
    Writing,
    Classical,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 3] = [
        CollectionKind::Vocabulary,
        CollectionKind::Writing,
        CollectionKind::Classical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CollectionKind::Vocabulary => "vocabulary",
            CollectionKind::Writing => "writing",
            CollectionKind::Classical => "classical",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record stored in one of the collections.
pub trait Record: Serialize + DeserializeOwned + Clone {
    const KIND: CollectionKind;

    /// When true, `add` refuses a record whose key is already stored.
    const UNIQUE_ON_ADD: bool;

    /// The dedup key: `word` for cards, `id` for log entries.
    fn key(&self) -> &str;
}

fn required(field: &str, value: String, what: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(MemoraError::InvalidRecord(format!(
            "{} is missing required field '{}'",
            what, field
        )));
    }
    Ok(trimmed.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn normalize_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Ids written by older clients may be bare numbers (millisecond stamps).
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    }))
}

fn new_entry_id() -> String {
    Uuid::now_v7().to_string()
}

fn today_stamp() -> String {
    Utc::now().to_rfc3339()
}

// --- Vocabulary ---

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VocabularyDraft {
    pub word: String,
    pub phonetic: Option<String>,
    pub definition: String,
    pub translation: String,
    pub example: String,
    pub mnemonic: String,
    pub context: String,
    pub tags: Vec<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "VocabularyDraft")]
pub struct VocabularyCard {
    word: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    phonetic: Option<String>,
    definition: String,
    translation: String,
    example: String,
    mnemonic: String,
    context: String,
    tags: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
}

impl VocabularyCard {
    pub fn new(draft: VocabularyDraft) -> Result<Self> {
        Ok(Self {
            word: required("word", draft.word, "vocabulary card")?,
            phonetic: optional(draft.phonetic),
            definition: required("definition", draft.definition, "vocabulary card")?,
            translation: draft.translation.trim().to_string(),
            example: draft.example.trim().to_string(),
            mnemonic: draft.mnemonic.trim().to_string(),
            context: draft.context.trim().to_string(),
            tags: normalize_tags(draft.tags),
            image: optional(draft.image),
        })
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn phonetic(&self) -> Option<&str> {
        self.phonetic.as_deref()
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    pub fn translation(&self) -> &str {
        &self.translation
    }

    pub fn example(&self) -> &str {
        &self.example
    }

    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn add_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags.extend(normalize_tags(tags));
    }

    pub fn remove_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tag in normalize_tags(tags) {
            self.tags.remove(&tag);
        }
    }

    /// Attach raw image bytes, stored inline as a base64 data URL.
    pub fn with_image_bytes(mut self, mime: &str, bytes: &[u8]) -> Self {
        self.image = Some(format!("data:{};base64,{}", mime, BASE64.encode(bytes)));
        self
    }

    pub fn clear_image(&mut self) {
        self.image = None;
    }

    /// Decode the attached image when it is a base64 data URL.
    ///
    /// Returns `Ok(None)` when no image is attached or it is a plain link.
    pub fn image_bytes(&self) -> Result<Option<(String, Vec<u8>)>> {
        let Some(image) = self.image.as_deref() else {
            return Ok(None);
        };
        let Some(rest) = image.strip_prefix("data:") else {
            return Ok(None);
        };
        let (mime, payload) = rest.split_once(";base64,").ok_or_else(|| {
            MemoraError::InvalidRecord(format!("image on '{}' is not base64 encoded", self.word))
        })?;
        let bytes = BASE64.decode(payload).map_err(|e| {
            MemoraError::InvalidRecord(format!("image on '{}' does not decode: {}", self.word, e))
        })?;
        Ok(Some((mime.to_string(), bytes)))
    }
}

impl TryFrom<VocabularyDraft> for VocabularyCard {
    type Error = MemoraError;

    fn try_from(draft: VocabularyDraft) -> Result<Self> {
        VocabularyCard::new(draft)
    }
}

impl Record for VocabularyCard {
    const KIND: CollectionKind = CollectionKind::Vocabulary;
    const UNIQUE_ON_ADD: bool = true;

    fn key(&self) -> &str {
        &self.word
    }
}

// --- Writing logs ---

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WritingDraft {
    #[serde(deserialize_with = "string_or_number")]
    pub id: Option<String>,
    pub original: String,
    pub corrected: String,
    pub improved: String,
    pub feedback: String,
    pub context: String,
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "WritingDraft")]
pub struct WritingLogEntry {
    id: String,
    original: String,
    corrected: String,
    improved: String,
    feedback: String,
    context: String,
    date: String,
}

impl WritingLogEntry {
    /// Build an entry; a missing id or date is generated.
    pub fn new(draft: WritingDraft) -> Result<Self> {
        Ok(Self {
            id: optional(draft.id).unwrap_or_else(new_entry_id),
            original: required("original", draft.original, "writing log")?,
            corrected: draft.corrected.trim().to_string(),
            improved: draft.improved.trim().to_string(),
            feedback: draft.feedback.trim().to_string(),
            context: draft.context.trim().to_string(),
            date: optional(draft.date).unwrap_or_else(today_stamp),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn corrected(&self) -> &str {
        &self.corrected
    }

    pub fn improved(&self) -> &str {
        &self.improved
    }

    pub fn feedback(&self) -> &str {
        &self.feedback
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn date(&self) -> &str {
        &self.date
    }
}

impl TryFrom<WritingDraft> for WritingLogEntry {
    type Error = MemoraError;

    fn try_from(draft: WritingDraft) -> Result<Self> {
        WritingLogEntry::new(draft)
    }
}

impl Record for WritingLogEntry {
    const KIND: CollectionKind = CollectionKind::Writing;
    const UNIQUE_ON_ADD: bool = false;

    fn key(&self) -> &str {
        &self.id
    }
}

// --- Classical text logs ---

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClassicalDraft {
    #[serde(deserialize_with = "string_or_number")]
    pub id: Option<String>,
    pub original: String,
    pub translation: String,
    pub origin: String,
    pub usage: String,
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ClassicalDraft")]
pub struct ClassicalTextLogEntry {
    id: String,
    original: String,
    translation: String,
    origin: String,
    usage: String,
    date: String,
}

impl ClassicalTextLogEntry {
    pub fn new(draft: ClassicalDraft) -> Result<Self> {
        Ok(Self {
            id: optional(draft.id).unwrap_or_else(new_entry_id),
            original: required("original", draft.original, "classical log")?,
            translation: required("translation", draft.translation, "classical log")?,
            origin: draft.origin.trim().to_string(),
            usage: draft.usage.trim().to_string(),
            date: optional(draft.date).unwrap_or_else(today_stamp),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn translation(&self) -> &str {
        &self.translation
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }

    pub fn date(&self) -> &str {
        &self.date
    }
}

impl TryFrom<ClassicalDraft> for ClassicalTextLogEntry {
    type Error = MemoraError;

    fn try_from(draft: ClassicalDraft) -> Result<Self> {
        ClassicalTextLogEntry::new(draft)
    }
}

impl Record for ClassicalTextLogEntry {
    const KIND: CollectionKind = CollectionKind::Classical;
    const UNIQUE_ON_ADD: bool = false;

    fn key(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(word: &str) -> VocabularyCard {
        VocabularyCard::new(VocabularyDraft {
            word: word.to_string(),
            definition: "a definition".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_card_trims_and_requires_word() {
        let c = card("  ubiquitous \n");
        assert_eq!(c.word(), "ubiquitous");

        let err = VocabularyCard::new(VocabularyDraft {
            word: "   ".to_string(),
            definition: "x".to_string(),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, MemoraError::InvalidRecord(_)));
        assert!(err.to_string().contains("'word'"));
    }

    #[test]
    fn test_card_requires_definition() {
        let err = VocabularyCard::new(VocabularyDraft {
            word: "lucid".to_string(),
            ..Default::default()
        })
        .unwrap_err();
        assert!(err.to_string().contains("'definition'"));
    }

    #[test]
    fn test_tags_are_a_set() {
        let a = VocabularyCard::new(VocabularyDraft {
            word: "w".to_string(),
            definition: "d".to_string(),
            tags: vec!["exam".into(), " travel ".into(), "".into(), "exam".into()],
            ..Default::default()
        })
        .unwrap();
        let b = VocabularyCard::new(VocabularyDraft {
            word: "w".to_string(),
            definition: "d".to_string(),
            tags: vec!["travel".into(), "exam".into()],
            ..Default::default()
        })
        .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.tags().len(), 2);
    }

    #[test]
    fn test_add_and_remove_tags() {
        let mut c = card("w");
        c.add_tags(["b", "a", "b"]);
        assert_eq!(c.tags().iter().collect::<Vec<_>>(), vec!["a", "b"]);
        c.remove_tags(["a", "missing"]);
        assert_eq!(c.tags().iter().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn test_image_bytes_round_trip() {
        let c = card("w").with_image_bytes("image/png", &[0x89, 0x50, 0x4e, 0x47]);
        assert!(c.image().unwrap().starts_with("data:image/png;base64,"));
        let (mime, bytes) = c.image_bytes().unwrap().unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, vec![0x89, 0x50, 0x4e, 0x47]);
    }

    #[test]
    fn test_plain_image_link_has_no_bytes() {
        let c = VocabularyCard::new(VocabularyDraft {
            word: "w".to_string(),
            definition: "d".to_string(),
            image: Some("https://example.org/w.png".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert!(c.image_bytes().unwrap().is_none());
    }

    #[test]
    fn test_card_deserialization_validates() {
        let ok: VocabularyCard =
            serde_json::from_str(r#"{"word":"ephemeral","definition":"d2","extra":1}"#).unwrap();
        assert_eq!(ok.word(), "ephemeral");
        assert_eq!(ok.translation(), "");

        let bad = serde_json::from_str::<VocabularyCard>(r#"{"definition":"d2"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_card_serializes_camel_case_without_empty_optionals() {
        let json = serde_json::to_value(card("w")).unwrap();
        assert!(json.get("phonetic").is_none());
        assert!(json.get("image").is_none());
        assert_eq!(json["tags"], serde_json::json!([]));
    }

    #[test]
    fn test_writing_entry_generates_id_and_date() {
        let a = WritingLogEntry::new(WritingDraft {
            original: "I has a pen".to_string(),
            corrected: "I have a pen".to_string(),
            ..Default::default()
        })
        .unwrap();
        let b = WritingLogEntry::new(WritingDraft {
            original: "second".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert!(!a.id().is_empty());
        assert_ne!(a.id(), b.id());
        assert!(!a.date().is_empty());
    }

    #[test]
    fn test_writing_entry_keeps_imported_id() {
        let e: WritingLogEntry = serde_json::from_str(
            r#"{"id":"1712345678901","original":"text","date":"2024/4/5"}"#,
        )
        .unwrap();
        assert_eq!(e.id(), "1712345678901");
        assert_eq!(e.date(), "2024/4/5");

        let numeric: ClassicalTextLogEntry = serde_json::from_str(
            r#"{"id":1712345678901,"original":"o","translation":"t"}"#,
        )
        .unwrap();
        assert_eq!(numeric.id(), "1712345678901");
    }

    #[test]
    fn test_classical_entry_requires_translation() {
        let err = ClassicalTextLogEntry::new(ClassicalDraft {
            original: "学而时习之".to_string(),
            ..Default::default()
        })
        .unwrap_err();
        assert!(err.to_string().contains("'translation'"));
    }

    #[test]
    fn test_collection_kind_names() {
        let names: Vec<_> = CollectionKind::ALL.iter().map(|k| k.to_string()).collect();
        assert_eq!(names, vec!["vocabulary", "writing", "classical"]);
    }
}
