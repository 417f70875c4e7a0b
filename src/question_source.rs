use std::{
    env, fmt,
    path::{Path, PathBuf},
};

use crate::log_util;
use color_eyre::eyre::{Context, Result, eyre};
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const DATA_SOURCE_ENV: &str = "UNITQUIZ_DATA_SOURCE";
/// Placeholder the datasets use for a missing field.
pub const NULL_TEXT: &str = "null";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Vocab,
    Grammar,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Self::Vocab => "Vocabulary",
            Self::Grammar => "Grammar",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Vocab => "VocabQuestions.json",
            Self::Grammar => "GrammarQuestions.json",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Self::Vocab => Self::Grammar,
            Self::Grammar => Self::Vocab,
        }
    }
}

/// One vocabulary record, field names as they appear in `VocabQuestions.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VocabEntry {
    #[serde(rename = "Hebrew", default = "null_text", deserialize_with = "lenient_text")]
    pub hebrew: String,
    #[serde(
        rename = "Transliteration",
        default = "null_text",
        deserialize_with = "lenient_text"
    )]
    pub transliteration: String,
    #[serde(
        rename = "Translation",
        default = "null_text",
        deserialize_with = "lenient_text"
    )]
    pub translation: String,
    #[serde(rename = "Unit", default, deserialize_with = "lenient_number")]
    pub unit: Option<u32>,
    #[serde(
        rename = "BiblicalFrequency",
        default,
        deserialize_with = "lenient_number"
    )]
    pub biblical_frequency: Option<u32>,
}

/// One grammar record from `GrammarQuestions.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GrammarEntry {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub correct_answer: String,
    #[serde(default)]
    pub incorrect_answers: Vec<String>,
    #[serde(rename = "Unit", default, deserialize_with = "lenient_number")]
    pub unit: Option<u32>,
}

/// Parsed content of one dataset file.
#[derive(Debug, Clone, PartialEq)]
pub enum Dataset {
    Vocab(Vec<VocabEntry>),
    Grammar(Vec<GrammarEntry>),
}

/// Borrowed view of a single dataset record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawEntry<'a> {
    Vocab(&'a VocabEntry),
    Grammar(&'a GrammarEntry),
}

impl RawEntry<'_> {
    pub fn unit(self) -> Option<u32> {
        match self {
            Self::Vocab(entry) => entry.unit,
            Self::Grammar(entry) => entry.unit,
        }
    }
}

impl Dataset {
    pub fn from_json(category: Category, contents: &str) -> serde_json::Result<Self> {
        Ok(match category {
            Category::Vocab => Self::Vocab(serde_json::from_str(contents)?),
            Category::Grammar => Self::Grammar(serde_json::from_str(contents)?),
        })
    }

    pub fn category(&self) -> Category {
        match self {
            Self::Vocab(_) => Category::Vocab,
            Self::Grammar(_) => Category::Grammar,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Vocab(entries) => entries.len(),
            Self::Grammar(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entries(&self) -> Vec<RawEntry<'_>> {
        match self {
            Self::Vocab(entries) => entries.iter().map(RawEntry::Vocab).collect(),
            Self::Grammar(entries) => entries.iter().map(RawEntry::Grammar).collect(),
        }
    }

    pub fn vocab_entries(&self) -> &[VocabEntry] {
        match self {
            Self::Vocab(entries) => entries,
            Self::Grammar(_) => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Directory(PathBuf),
    Remote(String),
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory(path) => write!(f, "{}", path.display()),
            Self::Remote(base) => write!(f, "{}", base),
        }
    }
}

/// Reads the static question datasets from a local directory or an HTTP base URL.
#[derive(Debug, Clone)]
pub struct QuestionSource {
    client: Client,
    location: SourceLocation,
}

impl QuestionSource {
    pub fn new(location: SourceLocation) -> Self {
        Self {
            client: Client::new(),
            location,
        }
    }

    /// Interpret a configured data source: `http(s)://` prefixes are remote, anything else is a directory.
    pub fn from_setting(setting: &str) -> Self {
        let trimmed = setting.trim();
        let location = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            SourceLocation::Remote(trimmed.trim_end_matches('/').to_string())
        } else {
            SourceLocation::Directory(PathBuf::from(trimmed))
        };
        Self::new(location)
    }

    /// Prefer the `UNITQUIZ_DATA_SOURCE` environment variable, falling back to the configured value.
    pub fn from_env(configured: &str) -> Self {
        match env::var(DATA_SOURCE_ENV) {
            Ok(value) if !value.trim().is_empty() => Self::from_setting(&value),
            _ => Self::from_setting(configured),
        }
    }

    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    /// Load and parse the dataset for `category`.
    pub async fn fetch_dataset(&self, category: Category) -> Result<Dataset> {
        let file_name = category.file_name();
        log_util::log_debug(&format!(
            "QuestionSource: loading {} from {}",
            file_name, self.location
        ));
        let contents = match &self.location {
            SourceLocation::Directory(dir) => Self::read_local(dir, file_name).await?,
            SourceLocation::Remote(base) => self.read_remote(base, file_name).await?,
        };
        let dataset = Dataset::from_json(category, &contents)
            .wrap_err_with(|| format!("failed to parse {} as a question list", file_name))?;
        log_util::log_debug(&format!(
            "QuestionSource: parsed {} entries from {}",
            dataset.len(),
            file_name
        ));
        Ok(dataset)
    }

    async fn read_local(dir: &Path, file_name: &str) -> Result<String> {
        let path = dir.join(file_name);
        tokio::fs::read_to_string(&path)
            .await
            .wrap_err_with(|| format!("failed to read {}", path.display()))
    }

    async fn read_remote(&self, base: &str, file_name: &str) -> Result<String> {
        let url = format!("{}/{}", base, file_name);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .wrap_err_with(|| format!("failed to request {}", url))?;
        log_util::log_debug(&format!(
            "QuestionSource: {} responded {}",
            url,
            response.status()
        ));
        if !response.status().is_success() {
            return Err(eyre!("HTTP error! Status: {} for {}", response.status(), url));
        }
        response
            .text()
            .await
            .wrap_err_with(|| format!("failed to read response body from {}", url))
    }
}

fn null_text() -> String {
    NULL_TEXT.to_string()
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => text,
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        _ => null_text(),
    })
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(numeric_value))
}

fn numeric_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|float| float.fract() == 0.0 && *float >= 0.0)
                    .map(|float| float as u64)
            })
            .and_then(|whole| u32::try_from(whole).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixture_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("test_fixtures")
    }

    #[test]
    fn vocab_entries_accept_numbers_strings_and_nulls() {
        let json = r#"[
            {"Hebrew": "מַיִם", "Transliteration": "mayim", "Translation": "water", "Unit": 1, "BiblicalFrequency": 582},
            {"Hebrew": "אֶרֶץ", "Transliteration": null, "Translation": "earth", "Unit": "2", "BiblicalFrequency": "2505"},
            {"Hebrew": "שָׁמַיִם", "Translation": "heavens", "Unit": 3.0}
        ]"#;
        let dataset = Dataset::from_json(Category::Vocab, json).unwrap();
        let entries = dataset.vocab_entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].unit, Some(1));
        assert_eq!(entries[0].biblical_frequency, Some(582));
        assert_eq!(entries[1].transliteration, NULL_TEXT);
        assert_eq!(entries[1].unit, Some(2));
        assert_eq!(entries[1].biblical_frequency, Some(2505));
        assert_eq!(entries[2].transliteration, NULL_TEXT);
        assert_eq!(entries[2].unit, Some(3));
        assert_eq!(entries[2].biblical_frequency, None);
    }

    #[test]
    fn grammar_entries_parse_with_units() {
        let json = r#"[{"question": "Q?", "correct_answer": "A", "incorrect_answers": ["B", "C", "D"], "Unit": 4}]"#;
        let dataset = Dataset::from_json(Category::Grammar, json).unwrap();
        assert_eq!(dataset.category(), Category::Grammar);
        let entries = dataset.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].unit(), Some(4));
        assert!(dataset.vocab_entries().is_empty());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(Dataset::from_json(Category::Vocab, "{not json").is_err());
        assert!(Dataset::from_json(Category::Grammar, r#"{"question": "x"}"#).is_err());
    }

    #[test]
    fn setting_with_http_prefix_is_remote() {
        let source = QuestionSource::from_setting("https://example.org/quiz/");
        assert_eq!(
            source.location(),
            &SourceLocation::Remote("https://example.org/quiz".to_string())
        );
        let local = QuestionSource::from_setting(" data ");
        assert_eq!(
            local.location(),
            &SourceLocation::Directory(PathBuf::from("data"))
        );
    }

    #[tokio::test]
    async fn fetches_both_fixture_datasets_from_a_directory() {
        let source = QuestionSource::new(SourceLocation::Directory(fixture_dir()));

        let vocab = source.fetch_dataset(Category::Vocab).await.unwrap();
        assert_eq!(vocab.category(), Category::Vocab);
        assert!(!vocab.is_empty(), "vocab fixture should not be empty");

        let grammar = source.fetch_dataset(Category::Grammar).await.unwrap();
        assert_eq!(grammar.category(), Category::Grammar);
        assert!(!grammar.is_empty(), "grammar fixture should not be empty");
    }

    #[tokio::test]
    async fn missing_directory_reports_the_path() {
        let mut dir = std::env::temp_dir();
        dir.push(format!(
            "unitquiz-missing-source-{}",
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let source = QuestionSource::new(SourceLocation::Directory(dir.clone()));
        let err = source.fetch_dataset(Category::Vocab).await.unwrap_err();
        assert!(
            format!("{err}").contains("VocabQuestions.json"),
            "error should name the missing file: {err}"
        );
    }

    /// Serve `VocabQuestions.json` under `/quiz/` and answer 404 for anything else.
    async fn serve_fixture_over_http(connections: usize) -> String {
        use tokio::{
            io::{AsyncReadExt, AsyncWriteExt},
            net::TcpListener,
        };

        let body = fs::read_to_string(fixture_dir().join("VocabQuestions.json")).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for _ in 0..connections {
                let (mut stream, _) = listener.accept().await.unwrap();
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                    let read = stream.read(&mut buf).await.unwrap();
                    if read == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..read]);
                }
                let request_line = String::from_utf8_lossy(&request)
                    .lines()
                    .next()
                    .unwrap_or_default()
                    .to_string();
                let (status, payload) = if request_line.contains("/quiz/VocabQuestions.json") {
                    ("200 OK", body.as_str())
                } else {
                    ("404 Not Found", "not found")
                };
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    payload.len(),
                    payload
                );
                stream.write_all(response.as_bytes()).await.unwrap();
                stream.shutdown().await.unwrap();
            }
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn remote_source_rejects_non_success_status_and_parses_success() {
        let base = serve_fixture_over_http(2).await;

        let missing = QuestionSource::from_setting(&format!("{}/absent", base));
        let err = missing.fetch_dataset(Category::Vocab).await.unwrap_err();
        assert!(
            format!("{err}").contains("404"),
            "error should carry the status: {err}"
        );

        let remote = QuestionSource::from_setting(&format!("{}/quiz/", base));
        assert!(matches!(remote.location(), SourceLocation::Remote(_)));
        let dataset = remote.fetch_dataset(Category::Vocab).await.unwrap();
        assert_eq!(dataset.category(), Category::Vocab);
        assert!(!dataset.is_empty());
    }

    #[tokio::test]
    async fn unparseable_file_is_an_error() {
        let mut dir = std::env::temp_dir();
        dir.push(format!(
            "unitquiz-bad-source-{}",
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("GrammarQuestions.json"), "not json").unwrap();

        let source = QuestionSource::new(SourceLocation::Directory(dir.clone()));
        assert!(source.fetch_dataset(Category::Grammar).await.is_err());

        fs::remove_dir_all(&dir).unwrap();
    }
}
