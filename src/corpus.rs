use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// A knowledge-base entry. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub content: String,
}

impl Document {
    pub fn new(id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
        }
    }

    /// The text that gets embedded for this document.
    pub fn composite_text(&self) -> String {
        format!("{}\n{}", self.title, self.content)
    }
}

/// Static, ordered document collection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Corpus {
    #[serde(default)]
    documents: Vec<Document>,
}

impl Corpus {
    pub fn new(documents: Vec<Document>) -> Result<Self> {
        let mut seen = HashSet::new();
        for doc in &documents {
            if !seen.insert(doc.id.as_str()) {
                bail!("duplicate document id {:?}", doc.id);
            }
        }
        Ok(Self { documents })
    }

    /// Load `[[documents]]` tables from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading documents from {}", path.display()))?;
        let parsed: Corpus = toml::from_str(&contents)
            .with_context(|| format!("parsing documents from {}", path.display()))?;
        Self::new(parsed.documents).with_context(|| format!("validating {}", path.display()))
    }

    /// The sample knowledge base used when no document file is configured.
    pub fn builtin() -> Self {
        Self {
            documents: vec![
                Document::new(
                    "doc1",
                    "Python 소개",
                    "Python은 1991년 귀도 반 로섬이 만든 프로그래밍 언어입니다. 간결하고 읽기 쉬운 문법이 \
                     특징이며, 웹 개발, 데이터 분석, 인공지능 등 다양한 분야에서 사용됩니다.",
                ),
                Document::new(
                    "doc2",
                    "FastAPI 개요",
                    "FastAPI는 Python으로 API를 만들기 위한 현대적인 웹 프레임워크입니다. 높은 성능과 \
                     자동 문서화 기능을 제공하며, 타입 힌트를 활용한 데이터 검증을 지원합니다.",
                ),
                Document::new(
                    "doc3",
                    "RAG 아키텍처",
                    "RAG(Retrieval-Augmented Generation)는 검색과 생성을 결합한 아키텍처입니다. \
                     먼저 관련 문서를 검색하고, 검색된 문서를 컨텍스트로 활용하여 LLM이 답변을 생성합니다.",
                ),
                Document::new(
                    "doc4",
                    "벡터 데이터베이스",
                    "벡터 데이터베이스는 임베딩 벡터를 저장하고 유사도 검색을 수행하는 데이터베이스입니다. \
                     Pinecone, Weaviate, Chroma 등이 대표적인 벡터 DB입니다.",
                ),
                Document::new(
                    "doc5",
                    "프롬프트 엔지니어링",
                    "프롬프트 엔지니어링은 LLM에게 원하는 출력을 얻기 위해 입력 프롬프트를 설계하는 \
                     기술입니다. 명확한 지시, 예시 제공, 역할 부여 등의 기법이 있습니다.",
                ),
            ],
        }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Context block handed to answer generation: `[title]\ncontent` per
/// document, separated by blank lines.
pub fn format_context(docs: &[Document]) -> String {
    docs.iter()
        .map(|d| format!("[{}]\n{}", d.title, d.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}
