//! External transaction classifier: wire contract and HTTP client.
//!
//! The service receives free text ("gastei 45 no mercado") and answers with
//! either a structured transaction or a plain conversational message. Both
//! shapes share one response struct; absent fields stay `None`.

use anyhow::{bail, Context, Result};
use fintrack_core::TxKind;
use serde::{Deserialize, Serialize};

/// pt-BR instruction block sent as the system prompt. Keeping the JSON
/// contract in the prompt is what lets us parse the reply leniently below.
const SYSTEM_PROMPT: &str = "Você é o FinTrack IA, um assistente financeiro amigável para um app de finanças pessoais no Brasil.

Suas tarefas:
1. Classificar transações a partir de linguagem natural em português
2. Extrair: tipo (entrada/saida_fixa/diario), categoria, valor
3. Ser conversacional e prestativo
4. Sugerir melhorias de forma gentil

Formato de resposta para transações (JSON):
{
  \"tipo\": \"diario|saida_fixa|entrada\",
  \"categoria\": \"Alimentação|Transporte|Moradia|Diversão|Saúde/Beleza|Roupas/Acessórios|Educação|Setup/Equipamentos|Assinaturas|Outro\",
  \"valor\": number,
  \"descricao\": \"descrição extraída\",
  \"confianca\": 0-100,
  \"confirmacao\": \"Você quer registrar R$X em [categoria]?\"
}

Para perguntas gerais, responda com:
{
  \"type\": \"message\",
  \"message\": \"sua resposta\"
}

Sempre responda em Português (BR).";

/// What the classifier may answer. A structured hit carries `tipo` +
/// `valor`; everything else is treated as a plain message.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ClassifyResponse {
    pub tipo: Option<TxKind>,
    pub categoria: Option<String>,
    pub valor: Option<f64>,
    pub descricao: Option<String>,
    /// 0–100.
    pub confianca: Option<f64>,
    pub confirmacao: Option<String>,
    pub message: Option<String>,
}

impl ClassifyResponse {
    pub fn plain_message(text: impl Into<String>) -> Self {
        Self {
            message: Some(text.into()),
            ..Default::default()
        }
    }

    /// Lenient parse: a body that is not the agreed JSON shape degrades to
    /// a plain message instead of failing the call.
    pub fn from_raw(content: &str) -> Self {
        match serde_json::from_str::<ClassifyResponse>(content) {
            Ok(parsed) => parsed,
            Err(_) => Self::plain_message(content.trim()),
        }
    }

    /// The usable single-transaction intent, when both type and a positive
    /// amount came back.
    pub fn as_intent(&self) -> Option<(TxKind, f64)> {
        match (self.tipo, self.valor) {
            (Some(kind), Some(amount)) if amount > 0.0 => Some((kind, amount)),
            _ => None,
        }
    }
}

/// Seam for injecting the classification policy; the engine and analyzer
/// only ever see this trait.
#[allow(async_fn_in_trait)]
pub trait Classifier {
    async fn classify(&self, text: &str) -> Result<ClassifyResponse>;
}

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// OpenAI-compatible endpoint root, e.g. "https://api.openai.com".
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub temperature: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: String::new(),
            temperature: 0.7,
        }
    }
}

/// Chat-completions client for the classifier service.
pub struct HttpClassifier {
    config: ClassifierConfig,
    client: reqwest::Client,
}

impl HttpClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

impl Classifier for HttpClassifier {
    async fn classify(&self, text: &str) -> Result<ClassifyResponse> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'static str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Format {
            #[serde(rename = "type")]
            kind: &'static str,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
            response_format: Format,
        }

        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: MsgOut,
        }

        #[derive(Deserialize)]
        struct MsgOut {
            content: Option<String>,
        }

        let body = Req {
            model: &self.config.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Msg {
                    role: "user",
                    content: text,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: 500,
            response_format: Format { kind: "json_object" },
        };

        let url = format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .context("chamando o serviço de classificação")?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            bail!("classificador respondeu {status}: {detail}");
        }

        let out: Resp = resp
            .json()
            .await
            .context("lendo a resposta do classificador")?;

        let content = out
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        Ok(ClassifyResponse::from_raw(&content))
    }
}
