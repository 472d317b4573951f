//! Company (CNPJ) and postal code (CEP) lookups.
//!
//! Both upstreams are public JSON APIs. Successful answers are cached with
//! `moka` for an hour; failures are never cached.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::LookupConfig;

/// Digits in a CNPJ.
pub const CNPJ_DIGITS: usize = 14;
/// Digits in a CEP.
pub const CEP_DIGITS: usize = 8;

const CACHE_TTL: Duration = Duration::from_secs(60 * 60);
const CACHE_CAPACITY: u64 = 10_000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Which upstream a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupService {
    Cnpj,
    Cep,
}

impl LookupService {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cnpj => "CNPJ",
            Self::Cep => "CEP",
        }
    }
}

/// Errors from the lookup client.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Input does not have the right number of digits.
    #[error("{} must have {expected} digits", service.label())]
    InvalidInput {
        service: LookupService,
        expected: usize,
    },

    /// Upstream answered but has no record.
    #[error("not found: {0}")]
    NotFound(String),

    /// Upstream could not be reached or returned an unreadable body.
    #[error("{} lookup failed: {source}", service.label())]
    Upstream {
        service: LookupService,
        #[source]
        source: reqwest::Error,
    },
}

/// Company address block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyAddress {
    pub logradouro: String,
    pub numero: String,
    pub complemento: String,
    pub bairro: String,
    pub municipio: String,
    pub uf: String,
    pub cep: String,
}

/// Company registry record, in the shape the frontend reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CnpjInfo {
    /// Trade name, falling back to the legal name.
    pub nome: String,
    pub razao_social: String,
    pub cnpj: String,
    pub situacao: String,
    pub endereco: CompanyAddress,
    pub telefone: String,
    pub email: String,
    pub atividade_principal: String,
    pub data_abertura: String,
    pub capital_social: String,
}

/// Postal code record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CepInfo {
    pub cep: String,
    pub logradouro: String,
    pub complemento: String,
    pub bairro: String,
    pub localidade: String,
    pub uf: String,
    /// `"{logradouro}, {bairro}, {localidade} - {uf}"`.
    pub endereco: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReceitaActivity {
    text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReceitaResponse {
    status: Option<String>,
    message: Option<String>,
    nome: String,
    fantasia: String,
    cnpj: String,
    situacao: String,
    logradouro: String,
    numero: String,
    complemento: String,
    bairro: String,
    municipio: String,
    uf: String,
    cep: String,
    telefone: String,
    email: String,
    atividade_principal: Vec<ReceitaActivity>,
    abertura: String,
    capital_social: String,
}

impl From<ReceitaResponse> for CnpjInfo {
    fn from(data: ReceitaResponse) -> Self {
        let nome = if data.nome.is_empty() {
            data.fantasia
        } else {
            data.nome.clone()
        };
        Self {
            nome,
            razao_social: data.nome,
            cnpj: data.cnpj,
            situacao: data.situacao,
            endereco: CompanyAddress {
                logradouro: data.logradouro,
                numero: data.numero,
                complemento: data.complemento,
                bairro: data.bairro,
                municipio: data.municipio,
                uf: data.uf,
                cep: data.cep,
            },
            telefone: data.telefone,
            email: data.email,
            atividade_principal: data
                .atividade_principal
                .into_iter()
                .next()
                .map(|a| a.text)
                .unwrap_or_default(),
            data_abertura: data.abertura,
            capital_social: data.capital_social,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ViaCepResponse {
    erro: Option<serde_json::Value>,
    cep: String,
    logradouro: String,
    complemento: String,
    bairro: String,
    localidade: String,
    uf: String,
}

impl ViaCepResponse {
    fn is_error(&self) -> bool {
        match &self.erro {
            Some(serde_json::Value::Bool(flag)) => *flag,
            Some(serde_json::Value::String(s)) => s == "true",
            _ => false,
        }
    }
}

impl From<ViaCepResponse> for CepInfo {
    fn from(data: ViaCepResponse) -> Self {
        let endereco = format!(
            "{}, {}, {} - {}",
            data.logradouro, data.bairro, data.localidade, data.uf
        );
        Self {
            cep: data.cep,
            logradouro: data.logradouro,
            complemento: data.complemento,
            bairro: data.bairro,
            localidade: data.localidade,
            uf: data.uf,
            endereco,
        }
    }
}

/// Keep only ASCII digits and require exactly `expected` of them.
fn normalize(raw: &str, service: LookupService, expected: usize) -> Result<String, LookupError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == expected {
        Ok(digits)
    } else {
        Err(LookupError::InvalidInput { service, expected })
    }
}

/// Bounded cache for successful lookups.
fn new_cache<V: Clone + Send + Sync + 'static>() -> Cache<String, V> {
    Cache::builder()
        .max_capacity(CACHE_CAPACITY)
        .time_to_live(CACHE_TTL)
        .build()
}

/// Client for the CNPJ and CEP upstreams.
#[derive(Clone)]
pub struct LookupClient {
    inner: Arc<LookupClientInner>,
}

struct LookupClientInner {
    client: reqwest::Client,
    cnpj_api_url: String,
    cep_api_url: String,
    cnpj_cache: Cache<String, CnpjInfo>,
    cep_cache: Cache<String, CepInfo>,
}

impl LookupClient {
    /// Create a lookup client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &LookupConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("gestao-vendas/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(LookupClientInner {
                client,
                cnpj_api_url: config.cnpj_api_url.clone(),
                cep_api_url: config.cep_api_url.clone(),
                cnpj_cache: new_cache(),
                cep_cache: new_cache(),
            }),
        })
    }

    /// Look up a company by CNPJ. Punctuation in `raw` is ignored.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::InvalidInput` unless `raw` has exactly 14 digits.
    /// Returns `LookupError::NotFound` when the registry reports an error.
    /// Returns `LookupError::Upstream` on transport or decode failure.
    pub async fn cnpj(&self, raw: &str) -> Result<CnpjInfo, LookupError> {
        let cnpj = normalize(raw, LookupService::Cnpj, CNPJ_DIGITS)?;
        if let Some(hit) = self.inner.cnpj_cache.get(&cnpj).await {
            tracing::debug!(%cnpj, "CNPJ cache hit");
            return Ok(hit);
        }

        let url = format!("{}/{cnpj}", self.inner.cnpj_api_url);
        let data: ReceitaResponse = self.fetch(&url, LookupService::Cnpj).await?;

        if data.status.as_deref() == Some("ERROR") {
            return Err(LookupError::NotFound(
                data.message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "CNPJ não encontrado".to_owned()),
            ));
        }

        let info = CnpjInfo::from(data);
        self.inner.cnpj_cache.insert(cnpj, info.clone()).await;
        Ok(info)
    }

    /// Look up an address by CEP. Punctuation in `raw` is ignored.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::InvalidInput` unless `raw` has exactly 8 digits.
    /// Returns `LookupError::NotFound` when the upstream flags the CEP as unknown.
    /// Returns `LookupError::Upstream` on transport or decode failure.
    pub async fn cep(&self, raw: &str) -> Result<CepInfo, LookupError> {
        let cep = normalize(raw, LookupService::Cep, CEP_DIGITS)?;
        if let Some(hit) = self.inner.cep_cache.get(&cep).await {
            tracing::debug!(%cep, "CEP cache hit");
            return Ok(hit);
        }

        let url = format!("{}/{cep}/json/", self.inner.cep_api_url);
        let data: ViaCepResponse = self.fetch(&url, LookupService::Cep).await?;

        if data.is_error() {
            return Err(LookupError::NotFound("CEP não encontrado".to_owned()));
        }

        let info = CepInfo::from(data);
        self.inner.cep_cache.insert(cep, info.clone()).await;
        Ok(info)
    }

    async fn fetch<T>(&self, url: &str, service: LookupService) -> Result<T, LookupError>
    where
        T: serde::de::DeserializeOwned,
    {
        let upstream = |source| LookupError::Upstream { service, source };

        let response = self.inner.client.get(url).send().await.map_err(upstream)?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(service = service.label(), %status, "Lookup returned non-success status");
        }

        response.json::<T>().await.map_err(upstream)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{Json, Router, extract::Path, routing::get};
    use serde_json::json;

    async fn stub() -> (LookupClient, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let cnpj_hits = hits.clone();
        let cep_hits = hits.clone();

        let app = Router::new()
            .route(
                "/cnpj/{cnpj}",
                get(move |Path(cnpj): Path<String>| {
                    let hits = cnpj_hits.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        if cnpj == "00000000000000" {
                            return Json(json!({ "status": "ERROR", "message": "CNPJ inválido" }));
                        }
                        Json(json!({
                            "status": "OK",
                            "nome": "EMPRESA TESTE LTDA",
                            "fantasia": "TESTE",
                            "cnpj": "11.222.333/0001-81",
                            "situacao": "ATIVA",
                            "logradouro": "RUA A",
                            "numero": "10",
                            "bairro": "CENTRO",
                            "municipio": "SAO PAULO",
                            "uf": "SP",
                            "cep": "01001-000",
                            "atividade_principal": [{ "code": "61.10", "text": "Telecom" }],
                            "abertura": "01/02/2010",
                            "capital_social": "10000.00"
                        }))
                    }
                }),
            )
            .route(
                "/ws/{cep}/json/",
                get(move |Path(cep): Path<String>| {
                    let hits = cep_hits.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        if cep == "99999999" {
                            return Json(json!({ "erro": true }));
                        }
                        Json(json!({
                            "cep": "01001-000",
                            "logradouro": "Praça da Sé",
                            "complemento": "lado ímpar",
                            "bairro": "Sé",
                            "localidade": "São Paulo",
                            "uf": "SP"
                        }))
                    }
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = LookupClient::new(&LookupConfig {
            cnpj_api_url: format!("http://{addr}/cnpj"),
            cep_api_url: format!("http://{addr}/ws"),
        })
        .unwrap();
        (client, hits)
    }

    #[test]
    fn test_normalize() {
        assert_eq!(
            normalize("11.222.333/0001-81", LookupService::Cnpj, CNPJ_DIGITS).unwrap(),
            "11222333000181"
        );
        assert!(matches!(
            normalize("123", LookupService::Cep, CEP_DIGITS),
            Err(LookupError::InvalidInput { expected: 8, .. })
        ));
    }

    #[tokio::test]
    async fn test_cnpj_maps_and_caches() {
        let (client, hits) = stub().await;

        let info = client.cnpj("11.222.333/0001-81").await.unwrap();
        assert_eq!(info.nome, "EMPRESA TESTE LTDA");
        assert_eq!(info.razao_social, "EMPRESA TESTE LTDA");
        assert_eq!(info.endereco.municipio, "SAO PAULO");
        assert_eq!(info.atividade_principal, "Telecom");
        assert_eq!(info.data_abertura, "01/02/2010");
        assert_eq!(info.telefone, "");

        let again = client.cnpj("11222333000181").await.unwrap();
        assert_eq!(again, info);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cnpj_not_found() {
        let (client, _) = stub().await;
        let err = client.cnpj("00000000000000").await.unwrap_err();
        assert!(matches!(err, LookupError::NotFound(ref m) if m == "CNPJ inválido"));
    }

    #[tokio::test]
    async fn test_cep_lookup() {
        let (client, _) = stub().await;
        let info = client.cep("01001-000").await.unwrap();
        assert_eq!(info.localidade, "São Paulo");
        assert_eq!(info.endereco, "Praça da Sé, Sé, São Paulo - SP");

        assert!(matches!(
            client.cep("99999-999").await,
            Err(LookupError::NotFound(_))
        ));
        assert!(matches!(
            client.cep("1234").await,
            Err(LookupError::InvalidInput { .. })
        ));
    }

    #[tokio::test]
    async fn test_cep_and_cnpj_caches_are_independent() {
        let (client, hits) = stub().await;

        let first = client.cep("01001000").await.unwrap();
        let cached = client.cep("01001-000").await.unwrap();
        assert_eq!(first, cached);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        client.cnpj("11222333000181").await.unwrap();
        client.cnpj("11222333000181").await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_upstream_failure() {
        let client = LookupClient::new(&LookupConfig {
            cnpj_api_url: "http://127.0.0.1:1/cnpj".to_owned(),
            cep_api_url: "http://127.0.0.1:1/ws".to_owned(),
        })
        .unwrap();
        assert!(matches!(
            client.cep("01001000").await,
            Err(LookupError::Upstream {
                service: LookupService::Cep,
                ..
            })
        ));
    }
}
